//! The shared document-style store boundary.
//!
//! One trait, two implementations. Orders and transfers are stored as whole
//! documents (items embedded, matching their aggregate boundaries); inventory
//! is a flat keyed collection because it is the contended resource and its
//! mutations must be individually atomic.

pub mod in_memory;
pub mod postgres;
pub mod r#trait;

pub use in_memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use r#trait::{Store, StoreError};
