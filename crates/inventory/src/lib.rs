//! `depotflow-inventory` — on-hand stock per (product, location) pair.
//!
//! The record's quantity arithmetic lives here so the non-negative invariant
//! is enforced in exactly one place; the store layer is responsible for making
//! the check-and-decrement atomic under concurrency.

pub mod record;

pub use record::{DEFAULT_MAX_STOCK, DEFAULT_MIN_STOCK, InventoryRecord};
