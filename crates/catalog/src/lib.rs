//! `depotflow-catalog` — Product and Location reference data.
//!
//! Both are read-only collaborators from the engines' perspective: fulfillment
//! looks products up for validation and price snapshots, and partitions
//! inventory by location. Catalog maintenance itself is plain CRUD.

pub mod location;
pub mod product;

pub use location::Location;
pub use product::Product;
