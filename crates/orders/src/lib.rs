//! `depotflow-orders` — the order aggregate.
//!
//! An order is created whole at checkout; afterwards only the statuses of its
//! embedded items change, and the order-level status is always *derived* from
//! them (never set directly). All logic here is pure: persistence and
//! stock side effects belong to the engines in `depotflow-infra`.

pub mod number;
pub mod order;

pub use number::{InvoiceNumber, OrderNumber};
pub use order::{Order, OrderItem, OrderStatus, PaymentStatus, derive_order_status};
