//! `depotflow-transfers` — stock movement between locations.
//!
//! A transfer is a pure state machine here: stock only actually moves when the
//! destination *receives* an approved transfer, and that side effect belongs
//! to the engine in `depotflow-infra`.

pub mod transfer;

pub use transfer::{Transfer, TransferLine, TransferNumber, TransferStatus};
