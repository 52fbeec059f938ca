//! Application engines (request-level orchestration).
//!
//! Each operation takes the authenticated [`Actor`](depotflow_auth::Actor) as
//! an explicit parameter, runs its role/location checks, executes the pure
//! domain logic and persists through the store. No ambient state, no
//! background work: everything happens within the caller's request.

use std::sync::Arc;

use thiserror::Error;

use depotflow_core::DomainError;

use crate::store::{Store, StoreError};

pub mod catalog;
pub mod inventory;
pub mod orders;
pub mod transfers;

pub use catalog::{NewLocation, NewProduct};
pub use inventory::RestockRequest;
pub use orders::{NewOrderItem, PlaceOrder};
pub use transfers::RequestTransfer;

/// Engine failure: either a deterministic domain outcome or an
/// infrastructure problem.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// The engines, bound to one store.
///
/// Cheap to clone via the inner `Arc`; the API layer shares one instance
/// across handlers.
#[derive(Clone)]
pub struct Services {
    store: Arc<dyn Store>,
}

impl Services {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub(crate) fn store(&self) -> &dyn Store {
        &*self.store
    }
}
