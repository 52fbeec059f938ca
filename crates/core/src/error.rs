//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures (validation,
/// invariants, authorization outcomes). Infrastructure concerns belong elsewhere.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. missing or malformed required field).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A requested resource was not found. Carries what was looked up.
    #[error("{0} not found")]
    NotFound(String),

    /// The actor is not allowed to perform this operation on this target.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// An item-status change is not legal from the item's current status.
    #[error("invalid transition: {0}")]
    InvalidTransition(String),

    /// A workflow operation is not legal from the record's current status.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// No location holds enough stock of the named product.
    #[error("insufficient stock for {0}")]
    InsufficientStock(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A conflict occurred (e.g. duplicate key, lost concurrent update).
    #[error("conflict: {0}")]
    Conflict(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn invalid_transition(msg: impl Into<String>) -> Self {
        Self::InvalidTransition(msg.into())
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    pub fn insufficient_stock(product_name: impl Into<String>) -> Self {
        Self::InsufficientStock(product_name.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }
}
