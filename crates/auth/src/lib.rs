//! `depotflow-auth` — authentication/authorization boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage: it models the
//! authenticated actor, validates token claims, and offers pure policy checks.
//! Token minting (login) lives outside the system; we only verify.

pub mod actor;
pub mod claims;
pub mod jwt;
pub mod roles;

pub use actor::{Actor, ensure_location, ensure_role};
pub use claims::{JwtClaims, TokenValidationError, validate_claims};
pub use jwt::{Hs256JwtValidator, JwtValidator};
pub use roles::Role;
