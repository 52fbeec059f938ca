use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use depotflow_core::{DomainError, LocationId, UserId};

use crate::{Actor, Role};

/// JWT claims model (transport-agnostic).
///
/// The minimal set of claims expected once a token has been decoded and its
/// signature verified. Tokens are minted by the identity layer, which is out
/// of scope here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject / user identifier.
    pub sub: UserId,

    /// Role granted to the subject.
    pub role: Role,

    /// Location binding: mandatory for `location_staff`, the optional home
    /// location for `customer`, absent otherwise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_id: Option<LocationId>,

    /// Issued-at timestamp.
    pub issued_at: DateTime<Utc>,

    /// Expiration timestamp.
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (issued_at is in the future)")]
    NotYetValid,

    #[error("invalid token time window (expires_at <= issued_at)")]
    InvalidTimeWindow,

    #[error("token rejected: {0}")]
    Rejected(String),
}

/// Deterministically validate JWT claims.
///
/// Note: this validates the *claims* only. Signature verification / decoding
/// lives in [`crate::jwt`].
pub fn validate_claims(claims: &JwtClaims, now: DateTime<Utc>) -> Result<(), TokenValidationError> {
    if claims.expires_at <= claims.issued_at {
        return Err(TokenValidationError::InvalidTimeWindow);
    }
    if now < claims.issued_at {
        return Err(TokenValidationError::NotYetValid);
    }
    if now >= claims.expires_at {
        return Err(TokenValidationError::Expired);
    }
    Ok(())
}

impl TryFrom<JwtClaims> for Actor {
    type Error = DomainError;

    fn try_from(claims: JwtClaims) -> Result<Self, Self::Error> {
        let actor = match claims.role {
            Role::Customer => Actor::Customer {
                id: claims.sub,
                home_location: claims.location_id,
            },
            Role::LocationStaff => Actor::LocationStaff {
                id: claims.sub,
                location: claims.location_id.ok_or_else(|| {
                    DomainError::validation("location_staff token is missing location_id")
                })?,
            },
            Role::Logistics => Actor::Logistics { id: claims.sub },
            Role::Manager => Actor::Manager { id: claims.sub },
            Role::Admin => Actor::Admin { id: claims.sub },
        };
        Ok(actor)
    }
}
