use serde::{Deserialize, Serialize};

use depotflow_core::{DomainError, DomainResult, LocationId, UserId};

use crate::Role;

/// A fully resolved, authenticated actor.
///
/// One variant per role, so role-conditional data (the location binding) is
/// carried by the type instead of by optionally-present fields. Every engine
/// operation takes the actor as an explicit parameter; there is no ambient
/// "current user".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Actor {
    Customer {
        id: UserId,
        /// Preferred fulfillment location, tried first when placing orders.
        home_location: Option<LocationId>,
    },
    LocationStaff {
        id: UserId,
        location: LocationId,
    },
    Logistics {
        id: UserId,
    },
    Manager {
        id: UserId,
    },
    Admin {
        id: UserId,
    },
}

impl Actor {
    pub fn id(&self) -> UserId {
        match self {
            Actor::Customer { id, .. }
            | Actor::LocationStaff { id, .. }
            | Actor::Logistics { id }
            | Actor::Manager { id }
            | Actor::Admin { id } => *id,
        }
    }

    pub fn role(&self) -> Role {
        match self {
            Actor::Customer { .. } => Role::Customer,
            Actor::LocationStaff { .. } => Role::LocationStaff,
            Actor::Logistics { .. } => Role::Logistics,
            Actor::Manager { .. } => Role::Manager,
            Actor::Admin { .. } => Role::Admin,
        }
    }

    /// The location this actor is bound to, if the role has one.
    pub fn location(&self) -> Option<LocationId> {
        match self {
            Actor::LocationStaff { location, .. } => Some(*location),
            Actor::Customer { home_location, .. } => *home_location,
            _ => None,
        }
    }
}

/// Route-level role gate.
///
/// - No IO
/// - No panics
/// - No business logic (pure policy check)
pub fn ensure_role(actor: &Actor, allowed: &[Role]) -> DomainResult<()> {
    if allowed.contains(&actor.role()) {
        Ok(())
    } else {
        Err(DomainError::forbidden(format!(
            "role '{}' may not perform this operation",
            actor.role()
        )))
    }
}

/// Location-scope check for operations targeting a specific location.
///
/// Location staff may only touch their own location; customers none at all;
/// every other role passes (which roles reach a given operation is decided by
/// the role gate on the route).
pub fn ensure_location(actor: &Actor, location: LocationId) -> DomainResult<()> {
    match actor {
        Actor::LocationStaff { location: own, .. } => {
            if *own == location {
                Ok(())
            } else {
                Err(DomainError::forbidden(
                    "location staff may only act on their own location",
                ))
            }
        }
        Actor::Customer { .. } => Err(DomainError::forbidden(
            "customers may not act on location-scoped resources",
        )),
        Actor::Logistics { .. } | Actor::Manager { .. } | Actor::Admin { .. } => Ok(()),
    }
}
