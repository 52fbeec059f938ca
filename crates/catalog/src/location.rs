use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use depotflow_core::{DomainError, DomainResult, LocationId};

/// A distribution-center location: the unit of inventory partitioning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub id: LocationId,
    pub name: String,
    pub region: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl Location {
    pub fn new(
        id: LocationId,
        name: impl Into<String>,
        region: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("location name cannot be empty"));
        }

        Ok(Self {
            id,
            name,
            region: region.into(),
            active: true,
            created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_location_is_active() {
        let l = Location::new(LocationId::new(), "North RDC", "north", Utc::now()).unwrap();
        assert!(l.active);
    }

    #[test]
    fn rejects_blank_name() {
        let err = Location::new(LocationId::new(), " ", "north", Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }
}
