use serde::{Deserialize, Serialize};

/// Role carried by every authenticated actor.
///
/// Roles are a closed set: each maps to one arm of [`crate::Actor`], which is
/// where role-specific data (location bindings) lives.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Orders goods; may carry a preferred home location.
    Customer,
    /// Staff of exactly one distribution-center location.
    LocationStaff,
    /// Moves order items through delivery statuses at any location.
    Logistics,
    /// Read-mostly oversight across all locations.
    Manager,
    /// Full access.
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::LocationStaff => "location_staff",
            Role::Logistics => "logistics",
            Role::Manager => "manager",
            Role::Admin => "admin",
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
