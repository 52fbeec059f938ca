use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use depotflow_core::{DomainError, DomainResult, ProductId};

/// Catalog product.
///
/// Immutable reference data as far as the engines are concerned: fulfillment
/// reads the name (for error messages) and the price (for the unit-price
/// snapshot on order items) and never writes back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    /// Unit label shown alongside quantities (e.g. "kg", "case").
    pub unit: String,
    /// Price in smallest currency unit (e.g., cents).
    pub price: u64,
    pub category: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl Product {
    pub fn new(
        id: ProductId,
        name: impl Into<String>,
        description: impl Into<String>,
        unit: impl Into<String>,
        price: u64,
        category: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("product name cannot be empty"));
        }
        let unit = unit.into();
        if unit.trim().is_empty() {
            return Err(DomainError::validation("product unit cannot be empty"));
        }
        if price == 0 {
            return Err(DomainError::validation("product price must be positive"));
        }

        Ok(Self {
            id,
            name,
            description: description.into(),
            unit,
            price,
            category: category.into(),
            active: true,
            created_at,
        })
    }

    /// Check whether the product can be ordered.
    pub fn is_orderable(&self) -> bool {
        self.active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_product_is_active_and_orderable() {
        let p = Product::new(
            ProductId::new(),
            "Basmati Rice 5kg",
            "Long grain",
            "bag",
            1250,
            "grains",
            Utc::now(),
        )
        .unwrap();
        assert!(p.is_orderable());
    }

    #[test]
    fn rejects_blank_name_and_zero_price() {
        let err = Product::new(ProductId::new(), "  ", "", "bag", 100, "grains", Utc::now())
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        let err = Product::new(ProductId::new(), "Rice", "", "bag", 0, "grains", Utc::now())
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn deactivated_product_is_not_orderable() {
        let mut p = Product::new(
            ProductId::new(),
            "Rice",
            "",
            "bag",
            1250,
            "grains",
            Utc::now(),
        )
        .unwrap();
        p.active = false;
        assert!(!p.is_orderable());
    }
}
