use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use depotflow_core::{DomainError, DomainResult, LocationId, ProductId};

/// Thresholds applied when a record is created implicitly (e.g. the first
/// time stock arrives at a location via a transfer).
pub const DEFAULT_MIN_STOCK: i64 = 10;
pub const DEFAULT_MAX_STOCK: i64 = 100;

/// On-hand stock of one product at one location.
///
/// Exactly one record exists per `(product_id, location_id)` pair; the store
/// enforces that uniqueness. `quantity` never goes negative: every mutation
/// here checks before writing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryRecord {
    pub product_id: ProductId,
    pub location_id: LocationId,
    pub quantity: i64,
    pub min_stock_level: i64,
    pub max_stock_level: i64,
    pub last_updated: DateTime<Utc>,
}

impl InventoryRecord {
    pub fn new(
        product_id: ProductId,
        location_id: LocationId,
        quantity: i64,
        min_stock_level: i64,
        max_stock_level: i64,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if quantity < 0 {
            return Err(DomainError::validation("quantity cannot be negative"));
        }
        if min_stock_level < 0 || max_stock_level < 0 {
            return Err(DomainError::validation("stock levels cannot be negative"));
        }
        if min_stock_level > max_stock_level {
            return Err(DomainError::validation(
                "min stock level cannot exceed max stock level",
            ));
        }

        Ok(Self {
            product_id,
            location_id,
            quantity,
            min_stock_level,
            max_stock_level,
            last_updated: now,
        })
    }

    /// A fresh record with the default thresholds, as created implicitly when
    /// a transfer delivers a product the destination has never stocked.
    pub fn with_default_levels(
        product_id: ProductId,
        location_id: LocationId,
        quantity: i64,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        Self::new(
            product_id,
            location_id,
            quantity,
            DEFAULT_MIN_STOCK,
            DEFAULT_MAX_STOCK,
            now,
        )
    }

    pub fn has_at_least(&self, qty: i64) -> bool {
        self.quantity >= qty
    }

    /// Remove stock. Fails without mutating if `qty` is non-positive or
    /// exceeds what's on hand.
    pub fn decrement(&mut self, qty: i64, now: DateTime<Utc>) -> DomainResult<()> {
        if qty <= 0 {
            return Err(DomainError::validation("quantity must be positive"));
        }
        if self.quantity < qty {
            return Err(DomainError::invalid_state(format!(
                "cannot remove {qty} units, only {} on hand",
                self.quantity
            )));
        }
        self.quantity -= qty;
        self.last_updated = now;
        Ok(())
    }

    /// Return stock (cancellation reversal, transfer arrival, restock).
    pub fn increment(&mut self, qty: i64, now: DateTime<Utc>) -> DomainResult<()> {
        if qty <= 0 {
            return Err(DomainError::validation("quantity must be positive"));
        }
        self.quantity += qty;
        self.last_updated = now;
        Ok(())
    }

    /// Low-stock indicator surfaced by the inventory views.
    pub fn is_below_min(&self) -> bool {
        self.quantity < self.min_stock_level
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(quantity: i64) -> InventoryRecord {
        InventoryRecord::with_default_levels(
            ProductId::new(),
            LocationId::new(),
            quantity,
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn decrement_within_stock_succeeds() {
        let mut r = record(100);
        r.decrement(30, Utc::now()).unwrap();
        assert_eq!(r.quantity, 70);
    }

    #[test]
    fn decrement_below_zero_is_rejected_without_mutation() {
        let mut r = record(20);
        let err = r.decrement(21, Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::InvalidState(_)));
        assert_eq!(r.quantity, 20);
    }

    #[test]
    fn zero_and_negative_deltas_are_rejected() {
        let mut r = record(20);
        assert!(r.decrement(0, Utc::now()).is_err());
        assert!(r.increment(-5, Utc::now()).is_err());
        assert_eq!(r.quantity, 20);
    }

    #[test]
    fn increment_reverses_decrement_exactly() {
        let mut r = record(100);
        r.decrement(30, Utc::now()).unwrap();
        r.increment(30, Utc::now()).unwrap();
        assert_eq!(r.quantity, 100);
    }

    #[test]
    fn below_min_flag_tracks_threshold() {
        let mut r = record(DEFAULT_MIN_STOCK);
        assert!(!r.is_below_min());
        r.decrement(1, Utc::now()).unwrap();
        assert!(r.is_below_min());
    }

    #[test]
    fn min_above_max_is_rejected() {
        let err = InventoryRecord::new(ProductId::new(), LocationId::new(), 0, 50, 10, Utc::now())
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }
}
