//! Inventory views and manual restock.

use chrono::Utc;
use tracing::{info, instrument};

use depotflow_auth::{Actor, Role, ensure_location, ensure_role};
use depotflow_core::{DomainError, LocationId, ProductId};
use depotflow_inventory::{DEFAULT_MAX_STOCK, DEFAULT_MIN_STOCK, InventoryRecord};

use super::{ServiceError, Services};

/// Manual stock/threshold maintenance for one `(product, location)` pair.
#[derive(Debug, Clone)]
pub struct RestockRequest {
    pub product_id: ProductId,
    pub location_id: LocationId,
    pub quantity: i64,
    /// Absent fields keep the existing thresholds (or the defaults for a new
    /// record).
    pub min_stock_level: Option<i64>,
    pub max_stock_level: Option<i64>,
}

impl Services {
    /// The full inventory of one location. Staff see their own location;
    /// managers and admins any.
    pub async fn location_inventory(
        &self,
        actor: &Actor,
        location_id: LocationId,
    ) -> Result<Vec<InventoryRecord>, ServiceError> {
        ensure_role(actor, &[Role::LocationStaff, Role::Manager, Role::Admin])?;
        ensure_location(actor, location_id)?;
        Ok(self.store().inventory_at(location_id).await?)
    }

    /// The calling staff member's own inventory.
    pub async fn my_inventory(&self, actor: &Actor) -> Result<Vec<InventoryRecord>, ServiceError> {
        ensure_role(actor, &[Role::LocationStaff])?;
        let location = actor
            .location()
            .ok_or_else(|| DomainError::validation("actor has no location binding"))?;
        Ok(self.store().inventory_at(location).await?)
    }

    /// Set a pair's on-hand quantity and thresholds.
    #[instrument(skip(self, actor, request), fields(actor = %actor.id()))]
    pub async fn restock(
        &self,
        actor: &Actor,
        request: RestockRequest,
    ) -> Result<InventoryRecord, ServiceError> {
        ensure_role(actor, &[Role::LocationStaff, Role::Admin])?;
        ensure_location(actor, request.location_id)?;

        self.store()
            .product(request.product_id)
            .await?
            .ok_or_else(|| DomainError::not_found("product"))?;
        self.store()
            .location(request.location_id)
            .await?
            .ok_or_else(|| DomainError::not_found("location"))?;

        let existing = self
            .store()
            .inventory_record(request.product_id, request.location_id)
            .await?;
        let (current_min, current_max) = existing
            .map(|r| (r.min_stock_level, r.max_stock_level))
            .unwrap_or((DEFAULT_MIN_STOCK, DEFAULT_MAX_STOCK));

        let record = InventoryRecord::new(
            request.product_id,
            request.location_id,
            request.quantity,
            request.min_stock_level.unwrap_or(current_min),
            request.max_stock_level.unwrap_or(current_max),
            Utc::now(),
        )?;

        self.store().upsert_inventory(record.clone()).await?;
        info!(
            product = %record.product_id,
            location = %record.location_id,
            quantity = record.quantity,
            "inventory restocked"
        );
        Ok(record)
    }
}
