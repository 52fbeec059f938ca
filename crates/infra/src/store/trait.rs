use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use depotflow_catalog::{Location, Product};
use depotflow_core::{LocationId, OrderId, OrderItemId, ProductId, TransferId, UserId};
use depotflow_inventory::InventoryRecord;
use depotflow_orders::Order;
use depotflow_transfers::Transfer;

/// Store operation error.
///
/// These are **infrastructure errors** (storage, connectivity, uniqueness) as
/// opposed to domain errors (validation, invariants).
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing storage could not be reached or failed mid-operation.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A stored document could not be (de)serialized.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// A uniqueness guarantee was violated (duplicate id, order number or
    /// idempotency key).
    #[error("conflict: {0}")]
    Conflict(String),
}

/// The shared persistent store.
///
/// ## Design notes
///
/// - **Atomic conditional decrement**: `try_decrement_stock` is the one
///   operation where correctness under concurrency matters. Implementations
///   must make "check quantity ≥ n, then subtract n" a single atomic step;
///   callers treat a `false` return as "no stock here" and move on.
/// - **Upsert-on-increment**: `increment_stock` creates the record with the
///   default thresholds when the pair has never been stocked (a transfer can
///   deliver a product the destination has no record for).
/// - **Uniqueness**: exactly one inventory record per `(product, location)`
///   pair; order numbers and idempotency keys are unique across orders.
/// - **Deterministic candidate order**: `locations_with_stock` returns
///   sufficient records sorted by highest quantity first, ties broken by
///   lowest location id.
#[async_trait]
pub trait Store: Send + Sync {
    // ── catalog ──────────────────────────────────────────────────────────

    async fn insert_product(&self, product: Product) -> Result<(), StoreError>;

    async fn product(&self, id: ProductId) -> Result<Option<Product>, StoreError>;

    async fn active_products(&self) -> Result<Vec<Product>, StoreError>;

    async fn insert_location(&self, location: Location) -> Result<(), StoreError>;

    async fn location(&self, id: LocationId) -> Result<Option<Location>, StoreError>;

    async fn active_locations(&self) -> Result<Vec<Location>, StoreError>;

    // ── inventory ────────────────────────────────────────────────────────

    async fn inventory_record(
        &self,
        product_id: ProductId,
        location_id: LocationId,
    ) -> Result<Option<InventoryRecord>, StoreError>;

    async fn inventory_at(&self, location_id: LocationId)
        -> Result<Vec<InventoryRecord>, StoreError>;

    /// Insert or replace the record for the pair (manual restock / threshold
    /// maintenance).
    async fn upsert_inventory(&self, record: InventoryRecord) -> Result<(), StoreError>;

    /// All records holding at least `quantity` of the product, best candidate
    /// first (see trait docs for the ordering).
    async fn locations_with_stock(
        &self,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<Vec<InventoryRecord>, StoreError>;

    /// Atomically decrement the pair's quantity by `quantity` iff at least
    /// that much is on hand. Returns whether the decrement was applied.
    async fn try_decrement_stock(
        &self,
        product_id: ProductId,
        location_id: LocationId,
        quantity: i64,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError>;

    /// Atomically add stock to the pair, creating the record with default
    /// thresholds if it does not exist.
    async fn increment_stock(
        &self,
        product_id: ProductId,
        location_id: LocationId,
        quantity: i64,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    // ── orders ───────────────────────────────────────────────────────────

    /// Persist a freshly created order. When `idempotency_key` is given, a
    /// replayed insert under the same key fails with [`StoreError::Conflict`].
    async fn insert_order(
        &self,
        order: Order,
        idempotency_key: Option<String>,
    ) -> Result<(), StoreError>;

    async fn order(&self, id: OrderId) -> Result<Option<Order>, StoreError>;

    async fn order_by_idempotency_key(&self, key: &str) -> Result<Option<Order>, StoreError>;

    /// The order embedding the given item, if any.
    async fn order_containing_item(
        &self,
        item_id: OrderItemId,
    ) -> Result<Option<Order>, StoreError>;

    async fn update_order(&self, order: &Order) -> Result<(), StoreError>;

    async fn orders_for_customer(&self, customer_id: UserId) -> Result<Vec<Order>, StoreError>;

    /// Orders that still have a pending item bound to the location (the staff
    /// fulfillment queue).
    async fn orders_with_pending_items_at(
        &self,
        location_id: LocationId,
    ) -> Result<Vec<Order>, StoreError>;

    // ── transfers ────────────────────────────────────────────────────────

    async fn insert_transfer(&self, transfer: Transfer) -> Result<(), StoreError>;

    async fn transfer(&self, id: TransferId) -> Result<Option<Transfer>, StoreError>;

    async fn update_transfer(&self, transfer: &Transfer) -> Result<(), StoreError>;

    /// Transfers where the location is source or destination.
    async fn transfers_touching(
        &self,
        location_id: LocationId,
    ) -> Result<Vec<Transfer>, StoreError>;
}
