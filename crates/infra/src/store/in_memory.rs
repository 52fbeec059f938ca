use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use depotflow_catalog::{Location, Product};
use depotflow_core::{LocationId, OrderId, OrderItemId, ProductId, TransferId, UserId};
use depotflow_inventory::InventoryRecord;
use depotflow_orders::{Order, OrderStatus};
use depotflow_transfers::Transfer;

use super::r#trait::{Store, StoreError};

#[derive(Debug, Default)]
struct Collections {
    products: HashMap<ProductId, Product>,
    locations: HashMap<LocationId, Location>,
    inventory: HashMap<(ProductId, LocationId), InventoryRecord>,
    orders: HashMap<OrderId, Order>,
    order_numbers: HashMap<String, OrderId>,
    idempotency_keys: HashMap<String, OrderId>,
    transfers: HashMap<TransferId, Transfer>,
}

/// In-memory store.
///
/// Intended for tests/dev. All mutations take the single write lock, which
/// trivially makes the conditional decrement atomic.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    collections: RwLock<Collections>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Collections>, StoreError> {
        self.collections
            .read()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Collections>, StoreError> {
        self.collections
            .write()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn insert_product(&self, product: Product) -> Result<(), StoreError> {
        let mut c = self.write()?;
        if c.products.contains_key(&product.id) {
            return Err(StoreError::Conflict(format!(
                "product {} already exists",
                product.id
            )));
        }
        c.products.insert(product.id, product);
        Ok(())
    }

    async fn product(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        Ok(self.read()?.products.get(&id).cloned())
    }

    async fn active_products(&self) -> Result<Vec<Product>, StoreError> {
        let mut products: Vec<Product> = self
            .read()?
            .products
            .values()
            .filter(|p| p.active)
            .cloned()
            .collect();
        products.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(products)
    }

    async fn insert_location(&self, location: Location) -> Result<(), StoreError> {
        let mut c = self.write()?;
        if c.locations.contains_key(&location.id) {
            return Err(StoreError::Conflict(format!(
                "location {} already exists",
                location.id
            )));
        }
        c.locations.insert(location.id, location);
        Ok(())
    }

    async fn location(&self, id: LocationId) -> Result<Option<Location>, StoreError> {
        Ok(self.read()?.locations.get(&id).cloned())
    }

    async fn active_locations(&self) -> Result<Vec<Location>, StoreError> {
        let mut locations: Vec<Location> = self
            .read()?
            .locations
            .values()
            .filter(|l| l.active)
            .cloned()
            .collect();
        locations.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(locations)
    }

    async fn inventory_record(
        &self,
        product_id: ProductId,
        location_id: LocationId,
    ) -> Result<Option<InventoryRecord>, StoreError> {
        Ok(self.read()?.inventory.get(&(product_id, location_id)).cloned())
    }

    async fn inventory_at(
        &self,
        location_id: LocationId,
    ) -> Result<Vec<InventoryRecord>, StoreError> {
        let mut records: Vec<InventoryRecord> = self
            .read()?
            .inventory
            .values()
            .filter(|r| r.location_id == location_id)
            .cloned()
            .collect();
        records.sort_by_key(|r| r.product_id);
        Ok(records)
    }

    async fn upsert_inventory(&self, record: InventoryRecord) -> Result<(), StoreError> {
        let mut c = self.write()?;
        c.inventory
            .insert((record.product_id, record.location_id), record);
        Ok(())
    }

    async fn locations_with_stock(
        &self,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<Vec<InventoryRecord>, StoreError> {
        let mut candidates: Vec<InventoryRecord> = self
            .read()?
            .inventory
            .values()
            .filter(|r| r.product_id == product_id && r.has_at_least(quantity))
            .cloned()
            .collect();
        // Highest quantity first, ties broken by lowest location id.
        candidates.sort_by(|a, b| {
            b.quantity
                .cmp(&a.quantity)
                .then_with(|| a.location_id.cmp(&b.location_id))
        });
        Ok(candidates)
    }

    async fn try_decrement_stock(
        &self,
        product_id: ProductId,
        location_id: LocationId,
        quantity: i64,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let mut c = self.write()?;
        match c.inventory.get_mut(&(product_id, location_id)) {
            Some(record) if record.has_at_least(quantity) && quantity > 0 => {
                record.quantity -= quantity;
                record.last_updated = now;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn increment_stock(
        &self,
        product_id: ProductId,
        location_id: LocationId,
        quantity: i64,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut c = self.write()?;
        match c.inventory.get_mut(&(product_id, location_id)) {
            Some(record) => {
                record.quantity += quantity;
                record.last_updated = now;
            }
            None => {
                let record =
                    InventoryRecord::with_default_levels(product_id, location_id, quantity, now)
                        .map_err(|e| StoreError::Serialization(e.to_string()))?;
                c.inventory.insert((product_id, location_id), record);
            }
        }
        Ok(())
    }

    async fn insert_order(
        &self,
        order: Order,
        idempotency_key: Option<String>,
    ) -> Result<(), StoreError> {
        let mut c = self.write()?;
        if c.orders.contains_key(&order.id) {
            return Err(StoreError::Conflict(format!("order {} already exists", order.id)));
        }
        let number = order.order_number.as_str().to_string();
        if c.order_numbers.contains_key(&number) {
            return Err(StoreError::Conflict(format!("order number {number} already taken")));
        }
        if let Some(key) = &idempotency_key {
            if c.idempotency_keys.contains_key(key) {
                return Err(StoreError::Conflict(format!(
                    "idempotency key {key} already used"
                )));
            }
        }

        if let Some(key) = idempotency_key {
            c.idempotency_keys.insert(key, order.id);
        }
        c.order_numbers.insert(number, order.id);
        c.orders.insert(order.id, order);
        Ok(())
    }

    async fn order(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        Ok(self.read()?.orders.get(&id).cloned())
    }

    async fn order_by_idempotency_key(&self, key: &str) -> Result<Option<Order>, StoreError> {
        let c = self.read()?;
        Ok(c.idempotency_keys
            .get(key)
            .and_then(|id| c.orders.get(id))
            .cloned())
    }

    async fn order_containing_item(
        &self,
        item_id: OrderItemId,
    ) -> Result<Option<Order>, StoreError> {
        Ok(self
            .read()?
            .orders
            .values()
            .find(|o| o.items.iter().any(|i| i.id == item_id))
            .cloned())
    }

    async fn update_order(&self, order: &Order) -> Result<(), StoreError> {
        let mut c = self.write()?;
        if !c.orders.contains_key(&order.id) {
            return Err(StoreError::Conflict(format!(
                "order {} does not exist",
                order.id
            )));
        }
        c.orders.insert(order.id, order.clone());
        Ok(())
    }

    async fn orders_for_customer(&self, customer_id: UserId) -> Result<Vec<Order>, StoreError> {
        let mut orders: Vec<Order> = self
            .read()?
            .orders
            .values()
            .filter(|o| o.customer_id == customer_id)
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn orders_with_pending_items_at(
        &self,
        location_id: LocationId,
    ) -> Result<Vec<Order>, StoreError> {
        let mut orders: Vec<Order> = self
            .read()?
            .orders
            .values()
            .filter(|o| {
                o.items
                    .iter()
                    .any(|i| i.location_id == location_id && i.status == OrderStatus::Pending)
            })
            .cloned()
            .collect();
        orders.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(orders)
    }

    async fn insert_transfer(&self, transfer: Transfer) -> Result<(), StoreError> {
        let mut c = self.write()?;
        if c.transfers.contains_key(&transfer.id) {
            return Err(StoreError::Conflict(format!(
                "transfer {} already exists",
                transfer.id
            )));
        }
        c.transfers.insert(transfer.id, transfer);
        Ok(())
    }

    async fn transfer(&self, id: TransferId) -> Result<Option<Transfer>, StoreError> {
        Ok(self.read()?.transfers.get(&id).cloned())
    }

    async fn update_transfer(&self, transfer: &Transfer) -> Result<(), StoreError> {
        let mut c = self.write()?;
        if !c.transfers.contains_key(&transfer.id) {
            return Err(StoreError::Conflict(format!(
                "transfer {} does not exist",
                transfer.id
            )));
        }
        c.transfers.insert(transfer.id, transfer.clone());
        Ok(())
    }

    async fn transfers_touching(
        &self,
        location_id: LocationId,
    ) -> Result<Vec<Transfer>, StoreError> {
        let mut transfers: Vec<Transfer> = self
            .read()?
            .transfers
            .values()
            .filter(|t| t.from_location == location_id || t.to_location == location_id)
            .cloned()
            .collect();
        transfers.sort_by(|a, b| b.request_date.cmp(&a.request_date));
        Ok(transfers)
    }
}
