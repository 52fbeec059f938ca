//! Postgres-backed store implementation.
//!
//! Orders and transfers are persisted as JSONB documents next to the columns
//! the queries filter on; inventory is a plain relational table because its
//! conditional decrement must be a single atomic statement:
//!
//! ```sql
//! UPDATE inventory SET quantity = quantity - $n
//! WHERE product_id = ... AND location_id = ... AND quantity >= $n
//! ```
//!
//! ## Error mapping
//!
//! | SQLx error | PostgreSQL code | StoreError |
//! |---|---|---|
//! | Database (unique violation) | `23505` | `Conflict` |
//! | Database (check violation) | `23514` | `Conflict` |
//! | Database (other) | any | `Unavailable` |
//! | PoolClosed / network | n/a | `Unavailable` |

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use sqlx::{PgPool, Row};
use std::sync::Arc;
use tracing::instrument;

use depotflow_catalog::{Location, Product};
use depotflow_core::{LocationId, OrderId, OrderItemId, ProductId, TransferId, UserId};
use depotflow_inventory::{DEFAULT_MAX_STOCK, DEFAULT_MIN_STOCK, InventoryRecord};
use depotflow_orders::Order;
use depotflow_transfers::Transfer;

use super::r#trait::{Store, StoreError};

/// Postgres-backed store.
///
/// Cloneable; all operations go through the SQLx connection pool, which
/// handles thread-safe connection management.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: Arc<PgPool>,
}

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS products (
        id UUID PRIMARY KEY,
        name TEXT NOT NULL,
        active BOOLEAN NOT NULL,
        doc JSONB NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS locations (
        id UUID PRIMARY KEY,
        name TEXT NOT NULL,
        active BOOLEAN NOT NULL,
        doc JSONB NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS inventory (
        product_id UUID NOT NULL,
        location_id UUID NOT NULL,
        quantity BIGINT NOT NULL CHECK (quantity >= 0),
        min_stock_level BIGINT NOT NULL,
        max_stock_level BIGINT NOT NULL,
        last_updated TIMESTAMPTZ NOT NULL,
        PRIMARY KEY (product_id, location_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS orders (
        id UUID PRIMARY KEY,
        customer_id UUID NOT NULL,
        order_number TEXT NOT NULL UNIQUE,
        idempotency_key TEXT UNIQUE,
        created_at TIMESTAMPTZ NOT NULL,
        doc JSONB NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS transfers (
        id UUID PRIMARY KEY,
        from_location UUID NOT NULL,
        to_location UUID NOT NULL,
        request_date TIMESTAMPTZ NOT NULL,
        doc JSONB NOT NULL
    )
    "#,
];

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Create the tables if they do not exist yet.
    #[instrument(skip(self), err)]
    pub async fn migrate(&self) -> Result<(), StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&*self.pool)
                .await
                .map_err(|e| map_sqlx_error("migrate", e))?;
        }
        Ok(())
    }
}

fn to_doc<T: Serialize>(value: &T) -> Result<serde_json::Value, StoreError> {
    serde_json::to_value(value).map_err(|e| StoreError::Serialization(e.to_string()))
}

fn from_doc<T: DeserializeOwned>(doc: serde_json::Value) -> Result<T, StoreError> {
    serde_json::from_value(doc).map_err(|e| StoreError::Serialization(e.to_string()))
}

fn doc_column<T: DeserializeOwned>(row: &sqlx::postgres::PgRow) -> Result<T, StoreError> {
    let doc: serde_json::Value = row
        .try_get("doc")
        .map_err(|e| StoreError::Serialization(e.to_string()))?;
    from_doc(doc)
}

fn record_from_row(row: &sqlx::postgres::PgRow) -> Result<InventoryRecord, StoreError> {
    let read = |e: sqlx::Error| StoreError::Serialization(e.to_string());
    Ok(InventoryRecord {
        product_id: ProductId::from_uuid(row.try_get("product_id").map_err(read)?),
        location_id: LocationId::from_uuid(row.try_get("location_id").map_err(read)?),
        quantity: row.try_get("quantity").map_err(read)?,
        min_stock_level: row.try_get("min_stock_level").map_err(read)?,
        max_stock_level: row.try_get("max_stock_level").map_err(read)?,
        last_updated: row.try_get("last_updated").map_err(read)?,
    })
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                // Unique violation / check violation: a guarantee we rely on.
                Some("23505") | Some("23514") => StoreError::Conflict(msg),
                _ => StoreError::Unavailable(msg),
            }
        }
        sqlx::Error::PoolClosed => {
            StoreError::Unavailable(format!("connection pool closed in {operation}"))
        }
        other => StoreError::Unavailable(format!("sqlx error in {operation}: {other}")),
    }
}

#[async_trait]
impl Store for PostgresStore {
    async fn insert_product(&self, product: Product) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO products (id, name, active, doc) VALUES ($1, $2, $3, $4)")
            .bind(product.id.as_uuid())
            .bind(&product.name)
            .bind(product.active)
            .bind(to_doc(&product)?)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("insert_product", e))?;
        Ok(())
    }

    async fn product(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        let row = sqlx::query("SELECT doc FROM products WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("product", e))?;
        row.map(|r| doc_column(&r)).transpose()
    }

    async fn active_products(&self) -> Result<Vec<Product>, StoreError> {
        let rows = sqlx::query("SELECT doc FROM products WHERE active ORDER BY name ASC")
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("active_products", e))?;
        rows.iter().map(doc_column).collect()
    }

    async fn insert_location(&self, location: Location) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO locations (id, name, active, doc) VALUES ($1, $2, $3, $4)")
            .bind(location.id.as_uuid())
            .bind(&location.name)
            .bind(location.active)
            .bind(to_doc(&location)?)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("insert_location", e))?;
        Ok(())
    }

    async fn location(&self, id: LocationId) -> Result<Option<Location>, StoreError> {
        let row = sqlx::query("SELECT doc FROM locations WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("location", e))?;
        row.map(|r| doc_column(&r)).transpose()
    }

    async fn active_locations(&self) -> Result<Vec<Location>, StoreError> {
        let rows = sqlx::query("SELECT doc FROM locations WHERE active ORDER BY name ASC")
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("active_locations", e))?;
        rows.iter().map(doc_column).collect()
    }

    async fn inventory_record(
        &self,
        product_id: ProductId,
        location_id: LocationId,
    ) -> Result<Option<InventoryRecord>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT product_id, location_id, quantity, min_stock_level, max_stock_level, last_updated
            FROM inventory
            WHERE product_id = $1 AND location_id = $2
            "#,
        )
        .bind(product_id.as_uuid())
        .bind(location_id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("inventory_record", e))?;
        row.map(|r| record_from_row(&r)).transpose()
    }

    async fn inventory_at(
        &self,
        location_id: LocationId,
    ) -> Result<Vec<InventoryRecord>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT product_id, location_id, quantity, min_stock_level, max_stock_level, last_updated
            FROM inventory
            WHERE location_id = $1
            ORDER BY product_id ASC
            "#,
        )
        .bind(location_id.as_uuid())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("inventory_at", e))?;
        rows.iter().map(record_from_row).collect()
    }

    async fn upsert_inventory(&self, record: InventoryRecord) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO inventory (product_id, location_id, quantity, min_stock_level, max_stock_level, last_updated)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (product_id, location_id)
            DO UPDATE SET
                quantity = EXCLUDED.quantity,
                min_stock_level = EXCLUDED.min_stock_level,
                max_stock_level = EXCLUDED.max_stock_level,
                last_updated = EXCLUDED.last_updated
            "#,
        )
        .bind(record.product_id.as_uuid())
        .bind(record.location_id.as_uuid())
        .bind(record.quantity)
        .bind(record.min_stock_level)
        .bind(record.max_stock_level)
        .bind(record.last_updated)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("upsert_inventory", e))?;
        Ok(())
    }

    async fn locations_with_stock(
        &self,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<Vec<InventoryRecord>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT product_id, location_id, quantity, min_stock_level, max_stock_level, last_updated
            FROM inventory
            WHERE product_id = $1 AND quantity >= $2
            ORDER BY quantity DESC, location_id ASC
            "#,
        )
        .bind(product_id.as_uuid())
        .bind(quantity)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("locations_with_stock", e))?;
        rows.iter().map(record_from_row).collect()
    }

    #[instrument(skip(self), fields(product_id = %product_id, location_id = %location_id))]
    async fn try_decrement_stock(
        &self,
        product_id: ProductId,
        location_id: LocationId,
        quantity: i64,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        if quantity <= 0 {
            return Ok(false);
        }

        // The WHERE clause carries the stock check, so check-and-subtract is
        // one atomic statement; a concurrent loser simply matches zero rows.
        let result = sqlx::query(
            r#"
            UPDATE inventory
            SET quantity = quantity - $3, last_updated = $4
            WHERE product_id = $1 AND location_id = $2 AND quantity >= $3
            "#,
        )
        .bind(product_id.as_uuid())
        .bind(location_id.as_uuid())
        .bind(quantity)
        .bind(now)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("try_decrement_stock", e))?;

        Ok(result.rows_affected() == 1)
    }

    async fn increment_stock(
        &self,
        product_id: ProductId,
        location_id: LocationId,
        quantity: i64,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO inventory (product_id, location_id, quantity, min_stock_level, max_stock_level, last_updated)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (product_id, location_id)
            DO UPDATE SET
                quantity = inventory.quantity + EXCLUDED.quantity,
                last_updated = EXCLUDED.last_updated
            "#,
        )
        .bind(product_id.as_uuid())
        .bind(location_id.as_uuid())
        .bind(quantity)
        .bind(DEFAULT_MIN_STOCK)
        .bind(DEFAULT_MAX_STOCK)
        .bind(now)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("increment_stock", e))?;
        Ok(())
    }

    async fn insert_order(
        &self,
        order: Order,
        idempotency_key: Option<String>,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO orders (id, customer_id, order_number, idempotency_key, created_at, doc)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(order.customer_id.as_uuid())
        .bind(order.order_number.as_str())
        .bind(idempotency_key)
        .bind(order.created_at)
        .bind(to_doc(&order)?)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_order", e))?;
        Ok(())
    }

    async fn order(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        let row = sqlx::query("SELECT doc FROM orders WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("order", e))?;
        row.map(|r| doc_column(&r)).transpose()
    }

    async fn order_by_idempotency_key(&self, key: &str) -> Result<Option<Order>, StoreError> {
        let row = sqlx::query("SELECT doc FROM orders WHERE idempotency_key = $1")
            .bind(key)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("order_by_idempotency_key", e))?;
        row.map(|r| doc_column(&r)).transpose()
    }

    async fn order_containing_item(
        &self,
        item_id: OrderItemId,
    ) -> Result<Option<Order>, StoreError> {
        let row = sqlx::query("SELECT doc FROM orders WHERE doc->'items' @> $1")
            .bind(serde_json::json!([{ "id": item_id }]))
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("order_containing_item", e))?;
        row.map(|r| doc_column(&r)).transpose()
    }

    async fn update_order(&self, order: &Order) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE orders SET doc = $2 WHERE id = $1")
            .bind(order.id.as_uuid())
            .bind(to_doc(order)?)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("update_order", e))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::Conflict(format!(
                "order {} does not exist",
                order.id
            )));
        }
        Ok(())
    }

    async fn orders_for_customer(&self, customer_id: UserId) -> Result<Vec<Order>, StoreError> {
        let rows = sqlx::query(
            "SELECT doc FROM orders WHERE customer_id = $1 ORDER BY created_at DESC",
        )
        .bind(customer_id.as_uuid())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("orders_for_customer", e))?;
        rows.iter().map(doc_column).collect()
    }

    async fn orders_with_pending_items_at(
        &self,
        location_id: LocationId,
    ) -> Result<Vec<Order>, StoreError> {
        let rows = sqlx::query(
            "SELECT doc FROM orders WHERE doc->'items' @> $1 ORDER BY created_at ASC",
        )
        .bind(serde_json::json!([{ "location_id": location_id, "status": "pending" }]))
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("orders_with_pending_items_at", e))?;
        rows.iter().map(doc_column).collect()
    }

    async fn insert_transfer(&self, transfer: Transfer) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO transfers (id, from_location, to_location, request_date, doc)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(transfer.id.as_uuid())
        .bind(transfer.from_location.as_uuid())
        .bind(transfer.to_location.as_uuid())
        .bind(transfer.request_date)
        .bind(to_doc(&transfer)?)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_transfer", e))?;
        Ok(())
    }

    async fn transfer(&self, id: TransferId) -> Result<Option<Transfer>, StoreError> {
        let row = sqlx::query("SELECT doc FROM transfers WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("transfer", e))?;
        row.map(|r| doc_column(&r)).transpose()
    }

    async fn update_transfer(&self, transfer: &Transfer) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE transfers SET doc = $2 WHERE id = $1")
            .bind(transfer.id.as_uuid())
            .bind(to_doc(transfer)?)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("update_transfer", e))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::Conflict(format!(
                "transfer {} does not exist",
                transfer.id
            )));
        }
        Ok(())
    }

    async fn transfers_touching(
        &self,
        location_id: LocationId,
    ) -> Result<Vec<Transfer>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT doc FROM transfers
            WHERE from_location = $1 OR to_location = $1
            ORDER BY request_date DESC
            "#,
        )
        .bind(location_id.as_uuid())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("transfers_touching", e))?;
        rows.iter().map(doc_column).collect()
    }
}
