use serde::Deserialize;
use serde_json::json;

use depotflow_core::{LocationId, OrderItemId, ProductId};
use depotflow_infra::services::NewOrderItem;
use depotflow_inventory::InventoryRecord;
use depotflow_orders::{Order, OrderStatus, PaymentStatus};
use depotflow_transfers::TransferLine;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub items: Vec<NewOrderItem>,
    pub delivery_address: String,
    pub payment_status: Option<PaymentStatus>,
    pub idempotency_key: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateItemStatusRequest {
    pub order_item_id: OrderItemId,
    pub status: OrderStatus,
}

#[derive(Debug, Deserialize)]
pub struct CancelItemRequest {
    pub order_item_id: OrderItemId,
    pub reason: String,
}

#[derive(Debug, Deserialize)]
pub struct RestockRequestBody {
    pub product_id: ProductId,
    pub location_id: LocationId,
    pub quantity: i64,
    pub min_stock_level: Option<i64>,
    pub max_stock_level: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct RequestTransferBody {
    pub to_location: LocationId,
    pub items: Vec<TransferLine>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DecideTransferBody {
    pub status: String,
    pub rejection_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub unit: String,
    pub price: u64,
    pub category: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateLocationRequest {
    pub name: String,
    pub region: String,
}

// -------------------------
// Response mapping helpers
// -------------------------

pub fn inventory_to_json(record: &InventoryRecord) -> serde_json::Value {
    json!({
        "product_id": record.product_id,
        "location_id": record.location_id,
        "quantity": record.quantity,
        "min_stock_level": record.min_stock_level,
        "max_stock_level": record.max_stock_level,
        "last_updated": record.last_updated,
        "low_stock": record.is_below_min(),
    })
}

pub fn order_created_json(order: &Order) -> serde_json::Value {
    json!({
        "message": "order created successfully",
        "order_id": order.id,
        "order_number": order.order_number,
        "invoice_number": order.invoice_number,
        "total_amount": order.total_amount,
    })
}
