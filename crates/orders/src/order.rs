use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use depotflow_core::{DomainError, DomainResult, LocationId, OrderId, OrderItemId, ProductId, UserId};

use crate::number::{InvoiceNumber, OrderNumber};

/// Status of an order or of a single item within it.
///
/// Items and the order share the same vocabulary on the wire; the order-level
/// value is always derived from the items via [`derive_order_status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Processing,
    Dispatched,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Terminal statuses admit no further transition; only the cancellation
    /// flow inspects them explicitly (and refuses both).
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }
}

impl core::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Dispatched => "dispatched",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
}

/// One line of an order, bound at creation time to the location that
/// fulfilled it (and whose stock was decremented for it).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub product_id: ProductId,
    pub location_id: LocationId,
    pub quantity: i64,
    /// Price snapshot in smallest currency unit, taken from the catalog when
    /// the order was placed.
    pub unit_price: u64,
    pub status: OrderStatus,
}

impl OrderItem {
    pub fn new(
        id: OrderItemId,
        product_id: ProductId,
        location_id: LocationId,
        quantity: i64,
        unit_price: u64,
    ) -> DomainResult<Self> {
        if quantity <= 0 {
            return Err(DomainError::validation("item quantity must be positive"));
        }

        Ok(Self {
            id,
            product_id,
            location_id,
            quantity,
            unit_price,
            status: OrderStatus::Pending,
        })
    }

    pub fn line_total(&self) -> u64 {
        self.unit_price * self.quantity as u64
    }

    /// Move the item through the delivery pipeline.
    ///
    /// Cancellation is a separate flow with stock side effects, so `cancelled`
    /// is not a legal target here.
    pub fn transition(&mut self, to: OrderStatus) -> DomainResult<()> {
        if self.status.is_terminal() {
            return Err(DomainError::invalid_transition(format!(
                "item is already {}",
                self.status
            )));
        }
        if to == OrderStatus::Cancelled {
            return Err(DomainError::invalid_transition(
                "items are cancelled through the cancellation flow, not a status update",
            ));
        }
        self.status = to;
        Ok(())
    }

    /// Mark the item cancelled. The caller is responsible for restoring the
    /// item's quantity to its bound location's stock.
    pub fn cancel(&mut self) -> DomainResult<()> {
        if self.status.is_terminal() {
            return Err(DomainError::invalid_transition(format!(
                "cannot cancel an item that is already {}",
                self.status
            )));
        }
        self.status = OrderStatus::Cancelled;
        Ok(())
    }
}

/// Derive the order-level status from its items' statuses.
///
/// Pure and idempotent. An order counts as delivered only once every
/// non-cancelled item has been delivered; a partially delivered order reports
/// `dispatched` (goods are on the move or already arrived).
pub fn derive_order_status(statuses: &[OrderStatus]) -> OrderStatus {
    if statuses.is_empty() {
        return OrderStatus::Pending;
    }
    if statuses.iter().all(|s| *s == OrderStatus::Cancelled) {
        return OrderStatus::Cancelled;
    }
    if statuses
        .iter()
        .filter(|s| **s != OrderStatus::Cancelled)
        .all(|s| *s == OrderStatus::Delivered)
    {
        return OrderStatus::Delivered;
    }
    if statuses
        .iter()
        .any(|s| matches!(s, OrderStatus::Delivered | OrderStatus::Dispatched))
    {
        return OrderStatus::Dispatched;
    }
    if statuses.iter().any(|s| *s == OrderStatus::Processing) {
        return OrderStatus::Processing;
    }
    OrderStatus::Pending
}

/// The order aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub order_number: OrderNumber,
    pub invoice_number: InvoiceNumber,
    pub customer_id: UserId,
    pub items: Vec<OrderItem>,
    /// Sum of the items' line totals, computed at creation.
    pub total_amount: u64,
    pub delivery_address: String,
    pub order_status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub created_at: DateTime<Utc>,
}

impl Order {
    pub fn new(
        id: OrderId,
        order_number: OrderNumber,
        invoice_number: InvoiceNumber,
        customer_id: UserId,
        items: Vec<OrderItem>,
        delivery_address: impl Into<String>,
        payment_status: PaymentStatus,
        created_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if items.is_empty() {
            return Err(DomainError::validation("order must contain at least one item"));
        }
        let delivery_address = delivery_address.into();
        if delivery_address.trim().is_empty() {
            return Err(DomainError::validation("delivery address cannot be empty"));
        }

        let total_amount = items.iter().map(OrderItem::line_total).sum();
        let order_status = derive_order_status(
            &items.iter().map(|i| i.status).collect::<Vec<_>>(),
        );

        Ok(Self {
            id,
            order_number,
            invoice_number,
            customer_id,
            items,
            total_amount,
            delivery_address,
            order_status,
            payment_status,
            created_at,
        })
    }

    pub fn item(&self, item_id: OrderItemId) -> Option<&OrderItem> {
        self.items.iter().find(|i| i.id == item_id)
    }

    pub fn item_mut(&mut self, item_id: OrderItemId) -> Option<&mut OrderItem> {
        self.items.iter_mut().find(|i| i.id == item_id)
    }

    /// Re-derive the order-level status after an item mutation.
    pub fn recompute_status(&mut self) {
        let statuses: Vec<OrderStatus> = self.items.iter().map(|i| i.status).collect();
        self.order_status = derive_order_status(&statuses);
    }
}
