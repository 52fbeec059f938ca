//! Order engines: fulfillment, item status updates, cancellation/reversal.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Deserialize;
use tracing::{info, instrument, warn};

use depotflow_auth::{Actor, Role, ensure_location, ensure_role};
use depotflow_catalog::Product;
use depotflow_core::{DomainError, LocationId, OrderId, OrderItemId, ProductId};
use depotflow_orders::{
    InvoiceNumber, Order, OrderItem, OrderNumber, OrderStatus, PaymentStatus,
};

use super::{ServiceError, Services};
use crate::store::StoreError;

/// One requested line of a new order.
#[derive(Debug, Clone, Deserialize)]
pub struct NewOrderItem {
    pub product_id: ProductId,
    pub quantity: i64,
}

/// A checkout request.
#[derive(Debug, Clone)]
pub struct PlaceOrder {
    pub items: Vec<NewOrderItem>,
    pub delivery_address: String,
    pub payment_status: PaymentStatus,
    /// Client-supplied replay guard: resubmitting the same key returns the
    /// order created the first time instead of decrementing stock again.
    pub idempotency_key: Option<String>,
}

impl Services {
    /// Place an order: bind every requested line to a location with enough
    /// stock, decrement that stock, and persist the order — or fail as a
    /// whole, putting back anything already decremented.
    #[instrument(skip(self, actor, request), fields(customer = %actor.id()))]
    pub async fn place_order(
        &self,
        actor: &Actor,
        request: PlaceOrder,
    ) -> Result<Order, ServiceError> {
        ensure_role(actor, &[Role::Customer])?;

        if request.items.is_empty() {
            return Err(DomainError::validation("no items in order").into());
        }
        if request.delivery_address.trim().is_empty() {
            return Err(DomainError::validation("delivery address is required").into());
        }
        if request.items.iter().any(|i| i.quantity <= 0) {
            return Err(DomainError::validation("item quantities must be positive").into());
        }

        if let Some(key) = &request.idempotency_key {
            if let Some(existing) = self.store().order_by_idempotency_key(key).await? {
                info!(order_number = %existing.order_number, "replayed idempotent order creation");
                return Ok(existing);
            }
        }

        let home_location = actor.location();
        let now = Utc::now();

        // Everything decremented so far, so a late failure can put it back.
        let mut decremented: Vec<(ProductId, LocationId, i64)> = Vec::new();
        let mut items: Vec<OrderItem> = Vec::new();

        for line in &request.items {
            let product = match self.store().product(line.product_id).await? {
                Some(p) if p.is_orderable() => p,
                _ => {
                    self.release_stock(&decremented).await?;
                    return Err(DomainError::not_found("product").into());
                }
            };

            let location = match self
                .reserve_stock(&product, line.quantity, home_location, now)
                .await
            {
                Ok(Some(location)) => location,
                Ok(None) => {
                    self.release_stock(&decremented).await?;
                    return Err(DomainError::insufficient_stock(product.name).into());
                }
                Err(e) => {
                    self.release_stock(&decremented).await?;
                    return Err(e);
                }
            };

            decremented.push((line.product_id, location, line.quantity));
            items.push(OrderItem::new(
                OrderItemId::new(),
                line.product_id,
                location,
                line.quantity,
                product.price,
            )?);
        }

        let (order_suffix, invoice_suffix) = {
            let mut rng = rand::thread_rng();
            (rng.gen_range(0..1000), rng.gen_range(0..1000))
        };

        let order = match Order::new(
            OrderId::new(),
            OrderNumber::generate(now, order_suffix),
            InvoiceNumber::generate(now, invoice_suffix),
            actor.id(),
            items,
            request.delivery_address.clone(),
            request.payment_status,
            now,
        ) {
            Ok(order) => order,
            Err(e) => {
                self.release_stock(&decremented).await?;
                return Err(e.into());
            }
        };

        match self
            .store()
            .insert_order(order.clone(), request.idempotency_key.clone())
            .await
        {
            Ok(()) => {
                info!(
                    order_number = %order.order_number,
                    total_amount = order.total_amount,
                    item_count = order.items.len(),
                    "order placed"
                );
                Ok(order)
            }
            Err(StoreError::Conflict(msg)) if request.idempotency_key.is_some() => {
                // Lost a replay race: a concurrent request with the same key
                // won the insert. Put our decrements back and return the
                // winner's order.
                self.release_stock(&decremented).await?;
                if let Some(key) = &request.idempotency_key {
                    if let Some(existing) = self.store().order_by_idempotency_key(key).await? {
                        return Ok(existing);
                    }
                }
                Err(StoreError::Conflict(msg).into())
            }
            Err(e) => {
                self.release_stock(&decremented).await?;
                Err(e.into())
            }
        }
    }

    /// Decrement stock for one line at the preferred location, falling back
    /// to the best-stocked alternative. A lost decrement race counts as "no
    /// stock here" and moves on to the next candidate.
    async fn reserve_stock(
        &self,
        product: &Product,
        quantity: i64,
        preferred: Option<LocationId>,
        now: DateTime<Utc>,
    ) -> Result<Option<LocationId>, ServiceError> {
        if let Some(location) = preferred {
            if self
                .store()
                .try_decrement_stock(product.id, location, quantity, now)
                .await?
            {
                return Ok(Some(location));
            }
        }

        for candidate in self.store().locations_with_stock(product.id, quantity).await? {
            if Some(candidate.location_id) == preferred {
                continue;
            }
            if self
                .store()
                .try_decrement_stock(product.id, candidate.location_id, quantity, now)
                .await?
            {
                return Ok(Some(candidate.location_id));
            }
        }

        Ok(None)
    }

    async fn release_stock(
        &self,
        decremented: &[(ProductId, LocationId, i64)],
    ) -> Result<(), ServiceError> {
        for (product_id, location_id, quantity) in decremented {
            self.store()
                .increment_stock(*product_id, *location_id, *quantity, Utc::now())
                .await?;
        }
        Ok(())
    }

    /// Move a single item through the delivery pipeline and re-derive the
    /// order-level status.
    #[instrument(skip(self, actor), fields(actor = %actor.id()))]
    pub async fn update_item_status(
        &self,
        actor: &Actor,
        item_id: OrderItemId,
        status: OrderStatus,
    ) -> Result<Order, ServiceError> {
        ensure_role(actor, &[Role::LocationStaff, Role::Logistics, Role::Admin])?;

        let mut order = self
            .store()
            .order_containing_item(item_id)
            .await?
            .ok_or_else(|| DomainError::not_found("order item"))?;

        let item_location = order
            .item(item_id)
            .map(|i| i.location_id)
            .ok_or_else(|| DomainError::not_found("order item"))?;
        ensure_location(actor, item_location)?;

        order
            .item_mut(item_id)
            .ok_or_else(|| DomainError::not_found("order item"))?
            .transition(status)?;
        order.recompute_status();

        self.store().update_order(&order).await?;
        info!(order_number = %order.order_number, item = %item_id, %status, "item status updated");
        Ok(order)
    }

    /// Cancel a single item: restore its quantity to the location it was
    /// fulfilled from, mark it cancelled, and re-derive the order status.
    #[instrument(skip(self, actor, reason), fields(actor = %actor.id()))]
    pub async fn cancel_item(
        &self,
        actor: &Actor,
        item_id: OrderItemId,
        reason: &str,
    ) -> Result<Order, ServiceError> {
        ensure_role(actor, &[Role::LocationStaff, Role::Admin])?;

        if reason.trim().is_empty() {
            return Err(DomainError::validation("cancellation reason is required").into());
        }

        let mut order = self
            .store()
            .order_containing_item(item_id)
            .await?
            .ok_or_else(|| DomainError::not_found("order item"))?;

        let (location_id, product_id, quantity, status) = {
            let item = order
                .item(item_id)
                .ok_or_else(|| DomainError::not_found("order item"))?;
            (item.location_id, item.product_id, item.quantity, item.status)
        };
        ensure_location(actor, location_id)?;

        // The terminal check gates the stock credit: cancelling twice fails
        // here the second time, so stock is restored exactly once.
        if status.is_terminal() {
            return Err(DomainError::invalid_transition(format!(
                "cannot cancel an item that is already {status}"
            ))
            .into());
        }

        self.store()
            .increment_stock(product_id, location_id, quantity, Utc::now())
            .await?;

        let cancelled = order
            .item_mut(item_id)
            .ok_or_else(|| DomainError::not_found("order item"))?
            .cancel();
        if let Err(e) = cancelled {
            // Unreachable given the check above, but never leave the credit
            // in place with the item not cancelled.
            warn!(item = %item_id, "cancel failed after stock restore; taking credit back");
            self.store()
                .try_decrement_stock(product_id, location_id, quantity, Utc::now())
                .await?;
            return Err(e.into());
        }
        order.recompute_status();

        self.store().update_order(&order).await?;
        info!(order_number = %order.order_number, item = %item_id, reason, "order item cancelled");
        Ok(order)
    }

    /// Fetch one order; customers can only see their own.
    pub async fn order_for_actor(
        &self,
        actor: &Actor,
        order_id: OrderId,
    ) -> Result<Order, ServiceError> {
        let order = self
            .store()
            .order(order_id)
            .await?
            .ok_or_else(|| DomainError::not_found("order"))?;

        if let Actor::Customer { id, .. } = actor {
            if order.customer_id != *id {
                return Err(
                    DomainError::forbidden("customers may only view their own orders").into(),
                );
            }
        }
        Ok(order)
    }

    /// The calling customer's orders, newest first.
    pub async fn my_orders(&self, actor: &Actor) -> Result<Vec<Order>, ServiceError> {
        ensure_role(actor, &[Role::Customer])?;
        Ok(self.store().orders_for_customer(actor.id()).await?)
    }

    /// Orders with pending items at the calling staff member's location.
    pub async fn pending_queue(&self, actor: &Actor) -> Result<Vec<Order>, ServiceError> {
        ensure_role(actor, &[Role::LocationStaff])?;
        let location = actor
            .location()
            .ok_or_else(|| DomainError::validation("actor has no location binding"))?;
        Ok(self.store().orders_with_pending_items_at(location).await?)
    }
}
