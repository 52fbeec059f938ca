//! End-to-end engine scenarios over the in-memory store.

use std::sync::Arc;

use chrono::Utc;

use depotflow_auth::Actor;
use depotflow_catalog::{Location, Product};
use depotflow_core::{DomainError, LocationId, ProductId, UserId};
use depotflow_inventory::{DEFAULT_MAX_STOCK, DEFAULT_MIN_STOCK, InventoryRecord};
use depotflow_orders::{OrderStatus, PaymentStatus};
use depotflow_transfers::{TransferLine, TransferStatus};

use crate::services::{NewOrderItem, PlaceOrder, RequestTransfer, ServiceError, Services};
use crate::store::{InMemoryStore, Store};

struct Harness {
    services: Services,
    store: Arc<InMemoryStore>,
}

impl Harness {
    fn new() -> Self {
        let store = Arc::new(InMemoryStore::new());
        Self {
            services: Services::new(store.clone()),
            store,
        }
    }

    async fn seed_product(&self, name: &str, price: u64) -> ProductId {
        let product = Product::new(
            ProductId::new(),
            name,
            "",
            "unit",
            price,
            "general",
            Utc::now(),
        )
        .unwrap();
        let id = product.id;
        self.store.insert_product(product).await.unwrap();
        id
    }

    async fn seed_location(&self, name: &str) -> LocationId {
        let location = Location::new(LocationId::new(), name, "region", Utc::now()).unwrap();
        let id = location.id;
        self.store.insert_location(location).await.unwrap();
        id
    }

    async fn seed_stock(&self, product_id: ProductId, location_id: LocationId, quantity: i64) {
        let record = InventoryRecord::with_default_levels(product_id, location_id, quantity, Utc::now())
            .unwrap();
        self.store.upsert_inventory(record).await.unwrap();
    }

    async fn quantity(&self, product_id: ProductId, location_id: LocationId) -> i64 {
        self.store
            .inventory_record(product_id, location_id)
            .await
            .unwrap()
            .map(|r| r.quantity)
            .unwrap_or(0)
    }
}

fn customer(home: Option<LocationId>) -> Actor {
    Actor::Customer {
        id: UserId::new(),
        home_location: home,
    }
}

fn staff(location: LocationId) -> Actor {
    Actor::LocationStaff {
        id: UserId::new(),
        location,
    }
}

fn order_request(items: Vec<NewOrderItem>) -> PlaceOrder {
    PlaceOrder {
        items,
        delivery_address: "12 Harbor Road".to_string(),
        payment_status: PaymentStatus::Pending,
        idempotency_key: None,
    }
}

fn is_insufficient_stock(err: &ServiceError) -> bool {
    matches!(err, ServiceError::Domain(DomainError::InsufficientStock(_)))
}

#[tokio::test]
async fn fulfillment_decrements_stock_per_bound_location() {
    let h = Harness::new();
    let rice = h.seed_product("Rice", 100).await;
    let oil = h.seed_product("Oil", 250).await;
    let north = h.seed_location("North").await;
    let south = h.seed_location("South").await;
    h.seed_stock(rice, north, 100).await;
    h.seed_stock(oil, south, 50).await;

    let order = h
        .services
        .place_order(
            &customer(Some(north)),
            order_request(vec![
                NewOrderItem { product_id: rice, quantity: 30 },
                NewOrderItem { product_id: oil, quantity: 10 },
            ]),
        )
        .await
        .unwrap();

    assert_eq!(order.order_status, OrderStatus::Pending);
    assert_eq!(order.total_amount, 30 * 100 + 10 * 250);
    assert_eq!(h.quantity(rice, north).await, 70);
    assert_eq!(h.quantity(oil, south).await, 40);

    let rice_item = order.items.iter().find(|i| i.product_id == rice).unwrap();
    assert_eq!(rice_item.location_id, north);
    let oil_item = order.items.iter().find(|i| i.product_id == oil).unwrap();
    assert_eq!(oil_item.location_id, south);
}

#[tokio::test]
async fn fallback_prefers_best_stocked_location() {
    let h = Harness::new();
    let rice = h.seed_product("Rice", 100).await;
    let a = h.seed_location("A").await;
    let b = h.seed_location("B").await;
    h.seed_stock(rice, a, 40).await;
    h.seed_stock(rice, b, 90).await;

    // No home location: the engine picks the best-stocked candidate.
    let order = h
        .services
        .place_order(
            &customer(None),
            order_request(vec![NewOrderItem { product_id: rice, quantity: 20 }]),
        )
        .await
        .unwrap();

    assert_eq!(order.items[0].location_id, b);
    assert_eq!(h.quantity(rice, b).await, 70);
    assert_eq!(h.quantity(rice, a).await, 40);
}

#[tokio::test]
async fn failed_multi_item_order_restores_earlier_decrements() {
    let h = Harness::new();
    let rice = h.seed_product("Rice", 100).await;
    let oil = h.seed_product("Oil", 250).await;
    let north = h.seed_location("North").await;
    h.seed_stock(rice, north, 100).await;
    h.seed_stock(oil, north, 5).await;

    let err = h
        .services
        .place_order(
            &customer(Some(north)),
            order_request(vec![
                NewOrderItem { product_id: rice, quantity: 30 },
                NewOrderItem { product_id: oil, quantity: 10 },
            ]),
        )
        .await
        .unwrap_err();

    assert!(is_insufficient_stock(&err));
    // The rice decrement was compensated; nothing was committed.
    assert_eq!(h.quantity(rice, north).await, 100);
    assert_eq!(h.quantity(oil, north).await, 5);
}

#[tokio::test]
async fn order_with_unknown_product_fails_whole() {
    let h = Harness::new();
    let rice = h.seed_product("Rice", 100).await;
    let north = h.seed_location("North").await;
    h.seed_stock(rice, north, 100).await;

    let err = h
        .services
        .place_order(
            &customer(Some(north)),
            order_request(vec![
                NewOrderItem { product_id: rice, quantity: 30 },
                NewOrderItem { product_id: ProductId::new(), quantity: 1 },
            ]),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::Domain(DomainError::NotFound(_))));
    assert_eq!(h.quantity(rice, north).await, 100);
}

#[tokio::test]
async fn concurrent_orders_cannot_both_win_the_same_stock() {
    let h = Harness::new();
    let rice = h.seed_product("Rice", 100).await;
    let north = h.seed_location("North").await;
    h.seed_stock(rice, north, 100).await;

    let first_customer = customer(Some(north));
    let second_customer = customer(Some(north));
    let first = h.services.place_order(
        &first_customer,
        order_request(vec![NewOrderItem { product_id: rice, quantity: 60 }]),
    );
    let second = h.services.place_order(
        &second_customer,
        order_request(vec![NewOrderItem { product_id: rice, quantity: 60 }]),
    );

    let (first, second) = tokio::join!(first, second);
    let successes = [&first, &second].iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1, "exactly one 60-unit order may win against 100 on hand");

    let loser = if first.is_err() { first } else { second };
    assert!(is_insufficient_stock(&loser.unwrap_err()));
    assert_eq!(h.quantity(rice, north).await, 40);
}

#[tokio::test]
async fn idempotency_key_replays_the_original_order() {
    let h = Harness::new();
    let rice = h.seed_product("Rice", 100).await;
    let north = h.seed_location("North").await;
    h.seed_stock(rice, north, 100).await;

    let buyer = customer(Some(north));
    let request = PlaceOrder {
        items: vec![NewOrderItem { product_id: rice, quantity: 30 }],
        delivery_address: "12 Harbor Road".to_string(),
        payment_status: PaymentStatus::Pending,
        idempotency_key: Some("checkout-1".to_string()),
    };

    let first = h.services.place_order(&buyer, request.clone()).await.unwrap();
    let replay = h.services.place_order(&buyer, request).await.unwrap();

    assert_eq!(first.id, replay.id);
    assert_eq!(h.quantity(rice, north).await, 70, "stock decremented exactly once");
}

#[tokio::test]
async fn cancellation_restores_stock_exactly_once() {
    let h = Harness::new();
    let rice = h.seed_product("Rice", 100).await;
    let north = h.seed_location("North").await;
    h.seed_stock(rice, north, 100).await;

    let order = h
        .services
        .place_order(
            &customer(Some(north)),
            order_request(vec![NewOrderItem { product_id: rice, quantity: 30 }]),
        )
        .await
        .unwrap();
    assert_eq!(h.quantity(rice, north).await, 70);

    let item_id = order.items[0].id;
    let actor = staff(north);

    let cancelled = h
        .services
        .cancel_item(&actor, item_id, "customer changed their mind")
        .await
        .unwrap();
    assert_eq!(cancelled.order_status, OrderStatus::Cancelled);
    assert_eq!(h.quantity(rice, north).await, 100);

    // Second cancel fails without double-crediting.
    let err = h
        .services
        .cancel_item(&actor, item_id, "again")
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Domain(DomainError::InvalidTransition(_))));
    assert_eq!(h.quantity(rice, north).await, 100);
}

#[tokio::test]
async fn cancelling_a_delivered_item_leaves_inventory_unchanged() {
    let h = Harness::new();
    let rice = h.seed_product("Rice", 100).await;
    let north = h.seed_location("North").await;
    h.seed_stock(rice, north, 100).await;

    let order = h
        .services
        .place_order(
            &customer(Some(north)),
            order_request(vec![NewOrderItem { product_id: rice, quantity: 30 }]),
        )
        .await
        .unwrap();
    let item_id = order.items[0].id;
    let actor = staff(north);

    h.services
        .update_item_status(&actor, item_id, OrderStatus::Delivered)
        .await
        .unwrap();

    let err = h
        .services
        .cancel_item(&actor, item_id, "too late")
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Domain(DomainError::InvalidTransition(_))));
    assert_eq!(h.quantity(rice, north).await, 70);
}

#[tokio::test]
async fn cancellation_requires_a_reason() {
    let h = Harness::new();
    let rice = h.seed_product("Rice", 100).await;
    let north = h.seed_location("North").await;
    h.seed_stock(rice, north, 100).await;

    let order = h
        .services
        .place_order(
            &customer(Some(north)),
            order_request(vec![NewOrderItem { product_id: rice, quantity: 30 }]),
        )
        .await
        .unwrap();

    let err = h
        .services
        .cancel_item(&staff(north), order.items[0].id, "  ")
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Domain(DomainError::Validation(_))));
    assert_eq!(h.quantity(rice, north).await, 70);
}

#[tokio::test]
async fn staff_of_another_location_cannot_touch_the_item() {
    let h = Harness::new();
    let rice = h.seed_product("Rice", 100).await;
    let north = h.seed_location("North").await;
    let south = h.seed_location("South").await;
    h.seed_stock(rice, north, 100).await;

    let order = h
        .services
        .place_order(
            &customer(Some(north)),
            order_request(vec![NewOrderItem { product_id: rice, quantity: 30 }]),
        )
        .await
        .unwrap();
    let item_id = order.items[0].id;

    let outsider = staff(south);
    let err = h
        .services
        .update_item_status(&outsider, item_id, OrderStatus::Processing)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Domain(DomainError::Forbidden(_))));

    let err = h
        .services
        .cancel_item(&outsider, item_id, "not mine")
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Domain(DomainError::Forbidden(_))));
}

#[tokio::test]
async fn item_updates_rederive_the_order_status() {
    let h = Harness::new();
    let rice = h.seed_product("Rice", 100).await;
    let oil = h.seed_product("Oil", 250).await;
    let north = h.seed_location("North").await;
    h.seed_stock(rice, north, 100).await;
    h.seed_stock(oil, north, 50).await;

    let order = h
        .services
        .place_order(
            &customer(Some(north)),
            order_request(vec![
                NewOrderItem { product_id: rice, quantity: 10 },
                NewOrderItem { product_id: oil, quantity: 5 },
            ]),
        )
        .await
        .unwrap();
    let actor = staff(north);

    let updated = h
        .services
        .update_item_status(&actor, order.items[0].id, OrderStatus::Dispatched)
        .await
        .unwrap();
    assert_eq!(updated.order_status, OrderStatus::Dispatched);

    // One delivered item does not deliver the order.
    let updated = h
        .services
        .update_item_status(&actor, order.items[0].id, OrderStatus::Delivered)
        .await
        .unwrap();
    assert_eq!(updated.order_status, OrderStatus::Dispatched);

    let updated = h
        .services
        .update_item_status(&actor, order.items[1].id, OrderStatus::Delivered)
        .await
        .unwrap();
    assert_eq!(updated.order_status, OrderStatus::Delivered);
}

#[tokio::test]
async fn transfer_request_with_insufficient_stock_persists_nothing() {
    let h = Harness::new();
    let beans = h.seed_product("Beans", 300).await;
    let a = h.seed_location("A").await;
    let b = h.seed_location("B").await;
    h.seed_stock(beans, a, 40).await;

    let requester = staff(a);
    let err = h
        .services
        .request_transfer(
            &requester,
            RequestTransfer {
                to_location: b,
                items: vec![TransferLine { product_id: beans, quantity: 50 }],
                notes: None,
            },
        )
        .await
        .unwrap_err();

    assert!(is_insufficient_stock(&err));
    assert!(h.services.my_transfers(&requester).await.unwrap().is_empty());
    assert_eq!(h.quantity(beans, a).await, 40);
}

#[tokio::test]
async fn transfer_lifecycle_moves_stock_only_on_receive() {
    let h = Harness::new();
    let beans = h.seed_product("Beans", 300).await;
    let a = h.seed_location("A").await;
    let b = h.seed_location("B").await;
    h.seed_stock(beans, a, 80).await;

    let source = staff(a);
    let destination = staff(b);

    let transfer = h
        .services
        .request_transfer(
            &source,
            RequestTransfer {
                to_location: b,
                items: vec![TransferLine { product_id: beans, quantity: 30 }],
                notes: Some("monthly rebalance".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(transfer.status, TransferStatus::Pending);
    assert_eq!(h.quantity(beans, a).await, 80, "request moves nothing");

    let transfer = h
        .services
        .approve_transfer(&destination, transfer.id)
        .await
        .unwrap();
    assert_eq!(transfer.status, TransferStatus::Approved);
    assert_eq!(h.quantity(beans, a).await, 80, "approval moves nothing");

    let transfer = h
        .services
        .receive_transfer(&destination, transfer.id)
        .await
        .unwrap();
    assert_eq!(transfer.status, TransferStatus::Completed);
    assert!(transfer.completion_date.is_some());
    assert_eq!(h.quantity(beans, a).await, 50);
    assert_eq!(h.quantity(beans, b).await, 30);

    // The destination record was created on the fly with default thresholds.
    let record = h.store.inventory_record(beans, b).await.unwrap().unwrap();
    assert_eq!(record.min_stock_level, DEFAULT_MIN_STOCK);
    assert_eq!(record.max_stock_level, DEFAULT_MAX_STOCK);
}

#[tokio::test]
async fn receive_is_rejected_outside_approved() {
    let h = Harness::new();
    let beans = h.seed_product("Beans", 300).await;
    let a = h.seed_location("A").await;
    let b = h.seed_location("B").await;
    h.seed_stock(beans, a, 80).await;

    let destination = staff(b);
    let transfer = h
        .services
        .request_transfer(
            &staff(a),
            RequestTransfer {
                to_location: b,
                items: vec![TransferLine { product_id: beans, quantity: 30 }],
                notes: None,
            },
        )
        .await
        .unwrap();

    // Still pending.
    let err = h
        .services
        .receive_transfer(&destination, transfer.id)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Domain(DomainError::InvalidState(_))));

    // Completed transfers cannot be received again.
    h.services.approve_transfer(&destination, transfer.id).await.unwrap();
    h.services.receive_transfer(&destination, transfer.id).await.unwrap();
    let err = h
        .services
        .receive_transfer(&destination, transfer.id)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Domain(DomainError::InvalidState(_))));
    assert_eq!(h.quantity(beans, b).await, 30, "no double credit");
}

#[tokio::test]
async fn transfer_authorization_is_side_specific() {
    let h = Harness::new();
    let beans = h.seed_product("Beans", 300).await;
    let a = h.seed_location("A").await;
    let b = h.seed_location("B").await;
    h.seed_stock(beans, a, 80).await;

    let source = staff(a);
    let transfer = h
        .services
        .request_transfer(
            &source,
            RequestTransfer {
                to_location: b,
                items: vec![TransferLine { product_id: beans, quantity: 30 }],
                notes: None,
            },
        )
        .await
        .unwrap();

    // The source cannot approve its own request.
    let err = h.services.approve_transfer(&source, transfer.id).await.unwrap_err();
    assert!(matches!(err, ServiceError::Domain(DomainError::Forbidden(_))));

    // The destination cannot cancel the source's request.
    let err = h.services.cancel_transfer(&staff(b), transfer.id).await.unwrap_err();
    assert!(matches!(err, ServiceError::Domain(DomainError::Forbidden(_))));

    // The source withdraws it.
    let transfer = h.services.cancel_transfer(&source, transfer.id).await.unwrap();
    assert_eq!(transfer.status, TransferStatus::Cancelled);
}

#[tokio::test]
async fn receive_with_depleted_source_fails_and_unwinds() {
    let h = Harness::new();
    let beans = h.seed_product("Beans", 300).await;
    let rice = h.seed_product("Rice", 100).await;
    let a = h.seed_location("A").await;
    let b = h.seed_location("B").await;
    h.seed_stock(beans, a, 80).await;
    h.seed_stock(rice, a, 20).await;

    let destination = staff(b);
    let transfer = h
        .services
        .request_transfer(
            &staff(a),
            RequestTransfer {
                to_location: b,
                items: vec![
                    TransferLine { product_id: beans, quantity: 30 },
                    TransferLine { product_id: rice, quantity: 20 },
                ],
                notes: None,
            },
        )
        .await
        .unwrap();
    h.services.approve_transfer(&destination, transfer.id).await.unwrap();

    // The rice is sold off between approval and receive.
    h.seed_stock(rice, a, 0).await;

    let err = h
        .services
        .receive_transfer(&destination, transfer.id)
        .await
        .unwrap_err();
    assert!(is_insufficient_stock(&err));

    // The beans line was taken back; the transfer is still approved.
    assert_eq!(h.quantity(beans, a).await, 80);
    assert_eq!(h.quantity(beans, b).await, 0);
    let transfer = h.store.transfer(transfer.id).await.unwrap().unwrap();
    assert_eq!(transfer.status, TransferStatus::Approved);
}

#[tokio::test]
async fn customers_only_see_their_own_orders() {
    let h = Harness::new();
    let rice = h.seed_product("Rice", 100).await;
    let north = h.seed_location("North").await;
    h.seed_stock(rice, north, 100).await;

    let buyer = customer(Some(north));
    let order = h
        .services
        .place_order(
            &buyer,
            order_request(vec![NewOrderItem { product_id: rice, quantity: 10 }]),
        )
        .await
        .unwrap();

    let err = h
        .services
        .order_for_actor(&customer(None), order.id)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Domain(DomainError::Forbidden(_))));

    let mine = h.services.my_orders(&buyer).await.unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].id, order.id);
}

#[tokio::test]
async fn restock_updates_quantity_and_keeps_thresholds() {
    let h = Harness::new();
    let rice = h.seed_product("Rice", 100).await;
    let north = h.seed_location("North").await;
    h.seed_stock(rice, north, 10).await;

    let record = h
        .services
        .restock(
            &staff(north),
            crate::services::RestockRequest {
                product_id: rice,
                location_id: north,
                quantity: 90,
                min_stock_level: None,
                max_stock_level: Some(200),
            },
        )
        .await
        .unwrap();

    assert_eq!(record.quantity, 90);
    assert_eq!(record.min_stock_level, DEFAULT_MIN_STOCK);
    assert_eq!(record.max_stock_level, 200);
}
