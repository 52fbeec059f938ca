//! Fulfillment-path benchmarks over the in-memory store.

use std::sync::Arc;

use chrono::Utc;
use criterion::{Criterion, criterion_group, criterion_main};

use depotflow_auth::Actor;
use depotflow_catalog::{Location, Product};
use depotflow_core::{LocationId, ProductId, UserId};
use depotflow_infra::services::{NewOrderItem, PlaceOrder, Services};
use depotflow_infra::store::{InMemoryStore, Store};
use depotflow_inventory::InventoryRecord;
use depotflow_orders::PaymentStatus;

struct Fixture {
    services: Services,
    actor: Actor,
    products: Vec<ProductId>,
}

async fn fixture(product_count: usize) -> Fixture {
    let store = Arc::new(InMemoryStore::new());
    let location_id = LocationId::new();
    store
        .insert_location(Location::new(location_id, "Bench", "bench", Utc::now()).unwrap())
        .await
        .unwrap();

    let mut products = Vec::with_capacity(product_count);
    for n in 0..product_count {
        let product = Product::new(
            ProductId::new(),
            format!("Product {n}"),
            "",
            "unit",
            100,
            "bench",
            Utc::now(),
        )
        .unwrap();
        products.push(product.id);
        store.insert_product(product).await.unwrap();
        store
            .upsert_inventory(
                InventoryRecord::with_default_levels(
                    products[n],
                    location_id,
                    i64::MAX / 2,
                    Utc::now(),
                )
                .unwrap(),
            )
            .await
            .unwrap();
    }

    Fixture {
        services: Services::new(store),
        actor: Actor::Customer {
            id: UserId::new(),
            home_location: Some(location_id),
        },
        products,
    }
}

fn bench_place_order(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().expect("tokio runtime");
    let fx = rt.block_on(fixture(3));

    let request = PlaceOrder {
        items: fx
            .products
            .iter()
            .map(|p| NewOrderItem {
                product_id: *p,
                quantity: 2,
            })
            .collect(),
        delivery_address: "1 Bench Street".to_string(),
        payment_status: PaymentStatus::Pending,
        idempotency_key: None,
    };

    c.bench_function("place_order_three_items", |b| {
        b.iter(|| {
            rt.block_on(async {
                fx.services
                    .place_order(&fx.actor, request.clone())
                    .await
                    .expect("bench order")
            })
        })
    });
}

fn bench_cancel_item(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().expect("tokio runtime");
    let fx = rt.block_on(fixture(1));

    let staff = Actor::Admin { id: UserId::new() };
    let request = PlaceOrder {
        items: vec![NewOrderItem {
            product_id: fx.products[0],
            quantity: 1,
        }],
        delivery_address: "1 Bench Street".to_string(),
        payment_status: PaymentStatus::Pending,
        idempotency_key: None,
    };

    c.bench_function("place_then_cancel_item", |b| {
        b.iter(|| {
            rt.block_on(async {
                let order = fx
                    .services
                    .place_order(&fx.actor, request.clone())
                    .await
                    .expect("bench order");
                fx.services
                    .cancel_item(&staff, order.items[0].id, "bench")
                    .await
                    .expect("bench cancel")
            })
        })
    });
}

criterion_group!(benches, bench_place_order, bench_cancel_item);
criterion_main!(benches);
