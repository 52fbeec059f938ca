use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
};

use depotflow_core::OrderId;
use depotflow_infra::Services;
use depotflow_infra::services::PlaceOrder;
use depotflow_orders::PaymentStatus;

use crate::app::{dto, errors};
use crate::context::ActorContext;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_order))
        .route("/my-orders", get(my_orders))
        .route("/location-pending", get(location_pending))
        .route("/cancel-item", post(cancel_item))
        .route("/update-status", patch(update_status))
        .route("/:id", get(get_order))
}

pub async fn create_order(
    Extension(services): Extension<Arc<Services>>,
    Extension(ctx): Extension<ActorContext>,
    Json(body): Json<dto::CreateOrderRequest>,
) -> axum::response::Response {
    let request = PlaceOrder {
        items: body.items,
        delivery_address: body.delivery_address,
        payment_status: body.payment_status.unwrap_or(PaymentStatus::Pending),
        idempotency_key: body.idempotency_key,
    };

    match services.place_order(ctx.actor(), request).await {
        Ok(order) => (StatusCode::CREATED, Json(dto::order_created_json(&order))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn my_orders(
    Extension(services): Extension<Arc<Services>>,
    Extension(ctx): Extension<ActorContext>,
) -> axum::response::Response {
    match services.my_orders(ctx.actor()).await {
        Ok(orders) => (StatusCode::OK, Json(orders)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn location_pending(
    Extension(services): Extension<Arc<Services>>,
    Extension(ctx): Extension<ActorContext>,
) -> axum::response::Response {
    match services.pending_queue(ctx.actor()).await {
        Ok(orders) => (StatusCode::OK, Json(orders)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_order(
    Extension(services): Extension<Arc<Services>>,
    Extension(ctx): Extension<ActorContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let order_id: OrderId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid order id"),
    };

    match services.order_for_actor(ctx.actor(), order_id).await {
        Ok(order) => (StatusCode::OK, Json(order)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn update_status(
    Extension(services): Extension<Arc<Services>>,
    Extension(ctx): Extension<ActorContext>,
    Json(body): Json<dto::UpdateItemStatusRequest>,
) -> axum::response::Response {
    match services
        .update_item_status(ctx.actor(), body.order_item_id, body.status)
        .await
    {
        Ok(order) => (StatusCode::OK, Json(order)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn cancel_item(
    Extension(services): Extension<Arc<Services>>,
    Extension(ctx): Extension<ActorContext>,
    Json(body): Json<dto::CancelItemRequest>,
) -> axum::response::Response {
    match services
        .cancel_item(ctx.actor(), body.order_item_id, &body.reason)
        .await
    {
        Ok(order) => (StatusCode::OK, Json(order)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
