use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use depotflow_core::LocationId;
use depotflow_infra::Services;
use depotflow_infra::services::RestockRequest;

use crate::app::{dto, errors};
use crate::context::ActorContext;

pub fn router() -> Router {
    Router::new()
        .route("/my-location", get(my_location))
        .route("/update", post(restock))
        .route("/:location_id", get(location_inventory))
}

pub async fn my_location(
    Extension(services): Extension<Arc<Services>>,
    Extension(ctx): Extension<ActorContext>,
) -> axum::response::Response {
    match services.my_inventory(ctx.actor()).await {
        Ok(records) => {
            let records: Vec<_> = records.iter().map(dto::inventory_to_json).collect();
            (StatusCode::OK, Json(records)).into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn location_inventory(
    Extension(services): Extension<Arc<Services>>,
    Extension(ctx): Extension<ActorContext>,
    Path(location_id): Path<String>,
) -> axum::response::Response {
    let location_id: LocationId = match location_id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid location id");
        }
    };

    match services.location_inventory(ctx.actor(), location_id).await {
        Ok(records) => {
            let records: Vec<_> = records.iter().map(dto::inventory_to_json).collect();
            (StatusCode::OK, Json(records)).into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn restock(
    Extension(services): Extension<Arc<Services>>,
    Extension(ctx): Extension<ActorContext>,
    Json(body): Json<dto::RestockRequestBody>,
) -> axum::response::Response {
    let request = RestockRequest {
        product_id: body.product_id,
        location_id: body.location_id,
        quantity: body.quantity,
        min_stock_level: body.min_stock_level,
        max_stock_level: body.max_stock_level,
    };

    match services.restock(ctx.actor(), request).await {
        Ok(record) => (StatusCode::OK, Json(dto::inventory_to_json(&record))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
