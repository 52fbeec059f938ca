use std::sync::Arc;

use axum::{
    Json, Router,
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};

use depotflow_infra::Services;
use depotflow_infra::services::NewLocation;

use crate::app::{dto, errors};
use crate::context::ActorContext;

pub fn router() -> Router {
    Router::new().route("/", get(list_locations).post(create_location))
}

pub async fn list_locations(
    Extension(services): Extension<Arc<Services>>,
) -> axum::response::Response {
    match services.list_locations().await {
        Ok(locations) => (StatusCode::OK, Json(locations)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn create_location(
    Extension(services): Extension<Arc<Services>>,
    Extension(ctx): Extension<ActorContext>,
    Json(body): Json<dto::CreateLocationRequest>,
) -> axum::response::Response {
    let request = NewLocation {
        name: body.name,
        region: body.region,
    };

    match services.create_location(ctx.actor(), request).await {
        Ok(location) => (StatusCode::CREATED, Json(location)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
