use std::sync::Arc;

use axum::{
    Json, Router,
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};

use depotflow_infra::Services;
use depotflow_infra::services::NewProduct;

use crate::app::{dto, errors};
use crate::context::ActorContext;

pub fn router() -> Router {
    Router::new().route("/", get(list_products).post(create_product))
}

pub async fn list_products(
    Extension(services): Extension<Arc<Services>>,
) -> axum::response::Response {
    match services.list_products().await {
        Ok(products) => (StatusCode::OK, Json(products)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn create_product(
    Extension(services): Extension<Arc<Services>>,
    Extension(ctx): Extension<ActorContext>,
    Json(body): Json<dto::CreateProductRequest>,
) -> axum::response::Response {
    let request = NewProduct {
        name: body.name,
        description: body.description,
        unit: body.unit,
        price: body.price,
        category: body.category,
    };

    match services.create_product(ctx.actor(), request).await {
        Ok(product) => (StatusCode::CREATED, Json(product)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
