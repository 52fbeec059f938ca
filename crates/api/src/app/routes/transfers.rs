use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
};

use depotflow_core::TransferId;
use depotflow_infra::Services;
use depotflow_infra::services::RequestTransfer;

use crate::app::{dto, errors};
use crate::context::ActorContext;

pub fn router() -> Router {
    Router::new()
        .route("/request", post(request_transfer))
        .route("/my-location", get(my_location))
        .route("/:id", patch(decide_transfer))
        .route("/:id/receive", post(receive_transfer))
}

pub async fn request_transfer(
    Extension(services): Extension<Arc<Services>>,
    Extension(ctx): Extension<ActorContext>,
    Json(body): Json<dto::RequestTransferBody>,
) -> axum::response::Response {
    let request = RequestTransfer {
        to_location: body.to_location,
        items: body.items,
        notes: body.notes,
    };

    match services.request_transfer(ctx.actor(), request).await {
        Ok(transfer) => (StatusCode::CREATED, Json(transfer)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn my_location(
    Extension(services): Extension<Arc<Services>>,
    Extension(ctx): Extension<ActorContext>,
) -> axum::response::Response {
    match services.my_transfers(ctx.actor()).await {
        Ok(transfers) => (StatusCode::OK, Json(transfers)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

/// Approve, reject or cancel a pending transfer, mirroring the single
/// status-update endpoint the UI calls.
pub async fn decide_transfer(
    Extension(services): Extension<Arc<Services>>,
    Extension(ctx): Extension<ActorContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::DecideTransferBody>,
) -> axum::response::Response {
    let transfer_id: TransferId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid transfer id");
        }
    };

    let result = match body.status.as_str() {
        "approved" => services.approve_transfer(ctx.actor(), transfer_id).await,
        "rejected" => {
            let reason = body.rejection_reason.unwrap_or_default();
            services
                .reject_transfer(ctx.actor(), transfer_id, &reason)
                .await
        }
        "cancelled" => services.cancel_transfer(ctx.actor(), transfer_id).await,
        other => {
            return errors::json_error(
                StatusCode::BAD_REQUEST,
                "invalid_status",
                format!("status must be approved, rejected or cancelled (got '{other}')"),
            );
        }
    };

    match result {
        Ok(transfer) => (StatusCode::OK, Json(transfer)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn receive_transfer(
    Extension(services): Extension<Arc<Services>>,
    Extension(ctx): Extension<ActorContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let transfer_id: TransferId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid transfer id");
        }
    };

    match services.receive_transfer(ctx.actor(), transfer_id).await {
        Ok(transfer) => (StatusCode::OK, Json(transfer)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
