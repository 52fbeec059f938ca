use axum::{Extension, Json, http::StatusCode, response::IntoResponse};
use serde_json::json;

use crate::context::ActorContext;

pub async fn health() -> axum::response::Response {
    (StatusCode::OK, Json(json!({ "status": "ok" }))).into_response()
}

pub async fn whoami(Extension(ctx): Extension<ActorContext>) -> axum::response::Response {
    let actor = ctx.actor();
    (
        StatusCode::OK,
        Json(json!({
            "user_id": actor.id(),
            "role": actor.role().as_str(),
            "location_id": actor.location(),
        })),
    )
        .into_response()
}
