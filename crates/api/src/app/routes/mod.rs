use axum::{Router, routing::get};

pub mod inventory;
pub mod locations;
pub mod orders;
pub mod products;
pub mod system;
pub mod transfers;

/// Router for all authenticated endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .nest("/orders", orders::router())
        .nest("/inventory", inventory::router())
        .nest("/transfers", transfers::router())
        .nest("/products", products::router())
        .nest("/locations", locations::router())
}
