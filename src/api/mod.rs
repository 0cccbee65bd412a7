pub mod funds;
pub mod health;

use crate::db::EntityStore;
use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn EntityStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/v1/factory", get(funds::get_factory))
        .route("/v1/funds/:fund_id", get(funds::get_fund))
        .route(
            "/v1/funds/:fund_id/investors/:address",
            get(funds::get_investor),
        )
        .layer(cors)
        .with_state(state)
}
