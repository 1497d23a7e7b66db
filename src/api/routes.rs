use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::api::{handlers, state::AppState};

pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health endpoints
        .route("/", get(handlers::health_handler))
        .route("/health", get(handlers::health_handler))
        // Signal ingress
        .route("/webhook", post(handlers::webhook_handler))
        // Sizing state
        .route("/state", get(handlers::get_sizing_state))
        // Add state and CORS
        .with_state(state)
        .layer(cors)
}
