use axum::{extract::State, http::StatusCode, Json};
use tracing::warn;

use crate::api::{
    state::AppState,
    types::{ErrorResponse, HealthResponse, StateResponse},
};

/// GET / and GET /health -- fixed liveness payload, independent of sizing state
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        message: "all good".to_string(),
        uptime_secs: state.uptime_seconds(),
    })
}

/// GET /state -- persisted sizing record, read-only
pub async fn get_sizing_state(
    State(state): State<AppState>,
) -> std::result::Result<Json<StateResponse>, (StatusCode, Json<ErrorResponse>)> {
    match state.processor.current_state().await {
        Ok(current) => Ok(Json(StateResponse {
            persisted: current.is_some(),
            state: current,
        })),
        Err(e) => {
            warn!(error = %e, "sizing state unreadable");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: e.kind().to_string(),
                    message: e.to_string(),
                }),
            ))
        }
    }
}
