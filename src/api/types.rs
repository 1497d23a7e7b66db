use serde::{Deserialize, Serialize};

use crate::domain::SizingState;

/// GET /health, GET /
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
    pub uptime_secs: i64,
}

/// Error body for every non-broker failure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

/// GET /state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateResponse {
    /// False when nothing has been persisted yet
    pub persisted: bool,
    pub state: Option<SizingState>,
}
