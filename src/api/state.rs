use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::services::SignalProcessor;

/// Shared application state for API handlers
#[derive(Clone)]
pub struct AppState {
    /// Sizing + dispatch pipeline
    pub processor: Arc<SignalProcessor>,

    /// Application start time
    pub start_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(processor: Arc<SignalProcessor>) -> Self {
        Self {
            processor,
            start_time: Utc::now(),
        }
    }

    pub fn uptime_seconds(&self) -> i64 {
        (Utc::now() - self.start_time).num_seconds().max(0)
    }
}
