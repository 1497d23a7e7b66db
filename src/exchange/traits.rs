use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::domain::OrderRequest;
use crate::error::Result;

/// Broker reply, passed back to the webhook caller untouched
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BrokerResponse {
    pub status: u16,
    pub body: Value,
}

impl BrokerResponse {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Submits one order to the account matching its side.
///
/// One attempt, no retry. Transport failures are errors; a broker rejection
/// is a normal `BrokerResponse` with a non-success status.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrderDispatcher: Send + Sync {
    async fn dispatch(&self, order: &OrderRequest) -> Result<BrokerResponse>;
}
