//! Alpaca order-submission adapter.
//!
//! Buy and sell orders go to separate accounts; the side picks the key pair
//! and endpoint. Each order is a single POST with no retry.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::config::{BrokerConfig, BrokerCredentials};
use crate::domain::OrderRequest;
use crate::error::{PyramidError, Result};
use crate::exchange::{BrokerResponse, OrderDispatcher};

const KEY_ID_HEADER: &str = "apca-api-key-id";
const SECRET_KEY_HEADER: &str = "apca-api-secret-key";

#[derive(Clone)]
pub struct AlpacaClient {
    http: Client,
    broker: BrokerConfig,
}

impl AlpacaClient {
    pub fn new(broker: BrokerConfig) -> Result<Self> {
        let http = Client::builder()
            .user_agent("pyramid-relay/0.1")
            .build()
            .map_err(|e| PyramidError::Internal(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, broker })
    }

    pub fn is_dry_run(&self) -> bool {
        self.broker.dry_run
    }

    fn auth_headers(creds: &BrokerCredentials) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static(KEY_ID_HEADER),
            HeaderValue::from_str(&creds.key_id)
                .map_err(|e| PyramidError::Auth(format!("invalid API key header: {}", e)))?,
        );
        headers.insert(
            HeaderName::from_static(SECRET_KEY_HEADER),
            HeaderValue::from_str(&creds.secret_key)
                .map_err(|e| PyramidError::Auth(format!("invalid API secret header: {}", e)))?,
        );
        Ok(headers)
    }

    /// Broker bodies are JSON in practice; anything else is kept as text
    fn parse_body(text: &str) -> Value {
        if text.trim().is_empty() {
            return Value::Null;
        }
        serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
    }
}

#[async_trait]
impl OrderDispatcher for AlpacaClient {
    async fn dispatch(&self, order: &OrderRequest) -> Result<BrokerResponse> {
        let creds = self.broker.credentials(order.side);

        if self.broker.dry_run {
            info!(
                symbol = %order.symbol,
                side = %order.side,
                qty = order.qty,
                endpoint = %creds.endpoint,
                "dry-run order (not submitted)"
            );
            return Ok(BrokerResponse::new(
                200,
                json!({ "status": "dry_run", "order": order }),
            ));
        }

        let headers = Self::auth_headers(creds)?;
        let resp = self
            .http
            .post(&creds.endpoint)
            .headers(headers)
            .json(order)
            .send()
            .await?;
        let status = resp.status();
        let text = resp.text().await?;
        let body = Self::parse_body(&text);

        if status.is_success() {
            info!(
                symbol = %order.symbol,
                side = %order.side,
                qty = order.qty,
                status = status.as_u16(),
                "order accepted by broker"
            );
        } else {
            warn!(
                symbol = %order.symbol,
                side = %order.side,
                qty = order.qty,
                status = status.as_u16(),
                body = %text,
                "order rejected by broker"
            );
        }

        Ok(BrokerResponse::new(status.as_u16(), body))
    }
}
