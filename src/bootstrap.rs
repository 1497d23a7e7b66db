//! Wiring from configuration to a ready signal processor.

use std::sync::Arc;
use tracing::info;

use crate::adapters::AlpacaClient;
use crate::config::AppConfig;
use crate::error::Result;
use crate::persistence::JsonStateStore;
use crate::services::SignalProcessor;
use crate::sizing::{LocalClock, ResetPolicy};

/// Build the production pipeline: JSON state file, Alpaca dispatcher,
/// local wall clock.
pub fn build_processor(config: &AppConfig) -> Result<SignalProcessor> {
    let policy = ResetPolicy::from_hour_minute(config.sizing.reset_hour, config.sizing.reset_minute)?;
    let store = Arc::new(JsonStateStore::new(&config.sizing.state_path));
    let dispatcher = Arc::new(AlpacaClient::new(config.broker.clone())?);

    info!(
        state_path = %config.sizing.state_path.display(),
        reset_boundary = %policy.boundary(),
        dry_run = config.broker.dry_run,
        buy_endpoint = %config.broker.buy.endpoint,
        sell_endpoint = %config.broker.sell.endpoint,
        "signal processor ready"
    );

    Ok(SignalProcessor::new(
        store,
        dispatcher,
        Arc::new(LocalClock),
        policy,
        config.broker.default_symbol.clone(),
    ))
}
