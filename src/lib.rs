pub mod adapters;
pub mod api;
pub mod bootstrap;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod exchange;
pub mod persistence;
pub mod services;
pub mod sizing;

pub use adapters::AlpacaClient;
pub use config::AppConfig;
pub use domain::{Direction, OrderRequest, Signal, SizingState, WebhookPayload};
pub use error::{PyramidError, Result};
pub use exchange::{BrokerResponse, OrderDispatcher};
pub use persistence::{JsonStateStore, MemoryStateStore, StateStore};
pub use services::{SignalOutcome, SignalProcessor};
pub use sizing::{compute_quantity, Clock, FixedClock, LocalClock, ResetPolicy};
