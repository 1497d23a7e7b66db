use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::domain::Direction;
use crate::sizing::reset::{DEFAULT_RESET_HOUR, DEFAULT_RESET_MINUTE};

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub broker: BrokerConfig,
    pub sizing: SizingConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address for the webhook server
    #[serde(default = "default_host")]
    pub host: String,
    /// Webhook server port (default: 5000)
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

#[derive(Debug, Clone, Deserialize)]
pub struct BrokerConfig {
    /// Account that receives buy orders
    pub buy: BrokerCredentials,
    /// Account that receives sell orders
    pub sell: BrokerCredentials,
    /// Symbol used when a signal carries no ticker
    #[serde(default = "default_symbol")]
    pub default_symbol: String,
    /// Log orders instead of submitting them
    #[serde(default)]
    pub dry_run: bool,
}

fn default_symbol() -> String {
    "SPY".to_string()
}

impl BrokerConfig {
    /// Credential/endpoint pair for an order side
    pub fn credentials(&self, direction: Direction) -> &BrokerCredentials {
        match direction {
            Direction::Buy => &self.buy,
            Direction::Sell => &self.sell,
        }
    }
}

/// One brokerage account: API key pair plus the order-submission URL
#[derive(Clone, Default, Deserialize)]
pub struct BrokerCredentials {
    #[serde(default)]
    pub key_id: String,
    #[serde(default)]
    pub secret_key: String,
    /// Full URL of the order endpoint, e.g. https://paper-api.alpaca.markets/v2/orders
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
}

fn default_endpoint() -> String {
    "https://paper-api.alpaca.markets/v2/orders".to_string()
}

impl fmt::Debug for BrokerCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrokerCredentials")
            .field("key_id", &self.key_id)
            .field("secret_key", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SizingConfig {
    /// Where the streak record lives
    #[serde(default = "default_state_path")]
    pub state_path: PathBuf,
    /// Daily reset boundary, local time
    #[serde(default = "default_reset_hour")]
    pub reset_hour: u32,
    #[serde(default = "default_reset_minute")]
    pub reset_minute: u32,
}

fn default_state_path() -> PathBuf {
    if let Ok(dir) = std::env::var("PYRAMID_STATE_DIR") {
        return PathBuf::from(dir).join("sizing_state.json");
    }
    PathBuf::from("data/state/sizing_state.json")
}

fn default_reset_hour() -> u32 {
    DEFAULT_RESET_HOUR
}

fn default_reset_minute() -> u32 {
    DEFAULT_RESET_MINUTE
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Enable JSON formatted console logs
    #[serde(default)]
    pub json: bool,
    /// Directory for the rolling log file; file logging is skipped if unwritable
    #[serde(default = "default_log_dir")]
    pub dir: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
            dir: default_log_dir(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_dir() -> String {
    "logs".to_string()
}

/// Pre-prefix environment names, still honoured on top of everything else
const LEGACY_ENV_KEYS: [(&str, &str); 6] = [
    ("ALPACA_BUY_API_KEY", "broker.buy.key_id"),
    ("ALPACA_BUY_SECRET_KEY", "broker.buy.secret_key"),
    ("ALPACA_BUY_ENDPOINT", "broker.buy.endpoint"),
    ("ALPACA_SELL_API_KEY", "broker.sell.key_id"),
    ("ALPACA_SELL_SECRET_KEY", "broker.sell.secret_key"),
    ("ALPACA_SELL_ENDPOINT", "broker.sell.endpoint"),
];

impl AppConfig {
    /// Load configuration from files and environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from a specific directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let mut builder = Config::builder()
            // Start with default values
            .set_default("server.host", default_host())?
            .set_default("server.port", i64::from(default_port()))?
            .set_default("broker.default_symbol", default_symbol())?
            .set_default("broker.dry_run", false)?
            .set_default("broker.buy.endpoint", default_endpoint())?
            .set_default("broker.sell.endpoint", default_endpoint())?
            .set_default("sizing.reset_hour", i64::from(DEFAULT_RESET_HOUR))?
            .set_default("sizing.reset_minute", i64::from(DEFAULT_RESET_MINUTE))?
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?
            // Load default config file
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Load environment-specific config (e.g., config/production.toml)
            .add_source(
                File::from(config_dir.join(
                    std::env::var("PYRAMID_ENV").unwrap_or_else(|_| "development".to_string()),
                ))
                .required(false),
            )
            // Override with environment variables (PYRAMID__BROKER__DRY_RUN, etc.)
            .add_source(
                Environment::with_prefix("PYRAMID")
                    .separator("__")
                    .try_parsing(true),
            );

        for (var, key) in LEGACY_ENV_KEYS {
            let value = std::env::var(var).ok().filter(|v| !v.trim().is_empty());
            builder = builder.set_override_option(key, value)?;
        }

        builder.build()?.try_deserialize()
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if !self.broker.dry_run {
            for direction in [Direction::Buy, Direction::Sell] {
                let creds = self.broker.credentials(direction);
                if creds.key_id.trim().is_empty() {
                    errors.push(format!("broker.{}.key_id is required", direction));
                }
                if creds.secret_key.trim().is_empty() {
                    errors.push(format!("broker.{}.secret_key is required", direction));
                }
                if !(creds.endpoint.starts_with("https://") || creds.endpoint.starts_with("http://"))
                {
                    errors.push(format!(
                        "broker.{}.endpoint must be an http(s) URL, got '{}'",
                        direction, creds.endpoint
                    ));
                }
            }
        }

        if self.broker.default_symbol.trim().is_empty() {
            errors.push("broker.default_symbol must not be empty".to_string());
        }

        if self.sizing.reset_hour > 23 || self.sizing.reset_minute > 59 {
            errors.push(format!(
                "reset boundary {:02}:{:02} is not a valid time of day",
                self.sizing.reset_hour, self.sizing.reset_minute
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Configuration for tests and local dry runs
    pub fn dry_run_config(state_path: impl Into<PathBuf>) -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: default_port(),
            },
            broker: BrokerConfig {
                buy: BrokerCredentials::default(),
                sell: BrokerCredentials::default(),
                default_symbol: default_symbol(),
                dry_run: true,
            },
            sizing: SizingConfig {
                state_path: state_path.into(),
                reset_hour: DEFAULT_RESET_HOUR,
                reset_minute: DEFAULT_RESET_MINUTE,
            },
            logging: LoggingConfig::default(),
        }
    }
}
