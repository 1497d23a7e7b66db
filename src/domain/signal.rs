use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;

use crate::error::{PyramidError, Result};

/// Direction of a trading signal (and of the resulting order)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Buy,
    Sell,
}

impl Direction {
    /// Get the opposite direction
    pub fn opposite(&self) -> Self {
        match self {
            Direction::Buy => Direction::Sell,
            Direction::Sell => Direction::Buy,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Buy => "buy",
            Direction::Sell => "sell",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Direction {
    type Err = PyramidError;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "buy" => Ok(Direction::Buy),
            "sell" => Ok(Direction::Sell),
            _ => Err(PyramidError::Validation(format!(
                "wrong transaction_type '{}': expected buy or sell",
                raw
            ))),
        }
    }
}

/// Webhook body exactly as posted by the alerting system.
///
/// Every field is optional here so that a missing field surfaces as a
/// validation message instead of a deserializer rejection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub transaction_type: Option<String>,
    #[serde(default)]
    pub ticker: Option<String>,
    /// Number or numeric string (alert templates often quote everything)
    #[serde(default)]
    pub multiplier: Option<Value>,
}

/// A validated signal, ready for sizing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signal {
    pub direction: Direction,
    pub symbol: String,
    pub multiplier: u32,
}

impl Signal {
    pub fn new(direction: Direction, symbol: impl Into<String>, multiplier: u32) -> Self {
        Self {
            direction,
            symbol: symbol.into(),
            multiplier,
        }
    }

    /// Validate a raw webhook payload.
    ///
    /// A blank or missing ticker falls back to `default_symbol`; a missing
    /// multiplier means one unit.
    pub fn from_payload(payload: &WebhookPayload, default_symbol: &str) -> Result<Self> {
        let direction = payload
            .transaction_type
            .as_deref()
            .ok_or_else(|| PyramidError::Validation("transaction_type is required".to_string()))?
            .parse::<Direction>()?;

        let symbol = payload
            .ticker
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(default_symbol)
            .to_ascii_uppercase();

        let multiplier = parse_multiplier(payload.multiplier.as_ref())?;

        Ok(Self {
            direction,
            symbol,
            multiplier,
        })
    }
}

fn parse_multiplier(raw: Option<&Value>) -> Result<u32> {
    let value = match raw {
        None | Some(Value::Null) => return Ok(1),
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(_) => None,
    };

    let Some(value) = value else {
        return Err(PyramidError::Validation(format!(
            "multiplier must be numeric, got {}",
            raw.map(Value::to_string).unwrap_or_default()
        )));
    };

    if !value.is_finite() || value < 1.0 || value.fract() != 0.0 || value > f64::from(u32::MAX) {
        return Err(PyramidError::Validation(format!(
            "multiplier must be a positive whole number, got {}",
            value
        )));
    }

    Ok(value as u32)
}
