use serde::{Deserialize, Serialize};

use super::Direction;

/// Order type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    Market,
}

/// Time in force
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeInForce {
    /// Good Till Cancelled
    Gtc,
}

/// Order request body, in the broker's wire shape
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub symbol: String,
    pub qty: u64,
    pub side: Direction,
    #[serde(rename = "type")]
    pub order_type: OrderType,
    pub time_in_force: TimeInForce,
}

impl OrderRequest {
    pub fn market(symbol: impl Into<String>, qty: u64, side: Direction) -> Self {
        Self {
            symbol: symbol.into(),
            qty,
            side,
            order_type: OrderType::Market,
            time_in_force: TimeInForce::Gtc,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_market_order_wire_shape() {
        let order = OrderRequest::market("SPY", 8, Direction::Buy);
        assert_eq!(
            serde_json::to_value(&order).unwrap(),
            json!({
                "symbol": "SPY",
                "qty": 8,
                "side": "buy",
                "type": "market",
                "time_in_force": "gtc"
            })
        );
    }
}
