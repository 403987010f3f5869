//! Order Model

use serde::{Deserialize, Serialize};

fn default_quantity() -> i64 {
    1
}

/// Order entity
///
/// Orders are immutable once created; the only remote mutation is bulk
/// deletion. `food_name` is denormalized at creation time and `price` is
/// the price at time of order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub order_id: String,
    pub table_id: String,
    #[serde(default)]
    pub waiter_id: Option<String>,
    #[serde(default)]
    pub food_id: Option<String>,
    pub food_name: String,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
    #[serde(default)]
    pub price: f64,
    /// ISO-8601 timestamp string as written by the remote service
    #[serde(default)]
    pub timestamp: String,
}

/// Filter for `GET /orders`; absent fields mean "no constraint"
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderFilter {
    pub waiter_id: Option<String>,
    pub food_name: Option<String>,
    pub table_id: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl OrderFilter {
    /// Unconstrained filter (full order collection)
    pub fn all() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_defaults_for_missing_fields() {
        // quantity defaults to 1, price to 0.0 when the payload omits them
        let order: Order = serde_json::from_str(
            r#"{"order_id":"o1","table_id":"t1","food_name":"Pizza"}"#,
        )
        .unwrap();

        assert_eq!(order.quantity, 1);
        assert_eq!(order.price, 0.0);
        assert!(order.waiter_id.is_none());
        assert!(order.timestamp.is_empty());
    }
}
