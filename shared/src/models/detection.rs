//! Camera Detection Models
//!
//! Wire shapes for the detection pipeline: the pending-detection
//! candidate awaiting operator confirmation, raw detection telemetry
//! and the manual test-injection payloads.

use serde::{Deserialize, Serialize};

/// Camera-proposed order as delivered by `GET /pending_order`
///
/// Every field is optional at the wire boundary: the detection pipeline
/// may emit partial payloads, and a payload lacking either the food name
/// or the table id is treated as "no candidate", not as an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingDetection {
    #[serde(default)]
    pub food_id: Option<String>,
    #[serde(default)]
    pub food_name: Option<String>,
    #[serde(default)]
    pub table_id: Option<String>,
    #[serde(default)]
    pub waiter_id: Option<String>,
    /// Model confidence in [0.0, 1.0]
    #[serde(default)]
    pub confidence: f64,
    /// Proposed price at detection time
    #[serde(default)]
    pub price: Option<f64>,
}

impl PendingDetection {
    /// Whether the payload carries enough identity to act on
    pub fn is_actionable(&self) -> bool {
        self.food_name.as_deref().is_some_and(|s| !s.is_empty())
            && self.table_id.as_deref().is_some_and(|s| !s.is_empty())
    }
}

/// Envelope for `GET /pending_order` (`{ "pending_order": ... | null }`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingOrderEnvelope {
    #[serde(default)]
    pub pending_order: Option<PendingDetection>,
}

/// Envelope for `GET /last_qr`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LastQr {
    #[serde(default)]
    pub last_qr: Option<String>,
}

/// Envelope for `GET /last_food`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LastFood {
    #[serde(default)]
    pub last_food: Option<String>,
}

/// Manual detection injection: `POST /api/camera/food_detected`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoodDetectedRequest {
    pub table_id: String,
    pub food_id: String,
    pub quantity: i64,
}

/// Manual detection injection: `POST /api/camera/waiter_detected`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaiterDetectedRequest {
    pub table_id: String,
    pub waiter_id: String,
}
