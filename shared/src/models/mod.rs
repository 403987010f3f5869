//! Domain models
//!
//! Entity and payload types mirroring the remote service's JSON shapes.
//! All coercion of loosely-shaped payloads happens here, at the wire
//! boundary, via serde defaults.

pub mod detection;
pub mod food;
pub mod order;
pub mod table;
pub mod waiter;

pub use detection::{
    FoodDetectedRequest, LastFood, LastQr, PendingDetection, PendingOrderEnvelope,
    WaiterDetectedRequest,
};
pub use food::Food;
pub use order::{Order, OrderFilter};
pub use table::{Table, TableCreate, TableStatus, TableStatusUpdate};
pub use waiter::Waiter;

use serde::{Deserialize, Serialize};

/// Status envelope returned by action endpoints (`{"message": ...}`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusMessage {
    pub message: String,
}
