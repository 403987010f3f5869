//! Waiter Model

use serde::{Deserialize, Serialize};

/// Waiter entity
///
/// `performance` and `interest_level` are mutated only by the remote
/// service; the client reads and merges snapshots. `interest_level` is
/// signed and unbounded (display clamping is a view concern).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Waiter {
    pub waiter_id: String,
    pub name: String,
    /// QR code or badge number used by the camera pipeline
    pub code: String,
    #[serde(default)]
    pub performance: i64,
    #[serde(default)]
    pub interest_level: i64,
}
