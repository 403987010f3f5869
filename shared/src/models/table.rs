//! Table Model

use serde::{Deserialize, Serialize};

/// Table status as reported by the remote service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableStatus {
    #[default]
    Empty,
    Occupied,
    /// Set when a waiter check-in is detected at the table
    Served,
}

/// Table entity
///
/// `waiter_id` is a weak reference: the waiter may be reassigned or
/// removed remotely at any time and the table snapshot is simply
/// replaced on the next refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Table {
    pub table_id: String,
    #[serde(default)]
    pub waiter_id: Option<String>,
    #[serde(default)]
    pub status: TableStatus,
    #[serde(default)]
    pub last_customer_time: Option<String>,
    #[serde(default)]
    pub last_waiter_time: Option<String>,
}

/// Create table payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableCreate {
    pub table_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub waiter_id: Option<String>,
    pub status: TableStatus,
}

/// Update table status payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableStatusUpdate {
    pub table_id: String,
    pub status: TableStatus,
}
