use serde::{Deserialize, Serialize};

// ==================== Payloads ====================

/// Handshake payload (client -> push endpoint)
///
/// Carries the client's protocol version for server-side validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandshakePayload {
    /// Protocol version
    pub version: u16,
    /// Client name/identifier
    pub client_name: Option<String>,
    /// Client version
    pub client_version: Option<String>,
}

/// Delay warning payload (`waiter_delay_warning` event)
///
/// Emitted when the remote service penalizes a waiter for a delayed
/// response at an occupied table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DelayWarningPayload {
    pub table_id: String,
    #[serde(default)]
    pub waiter_id: Option<String>,
}

/// Server message payload (`server_message` event)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerMessagePayload {
    pub message: String,
}
