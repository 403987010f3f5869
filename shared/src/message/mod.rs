//! Push-channel message types
//!
//! Shared between the remote service's push endpoint and the client,
//! for both in-process (memory) and network (TCP) transports. Update
//! events are doorbells: they tell the client *which* collection
//! changed, never carry authoritative state — the client always
//! re-fetches the full collection over HTTP.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

use uuid::Uuid;

pub mod payload;
pub use payload::*;

/// Protocol version
pub const PROTOCOL_VERSION: u16 = 1;

/// Push-channel event types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    /// Handshake message
    Handshake = 0,
    /// An order was created (or the order set changed)
    OrderUpdate = 1,
    /// A table changed (status, waiter assignment)
    TableUpdate = 2,
    /// A waiter changed (score, roster)
    WaiterUpdate = 3,
    /// The menu changed
    FoodUpdate = 4,
    /// A waiter is flagged as delayed at a table
    WaiterDelayWarning = 5,
    /// Free-form operator-facing message
    ServerMessage = 6,
}

impl TryFrom<u8> for EventType {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(EventType::Handshake),
            1 => Ok(EventType::OrderUpdate),
            2 => Ok(EventType::TableUpdate),
            3 => Ok(EventType::WaiterUpdate),
            4 => Ok(EventType::FoodUpdate),
            5 => Ok(EventType::WaiterDelayWarning),
            6 => Ok(EventType::ServerMessage),
            _ => Err(()),
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventType::Handshake => write!(f, "handshake"),
            EventType::OrderUpdate => write!(f, "order_update"),
            EventType::TableUpdate => write!(f, "table_update"),
            EventType::WaiterUpdate => write!(f, "waiter_update"),
            EventType::FoodUpdate => write!(f, "food_update"),
            EventType::WaiterDelayWarning => write!(f, "waiter_delay_warning"),
            EventType::ServerMessage => write!(f, "server_message"),
        }
    }
}

/// Push-channel message body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusMessage {
    pub request_id: Uuid,
    pub event_type: EventType,
    pub payload: Vec<u8>,
}

impl BusMessage {
    pub fn new(event_type: EventType, payload: Vec<u8>) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            event_type,
            payload,
        }
    }

    /// Create a handshake message
    pub fn handshake(payload: &HandshakePayload) -> Self {
        Self::new(
            EventType::Handshake,
            serde_json::to_vec(payload).expect("Failed to serialize handshake payload"),
        )
    }

    /// Create an update doorbell with an empty payload
    pub fn update(event_type: EventType) -> Self {
        Self::new(event_type, Vec::new())
    }

    /// Create a delay warning message
    pub fn delay_warning(payload: &DelayWarningPayload) -> Self {
        Self::new(
            EventType::WaiterDelayWarning,
            serde_json::to_vec(payload).expect("Failed to serialize delay warning"),
        )
    }

    /// Create a server message
    pub fn server_message(payload: &ServerMessagePayload) -> Self {
        Self::new(
            EventType::ServerMessage,
            serde_json::to_vec(payload).expect("Failed to serialize server message"),
        )
    }

    /// Parse the payload as the given type
    pub fn parse_payload<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.payload)
    }
}
