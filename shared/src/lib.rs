//! Shared types for the GastroVision floor client
//!
//! Domain models, push-channel message types and error types used by
//! the client crate and its tests.

pub mod error;
pub mod message;
pub mod models;

// Re-exports
pub use serde::{Deserialize, Serialize};

// Message bus re-exports (for convenient access)
pub use message::{BusMessage, EventType};

pub use error::{ClientError, ClientResult, PushError, PushResult};
