//! Push channel
//!
//! Persistent server-to-client event subscription: the low-latency half
//! of the ingestion pipeline. The poll timers in `ingest` are the
//! correctness backstop; nothing here is load-bearing for consistency.

pub mod client;
pub mod transport;

pub use client::PushClient;
pub use transport::{MemoryTransport, TcpTransport, Transport};
