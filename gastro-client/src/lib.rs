//! Gastro Client - floor dashboard client engine
//!
//! Keeps a client-side mirror of the restaurant floor (tables, waiters,
//! menu, orders) in sync with the remote service over HTTP polls and a
//! push channel, arbitrates camera-proposed orders, surfaces waiter
//! delay warnings and derives the dashboard reports.

pub mod analytics;
pub mod arbiter;
pub mod client;
pub mod config;
pub mod delay;
pub mod http;
pub mod ingest;
pub mod push;
pub mod store;

pub use client::FloorClient;
pub use config::ClientConfig;
pub use http::{FloorApi, HttpClient};

// Re-export shared types for convenience
pub use shared::models::{
    Food, Order, OrderFilter, PendingDetection, Table, TableStatus, Waiter,
};
pub use shared::{ClientError, ClientResult, PushError, PushResult};

// Component handles
pub use analytics::{DashboardReport, SortDirection};
pub use arbiter::{ArbiterState, DecisionOutcome, DetectionArbiter};
pub use delay::{DelayMonitor, DelayWarning};
pub use ingest::DetectionTelemetry;
pub use push::PushClient;
pub use store::{Collection, EntityStore, StoreChange, StoreSnapshot};
