//! Floor Client
//!
//! Top-level handle wiring the HTTP surface, the push channel, the
//! store, the arbiter, the delay monitor and the analytics cache into
//! one object with a small read-mostly API.

use crate::analytics::{DashboardReport, ReportCache, SortDirection};
use crate::arbiter::DetectionArbiter;
use crate::config::ClientConfig;
use crate::delay::DelayMonitor;
use crate::http::{FloorApi, HttpClient};
use crate::ingest::{DetectionTelemetry, EventIngestion};
use crate::push::PushClient;
use crate::store::EntityStore;
use shared::ClientResult;
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// The floor dashboard client
pub struct FloorClient {
    api: Arc<dyn FloorApi>,
    store: Arc<EntityStore>,
    arbiter: Arc<DetectionArbiter>,
    delays: Arc<DelayMonitor>,
    ingest: Arc<EventIngestion>,
    push: PushClient,
    reports: ReportCache,
    cancel: CancellationToken,
}

impl FloorClient {
    /// Connect to the remote service and start ingestion
    ///
    /// A failed push-channel dial is not fatal: the client runs
    /// poll-only until the reconnect loop brings the channel up.
    pub async fn connect(config: ClientConfig) -> ClientResult<Self> {
        let api: Arc<dyn FloorApi> = Arc::new(HttpClient::new(&config.base_url));

        let push = match &config.push_addr {
            Some(addr) => match PushClient::connect(addr, env!("CARGO_PKG_NAME")).await {
                Ok(push) => push,
                Err(e) => {
                    tracing::warn!("Push channel unavailable, starting poll-only: {}", e);
                    PushClient::detached()
                }
            },
            None => PushClient::detached(),
        };

        Ok(Self::with_parts(api, push, config))
    }

    /// Assemble a client from pre-built parts and start ingestion
    ///
    /// This is the seam the integration tests use: any `FloorApi`
    /// implementation plus a memory-backed push client.
    pub fn with_parts(api: Arc<dyn FloorApi>, push: PushClient, config: ClientConfig) -> Self {
        let store = Arc::new(EntityStore::new());
        let arbiter = Arc::new(DetectionArbiter::new(api.clone()));
        let delays = Arc::new(DelayMonitor::new(config.delay_warning_ttl));
        let cancel = CancellationToken::new();

        let ingest = Arc::new(EventIngestion::new(
            api.clone(),
            store.clone(),
            arbiter.clone(),
            delays.clone(),
            push.clone(),
            config,
            cancel.clone(),
        ));
        ingest.start();

        Self {
            api,
            store,
            arbiter,
            delays,
            ingest,
            push,
            reports: ReportCache::new(),
            cancel,
        }
    }

    /// The canonical entity snapshots
    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    /// The pending-detection decision slot
    pub fn arbiter(&self) -> &DetectionArbiter {
        &self.arbiter
    }

    /// The waiter-delay warning display
    pub fn delays(&self) -> &DelayMonitor {
        &self.delays
    }

    /// Watch the latest detection telemetry
    pub fn telemetry(&self) -> watch::Receiver<DetectionTelemetry> {
        self.ingest.telemetry()
    }

    /// Whether the push channel is currently up
    pub fn push_connected(&self) -> bool {
        self.push.is_connected()
    }

    /// Direct access to the HTTP surface, for imperative operations
    /// (reset table, auto-assign, clear orders, manual injection)
    pub fn api(&self) -> &Arc<dyn FloorApi> {
        &self.api
    }

    /// Force an immediate re-fetch of all collections
    pub async fn refresh(&self) {
        self.ingest.refresh_all().await;
    }

    /// The dashboard report for the current store revision
    pub fn report(&self, direction: SortDirection) -> Arc<DashboardReport> {
        self.reports.report(&self.store, direction)
    }

    /// Stop all background tasks and close the push channel
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        if let Err(e) = self.push.close().await {
            tracing::debug!("Push channel close failed: {}", e);
        }
    }
}

impl std::fmt::Debug for FloorClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FloorClient")
            .field("push_connected", &self.push.is_connected())
            .finish_non_exhaustive()
    }
}
