//! Event Ingestion
//!
//! The only writer to the Entity Store. Two producers feed it: the push
//! channel (low-latency doorbells) and the poll timers (correctness
//! backstop). Both funnel into the same idempotent full-collection
//! refreshes, so correctness never depends on which producer wins a
//! race, only on response completion order.

use crate::arbiter::DetectionArbiter;
use crate::config::ClientConfig;
use crate::delay::{DelayMonitor, DelayWarning};
use crate::http::FloorApi;
use crate::push::PushClient;
use crate::store::{Collection, EntityStore};
use shared::message::{BusMessage, DelayWarningPayload, EventType, ServerMessagePayload};
use shared::models::OrderFilter;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;

/// Latest raw detection telemetry (QR scan and food prediction)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DetectionTelemetry {
    pub last_qr: Option<String>,
    pub last_food: Option<String>,
}

/// Background ingestion pipeline
///
/// `start` spawns the dispatch loop, the reconnect loop and the three
/// poll timers; all of them stop when the cancellation token fires.
pub struct EventIngestion {
    api: Arc<dyn FloorApi>,
    store: Arc<EntityStore>,
    arbiter: Arc<DetectionArbiter>,
    delays: Arc<DelayMonitor>,
    push: PushClient,
    config: ClientConfig,
    telemetry_tx: watch::Sender<DetectionTelemetry>,
    cancel: CancellationToken,
}

impl EventIngestion {
    pub fn new(
        api: Arc<dyn FloorApi>,
        store: Arc<EntityStore>,
        arbiter: Arc<DetectionArbiter>,
        delays: Arc<DelayMonitor>,
        push: PushClient,
        config: ClientConfig,
        cancel: CancellationToken,
    ) -> Self {
        let (telemetry_tx, _) = watch::channel(DetectionTelemetry::default());
        Self {
            api,
            store,
            arbiter,
            delays,
            push,
            config,
            telemetry_tx,
            cancel,
        }
    }

    /// Watch the latest detection telemetry
    pub fn telemetry(&self) -> watch::Receiver<DetectionTelemetry> {
        self.telemetry_tx.subscribe()
    }

    /// Spawn all ingestion tasks
    pub fn start(self: &Arc<Self>) {
        self.spawn_dispatch_loop();
        self.spawn_reconnect_loop();
        self.spawn_collection_poll();
        self.spawn_telemetry_poll();
        self.spawn_pending_poll();
    }

    // ========================================================================
    // Push dispatch
    // ========================================================================

    fn spawn_dispatch_loop(self: &Arc<Self>) {
        let this = self.clone();
        let mut events = self.push.subscribe();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = this.cancel.cancelled() => break,
                    received = events.recv() => match received {
                        Ok(msg) => this.dispatch(msg),
                        // Missed doorbells are recovered by the next
                        // refresh; just keep reading.
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!("Push dispatch lagged, skipped {} events", skipped);
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                }
            }
        });
    }

    /// Route one push event
    ///
    /// Collection refreshes are spawned, not awaited: a slow fetch must
    /// not hold up later events (a delay warning behind it would lose
    /// its display window). Out-of-order completion is already safe
    /// under the store's sequence guard.
    fn dispatch(self: &Arc<Self>, msg: BusMessage) {
        tracing::debug!(event = %msg.event_type, "Push event received");
        match msg.event_type {
            // An order changes table occupancy too, so both collections
            // are re-fetched on the order doorbell.
            EventType::OrderUpdate => {
                let this = self.clone();
                tokio::spawn(async move {
                    this.refresh_orders().await;
                    this.refresh_tables().await;
                });
            }
            EventType::TableUpdate => {
                let this = self.clone();
                tokio::spawn(async move { this.refresh_tables().await });
            }
            EventType::WaiterUpdate => {
                let this = self.clone();
                tokio::spawn(async move { this.refresh_waiters().await });
            }
            EventType::FoodUpdate => {
                let this = self.clone();
                tokio::spawn(async move { this.refresh_foods().await });
            }
            EventType::WaiterDelayWarning => match msg.parse_payload::<DelayWarningPayload>() {
                Ok(payload) => self.delays.raise(DelayWarning::from(payload)),
                Err(e) => tracing::warn!("Malformed delay warning payload: {}", e),
            },
            EventType::ServerMessage => match msg.parse_payload::<ServerMessagePayload>() {
                Ok(payload) => tracing::info!(message = %payload.message, "Server message"),
                Err(e) => tracing::warn!("Malformed server message payload: {}", e),
            },
            EventType::Handshake => {}
        }
    }

    // ========================================================================
    // Reconnect
    // ========================================================================

    fn spawn_reconnect_loop(self: &Arc<Self>) {
        let this = self.clone();
        let mut connected = self.push.connected();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = this.cancel.cancelled() => break,
                    changed = connected.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        if *connected.borrow_and_update() {
                            continue;
                        }
                        if this.redial().await {
                            // Anything pushed while disconnected is
                            // unrecoverable; resync everything.
                            this.refresh_all().await;
                        } else {
                            break;
                        }
                    }
                }
            }
        });
    }

    /// Retry until the push channel is back or shutdown is requested
    async fn redial(&self) -> bool {
        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => return false,
                _ = tokio::time::sleep(self.config.reconnect_delay) => {}
            }
            match self.push.reconnect().await {
                Ok(()) => {
                    tracing::info!("Push channel reconnected");
                    return true;
                }
                Err(e) => tracing::warn!("Push reconnect failed: {}", e),
            }
        }
    }

    // ========================================================================
    // Poll timers
    // ========================================================================

    fn spawn_collection_poll(self: &Arc<Self>) {
        let this = self.clone();
        tokio::spawn(async move {
            // First tick is immediate and doubles as the initial load
            let mut ticker = tokio::time::interval(this.config.collection_refresh_interval);
            loop {
                tokio::select! {
                    _ = this.cancel.cancelled() => break,
                    _ = ticker.tick() => this.refresh_all().await,
                }
            }
        });
    }

    fn spawn_telemetry_poll(self: &Arc<Self>) {
        let this = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(this.config.telemetry_poll_interval);
            loop {
                tokio::select! {
                    _ = this.cancel.cancelled() => break,
                    _ = ticker.tick() => this.poll_telemetry().await,
                }
            }
        });
    }

    async fn poll_telemetry(&self) {
        let last_qr = match self.api.last_qr().await {
            Ok(v) => v,
            Err(e) => {
                tracing::debug!("Telemetry poll (qr) failed: {}", e);
                return;
            }
        };
        let last_food = match self.api.last_food().await {
            Ok(v) => v,
            Err(e) => {
                tracing::debug!("Telemetry poll (food) failed: {}", e);
                return;
            }
        };

        let telemetry = DetectionTelemetry { last_qr, last_food };
        self.telemetry_tx.send_if_modified(|current| {
            if *current != telemetry {
                *current = telemetry;
                true
            } else {
                false
            }
        });
    }

    fn spawn_pending_poll(self: &Arc<Self>) {
        let this = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(this.config.pending_poll_interval);
            loop {
                tokio::select! {
                    _ = this.cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        match this.api.pending_order().await {
                            Ok(polled) => this.arbiter.apply_poll(polled),
                            // An unreachable pipeline has no candidate
                            // worth acting on.
                            Err(e) => {
                                tracing::warn!("Pending detection poll failed: {}", e);
                                this.arbiter.apply_poll(None);
                            }
                        }
                    }
                }
            }
        });
    }

    // ========================================================================
    // Collection refreshes
    // ========================================================================

    /// Re-fetch all four collections
    pub async fn refresh_all(&self) {
        tokio::join!(
            self.refresh_tables(),
            self.refresh_waiters(),
            self.refresh_foods(),
            self.refresh_orders(),
        );
    }

    pub async fn refresh_tables(&self) {
        let ticket = self.store.begin_refresh(Collection::Tables);
        match self.api.tables().await {
            Ok(items) => {
                self.store.apply_tables(ticket, items);
            }
            Err(e) => {
                tracing::warn!("Table refresh failed: {}", e);
                self.store.mark_stale(ticket);
            }
        }
    }

    pub async fn refresh_waiters(&self) {
        let ticket = self.store.begin_refresh(Collection::Waiters);
        match self.api.waiters().await {
            Ok(items) => {
                self.store.apply_waiters(ticket, items);
            }
            Err(e) => {
                tracing::warn!("Waiter refresh failed: {}", e);
                self.store.mark_stale(ticket);
            }
        }
    }

    pub async fn refresh_foods(&self) {
        let ticket = self.store.begin_refresh(Collection::Foods);
        match self.api.foods().await {
            Ok(items) => {
                self.store.apply_foods(ticket, items);
            }
            Err(e) => {
                tracing::warn!("Food refresh failed: {}", e);
                self.store.mark_stale(ticket);
            }
        }
    }

    pub async fn refresh_orders(&self) {
        let ticket = self.store.begin_refresh(Collection::Orders);
        match self.api.orders(&OrderFilter::all()).await {
            Ok(items) => {
                self.store.apply_orders(ticket, items);
            }
            Err(e) => {
                tracing::warn!("Order refresh failed: {}", e);
                self.store.mark_stale(ticket);
            }
        }
    }
}

impl std::fmt::Debug for EventIngestion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventIngestion").finish_non_exhaustive()
    }
}
