//! Delay Monitor
//!
//! Surfaces waiter-delay warnings pushed by the server. A warning stays
//! visible for a fixed TTL and is replaced, not queued, by any newer
//! warning that arrives while one is showing.

use shared::message::DelayWarningPayload;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

/// An active delay warning
#[derive(Debug, Clone)]
pub struct DelayWarning {
    pub table_id: String,
    pub waiter_id: Option<String>,
    /// Stamped at creation; the TTL counts from here
    pub raised_at: Instant,
}

impl DelayWarning {
    pub fn new(table_id: impl Into<String>, waiter_id: Option<String>) -> Self {
        Self {
            table_id: table_id.into(),
            waiter_id,
            raised_at: Instant::now(),
        }
    }
}

impl From<DelayWarningPayload> for DelayWarning {
    fn from(p: DelayWarningPayload) -> Self {
        Self::new(p.table_id, p.waiter_id)
    }
}

/// One-slot warning display with automatic expiry
#[derive(Debug)]
pub struct DelayMonitor {
    ttl: Duration,
    /// Bumped on every raise; an expiry only fires for its own generation
    generation: Arc<AtomicU64>,
    warning_tx: Arc<watch::Sender<Option<DelayWarning>>>,
}

impl DelayMonitor {
    pub fn new(ttl: Duration) -> Self {
        let (warning_tx, _) = watch::channel(None);
        Self {
            ttl,
            generation: Arc::new(AtomicU64::new(0)),
            warning_tx: Arc::new(warning_tx),
        }
    }

    /// Watch the currently visible warning
    pub fn warnings(&self) -> watch::Receiver<Option<DelayWarning>> {
        self.warning_tx.subscribe()
    }

    /// The currently visible warning, if any
    pub fn current(&self) -> Option<DelayWarning> {
        self.warning_tx.borrow().clone()
    }

    /// Show a warning, replacing any current one and restarting the TTL
    pub fn raise(&self, warning: DelayWarning) {
        tracing::info!(table_id = %warning.table_id, "Waiter delay warning raised");
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.warning_tx.send_replace(Some(warning));

        let ttl = self.ttl;
        let current_generation = self.generation.clone();
        let warning_tx = self.warning_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            // A newer warning restarted the clock; leave it alone
            if current_generation.load(Ordering::SeqCst) == generation {
                warning_tx.send_if_modified(|current| current.take().is_some());
            }
        });
    }

    /// Dismiss the current warning immediately
    pub fn dismiss(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.warning_tx.send_if_modified(|current| current.take().is_some());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn warning(table: &str) -> DelayWarning {
        DelayWarning::new(table, Some("w1".to_string()))
    }

    fn current_table(monitor: &DelayMonitor) -> Option<String> {
        monitor.current().map(|w| w.table_id)
    }

    #[tokio::test(start_paused = true)]
    async fn test_warning_expires_after_ttl() {
        let monitor = DelayMonitor::new(Duration::from_millis(5000));
        monitor.raise(warning("t1"));
        assert_eq!(current_table(&monitor), Some("t1".to_string()));

        tokio::time::sleep(Duration::from_millis(5001)).await;
        assert!(monitor.current().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_newer_warning_replaces_and_restarts_clock() {
        let monitor = DelayMonitor::new(Duration::from_millis(5000));
        monitor.raise(warning("t1"));

        tokio::time::sleep(Duration::from_millis(3000)).await;
        monitor.raise(warning("t2"));
        assert_eq!(current_table(&monitor), Some("t2".to_string()));

        // The first warning's expiry must not dismiss the second
        tokio::time::sleep(Duration::from_millis(3000)).await;
        assert_eq!(current_table(&monitor), Some("t2".to_string()));

        tokio::time::sleep(Duration::from_millis(2001)).await;
        assert!(monitor.current().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_warning_carries_raise_time() {
        let monitor = DelayMonitor::new(Duration::from_millis(5000));
        monitor.raise(warning("t1"));

        tokio::time::sleep(Duration::from_millis(2000)).await;
        let raised_at = monitor.current().unwrap().raised_at;
        assert_eq!(raised_at.elapsed(), Duration::from_millis(2000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dismiss_clears_immediately() {
        let monitor = DelayMonitor::new(Duration::from_millis(5000));
        let mut rx = monitor.warnings();

        monitor.raise(warning("t1"));
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().is_some());

        monitor.dismiss();
        assert!(monitor.current().is_none());

        // The stale expiry task must not fire a second change
        tokio::time::sleep(Duration::from_millis(6000)).await;
        assert!(monitor.current().is_none());
    }
}
