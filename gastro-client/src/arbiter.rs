//! Pending Detection Arbiter
//!
//! Owns the single camera-proposed order awaiting an operator decision.
//! The remote pipeline only ever exposes one pending detection at a
//! time, so the arbiter is a one-slot state machine: each poll result
//! replaces or clears the slot, and confirm/reject resolve it.

use crate::http::FloorApi;
use shared::ClientResult;
use shared::models::PendingDetection;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

/// Arbiter state as published to consumers
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ArbiterState {
    /// No actionable detection
    #[default]
    Idle,
    /// A detection is waiting for confirm or reject
    AwaitingDecision(PendingDetection),
}

impl ArbiterState {
    /// The current candidate, if any
    pub fn candidate(&self) -> Option<&PendingDetection> {
        match self {
            ArbiterState::Idle => None,
            ArbiterState::AwaitingDecision(d) => Some(d),
        }
    }
}

/// Result of a confirm or reject call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionOutcome {
    /// The candidate was committed as an order
    Committed,
    /// The candidate was discarded
    Discarded,
    /// Nothing to decide, or a decision was already in flight
    Ignored,
}

#[derive(Debug, Default)]
struct Inner {
    candidate: Option<PendingDetection>,
    /// A confirm or reject is awaiting its HTTP response
    in_flight: bool,
}

/// The one-slot decision state machine
pub struct DetectionArbiter {
    api: Arc<dyn FloorApi>,
    inner: Mutex<Inner>,
    state_tx: watch::Sender<ArbiterState>,
}

impl DetectionArbiter {
    pub fn new(api: Arc<dyn FloorApi>) -> Self {
        let (state_tx, _) = watch::channel(ArbiterState::Idle);
        Self {
            api,
            inner: Mutex::new(Inner::default()),
            state_tx,
        }
    }

    /// Watch arbiter state transitions
    pub fn state(&self) -> watch::Receiver<ArbiterState> {
        self.state_tx.subscribe()
    }

    /// The current candidate, if any
    pub fn candidate(&self) -> Option<PendingDetection> {
        self.inner.lock().unwrap().candidate.clone()
    }

    /// Feed one poll result into the slot
    ///
    /// `Some` actionable payload replaces the candidate; `None`, a
    /// non-actionable payload, or a failed poll (fed in as `None`)
    /// clears it. The newest poll always wins, including while a
    /// decision is in flight.
    pub fn apply_poll(&self, polled: Option<PendingDetection>) {
        let mut inner = self.inner.lock().unwrap();
        let next = polled.filter(|d| d.is_actionable());
        if inner.candidate != next {
            tracing::debug!(
                actionable = next.is_some(),
                "Pending detection slot updated"
            );
            inner.candidate = next;
        }
        self.publish(&inner);
    }

    /// Commit the current candidate as an order
    ///
    /// Re-entrant calls while a decision is in flight are ignored, so a
    /// double-tap cannot commit twice. On failure the candidate stays
    /// in place for a retry; on success it is cleared unless a newer
    /// poll already replaced it.
    pub async fn confirm(&self) -> ClientResult<DecisionOutcome> {
        let snapshot = {
            let mut inner = self.inner.lock().unwrap();
            if inner.in_flight {
                return Ok(DecisionOutcome::Ignored);
            }
            let Some(candidate) = inner.candidate.clone() else {
                return Ok(DecisionOutcome::Ignored);
            };
            inner.in_flight = true;
            candidate
        };

        let result = self.api.confirm_order().await;

        let mut inner = self.inner.lock().unwrap();
        inner.in_flight = false;
        match result {
            Ok(status) => {
                tracing::info!(message = %status.message, "Pending detection confirmed");
                // A newer detection may have landed while the request
                // was in flight; only clear the one we committed.
                if inner.candidate.as_ref() == Some(&snapshot) {
                    inner.candidate = None;
                }
                self.publish(&inner);
                Ok(DecisionOutcome::Committed)
            }
            Err(e) => {
                tracing::warn!("Confirm failed, keeping candidate: {}", e);
                self.publish(&inner);
                Err(e)
            }
        }
    }

    /// Discard the current candidate
    ///
    /// The slot is cleared immediately; the remote discard is
    /// best-effort and a failure does not resurrect the candidate.
    pub async fn reject(&self) -> ClientResult<DecisionOutcome> {
        {
            let mut inner = self.inner.lock().unwrap();
            if inner.in_flight {
                return Ok(DecisionOutcome::Ignored);
            }
            if inner.candidate.is_none() {
                return Ok(DecisionOutcome::Ignored);
            }
            inner.candidate = None;
            inner.in_flight = true;
            self.publish(&inner);
        }

        let result = self.api.reject_order().await;

        self.inner.lock().unwrap().in_flight = false;
        if let Err(e) = &result {
            tracing::warn!("Reject request failed: {}", e);
        }
        result.map(|_| DecisionOutcome::Discarded)
    }

    fn publish(&self, inner: &Inner) {
        let state = match &inner.candidate {
            Some(d) => ArbiterState::AwaitingDecision(d.clone()),
            None => ArbiterState::Idle,
        };
        self.state_tx.send_if_modified(|current| {
            if *current != state {
                *current = state;
                true
            } else {
                false
            }
        });
    }
}

impl std::fmt::Debug for DetectionArbiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DetectionArbiter")
            .field("inner", &self.inner)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use shared::ClientError;
    use shared::models::{
        Food, FoodDetectedRequest, Order, OrderFilter, StatusMessage, Table, TableCreate,
        TableStatusUpdate, Waiter, WaiterDetectedRequest,
    };
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use tokio::sync::Notify;

    #[derive(Default)]
    struct MockApi {
        confirm_calls: AtomicUsize,
        reject_calls: AtomicUsize,
        fail_confirm: AtomicBool,
        fail_reject: AtomicBool,
        /// When set, confirm blocks until notified
        confirm_gate: Option<Arc<Notify>>,
    }

    #[async_trait]
    impl FloorApi for MockApi {
        async fn tables(&self) -> ClientResult<Vec<Table>> {
            Ok(vec![])
        }
        async fn waiters(&self) -> ClientResult<Vec<Waiter>> {
            Ok(vec![])
        }
        async fn foods(&self) -> ClientResult<Vec<Food>> {
            Ok(vec![])
        }
        async fn orders(&self, _: &OrderFilter) -> ClientResult<Vec<Order>> {
            Ok(vec![])
        }
        async fn clear_orders(&self) -> ClientResult<StatusMessage> {
            unimplemented!()
        }
        async fn reset_table(&self, _: &str) -> ClientResult<StatusMessage> {
            unimplemented!()
        }
        async fn update_table_status(&self, _: &TableStatusUpdate) -> ClientResult<StatusMessage> {
            unimplemented!()
        }
        async fn auto_assign(&self) -> ClientResult<StatusMessage> {
            unimplemented!()
        }
        async fn add_table(&self, _: &TableCreate) -> ClientResult<StatusMessage> {
            unimplemented!()
        }
        async fn last_qr(&self) -> ClientResult<Option<String>> {
            Ok(None)
        }
        async fn last_food(&self) -> ClientResult<Option<String>> {
            Ok(None)
        }
        async fn pending_order(&self) -> ClientResult<Option<PendingDetection>> {
            Ok(None)
        }
        async fn confirm_order(&self) -> ClientResult<StatusMessage> {
            if let Some(gate) = &self.confirm_gate {
                gate.notified().await;
            }
            self.confirm_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_confirm.load(Ordering::SeqCst) {
                return Err(ClientError::Internal("boom".into()));
            }
            Ok(StatusMessage {
                message: "Order confirmed".into(),
            })
        }
        async fn reject_order(&self) -> ClientResult<StatusMessage> {
            self.reject_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_reject.load(Ordering::SeqCst) {
                return Err(ClientError::Internal("boom".into()));
            }
            Ok(StatusMessage {
                message: "Order rejected".into(),
            })
        }
        async fn inject_food_detection(
            &self,
            _: &FoodDetectedRequest,
        ) -> ClientResult<StatusMessage> {
            unimplemented!()
        }
        async fn inject_waiter_detection(
            &self,
            _: &WaiterDetectedRequest,
        ) -> ClientResult<StatusMessage> {
            unimplemented!()
        }
    }

    fn detection(food: &str, table: &str) -> PendingDetection {
        PendingDetection {
            food_id: Some("f1".to_string()),
            food_name: Some(food.to_string()),
            table_id: Some(table.to_string()),
            waiter_id: None,
            confidence: 0.9,
            price: Some(45.0),
        }
    }

    #[tokio::test]
    async fn test_poll_replaces_and_clears() {
        let arbiter = DetectionArbiter::new(Arc::new(MockApi::default()));

        arbiter.apply_poll(Some(detection("Soup", "t1")));
        assert!(arbiter.candidate().is_some());

        arbiter.apply_poll(Some(detection("Pizza", "t2")));
        assert_eq!(
            arbiter.candidate().unwrap().food_name.as_deref(),
            Some("Pizza")
        );

        arbiter.apply_poll(None);
        assert!(arbiter.candidate().is_none());
        assert_eq!(*arbiter.state().borrow(), ArbiterState::Idle);
    }

    #[tokio::test]
    async fn test_non_actionable_poll_clears() {
        let arbiter = DetectionArbiter::new(Arc::new(MockApi::default()));
        arbiter.apply_poll(Some(detection("Soup", "t1")));

        let mut partial = detection("Soup", "t1");
        partial.table_id = None;
        arbiter.apply_poll(Some(partial));

        assert!(arbiter.candidate().is_none());
    }

    #[tokio::test]
    async fn test_confirm_commits_and_clears() {
        let api = Arc::new(MockApi::default());
        let arbiter = DetectionArbiter::new(api.clone());
        arbiter.apply_poll(Some(detection("Soup", "t1")));

        let outcome = arbiter.confirm().await.unwrap();
        assert_eq!(outcome, DecisionOutcome::Committed);
        assert!(arbiter.candidate().is_none());
        assert_eq!(api.confirm_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_confirm_without_candidate_is_ignored() {
        let api = Arc::new(MockApi::default());
        let arbiter = DetectionArbiter::new(api.clone());

        let outcome = arbiter.confirm().await.unwrap();
        assert_eq!(outcome, DecisionOutcome::Ignored);
        assert_eq!(api.confirm_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_confirm_failure_keeps_candidate() {
        let api = Arc::new(MockApi::default());
        api.fail_confirm.store(true, Ordering::SeqCst);
        let arbiter = DetectionArbiter::new(api.clone());
        arbiter.apply_poll(Some(detection("Soup", "t1")));

        assert!(arbiter.confirm().await.is_err());
        assert!(arbiter.candidate().is_some());

        // Retry after the failure
        api.fail_confirm.store(false, Ordering::SeqCst);
        assert_eq!(arbiter.confirm().await.unwrap(), DecisionOutcome::Committed);
    }

    #[tokio::test]
    async fn test_concurrent_confirm_is_ignored() {
        let gate = Arc::new(Notify::new());
        let api = Arc::new(MockApi {
            confirm_gate: Some(gate.clone()),
            ..MockApi::default()
        });
        let arbiter = Arc::new(DetectionArbiter::new(api.clone()));
        arbiter.apply_poll(Some(detection("Soup", "t1")));

        let first = {
            let arbiter = arbiter.clone();
            tokio::spawn(async move { arbiter.confirm().await })
        };
        tokio::task::yield_now().await;

        // Double-tap while the first request is still in flight
        let second = arbiter.confirm().await.unwrap();
        assert_eq!(second, DecisionOutcome::Ignored);

        gate.notify_one();
        assert_eq!(
            first.await.unwrap().unwrap(),
            DecisionOutcome::Committed
        );
        assert_eq!(api.confirm_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_confirm_does_not_clear_superseding_candidate() {
        let gate = Arc::new(Notify::new());
        let api = Arc::new(MockApi {
            confirm_gate: Some(gate.clone()),
            ..MockApi::default()
        });
        let arbiter = Arc::new(DetectionArbiter::new(api));
        arbiter.apply_poll(Some(detection("Soup", "t1")));

        let confirm = {
            let arbiter = arbiter.clone();
            tokio::spawn(async move { arbiter.confirm().await })
        };
        tokio::task::yield_now().await;

        // A newer detection lands while confirm is in flight
        arbiter.apply_poll(Some(detection("Pizza", "t2")));

        gate.notify_one();
        assert_eq!(
            confirm.await.unwrap().unwrap(),
            DecisionOutcome::Committed
        );

        // The replacement is still awaiting its own decision
        assert_eq!(
            arbiter.candidate().unwrap().food_name.as_deref(),
            Some("Pizza")
        );
    }

    #[tokio::test]
    async fn test_reject_clears_even_when_request_fails() {
        let api = Arc::new(MockApi::default());
        api.fail_reject.store(true, Ordering::SeqCst);
        let arbiter = DetectionArbiter::new(api.clone());
        arbiter.apply_poll(Some(detection("Soup", "t1")));

        assert!(arbiter.reject().await.is_err());
        assert!(arbiter.candidate().is_none());
        assert_eq!(*arbiter.state().borrow(), ArbiterState::Idle);
    }

    #[tokio::test]
    async fn test_reject_without_candidate_is_ignored() {
        let api = Arc::new(MockApi::default());
        let arbiter = DetectionArbiter::new(api.clone());

        assert_eq!(arbiter.reject().await.unwrap(), DecisionOutcome::Ignored);
        assert_eq!(api.reject_calls.load(Ordering::SeqCst), 0);
    }
}
