//! Entity Store
//!
//! Canonical client-side snapshots of tables, waiters, foods and
//! orders. The only mutators are full-collection replacements (plus the
//! additive order ingestion path); there are no partial-field patches,
//! so push deltas and poll snapshots never need merge logic.
//!
//! Every refresh is bracketed by a ticket carrying a per-collection
//! monotonic sequence number. A response whose ticket is older than the
//! last applied one is discarded, which guarantees the visible snapshot
//! always equals the most recently *completed* fetch even when requests
//! finish out of order.

use serde::Serialize;
use shared::models::{Food, Order, Table, Waiter};
use std::fmt;
use std::sync::Mutex;
use tokio::sync::broadcast;

/// Collection kinds held by the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Tables,
    Waiters,
    Foods,
    Orders,
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Collection::Tables => write!(f, "tables"),
            Collection::Waiters => write!(f, "waiters"),
            Collection::Foods => write!(f, "foods"),
            Collection::Orders => write!(f, "orders"),
        }
    }
}

/// Sequence-numbered handle for one in-flight refresh
#[derive(Debug, Clone, Copy)]
pub struct RefreshTicket {
    collection: Collection,
    seq: u64,
}

impl RefreshTicket {
    pub fn collection(&self) -> Collection {
        self.collection
    }
}

/// Change notification emitted after every applied mutation
///
/// Doubles as the analytics-cache invalidation signal: consumers that
/// memoize derived data key it on `revision`.
#[derive(Debug, Clone)]
pub struct StoreChange {
    pub collection: Collection,
    pub revision: u64,
}

/// Immutable copy of all four collections at one revision
#[derive(Debug, Clone, Default)]
pub struct StoreSnapshot {
    pub tables: Vec<Table>,
    pub waiters: Vec<Waiter>,
    pub foods: Vec<Food>,
    pub orders: Vec<Order>,
    pub revision: u64,
}

#[derive(Debug)]
struct Slot<T> {
    items: Vec<T>,
    /// Last refresh attempt failed; previous snapshot still visible
    stale: bool,
    issued: u64,
    applied: u64,
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            stale: false,
            issued: 0,
            applied: 0,
        }
    }
}

impl<T> Slot<T> {
    fn begin(&mut self, collection: Collection) -> RefreshTicket {
        self.issued += 1;
        RefreshTicket {
            collection,
            seq: self.issued,
        }
    }

    /// Replace the snapshot unless a newer response already landed
    fn apply(&mut self, ticket: RefreshTicket, items: Vec<T>) -> bool {
        if ticket.seq <= self.applied {
            tracing::debug!(
                collection = %ticket.collection,
                seq = ticket.seq,
                applied = self.applied,
                "Discarding stale refresh response"
            );
            return false;
        }
        self.applied = ticket.seq;
        self.items = items;
        self.stale = false;
        true
    }

    /// Flag the snapshot stale unless a newer response already landed
    fn mark_stale(&mut self, ticket: RefreshTicket) {
        if ticket.seq > self.applied {
            self.stale = true;
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    tables: Slot<Table>,
    waiters: Slot<Waiter>,
    foods: Slot<Food>,
    orders: Slot<Order>,
    revision: u64,
}

/// The shared entity store
///
/// Mutated exclusively by event ingestion; everything else reads.
#[derive(Debug)]
pub struct EntityStore {
    inner: Mutex<Inner>,
    change_tx: broadcast::Sender<StoreChange>,
}

impl Default for EntityStore {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityStore {
    pub fn new() -> Self {
        let (change_tx, _) = broadcast::channel(64);
        Self {
            inner: Mutex::new(Inner::default()),
            change_tx,
        }
    }

    /// Subscribe to change notifications
    pub fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        self.change_tx.subscribe()
    }

    /// Open a refresh bracket for the given collection
    pub fn begin_refresh(&self, collection: Collection) -> RefreshTicket {
        let mut inner = self.inner.lock().unwrap();
        match collection {
            Collection::Tables => inner.tables.begin(collection),
            Collection::Waiters => inner.waiters.begin(collection),
            Collection::Foods => inner.foods.begin(collection),
            Collection::Orders => inner.orders.begin(collection),
        }
    }

    /// Complete a failed refresh: keep the old snapshot, flag staleness
    pub fn mark_stale(&self, ticket: RefreshTicket) {
        let mut inner = self.inner.lock().unwrap();
        match ticket.collection {
            Collection::Tables => inner.tables.mark_stale(ticket),
            Collection::Waiters => inner.waiters.mark_stale(ticket),
            Collection::Foods => inner.foods.mark_stale(ticket),
            Collection::Orders => inner.orders.mark_stale(ticket),
        }
    }

    pub fn apply_tables(&self, ticket: RefreshTicket, items: Vec<Table>) -> bool {
        let mut inner = self.inner.lock().unwrap();
        let applied = inner.tables.apply(ticket, items);
        if applied {
            self.notify(&mut inner, Collection::Tables);
        }
        applied
    }

    pub fn apply_waiters(&self, ticket: RefreshTicket, items: Vec<Waiter>) -> bool {
        let mut inner = self.inner.lock().unwrap();
        let applied = inner.waiters.apply(ticket, items);
        if applied {
            self.notify(&mut inner, Collection::Waiters);
        }
        applied
    }

    pub fn apply_foods(&self, ticket: RefreshTicket, items: Vec<Food>) -> bool {
        let mut inner = self.inner.lock().unwrap();
        let applied = inner.foods.apply(ticket, items);
        if applied {
            self.notify(&mut inner, Collection::Foods);
        }
        applied
    }

    pub fn apply_orders(&self, ticket: RefreshTicket, items: Vec<Order>) -> bool {
        let mut inner = self.inner.lock().unwrap();
        let applied = inner.orders.apply(ticket, items);
        if applied {
            self.notify(&mut inner, Collection::Orders);
        }
        applied
    }

    /// Additive order ingestion: replace by id, otherwise prepend
    ///
    /// Orders are immutable remotely, so a same-id replay is a no-op in
    /// content; replacing keeps the operation idempotent.
    pub fn append_or_update_order(&self, order: Order) {
        let mut inner = self.inner.lock().unwrap();
        match inner
            .orders
            .items
            .iter_mut()
            .find(|o| o.order_id == order.order_id)
        {
            Some(existing) => *existing = order,
            None => inner.orders.items.insert(0, order),
        }
        self.notify(&mut inner, Collection::Orders);
    }

    fn notify(&self, inner: &mut Inner, collection: Collection) {
        inner.revision += 1;
        let _ = self.change_tx.send(StoreChange {
            collection,
            revision: inner.revision,
        });
    }

    pub fn tables(&self) -> Vec<Table> {
        self.inner.lock().unwrap().tables.items.clone()
    }

    pub fn waiters(&self) -> Vec<Waiter> {
        self.inner.lock().unwrap().waiters.items.clone()
    }

    pub fn foods(&self) -> Vec<Food> {
        self.inner.lock().unwrap().foods.items.clone()
    }

    pub fn orders(&self) -> Vec<Order> {
        self.inner.lock().unwrap().orders.items.clone()
    }

    /// Whether the collection's last refresh attempt failed
    pub fn is_stale(&self, collection: Collection) -> bool {
        let inner = self.inner.lock().unwrap();
        match collection {
            Collection::Tables => inner.tables.stale,
            Collection::Waiters => inner.waiters.stale,
            Collection::Foods => inner.foods.stale,
            Collection::Orders => inner.orders.stale,
        }
    }

    /// Current mutation count; bumps on every applied change
    pub fn revision(&self) -> u64 {
        self.inner.lock().unwrap().revision
    }

    /// Consistent copy of everything, for the analytics engine
    pub fn snapshot(&self) -> StoreSnapshot {
        let inner = self.inner.lock().unwrap();
        StoreSnapshot {
            tables: inner.tables.items.clone(),
            waiters: inner.waiters.items.clone(),
            foods: inner.foods.items.clone(),
            orders: inner.orders.items.clone(),
            revision: inner.revision,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::TableStatus;

    fn table(id: &str) -> Table {
        Table {
            table_id: id.to_string(),
            waiter_id: None,
            status: TableStatus::Empty,
            last_customer_time: None,
            last_waiter_time: None,
        }
    }

    fn order(id: &str) -> Order {
        Order {
            order_id: id.to_string(),
            table_id: "t1".to_string(),
            waiter_id: None,
            food_id: None,
            food_name: "Pizza".to_string(),
            quantity: 1,
            price: 10.0,
            timestamp: "2026-08-20T12:00:00".to_string(),
        }
    }

    #[test]
    fn test_last_completed_fetch_wins() {
        let store = EntityStore::new();

        // Two refreshes issued; the later one completes first
        let first = store.begin_refresh(Collection::Tables);
        let second = store.begin_refresh(Collection::Tables);

        assert!(store.apply_tables(second, vec![table("t1"), table("t2")]));
        // The slow earlier response must be discarded
        assert!(!store.apply_tables(first, vec![table("old")]));

        let tables = store.tables();
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].table_id, "t1");
    }

    #[test]
    fn test_in_order_completion_applies_both() {
        let store = EntityStore::new();

        let first = store.begin_refresh(Collection::Waiters);
        let second = store.begin_refresh(Collection::Waiters);

        assert!(store.apply_waiters(first, vec![]));
        assert!(store.apply_waiters(
            second,
            vec![Waiter {
                waiter_id: "w1".to_string(),
                name: "Ada".to_string(),
                code: "Q1".to_string(),
                performance: 3,
                interest_level: 0,
            }]
        ));

        assert_eq!(store.waiters().len(), 1);
    }

    #[test]
    fn test_failed_refresh_keeps_previous_snapshot() {
        let store = EntityStore::new();

        let ticket = store.begin_refresh(Collection::Foods);
        assert!(store.apply_foods(
            ticket,
            vec![Food {
                food_id: "f1".to_string(),
                name: "Soup".to_string(),
                category: "soup".to_string(),
                price: 30.0,
            }]
        ));
        assert!(!store.is_stale(Collection::Foods));

        let failed = store.begin_refresh(Collection::Foods);
        store.mark_stale(failed);

        // Previous snapshot stays visible, only the flag flips
        assert_eq!(store.foods().len(), 1);
        assert!(store.is_stale(Collection::Foods));

        // A later success clears staleness
        let retry = store.begin_refresh(Collection::Foods);
        assert!(store.apply_foods(retry, vec![]));
        assert!(!store.is_stale(Collection::Foods));
    }

    #[test]
    fn test_stale_failure_does_not_outrank_newer_success() {
        let store = EntityStore::new();

        let slow = store.begin_refresh(Collection::Orders);
        let fast = store.begin_refresh(Collection::Orders);
        assert!(store.apply_orders(fast, vec![order("o1")]));

        // The slow request fails afterwards; snapshot is not stale
        store.mark_stale(slow);
        assert!(!store.is_stale(Collection::Orders));
    }

    #[test]
    fn test_append_or_update_order_is_idempotent() {
        let store = EntityStore::new();

        store.append_or_update_order(order("o1"));
        store.append_or_update_order(order("o2"));
        store.append_or_update_order(order("o1"));

        let orders = store.orders();
        assert_eq!(orders.len(), 2);
        // Newest first, replay did not reorder
        assert_eq!(orders[0].order_id, "o2");
        assert_eq!(orders[1].order_id, "o1");
    }

    #[tokio::test]
    async fn test_mutations_emit_change_notifications() {
        let store = EntityStore::new();
        let mut changes = store.subscribe();

        let ticket = store.begin_refresh(Collection::Tables);
        store.apply_tables(ticket, vec![table("t1")]);

        let change = changes.recv().await.unwrap();
        assert_eq!(change.collection, Collection::Tables);
        assert_eq!(change.revision, 1);
        assert_eq!(store.revision(), 1);
    }
}
