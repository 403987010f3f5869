//! Analytics Engine
//!
//! Pure, deterministic reductions over one store snapshot. Nothing here
//! holds incremental state; a report is recomputed from scratch and the
//! cache layer only reuses it while the store revision is unchanged.
//!
//! All sorts are stable so equal keys keep their first-encountered
//! order and output stays reproducible.

use crate::store::{EntityStore, StoreSnapshot};
use serde::Serialize;
use shared::models::{Food, Order, Waiter};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

const TOP_N: usize = 7;
const TREND_DAYS: usize = 14;

/// Ranking direction for the waiter performance report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Descending,
    Ascending,
}

// ============================================================================
// Report Rows
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FoodCount {
    pub name: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WaiterPerformance {
    pub name: String,
    pub performance: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRevenue {
    pub name: String,
    pub revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyCount {
    /// Calendar day, the date portion of the order timestamp
    pub date: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryRevenue {
    pub category: String,
    pub revenue: f64,
}

/// Simple whole-snapshot reductions
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Totals {
    pub order_count: usize,
    pub total_revenue: f64,
    pub waiter_count: usize,
    pub table_count: usize,
}

/// One full dashboard report over a single snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardReport {
    pub top_foods: Vec<FoodCount>,
    pub waiter_ranking: Vec<WaiterPerformance>,
    pub table_revenue: Vec<TableRevenue>,
    pub daily_trend: Vec<DailyCount>,
    pub category_revenue: Vec<CategoryRevenue>,
    pub totals: Totals,
    /// Store revision the report was computed from
    pub revision: u64,
}

impl DashboardReport {
    pub fn compute(snapshot: &StoreSnapshot, direction: SortDirection) -> Self {
        Self {
            top_foods: top_foods(&snapshot.orders),
            waiter_ranking: waiter_ranking(&snapshot.waiters, direction),
            table_revenue: table_revenue(&snapshot.orders),
            daily_trend: daily_trend(&snapshot.orders),
            category_revenue: category_revenue(&snapshot.orders, &snapshot.foods),
            totals: totals(snapshot),
            revision: snapshot.revision,
        }
    }
}

// ============================================================================
// Reductions
// ============================================================================

/// Grouping helper that preserves first-encountered key order
struct Grouper<'a, V> {
    index: HashMap<&'a str, usize>,
    entries: Vec<(&'a str, V)>,
}

impl<'a, V> Grouper<'a, V> {
    fn new() -> Self {
        Self {
            index: HashMap::new(),
            entries: Vec::new(),
        }
    }

    fn entry(&mut self, key: &'a str, init: V) -> &mut V {
        let idx = match self.index.get(key) {
            Some(idx) => *idx,
            None => {
                self.entries.push((key, init));
                self.index.insert(key, self.entries.len() - 1);
                self.entries.len() - 1
            }
        };
        &mut self.entries[idx].1
    }

    fn into_entries(self) -> Vec<(&'a str, V)> {
        self.entries
    }
}

/// Top foods by total quantity ordered
pub fn top_foods(orders: &[Order]) -> Vec<FoodCount> {
    let mut grouper: Grouper<'_, i64> = Grouper::new();
    for order in orders {
        *grouper.entry(&order.food_name, 0) += order.quantity;
    }

    let mut rows: Vec<FoodCount> = grouper
        .into_entries()
        .into_iter()
        .map(|(name, count)| FoodCount {
            name: name.to_string(),
            count,
        })
        .collect();
    rows.sort_by(|a, b| b.count.cmp(&a.count));
    rows.truncate(TOP_N);
    rows
}

/// Waiters ranked by performance score
pub fn waiter_ranking(waiters: &[Waiter], direction: SortDirection) -> Vec<WaiterPerformance> {
    let mut rows: Vec<WaiterPerformance> = waiters
        .iter()
        .map(|w| WaiterPerformance {
            name: w.name.clone(),
            performance: w.performance,
        })
        .collect();
    match direction {
        SortDirection::Descending => rows.sort_by(|a, b| b.performance.cmp(&a.performance)),
        SortDirection::Ascending => rows.sort_by(|a, b| a.performance.cmp(&b.performance)),
    }
    rows.truncate(TOP_N);
    rows
}

/// Revenue per table, summed over that table's orders
pub fn table_revenue(orders: &[Order]) -> Vec<TableRevenue> {
    let mut grouper: Grouper<'_, f64> = Grouper::new();
    for order in orders {
        *grouper.entry(&order.table_id, 0.0) += order.price;
    }

    let mut rows: Vec<TableRevenue> = grouper
        .into_entries()
        .into_iter()
        .map(|(name, revenue)| TableRevenue {
            name: name.to_string(),
            revenue,
        })
        .collect();
    rows.sort_by(|a, b| b.revenue.total_cmp(&a.revenue));
    rows.truncate(TOP_N);
    rows
}

/// Orders per calendar day, ascending, last fourteen days present in
/// the data (days without orders do not appear)
pub fn daily_trend(orders: &[Order]) -> Vec<DailyCount> {
    let mut per_day: BTreeMap<&str, i64> = BTreeMap::new();
    for order in orders {
        let day = order.timestamp.get(..10).unwrap_or(&order.timestamp);
        if day.is_empty() {
            continue;
        }
        *per_day.entry(day).or_insert(0) += 1;
    }

    let skip = per_day.len().saturating_sub(TREND_DAYS);
    per_day
        .into_iter()
        .skip(skip)
        .map(|(date, count)| DailyCount {
            date: date.to_string(),
            count,
        })
        .collect()
}

/// Revenue per food category, resolved through the food snapshot
///
/// Orders whose food id has no match (or none at all) land in the
/// "Unknown" bucket.
pub fn category_revenue(orders: &[Order], foods: &[Food]) -> Vec<CategoryRevenue> {
    let categories: HashMap<&str, &str> = foods
        .iter()
        .map(|f| (f.food_id.as_str(), f.category.as_str()))
        .collect();

    let mut grouper: Grouper<'_, f64> = Grouper::new();
    for order in orders {
        let category = order
            .food_id
            .as_deref()
            .and_then(|id| categories.get(id).copied())
            .unwrap_or("Unknown");
        *grouper.entry(category, 0.0) += order.price;
    }

    let mut rows: Vec<CategoryRevenue> = grouper
        .into_entries()
        .into_iter()
        .map(|(category, revenue)| CategoryRevenue {
            category: category.to_string(),
            revenue,
        })
        .collect();
    rows.sort_by(|a, b| b.revenue.total_cmp(&a.revenue));
    rows
}

pub fn totals(snapshot: &StoreSnapshot) -> Totals {
    Totals {
        order_count: snapshot.orders.len(),
        total_revenue: snapshot.orders.iter().map(|o| o.price).sum(),
        waiter_count: snapshot.waiters.len(),
        table_count: snapshot.tables.len(),
    }
}

// ============================================================================
// Report Cache
// ============================================================================

/// Memoizes the latest report keyed on store revision
///
/// A store change bumps the revision, which invalidates the cached
/// report on the next request; no explicit invalidation wiring needed.
#[derive(Debug, Default)]
pub struct ReportCache {
    cached: Mutex<Option<(u64, SortDirection, Arc<DashboardReport>)>>,
}

impl ReportCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The report for the store's current revision
    pub fn report(&self, store: &EntityStore, direction: SortDirection) -> Arc<DashboardReport> {
        let revision = store.revision();
        {
            let cached = self.cached.lock().unwrap();
            if let Some((rev, dir, report)) = cached.as_ref()
                && *rev == revision
                && *dir == direction
            {
                return report.clone();
            }
        }

        let report = Arc::new(DashboardReport::compute(&store.snapshot(), direction));
        *self.cached.lock().unwrap() = Some((report.revision, direction, report.clone()));
        report
    }
}
