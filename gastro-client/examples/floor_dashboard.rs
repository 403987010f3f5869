//! Minimal floor dashboard: connects to the remote service, mirrors the
//! floor state and prints a report whenever something changes.
//!
//! ```sh
//! GASTRO_BASE_URL=http://localhost:5000 GASTRO_PUSH_ADDR=localhost:5001 \
//!     cargo run --example floor_dashboard
//! ```

use gastro_client::{ArbiterState, ClientConfig, FloorClient, SortDirection};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = ClientConfig::from_env();
    tracing::info!(base_url = %config.base_url, "Starting floor dashboard");

    let client = FloorClient::connect(config).await?;
    let mut changes = client.store().subscribe();
    let mut arbiter_state = client.arbiter().state();
    let mut warnings = client.delays().warnings();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            change = changes.recv() => {
                if change.is_err() {
                    break;
                }
                let report = client.report(SortDirection::Descending);
                println!(
                    "orders: {:>4}  revenue: {:>8.2}  tables: {}  waiters: {}",
                    report.totals.order_count,
                    report.totals.total_revenue,
                    report.totals.table_count,
                    report.totals.waiter_count,
                );
                if let Some(top) = report.top_foods.first() {
                    println!("  top food: {} ({})", top.name, top.count);
                }
            }
            _ = arbiter_state.changed() => {
                if let ArbiterState::AwaitingDecision(d) = &*arbiter_state.borrow_and_update() {
                    println!(
                        "pending: {} at {} ({:.0}% confidence)",
                        d.food_name.as_deref().unwrap_or("?"),
                        d.table_id.as_deref().unwrap_or("?"),
                        d.confidence * 100.0,
                    );
                }
            }
            _ = warnings.changed() => {
                if let Some(w) = &*warnings.borrow_and_update() {
                    println!("DELAY WARNING: table {}", w.table_id);
                }
            }
        }
    }

    client.shutdown().await;
    Ok(())
}
