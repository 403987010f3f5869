//! HTTP surface of the remote service
//!
//! `FloorApi` is the seam every component works against; `HttpClient`
//! is the reqwest-backed production implementation. Tests substitute
//! their own `FloorApi` implementations.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use shared::models::{
    Food, FoodDetectedRequest, LastFood, LastQr, Order, OrderFilter, PendingDetection,
    PendingOrderEnvelope, StatusMessage, Table, TableCreate, TableStatusUpdate, Waiter,
    WaiterDetectedRequest,
};
use shared::{ClientError, ClientResult};

// ============================================================================
// FloorApi Trait
// ============================================================================

/// Remote service surface used by the floor client
#[async_trait]
pub trait FloorApi: Send + Sync {
    /// Full table snapshot
    async fn tables(&self) -> ClientResult<Vec<Table>>;

    /// Full waiter snapshot
    async fn waiters(&self) -> ClientResult<Vec<Waiter>>;

    /// Full food snapshot
    async fn foods(&self) -> ClientResult<Vec<Food>>;

    /// Filtered order snapshot; an empty filter returns everything
    async fn orders(&self, filter: &OrderFilter) -> ClientResult<Vec<Order>>;

    /// Delete all orders
    async fn clear_orders(&self) -> ClientResult<StatusMessage>;

    /// Clear a table's bill and reset it to empty
    async fn reset_table(&self, table_id: &str) -> ClientResult<StatusMessage>;

    /// Update a table's status
    async fn update_table_status(&self, req: &TableStatusUpdate) -> ClientResult<StatusMessage>;

    /// Trigger the remote waiter-assignment heuristic
    async fn auto_assign(&self) -> ClientResult<StatusMessage>;

    /// Create a table
    async fn add_table(&self, req: &TableCreate) -> ClientResult<StatusMessage>;

    /// Most recently scanned QR/badge code
    async fn last_qr(&self) -> ClientResult<Option<String>>;

    /// Most recently predicted food
    async fn last_food(&self) -> ClientResult<Option<String>>;

    /// Current camera-proposed order, if any
    async fn pending_order(&self) -> ClientResult<Option<PendingDetection>>;

    /// Commit the current pending detection as an order
    async fn confirm_order(&self) -> ClientResult<StatusMessage>;

    /// Discard the current pending detection
    async fn reject_order(&self) -> ClientResult<StatusMessage>;

    /// Inject a food detection as if the camera had seen it
    async fn inject_food_detection(&self, req: &FoodDetectedRequest) -> ClientResult<StatusMessage>;

    /// Inject a waiter check-in as if the camera had seen it
    async fn inject_waiter_detection(
        &self,
        req: &WaiterDetectedRequest,
    ) -> ClientResult<StatusMessage>;
}

// ============================================================================
// HttpClient
// ============================================================================

/// reqwest-backed `FloorApi` implementation
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpClient {
    /// Create a new HTTP client for the given base URL
    pub fn new(base_url: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self.client.get(&url).send().await?;
        Self::handle_response(resp).await
    }

    async fn post<T: DeserializeOwned, B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self.client.post(&url).json(body).send().await?;
        Self::handle_response(resp).await
    }

    async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self.client.post(&url).send().await?;
        Self::handle_response(resp).await
    }

    async fn delete<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self.client.delete(&url).send().await?;
        Self::handle_response(resp).await
    }

    async fn handle_response<T: DeserializeOwned>(resp: reqwest::Response) -> ClientResult<T> {
        let status = resp.status();

        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            let detail = error_detail(&text);
            return match status {
                StatusCode::BAD_REQUEST => Err(ClientError::Validation(detail)),
                StatusCode::NOT_FOUND => Err(ClientError::NotFound(detail)),
                _ => Err(ClientError::Internal(detail)),
            };
        }

        resp.json().await.map_err(Into::into)
    }
}

/// Pull the `error`/`message` text out of an error body, if present
fn error_detail(body: &str) -> String {
    #[derive(serde::Deserialize)]
    struct ErrorBody {
        error: Option<String>,
        message: Option<String>,
    }

    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error.or(b.message))
        .unwrap_or_else(|| body.to_string())
}

/// Build the `/orders` query string; absent filters are omitted entirely
fn orders_path(filter: &OrderFilter) -> String {
    let mut params = Vec::new();
    if let Some(id) = &filter.waiter_id {
        params.push(format!("waiter_id={}", urlencoding::encode(id)));
    }
    if let Some(name) = &filter.food_name {
        params.push(format!("food_name={}", urlencoding::encode(name)));
    }
    if let Some(id) = &filter.table_id {
        params.push(format!("table_id={}", urlencoding::encode(id)));
    }
    if let Some(start) = &filter.start_date {
        params.push(format!("start_date={}", urlencoding::encode(start)));
    }
    if let Some(end) = &filter.end_date {
        params.push(format!("end_date={}", urlencoding::encode(end)));
    }

    if params.is_empty() {
        "/orders".to_string()
    } else {
        format!("/orders?{}", params.join("&"))
    }
}

#[async_trait]
impl FloorApi for HttpClient {
    async fn tables(&self) -> ClientResult<Vec<Table>> {
        self.get("/tables").await
    }

    async fn waiters(&self) -> ClientResult<Vec<Waiter>> {
        self.get("/waiters").await
    }

    async fn foods(&self) -> ClientResult<Vec<Food>> {
        self.get("/foods").await
    }

    async fn orders(&self, filter: &OrderFilter) -> ClientResult<Vec<Order>> {
        self.get(&orders_path(filter)).await
    }

    async fn clear_orders(&self) -> ClientResult<StatusMessage> {
        self.delete("/orders").await
    }

    async fn reset_table(&self, table_id: &str) -> ClientResult<StatusMessage> {
        #[derive(serde::Serialize)]
        struct ResetRequest<'a> {
            table_id: &'a str,
        }

        self.post("/reset_table", &ResetRequest { table_id }).await
    }

    async fn update_table_status(&self, req: &TableStatusUpdate) -> ClientResult<StatusMessage> {
        self.post("/tables/update_status", req).await
    }

    async fn auto_assign(&self) -> ClientResult<StatusMessage> {
        self.post_empty("/tables/auto_assign").await
    }

    async fn add_table(&self, req: &TableCreate) -> ClientResult<StatusMessage> {
        self.post("/tables", req).await
    }

    async fn last_qr(&self) -> ClientResult<Option<String>> {
        let resp: LastQr = self.get("/last_qr").await?;
        Ok(resp.last_qr.filter(|s| !s.is_empty()))
    }

    async fn last_food(&self) -> ClientResult<Option<String>> {
        let resp: LastFood = self.get("/last_food").await?;
        Ok(resp.last_food.filter(|s| !s.is_empty()))
    }

    async fn pending_order(&self) -> ClientResult<Option<PendingDetection>> {
        let resp: PendingOrderEnvelope = self.get("/pending_order").await?;
        Ok(resp.pending_order)
    }

    async fn confirm_order(&self) -> ClientResult<StatusMessage> {
        self.post_empty("/confirm_order").await
    }

    async fn reject_order(&self) -> ClientResult<StatusMessage> {
        self.post_empty("/reject_order").await
    }

    async fn inject_food_detection(&self, req: &FoodDetectedRequest) -> ClientResult<StatusMessage> {
        self.post("/api/camera/food_detected", req).await
    }

    async fn inject_waiter_detection(
        &self,
        req: &WaiterDetectedRequest,
    ) -> ClientResult<StatusMessage> {
        self.post("/api/camera/waiter_detected", req).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orders_path_without_filters() {
        assert_eq!(orders_path(&OrderFilter::all()), "/orders");
    }

    #[test]
    fn test_orders_path_with_filters() {
        let filter = OrderFilter {
            waiter_id: Some("w1".to_string()),
            food_name: Some("Lentil Soup".to_string()),
            table_id: None,
            start_date: Some("2026-08-01T00:00".to_string()),
            end_date: None,
        };

        assert_eq!(
            orders_path(&filter),
            "/orders?waiter_id=w1&food_name=Lentil%20Soup&start_date=2026-08-01T00%3A00"
        );
    }

    #[test]
    fn test_error_detail_prefers_error_field() {
        assert_eq!(
            error_detail(r#"{"error":"table_id is required"}"#),
            "table_id is required"
        );
        assert_eq!(error_detail(r#"{"message":"Table added"}"#), "Table added");
        assert_eq!(error_detail("plain text"), "plain text");
    }
}
