//! Food Model

use serde::{Deserialize, Serialize};

/// Food entity (read-only input to analytics)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Food {
    pub food_id: String,
    pub name: String,
    /// Category (e.g. soup, salad, dessert, grill)
    pub category: String,
    pub price: f64,
}
