use crate::scorer::RiskLevel;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// ============ Database Models ============

/// A customer row from the relational store.
///
/// Customers are never mutated after creation except by recording new orders.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Customer {
    /// Unique customer identifier.
    pub user_id: i64,
    /// Contact email, if recorded.
    pub email: Option<String>,
    /// Date the customer signed up.
    pub signup_date: Option<NaiveDate>,
    /// Free-text country label, used as a categorical feature.
    pub country: String,
}

/// An order row from the relational store.
///
/// Orders are immutable once recorded; corrections replace the order set.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Order {
    /// Unique order identifier.
    pub order_id: i64,
    /// Customer who placed the order.
    pub user_id: i64,
    /// Product that was ordered.
    pub product_id: i64,
    /// Date the order was placed.
    pub order_date: NaiveDate,
    /// Number of units ordered. Zero-quantity orders still count as orders.
    pub quantity: i64,
    /// Monetary amount of the order, non-negative.
    pub amount: f64,
    /// Free-text status label (e.g. "completed", "refunded").
    pub status: String,
}

// ============ API Response Models ============

/// Response for a single churn prediction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub customer_id: i64,
    /// Churn probability, rounded to 3 decimal places.
    pub churn_probability: f64,
    pub will_churn: bool,
    pub risk_level: RiskLevel,
    pub recommendation: String,
    pub status: String,
}

/// Per-item error record emitted by batch scoring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchPredictionError {
    pub customer_id: i64,
    pub error: String,
    pub status: String,
}

/// One entry of a batch result: either a successful score or an error record.
///
/// Serialized untagged so successful entries look exactly like single
/// prediction responses and failed entries carry an `error` field.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BatchPredictionItem {
    Success(PredictionResponse),
    Failure(BatchPredictionError),
}

impl BatchPredictionItem {
    /// Whether this entry is a successful prediction.
    pub fn is_success(&self) -> bool {
        matches!(self, BatchPredictionItem::Success(_))
    }
}

/// Response for a batch prediction request. Entries preserve input order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchPredictionResponse {
    pub predictions: Vec<BatchPredictionItem>,
    pub total_processed: usize,
}
