//! Prediction workflow: fetch history, derive features, score, recommend.

use crate::errors::AppError;
use crate::features::FeatureVector;
use crate::models::{
    BatchPredictionError, BatchPredictionItem, BatchPredictionResponse, PredictionResponse,
};
use crate::scorer::Scorer;
use crate::store;
use chrono::NaiveDate;
use moka::future::Cache;
use sqlx::SqlitePool;
use std::sync::Arc;

/// Recommendation returned for customers predicted to churn.
pub const RETENTION_RECOMMENDATION: &str = "Offer retention discount";

/// Recommendation returned for customers predicted to stay.
pub const ENGAGEMENT_RECOMMENDATION: &str = "Continue normal engagement";

/// End-to-end prediction service.
///
/// Holds the read-only pool and the immutable scorer; constructed once at
/// startup and shared by reference with request handlers.
pub struct PredictionService {
    pool: SqlitePool,
    scorer: Arc<Scorer>,
    /// Short-TTL cache of recent predictions, keyed by customer id.
    cache: Cache<i64, PredictionResponse>,
}

impl PredictionService {
    pub fn new(pool: SqlitePool, scorer: Arc<Scorer>, cache: Cache<i64, PredictionResponse>) -> Self {
        Self {
            pool,
            scorer,
            cache,
        }
    }

    /// Predict churn for one customer at evaluation instant `now`.
    pub async fn predict(
        &self,
        customer_id: i64,
        now: NaiveDate,
    ) -> Result<PredictionResponse, AppError> {
        if let Some(cached) = self.cache.get(&customer_id).await {
            tracing::debug!(customer_id, "Prediction cache hit");
            return Ok(cached);
        }

        let customer = store::fetch_customer(&self.pool, customer_id).await?;
        let orders = store::fetch_orders(&self.pool, customer_id).await?;

        // Same derive call the training export makes; the two paths must
        // never diverge
        let features = FeatureVector::derive(&customer, &orders, now);
        let score = self.scorer.score(&features)?;

        let recommendation = if score.will_churn {
            RETENTION_RECOMMENDATION
        } else {
            ENGAGEMENT_RECOMMENDATION
        };

        let response = PredictionResponse {
            customer_id,
            churn_probability: round3(score.probability),
            will_churn: score.will_churn,
            risk_level: score.risk_level,
            recommendation: recommendation.to_string(),
            status: "success".to_string(),
        };

        tracing::info!(
            customer_id,
            probability = response.churn_probability,
            risk = score.risk_level.as_str(),
            "Churn prediction computed"
        );

        self.cache.insert(customer_id, response.clone()).await;
        Ok(response)
    }

    /// Predict churn for an ordered list of customers.
    ///
    /// Each id is scored independently; a failure for one id becomes an
    /// error record in its slot and never aborts the rest. The result list
    /// matches the input order exactly.
    pub async fn predict_batch(
        &self,
        customer_ids: &[i64],
        now: NaiveDate,
    ) -> BatchPredictionResponse {
        let mut predictions = Vec::with_capacity(customer_ids.len());

        for &customer_id in customer_ids {
            match self.predict(customer_id, now).await {
                Ok(response) => predictions.push(BatchPredictionItem::Success(response)),
                Err(e) => {
                    tracing::warn!(customer_id, error = %e, "Batch item failed");
                    predictions.push(BatchPredictionItem::Failure(BatchPredictionError {
                        customer_id,
                        error: e.to_string(),
                        status: "failed".to_string(),
                    }));
                }
            }
        }

        let total_processed = predictions.len();
        BatchPredictionResponse {
            predictions,
            total_processed,
        }
    }
}

/// Round a probability to 3 decimal places for API responses.
pub fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounding_is_three_decimal_places() {
        assert_eq!(round3(0.123456), 0.123);
        assert_eq!(round3(0.9996), 1.0);
        assert_eq!(round3(0.0), 0.0);
    }
}
