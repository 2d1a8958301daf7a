//! Scoring contract: reindex against the training columns, run the
//! classifier, and bucket the probability into a decision and a risk tier.

use crate::errors::AppError;
use crate::features::FeatureVector;
use crate::manifest::ColumnManifest;
use crate::model::ChurnModel;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Probability above which a customer is predicted to churn.
pub const DECISION_THRESHOLD: f64 = 0.5;

/// Probability above which risk is HIGH. Exactly this value is MEDIUM.
pub const HIGH_RISK_THRESHOLD: f64 = 0.7;

/// Probability above which risk is MEDIUM. Exactly this value is LOW.
pub const MEDIUM_RISK_THRESHOLD: f64 = 0.3;

/// Three-tier risk bucketing of the churn probability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Bucket a probability. Thresholds are strict: 0.7 is MEDIUM, 0.3 is LOW.
    pub fn from_probability(probability: f64) -> Self {
        if probability > HIGH_RISK_THRESHOLD {
            RiskLevel::High
        } else if probability > MEDIUM_RISK_THRESHOLD {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    /// Display label, matching the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
        }
    }
}

/// Result of scoring one feature vector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChurnScore {
    /// Churn probability in [0, 1].
    pub probability: f64,
    pub will_churn: bool,
    pub risk_level: RiskLevel,
}

/// Applies a fitted classifier to feature vectors.
///
/// Constructed once at startup from the loaded artifacts and shared
/// immutably across request handlers.
pub struct Scorer {
    model: Arc<dyn ChurnModel>,
    manifest: ColumnManifest,
}

impl Scorer {
    pub fn new(model: Arc<dyn ChurnModel>, manifest: ColumnManifest) -> Self {
        Self { model, manifest }
    }

    /// The training-column manifest this scorer reindexes against.
    pub fn manifest(&self) -> &ColumnManifest {
        &self.manifest
    }

    /// Score one feature vector.
    ///
    /// The vector is always reindexed to exactly the manifest's columns, in
    /// manifest order, zero-filling columns the vector has no value for.
    /// The classifier was fitted on that fixed order; skipping the reindex
    /// would silently produce wrong probabilities.
    pub fn score(&self, features: &FeatureVector) -> Result<ChurnScore, AppError> {
        let encoded = features.encode(&self.manifest.columns);
        if encoded.len() != self.manifest.len() {
            return Err(AppError::FeatureShapeMismatch {
                expected: self.manifest.len(),
                got: encoded.len(),
            });
        }

        let raw = self
            .model
            .predict_proba(&encoded)
            .map_err(|e| AppError::InternalError(format!("Model inference failed: {}", e)))?;
        let probability = raw.clamp(0.0, 1.0);

        Ok(ChurnScore {
            probability,
            will_churn: probability > DECISION_THRESHOLD,
            risk_level: RiskLevel::from_probability(probability),
        })
    }
}
