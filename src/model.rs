//! Fitted-classifier loading and inference via ONNX Runtime.
//!
//! The classifier is an opaque artifact exported from the offline training
//! pipeline. This module loads it once at startup and exposes it behind the
//! [`ChurnModel`] trait so the scoring contract can be tested without a
//! model file on disk.

use anyhow::{Context, Result};
use ort::memory::Allocator;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::{DowncastableTarget, DynMapValueType, DynSequenceValueType, Tensor};
use std::path::Path;
use std::sync::RwLock;
use tracing::{debug, info, warn};

/// A fitted binary classifier producing a churn probability.
pub trait ChurnModel: Send + Sync {
    /// Probability of the positive (churn) class for one encoded vector.
    fn predict_proba(&self, features: &[f32]) -> Result<f64>;
}

/// ONNX-backed churn classifier.
pub struct OnnxChurnModel {
    /// ONNX Runtime session. Inference requires a mutable session, so the
    /// shared model is guarded by a lock.
    session: RwLock<Session>,
    input_name: String,
    output_name: String,
}

impl OnnxChurnModel {
    /// Load the classifier from an ONNX file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        ort::init().commit()?;
        info!(path = %path.display(), "Loading ONNX churn model");

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(1)?
            .commit_from_file(path)
            .with_context(|| format!("Failed to load model from {:?}", path))?;

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .unwrap_or_else(|| "float_input".to_string());

        // sklearn/xgboost exports name the probability output "probabilities"
        // or "output_probability"; fall back to the last output otherwise
        let output_name = session
            .outputs
            .iter()
            .find(|o| o.name.contains("prob") || o.name.contains("output"))
            .map(|o| o.name.clone())
            .unwrap_or_else(|| {
                session
                    .outputs
                    .last()
                    .map(|o| o.name.clone())
                    .unwrap_or_else(|| "probabilities".to_string())
            });

        info!(
            input = %input_name,
            output = %output_name,
            "Churn model loaded"
        );

        Ok(Self {
            session: RwLock::new(session),
            input_name,
            output_name,
        })
    }

    /// Extract the positive-class probability from a tensor output,
    /// shape `[1, 2]` (class probabilities) or `[1, 1]` (single score).
    fn prob_from_tensor(shape: &[i64], data: &[f32]) -> f64 {
        if shape.len() == 2 && shape[1] >= 2 {
            return data[1] as f64;
        }
        data.last().map(|&v| v as f64).unwrap_or(0.5)
    }

    /// Extract the positive-class probability from a `seq(map(int64, float))`
    /// output, the default zipmap format of sklearn ONNX exports.
    fn prob_from_sequence_map(output: &ort::value::DynValue) -> Result<f64> {
        let allocator = Allocator::default();

        let sequence = output
            .downcast_ref::<DynSequenceValueType>()
            .map_err(|e| anyhow::anyhow!("Failed to downcast to sequence: {}", e))?;
        let maps = sequence.try_extract_sequence::<DynMapValueType>(&allocator)?;
        if maps.is_empty() {
            anyhow::bail!("Empty probability sequence");
        }

        let kv_pairs = maps[0].try_extract_key_values::<i64, f32>()?;
        for (class_id, prob) in &kv_pairs {
            if *class_id == 1 {
                return Ok(*prob as f64);
            }
        }
        // Single-class map: invert class 0
        for (class_id, prob) in &kv_pairs {
            if *class_id == 0 {
                return Ok(1.0 - *prob as f64);
            }
        }

        anyhow::bail!("No class probability found in map output")
    }
}

impl ChurnModel for OnnxChurnModel {
    fn predict_proba(&self, features: &[f32]) -> Result<f64> {
        let shape = vec![1_i64, features.len() as i64];
        let input_tensor = Tensor::from_array((shape, features.to_vec()))
            .context("Failed to create input tensor")?;

        let mut session = self
            .session
            .write()
            .map_err(|e| anyhow::anyhow!("Lock error: {}", e))?;
        let outputs = session.run(ort::inputs![&self.input_name => input_tensor])?;

        if let Some(output) = outputs.get(self.output_name.as_str()) {
            if let Ok((shape, data)) = output.try_extract_tensor::<f32>() {
                let dims: Vec<i64> = shape.iter().copied().collect();
                let prob = Self::prob_from_tensor(&dims, data);
                debug!(prob, "Extracted probability from tensor output");
                return Ok(prob);
            }
            if DynSequenceValueType::can_downcast(&output.dtype()) {
                if let Ok(prob) = Self::prob_from_sequence_map(output) {
                    debug!(prob, "Extracted probability from seq(map) output");
                    return Ok(prob);
                }
            }
        }

        // Fallback: scan remaining outputs, skipping the label output
        for (name, output) in outputs.iter() {
            if name.contains("label") {
                continue;
            }
            if let Ok((shape, data)) = output.try_extract_tensor::<f32>() {
                let dims: Vec<i64> = shape.iter().copied().collect();
                return Ok(Self::prob_from_tensor(&dims, data));
            }
            if DynSequenceValueType::can_downcast(&output.dtype()) {
                if let Ok(prob) = Self::prob_from_sequence_map(&output) {
                    return Ok(prob);
                }
            }
        }

        warn!("Could not extract probability from model output, using 0.5");
        Ok(0.5)
    }
}
