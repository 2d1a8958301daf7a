//! Versioned manifest of the model's training columns.
//!
//! The manifest is persisted as JSON next to the fitted model and is the
//! only authority on which columns the classifier was fitted on, and in
//! what order. Nothing at serving time may infer columns from incoming
//! data composition.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Ordered list of training columns plus a schema version.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnManifest {
    /// Manifest schema version, bumped whenever the column set changes.
    pub version: u32,
    /// Training column names in the exact order the model was fitted on.
    pub columns: Vec<String>,
}

impl ColumnManifest {
    /// Build a manifest from an ordered column list, validating it.
    pub fn new(version: u32, columns: Vec<String>) -> anyhow::Result<Self> {
        let manifest = Self { version, columns };
        manifest.validate()?;
        Ok(manifest)
    }

    /// Load and validate a manifest from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read column manifest from {:?}", path))?;
        let manifest: Self = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse column manifest at {:?}", path))?;
        manifest.validate()?;
        tracing::info!(
            version = manifest.version,
            columns = manifest.columns.len(),
            "Column manifest loaded"
        );
        Ok(manifest)
    }

    /// Reject manifests that cannot describe a valid model input.
    fn validate(&self) -> anyhow::Result<()> {
        if self.columns.is_empty() {
            anyhow::bail!("Column manifest has no columns");
        }
        let mut seen = HashSet::new();
        for col in &self.columns {
            if col.trim().is_empty() {
                anyhow::bail!("Column manifest contains an empty column name");
            }
            if !seen.insert(col.as_str()) {
                anyhow::bail!("Column manifest contains duplicate column: {}", col);
            }
        }
        Ok(())
    }

    /// Number of input columns the model expects.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Whether the manifest is empty. Always false for a validated manifest.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_well_formed_manifest() {
        let manifest = ColumnManifest::new(
            1,
            vec!["total_orders".to_string(), "country_US".to_string()],
        )
        .unwrap();
        assert_eq!(manifest.len(), 2);
    }

    #[test]
    fn rejects_empty_manifest() {
        assert!(ColumnManifest::new(1, vec![]).is_err());
    }

    #[test]
    fn rejects_duplicate_columns() {
        let result = ColumnManifest::new(
            1,
            vec!["total_orders".to_string(), "total_orders".to_string()],
        );
        assert!(result.is_err());
    }

    #[test]
    fn rejects_blank_column_names() {
        let result = ColumnManifest::new(1, vec!["  ".to_string()]);
        assert!(result.is_err());
    }

    #[test]
    fn round_trips_through_json() {
        let manifest =
            ColumnManifest::new(3, vec!["total_orders".to_string()]).unwrap();
        let json = serde_json::to_string(&manifest).unwrap();
        let back: ColumnManifest = serde_json::from_str(&json).unwrap();
        assert_eq!(back.version, 3);
        assert_eq!(back.columns, manifest.columns);
    }
}
