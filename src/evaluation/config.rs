//! Evaluation configuration

use crate::error::{ModelBenchError, Result};
use crate::training::KFold;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Settings shared by every evaluation in a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    /// Number of cross-validation folds on the training split
    pub cv_folds: usize,
    /// Shuffle rows before assigning folds
    pub shuffle: bool,
    /// Seed for the fold shuffle; `None` draws from entropy
    pub random_state: Option<u64>,
    /// Fit cross-validation folds concurrently
    pub parallel_folds: bool,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            cv_folds: 5,
            shuffle: true,
            random_state: Some(42),
            parallel_folds: false,
        }
    }
}

impl EvaluationConfig {
    /// Defaults: 5 shuffled folds seeded with 42, run sequentially
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cross-validation folds, at least 2
    pub fn with_cv_folds(mut self, folds: usize) -> Self {
        self.cv_folds = folds;
        self
    }

    /// Shuffle rows before assigning folds
    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    /// Fold shuffle seed; `None` draws from entropy
    pub fn with_random_state(mut self, seed: Option<u64>) -> Self {
        self.random_state = seed;
        self
    }

    /// Score folds on the rayon pool
    pub fn with_parallel_folds(mut self, parallel: bool) -> Self {
        self.parallel_folds = parallel;
        self
    }

    /// Reject settings the harness cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.cv_folds < 2 {
            return Err(ModelBenchError::ConfigError(format!(
                "cv_folds must be at least 2, got {}",
                self.cv_folds
            )));
        }
        Ok(())
    }

    /// Parse and validate a JSON config
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON config file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub(crate) fn kfold(&self) -> KFold {
        KFold {
            n_splits: self.cv_folds,
            shuffle: self.shuffle,
            random_state: self.random_state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EvaluationConfig::default();
        assert_eq!(config.cv_folds, 5);
        assert!(config.shuffle);
        assert_eq!(config.random_state, Some(42));
        assert!(!config.parallel_folds);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = EvaluationConfig::from_json_str(r#"{"cv_folds": 3, "parallel_folds": true}"#).unwrap();
        assert_eq!(config.cv_folds, 3);
        assert!(config.parallel_folds);
        assert_eq!(config.random_state, Some(42));
    }

    #[test]
    fn test_invalid_folds() {
        assert!(matches!(
            EvaluationConfig::from_json_str(r#"{"cv_folds": 1}"#),
            Err(ModelBenchError::ConfigError(_))
        ));
    }

    #[test]
    fn test_json_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("eval.json");
        let config = EvaluationConfig::new().with_cv_folds(4).with_random_state(None);
        std::fs::write(&path, config.to_json().unwrap()).unwrap();

        assert_eq!(EvaluationConfig::from_json_file(&path).unwrap(), config);
    }
}
