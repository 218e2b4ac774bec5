//! Feature importance reporting

use super::Regressor;
use serde::{Deserialize, Serialize};

/// The kind of importance a model type exposes, fixed per type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImportanceKind {
    /// Impurity reduction accumulated over tree splits
    TreeBased,
    /// Fitted linear coefficients
    LinearCoefficient,
    NotAvailable,
}

impl ImportanceKind {
    /// Pull this kind's values out of a fitted model, paired with column names
    pub fn extract(&self, model: &dyn Regressor) -> Option<FeatureImportance> {
        let values = match self {
            ImportanceKind::TreeBased => model.feature_importances()?,
            ImportanceKind::LinearCoefficient => model.coefficients()?,
            ImportanceKind::NotAvailable => return None,
        };
        let names = model.feature_names()?;
        if names.len() != values.len() {
            return None;
        }

        Some(FeatureImportance {
            kind: *self,
            features: names.iter().cloned().zip(values.iter().copied()).collect(),
        })
    }
}

/// Importance values aligned to feature columns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportance {
    pub kind: ImportanceKind,
    pub features: Vec<(String, f64)>,
}

impl FeatureImportance {
    /// The `n` features with the largest absolute value, largest first
    pub fn top(&self, n: usize) -> Vec<(String, f64)> {
        let mut ranked = self.features.clone();
        ranked.sort_by(|a, b| {
            b.1.abs()
                .partial_cmp(&a.1.abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        ranked.truncate(n);
        ranked
    }
}
