//! Ordered collection of named models awaiting evaluation

use super::importance::ImportanceKind;
use super::Regressor;
use crate::error::{ModelBenchError, Result};

/// A model together with what was resolved about it at registration
#[derive(Debug)]
pub struct RegisteredModel {
    pub name: String,
    pub model: Box<dyn Regressor>,
    pub importance: ImportanceKind,
}

/// Models in registration order; names are unique
#[derive(Debug, Default)]
pub struct ModelRegistry {
    entries: Vec<RegisteredModel>,
}

impl ModelRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a model under `name`
    pub fn register(&mut self, name: impl Into<String>, model: Box<dyn Regressor>) -> Result<()> {
        let name = name.into();
        if self.contains(&name) {
            return Err(ModelBenchError::ConfigError(format!(
                "model '{}' is already registered",
                name
            )));
        }

        let importance = model.importance_kind();
        self.entries.push(RegisteredModel {
            name,
            model,
            importance,
        });
        Ok(())
    }

    /// Builder form of [`register`](Self::register)
    pub fn with(mut self, name: impl Into<String>, model: Box<dyn Regressor>) -> Result<Self> {
        self.register(name, model)?;
        Ok(self)
    }

    /// Whether `name` is registered
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.name == name)
    }

    /// Registered names in order
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }

    /// Number of registered models
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is registered
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in registration order
    pub fn iter(&self) -> impl Iterator<Item = &RegisteredModel> {
        self.entries.iter()
    }
}

impl IntoIterator for ModelRegistry {
    type Item = RegisteredModel;
    type IntoIter = std::vec::IntoIter<RegisteredModel>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::training::{DecisionTreeRegressor, LinearRegression};

    #[test]
    fn test_registration_order_and_kind() {
        let registry = ModelRegistry::new()
            .with("ols", Box::new(LinearRegression::new()))
            .unwrap()
            .with("tree", Box::new(DecisionTreeRegressor::new()))
            .unwrap();

        assert_eq!(registry.names(), vec!["ols", "tree"]);
        let kinds: Vec<ImportanceKind> = registry.iter().map(|e| e.importance).collect();
        assert_eq!(
            kinds,
            vec![ImportanceKind::LinearCoefficient, ImportanceKind::TreeBased]
        );
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut registry = ModelRegistry::new();
        registry.register("ols", Box::new(LinearRegression::new())).unwrap();
        let err = registry
            .register("ols", Box::new(LinearRegression::new()))
            .unwrap_err();
        assert!(matches!(err, ModelBenchError::ConfigError(_)));
        assert_eq!(registry.len(), 1);
    }
}
