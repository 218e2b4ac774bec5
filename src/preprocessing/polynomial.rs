//! Polynomial feature expansion

use super::Transformer;
use crate::data::FeatureTable;
use crate::error::{ModelBenchError, Result};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Configuration for polynomial features
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolynomialConfig {
    /// Maximum polynomial degree
    pub degree: usize,
    /// Include a constant `1` column
    pub include_bias: bool,
    /// Only products of distinct features (no `a^2`)
    pub interaction_only: bool,
}

impl Default for PolynomialConfig {
    fn default() -> Self {
        Self {
            degree: 2,
            include_bias: false,
            interaction_only: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct FittedExpansion {
    input_columns: Vec<String>,
    /// Each output column is the product of the input columns listed
    combinations: Vec<Vec<usize>>,
    output_columns: Vec<String>,
}

/// Polynomial feature generator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolynomialFeatures {
    config: PolynomialConfig,
    fitted: Option<FittedExpansion>,
}

impl PolynomialFeatures {
    /// All terms up to `degree`, no bias column
    pub fn new(degree: usize) -> Self {
        Self::with_config(PolynomialConfig {
            degree: degree.max(1),
            ..Default::default()
        })
    }

    /// Expansion from an explicit config
    pub fn with_config(config: PolynomialConfig) -> Self {
        Self {
            config,
            fitted: None,
        }
    }

    /// Prepend a constant column
    pub fn with_bias(mut self, include: bool) -> Self {
        self.config.include_bias = include;
        self
    }

    /// Drop pure powers such as `x^2`
    pub fn interaction_only(mut self, only: bool) -> Self {
        self.config.interaction_only = only;
        self
    }

    /// Output column names, once fitted
    pub fn output_columns(&self) -> Option<&[String]> {
        self.fitted.as_ref().map(|f| f.output_columns.as_slice())
    }

    fn combinations(&self, n_features: usize) -> Vec<Vec<usize>> {
        let mut out = Vec::new();
        if self.config.include_bias {
            out.push(Vec::new());
        }
        for degree in 1..=self.config.degree {
            self.combinations_of_degree(n_features, degree, 0, &mut Vec::new(), &mut out);
        }
        out
    }

    fn combinations_of_degree(
        &self,
        n_features: usize,
        remaining: usize,
        start: usize,
        current: &mut Vec<usize>,
        out: &mut Vec<Vec<usize>>,
    ) {
        if remaining == 0 {
            out.push(current.clone());
            return;
        }
        for i in start..n_features {
            current.push(i);
            let next = if self.config.interaction_only { i + 1 } else { i };
            self.combinations_of_degree(n_features, remaining - 1, next, current, out);
            current.pop();
        }
    }

    /// `a`, `a^2`, `a b`, `a^2 b`, ...
    fn name_of(combination: &[usize], columns: &[String]) -> String {
        if combination.is_empty() {
            return "1".to_string();
        }
        let mut parts: Vec<String> = Vec::new();
        let mut i = 0;
        while i < combination.len() {
            let idx = combination[i];
            let power = combination[i..].iter().take_while(|&&c| c == idx).count();
            parts.push(if power == 1 {
                columns[idx].clone()
            } else {
                format!("{}^{}", columns[idx], power)
            });
            i += power;
        }
        parts.join(" ")
    }
}

impl Default for PolynomialFeatures {
    fn default() -> Self {
        Self::new(2)
    }
}

impl Transformer for PolynomialFeatures {
    fn fit(&mut self, x: &FeatureTable) -> Result<()> {
        let combinations = self.combinations(x.ncols());
        let output_columns = combinations
            .iter()
            .map(|c| Self::name_of(c, x.columns()))
            .collect();

        self.fitted = Some(FittedExpansion {
            input_columns: x.columns().to_vec(),
            combinations,
            output_columns,
        });
        Ok(())
    }

    fn transform(&self, x: &FeatureTable) -> Result<FeatureTable> {
        let fitted = self.fitted.as_ref().ok_or(ModelBenchError::ModelNotFitted)?;
        if fitted.input_columns != x.columns() {
            return Err(ModelBenchError::dimension_mismatch(
                format!("columns {:?}", fitted.input_columns),
                format!("columns {:?}", x.columns()),
            ));
        }

        let values = x.values();
        let out = Array2::from_shape_fn((x.nrows(), fitted.combinations.len()), |(r, c)| {
            fitted.combinations[c]
                .iter()
                .map(|&j| values[[r, j]])
                .product()
        });

        FeatureTable::new(fitted.output_columns.clone(), out)
    }

    fn fresh(&self) -> Box<dyn Transformer> {
        Box::new(Self::with_config(self.config.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn table() -> FeatureTable {
        FeatureTable::new(vec!["a".into(), "b".into()], array![[2.0, 3.0], [1.0, 4.0]]).unwrap()
    }

    #[test]
    fn test_degree_two_expansion() {
        let mut poly = PolynomialFeatures::new(2);
        let out = poly.fit_transform(&table()).unwrap();

        assert_eq!(out.columns(), &["a", "b", "a^2", "a b", "b^2"]);
        assert_eq!(out.values().row(0).to_vec(), vec![2.0, 3.0, 4.0, 6.0, 9.0]);
    }

    #[test]
    fn test_interaction_only_with_bias() {
        let mut poly = PolynomialFeatures::new(2).interaction_only(true).with_bias(true);
        let out = poly.fit_transform(&table()).unwrap();

        assert_eq!(out.columns(), &["1", "a", "b", "a b"]);
        assert_eq!(out.values().row(1).to_vec(), vec![1.0, 1.0, 4.0, 4.0]);
    }

    #[test]
    fn test_cubic_names() {
        let mut poly = PolynomialFeatures::new(3);
        poly.fit(&table()).unwrap();
        let names = poly.output_columns().unwrap();
        assert!(names.contains(&"a^2 b".to_string()));
        assert!(names.contains(&"b^3".to_string()));
        assert_eq!(names.len(), 9);
    }
}
