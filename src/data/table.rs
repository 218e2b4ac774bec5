//! Named numeric feature tables

use crate::error::{ModelBenchError, Result};
use ndarray::{Array1, Array2, Axis};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Ordered, named numeric columns over row-major values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureTable {
    columns: Vec<String>,
    values: Array2<f64>,
}

impl FeatureTable {
    /// Create a table from explicit column names and values
    pub fn new(columns: Vec<String>, values: Array2<f64>) -> Result<Self> {
        if columns.len() != values.ncols() {
            return Err(ModelBenchError::dimension_mismatch(
                format!("{} column names", values.ncols()),
                format!("{} column names", columns.len()),
            ));
        }

        let mut seen = HashSet::with_capacity(columns.len());
        for name in &columns {
            if !seen.insert(name.as_str()) {
                return Err(ModelBenchError::ValidationError(format!(
                    "duplicate column name '{}'",
                    name
                )));
            }
        }

        Ok(Self { columns, values })
    }

    /// Wrap a raw matrix, naming columns `feature_0..feature_{k-1}`
    pub fn from_array(values: Array2<f64>) -> Self {
        let columns = Self::synthesized_names(values.ncols());
        Self { columns, values }
    }

    /// Column names used for unlabeled matrices
    pub fn synthesized_names(n_features: usize) -> Vec<String> {
        (0..n_features).map(|i| format!("feature_{}", i)).collect()
    }

    /// Extract the given columns from a DataFrame, casting each to Float64.
    ///
    /// Nulls are rejected: imputation belongs upstream of the harness.
    pub fn from_dataframe(df: &DataFrame, columns: &[&str]) -> Result<Self> {
        let n_rows = df.height();

        let col_data: Vec<Vec<f64>> = columns
            .iter()
            .map(|name| column_as_f64(df, name))
            .collect::<Result<Vec<_>>>()?;

        let values = Array2::from_shape_fn((n_rows, columns.len()), |(r, c)| col_data[c][r]);
        Self::new(columns.iter().map(|c| c.to_string()).collect(), values)
    }

    /// Split a DataFrame into a feature table (every column but `target`) and the target vector
    pub fn features_and_target(df: &DataFrame, target: &str) -> Result<(Self, Array1<f64>)> {
        let names: Vec<String> = df
            .get_column_names()
            .into_iter()
            .filter(|name| name.as_str() != target)
            .map(|name| name.to_string())
            .collect();
        let refs: Vec<&str> = names.iter().map(|s| s.as_str()).collect();

        let table = Self::from_dataframe(df, &refs)?;
        let y = Array1::from_vec(column_as_f64(df, target)?);
        Ok((table, y))
    }

    /// Column names in order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Row-major values
    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// Take the values, dropping the names
    pub fn into_values(self) -> Array2<f64> {
        self.values
    }

    /// Number of rows
    pub fn nrows(&self) -> usize {
        self.values.nrows()
    }

    /// Number of columns
    pub fn ncols(&self) -> usize {
        self.values.ncols()
    }

    /// Rows at `indices`, in that order
    pub fn select_rows(&self, indices: &[usize]) -> Self {
        Self {
            columns: self.columns.clone(),
            values: self.values.select(Axis(0), indices),
        }
    }

    /// Same schema, new values
    pub fn with_values(&self, values: Array2<f64>) -> Result<Self> {
        Self::new(self.columns.clone(), values)
    }

    /// Fail unless `other` has exactly this table's ordered column list
    pub fn ensure_same_schema(&self, other: &FeatureTable) -> Result<()> {
        if self.columns != other.columns {
            return Err(ModelBenchError::dimension_mismatch(
                format!("columns {:?}", self.columns),
                format!("columns {:?}", other.columns),
            ));
        }
        Ok(())
    }

    /// Convert back into a polars DataFrame
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let columns: Vec<Column> = self
            .columns
            .iter()
            .enumerate()
            .map(|(j, name)| {
                Series::new(name.as_str().into(), self.values.column(j).to_vec()).into()
            })
            .collect();
        Ok(DataFrame::new(columns)?)
    }
}

impl From<Array2<f64>> for FeatureTable {
    fn from(values: Array2<f64>) -> Self {
        Self::from_array(values)
    }
}

fn column_as_f64(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
    let column = df
        .column(name)
        .map_err(|_| ModelBenchError::DataError(format!("column '{}' not found", name)))?;
    let cast = column.cast(&DataType::Float64)?;
    let ca = cast.f64()?;

    if ca.null_count() > 0 {
        return Err(ModelBenchError::DataError(format!(
            "column '{}' contains {} null values",
            name,
            ca.null_count()
        )));
    }

    Ok(ca.into_no_null_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_from_array_synthesizes_names() {
        let table = FeatureTable::from_array(array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]);
        assert_eq!(table.columns(), &["feature_0", "feature_1", "feature_2"]);
        assert_eq!(table.nrows(), 2);
    }

    #[test]
    fn test_new_rejects_bad_column_count() {
        let err = FeatureTable::new(vec!["a".into()], array![[1.0, 2.0]]).unwrap_err();
        assert!(matches!(err, ModelBenchError::DimensionMismatch { .. }));
    }

    #[test]
    fn test_new_rejects_duplicate_names() {
        let err = FeatureTable::new(vec!["a".into(), "a".into()], array![[1.0, 2.0]]).unwrap_err();
        assert!(matches!(err, ModelBenchError::ValidationError(_)));
    }

    #[test]
    fn test_from_dataframe_casts_integers() {
        let df = df!(
            "area" => &[1200i64, 1500, 900],
            "bedrooms" => &[3.0, 4.0, 2.0],
            "price" => &[250.0, 310.0, 180.0]
        )
        .unwrap();

        let (table, y) = FeatureTable::features_and_target(&df, "price").unwrap();
        assert_eq!(table.columns(), &["area", "bedrooms"]);
        assert_eq!(table.values()[[1, 0]], 1500.0);
        assert_eq!(y.to_vec(), vec![250.0, 310.0, 180.0]);
    }

    #[test]
    fn test_missing_column_is_data_error() {
        let df = df!("a" => &[1.0, 2.0]).unwrap();
        let err = FeatureTable::from_dataframe(&df, &["b"]).unwrap_err();
        assert!(matches!(err, ModelBenchError::DataError(_)));
    }

    #[test]
    fn test_select_rows_and_schema() {
        let table = FeatureTable::from_array(array![[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]]);
        let subset = table.select_rows(&[2, 0]);
        assert_eq!(subset.values(), &array![[5.0, 6.0], [1.0, 2.0]]);
        assert!(table.ensure_same_schema(&subset).is_ok());

        let other = FeatureTable::new(vec!["x".into(), "y".into()], array![[0.0, 0.0]]).unwrap();
        assert!(table.ensure_same_schema(&other).is_err());
    }

    #[test]
    fn test_dataframe_round_trip_names() {
        let table = FeatureTable::new(vec!["x".into(), "y".into()], array![[1.0, 2.0]]).unwrap();
        let df = table.to_dataframe().unwrap();
        assert_eq!(df.width(), 2);
        assert_eq!(df.height(), 1);
    }
}
