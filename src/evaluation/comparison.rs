//! Side-by-side comparison of evaluated models

use super::result::{FailedModel, ModelResult};
use crate::error::Result;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// One model's line in the comparison report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRow {
    #[serde(rename = "Model")]
    pub model: String,
    #[serde(rename = "RMSE")]
    pub rmse: f64,
    #[serde(rename = "MAE")]
    pub mae: f64,
    #[serde(rename = "R2 Score")]
    pub r2: f64,
    #[serde(rename = "CV R2 Score")]
    pub cv_r2: f64,
}

impl From<&ModelResult> for ComparisonRow {
    fn from(result: &ModelResult) -> Self {
        Self {
            model: result.name().to_string(),
            rmse: result.rmse(),
            mae: result.mae(),
            r2: result.r2(),
            cv_r2: result.cv_r2_mean(),
        }
    }
}

/// Report columns a table can be sorted by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetricColumn {
    /// Model name, compared lexicographically
    Model,
    Rmse,
    Mae,
    R2,
    CvR2,
}

impl MetricColumn {
    /// Every report column in display order
    pub const ALL: [MetricColumn; 5] = [
        MetricColumn::Model,
        MetricColumn::Rmse,
        MetricColumn::Mae,
        MetricColumn::R2,
        MetricColumn::CvR2,
    ];

    /// The score columns, everything but `Model`
    pub const NUMERIC: [MetricColumn; 4] = [
        MetricColumn::Rmse,
        MetricColumn::Mae,
        MetricColumn::R2,
        MetricColumn::CvR2,
    ];

    /// Header used in the report, the DataFrame and JSON
    pub fn column_name(&self) -> &'static str {
        match self {
            MetricColumn::Model => "Model",
            MetricColumn::Rmse => "RMSE",
            MetricColumn::Mae => "MAE",
            MetricColumn::R2 => "R2 Score",
            MetricColumn::CvR2 => "CV R2 Score",
        }
    }

    /// Score held by `row` in this column; `None` for `Model`
    pub fn value(&self, row: &ComparisonRow) -> Option<f64> {
        match self {
            MetricColumn::Model => None,
            MetricColumn::Rmse => Some(row.rmse),
            MetricColumn::Mae => Some(row.mae),
            MetricColumn::R2 => Some(row.r2),
            MetricColumn::CvR2 => Some(row.cv_r2),
        }
    }

    fn order(&self, a: &ComparisonRow, b: &ComparisonRow, descending: bool) -> Ordering {
        match (self.value(a), self.value(b)) {
            (Some(x), Some(y)) => compare(x, y, descending),
            _ if descending => b.model.cmp(&a.model),
            _ => a.model.cmp(&b.model),
        }
    }
}

/// NaN always last; otherwise `descending` decides
fn compare(a: f64, b: f64, descending: bool) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) if descending => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

/// Rows in input order until sorted; sorting returns a new table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComparisonTable {
    rows: Vec<ComparisonRow>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    failures: Vec<FailedModel>,
}

impl ComparisonTable {
    /// Table over `rows` with no recorded failures
    pub fn new(rows: Vec<ComparisonRow>) -> Self {
        Self {
            rows,
            failures: Vec::new(),
        }
    }

    /// One row per result, in the given order
    pub fn from_results(results: &[ModelResult]) -> Self {
        Self::new(results.iter().map(ComparisonRow::from).collect())
    }

    /// Attach models that were skipped during evaluation
    pub fn with_failures(mut self, failures: Vec<FailedModel>) -> Self {
        self.failures = failures;
        self
    }

    /// Rows in current order
    pub fn rows(&self) -> &[ComparisonRow] {
        &self.rows
    }

    /// Models that produced no row
    pub fn failures(&self) -> &[FailedModel] {
        &self.failures
    }

    /// Number of rows, failures excluded
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when no model produced a row
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Model names in current row order
    pub fn model_names(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.model.as_str()).collect()
    }

    /// Descending by `column`; ties keep input order
    pub fn sort_by(&self, column: MetricColumn) -> Self {
        self.sorted(column, true)
    }

    /// Ascending by `column`, for error metrics where lower is better
    pub fn sort_ascending_by(&self, column: MetricColumn) -> Self {
        self.sorted(column, false)
    }

    /// Descending by test R²
    pub fn sorted_by_r2(&self) -> Self {
        self.sort_by(MetricColumn::R2)
    }

    /// Highest test R²; the earliest row wins a tie
    pub fn best(&self) -> Option<&ComparisonRow> {
        self.rows.iter().reduce(|best, row| {
            if compare(row.r2, best.r2, true) == Ordering::Less {
                row
            } else {
                best
            }
        })
    }

    fn sorted(&self, column: MetricColumn, descending: bool) -> Self {
        let mut rows = self.rows.clone();
        rows.sort_by(|a, b| column.order(a, b, descending));
        Self {
            rows,
            failures: self.failures.clone(),
        }
    }

    /// `Model`, `RMSE`, `MAE`, `R2 Score`, `CV R2 Score`
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let mut columns: Vec<Column> = vec![Series::new(
            "Model".into(),
            self.rows.iter().map(|r| r.model.clone()).collect::<Vec<_>>(),
        )
        .into()];
        for metric in MetricColumn::NUMERIC {
            let values: Vec<f64> = self
                .rows
                .iter()
                .map(|r| metric.value(r).unwrap_or(f64::NAN))
                .collect();
            columns.push(Series::new(metric.column_name().into(), values).into());
        }
        Ok(DataFrame::new(columns)?)
    }

    /// Pretty-printed JSON using the report column names
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl fmt::Display for ComparisonTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:<25} {:>12} {:>12} {:>12} {:>12}",
            "Model", "RMSE", "MAE", "R2 Score", "CV R2 Score"
        )?;
        writeln!(f, "{}", "-".repeat(77))?;
        for row in &self.rows {
            writeln!(
                f,
                "{:<25} {:>12.4} {:>12.4} {:>12.4} {:>12.4}",
                row.model, row.rmse, row.mae, row.r2, row.cv_r2
            )?;
        }
        for failure in &self.failures {
            writeln!(f, "{:<25} failed: {}", failure.name, failure.reason)?;
        }
        Ok(())
    }
}
