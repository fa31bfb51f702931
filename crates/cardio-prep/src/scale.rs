//! Train-fitted standardization.

use tracing::{debug, instrument, warn};

use crate::error::PrepError;
use crate::table::Table;

/// Per-column mean and population standard deviation fitted on a train table.
///
/// Immutable once fitted. A column with zero spread keeps `std == 0.0` but
/// is divided by 1.0 instead, so it maps to `v - mean` (all zeros on train).
#[derive(Debug, Clone, PartialEq)]
pub struct ScalingModel {
    columns: Vec<String>,
    means: Vec<f64>,
    stds: Vec<f64>,
}

impl ScalingModel {
    /// Fit column statistics on `train`.
    ///
    /// Uses population standard deviation (divides by n, not n-1).
    ///
    /// # Errors
    ///
    /// Returns [`PrepError::EmptyTable`] if `train` has no rows.
    #[instrument(skip_all, fields(n_rows = train.n_rows(), n_columns = train.n_columns()))]
    pub fn fit(train: &Table) -> Result<Self, PrepError> {
        if train.is_empty() {
            return Err(PrepError::EmptyTable { stage: "scale" });
        }
        let n = train.n_rows() as f64;
        let mut means = Vec::with_capacity(train.n_columns());
        let mut stds = Vec::with_capacity(train.n_columns());

        for (col, name) in train.columns().iter().enumerate() {
            let values = train.column_values(col);
            let first = values[0];
            if values.iter().all(|&v| v == first) {
                warn!(column = %name, value = first, "constant column, scaling to zero");
                means.push(first);
                stds.push(0.0);
                continue;
            }
            let mean = values.iter().sum::<f64>() / n;
            let variance = values.iter().map(|&v| (v - mean).powi(2)).sum::<f64>() / n;
            means.push(mean);
            stds.push(variance.sqrt());
        }

        debug!(n_columns = means.len(), "scaling model fitted");
        Ok(Self {
            columns: train.columns().to_vec(),
            means,
            stds,
        })
    }

    /// Return a standardized copy of `table`.
    ///
    /// # Errors
    ///
    /// Returns [`PrepError::ColumnMismatch`] if `table` has different columns
    /// than the table the model was fitted on.
    pub fn transform(&self, table: &Table) -> Result<Table, PrepError> {
        if table.columns() != self.columns.as_slice() {
            return Err(PrepError::ColumnMismatch {
                expected: self.columns.clone(),
                got: table.columns().to_vec(),
            });
        }
        let rows = table
            .rows()
            .iter()
            .map(|row| {
                row.iter()
                    .enumerate()
                    .map(|(col, &v)| (v - self.means[col]) / self.scale(col))
                    .collect()
            })
            .collect();
        Ok(table.with_rows(rows))
    }

    /// Divisor used for column `col`: its std, or 1.0 for a constant column.
    #[must_use]
    pub fn scale(&self, col: usize) -> f64 {
        let std = self.stds[col];
        if std == 0.0 { 1.0 } else { std }
    }

    /// Return the fitted column names.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Return the per-column means.
    #[must_use]
    pub fn means(&self) -> &[f64] {
        &self.means
    }

    /// Return the per-column population standard deviations.
    #[must_use]
    pub fn stds(&self) -> &[f64] {
        &self.stds
    }
}
