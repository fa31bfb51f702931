//! Duplicate removal and IQR outlier filtering.

use std::collections::HashSet;

use tracing::{debug, info, instrument};

use crate::error::PrepError;
use crate::schema::Schema;
use crate::table::Table;

/// Columns screened for outliers by default: the continuous heart fields.
pub(crate) fn default_outlier_columns() -> Vec<String> {
    Schema::heart().continuous_fields()
}

/// Inclusive IQR fences computed for one column.
#[derive(Debug, Clone, PartialEq)]
pub struct OutlierBounds {
    /// Column the bounds apply to.
    pub column: String,
    /// First quartile.
    pub q1: f64,
    /// Third quartile.
    pub q3: f64,
    /// Lower fence `q1 - k * iqr`.
    pub lower: f64,
    /// Upper fence `q3 + k * iqr`.
    pub upper: f64,
    /// Rows whose value in this column fell outside the fences.
    pub n_outside: usize,
}

impl OutlierBounds {
    /// Return `true` if `value` lies within the fences.
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }
}

/// Summary of one [`Cleaner::clean`] pass.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanReport {
    /// Rows received.
    pub n_input: usize,
    /// Exact duplicates dropped.
    pub n_duplicates: usize,
    /// Per-column fences, in configured column order. Empty when outlier
    /// filtering is disabled.
    pub bounds: Vec<OutlierBounds>,
    /// Rows dropped because at least one column was outside its fences.
    pub n_outliers: usize,
    /// Rows remaining.
    pub n_output: usize,
}

/// Removes exact duplicates, then IQR outliers.
///
/// Construct via [`Cleaner::new`], then chain `with_*` methods.
///
/// # Defaults
///
/// | Parameter         | Default                                   |
/// |-------------------|-------------------------------------------|
/// | `outlier_columns` | `age, trtbps, chol, thalachh, oldpeak`    |
/// | `iqr_multiplier`  | 1.5                                       |
/// | `remove_outliers` | `true`                                    |
#[derive(Debug, Clone)]
pub struct Cleaner {
    outlier_columns: Vec<String>,
    iqr_multiplier: f64,
    remove_outliers: bool,
}

impl Cleaner {
    /// Create a cleaner with the default heart outlier columns.
    #[must_use]
    pub fn new() -> Self {
        Self {
            outlier_columns: default_outlier_columns(),
            iqr_multiplier: 1.5,
            remove_outliers: true,
        }
    }

    /// Set the columns screened for outliers.
    #[must_use]
    pub fn with_outlier_columns(mut self, columns: Vec<String>) -> Self {
        self.outlier_columns = columns;
        self
    }

    /// Set the fence width in IQRs.
    #[must_use]
    pub fn with_iqr_multiplier(mut self, multiplier: f64) -> Self {
        self.iqr_multiplier = multiplier;
        self
    }

    /// Enable or disable the outlier pass (duplicates are always removed).
    #[must_use]
    pub fn with_outlier_removal(mut self, enabled: bool) -> Self {
        self.remove_outliers = enabled;
        self
    }

    /// Return the columns screened for outliers.
    #[must_use]
    pub fn outlier_columns(&self) -> &[String] {
        &self.outlier_columns
    }

    /// Clean `table` in place.
    ///
    /// Duplicates go first; fences are then computed once on the
    /// deduplicated rows and every row outside any fence is dropped in a
    /// single pass.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`PrepError::EmptyTable`] | input is empty, or no row survives |
    /// | [`PrepError::MissingColumn`] | a configured outlier column is absent |
    /// | [`PrepError::InvalidIqrMultiplier`] | multiplier is negative or not finite |
    #[instrument(skip_all, fields(n_rows = table.n_rows()))]
    pub fn clean(&self, table: &mut Table) -> Result<CleanReport, PrepError> {
        if table.is_empty() {
            return Err(PrepError::EmptyTable { stage: "clean" });
        }
        if !self.iqr_multiplier.is_finite() || self.iqr_multiplier < 0.0 {
            return Err(PrepError::InvalidIqrMultiplier {
                multiplier: self.iqr_multiplier,
            });
        }

        // Resolve columns before touching any row.
        let column_indices = if self.remove_outliers {
            self.outlier_columns
                .iter()
                .map(|name| table.column_index("clean", name))
                .collect::<Result<Vec<_>, _>>()?
        } else {
            Vec::new()
        };

        let n_input = table.n_rows();
        let n_duplicates = drop_duplicates(table);
        info!(n_duplicates, "duplicate rows removed");

        let (bounds, n_outliers) = if self.remove_outliers {
            self.drop_outliers(table, &column_indices)
        } else {
            (Vec::new(), 0)
        };

        if table.is_empty() {
            return Err(PrepError::EmptyTable { stage: "clean" });
        }

        let report = CleanReport {
            n_input,
            n_duplicates,
            bounds,
            n_outliers,
            n_output: table.n_rows(),
        };
        info!(
            n_input,
            n_duplicates,
            n_outliers,
            n_output = report.n_output,
            "cleaning complete"
        );
        Ok(report)
    }

    fn drop_outliers(&self, table: &mut Table, column_indices: &[usize]) -> (Vec<OutlierBounds>, usize) {
        let mut bounds: Vec<OutlierBounds> = self
            .outlier_columns
            .iter()
            .zip(column_indices)
            .map(|(name, &col)| iqr_bounds(name, &table.column_values(col), self.iqr_multiplier))
            .collect();

        let mut keep = vec![true; table.n_rows()];
        for (fence, &col) in bounds.iter_mut().zip(column_indices) {
            for (row, flag) in table.rows().iter().zip(keep.iter_mut()) {
                if !fence.contains(row[col]) {
                    fence.n_outside += 1;
                    *flag = false;
                }
            }
            info!(
                column = %fence.column,
                lower = fence.lower,
                upper = fence.upper,
                removed = fence.n_outside,
                "outlier fence applied"
            );
        }

        let n_outliers = keep.iter().filter(|&&k| !k).count();
        table.retain_rows(&keep);
        (bounds, n_outliers)
    }
}

impl Default for Cleaner {
    fn default() -> Self {
        Self::new()
    }
}

/// Drop rows equal (all values and label) to an earlier row. Returns the count dropped.
pub(crate) fn drop_duplicates(table: &mut Table) -> usize {
    let mut seen: HashSet<(Vec<u64>, usize)> = HashSet::with_capacity(table.n_rows());
    let keep: Vec<bool> = table
        .rows()
        .iter()
        .zip(table.labels())
        .map(|(row, &label)| seen.insert((row_key(row), label)))
        .collect();
    let dropped = keep.iter().filter(|&&k| !k).count();
    if dropped > 0 {
        table.retain_rows(&keep);
    }
    debug!(dropped, "deduplicated");
    dropped
}

/// Bit pattern of each value; `-0.0` folds onto `0.0`.
fn row_key(row: &[f64]) -> Vec<u64> {
    row.iter().map(|&v| (v + 0.0).to_bits()).collect()
}

/// Compute inclusive IQR fences for one column.
fn iqr_bounds(column: &str, values: &[f64], multiplier: f64) -> OutlierBounds {
    let mut sorted = values.to_vec();
    sorted.sort_unstable_by(f64::total_cmp);
    let q1 = quantile(&sorted, 0.25);
    let q3 = quantile(&sorted, 0.75);
    let iqr = q3 - q1;
    OutlierBounds {
        column: column.to_string(),
        q1,
        q3,
        lower: q1 - multiplier * iqr,
        upper: q3 + multiplier * iqr,
        n_outside: 0,
    }
}

/// Linear-interpolation quantile of ascending-sorted data.
///
/// Position is `(n - 1) * q`; the result interpolates between the two
/// neighbouring order statistics. `sorted` must be non-empty.
#[must_use]
pub fn quantile(sorted: &[f64], q: f64) -> f64 {
    debug_assert!(!sorted.is_empty());
    let pos = (sorted.len() - 1) as f64 * q.clamp(0.0, 1.0);
    let lo = pos.floor() as usize;
    let hi = (lo + 1).min(sorted.len() - 1);
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}
