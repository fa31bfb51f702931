//! Row-major numeric table with named columns and binary labels.

use crate::error::PrepError;

/// An ordered set of records sharing one column layout.
///
/// Rows, labels and row ids are parallel vectors: `rows[i]` is labelled
/// `labels[i]` and came from data row `row_ids[i]` of the raw file.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<f64>>,
    labels: Vec<usize>,
    row_ids: Vec<usize>,
}

impl Table {
    /// Create a table; row ids default to `0..rows.len()`.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`PrepError::LengthMismatch`] | `rows` and `labels` differ in length |
    /// | [`PrepError::RaggedRow`] | a row's length differs from `columns.len()` |
    pub fn new(
        columns: Vec<String>,
        rows: Vec<Vec<f64>>,
        labels: Vec<usize>,
    ) -> Result<Self, PrepError> {
        let row_ids = (0..rows.len()).collect();
        Self::with_row_ids(columns, rows, labels, row_ids)
    }

    /// Create a table with explicit row ids.
    ///
    /// # Errors
    ///
    /// Same as [`Table::new`], plus [`PrepError::LengthMismatch`] when
    /// `row_ids` has a different length.
    pub fn with_row_ids(
        columns: Vec<String>,
        rows: Vec<Vec<f64>>,
        labels: Vec<usize>,
        row_ids: Vec<usize>,
    ) -> Result<Self, PrepError> {
        if rows.len() != labels.len() || rows.len() != row_ids.len() {
            return Err(PrepError::LengthMismatch {
                rows: rows.len(),
                labels: labels.len(),
                row_ids: row_ids.len(),
            });
        }
        for (row_index, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(PrepError::RaggedRow {
                    row_index,
                    expected: columns.len(),
                    got: row.len(),
                });
            }
        }
        Ok(Self {
            columns,
            rows,
            labels,
            row_ids,
        })
    }

    /// Return the column names.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Return the feature rows.
    #[must_use]
    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    /// Return the labels.
    #[must_use]
    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    /// Return the raw-file row ids.
    #[must_use]
    pub fn row_ids(&self) -> &[usize] {
        &self.row_ids
    }

    /// Return the number of rows.
    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    /// Return the number of columns.
    #[must_use]
    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    /// Return `true` if the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Look up a column position by name.
    ///
    /// # Errors
    ///
    /// Returns [`PrepError::MissingColumn`] tagged with `stage`.
    pub fn column_index(&self, stage: &'static str, name: &str) -> Result<usize, PrepError> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| PrepError::MissingColumn {
                stage,
                column: name.to_string(),
            })
    }

    /// Copy out one column by position.
    #[must_use]
    pub fn column_values(&self, index: usize) -> Vec<f64> {
        self.rows.iter().map(|row| row[index]).collect()
    }

    /// Append a column to every row.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`PrepError::DuplicateColumn`] | `name` already exists |
    /// | [`PrepError::ColumnLength`] | `values.len() != n_rows()` |
    pub fn push_column(&mut self, name: &str, values: Vec<f64>) -> Result<(), PrepError> {
        if self.columns.iter().any(|c| c == name) {
            return Err(PrepError::DuplicateColumn {
                column: name.to_string(),
            });
        }
        if values.len() != self.rows.len() {
            return Err(PrepError::ColumnLength {
                column: name.to_string(),
                expected: self.rows.len(),
                got: values.len(),
            });
        }
        self.columns.push(name.to_string());
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.push(value);
        }
        Ok(())
    }

    /// Keep only rows whose flag is `true`, preserving order.
    ///
    /// `keep` must have one flag per row.
    pub(crate) fn retain_rows(&mut self, keep: &[bool]) {
        debug_assert_eq!(keep.len(), self.rows.len());
        let mut flags = keep.iter();
        self.rows.retain(|_| *flags.next().unwrap_or(&false));
        let mut flags = keep.iter();
        self.labels.retain(|_| *flags.next().unwrap_or(&false));
        let mut flags = keep.iter();
        self.row_ids.retain(|_| *flags.next().unwrap_or(&false));
    }

    /// Build a new table from the rows at `indices`, in that order.
    pub(crate) fn select(&self, indices: &[usize]) -> Self {
        Self {
            columns: self.columns.clone(),
            rows: indices.iter().map(|&i| self.rows[i].clone()).collect(),
            labels: indices.iter().map(|&i| self.labels[i]).collect(),
            row_ids: indices.iter().map(|&i| self.row_ids[i]).collect(),
        }
    }

    /// Replace the feature rows, keeping columns, labels and ids.
    pub(crate) fn with_rows(&self, rows: Vec<Vec<f64>>) -> Self {
        Self {
            columns: self.columns.clone(),
            rows,
            labels: self.labels.clone(),
            row_ids: self.row_ids.clone(),
        }
    }
}
