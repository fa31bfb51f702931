//! Error types for cardio-prep.

/// Errors from cleaning, feature engineering, splitting and scaling.
#[derive(Debug, thiserror::Error)]
pub enum PrepError {
    /// Returned when a stage needs a column the table does not have.
    #[error("{stage}: column \"{column}\" not found in table")]
    MissingColumn {
        /// Pipeline stage that looked the column up.
        stage: &'static str,
        /// Name of the missing column.
        column: String,
    },

    /// Returned when adding a column whose name is already taken.
    #[error("column \"{column}\" already exists in table")]
    DuplicateColumn {
        /// Name of the column that already exists.
        column: String,
    },

    /// Returned when a row has a different number of values than the table has columns.
    #[error("row {row_index} has {got} values, expected {expected}")]
    RaggedRow {
        /// Zero-based row position.
        row_index: usize,
        /// Number of columns in the table.
        expected: usize,
        /// Number of values in the row.
        got: usize,
    },

    /// Returned when a table is built with mismatched row, label or id counts.
    #[error("table has {rows} rows but {labels} labels and {row_ids} row ids")]
    LengthMismatch {
        /// Number of feature rows.
        rows: usize,
        /// Number of labels.
        labels: usize,
        /// Number of row ids.
        row_ids: usize,
    },

    /// Returned when a new column does not have one value per row.
    #[error("column \"{column}\" has {got} values, table has {expected} rows")]
    ColumnLength {
        /// Name of the column being added.
        column: String,
        /// Number of rows in the table.
        expected: usize,
        /// Number of values supplied.
        got: usize,
    },

    /// Returned when an age falls outside the binned range `(0, 100]`.
    #[error("row id {row_id}: age {age} is outside the supported range (0, 100]")]
    AgeOutOfRange {
        /// Raw-file row id of the offending record.
        row_id: usize,
        /// The age value found.
        age: f64,
    },

    /// Returned when a stage leaves (or receives) a table with no rows.
    #[error("{stage}: table has no rows")]
    EmptyTable {
        /// Pipeline stage that found the table empty.
        stage: &'static str,
    },

    /// Returned when a label stratum is too small to appear in both split halves.
    #[error("label {label} has {count} rows, stratified split needs at least 2")]
    EmptyStratum {
        /// The label value of the stratum.
        label: usize,
        /// Number of rows carrying that label.
        count: usize,
    },

    /// Returned when the test fraction is not strictly between 0 and 1.
    #[error("test fraction must be in (0, 1), got {fraction}")]
    InvalidTestFraction {
        /// The invalid fraction provided.
        fraction: f64,
    },

    /// Returned when the IQR multiplier is negative or not finite.
    #[error("IQR multiplier must be finite and non-negative, got {multiplier}")]
    InvalidIqrMultiplier {
        /// The invalid multiplier provided.
        multiplier: f64,
    },

    /// Returned when a scaling model is applied to a table with other columns.
    #[error("scaling model was fitted on columns {expected:?}, table has {got:?}")]
    ColumnMismatch {
        /// Columns the model was fitted on.
        expected: Vec<String>,
        /// Columns of the table being transformed.
        got: Vec<String>,
    },
}
