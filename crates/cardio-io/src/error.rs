//! I/O error types for cardio-io.

use std::path::PathBuf;

/// Errors from parameter loading, CSV reading, and artifact writing.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// Returned when the parameter file cannot be read.
    #[error("cannot read parameter file {path}")]
    ReadParams {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when the parameter file is not valid YAML for the expected shape.
    #[error("malformed parameter file {path}")]
    ParseParams {
        /// Path to the parameter file.
        path: PathBuf,
        /// Underlying YAML error, naming the missing or malformed key.
        source: serde_yaml::Error,
    },

    /// Returned when a parameter parses but has an unusable value.
    #[error("invalid parameter {key}: {reason}")]
    InvalidParam {
        /// Dotted key, e.g. `train.n_estimators`.
        key: &'static str,
        /// What is wrong with the value.
        reason: String,
    },

    /// Returned when an input file does not exist or is unreadable.
    #[error("file not found: {path}")]
    FileNotFound {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when the CSV parser encounters a malformed record.
    #[error("CSV parse error in {path} at byte offset {offset}")]
    CsvParse {
        /// Path to the CSV file.
        path: PathBuf,
        /// Byte offset where the error occurred.
        offset: u64,
        /// Underlying CSV error.
        source: csv::Error,
    },

    /// Returned when a CSV file contains a header but zero data rows.
    #[error("empty dataset (no data rows) in {path}")]
    EmptyDataset {
        /// Path to the CSV file.
        path: PathBuf,
    },

    /// Returned when a required column is absent from the header.
    #[error("missing column \"{column}\" in {path}")]
    MissingColumn {
        /// Path to the CSV file.
        path: PathBuf,
        /// Name of the absent column.
        column: String,
    },

    /// Returned when the header names a column outside the schema, or repeats one.
    #[error("unexpected column \"{column}\" in {path}")]
    UnexpectedColumn {
        /// Path to the CSV file.
        path: PathBuf,
        /// Name of the extra column.
        column: String,
    },

    /// Returned when two files that must share a header do not.
    #[error("header of {path} does not match {reference}")]
    HeaderMismatch {
        /// File with the differing header.
        path: PathBuf,
        /// File whose header was taken as reference.
        reference: PathBuf,
    },

    /// Returned when a data row has a different number of columns than the header.
    #[error("inconsistent row length in {path}: row {row_index} has {got} columns, expected {expected}")]
    InconsistentRowLength {
        /// Path to the CSV file.
        path: PathBuf,
        /// Zero-based row index (excluding header).
        row_index: usize,
        /// Expected number of columns (from header).
        expected: usize,
        /// Actual number of columns in this row.
        got: usize,
    },

    /// Returned when a cell is NaN, Inf, or otherwise not a finite float.
    #[error("non-finite value in {path}: row {row_index}, column \"{column}\", raw value \"{raw}\"")]
    NonFiniteValue {
        /// Path to the CSV file.
        path: PathBuf,
        /// Zero-based row index (excluding header).
        row_index: usize,
        /// Column name.
        column: String,
        /// The raw string value that failed to parse.
        raw: String,
    },

    /// Returned when a target cell is not 0 or 1.
    #[error("invalid label in {path}: row {row_index}, raw value \"{raw}\" (expected 0 or 1)")]
    InvalidLabel {
        /// Path to the CSV file.
        path: PathBuf,
        /// Zero-based row index (excluding header).
        row_index: usize,
        /// The raw string value.
        raw: String,
    },

    /// Returned when a feature file and its label file differ in row count.
    #[error("{features_path} has {features} rows but {labels_path} has {labels}")]
    RowCountMismatch {
        /// Feature matrix file.
        features_path: PathBuf,
        /// Row count of the feature file.
        features: usize,
        /// Label file.
        labels_path: PathBuf,
        /// Row count of the label file.
        labels: usize,
    },

    /// Returned when loaded rows cannot form a table.
    #[error("cannot build table from {path}")]
    Table {
        /// Source file.
        path: PathBuf,
        /// Underlying table error.
        source: cardio_prep::PrepError,
    },

    /// Returned when an output directory cannot be created.
    #[error("cannot create output directory {path}")]
    OutputDirCreate {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when a CSV output file cannot be written.
    #[error("cannot write CSV file {path}")]
    WriteCsv {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying CSV error.
        source: csv::Error,
    },

    /// Returned when a JSON artifact cannot be encoded.
    #[error("cannot encode JSON for {path}")]
    EncodeJson {
        /// Destination path.
        path: PathBuf,
        /// Underlying JSON error.
        source: serde_json::Error,
    },

    /// Returned when a file cannot be written.
    #[error("cannot write file {path}")]
    WriteFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when the model artifact cannot be saved.
    #[error("cannot save model to {path}")]
    SaveModel {
        /// Destination path.
        path: PathBuf,
        /// Underlying model error.
        source: cardio_rf::RfError,
    },
}
