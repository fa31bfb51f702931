//! Error type for cardio-rf.

use std::path::PathBuf;

/// Errors from forest configuration, training, evaluation and persistence.
#[derive(Debug, thiserror::Error)]
pub enum RfError {
    // --- configuration ---
    /// The forest was asked for zero trees.
    #[error("a forest needs at least one tree, n_estimators = {n_estimators}")]
    InvalidTreeCount {
        /// Requested tree count.
        n_estimators: usize,
    },

    /// A depth cap of zero would leave only the root.
    #[error("max_depth = {max_depth} is not allowed; use at least 1 or no cap")]
    InvalidMaxDepth {
        /// Requested depth cap.
        max_depth: usize,
    },

    /// A node needs at least two rows to be split.
    #[error("min_samples_split = {min_samples_split} is below the minimum of 2")]
    InvalidMinSamplesSplit {
        /// Requested minimum.
        min_samples_split: usize,
    },

    /// Every leaf must hold at least one row.
    #[error("min_samples_leaf = {min_samples_leaf} is below the minimum of 1")]
    InvalidMinSamplesLeaf {
        /// Requested minimum.
        min_samples_leaf: usize,
    },

    /// The per-split feature count is outside `1..=n_features`.
    #[error("{max_features} features per split is outside 1..={n_features}")]
    InvalidMaxFeatures {
        /// Resolved per-split feature count.
        max_features: usize,
        /// Columns available.
        n_features: usize,
    },

    // --- input data ---
    /// No rows were supplied.
    #[error("no samples to train or score on")]
    EmptyDataset,

    /// Rows were supplied without any columns.
    #[error("samples have no feature columns")]
    ZeroFeatures,

    /// Row and label counts differ.
    #[error("got {features} feature rows and {labels} labels")]
    LabelCountMismatch {
        /// Feature rows supplied.
        features: usize,
        /// Labels supplied.
        labels: usize,
    },

    /// A training row is wider or narrower than the first row.
    #[error("row {sample_index} has {got} columns while row 0 has {expected}")]
    FeatureCountMismatch {
        /// Width of row 0.
        expected: usize,
        /// Width of the offending row.
        got: usize,
        /// Offending row.
        sample_index: usize,
    },

    /// Feature names do not line up with the columns.
    #[error("{got} feature names for {expected} feature columns")]
    FeatureNameCount {
        /// Number of feature columns.
        expected: usize,
        /// Number of names supplied.
        got: usize,
    },

    /// A row scored by a fitted model has the wrong width.
    #[error("model expects {expected} columns, sample has {got}")]
    PredictionFeatureMismatch {
        /// Width the model was trained on.
        expected: usize,
        /// Width of the sample.
        got: usize,
    },

    /// NaN or infinity in the training matrix.
    #[error("row {sample_index}, column {feature_index} is not a finite number")]
    NonFiniteValue {
        /// Offending row.
        sample_index: usize,
        /// Offending column.
        feature_index: usize,
    },

    /// A label (or hard prediction) outside {0, 1}.
    #[error("row {sample_index} has label {label}, expected 0 or 1")]
    InvalidLabel {
        /// Offending row.
        sample_index: usize,
        /// The label found.
        label: usize,
    },

    /// Training labels are all one class.
    #[error("training labels contain only class {class}; need both 0 and 1")]
    SingleClass {
        /// The only class present.
        class: usize,
    },

    /// Test labels are all one class, so the ROC curve has no second axis.
    #[error("ROC AUC is undefined: evaluation labels contain only class {class}")]
    UndefinedRocAuc {
        /// The only class present.
        class: usize,
    },

    // --- persistence ---
    /// bincode could not encode the envelope.
    #[error("cannot encode model")]
    SerializeModel {
        /// bincode failure.
        source: Box<bincode::ErrorKind>,
    },

    /// The model file is not a valid envelope.
    #[error("{path} is not a readable model file")]
    DeserializeModel {
        /// Model file.
        path: PathBuf,
        /// bincode failure.
        source: Box<bincode::ErrorKind>,
    },

    /// The model file could not be written.
    #[error("cannot write model file {path}")]
    WriteModel {
        /// Destination.
        path: PathBuf,
        /// I/O failure.
        source: std::io::Error,
    },

    /// The model file could not be read.
    #[error("cannot open model file {path}")]
    ReadModel {
        /// Source file.
        path: PathBuf,
        /// I/O failure.
        source: std::io::Error,
    },

    /// The envelope was written by another format version.
    #[error("{path} has model format v{found}; this build reads v{expected}")]
    IncompatibleModelVersion {
        /// Version this build writes and reads.
        expected: u32,
        /// Version stored in the file.
        found: u32,
        /// Model file.
        path: PathBuf,
    },
}
