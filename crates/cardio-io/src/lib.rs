//! File I/O, validation, and serialization for the cardio pipeline.

mod error;
mod params;
mod processed;
mod reader;
mod writer;

pub use error::IoError;
pub use params::{Params, PreprocessParams, TrainParams};
pub use processed::{ProcessedData, ProcessedReader, X_TEST, X_TRAIN, Y_TEST, Y_TRAIN};
pub use reader::RawTableReader;
pub use writer::{ArtifactWriter, IMPORTANCES_FILE, METRICS_FILE, MODEL_FILE, ProcessedWriter};
