//! Preprocessing for the cardio risk pipeline.
//!
//! Deduplication and IQR outlier filtering, derived risk features,
//! label-stratified seeded splitting, and train-fitted standardization.

mod clean;
mod config;
mod error;
mod features;
mod pipeline;
mod scale;
mod schema;
mod split;
mod table;

pub use clean::{CleanReport, Cleaner, OutlierBounds, quantile};
pub use config::PreprocessConfig;
pub use error::PrepError;
pub use features::{DERIVED_COLUMNS, FeatureEngineer, age_group};
pub use pipeline::PreprocessResult;
pub use scale::ScalingModel;
pub use schema::{FieldKind, FieldSpec, Schema};
pub use split::{Split, Splitter};
pub use table::Table;
