//! Preprocessing stage orchestration.

use tracing::{info, instrument};

use crate::clean::{CleanReport, Cleaner};
use crate::config::PreprocessConfig;
use crate::error::PrepError;
use crate::features::FeatureEngineer;
use crate::scale::ScalingModel;
use crate::split::Splitter;
use crate::table::Table;

/// Output of the preprocessing pipeline.
///
/// `train` and `test` are already standardized with `scaling`, which was
/// fitted on the train half only.
#[derive(Debug, Clone)]
pub struct PreprocessResult {
    /// Scaled train half.
    pub train: Table,
    /// Scaled test half.
    pub test: Table,
    /// Statistics fitted on the unscaled train half.
    pub scaling: ScalingModel,
    /// Cleaning summary.
    pub clean_report: CleanReport,
}

impl PreprocessResult {
    /// Return the feature column names shared by both halves.
    #[must_use]
    pub fn feature_names(&self) -> &[String] {
        self.train.columns()
    }
}

/// Run clean → engineer → split → scale.
#[instrument(skip_all, fields(n_rows = table.n_rows()))]
pub(crate) fn run(config: &PreprocessConfig, mut table: Table) -> Result<PreprocessResult, PrepError> {
    let splitter = Splitter::new(config.test_fraction)?.with_seed(config.seed);

    let cleaner = Cleaner::new()
        .with_outlier_columns(config.outlier_columns.clone())
        .with_iqr_multiplier(config.iqr_multiplier)
        .with_outlier_removal(config.remove_outliers);
    let clean_report = cleaner.clean(&mut table)?;

    if config.engineer_features {
        FeatureEngineer::new().engineer(&mut table)?;
    }

    let split = splitter.split(table)?;
    let scaling = ScalingModel::fit(&split.train)?;
    let train = scaling.transform(&split.train)?;
    let test = scaling.transform(&split.test)?;

    info!(
        n_train = train.n_rows(),
        n_test = test.n_rows(),
        n_features = train.n_columns(),
        "preprocessing complete"
    );

    Ok(PreprocessResult {
        train,
        test,
        scaling,
        clean_report,
    })
}
