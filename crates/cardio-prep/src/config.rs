//! Configuration builder for the preprocessing pipeline.

use crate::clean::default_outlier_columns;
use crate::error::PrepError;
use crate::pipeline::PreprocessResult;
use crate::table::Table;

/// Configuration for clean → engineer → split → scale.
///
/// Construct via [`PreprocessConfig::new`], then chain `with_*` methods.
/// Outlier removal and feature engineering are independent toggles;
/// duplicate removal, splitting and scaling always run.
///
/// # Defaults
///
/// | Parameter           | Default                                |
/// |---------------------|----------------------------------------|
/// | `seed`              | 42                                     |
/// | `remove_outliers`   | `true`                                 |
/// | `engineer_features` | `true`                                 |
/// | `outlier_columns`   | `age, trtbps, chol, thalachh, oldpeak` |
/// | `iqr_multiplier`    | 1.5                                    |
#[derive(Debug, Clone)]
pub struct PreprocessConfig {
    pub(crate) test_fraction: f64,
    pub(crate) seed: u64,
    pub(crate) remove_outliers: bool,
    pub(crate) engineer_features: bool,
    pub(crate) outlier_columns: Vec<String>,
    pub(crate) iqr_multiplier: f64,
}

impl PreprocessConfig {
    /// Create a config holding out `test_fraction` of the rows.
    ///
    /// # Errors
    ///
    /// Returns [`PrepError::InvalidTestFraction`] unless `0 < test_fraction < 1`.
    pub fn new(test_fraction: f64) -> Result<Self, PrepError> {
        if !(test_fraction > 0.0 && test_fraction < 1.0) {
            return Err(PrepError::InvalidTestFraction {
                fraction: test_fraction,
            });
        }
        Ok(Self {
            test_fraction,
            seed: 42,
            remove_outliers: true,
            engineer_features: true,
            outlier_columns: default_outlier_columns(),
            iqr_multiplier: 1.5,
        })
    }

    /// Set the split seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Enable or disable IQR outlier removal.
    #[must_use]
    pub fn with_outlier_removal(mut self, enabled: bool) -> Self {
        self.remove_outliers = enabled;
        self
    }

    /// Enable or disable the derived risk columns.
    #[must_use]
    pub fn with_feature_engineering(mut self, enabled: bool) -> Self {
        self.engineer_features = enabled;
        self
    }

    /// Set the columns screened for outliers.
    #[must_use]
    pub fn with_outlier_columns(mut self, columns: Vec<String>) -> Self {
        self.outlier_columns = columns;
        self
    }

    /// Set the outlier fence width in IQRs.
    #[must_use]
    pub fn with_iqr_multiplier(mut self, multiplier: f64) -> Self {
        self.iqr_multiplier = multiplier;
        self
    }

    /// Return the held-out fraction.
    #[must_use]
    pub fn test_fraction(&self) -> f64 {
        self.test_fraction
    }

    /// Return the split seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Return whether outlier removal runs.
    #[must_use]
    pub fn remove_outliers(&self) -> bool {
        self.remove_outliers
    }

    /// Return whether derived features are added.
    #[must_use]
    pub fn engineer_features(&self) -> bool {
        self.engineer_features
    }

    /// Run the pipeline on a raw table.
    ///
    /// # Errors
    ///
    /// Any [`PrepError`] from the cleaning, engineering, splitting or
    /// scaling stage.
    pub fn fit(&self, table: Table) -> Result<PreprocessResult, PrepError> {
        crate::pipeline::run(self, table)
    }
}
