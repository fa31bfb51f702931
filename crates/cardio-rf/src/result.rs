//! Training result types.

use crate::forest::RandomForest;
use crate::importance::RankedFeature;

/// Summary of one training run.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct TrainingMetadata {
    /// Number of trees trained.
    pub n_estimators: usize,
    /// Number of feature columns.
    pub n_features: usize,
    /// Number of training rows.
    pub n_samples: usize,
    /// Number of rows labelled 1.
    pub n_positive: usize,
    /// Features considered per split.
    pub max_features_resolved: usize,
    /// Nodes summed over all trees.
    pub total_nodes: usize,
}

/// The fitted forest with its importances and run metadata.
#[derive(Debug)]
pub struct TrainingResult {
    forest: RandomForest,
    importances: Vec<RankedFeature>,
    metadata: TrainingMetadata,
}

impl TrainingResult {
    pub(crate) fn new(
        forest: RandomForest,
        importances: Vec<RankedFeature>,
        metadata: TrainingMetadata,
    ) -> Self {
        Self {
            forest,
            importances,
            metadata,
        }
    }

    /// Borrow the fitted forest.
    #[must_use]
    pub fn forest(&self) -> &RandomForest {
        &self.forest
    }

    /// Consume the result and return the fitted forest.
    #[must_use]
    pub fn into_forest(self) -> RandomForest {
        self.forest
    }

    /// Ranked feature importances, most important first.
    #[must_use]
    pub fn importances(&self) -> &[RankedFeature] {
        &self.importances
    }

    /// Return training metadata.
    #[must_use]
    pub fn metadata(&self) -> &TrainingMetadata {
        &self.metadata
    }
}
