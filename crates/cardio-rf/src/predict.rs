//! Majority-vote prediction for the random forest.

use rayon::iter::{IntoParallelIterator, ParallelIterator};

use crate::config::RandomForestConfig;
use crate::error::RfError;
use crate::forest::{N_CLASSES, RandomForest};
use crate::node::majority;
use crate::tree::DecisionTree;

/// Per-class tree votes for one sample.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassVotes {
    votes: [usize; N_CLASSES],
}

impl ClassVotes {
    /// Return the majority class; a tied vote goes to class 0.
    #[must_use]
    pub fn predicted_class(&self) -> usize {
        majority(&self.votes)
    }

    /// Fraction of trees voting for the positive class.
    #[must_use]
    pub fn positive_fraction(&self) -> f64 {
        let total: usize = self.votes.iter().sum();
        if total == 0 {
            return 0.0;
        }
        self.votes[1] as f64 / total as f64
    }

    /// Raw vote counts indexed by class.
    #[must_use]
    pub fn counts(&self) -> &[usize] {
        &self.votes
    }
}

impl RandomForest {
    /// Collect the vote of every tree for a single sample.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::PredictionFeatureMismatch`] when `sample.len() != n_features`.
    pub fn votes(&self, sample: &[f64]) -> Result<ClassVotes, RfError> {
        if sample.len() != self.n_features {
            return Err(RfError::PredictionFeatureMismatch {
                expected: self.n_features,
                got: sample.len(),
            });
        }
        let mut votes = [0usize; N_CLASSES];
        for tree in &self.trees {
            votes[tree.vote(sample)] += 1;
        }
        Ok(ClassVotes { votes })
    }

    /// Predict the label of a single sample by majority vote.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::PredictionFeatureMismatch`] when `sample.len() != n_features`.
    pub fn predict(&self, sample: &[f64]) -> Result<usize, RfError> {
        Ok(self.votes(sample)?.predicted_class())
    }

    /// Positive-class probability of a single sample.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::PredictionFeatureMismatch`] when `sample.len() != n_features`.
    pub fn predict_proba(&self, sample: &[f64]) -> Result<f64, RfError> {
        Ok(self.votes(sample)?.positive_fraction())
    }

    /// Predict labels for a batch of samples in parallel, preserving order.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::PredictionFeatureMismatch`] if any sample has the wrong feature count.
    pub fn predict_batch(&self, features: &[Vec<f64>]) -> Result<Vec<usize>, RfError> {
        features
            .into_par_iter()
            .map(|sample| self.predict(sample))
            .collect()
    }

    /// Positive-class probabilities for a batch of samples in parallel.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::PredictionFeatureMismatch`] if any sample has the wrong feature count.
    pub fn predict_proba_batch(&self, features: &[Vec<f64>]) -> Result<Vec<f64>, RfError> {
        features
            .into_par_iter()
            .map(|sample| self.predict_proba(sample))
            .collect()
    }

    /// Return the fitted trees in training order.
    #[must_use]
    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }

    /// Return the number of features this forest was trained on.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Return the number of trees in the ensemble.
    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Return the feature names.
    #[must_use]
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Return the hyperparameters the forest was trained with.
    #[must_use]
    pub fn config(&self) -> &RandomForestConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tied_vote_goes_negative() {
        let votes = ClassVotes { votes: [2, 2] };
        assert_eq!(votes.predicted_class(), 0);
        assert!((votes.positive_fraction() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn majority_positive() {
        let votes = ClassVotes { votes: [1, 3] };
        assert_eq!(votes.predicted_class(), 1);
        assert!((votes.positive_fraction() - 0.75).abs() < f64::EPSILON);
        assert_eq!(votes.counts(), &[1, 3]);
    }

    #[test]
    fn batch_matches_single_predictions() {
        let features: Vec<Vec<f64>> = (0..30)
            .map(|i| vec![i as f64, ((i * 7) % 5) as f64])
            .collect();
        let labels: Vec<usize> = (0..30).map(|i| usize::from(i >= 15)).collect();
        let names = vec!["a".to_string(), "b".to_string()];
        let forest = RandomForestConfig::new(9)
            .unwrap()
            .with_seed(5)
            .fit(&features, &labels, &names)
            .unwrap()
            .into_forest();

        let labels_batch = forest.predict_batch(&features).unwrap();
        let proba_batch = forest.predict_proba_batch(&features).unwrap();
        for (i, sample) in features.iter().enumerate() {
            assert_eq!(labels_batch[i], forest.predict(sample).unwrap());
            assert_eq!(proba_batch[i], forest.predict_proba(sample).unwrap());
            assert!((0.0..=1.0).contains(&proba_batch[i]));
        }
    }

    #[test]
    fn wrong_width_rejected() {
        let features = vec![vec![0.0], vec![1.0], vec![2.0], vec![3.0]];
        let names = vec!["a".to_string()];
        let forest = RandomForestConfig::new(2)
            .unwrap()
            .fit(&features, &[0, 0, 1, 1], &names)
            .unwrap()
            .into_forest();
        assert!(matches!(
            forest.predict(&[1.0, 2.0]),
            Err(RfError::PredictionFeatureMismatch {
                expected: 1,
                got: 2
            })
        ));
    }
}
