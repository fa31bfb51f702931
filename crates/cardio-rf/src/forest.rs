//! Random forest training with parallel tree construction.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use tracing::{debug, info, instrument};

use crate::config::RandomForestConfig;
use crate::error::RfError;
use crate::importance::aggregate_importances;
use crate::result::{TrainingMetadata, TrainingResult};
use crate::tree::{DecisionTree, DecisionTreeConfig, check_features, check_growth, to_columns};

/// Number of classes a binary forest votes over.
pub(crate) const N_CLASSES: usize = 2;

/// A fitted binary random forest.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RandomForest {
    pub(crate) trees: Vec<DecisionTree>,
    pub(crate) n_features: usize,
    pub(crate) feature_names: Vec<String>,
    pub(crate) config: RandomForestConfig,
}

/// Draw `n` row indices with replacement.
fn bootstrap_indices(n: usize, rng: &mut impl Rng) -> Vec<usize> {
    (0..n).map(|_| rng.gen_range(0..n)).collect()
}

/// Reject labels outside {0, 1} and single-class label sets.
fn check_binary_labels(labels: &[usize]) -> Result<(), RfError> {
    if let Some((sample_index, &label)) = labels.iter().enumerate().find(|&(_, &l)| l > 1) {
        return Err(RfError::InvalidLabel {
            sample_index,
            label,
        });
    }
    let positives = labels.iter().filter(|&&l| l == 1).count();
    if positives == 0 {
        return Err(RfError::SingleClass { class: 0 });
    }
    if positives == labels.len() {
        return Err(RfError::SingleClass { class: 1 });
    }
    Ok(())
}

/// Train the ensemble.
///
/// Per-tree seeds are drawn from the master generator before the parallel
/// map and trees are collected in seed order, so the forest does not depend
/// on the rayon thread count.
#[instrument(skip_all, fields(n_estimators = config.n_estimators, n_samples = features.len()))]
pub(crate) fn train(
    config: &RandomForestConfig,
    features: &[Vec<f64>],
    labels: &[usize],
    feature_names: &[String],
) -> Result<TrainingResult, RfError> {
    let n_features = check_features(features)?;
    let n_samples = features.len();
    if labels.len() != n_samples {
        return Err(RfError::LabelCountMismatch {
            features: n_samples,
            labels: labels.len(),
        });
    }
    if feature_names.len() != n_features {
        return Err(RfError::FeatureNameCount {
            expected: n_features,
            got: feature_names.len(),
        });
    }
    check_binary_labels(labels)?;
    check_growth(
        config.max_depth,
        config.min_samples_split,
        config.min_samples_leaf,
    )?;
    let max_features = config.max_features.resolve(n_features)?;

    info!(
        n_estimators = config.n_estimators,
        n_samples,
        n_features,
        max_features,
        bootstrap = config.bootstrap,
        criterion = %config.criterion,
        "training random forest"
    );

    let columns = to_columns(features, n_features);
    let all_rows: Vec<usize> = (0..n_samples).collect();

    let mut master_rng = ChaCha8Rng::seed_from_u64(config.seed);
    let tree_seeds: Vec<u64> = (0..config.n_estimators)
        .map(|_| master_rng.r#gen())
        .collect();

    let tree_template = DecisionTreeConfig::new()
        .with_criterion(config.criterion)
        .with_max_depth(config.max_depth)
        .with_min_samples_split(config.min_samples_split)
        .with_min_samples_leaf(config.min_samples_leaf)
        .with_max_features(Some(max_features));

    let trees: Vec<DecisionTree> = tree_seeds
        .into_par_iter()
        .map(|seed| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let samples = if config.bootstrap {
                bootstrap_indices(n_samples, &mut rng)
            } else {
                all_rows.clone()
            };
            tree_template
                .clone()
                .with_seed(rng.r#gen())
                .grow(&columns, labels, &samples, N_CLASSES, max_features)
        })
        .collect();

    let per_tree: Vec<Vec<f64>> = trees.iter().map(DecisionTree::feature_importances).collect();
    let importances = aggregate_importances(&per_tree, feature_names);

    let metadata = TrainingMetadata {
        n_estimators: config.n_estimators,
        n_features,
        n_samples,
        n_positive: labels.iter().filter(|&&l| l == 1).count(),
        max_features_resolved: max_features,
        total_nodes: trees.iter().map(DecisionTree::n_nodes).sum(),
    };

    debug!(
        total_nodes = metadata.total_nodes,
        max_depth_reached = trees.iter().map(DecisionTree::depth).max().unwrap_or(0),
        "tree training complete"
    );

    let forest = RandomForest {
        trees,
        n_features,
        feature_names: feature_names.to_vec(),
        config: config.clone(),
    };

    info!(
        top_feature = importances.first().map(|f| f.name.as_str()),
        "random forest training complete"
    );

    Ok(TrainingResult::new(forest, importances, metadata))
}

#[cfg(test)]
mod tests {
    use crate::RfError;
    use crate::config::{MaxFeatures, RandomForestConfig};

    fn two_blobs() -> (Vec<Vec<f64>>, Vec<usize>, Vec<String>) {
        let mut features = Vec::new();
        let mut labels = Vec::new();
        for i in 0..25 {
            let t = i as f64 * 0.1;
            features.push(vec![t, 1.0 - t, 0.5]);
            labels.push(0);
            features.push(vec![5.0 + t, 4.0 - t, 0.5]);
            labels.push(1);
        }
        let names = vec!["x".into(), "y".into(), "z".into()];
        (features, labels, names)
    }

    #[test]
    fn separable_training_accuracy() {
        let (features, labels, names) = two_blobs();
        let result = RandomForestConfig::new(25)
            .unwrap()
            .fit(&features, &labels, &names)
            .unwrap();
        let preds = result.forest().predict_batch(&features).unwrap();
        assert_eq!(preds, labels);
    }

    #[test]
    fn importances_sum_to_one() {
        let (features, labels, names) = two_blobs();
        let result = RandomForestConfig::new(20)
            .unwrap()
            .with_seed(3)
            .fit(&features, &labels, &names)
            .unwrap();
        let total: f64 = result.importances().iter().map(|f| f.importance).sum();
        assert!((total - 1.0).abs() < 1e-10, "total = {total}");
        let z = result.importances().iter().find(|f| f.name == "z").unwrap();
        assert_eq!(z.importance, 0.0);
    }

    #[test]
    fn metadata_reflects_training_run() {
        let (features, labels, names) = two_blobs();
        let result = RandomForestConfig::new(4)
            .unwrap()
            .with_max_features(MaxFeatures::All)
            .fit(&features, &labels, &names)
            .unwrap();
        let meta = result.metadata();
        assert_eq!(meta.n_estimators, 4);
        assert_eq!(meta.n_samples, 50);
        assert_eq!(meta.n_positive, 25);
        assert_eq!(meta.max_features_resolved, 3);
        assert_eq!(result.forest().n_trees(), 4);
    }

    #[test]
    fn label_validation() {
        let (features, mut labels, names) = two_blobs();
        let config = RandomForestConfig::new(3).unwrap();

        let ones = vec![1; labels.len()];
        assert!(matches!(
            config.fit(&features, &ones, &names),
            Err(RfError::SingleClass { class: 1 })
        ));

        labels[4] = 2;
        assert!(matches!(
            config.fit(&features, &labels, &names),
            Err(RfError::InvalidLabel {
                sample_index: 4,
                label: 2
            })
        ));
    }

    #[test]
    fn name_count_must_match() {
        let (features, labels, _) = two_blobs();
        let err = RandomForestConfig::new(3)
            .unwrap()
            .fit(&features, &labels, &["x".to_string()])
            .unwrap_err();
        assert!(matches!(
            err,
            RfError::FeatureNameCount {
                expected: 3,
                got: 1
            }
        ));
    }

    #[test]
    fn empty_dataset_error() {
        let err = RandomForestConfig::new(10).unwrap().fit(&[], &[], &[]).unwrap_err();
        assert!(matches!(err, RfError::EmptyDataset));
    }
}
