//! Random forest classification for binary risk labels.
//!
//! Seeded, parallel bagging of CART trees with majority-vote prediction,
//! test-set metrics and a versioned on-disk model format.

mod config;
mod error;
mod forest;
mod importance;
mod metrics;
mod node;
mod predict;
mod result;
mod serialize;
mod split;
mod tree;

pub use config::{MaxFeatures, RandomForestConfig};
pub use error::RfError;
pub use forest::RandomForest;
pub use importance::RankedFeature;
pub use metrics::{ConfusionCounts, MetricsReport, roc_auc};
pub use node::{FeatureIndex, Impurity, Node, NodeIndex};
pub use predict::ClassVotes;
pub use result::{TrainingMetadata, TrainingResult};
pub use serialize::FORMAT_VERSION;
pub use split::SplitCriterion;
pub use tree::{DecisionTree, DecisionTreeConfig};
