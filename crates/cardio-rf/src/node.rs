//! Tree arena nodes and the small newtypes they carry.

/// Column a split tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct FeatureIndex(usize);

impl FeatureIndex {
    pub(crate) fn new(column: usize) -> Self {
        Self(column)
    }

    /// Column position in the training matrix.
    #[must_use]
    pub fn get(self) -> usize {
        self.0
    }
}

/// Slot of a node in [`DecisionTree::nodes`](crate::DecisionTree::nodes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct NodeIndex(usize);

impl NodeIndex {
    pub(crate) fn new(slot: usize) -> Self {
        Self(slot)
    }

    /// Arena slot.
    #[must_use]
    pub fn get(self) -> usize {
        self.0
    }
}

/// Gini or entropy score of a node's class mix; 0.0 is pure.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, serde::Serialize, serde::Deserialize)]
pub struct Impurity(f64);

impl Impurity {
    pub(crate) fn new(score: f64) -> Self {
        Self(score)
    }

    /// The score.
    #[must_use]
    pub fn get(self) -> f64 {
        self.0
    }

    /// `true` when the node holds a single class.
    #[must_use]
    pub fn is_pure(self) -> bool {
        self.0 <= 0.0
    }
}

/// One entry of a tree arena. The root sits in slot 0 and every child
/// has a higher slot than its parent.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Node {
    /// Rows with `row[feature] <= threshold` descend left, the rest right.
    Split {
        /// Column tested.
        feature: FeatureIndex,
        /// Midpoint between the two neighbouring training values.
        threshold: f64,
        /// Child for `<=`.
        left: NodeIndex,
        /// Child for `>`.
        right: NodeIndex,
        /// Score of the rows reaching this node.
        impurity: Impurity,
        /// Training rows (with bootstrap repeats) reaching this node.
        n_samples: usize,
        /// `n·I - n_l·I_l - n_r·I_r`, summed into feature importances.
        impurity_decrease: f64,
    },
    /// Terminal node voting for its majority class.
    Leaf {
        /// Class this leaf votes for; class 0 wins a tie.
        prediction: usize,
        /// Training rows per class.
        class_counts: Vec<usize>,
        /// Score of the rows in this leaf.
        impurity: Impurity,
        /// Training rows in this leaf.
        n_samples: usize,
    },
}

impl Node {
    /// Score of the rows reaching this node.
    #[must_use]
    pub fn impurity(&self) -> Impurity {
        match self {
            Node::Split { impurity, .. } | Node::Leaf { impurity, .. } => *impurity,
        }
    }

    /// Training rows reaching this node.
    #[must_use]
    pub fn n_samples(&self) -> usize {
        match self {
            Node::Split { n_samples, .. } | Node::Leaf { n_samples, .. } => *n_samples,
        }
    }

    /// `true` for a terminal node.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf { .. })
    }
}

/// Index of the largest count, preferring the lowest index on ties.
pub(crate) fn majority(counts: &[usize]) -> usize {
    let mut best = 0;
    for (class, &count) in counts.iter().enumerate() {
        if count > counts[best] {
            best = class;
        }
    }
    best
}
