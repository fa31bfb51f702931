use rand::Rng;
use rand::seq::index;

use crate::node::{FeatureIndex, Impurity};

/// Impurity measure used to score candidate splits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum SplitCriterion {
    /// Gini impurity: 1 - Σ(p_i²)
    Gini,
    /// Information entropy: -Σ(p_i · ln(p_i))
    Entropy,
}

impl SplitCriterion {
    /// Compute the impurity of a node from its class counts.
    ///
    /// An empty node (`n_samples == 0`) is pure.
    #[must_use]
    pub fn impurity(&self, class_counts: &[usize], n_samples: usize) -> Impurity {
        if n_samples == 0 {
            return Impurity::new(0.0);
        }
        let n = n_samples as f64;
        let value = match self {
            SplitCriterion::Gini => {
                1.0 - class_counts
                    .iter()
                    .map(|&c| (c as f64 / n).powi(2))
                    .sum::<f64>()
            }
            SplitCriterion::Entropy => -class_counts
                .iter()
                .filter(|&&c| c > 0)
                .map(|&c| {
                    let p = c as f64 / n;
                    p * p.ln()
                })
                .sum::<f64>(),
        };
        Impurity::new(value)
    }
}

impl std::str::FromStr for SplitCriterion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gini" => Ok(SplitCriterion::Gini),
            "entropy" => Ok(SplitCriterion::Entropy),
            other => Err(format!("unknown criterion '{other}', expected gini or entropy")),
        }
    }
}

impl std::fmt::Display for SplitCriterion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SplitCriterion::Gini => f.write_str("gini"),
            SplitCriterion::Entropy => f.write_str("entropy"),
        }
    }
}

/// The winning split of a node, with its partitioned samples.
#[derive(Debug, Clone)]
pub(crate) struct SplitResult {
    pub(crate) feature: FeatureIndex,
    pub(crate) threshold: f64,
    /// `n·I - n_l·I_l - n_r·I_r`, the MDI contribution of this split.
    pub(crate) impurity_decrease: f64,
    pub(crate) left: Vec<usize>,
    pub(crate) right: Vec<usize>,
}

/// Exhaustive midpoint search over a random feature subset.
///
/// `columns` is column-major: `columns[feature][sample]`. Sample lists
/// passed to [`SplitSearch::best`] may repeat indices (bootstrap draws).
pub(crate) struct SplitSearch<'a> {
    pub(crate) columns: &'a [Vec<f64>],
    pub(crate) labels: &'a [usize],
    pub(crate) n_classes: usize,
    pub(crate) criterion: SplitCriterion,
    pub(crate) max_features: usize,
    pub(crate) min_samples_leaf: usize,
}

impl SplitSearch<'_> {
    /// Find the split with the largest impurity decrease among
    /// `max_features` randomly chosen columns.
    ///
    /// Columns are visited in a seeded random order. A column that is
    /// constant over `samples` does not use up the `max_features` budget,
    /// and once the budget is spent without a valid split the search keeps
    /// going through the remaining columns until one yields a split.
    ///
    /// Returns `None` when every column is constant over `samples` or no
    /// boundary leaves `min_samples_leaf` rows on both sides. Ties between
    /// candidates keep the first one scanned.
    pub(crate) fn best(
        &self,
        samples: &[usize],
        parent_counts: &[usize],
        parent_impurity: Impurity,
        rng: &mut impl Rng,
    ) -> Option<SplitResult> {
        let n_features = self.columns.len();
        let n = samples.len();
        if n < 2 || n_features == 0 {
            return None;
        }

        let budget = self.max_features.min(n_features);
        let order = index::sample(rng, n_features, n_features);

        let mut best_decrease = f64::NEG_INFINITY;
        let mut best: Option<(usize, f64)> = None;
        let mut visited = 0;
        let mut sorted: Vec<(f64, usize)> = Vec::with_capacity(n);

        for feature in order.iter() {
            if visited >= budget && best.is_some() {
                break;
            }
            let column = &self.columns[feature];
            sorted.clear();
            sorted.extend(samples.iter().map(|&s| (column[s], self.labels[s])));
            sorted.sort_unstable_by(|a, b| a.0.total_cmp(&b.0));
            if sorted[0].0 == sorted[n - 1].0 {
                continue;
            }
            visited += 1;

            let mut left_counts = vec![0usize; self.n_classes];
            let mut right_counts = parent_counts.to_vec();

            for i in 0..n - 1 {
                let (value, class) = sorted[i];
                left_counts[class] += 1;
                right_counts[class] -= 1;

                let next = sorted[i + 1].0;
                if value == next {
                    continue;
                }
                let n_left = i + 1;
                let n_right = n - n_left;
                if n_left < self.min_samples_leaf || n_right < self.min_samples_leaf {
                    continue;
                }

                let decrease = n as f64 * parent_impurity.get()
                    - n_left as f64 * self.criterion.impurity(&left_counts, n_left).get()
                    - n_right as f64 * self.criterion.impurity(&right_counts, n_right).get();

                if decrease > best_decrease {
                    best_decrease = decrease;
                    let mut threshold = value + (next - value) / 2.0;
                    // Adjacent floats: the midpoint can round up to `next`.
                    if threshold >= next {
                        threshold = value;
                    }
                    best = Some((feature, threshold));
                }
            }
        }

        let (feature, threshold) = best?;
        let column = &self.columns[feature];
        let (left, right): (Vec<usize>, Vec<usize>) =
            samples.iter().partition(|&&s| column[s] <= threshold);

        Some(SplitResult {
            feature: FeatureIndex::new(feature),
            threshold,
            impurity_decrease: best_decrease,
            left,
            right,
        })
    }
}
