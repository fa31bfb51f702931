//! Feature importance aggregation across trees.

/// A feature with its forest-wide MDI importance and rank.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RankedFeature {
    /// Feature name.
    pub name: String,
    /// Normalized importance; all features sum to 1.0 unless every tree is a lone leaf.
    pub importance: f64,
    /// 1-based rank (1 = most important).
    pub rank: usize,
}

/// Sum per-tree importances, renormalize, and rank in descending order.
///
/// Equal importances keep column order.
pub(crate) fn aggregate_importances(per_tree: &[Vec<f64>], names: &[String]) -> Vec<RankedFeature> {
    let mut totals = vec![0.0f64; names.len()];
    for tree in per_tree {
        for (total, &value) in totals.iter_mut().zip(tree) {
            *total += value;
        }
    }
    let sum: f64 = totals.iter().sum();
    if sum > 0.0 {
        totals.iter_mut().for_each(|v| *v /= sum);
    }

    let mut ranked: Vec<RankedFeature> = names
        .iter()
        .zip(totals)
        .map(|(name, importance)| RankedFeature {
            name: name.clone(),
            importance,
            rank: 0,
        })
        .collect();
    ranked.sort_by(|a, b| b.importance.total_cmp(&a.importance));
    for (i, feature) in ranked.iter_mut().enumerate() {
        feature.rank = i + 1;
    }
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(n: &[&str]) -> Vec<String> {
        n.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn ranks_by_summed_importance() {
        let per_tree = vec![vec![0.2, 0.8, 0.0], vec![0.6, 0.4, 0.0]];
        let ranked = aggregate_importances(&per_tree, &names(&["a", "b", "c"]));
        assert_eq!(ranked[0].name, "b");
        assert!((ranked[0].importance - 0.6).abs() < 1e-12);
        assert_eq!(ranked[1].name, "a");
        assert_eq!(ranked[2].rank, 3);
        assert_eq!(ranked[2].importance, 0.0);
    }

    #[test]
    fn all_leaf_forest_gives_zeros() {
        let per_tree = vec![vec![0.0, 0.0]];
        let ranked = aggregate_importances(&per_tree, &names(&["a", "b"]));
        assert!(ranked.iter().all(|f| f.importance == 0.0));
        assert_eq!(ranked[0].name, "a");
    }
}
