//! Seeded, label-stratified train/test partitioning.

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, instrument};

use crate::error::PrepError;
use crate::table::Table;

/// The two halves of a stratified split.
#[derive(Debug, Clone)]
pub struct Split {
    /// Rows used to fit the scaler and the model.
    pub train: Table,
    /// Held-out rows used only for evaluation.
    pub test: Table,
}

/// Stratified train/test splitter.
///
/// Construct via [`Splitter::new`], then chain `with_seed` if desired.
#[derive(Debug, Clone)]
pub struct Splitter {
    test_fraction: f64,
    seed: u64,
}

impl Splitter {
    /// Create a splitter holding out `test_fraction` of every label stratum.
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
        })
    }

    /// Set the shuffle seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Return the held-out fraction.
    #[must_use]
    pub fn test_fraction(&self) -> f64 {
        self.test_fraction
    }

    /// Return the shuffle seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Split `table` into train and test halves.
    ///
    /// Both halves list rows in their original order.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`PrepError::EmptyTable`] | `table` has no rows |
    /// | [`PrepError::EmptyStratum`] | label 0 or 1 has fewer than two rows |
    #[instrument(skip_all, fields(n_rows = table.n_rows(), test_fraction = self.test_fraction, seed = self.seed))]
    pub fn split(&self, table: Table) -> Result<Split, PrepError> {
        let (train_idx, test_idx) = self.partition(table.labels())?;
        let split = Split {
            train: table.select(&train_idx),
            test: table.select(&test_idx),
        };
        info!(
            n_train = split.train.n_rows(),
            n_test = split.test.n_rows(),
            "stratified split complete"
        );
        Ok(split)
    }

    /// Compute `(train, test)` row positions for the given labels.
    ///
    /// Strata are visited in ascending label order with one generator, so
    /// the partition depends only on the labels and the seed.
    ///
    /// # Errors
    ///
    /// Same as [`Splitter::split`].
    pub fn partition(&self, labels: &[usize]) -> Result<(Vec<usize>, Vec<usize>), PrepError> {
        if labels.is_empty() {
            return Err(PrepError::EmptyTable { stage: "split" });
        }

        let n_labels = labels.iter().max().copied().unwrap_or(0).max(1) + 1;
        let mut strata: Vec<Vec<usize>> = vec![Vec::new(); n_labels];
        for (i, &label) in labels.iter().enumerate() {
            strata[label].push(i);
        }

        for (label, members) in strata.iter().enumerate() {
            if members.len() < 2 {
                return Err(PrepError::EmptyStratum {
                    label,
                    count: members.len(),
                });
            }
        }

        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let mut train = Vec::with_capacity(labels.len());
        let mut test = Vec::new();

        for (label, members) in strata.iter_mut().enumerate() {
            members.shuffle(&mut rng);
            let n_test = stratum_test_count(members.len(), self.test_fraction);
            debug!(label, stratum = members.len(), n_test, "stratum split");
            test.extend_from_slice(&members[..n_test]);
            train.extend_from_slice(&members[n_test..]);
        }

        train.sort_unstable();
        test.sort_unstable();
        Ok((train, test))
    }
}

/// Rounded held-out count for one stratum, kept within `[1, len - 1]`.
fn stratum_test_count(len: usize, fraction: f64) -> usize {
    let rounded = (len as f64 * fraction).round() as usize;
    rounded.clamp(1, len - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labelled(labels: Vec<usize>) -> Table {
        let rows = (0..labels.len()).map(|i| vec![i as f64]).collect();
        Table::new(vec!["x".into()], rows, labels).unwrap()
    }

    #[test]
    fn fraction_bounds() {
        assert!(Splitter::new(0.0).is_err());
        assert!(Splitter::new(1.0).is_err());
        assert!(Splitter::new(f64::NAN).is_err());
        assert!(Splitter::new(0.3).is_ok());
    }

    #[test]
    fn per_stratum_rounding() {
        assert_eq!(stratum_test_count(60, 0.25), 15);
        assert_eq!(stratum_test_count(40, 0.25), 10);
        assert_eq!(stratum_test_count(3, 0.1), 1);
        assert_eq!(stratum_test_count(2, 0.9), 1);
    }

    #[test]
    fn halves_are_disjoint_and_cover_input() {
        let labels: Vec<usize> = (0..50).map(|i| usize::from(i % 3 == 0)).collect();
        let (train, test) = Splitter::new(0.2).unwrap().partition(&labels).unwrap();
        let mut all: Vec<usize> = train.iter().chain(&test).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn same_seed_same_partition() {
        let labels: Vec<usize> = (0..40).map(|i| i % 2).collect();
        let a = Splitter::new(0.25).unwrap().with_seed(7).partition(&labels).unwrap();
        let b = Splitter::new(0.25).unwrap().with_seed(7).partition(&labels).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn different_seed_changes_partition() {
        let labels: Vec<usize> = (0..40).map(|i| i % 2).collect();
        let a = Splitter::new(0.25).unwrap().with_seed(1).partition(&labels).unwrap();
        let b = Splitter::new(0.25).unwrap().with_seed(2).partition(&labels).unwrap();
        assert_ne!(a.1, b.1);
    }

    #[test]
    fn split_keeps_row_ids_and_labels_together() {
        let table = labelled((0..20).map(|i| i % 2).collect());
        let split = Splitter::new(0.3).unwrap().split(table).unwrap();
        for t in [&split.train, &split.test] {
            for (row, (&label, &id)) in t.rows().iter().zip(t.labels().iter().zip(t.row_ids())) {
                assert_eq!(row[0] as usize, id);
                assert_eq!(label, id % 2);
            }
        }
    }

    #[test]
    fn single_class_is_an_empty_stratum() {
        let err = Splitter::new(0.2).unwrap().partition(&[0, 0, 0, 0]).unwrap_err();
        assert!(matches!(err, PrepError::EmptyStratum { label: 1, count: 0 }));
    }

    #[test]
    fn empty_input_rejected() {
        let err = Splitter::new(0.2).unwrap().partition(&[]).unwrap_err();
        assert!(matches!(err, PrepError::EmptyTable { stage: "split" }));
    }
}
