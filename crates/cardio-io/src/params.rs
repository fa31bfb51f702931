//! Pipeline parameters loaded from `params.yaml`.

use std::path::Path;

use cardio_prep::PreprocessConfig;
use cardio_rf::{RandomForestConfig, SplitCriterion};
use serde::{Deserialize, Deserializer, Serialize, de::Error as _};
use tracing::{debug, instrument};

use crate::IoError;

/// Both pipeline sections. Unknown top-level sections are ignored so the
/// file can be shared with other tools; unknown keys inside a section are
/// rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Params {
    /// `preprocess:` section.
    pub preprocess: PreprocessParams,
    /// `train:` section.
    pub train: TrainParams,
}

/// Parameters of the preprocessing stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PreprocessParams {
    /// Fraction of each class held out for testing, in (0, 1).
    pub test_size: f64,
    /// Split seed.
    pub random_state: u64,
    /// Drop IQR outliers before engineering.
    #[serde(default = "enabled")]
    pub remove_outliers: bool,
    /// Append the derived risk columns.
    #[serde(default = "enabled")]
    pub engineer_features: bool,
}

/// Parameters of the training stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrainParams {
    /// Number of trees.
    pub n_estimators: usize,
    /// Depth cap; `null` or `"unbounded"` for none.
    #[serde(deserialize_with = "max_depth")]
    pub max_depth: Option<usize>,
    /// Master forest seed.
    pub random_state: u64,
    /// `gini` or `entropy`.
    #[serde(default = "gini")]
    pub criterion: String,
    /// Minimum rows to attempt a split.
    #[serde(default = "two")]
    pub min_samples_split: usize,
    /// Minimum rows per child.
    #[serde(default = "one")]
    pub min_samples_leaf: usize,
}

fn enabled() -> bool {
    true
}

fn gini() -> String {
    "gini".to_string()
}

fn two() -> usize {
    2
}

fn one() -> usize {
    1
}

/// Accept a non-negative integer, `null`, or the word `unbounded`.
fn max_depth<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<usize>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Depth(usize),
        Word(String),
    }
    match Option::<Repr>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Repr::Depth(depth)) => Ok(Some(depth)),
        Some(Repr::Word(word)) if word.eq_ignore_ascii_case("unbounded") => Ok(None),
        Some(Repr::Word(word)) => Err(D::Error::custom(format!(
            "max_depth must be a positive integer, null or \"unbounded\", got \"{word}\""
        ))),
    }
}

fn invalid(key: &'static str, reason: impl ToString) -> IoError {
    IoError::InvalidParam {
        key,
        reason: reason.to_string(),
    }
}

impl Params {
    /// Read, parse and validate a parameter file.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IoError::ReadParams`] | file cannot be read |
    /// | [`IoError::ParseParams`] | YAML is malformed, a key is missing, or a value has the wrong type |
    /// | [`IoError::InvalidParam`] | a value is out of range |
    #[instrument(fields(path = %path.display()))]
    pub fn from_path(path: &Path) -> Result<Self, IoError> {
        let text = std::fs::read_to_string(path).map_err(|source| IoError::ReadParams {
            path: path.to_path_buf(),
            source,
        })?;
        let params: Params = serde_yaml::from_str(&text).map_err(|source| IoError::ParseParams {
            path: path.to_path_buf(),
            source,
        })?;
        params.validate()?;
        debug!(?params, "parameters loaded");
        Ok(params)
    }

    /// Check every value range by building both stage configs.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::InvalidParam`] naming the first offending key.
    pub fn validate(&self) -> Result<(), IoError> {
        self.preprocess_config()?;
        self.forest_config()?;
        Ok(())
    }

    /// Build the preprocessing configuration.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::InvalidParam`] for `preprocess.test_size` outside (0, 1).
    pub fn preprocess_config(&self) -> Result<PreprocessConfig, IoError> {
        let p = &self.preprocess;
        Ok(PreprocessConfig::new(p.test_size)
            .map_err(|e| invalid("preprocess.test_size", e))?
            .with_seed(p.random_state)
            .with_outlier_removal(p.remove_outliers)
            .with_feature_engineering(p.engineer_features))
    }

    /// Build the forest configuration.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::InvalidParam`] naming the offending `train.*` key.
    pub fn forest_config(&self) -> Result<RandomForestConfig, IoError> {
        let t = &self.train;
        if t.max_depth == Some(0) {
            return Err(invalid("train.max_depth", "must be at least 1"));
        }
        if t.min_samples_split < 2 {
            return Err(invalid("train.min_samples_split", "must be at least 2"));
        }
        if t.min_samples_leaf < 1 {
            return Err(invalid("train.min_samples_leaf", "must be at least 1"));
        }
        let criterion: SplitCriterion = t
            .criterion
            .parse()
            .map_err(|e: String| invalid("train.criterion", e))?;
        Ok(RandomForestConfig::new(t.n_estimators)
            .map_err(|e| invalid("train.n_estimators", e))?
            .with_max_depth(t.max_depth)
            .with_criterion(criterion)
            .with_min_samples_split(t.min_samples_split)
            .with_min_samples_leaf(t.min_samples_leaf)
            .with_seed(t.random_state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = "
preprocess:
  test_size: 0.2
  random_state: 42
train:
  n_estimators: 100
  max_depth: 10
  random_state: 42
";

    fn parse(yaml: &str) -> Result<Params, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    #[test]
    fn minimal_file_gets_defaults() {
        let params = parse(FULL).unwrap();
        params.validate().unwrap();
        assert!(params.preprocess.remove_outliers);
        assert!(params.preprocess.engineer_features);
        assert_eq!(params.train.max_depth, Some(10));
        assert_eq!(params.train.criterion, "gini");

        let forest = params.forest_config().unwrap();
        assert_eq!(forest.n_estimators(), 100);
        assert_eq!(forest.seed(), 42);
        let prep = params.preprocess_config().unwrap();
        assert!((prep.test_fraction() - 0.2).abs() < f64::EPSILON);
    }

    #[test]
    fn unbounded_depth_spellings() {
        for spelling in ["null", "~", "unbounded", "Unbounded"] {
            let yaml = FULL.replace("max_depth: 10", &format!("max_depth: {spelling}"));
            assert_eq!(parse(&yaml).unwrap().train.max_depth, None, "{spelling}");
        }
    }

    #[test]
    fn missing_key_is_a_parse_error() {
        let yaml = FULL.replace("  n_estimators: 100\n", "");
        let err = parse(&yaml).unwrap_err();
        assert!(err.to_string().contains("n_estimators"), "{err}");
        let yaml = FULL.replace("  max_depth: 10\n", "");
        assert!(parse(&yaml).is_err());
    }

    #[test]
    fn wrong_types_are_parse_errors() {
        assert!(parse(&FULL.replace("n_estimators: 100", "n_estimators: many")).is_err());
        assert!(parse(&FULL.replace("max_depth: 10", "max_depth: deep")).is_err());
        assert!(parse(&FULL.replace("max_depth: 10", "max_depth: -3")).is_err());
        assert!(parse(&FULL.replace("test_size: 0.2", "test_size: [0.2]")).is_err());
    }

    #[test]
    fn unknown_section_key_is_rejected() {
        let yaml = FULL.replace("  random_state: 42\ntrain:", "  random_stat: 1\n  random_state: 42\ntrain:");
        assert!(parse(&yaml).is_err());
    }

    #[test]
    fn unknown_top_level_section_is_ignored() {
        let yaml = format!("{FULL}data:\n  raw: data/heart.csv\n");
        assert!(parse(&yaml).is_ok());
    }

    #[test]
    fn out_of_range_values_name_their_key() {
        let cases = [
            ("test_size: 0.2", "test_size: 1.0", "preprocess.test_size"),
            ("test_size: 0.2", "test_size: 0", "preprocess.test_size"),
            ("n_estimators: 100", "n_estimators: 0", "train.n_estimators"),
            ("max_depth: 10", "max_depth: 0", "train.max_depth"),
            ("random_state: 42\n", "random_state: 42\n  criterion: mse\n", "train.criterion"),
        ];
        for (from, to, expected_key) in cases {
            // Replace the last occurrence so `random_state` edits land in `train:`.
            let at = FULL.rfind(from).unwrap();
            let yaml = format!("{}{}{}", &FULL[..at], to, &FULL[at + from.len()..]);
            let err = parse(&yaml).unwrap().validate().unwrap_err();
            assert!(
                matches!(err, IoError::InvalidParam { key, .. } if key == expected_key),
                "{to}: {err}"
            );
        }
    }

    #[test]
    fn entropy_and_leaf_sizes_carry_through() {
        let yaml = FULL.replace(
            "  max_depth: 10\n",
            "  max_depth: 10\n  criterion: Entropy\n  min_samples_split: 4\n  min_samples_leaf: 2\n",
        );
        let forest = parse(&yaml).unwrap().forest_config().unwrap();
        assert_eq!(forest.criterion(), SplitCriterion::Entropy);
        assert_eq!(forest.min_samples_split(), 4);
        assert_eq!(forest.min_samples_leaf(), 2);
    }

    #[test]
    fn toggles_parse() {
        let yaml = FULL.replace(
            "  random_state: 42\ntrain:",
            "  random_state: 42\n  remove_outliers: false\n  engineer_features: false\ntrain:",
        );
        let params = parse(&yaml).unwrap();
        let prep = params.preprocess_config().unwrap();
        assert!(!prep.remove_outliers());
        assert!(!prep.engineer_features());
    }
}
