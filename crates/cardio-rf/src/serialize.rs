//! Model persistence via a versioned bincode envelope.

use std::path::Path;

use tracing::{debug, info, instrument};

use crate::config::RandomForestConfig;
use crate::error::RfError;
use crate::forest::{N_CLASSES, RandomForest};

/// Current binary format version.
pub const FORMAT_VERSION: u32 = 1;

/// On-disk layout. `format_version` must stay the first field so it can be
/// read before the rest of the envelope is decoded.
#[derive(serde::Serialize, serde::Deserialize)]
struct ModelEnvelope {
    format_version: u32,
    n_trees: usize,
    n_features: usize,
    n_classes: usize,
    feature_names: Vec<String>,
    hyperparameters: RandomForestConfig,
    forest: RandomForest,
}

impl RandomForest {
    /// Encode the model as bytes.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::SerializeModel`] if bincode encoding fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>, RfError> {
        let envelope = ModelEnvelope {
            format_version: FORMAT_VERSION,
            n_trees: self.trees.len(),
            n_features: self.n_features,
            n_classes: N_CLASSES,
            feature_names: self.feature_names.clone(),
            hyperparameters: self.config.clone(),
            forest: self.clone(),
        };
        bincode::serialize(&envelope).map_err(|source| RfError::SerializeModel { source })
    }

    /// Save the model to a binary file.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`RfError::SerializeModel`] | bincode encoding failed |
    /// | [`RfError::WriteModel`] | file write failed |
    #[instrument(skip(self), fields(path = %path.as_ref().display()))]
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), RfError> {
        let path = path.as_ref();
        let bytes = self.to_bytes()?;
        std::fs::write(path, &bytes).map_err(|source| RfError::WriteModel {
            path: path.to_path_buf(),
            source,
        })?;
        info!(size_bytes = bytes.len(), n_trees = self.trees.len(), "model saved");
        Ok(())
    }

    /// Load a model from a binary file.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`RfError::ReadModel`] | file read failed |
    /// | [`RfError::IncompatibleModelVersion`] | format version mismatch |
    /// | [`RfError::DeserializeModel`] | bincode decoding failed |
    #[instrument(fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RfError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| RfError::ReadModel {
            path: path.to_path_buf(),
            source,
        })?;
        let decode_error = |source| RfError::DeserializeModel {
            path: path.to_path_buf(),
            source,
        };

        let found: u32 = bincode::deserialize(&bytes).map_err(decode_error)?;
        if found != FORMAT_VERSION {
            return Err(RfError::IncompatibleModelVersion {
                expected: FORMAT_VERSION,
                found,
                path: path.to_path_buf(),
            });
        }
        let envelope: ModelEnvelope = bincode::deserialize(&bytes).map_err(decode_error)?;

        debug!(
            n_trees = envelope.n_trees,
            n_features = envelope.n_features,
            n_classes = envelope.n_classes,
            "model loaded"
        );
        Ok(envelope.forest)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::FORMAT_VERSION;
    use crate::RfError;
    use crate::config::RandomForestConfig;
    use crate::forest::RandomForest;

    fn train_simple_model() -> RandomForest {
        let features = vec![
            vec![1.0, 0.0],
            vec![2.0, 0.0],
            vec![3.0, 0.0],
            vec![10.0, 0.0],
            vec![11.0, 0.0],
            vec![12.0, 0.0],
        ];
        let labels = vec![0, 0, 0, 1, 1, 1];
        let names = vec!["x".to_string(), "y".to_string()];
        RandomForestConfig::new(5)
            .unwrap()
            .with_max_depth(Some(4))
            .fit(&features, &labels, &names)
            .unwrap()
            .into_forest()
    }

    #[test]
    fn save_load_preserves_forest() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("model.bin");
        let forest = train_simple_model();
        forest.save(&path).unwrap();

        let loaded = RandomForest::load(&path).unwrap();
        assert_eq!(loaded, forest);
        assert_eq!(loaded.config().max_depth(), Some(4));
        for sample in [[1.5, 0.0], [11.0, 0.0], [6.0, 0.0]] {
            assert_eq!(forest.predict_proba(&sample).unwrap(), loaded.predict_proba(&sample).unwrap());
        }
    }

    #[test]
    fn wrong_version_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("model.bin");
        let mut bytes = train_simple_model().to_bytes().unwrap();
        bytes[..4].copy_from_slice(&(FORMAT_VERSION + 1).to_le_bytes());
        std::fs::write(&path, &bytes).unwrap();

        let err = RandomForest::load(&path).unwrap_err();
        assert!(matches!(
            err,
            RfError::IncompatibleModelVersion { expected: 1, found: 2, .. }
        ));
    }

    #[test]
    fn truncated_file_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("model.bin");
        let bytes = train_simple_model().to_bytes().unwrap();
        std::fs::write(&path, &bytes[..bytes.len() / 2]).unwrap();
        assert!(matches!(
            RandomForest::load(&path).unwrap_err(),
            RfError::DeserializeModel { .. }
        ));
    }

    #[test]
    fn missing_file_rejected() {
        let dir = TempDir::new().unwrap();
        let err = RandomForest::load(dir.path().join("absent.bin")).unwrap_err();
        assert!(matches!(err, RfError::ReadModel { .. }));
    }
}
