//! Writers for processed matrices, the model blob, and JSON reports.

use std::fs;
use std::path::{Path, PathBuf};

use cardio_prep::{PreprocessResult, Table};
use cardio_rf::{MetricsReport, RandomForest, RankedFeature};
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::IoError;
use crate::processed::{X_TEST, X_TRAIN, Y_TEST, Y_TRAIN};

/// Model blob file name.
pub const MODEL_FILE: &str = "model.bin";
/// Test metrics file name.
pub const METRICS_FILE: &str = "metrics.json";
/// Feature importance file name.
pub const IMPORTANCES_FILE: &str = "feature_importances.json";

fn create_dir(dir: &Path) -> Result<(), IoError> {
    fs::create_dir_all(dir).map_err(|source| IoError::OutputDirCreate {
        path: dir.to_path_buf(),
        source,
    })?;
    debug!(dir = %dir.display(), "output directory ready");
    Ok(())
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), IoError> {
    let mut json = serde_json::to_string_pretty(value).map_err(|source| IoError::EncodeJson {
        path: path.to_path_buf(),
        source,
    })?;
    json.push('\n');
    fs::write(path, json).map_err(|source| IoError::WriteFile {
        path: path.to_path_buf(),
        source,
    })
}

/// Writes the four processed CSV files into one directory.
///
/// Matrices carry the feature names as header; label files carry the
/// target name. Floats are written in shortest round-trip form.
pub struct ProcessedWriter {
    dir: PathBuf,
}

impl ProcessedWriter {
    /// Create a writer, creating `dir` if needed.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::OutputDirCreate`] if the directory cannot be created.
    pub fn new(dir: &Path) -> Result<Self, IoError> {
        create_dir(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    /// Write `X_train.csv`, `X_test.csv`, `y_train.csv` and `y_test.csv`.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::WriteCsv`] if any file cannot be written.
    #[instrument(skip_all, fields(dir = %self.dir.display()))]
    pub fn write(&self, result: &PreprocessResult, target: &str) -> Result<(), IoError> {
        self.write_half(&result.train, X_TRAIN, Y_TRAIN, target)?;
        self.write_half(&result.test, X_TEST, Y_TEST, target)?;
        info!(
            n_train = result.train.n_rows(),
            n_test = result.test.n_rows(),
            n_features = result.train.n_columns(),
            "processed data written"
        );
        Ok(())
    }

    fn write_half(&self, table: &Table, x_file: &str, y_file: &str, target: &str) -> Result<(), IoError> {
        let x_path = self.dir.join(x_file);
        write_csv(&x_path, table.columns(), table.rows())?;
        let y_path = self.dir.join(y_file);
        let labels: Vec<[usize; 1]> = table.labels().iter().map(|&l| [l]).collect();
        write_csv(&y_path, &[target], &labels)
    }
}

fn write_csv<H, R>(path: &Path, header: &[H], rows: &[R]) -> Result<(), IoError>
where
    H: AsRef<str>,
    R: Serialize,
{
    let csv_error = |source| IoError::WriteCsv {
        path: path.to_path_buf(),
        source,
    };
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(csv_error)?;
    wtr.write_record(header.iter().map(|h| -> &str { h.as_ref() }))
        .map_err(csv_error)?;
    for row in rows {
        wtr.serialize(row).map_err(csv_error)?;
    }
    wtr.flush().map_err(|source| IoError::WriteFile {
        path: path.to_path_buf(),
        source,
    })
}

#[derive(Serialize)]
struct ImportanceArtifact<'a> {
    n_trees: usize,
    features: &'a [RankedFeature],
}

/// Writes the model blob, feature importances, and test metrics.
///
/// `model.bin` and `feature_importances.json` go to the model directory,
/// `metrics.json` to the metrics directory.
pub struct ArtifactWriter {
    model_dir: PathBuf,
    metrics_dir: PathBuf,
}

impl ArtifactWriter {
    /// Create a writer, creating both directories if needed.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::OutputDirCreate`] if a directory cannot be created.
    #[instrument(skip_all, fields(model_dir = %model_dir.display(), metrics_dir = %metrics_dir.display()))]
    pub fn new(model_dir: &Path, metrics_dir: &Path) -> Result<Self, IoError> {
        create_dir(model_dir)?;
        create_dir(metrics_dir)?;
        Ok(Self {
            model_dir: model_dir.to_path_buf(),
            metrics_dir: metrics_dir.to_path_buf(),
        })
    }

    /// Save the forest to `model.bin` and return its path.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::SaveModel`] if encoding or writing fails.
    pub fn write_model(&self, forest: &RandomForest) -> Result<PathBuf, IoError> {
        let path = self.model_dir.join(MODEL_FILE);
        forest.save(&path).map_err(|source| IoError::SaveModel {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }

    /// Write ranked importances to `feature_importances.json` and return its path.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::EncodeJson`] or [`IoError::WriteFile`] on failure.
    pub fn write_importances(&self, n_trees: usize, features: &[RankedFeature]) -> Result<PathBuf, IoError> {
        let path = self.model_dir.join(IMPORTANCES_FILE);
        write_json(&path, &ImportanceArtifact { n_trees, features })?;
        info!(path = %path.display(), "feature importances written");
        Ok(path)
    }

    /// Write the five test metrics to `metrics.json` and return its path.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::EncodeJson`] or [`IoError::WriteFile`] on failure.
    pub fn write_metrics(&self, report: &MetricsReport) -> Result<PathBuf, IoError> {
        let path = self.metrics_dir.join(METRICS_FILE);
        write_json(&path, report)?;
        info!(path = %path.display(), "metrics written");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn csv_floats_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("x.csv");
        let rows = vec![vec![0.1, -1.0 / 3.0], vec![1e-12, 250.0]];
        write_csv(&path, &["a", "b"], &rows).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(lines.next(), Some("a,b"));
        let parsed: Vec<Vec<f64>> = lines
            .map(|l| l.split(',').map(|v| v.parse().unwrap()).collect())
            .collect();
        assert_eq!(parsed, rows);
    }

    #[test]
    fn metrics_file_has_five_keys() {
        let dir = TempDir::new().unwrap();
        let writer = ArtifactWriter::new(&dir.path().join("models"), &dir.path().join("metrics")).unwrap();
        let report = MetricsReport {
            accuracy: 0.8,
            precision: 0.75,
            recall: 0.9,
            f1: 0.818,
            roc_auc: 0.88,
        };
        let path = writer.write_metrics(&report).unwrap();
        let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        let obj = value.as_object().unwrap();
        assert_eq!(obj.len(), 5);
        assert_eq!(obj["recall"], 0.9);
    }

    #[test]
    fn directories_are_created() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a").join("b");
        ProcessedWriter::new(&nested).unwrap();
        assert!(nested.is_dir());
    }
}
