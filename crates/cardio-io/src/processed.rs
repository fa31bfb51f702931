//! Processed train/test matrices as written by the preprocess stage.

use std::path::{Path, PathBuf};

use tracing::{info, instrument};

use crate::IoError;
use crate::reader::{CsvRecords, parse_label, parse_value, read_records};

/// Feature matrix file name for the train half.
pub const X_TRAIN: &str = "X_train.csv";
/// Feature matrix file name for the test half.
pub const X_TEST: &str = "X_test.csv";
/// Label file name for the train half.
pub const Y_TRAIN: &str = "y_train.csv";
/// Label file name for the test half.
pub const Y_TEST: &str = "y_test.csv";

/// Scaled feature matrices and labels for both halves.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedData {
    /// Column names shared by both matrices.
    pub feature_names: Vec<String>,
    /// Train rows.
    pub train_x: Vec<Vec<f64>>,
    /// Train labels.
    pub train_y: Vec<usize>,
    /// Test rows.
    pub test_x: Vec<Vec<f64>>,
    /// Test labels.
    pub test_y: Vec<usize>,
}

/// Reads `X_train.csv`, `X_test.csv`, `y_train.csv` and `y_test.csv` from one directory.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::FileNotFound`] | A file is missing or unreadable |
/// | [`IoError::CsvParse`] | Malformed CSV record |
/// | [`IoError::EmptyDataset`] | A file has no data rows |
/// | [`IoError::InconsistentRowLength`] | Ragged row |
/// | [`IoError::NonFiniteValue`] | Feature cell is not a finite float |
/// | [`IoError::InvalidLabel`] | Label cell is not 0 or 1 |
/// | [`IoError::UnexpectedColumn`] | A label file has more than one column |
/// | [`IoError::HeaderMismatch`] | Train and test matrices differ in columns |
/// | [`IoError::RowCountMismatch`] | Matrix and label file differ in length |
pub struct ProcessedReader {
    dir: PathBuf,
}

impl ProcessedReader {
    /// Create a reader for the given processed directory.
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
        }
    }

    /// Read and cross-check all four files.
    #[instrument(skip(self), fields(dir = %self.dir.display()))]
    pub fn read(&self) -> Result<ProcessedData, IoError> {
        let (feature_names, train_x) = read_matrix(&self.dir.join(X_TRAIN))?;
        let (test_names, test_x) = read_matrix(&self.dir.join(X_TEST))?;
        if test_names != feature_names {
            return Err(IoError::HeaderMismatch {
                path: self.dir.join(X_TEST),
                reference: self.dir.join(X_TRAIN),
            });
        }
        let train_y = self.read_labels(Y_TRAIN, X_TRAIN, train_x.len())?;
        let test_y = self.read_labels(Y_TEST, X_TEST, test_x.len())?;

        info!(
            n_features = feature_names.len(),
            n_train = train_x.len(),
            n_test = test_x.len(),
            "processed data loaded"
        );
        Ok(ProcessedData {
            feature_names,
            train_x,
            train_y,
            test_x,
            test_y,
        })
    }

    fn read_labels(&self, file: &str, matrix_file: &str, expected: usize) -> Result<Vec<usize>, IoError> {
        let path = self.dir.join(file);
        let labels = read_label_column(&path)?;
        if labels.len() != expected {
            return Err(IoError::RowCountMismatch {
                features_path: self.dir.join(matrix_file),
                features: expected,
                labels_path: path,
                labels: labels.len(),
            });
        }
        Ok(labels)
    }
}

fn read_matrix(path: &Path) -> Result<(Vec<String>, Vec<Vec<f64>>), IoError> {
    let CsvRecords { header, records } = read_records(path)?;
    let rows = records
        .iter()
        .enumerate()
        .map(|(row_index, record)| {
            header
                .iter()
                .zip(record.iter())
                .map(|(column, raw)| parse_value(path, row_index, column, raw))
                .collect::<Result<Vec<f64>, _>>()
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok((header, rows))
}

fn read_label_column(path: &Path) -> Result<Vec<usize>, IoError> {
    let CsvRecords { header, records } = read_records(path)?;
    if let Some(extra) = header.get(1) {
        return Err(IoError::UnexpectedColumn {
            path: path.to_path_buf(),
            column: extra.clone(),
        });
    }
    records
        .iter()
        .enumerate()
        .map(|(row_index, record)| parse_label(path, row_index, &record[0]))
        .collect()
}
