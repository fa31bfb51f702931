//! CSV loading with full input validation.

use std::path::{Path, PathBuf};

use cardio_prep::{Schema, Table};
use tracing::{debug, info, instrument};

use crate::IoError;

/// Header and data records of a CSV file, with row lengths already checked.
pub(crate) struct CsvRecords {
    pub(crate) header: Vec<String>,
    pub(crate) records: Vec<csv::StringRecord>,
}

/// Read a headed CSV file, rejecting ragged rows and files without data.
pub(crate) fn read_records(path: &Path) -> Result<CsvRecords, IoError> {
    let file = std::fs::File::open(path).map_err(|source| IoError::FileNotFound {
        path: path.to_path_buf(),
        source,
    })?;

    // flexible(true) lets our InconsistentRowLength check fire instead of a
    // low-level CsvParse error.
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let csv_error = |source: csv::Error| IoError::CsvParse {
        path: path.to_path_buf(),
        offset: source.position().map_or(0, |p| p.byte()),
        source,
    };

    let header: Vec<String> = rdr
        .headers()
        .map_err(csv_error)?
        .iter()
        .map(str::to_string)
        .collect();

    let mut records = Vec::new();
    for (row_index, result) in rdr.records().enumerate() {
        let record = result.map_err(csv_error)?;
        if record.len() != header.len() {
            return Err(IoError::InconsistentRowLength {
                path: path.to_path_buf(),
                row_index,
                expected: header.len(),
                got: record.len(),
            });
        }
        records.push(record);
    }

    if records.is_empty() {
        return Err(IoError::EmptyDataset {
            path: path.to_path_buf(),
        });
    }
    debug!(n_columns = header.len(), n_rows = records.len(), "CSV read");
    Ok(CsvRecords { header, records })
}

/// Parse a finite float cell.
pub(crate) fn parse_value(
    path: &Path,
    row_index: usize,
    column: &str,
    raw: &str,
) -> Result<f64, IoError> {
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(IoError::NonFiniteValue {
            path: path.to_path_buf(),
            row_index,
            column: column.to_string(),
            raw: raw.to_string(),
        }),
    }
}

/// Parse a binary label cell; `1`, `0`, `1.0` and `0.0` are accepted.
pub(crate) fn parse_label(path: &Path, row_index: usize, raw: &str) -> Result<usize, IoError> {
    match raw.parse::<f64>() {
        Ok(v) if v == 0.0 => Ok(0),
        Ok(v) if v == 1.0 => Ok(1),
        _ => Err(IoError::InvalidLabel {
            path: path.to_path_buf(),
            row_index,
            raw: raw.to_string(),
        }),
    }
}

/// Reads a raw patient table against a [`Schema`].
///
/// The header must contain every schema field and the target exactly once
/// and nothing else; column order in the file is free. The resulting
/// [`Table`] has schema column order and row ids equal to data-row
/// positions.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::FileNotFound`] | File doesn't exist or is unreadable |
/// | [`IoError::CsvParse`] | Malformed CSV record |
/// | [`IoError::EmptyDataset`] | Zero data rows after header |
/// | [`IoError::MissingColumn`] | A schema field or the target is absent |
/// | [`IoError::UnexpectedColumn`] | Header has an extra or repeated column |
/// | [`IoError::InconsistentRowLength`] | Row has different column count than header |
/// | [`IoError::NonFiniteValue`] | Feature cell is NaN, Inf, or unparseable |
/// | [`IoError::InvalidLabel`] | Target cell is not 0 or 1 |
pub struct RawTableReader {
    path: PathBuf,
    schema: Schema,
}

impl RawTableReader {
    /// Create a reader for `path` validated against `schema`.
    pub fn new(path: &Path, schema: Schema) -> Self {
        Self {
            path: path.to_path_buf(),
            schema,
        }
    }

    /// Map each schema field, then the target, to its position in `header`.
    fn resolve_header(&self, header: &[String]) -> Result<(Vec<usize>, usize), IoError> {
        let mut seen = vec![false; header.len()];
        let mut claim = |name: &str| -> Result<usize, IoError> {
            let pos = header
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| IoError::MissingColumn {
                    path: self.path.clone(),
                    column: name.to_string(),
                })?;
            seen[pos] = true;
            Ok(pos)
        };

        let feature_positions = self
            .schema
            .fields()
            .iter()
            .map(|f| claim(f.name()))
            .collect::<Result<Vec<_>, _>>()?;
        let target_position = claim(self.schema.target())?;

        if let Some(extra) = seen.iter().position(|&s| !s) {
            return Err(IoError::UnexpectedColumn {
                path: self.path.clone(),
                column: header[extra].clone(),
            });
        }
        Ok((feature_positions, target_position))
    }

    /// Read and validate the file.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn read(&self) -> Result<Table, IoError> {
        let CsvRecords { header, records } = read_records(&self.path)?;
        let (feature_positions, target_position) = self.resolve_header(&header)?;

        let mut rows = Vec::with_capacity(records.len());
        let mut labels = Vec::with_capacity(records.len());
        for (row_index, record) in records.iter().enumerate() {
            let row = feature_positions
                .iter()
                .map(|&pos| parse_value(&self.path, row_index, &header[pos], &record[pos]))
                .collect::<Result<Vec<f64>, _>>()?;
            rows.push(row);
            labels.push(parse_label(&self.path, row_index, &record[target_position])?);
        }

        let positives = labels.iter().filter(|&&l| l == 1).count();
        info!(
            n_rows = rows.len(),
            n_features = feature_positions.len(),
            positives,
            "raw table loaded"
        );

        Table::new(self.schema.field_names(), rows, labels).map_err(|source| IoError::Table {
            path: self.path.clone(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use cardio_prep::{FieldKind, FieldSpec};
    use tempfile::NamedTempFile;

    use super::*;

    fn write_csv(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f.flush().unwrap();
        f
    }

    fn small_schema() -> Schema {
        Schema::new(
            vec![
                FieldSpec::new("age", FieldKind::Continuous),
                FieldSpec::new("sex", FieldKind::Categorical),
            ],
            "output",
        )
    }

    fn read(content: &str) -> Result<Table, IoError> {
        let f = write_csv(content);
        RawTableReader::new(f.path(), small_schema()).read()
    }

    #[test]
    fn reads_in_schema_order() {
        let table = read("sex,output,age\n1,0,63\n0,1,41\n").unwrap();
        assert_eq!(table.columns(), &["age".to_string(), "sex".to_string()]);
        assert_eq!(table.rows(), &[vec![63.0, 1.0], vec![41.0, 0.0]]);
        assert_eq!(table.labels(), &[0, 1]);
        assert_eq!(table.row_ids(), &[0, 1]);
    }

    #[test]
    fn heart_header_is_accepted() {
        let header = "age,sex,cp,trtbps,chol,fbs,restecg,thalachh,exng,oldpeak,slp,caa,thall,output";
        let row = "63,1,3,145,233,1,0,150,0,2.3,0,0,1,1";
        let f = write_csv(&format!("{header}\n{row}\n"));
        let table = RawTableReader::new(f.path(), Schema::heart()).read().unwrap();
        assert_eq!(table.n_columns(), 13);
        assert!((table.rows()[0][9] - 2.3).abs() < 1e-12);
    }

    #[test]
    fn whitespace_is_trimmed() {
        let table = read("age, sex, output\n 50 , 1 , 1.0\n").unwrap();
        assert_eq!(table.rows()[0], vec![50.0, 1.0]);
        assert_eq!(table.labels(), &[1]);
    }

    #[test]
    fn error_missing_column() {
        let err = read("age,output\n50,1\n").unwrap_err();
        assert!(matches!(err, IoError::MissingColumn { ref column, .. } if column == "sex"));
    }

    #[test]
    fn error_missing_target() {
        let err = read("age,sex\n50,1\n").unwrap_err();
        assert!(matches!(err, IoError::MissingColumn { ref column, .. } if column == "output"));
    }

    #[test]
    fn error_unexpected_column() {
        let err = read("age,sex,bmi,output\n50,1,22.0,1\n").unwrap_err();
        assert!(matches!(err, IoError::UnexpectedColumn { ref column, .. } if column == "bmi"));
    }

    #[test]
    fn error_repeated_column() {
        let err = read("age,sex,age,output\n50,1,50,1\n").unwrap_err();
        assert!(matches!(err, IoError::UnexpectedColumn { ref column, .. } if column == "age"));
    }

    #[test]
    fn error_non_finite() {
        for raw in ["NaN", "inf", "abc", ""] {
            let err = read(&format!("age,sex,output\n{raw},1,0\n")).unwrap_err();
            assert!(matches!(err, IoError::NonFiniteValue { row_index: 0, .. }), "raw {raw:?}");
        }
    }

    #[test]
    fn error_invalid_label() {
        let err = read("age,sex,output\n50,1,0\n51,0,2\n").unwrap_err();
        assert!(matches!(err, IoError::InvalidLabel { row_index: 1, .. }));
    }

    #[test]
    fn error_inconsistent_row_length() {
        let err = read("age,sex,output\n50,1,0\n51,0\n").unwrap_err();
        assert!(matches!(err, IoError::InconsistentRowLength { row_index: 1, got: 2, .. }));
    }

    #[test]
    fn error_empty_dataset() {
        let err = read("age,sex,output\n").unwrap_err();
        assert!(matches!(err, IoError::EmptyDataset { .. }));
    }

    #[test]
    fn error_file_not_found() {
        let err = RawTableReader::new(Path::new("/nonexistent/heart.csv"), small_schema())
            .read()
            .unwrap_err();
        assert!(matches!(err, IoError::FileNotFound { .. }));
    }
}
