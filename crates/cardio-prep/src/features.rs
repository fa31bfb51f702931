//! Derived clinical risk features.

use tracing::{info, instrument};

use crate::error::PrepError;
use crate::table::Table;

/// Names of the derived columns, in the order they are appended.
pub const DERIVED_COLUMNS: [&str; 5] = ["age_group", "high_chol", "high_bp", "hr_reserve", "risk_score"];

/// Upper edges of the age bins `(0,40], (40,55], (55,70], (70,100]`.
const AGE_BIN_EDGES: [f64; 4] = [40.0, 55.0, 70.0, 100.0];

const HIGH_CHOL_THRESHOLD: f64 = 240.0;
const HIGH_BP_THRESHOLD: f64 = 140.0;
const ST_DEPRESSION_THRESHOLD: f64 = 1.0;

/// Map an age to its bin code 0..=3, or `None` outside `(0, 100]`.
#[must_use]
pub fn age_group(age: f64) -> Option<u8> {
    if age.is_nan() || age <= 0.0 {
        return None;
    }
    AGE_BIN_EDGES
        .iter()
        .position(|&edge| age <= edge)
        .map(|bin| bin as u8)
}

/// Appends the derived risk columns to a table.
///
/// Column-additive only: the row count never changes. The source column
/// names default to the heart schema.
#[derive(Debug, Clone)]
pub struct FeatureEngineer {
    age: String,
    cholesterol: String,
    resting_bp: String,
    max_heart_rate: String,
    st_depression: String,
}

impl FeatureEngineer {
    /// Create an engineer reading `age`, `chol`, `trtbps`, `thalachh` and `oldpeak`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            age: "age".into(),
            cholesterol: "chol".into(),
            resting_bp: "trtbps".into(),
            max_heart_rate: "thalachh".into(),
            st_depression: "oldpeak".into(),
        }
    }

    /// Append the five derived columns to `table`.
    ///
    /// All values are computed before any column is added, so on error the
    /// table is left unchanged.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`PrepError::MissingColumn`] | a source column is absent |
    /// | [`PrepError::AgeOutOfRange`] | an age lies outside `(0, 100]` |
    /// | [`PrepError::DuplicateColumn`] | a derived column already exists |
    #[instrument(skip_all, fields(n_rows = table.n_rows()))]
    pub fn engineer(&self, table: &mut Table) -> Result<(), PrepError> {
        const STAGE: &str = "engineer";
        for name in DERIVED_COLUMNS {
            if table.columns().iter().any(|c| c == name) {
                return Err(PrepError::DuplicateColumn {
                    column: name.to_string(),
                });
            }
        }

        let age = table.column_index(STAGE, &self.age)?;
        let chol = table.column_index(STAGE, &self.cholesterol)?;
        let bp = table.column_index(STAGE, &self.resting_bp)?;
        let max_hr = table.column_index(STAGE, &self.max_heart_rate)?;
        let st = table.column_index(STAGE, &self.st_depression)?;

        let n = table.n_rows();
        let mut derived: [Vec<f64>; 5] = std::array::from_fn(|_| Vec::with_capacity(n));

        for (row, &row_id) in table.rows().iter().zip(table.row_ids()) {
            let group = age_group(row[age]).ok_or(PrepError::AgeOutOfRange {
                row_id,
                age: row[age],
            })?;
            let high_chol = u8::from(row[chol] > HIGH_CHOL_THRESHOLD);
            let high_bp = u8::from(row[bp] > HIGH_BP_THRESHOLD);
            let st_flag = u8::from(row[st] > ST_DEPRESSION_THRESHOLD);

            derived[0].push(f64::from(group));
            derived[1].push(f64::from(high_chol));
            derived[2].push(f64::from(high_bp));
            derived[3].push(row[max_hr] - row[age]);
            derived[4].push(f64::from(high_chol + high_bp + st_flag));
        }

        for (name, values) in DERIVED_COLUMNS.iter().zip(derived) {
            table.push_column(name, values)?;
        }

        info!(n_rows = n, n_columns = table.n_columns(), "derived features added");
        Ok(())
    }
}

impl Default for FeatureEngineer {
    fn default() -> Self {
        Self::new()
    }
}
