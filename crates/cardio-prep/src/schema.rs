//! Explicit record schema for the raw heart dataset.

use std::fmt;

/// Semantic type of a raw feature field.
///
/// Both kinds are stored as `f64`; categorical fields hold integer codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// A measured quantity (age, blood pressure, ...).
    Continuous,
    /// An integer-coded category (sex, chest pain type, ...).
    Categorical,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Continuous => f.write_str("continuous"),
            FieldKind::Categorical => f.write_str("categorical"),
        }
    }
}

/// One named field of the schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    name: String,
    kind: FieldKind,
}

impl FieldSpec {
    /// Create a field with the given name and kind.
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    /// Return the field name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Return the semantic kind.
    #[must_use]
    pub fn kind(&self) -> FieldKind {
        self.kind
    }
}

/// Ordered list of feature fields plus the binary target column.
///
/// The loader checks a raw header against this once; everything downstream
/// addresses columns through [`Table`](crate::Table) lookups that fail fast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    fields: Vec<FieldSpec>,
    target: String,
}

impl Schema {
    /// Create a schema from feature fields (in column order) and a target name.
    pub fn new(fields: Vec<FieldSpec>, target: impl Into<String>) -> Self {
        Self {
            fields,
            target: target.into(),
        }
    }

    /// The heart-attack risk dataset layout (`heart.csv`).
    ///
    /// | Field      | Kind        | Meaning                          |
    /// |------------|-------------|----------------------------------|
    /// | `age`      | continuous  | age in years                     |
    /// | `sex`      | categorical | 0 = female, 1 = male             |
    /// | `cp`       | categorical | chest pain type                  |
    /// | `trtbps`   | continuous  | resting blood pressure (mm Hg)   |
    /// | `chol`     | continuous  | serum cholesterol (mg/dl)        |
    /// | `fbs`      | categorical | fasting blood sugar > 120 mg/dl  |
    /// | `restecg`  | categorical | resting ECG result               |
    /// | `thalachh` | continuous  | maximum heart rate achieved      |
    /// | `exng`     | categorical | exercise induced angina          |
    /// | `oldpeak`  | continuous  | ST depression                    |
    /// | `slp`      | categorical | slope of peak exercise ST        |
    /// | `caa`      | categorical | number of major vessels          |
    /// | `thall`    | categorical | thalassemia code                 |
    ///
    /// Target: `output` (0/1).
    #[must_use]
    pub fn heart() -> Self {
        use FieldKind::{Categorical, Continuous};
        let fields = [
            ("age", Continuous),
            ("sex", Categorical),
            ("cp", Categorical),
            ("trtbps", Continuous),
            ("chol", Continuous),
            ("fbs", Categorical),
            ("restecg", Categorical),
            ("thalachh", Continuous),
            ("exng", Categorical),
            ("oldpeak", Continuous),
            ("slp", Categorical),
            ("caa", Categorical),
            ("thall", Categorical),
        ]
        .into_iter()
        .map(|(name, kind)| FieldSpec::new(name, kind))
        .collect();
        Self::new(fields, "output")
    }

    /// Return the feature fields in column order.
    #[must_use]
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Return the feature field names in column order.
    #[must_use]
    pub fn field_names(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.name.clone()).collect()
    }

    /// Return the target column name.
    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Return the position of a feature field, if present.
    #[must_use]
    pub fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Return the names of all continuous fields.
    #[must_use]
    pub fn continuous_fields(&self) -> Vec<String> {
        self.fields
            .iter()
            .filter(|f| f.kind() == FieldKind::Continuous)
            .map(|f| f.name().to_string())
            .collect()
    }
}
