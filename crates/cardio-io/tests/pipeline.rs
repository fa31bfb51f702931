use std::fs;
use std::path::{Path, PathBuf};

use cardio_io::{
    ArtifactWriter, IMPORTANCES_FILE, IoError, METRICS_FILE, MODEL_FILE, Params, ProcessedReader,
    ProcessedWriter, RawTableReader, X_TEST, X_TRAIN, Y_TEST, Y_TRAIN,
};
use cardio_prep::{DERIVED_COLUMNS, Schema};
use cardio_rf::RandomForest;
use tempfile::TempDir;

const PARAMS: &str = "\
preprocess:
  test_size: 0.2
  random_state: 42
train:
  n_estimators: 25
  max_depth: 6
  random_state: 7
";

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn write_params(dir: &Path, yaml: &str) -> PathBuf {
    let path = dir.join("params.yaml");
    fs::write(&path, yaml).unwrap();
    path
}

/// Run both stages into `root` and return the three artifact directories.
fn run_pipeline(root: &Path) -> (PathBuf, PathBuf, PathBuf) {
    let params = Params::from_path(&write_params(root, PARAMS)).unwrap();
    let processed = root.join("data/processed");
    let models = root.join("models");
    let metrics = root.join("metrics");

    let schema = Schema::heart();
    let target = schema.target().to_string();
    let table = RawTableReader::new(&fixture("heart_small.csv"), schema)
        .read()
        .unwrap();
    let prepared = params.preprocess_config().unwrap().fit(table).unwrap();
    ProcessedWriter::new(&processed)
        .unwrap()
        .write(&prepared, &target)
        .unwrap();

    let data = ProcessedReader::new(&processed).read().unwrap();
    let result = params
        .forest_config()
        .unwrap()
        .fit(&data.train_x, &data.train_y, &data.feature_names)
        .unwrap();
    let report = result.forest().evaluate(&data.test_x, &data.test_y).unwrap();

    let writer = ArtifactWriter::new(&models, &metrics).unwrap();
    writer.write_model(result.forest()).unwrap();
    writer
        .write_importances(result.forest().n_trees(), result.importances())
        .unwrap();
    writer.write_metrics(&report).unwrap();
    (processed, models, metrics)
}

#[test]
fn end_to_end_writes_every_artifact() {
    let dir = TempDir::new().unwrap();
    let (processed, models, metrics) = run_pipeline(dir.path());

    for file in [X_TRAIN, X_TEST, Y_TRAIN, Y_TEST] {
        assert!(processed.join(file).is_file(), "{file} missing");
    }
    assert!(models.join(MODEL_FILE).is_file());
    assert!(models.join(IMPORTANCES_FILE).is_file());

    let header = fs::read_to_string(processed.join(X_TRAIN)).unwrap();
    let header = header.lines().next().unwrap();
    let names: Vec<&str> = header.split(',').collect();
    assert_eq!(names.len(), 13 + DERIVED_COLUMNS.len());
    assert!(!names.contains(&"output"));
    assert!(names.contains(&"age_group"));

    let y_header = fs::read_to_string(processed.join(Y_TEST)).unwrap();
    assert_eq!(y_header.lines().next(), Some("output"));

    let value: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(metrics.join(METRICS_FILE)).unwrap()).unwrap();
    let obj = value.as_object().unwrap();
    let mut keys: Vec<&str> = obj.keys().map(String::as_str).collect();
    keys.sort_unstable();
    assert_eq!(keys, ["accuracy", "f1", "precision", "recall", "roc_auc"]);
    for (key, v) in obj {
        let v = v.as_f64().unwrap();
        assert!((0.0..=1.0).contains(&v), "{key} = {v}");
    }

    let importances: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(models.join(IMPORTANCES_FILE)).unwrap()).unwrap();
    assert_eq!(importances["n_trees"], 25);
    let features = importances["features"].as_array().unwrap();
    assert_eq!(features.len(), names.len());
    assert_eq!(features[0]["rank"], 1);
    let total: f64 = features.iter().map(|f| f["importance"].as_f64().unwrap()).sum();
    assert!((total - 1.0).abs() < 1e-9);
}

#[test]
fn processed_files_hold_a_stratified_split() {
    let dir = TempDir::new().unwrap();
    let (processed, _, _) = run_pipeline(dir.path());
    let data = ProcessedReader::new(&processed).read().unwrap();

    let n = data.train_y.len() + data.test_y.len();
    // One duplicate and at least one cholesterol outlier are gone.
    assert!(n <= 89, "{n} rows survived cleaning");
    let expected_test = (n as f64 * 0.2).round() as usize;
    assert!(data.test_y.len().abs_diff(expected_test) <= 1);
    assert!(data.test_y.contains(&0) && data.test_y.contains(&1));

    // Scaled on the train half: each train column has mean near zero.
    for col in 0..data.feature_names.len() {
        let mean = data.train_x.iter().map(|r| r[col]).sum::<f64>() / data.train_x.len() as f64;
        assert!(mean.abs() < 1e-9, "column {col} mean {mean}");
    }
}

#[test]
fn two_runs_are_byte_identical() {
    let first = TempDir::new().unwrap();
    let second = TempDir::new().unwrap();
    let a = run_pipeline(first.path());
    let b = run_pipeline(second.path());

    let pairs = [
        (a.0.join(X_TRAIN), b.0.join(X_TRAIN)),
        (a.0.join(X_TEST), b.0.join(X_TEST)),
        (a.0.join(Y_TRAIN), b.0.join(Y_TRAIN)),
        (a.0.join(Y_TEST), b.0.join(Y_TEST)),
        (a.1.join(MODEL_FILE), b.1.join(MODEL_FILE)),
        (a.1.join(IMPORTANCES_FILE), b.1.join(IMPORTANCES_FILE)),
        (a.2.join(METRICS_FILE), b.2.join(METRICS_FILE)),
    ];
    for (left, right) in pairs {
        assert_eq!(
            fs::read(&left).unwrap(),
            fs::read(&right).unwrap(),
            "{} differs between runs",
            left.display()
        );
    }
}

#[test]
fn saved_model_scores_like_the_trained_one() {
    let dir = TempDir::new().unwrap();
    let (processed, models, metrics) = run_pipeline(dir.path());
    let data = ProcessedReader::new(&processed).read().unwrap();

    let forest = RandomForest::load(models.join(MODEL_FILE)).unwrap();
    assert_eq!(forest.feature_names(), data.feature_names.as_slice());
    let report = forest.evaluate(&data.test_x, &data.test_y).unwrap();

    let written: cardio_rf::MetricsReport =
        serde_json::from_str(&fs::read_to_string(metrics.join(METRICS_FILE)).unwrap()).unwrap();
    assert_eq!(report, written);
}

#[test]
fn missing_column_fixture_is_rejected() {
    let err = RawTableReader::new(&fixture("missing_thall.csv"), Schema::heart())
        .read()
        .unwrap_err();
    assert!(matches!(err, IoError::MissingColumn { ref column, .. } if column == "thall"));
}

#[test]
fn bad_label_fixture_is_rejected() {
    let err = RawTableReader::new(&fixture("bad_label.csv"), Schema::heart())
        .read()
        .unwrap_err();
    assert!(matches!(err, IoError::InvalidLabel { row_index: 1, ref raw, .. } if raw == "yes"));
}

#[test]
fn params_file_errors() {
    let dir = TempDir::new().unwrap();

    let err = Params::from_path(&dir.path().join("absent.yaml")).unwrap_err();
    assert!(matches!(err, IoError::ReadParams { .. }));

    let path = write_params(dir.path(), "preprocess: [1, 2\n");
    assert!(matches!(Params::from_path(&path), Err(IoError::ParseParams { .. })));

    let path = write_params(dir.path(), &PARAMS.replace("test_size: 0.2", "test_size: 1.5"));
    let err = Params::from_path(&path).unwrap_err();
    assert!(matches!(err, IoError::InvalidParam { key: "preprocess.test_size", .. }));
}
