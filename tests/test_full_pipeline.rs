//! End-to-end tests for the transformation stage: CSV in, persisted arrays and
//! fitted objects out

use ndarray::s;
use polars::prelude::*;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tabprep::artifact::DataValidationArtifact;
use tabprep::config::{DataTransformationConfig, TrainingPipelineConfig, TransformationParams};
use tabprep::error::TabprepError;
use tabprep::persistence::{load_array, load_object};
use tabprep::preprocessing::{FittedColumnTransformer, LabelEncoder};
use tabprep::transformation::DataTransformation;
use tabprep::utils::DataLoader;

// ============================================================================
// Helpers
// ============================================================================

const PROTOCOLS: [&str; 3] = ["tcp", "udp", "icmp"];

/// Deterministic network-traffic-like table: one regular numeric column, one
/// heavily skewed numeric column, one categorical column and a -1/1 label
fn traffic_csv(n_rows: usize, offset: usize, unseen_protocol_row: Option<usize>) -> String {
    let mut csv = String::from("duration,bytes,protocol,Result\n");
    for i in 0..n_rows {
        let k = i + offset;
        let duration = if k % 11 == 5 {
            String::new()
        } else {
            format!("{}", k as f64 * 1.5 + (k % 3) as f64)
        };
        let bytes = if k % 13 == 9 {
            "NA".to_string()
        } else {
            format!("{:.4}", (k as f64 / 5.0).exp())
        };
        let protocol = match unseen_protocol_row {
            Some(row) if row == i => "gre",
            _ if k % 17 == 7 => "na",
            _ => PROTOCOLS[k % 3],
        };
        let label = if k % 2 == 0 { -1 } else { 1 };
        writeln!(csv, "{duration},{bytes},{protocol},{label}").unwrap();
    }
    csv
}

fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

fn stage(root: &Path, train: &Path, test: &Path) -> DataTransformation {
    let pipeline = TrainingPipelineConfig::new(root.join("Artifacts"), chrono::Local::now());
    let params = TransformationParams::default().with_final_model_dir(root.join("final_model"));
    DataTransformation::new(
        DataValidationArtifact::new(train, test),
        DataTransformationConfig::new(&pipeline, params),
    )
    .unwrap()
}

// ============================================================================
// Full run
// ============================================================================

#[test]
fn test_run_persists_arrays_and_objects() {
    let dir = tempfile::tempdir().unwrap();
    let train = write_file(dir.path(), "train.csv", &traffic_csv(40, 0, None));
    let test = write_file(dir.path(), "test.csv", &traffic_csv(12, 40, None));

    let stage = stage(dir.path(), &train, &test);
    let artifact = stage.run().unwrap();

    assert!(artifact.transformed_train_file_path.exists());
    assert!(artifact.transformed_test_file_path.exists());
    assert!(artifact.transformed_object_file_path.exists());
    assert!(stage.config().final_preprocessor_path().exists());
    // numeric label, nothing to encode
    assert!(artifact.label_encoder_file_path.is_none());

    let train_arr = load_array(&artifact.transformed_train_file_path).unwrap();
    let test_arr = load_array(&artifact.transformed_test_file_path).unwrap();

    // 1 skewed + 1 regular + 3 protocols + label
    assert_eq!(train_arr.dim(), (40, 6));
    assert_eq!(test_arr.dim(), (12, 6));
    assert!(train_arr.iter().all(|v| v.is_finite()));
    assert!(test_arr.iter().all(|v| v.is_finite()));

    // label is the last column with -1 remapped to 0
    let labels: Vec<f64> = train_arr.column(5).to_vec();
    assert!(labels.iter().all(|&v| v == 0.0 || v == 1.0));
    assert_eq!(labels[0], 0.0);
    assert_eq!(labels[1], 1.0);
}

#[test]
fn test_persisted_preprocessor_reproduces_output() {
    let dir = tempfile::tempdir().unwrap();
    let train = write_file(dir.path(), "train.csv", &traffic_csv(40, 0, None));
    let test = write_file(dir.path(), "test.csv", &traffic_csv(12, 40, Some(3)));

    let stage = stage(dir.path(), &train, &test);
    let artifact = stage.run().unwrap();

    for path in [
        artifact.transformed_object_file_path.clone(),
        stage.config().final_preprocessor_path(),
    ] {
        let preprocessor: FittedColumnTransformer = load_object(&path).unwrap();
        let test_df = DataLoader::new().load_csv(&test).unwrap();
        let reapplied = preprocessor.transform(&test_df).unwrap().into_dense();

        let persisted = load_array(&artifact.transformed_test_file_path).unwrap();
        let n_features = persisted.ncols() - 1;
        assert_eq!(reapplied, persisted.slice(s![.., ..n_features]).to_owned());
    }
}

#[test]
fn test_output_width_matches_feature_names() {
    let dir = tempfile::tempdir().unwrap();
    let train_df = DataLoader::new()
        .load_csv(write_file(dir.path(), "train.csv", &traffic_csv(40, 0, None)))
        .unwrap();
    let test_df = DataLoader::new()
        .load_csv(write_file(dir.path(), "test.csv", &traffic_csv(12, 40, None)))
        .unwrap();

    let stage = stage(dir.path(), Path::new("unused"), Path::new("unused"));
    let data = stage.fit_apply(&train_df, &test_df).unwrap();

    let names = data.preprocessor.feature_names_out();
    assert_eq!(
        names,
        vec![
            "num_skewed__bytes",
            "num_regular__duration",
            "cat__protocol_icmp",
            "cat__protocol_tcp",
            "cat__protocol_udp",
        ]
    );
    assert_eq!(data.train.ncols(), names.len() + 1);
    assert_eq!(data.test.ncols(), names.len() + 1);
}

// ============================================================================
// Properties
// ============================================================================

#[test]
fn test_fit_never_sees_test_data() {
    let dir = tempfile::tempdir().unwrap();
    let train_df = DataLoader::new()
        .load_csv(write_file(dir.path(), "train.csv", &traffic_csv(40, 0, None)))
        .unwrap();
    let test_a = DataLoader::new()
        .load_csv(write_file(dir.path(), "a.csv", &traffic_csv(12, 40, None)))
        .unwrap();
    let test_b = DataLoader::new()
        .load_csv(write_file(dir.path(), "b.csv", &traffic_csv(25, 500, Some(0))))
        .unwrap();

    let stage = stage(dir.path(), Path::new("unused"), Path::new("unused"));
    let with_a = stage.fit_apply(&train_df, &test_a).unwrap();
    let with_b = stage.fit_apply(&train_df, &test_b).unwrap();

    assert_eq!(with_a.train, with_b.train);
    assert_eq!(with_a.preprocessor.profile(), with_b.preprocessor.profile());
    assert_eq!(
        with_a.preprocessor.feature_names_out(),
        with_b.preprocessor.feature_names_out()
    );
}

#[test]
fn test_apply_is_deterministic() {
    let dir = tempfile::tempdir().unwrap();
    let train_df = DataLoader::new()
        .load_csv(write_file(dir.path(), "train.csv", &traffic_csv(40, 0, None)))
        .unwrap();
    let stage = stage(dir.path(), Path::new("unused"), Path::new("unused"));
    let data = stage.fit_apply(&train_df, &train_df).unwrap();

    let features = train_df.drop("Result").unwrap();
    let first = data.preprocessor.transform(&features).unwrap();
    let second = data.preprocessor.transform(&features).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_unseen_category_row_is_all_zero() {
    let dir = tempfile::tempdir().unwrap();
    let train_df = DataLoader::new()
        .load_csv(write_file(dir.path(), "train.csv", &traffic_csv(40, 0, None)))
        .unwrap();
    let test_df = DataLoader::new()
        .load_csv(write_file(dir.path(), "test.csv", &traffic_csv(12, 40, Some(4))))
        .unwrap();

    let stage = stage(dir.path(), Path::new("unused"), Path::new("unused"));
    let data = stage.fit_apply(&train_df, &test_df).unwrap();

    // protocol block sits between the numeric columns and the label
    let protocol_block = data.test.slice(s![4, 2..5]).to_vec();
    assert_eq!(protocol_block, vec![0.0, 0.0, 0.0]);
    // other rows keep exactly one active protocol
    let other = data.test.slice(s![5, 2..5]).sum();
    assert_eq!(other, 1.0);
}

#[test]
fn test_unseen_test_label() {
    let dir = tempfile::tempdir().unwrap();
    let train = df!(
        "duration" => &[1.0, 2.0, 3.0, 4.0],
        "Result" => &["benign", "phishing", "benign", "phishing"],
    )
    .unwrap();
    let test = df!(
        "duration" => &[2.0, 3.0],
        "Result" => &["benign", "malware"],
    )
    .unwrap();

    let stage = stage(dir.path(), Path::new("unused"), Path::new("unused"));
    let err = stage.fit_apply(&train, &test).unwrap_err();
    assert!(matches!(err, TabprepError::UnseenLabel { ref label } if label == "malware"));
}

#[test]
fn test_string_labels_persist_encoder() {
    let dir = tempfile::tempdir().unwrap();
    let train = write_file(
        dir.path(),
        "train.csv",
        "duration,Result\n1.0,benign\n2.0,phishing\n3.0,benign\n4.0,phishing\n",
    );
    let test = write_file(dir.path(), "test.csv", "duration,Result\n2.5,phishing\n");

    let artifact = stage(dir.path(), &train, &test).run().unwrap();
    let encoder_path = artifact.label_encoder_file_path.expect("encoder persisted");
    let encoder: LabelEncoder = load_object(&encoder_path).unwrap();
    assert_eq!(encoder.classes(), &["benign", "phishing"]);

    let test_arr = load_array(&artifact.transformed_test_file_path).unwrap();
    assert_eq!(test_arr[[0, 1]], 1.0);
}

#[test]
fn test_label_only_frame() {
    let dir = tempfile::tempdir().unwrap();
    let train = df!("Result" => &[-1i64, 1, -1, 1]).unwrap();
    let test = df!("Result" => &[1i64]).unwrap();

    let stage = stage(dir.path(), Path::new("unused"), Path::new("unused"));
    assert!(matches!(
        stage.fit_apply(&train, &test),
        Err(TabprepError::NoFeatureColumns)
    ));
}

#[test]
fn test_missing_target_in_test_file() {
    let dir = tempfile::tempdir().unwrap();
    let train = write_file(dir.path(), "train.csv", &traffic_csv(20, 0, None));
    let test = write_file(dir.path(), "test.csv", "duration,bytes,protocol\n1.0,2.0,tcp\n");

    let err = stage(dir.path(), &train, &test).run().unwrap_err();
    assert!(matches!(
        err,
        TabprepError::MissingTargetColumn { frame: "test", .. }
    ));
}

#[test]
fn test_missing_input_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.csv");
    let err = stage(dir.path(), &missing, &missing).run().unwrap_err();
    assert!(matches!(err, TabprepError::DataError(_)));
}
