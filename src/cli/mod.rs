//! tabprep CLI Module
//!
//! Command-line interface for the transformation stage and for reusing a
//! persisted preprocessor on new data.

use chrono::Local;
use clap::{Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::artifact::DataValidationArtifact;
use crate::config::{DataTransformationConfig, TrainingPipelineConfig, TransformationParams};
use crate::constants::{ARTIFACT_DIR, LABEL_SENTINEL, SKEW_THRESHOLD};
use crate::persistence::{load_object, save_array};
use crate::preprocessing::{ColumnProfiler, FittedColumnTransformer, LabelEncoder, TargetNormalizer};
use crate::transformation::{stack_label, DataTransformation};
use crate::utils::DataLoader;

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString   { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }

fn kv(key: &str, val: &str) -> String {
    format!("{} {}", muted(key), val.white())
}

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "tabprep")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Feature and label transformation stage for tabular training pipelines")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fit on train, apply to train and test, persist everything
    Transform {
        /// Validated training CSV
        #[arg(long, requires = "test", conflicts_with = "validation_artifact")]
        train: Option<PathBuf>,

        /// Validated test CSV
        #[arg(long, requires = "train")]
        test: Option<PathBuf>,

        /// JSON artifact written by the validation stage
        #[arg(long)]
        validation_artifact: Option<PathBuf>,

        /// JSON file with transformation parameters
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Label column (overrides the config)
        #[arg(short, long)]
        target: Option<String>,

        /// Root directory of the timestamped run directories
        #[arg(long, default_value = ARTIFACT_DIR)]
        artifact_root: PathBuf,

        /// Directory receiving the serving copies (overrides the config)
        #[arg(long)]
        final_model_dir: Option<PathBuf>,
    },

    /// Show how each feature column would be treated
    Profile {
        /// Input CSV
        #[arg(short, long)]
        data: PathBuf,

        /// Label column, excluded from profiling
        #[arg(short, long)]
        target: Option<String>,

        /// |skewness| above this marks a column as skewed
        #[arg(long, default_value_t = SKEW_THRESHOLD)]
        skew_threshold: f64,
    },

    /// Describe a persisted preprocessor
    Inspect {
        /// Persisted preprocessor
        #[arg(short, long)]
        preprocessor: PathBuf,
    },

    /// Apply a persisted preprocessor to new data
    Apply {
        /// Persisted preprocessor
        #[arg(short, long)]
        preprocessor: PathBuf,

        /// Input CSV
        #[arg(short, long)]
        data: PathBuf,

        /// Output array file
        #[arg(short, long)]
        output: PathBuf,

        /// Label column; appended as the last output column when given
        #[arg(short, long)]
        target: Option<String>,

        /// Persisted label encoder for non-numeric labels
        #[arg(long, requires = "target")]
        label_encoder: Option<PathBuf>,
    },
}

// ─── Commands ──────────────────────────────────────────────────────────────────

pub fn cmd_transform(
    train: Option<&Path>,
    test: Option<&Path>,
    validation_artifact: Option<&Path>,
    config: Option<&Path>,
    target: Option<&str>,
    artifact_root: &Path,
    final_model_dir: Option<&Path>,
) -> anyhow::Result<()> {
    section("Transform");

    let validation = match (validation_artifact, train, test) {
        (Some(path), _, _) => DataValidationArtifact::load(path)?,
        (None, Some(train), Some(test)) => DataValidationArtifact::new(train, test),
        _ => anyhow::bail!("either --validation-artifact or both --train and --test are required"),
    };

    let mut params = match config {
        Some(path) => TransformationParams::load(path)?,
        None => TransformationParams::default(),
    };
    if let Some(target) = target {
        params = params.with_target_column(target);
    }
    if let Some(dir) = final_model_dir {
        params = params.with_final_model_dir(dir);
    }

    let pipeline = TrainingPipelineConfig::new(artifact_root, Local::now());
    println!("  {}", kv("Run", &pipeline.artifact_dir.display().to_string()));
    println!("  {}", kv("Target", &params.target_column));

    step_run("Fitting and applying");
    let start = Instant::now();
    let stage = DataTransformation::new(validation, DataTransformationConfig::new(&pipeline, params))?;
    let artifact = stage.run()?;
    step_done(&format!("{:?}", start.elapsed()));

    println!();
    println!("{}", artifact.to_json()?);
    Ok(())
}

pub fn cmd_profile(data: &Path, target: Option<&str>, skew_threshold: f64) -> anyhow::Result<()> {
    section("Profile");

    step_run("Loading data");
    let mut df = DataLoader::new().load_csv(data)?;
    step_done(&format!("{} rows × {} cols", df.height(), df.width()));

    if let Some(target) = target {
        if df.column(target).is_ok() {
            df = df.drop(target)?;
        }
    }

    let profile = ColumnProfiler::new(skew_threshold).profile(&df)?;
    println!();
    println!("  {:<28} {:>12} {:>10} {:>8}", muted("Column"), muted("Group"), muted("Skew"), muted("Nulls"));
    println!("  {}", dim(&"─".repeat(62)));
    for column in profile.columns() {
        let skew = column
            .skewness
            .map(|s| format!("{s:.3}"))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {:<28} {:>12} {:>10} {:>8}",
            column.name,
            column.role.to_string().cyan(),
            skew,
            column.null_count
        );
    }
    println!();
    Ok(())
}

pub fn cmd_inspect(preprocessor: &Path) -> anyhow::Result<()> {
    section("Inspect");

    let fitted: FittedColumnTransformer = load_object(preprocessor)?;
    for group in fitted.groups() {
        let steps: Vec<&str> = group.steps.iter().map(|s| s.name()).collect();
        println!("  {} {}", group.name.white().bold(), dim(&steps.join(" → ")));
        println!("    {}", kv("columns", &group.columns.join(", ")));
    }
    println!();
    println!("  {}", kv("Output features", &fitted.n_features_out().to_string()));
    for name in fitted.feature_names_out() {
        println!("    {}", dim(&name));
    }
    println!();
    Ok(())
}

pub fn cmd_apply(
    preprocessor: &Path,
    data: &Path,
    output: &Path,
    target: Option<&str>,
    label_encoder: Option<&Path>,
) -> anyhow::Result<()> {
    section("Apply");

    let fitted: FittedColumnTransformer = load_object(preprocessor)?;

    step_run("Loading data");
    let df = DataLoader::new().load_csv(data)?;
    step_done(&format!("{} rows × {} cols", df.height(), df.width()));

    step_run("Transforming");
    let start = Instant::now();
    let features = fitted.transform(&df)?.into_dense();
    let array = match target {
        Some(column) => {
            let encoder: Option<LabelEncoder> = match label_encoder {
                Some(path) => Some(load_object(path)?),
                None => None,
            };
            let normalizer = TargetNormalizer::new(column, LABEL_SENTINEL);
            let label = normalizer.transform(&df, encoder.as_ref())?;
            stack_label(features, &label)?
        }
        None => features,
    };
    step_done(&format!("{:?}", start.elapsed()));

    save_array(output, &array)?;
    println!("  {} {}", ok("✓"), kv("Saved", &format!("{} ({} × {})", output.display(), array.nrows(), array.ncols())));
    println!();
    Ok(())
}
