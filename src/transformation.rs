//! Data transformation stage: label normalisation, feature fit/apply and
//! persistence of the resulting matrices and fitted objects.

use crate::artifact::{DataTransformationArtifact, DataValidationArtifact};
use crate::config::DataTransformationConfig;
use crate::error::{Result, ResultExt};
use crate::persistence::{save_array, save_object};
use crate::preprocessing::{
    ColumnProfiler, FittedColumnTransformer, NormalizedTarget, PipelineBuilder, TargetNormalizer,
};
use crate::utils::DataLoader;
use ndarray::{concatenate, Array1, Array2, Axis};
use polars::prelude::*;
use std::time::Instant;
use tracing::{info, warn};

/// In-memory result of fitting on train and applying to both frames
#[derive(Debug, Clone)]
pub struct TransformedData {
    /// Transformed train features with the label as last column
    pub train: Array2<f64>,
    /// Transformed test features with the label as last column
    pub test: Array2<f64>,
    pub preprocessor: FittedColumnTransformer,
    pub target: NormalizedTarget,
}

/// Append `label` as the last column of `features`
pub fn stack_label(features: Array2<f64>, label: &Array1<f64>) -> Result<Array2<f64>> {
    let label = label.view().insert_axis(Axis(1));
    Ok(concatenate(Axis(1), &[features.view(), label])?)
}

/// The transformation stage of the training pipeline
pub struct DataTransformation {
    validation: DataValidationArtifact,
    config: DataTransformationConfig,
}

impl DataTransformation {
    pub fn new(validation: DataValidationArtifact, config: DataTransformationConfig) -> Result<Self> {
        config.params.validate()?;
        Ok(Self { validation, config })
    }

    pub fn config(&self) -> &DataTransformationConfig {
        &self.config
    }

    /// Fit on `train` and apply to both frames.
    ///
    /// Nothing derived from `test` reaches the fitted transformation.
    pub fn fit_apply(&self, train: &DataFrame, test: &DataFrame) -> Result<TransformedData> {
        let params = &self.config.params;
        let normalizer = TargetNormalizer::new(&params.target_column, params.label_sentinel);
        let target = normalizer.normalize(train, test)?;

        let train_x = train.drop(normalizer.column()).fit_context("features")?;
        let test_x = test.drop(normalizer.column()).apply_context("features")?;

        let profile = ColumnProfiler::new(params.skew_threshold)
            .profile(&train_x)
            .fit_context("profile")?;
        info!(
            skewed = profile.skewed().len(),
            regular = profile.regular().len(),
            categorical = profile.categorical().len(),
            "Profiled training features"
        );

        let preprocessor = PipelineBuilder::new()
            .with_knn(params.knn.clone())
            .with_sparse_threshold(params.sparse_threshold)
            .build(&profile)?
            .fit(&train_x)?;

        let train_t = preprocessor.transform(&train_x)?.into_dense();
        let test_t = preprocessor.transform(&test_x)?.into_dense();

        let train_arr = stack_label(train_t, &target.train).apply_context("train/label")?;
        let test_arr = stack_label(test_t, &target.test).apply_context("test/label")?;
        info!(
            train_shape = ?train_arr.dim(),
            test_shape = ?test_arr.dim(),
            "Transformed train and test features"
        );

        Ok(TransformedData {
            train: train_arr,
            test: test_arr,
            preprocessor,
            target,
        })
    }

    /// Run the stage end to end: load, fit/apply, persist
    pub fn run(&self) -> Result<DataTransformationArtifact> {
        let start = Instant::now();
        info!("Starting data transformation");
        if !self.validation.validation_status {
            warn!("Validation stage reported drift or schema issues, transforming anyway");
        }

        let loader = DataLoader::new();
        let train = loader.load_csv(&self.validation.valid_train_file_path)?;
        let test = loader.load_csv(&self.validation.valid_test_file_path)?;

        let data = self.fit_apply(&train, &test)?;

        let config = &self.config;
        save_array(&config.transformed_train_file_path, &data.train)?;
        save_array(&config.transformed_test_file_path, &data.test)?;
        save_object(&config.transformed_object_file_path, &data.preprocessor)?;
        save_object(config.final_preprocessor_path(), &data.preprocessor)?;

        let label_encoder_file_path = match &data.target.encoder {
            Some(encoder) => {
                let path = config.final_label_encoder_path();
                save_object(&path, encoder)?;
                Some(path)
            }
            None => None,
        };

        let artifact = DataTransformationArtifact {
            transformed_object_file_path: config.transformed_object_file_path.clone(),
            transformed_train_file_path: config.transformed_train_file_path.clone(),
            transformed_test_file_path: config.transformed_test_file_path.clone(),
            label_encoder_file_path,
        };
        info!(
            train = %artifact.transformed_train_file_path.display(),
            test = %artifact.transformed_test_file_path.display(),
            preprocessor = %artifact.transformed_object_file_path.display(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Data transformation completed"
        );
        Ok(artifact)
    }
}
