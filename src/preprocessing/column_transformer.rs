//! Column-wise composite transformation.
//!
//! Each group plan runs its steps over its own columns of the frame; group
//! outputs are concatenated side by side in plan order. Columns not claimed
//! by any group are dropped.

use super::builder::{GroupPlan, StepSpec};
use super::encoder::OneHotEncoder;
use super::imputer::{MeanImputer, MostFrequentImputer};
use super::knn::KNNImputer;
use super::matrix::TransformOutput;
use super::power::PowerTransformer;
use super::profiler::ColumnProfile;
use super::scaler::StandardScaler;
use super::{categorical_columns, numeric_matrix, ColumnRole};
use crate::error::{Result, ResultExt, TabprepError};
use ndarray::Array2;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info};

/// Data flowing between the steps of one group
#[derive(Debug)]
enum GroupData {
    Numeric(Array2<f64>),
    /// Raw categorical columns, `None` for missing
    Raw(Vec<Vec<Option<String>>>),
    /// Categorical columns after imputation
    Imputed(Vec<Vec<String>>),
    Output(TransformOutput),
}

impl GroupData {
    fn kind(&self) -> &'static str {
        match self {
            GroupData::Numeric(_) => "numeric matrix",
            GroupData::Raw(_) => "raw categorical columns",
            GroupData::Imputed(_) => "imputed categorical columns",
            GroupData::Output(_) => "encoded output",
        }
    }

    fn into_output(self) -> Result<TransformOutput> {
        match self {
            GroupData::Numeric(a) => Ok(TransformOutput::Dense(a)),
            GroupData::Output(o) => Ok(o),
            other => Err(TabprepError::InvalidInput(format!(
                "group ended with {} instead of a matrix",
                other.kind()
            ))),
        }
    }
}

fn unexpected(step: &StepSpec, data: &GroupData) -> TabprepError {
    TabprepError::InvalidInput(format!("step {step} cannot consume {}", data.kind()))
}

/// A fitted stage of a group pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum FittedStep {
    MeanImpute(MeanImputer),
    KnnImpute(KNNImputer),
    MostFrequentImpute(MostFrequentImputer),
    YeoJohnson(PowerTransformer),
    StandardScale(StandardScaler),
    OneHot(OneHotEncoder),
}

impl FittedStep {
    pub fn name(&self) -> &'static str {
        match self {
            FittedStep::MeanImpute(_) => "mean_imputer",
            FittedStep::KnnImpute(_) => "knn_imputer",
            FittedStep::MostFrequentImpute(_) => "most_frequent_imputer",
            FittedStep::YeoJohnson(_) => "yeo_johnson",
            FittedStep::StandardScale(_) => "scaler",
            FittedStep::OneHot(_) => "one_hot",
        }
    }

    fn transform(&self, data: GroupData) -> Result<GroupData> {
        match (self, data) {
            (FittedStep::MeanImpute(t), GroupData::Numeric(x)) => Ok(GroupData::Numeric(t.transform(&x)?)),
            (FittedStep::KnnImpute(t), GroupData::Numeric(x)) => Ok(GroupData::Numeric(t.transform(&x)?)),
            (FittedStep::YeoJohnson(t), GroupData::Numeric(x)) => Ok(GroupData::Numeric(t.transform(&x)?)),
            (FittedStep::StandardScale(t), GroupData::Numeric(x)) => Ok(GroupData::Numeric(t.transform(&x)?)),
            (FittedStep::MostFrequentImpute(t), GroupData::Raw(cols)) => {
                Ok(GroupData::Imputed(t.transform(&cols)?))
            }
            (FittedStep::OneHot(t), GroupData::Imputed(cols)) => {
                Ok(GroupData::Output(TransformOutput::Sparse(t.transform(&cols)?)))
            }
            (step, data) => Err(TabprepError::InvalidInput(format!(
                "step {} cannot consume {}",
                step.name(),
                data.kind()
            ))),
        }
    }
}

/// Fit one step on the data it receives
fn fit_step(spec: &StepSpec, data: &GroupData) -> Result<FittedStep> {
    match (spec, data) {
        (StepSpec::MeanImpute, GroupData::Numeric(x)) => MeanImputer::fit(x).map(FittedStep::MeanImpute),
        (StepSpec::KnnImpute(params), GroupData::Numeric(x)) => {
            KNNImputer::fit(x, params).map(FittedStep::KnnImpute)
        }
        (StepSpec::YeoJohnson, GroupData::Numeric(x)) => PowerTransformer::fit(x).map(FittedStep::YeoJohnson),
        (StepSpec::StandardScale, GroupData::Numeric(x)) => {
            StandardScaler::fit(x).map(FittedStep::StandardScale)
        }
        (StepSpec::MostFrequentImpute, GroupData::Raw(cols)) => {
            MostFrequentImputer::fit(cols).map(FittedStep::MostFrequentImpute)
        }
        (StepSpec::OneHot, GroupData::Imputed(cols)) => OneHotEncoder::fit(cols).map(FittedStep::OneHot),
        (spec, data) => Err(unexpected(spec, data)),
    }
}

fn gather(role: ColumnRole, df: &DataFrame, columns: &[String]) -> Result<GroupData> {
    if role.is_numeric() {
        numeric_matrix(df, columns).map(GroupData::Numeric)
    } else {
        categorical_columns(df, columns).map(GroupData::Raw)
    }
}

fn unclaimed_columns<'a>(df: &'a DataFrame, groups: &[GroupPlan]) -> Vec<&'a str> {
    df.get_column_names()
        .into_iter()
        .map(|n| n.as_str())
        .filter(|name| !groups.iter().any(|g| g.columns.iter().any(|c| c == name)))
        .collect()
}

/// Unfitted composite transformation produced by the pipeline builder
#[derive(Debug, Clone)]
pub struct ColumnTransformer {
    groups: Vec<GroupPlan>,
    profile: ColumnProfile,
    sparse_threshold: f64,
}

impl ColumnTransformer {
    pub fn new(groups: Vec<GroupPlan>, profile: ColumnProfile, sparse_threshold: f64) -> Self {
        Self {
            groups,
            profile,
            sparse_threshold,
        }
    }

    pub fn groups(&self) -> &[GroupPlan] {
        &self.groups
    }

    /// Learn every step's parameters from the training features.
    ///
    /// A step failure surfaces as `TransformFit` naming `<group>/<step>`.
    pub fn fit(&self, train: &DataFrame) -> Result<FittedColumnTransformer> {
        let start = Instant::now();
        for name in unclaimed_columns(train, &self.groups) {
            debug!(column = name, "Column not claimed by any group, dropped");
        }

        let mut fitted_groups = Vec::with_capacity(self.groups.len());
        for group in &self.groups {
            let mut data = gather(group.role, train, &group.columns).fit_context(&group.name)?;
            let mut steps = Vec::with_capacity(group.steps.len());
            for spec in &group.steps {
                let context = format!("{}/{}", group.name, spec.name());
                let step = fit_step(spec, &data).fit_context(&context)?;
                data = step.transform(data).fit_context(&context)?;
                steps.push(step);
            }
            fitted_groups.push(FittedGroup {
                role: group.role,
                name: group.name.clone(),
                columns: group.columns.clone(),
                steps,
            });
        }

        let fitted = FittedColumnTransformer {
            groups: fitted_groups,
            profile: self.profile.clone(),
            sparse_threshold: self.sparse_threshold,
        };
        info!(
            groups = fitted.groups.len(),
            n_features_out = fitted.n_features_out(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Fitted column transformer"
        );
        Ok(fitted)
    }
}

/// Fitted steps of one column group
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FittedGroup {
    pub role: ColumnRole,
    pub name: String,
    pub columns: Vec<String>,
    pub steps: Vec<FittedStep>,
}

impl FittedGroup {
    fn transform(&self, df: &DataFrame) -> Result<TransformOutput> {
        let mut data = gather(self.role, df, &self.columns).apply_context(&self.name)?;
        for step in &self.steps {
            let context = format!("{}/{}", self.name, step.name());
            data = step.transform(data).apply_context(&context)?;
        }
        data.into_output().apply_context(&self.name)
    }

    fn n_features_out(&self) -> usize {
        match self.steps.last() {
            Some(FittedStep::OneHot(enc)) => enc.n_features_out(),
            _ => self.columns.len(),
        }
    }

    fn feature_names_out(&self) -> Vec<String> {
        match self.steps.last() {
            Some(FittedStep::OneHot(enc)) => enc.feature_names(&self.name, &self.columns),
            _ => self
                .columns
                .iter()
                .map(|c| format!("{}__{}", self.name, c))
                .collect(),
        }
    }
}

/// Composite transformation with every step fitted.
///
/// Read-only after fitting: applying it never changes its state, so the same
/// frame always yields the same output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FittedColumnTransformer {
    groups: Vec<FittedGroup>,
    profile: ColumnProfile,
    sparse_threshold: f64,
}

impl FittedColumnTransformer {
    pub fn transform(&self, df: &DataFrame) -> Result<TransformOutput> {
        let blocks = self
            .groups
            .iter()
            .map(|g| g.transform(df))
            .collect::<Result<Vec<_>>>()?;
        TransformOutput::hstack(blocks, self.sparse_threshold).apply_context("concatenate")
    }

    pub fn groups(&self) -> &[FittedGroup] {
        &self.groups
    }

    /// Profile the transformation was planned from
    pub fn profile(&self) -> &ColumnProfile {
        &self.profile
    }

    pub fn n_features_out(&self) -> usize {
        self.groups.iter().map(FittedGroup::n_features_out).sum()
    }

    pub fn feature_names_out(&self) -> Vec<String> {
        self.groups.iter().flat_map(FittedGroup::feature_names_out).collect()
    }

    /// Columns the transformation reads, in output order
    pub fn input_columns(&self) -> Vec<String> {
        self.groups.iter().flat_map(|g| g.columns.clone()).collect()
    }
}
