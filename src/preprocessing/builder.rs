//! Pipeline planning: maps a column profile to per-group step sequences

use super::column_transformer::ColumnTransformer;
use super::knn::KnnImputerParams;
use super::profiler::ColumnProfile;
use super::ColumnRole;
use crate::constants::SPARSE_THRESHOLD;
use crate::error::{Result, TabprepError};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;

/// A single unfitted stage of a group pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StepSpec {
    MeanImpute,
    KnnImpute(KnnImputerParams),
    MostFrequentImpute,
    YeoJohnson,
    StandardScale,
    OneHot,
}

impl StepSpec {
    pub fn name(&self) -> &'static str {
        match self {
            StepSpec::MeanImpute => "mean_imputer",
            StepSpec::KnnImpute(_) => "knn_imputer",
            StepSpec::MostFrequentImpute => "most_frequent_imputer",
            StepSpec::YeoJohnson => "yeo_johnson",
            StepSpec::StandardScale => "scaler",
            StepSpec::OneHot => "one_hot",
        }
    }
}

impl fmt::Display for StepSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Steps to run over one group of columns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupPlan {
    pub role: ColumnRole,
    pub name: String,
    pub columns: Vec<String>,
    pub steps: Vec<StepSpec>,
}

impl GroupPlan {
    fn new(role: ColumnRole, columns: Vec<String>, steps: Vec<StepSpec>) -> Self {
        Self {
            role,
            name: role.group_name().to_string(),
            columns,
            steps,
        }
    }
}

/// Builds the unfitted composite transformation for a profile.
///
/// Planning is pure: it looks only at the profile, never at data.
#[derive(Debug, Clone)]
pub struct PipelineBuilder {
    knn: KnnImputerParams,
    sparse_threshold: f64,
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self {
            knn: KnnImputerParams::default(),
            sparse_threshold: SPARSE_THRESHOLD,
        }
    }
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_knn(mut self, knn: KnnImputerParams) -> Self {
        self.knn = knn;
        self
    }

    pub fn with_sparse_threshold(mut self, threshold: f64) -> Self {
        self.sparse_threshold = threshold;
        self
    }

    /// Step sequence for one treatment
    pub fn steps_for(&self, role: ColumnRole) -> Vec<StepSpec> {
        match role {
            ColumnRole::NumericSkewed => {
                vec![StepSpec::MeanImpute, StepSpec::YeoJohnson, StepSpec::StandardScale]
            }
            ColumnRole::NumericRegular => {
                vec![StepSpec::KnnImpute(self.knn.clone()), StepSpec::StandardScale]
            }
            ColumnRole::Categorical => vec![StepSpec::MostFrequentImpute, StepSpec::OneHot],
        }
    }

    /// Non-empty groups in output order: skewed, regular, categorical
    pub fn plan(&self, profile: &ColumnProfile) -> Result<Vec<GroupPlan>> {
        let groups: Vec<GroupPlan> = [
            (ColumnRole::NumericSkewed, profile.skewed()),
            (ColumnRole::NumericRegular, profile.regular()),
            (ColumnRole::Categorical, profile.categorical()),
        ]
        .into_iter()
        .filter(|(_, columns)| !columns.is_empty())
        .map(|(role, columns)| GroupPlan::new(role, columns, self.steps_for(role)))
        .collect();

        if groups.is_empty() {
            return Err(TabprepError::NoFeatureColumns);
        }
        Ok(groups)
    }

    pub fn build(&self, profile: &ColumnProfile) -> Result<ColumnTransformer> {
        let groups = self.plan(profile)?;
        for group in &groups {
            let steps: Vec<&str> = group.steps.iter().map(StepSpec::name).collect();
            info!(group = %group.name, columns = group.columns.len(), steps = ?steps, "Planned group");
        }
        Ok(ColumnTransformer::new(groups, profile.clone(), self.sparse_threshold))
    }
}
