//! Top-level errors and their exit codes.

use plan_pipeline::PipelineError;
use plan_schema::AssemblyError;
use thiserror::Error;

use crate::settings::SettingsError;

#[derive(Debug, Error)]
pub enum BundlePlanError {
    #[error("settings error: {0}")]
    Settings(#[from] SettingsError),

    #[error(transparent)]
    Assembly(#[from] AssemblyError),

    #[error("pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl BundlePlanError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            BundlePlanError::Settings(_) => 1,
            BundlePlanError::Serialization(_) => 1,
            BundlePlanError::Assembly(AssemblyError::Configuration(_)) => 2,
            BundlePlanError::Assembly(AssemblyError::MergeConflict(_)) => 3,
            BundlePlanError::Pipeline(_) => 4,
        }
    }
}
