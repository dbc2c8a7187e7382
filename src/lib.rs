//! bundle-plan - build plans for a front-end asset bundler
//!
//! Assembles the plan a bundler runtime executes: a base plan shared by all
//! environments merged with a development or production overlay. Rule
//! selection and step ordering live in `plan-pipeline`; the typed schema
//! lives in `plan-schema`.

pub mod error;
pub mod plan;
pub mod settings;

pub use error::BundlePlanError;
pub use plan::{
    assemble, assemble_development, assemble_production, assemble_with, merge, merge_with,
    MergePolicy, MergeReport,
};
pub use settings::{EffectiveSettings, ProjectSettings, SettingsError};

pub use plan_pipeline::{
    explain, select, Asset, Pipeline, PipelineError, Selection, SelectionExplanation,
    TransformError, Transformer, TransformerRegistry,
};
pub use plan_schema::{
    AssemblyError, BasePlan, ConfigurationError, MergeConflictError, Mode, Overlay, Plan, Rule,
    RulePattern, TransformStep,
};
