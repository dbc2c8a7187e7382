//! Rule selection and ordered step execution.
//!
//! For every file the bundler runtime encounters, exactly one rule of the
//! plan applies or none does. The selected rule's steps run strictly in
//! declared order; each step is an external transformer looked up by its
//! loader identifier.

mod selection;

pub use selection::{explain, select, ExcludedMatch, Selection, SelectionExplanation};

use plan_schema::{Plan, TransformStep};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Pipeline errors
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{} rules apply to {}: {}", .patterns.len(), .path.display(), .patterns.join(", "))]
    AmbiguousRule { path: PathBuf, patterns: Vec<String> },

    #[error("rule '{pattern}' references missing exclusion set '{name}'")]
    MissingExclusionSet { pattern: String, name: String },

    #[error("no transformer registered for loader '{0}'")]
    UnknownLoader(String),

    #[error("step {index} ({loader}) failed on {}: {source}", .path.display())]
    Transform {
        path: PathBuf,
        index: usize,
        loader: String,
        #[source]
        source: TransformError,
    },
}

/// Failure reported by an external transformer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct TransformError(pub String);

/// A file moving through a rule's chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub path: PathBuf,
    pub contents: Vec<u8>,
}

impl Asset {
    pub fn new(path: impl Into<PathBuf>, contents: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            contents: contents.into(),
        }
    }
}

/// An external transformation, treated as a black box.
pub trait Transformer: Send + Sync {
    /// Transform `input` using the step's options.
    fn transform(&self, input: Asset, options: &Map<String, Value>) -> Result<Asset, TransformError>;
}

impl<F> Transformer for F
where
    F: Fn(Asset, &Map<String, Value>) -> Result<Asset, TransformError> + Send + Sync,
{
    fn transform(&self, input: Asset, options: &Map<String, Value>) -> Result<Asset, TransformError> {
        self(input, options)
    }
}

/// Transformers keyed by loader identifier.
#[derive(Default)]
pub struct TransformerRegistry {
    transformers: BTreeMap<String, Box<dyn Transformer>>,
}

impl TransformerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a transformer, replacing any previous one for `loader`.
    pub fn register(mut self, loader: &str, transformer: impl Transformer + 'static) -> Self {
        self.transformers
            .insert(loader.to_string(), Box::new(transformer));
        self
    }

    pub fn get(&self, loader: &str) -> Option<&dyn Transformer> {
        self.transformers.get(loader).map(|t| t.as_ref())
    }

    /// Loaders referenced by `plan` that have no transformer.
    pub fn missing_loaders<'p>(&self, plan: &'p Plan) -> Vec<&'p str> {
        let mut missing: Vec<&str> = plan
            .rules
            .iter()
            .flat_map(|r| r.steps())
            .map(|s| s.loader.as_str())
            .filter(|loader| !self.transformers.contains_key(*loader))
            .collect();
        missing.sort_unstable();
        missing.dedup();
        missing
    }
}

/// Runs files through a plan.
pub struct Pipeline<'a> {
    plan: &'a Plan,
    registry: &'a TransformerRegistry,
}

impl<'a> Pipeline<'a> {
    pub fn new(plan: &'a Plan, registry: &'a TransformerRegistry) -> Self {
        Self { plan, registry }
    }

    /// Transform one file.
    ///
    /// Steps run one at a time in declared order. A file no rule applies to
    /// is returned unchanged.
    pub fn run(&self, asset: Asset) -> Result<Asset, PipelineError> {
        let rule = match select(self.plan, &asset.path)? {
            Selection::PassThrough => {
                tracing::trace!(path = %asset.path.display(), "no rule applies");
                return Ok(asset);
            }
            Selection::Rule(rule) => rule,
        };

        tracing::debug!(
            path = %asset.path.display(),
            rule = rule.key(),
            steps = rule.steps().len(),
            "running rule"
        );

        let path = asset.path.clone();
        rule.steps()
            .iter()
            .enumerate()
            .try_fold(asset, |current, (index, step)| {
                self.run_step(&path, index, step, current)
            })
    }

    fn run_step(
        &self,
        path: &Path,
        index: usize,
        step: &TransformStep,
        input: Asset,
    ) -> Result<Asset, PipelineError> {
        let transformer = self
            .registry
            .get(&step.loader)
            .ok_or_else(|| PipelineError::UnknownLoader(step.loader.clone()))?;

        transformer
            .transform(input, &step.options)
            .map_err(|source| PipelineError::Transform {
                path: path.to_path_buf(),
                index,
                loader: step.loader.clone(),
                source,
            })
    }
}
