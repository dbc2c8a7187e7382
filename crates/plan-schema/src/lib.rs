//! Typed schema for bundler build plans.
//!
//! A [`BasePlan`] holds everything that is the same in every environment.
//! An [`Overlay`] holds what one environment adds or changes. Merging the
//! two yields a [`Plan`], the value handed to the bundler runtime.

pub mod error;
pub mod exclude;
pub mod plan;
pub mod plugin;
pub mod rule;

pub use error::{AssemblyError, ConfigurationError, MergeConflictError, RuleOrigin};
pub use exclude::{ExclusionRegistry, ExclusionSet, VENDORED, VENDORED_PATTERNS};
pub use plan::{BasePlan, Mode, Output, OutputOverlay, Overlay, Plan, Resolution};
pub use plugin::{
    DevServer, Minimizer, Optimization, OptimizationOverlay, Plugin, ScriptCompress, PURE_HELPERS,
};
pub use rule::{Rule, RulePattern, TransformStep};
