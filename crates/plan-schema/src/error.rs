//! Error types for plan construction and merging.

use std::fmt;

/// A plan could not be assembled because its inputs are invalid.
///
/// Always fatal: no partial plan is produced.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("unknown mode '{0}': expected 'development' or 'production'")]
    UnknownMode(String),

    #[error("rule '{pattern}' has an empty step chain")]
    EmptySteps { pattern: String },

    #[error("rule '{pattern}' references missing exclusion set '{name}'")]
    MissingExclusionSet { pattern: String, name: String },

    #[error("rule '{pattern}' is declared more than once in the {origin}")]
    DuplicateRule { pattern: String, origin: RuleOrigin },

    #[error("'{extension}' files match more than one rule: {}", .patterns.join(", "))]
    OverlappingRules {
        extension: String,
        patterns: Vec<String>,
    },

    #[error("required field '{0}' is not set by the base plan or the overlay")]
    MissingField(&'static str),

    #[error("invalid rule pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("invalid exclusion glob '{pattern}': {reason}")]
    InvalidGlob { pattern: String, reason: String },
}

/// Which side of a merge a rule came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleOrigin {
    Base,
    Overlay,
    Plan,
}

impl fmt::Display for RuleOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Base => write!(f, "base plan"),
            Self::Overlay => write!(f, "overlay"),
            Self::Plan => write!(f, "plan"),
        }
    }
}

/// A scalar was set to different values by the base plan and the overlay
/// while merging under the strict policy.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("conflicting values for '{field}': base '{base}', overlay '{overlay}'")]
pub struct MergeConflictError {
    pub field: &'static str,
    pub base: String,
    pub overlay: String,
}

/// Anything that can stop a plan from being assembled.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssemblyError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("merge conflict: {0}")]
    MergeConflict(#[from] MergeConflictError),
}
