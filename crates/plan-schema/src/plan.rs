//! Base plans, overlays and resolved plans.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{ConfigurationError, RuleOrigin};
use crate::exclude::ExclusionRegistry;
use crate::plugin::{DevServer, Optimization, OptimizationOverlay, Plugin};
use crate::rule::Rule;

/// Build environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Development,
    Production,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Development => "development",
            Mode::Production => "production",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "development" => Ok(Mode::Development),
            "production" => Ok(Mode::Production),
            other => Err(ConfigurationError::UnknownMode(other.to_string())),
        }
    }
}

/// Module resolution: where imports are looked up and which extensions
/// may be omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    #[serde(default)]
    pub search_paths: Vec<PathBuf>,
    #[serde(default)]
    pub extensions: Vec<String>,
}

/// Output settings as written by one side of a merge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputOverlay {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,

    /// Naming pattern for emitted bundles, e.g. `js/[name]-[hash].bundle.js`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

/// Resolved output settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Output {
    pub directory: PathBuf,
    pub filename: String,
}

/// The environment-independent build description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasePlan {
    pub entry: PathBuf,
    pub output: OutputOverlay,
    #[serde(default)]
    pub resolve: Resolution,
    #[serde(default)]
    pub rules: Vec<Rule>,
    #[serde(default)]
    pub plugins: Vec<Plugin>,
    #[serde(default)]
    pub optimization: OptimizationOverlay,
    #[serde(default)]
    pub exclusions: ExclusionRegistry,
}

/// An environment-specific partial plan.
///
/// `mode` is kept as written and only checked when the overlay is merged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Overlay {
    pub mode: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry: Option<PathBuf>,
    #[serde(default)]
    pub output: OutputOverlay,
    #[serde(default)]
    pub resolve: Resolution,
    #[serde(default)]
    pub rules: Vec<Rule>,
    #[serde(default)]
    pub plugins: Vec<Plugin>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optimization: Option<OptimizationOverlay>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dev_server: Option<DevServer>,
}

impl Overlay {
    pub fn new(mode: &str) -> Self {
        Self {
            mode: mode.to_string(),
            ..Default::default()
        }
    }
}

/// A fully resolved build description, ready for the bundler runtime.
///
/// Deserializing a plan runs the same checks as [`Plan::validate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPlan")]
pub struct Plan {
    pub mode: Mode,
    pub entry: PathBuf,
    pub output: Output,
    pub resolve: Resolution,
    pub rules: Vec<Rule>,
    pub plugins: Vec<Plugin>,
    pub optimization: Optimization,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dev_server: Option<DevServer>,
    pub exclusions: ExclusionRegistry,
}

#[derive(Deserialize)]
struct RawPlan {
    mode: Mode,
    entry: PathBuf,
    output: Output,
    resolve: Resolution,
    rules: Vec<Rule>,
    plugins: Vec<Plugin>,
    optimization: Optimization,
    #[serde(default)]
    dev_server: Option<DevServer>,
    exclusions: ExclusionRegistry,
}

impl TryFrom<RawPlan> for Plan {
    type Error = ConfigurationError;

    fn try_from(raw: RawPlan) -> Result<Self, Self::Error> {
        let plan = Plan {
            mode: raw.mode,
            entry: raw.entry,
            output: raw.output,
            resolve: raw.resolve,
            rules: raw.rules,
            plugins: raw.plugins,
            optimization: raw.optimization,
            dev_server: raw.dev_server,
            exclusions: raw.exclusions,
        };
        plan.validate()?;
        Ok(plan)
    }
}

impl Plan {
    /// Check the rule set against the rest of the plan.
    ///
    /// Rule keys must be unique and every named exclusion set must exist.
    /// Rules are keyed by pattern text, so two differently written patterns
    /// can still cover the same files; a file named after each resolvable
    /// extension must match at most one rule.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let mut seen = HashSet::new();
        for rule in &self.rules {
            if !seen.insert(rule.key()) {
                return Err(ConfigurationError::DuplicateRule {
                    pattern: rule.key().to_string(),
                    origin: RuleOrigin::Plan,
                });
            }
            if !self.exclusions.contains(rule.exclude()) {
                return Err(ConfigurationError::MissingExclusionSet {
                    pattern: rule.key().to_string(),
                    name: rule.exclude().to_string(),
                });
            }
        }

        for extension in &self.resolve.extensions {
            let sample = format!("file{}", extension);
            let patterns: Vec<String> = self
                .rules
                .iter()
                .filter(|r| r.test().is_match(Path::new(&sample)))
                .map(|r| r.key().to_string())
                .collect();
            if patterns.len() > 1 {
                return Err(ConfigurationError::OverlappingRules {
                    extension: extension.clone(),
                    patterns,
                });
            }
        }

        Ok(())
    }

    /// The rule keyed by `pattern`, if any.
    pub fn rule(&self, pattern: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.key() == pattern)
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// SHA-256 of the plan's canonical JSON form.
    ///
    /// Equal plans always have equal digests.
    pub fn digest(&self) -> Result<String, serde_json::Error> {
        let canonical = serde_json_canonicalizer::to_vec(self)?;
        let mut hasher = Sha256::new();
        hasher.update(&canonical);
        Ok(hex::encode(hasher.finalize()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exclude::{ExclusionSet, VENDORED};
    use crate::rule::{RulePattern, TransformStep};

    #[test]
    fn test_mode_parse() {
        assert_eq!("development".parse::<Mode>().unwrap(), Mode::Development);
        assert_eq!("production".parse::<Mode>().unwrap(), Mode::Production);
        assert_eq!(
            "Production".parse::<Mode>().unwrap_err(),
            ConfigurationError::UnknownMode("Production".to_string())
        );
    }

    fn sample_plan() -> Plan {
        Plan {
            mode: Mode::Development,
            entry: PathBuf::from("src/index.js"),
            output: Output {
                directory: PathBuf::from("dist"),
                filename: "js/[name].bundle.js".to_string(),
            },
            resolve: Resolution {
                search_paths: vec![PathBuf::from("src")],
                extensions: vec![".js".to_string(), ".scss".to_string()],
            },
            rules: vec![
                Rule::new(
                    RulePattern::extension("js").unwrap(),
                    VENDORED,
                    vec![TransformStep::new("babel-loader")],
                )
                .unwrap(),
                Rule::new(
                    RulePattern::extension("scss").unwrap(),
                    VENDORED,
                    vec![TransformStep::new("sass-loader")],
                )
                .unwrap(),
            ],
            plugins: Vec::new(),
            optimization: Optimization::default(),
            dev_server: None,
            exclusions: ExclusionRegistry::new()
                .with(ExclusionSet::vendored::<&str>(&[]).unwrap()),
        }
    }

    #[test]
    fn test_valid_plan_deserializes() {
        let plan = sample_plan();
        assert!(plan.validate().is_ok());

        let parsed: Plan = serde_json::from_str(&plan.to_json().unwrap()).unwrap();
        assert_eq!(parsed, plan);
    }

    #[test]
    fn test_overlapping_rule_spellings_rejected() {
        let mut plan = sample_plan();
        plan.rules.push(
            Rule::new(
                RulePattern::new(r"\.(scss)$").unwrap(),
                VENDORED,
                vec![TransformStep::new("style-loader")],
            )
            .unwrap(),
        );

        assert_eq!(
            plan.validate().unwrap_err(),
            ConfigurationError::OverlappingRules {
                extension: ".scss".to_string(),
                patterns: vec![r"\.scss$".to_string(), r"\.(scss)$".to_string()],
            }
        );
    }

    #[test]
    fn test_deserialized_plan_is_checked() {
        let mut json = serde_json::to_value(sample_plan()).unwrap();
        json["exclusions"] = serde_json::json!({});
        let err = serde_json::from_value::<Plan>(json).unwrap_err();
        assert!(err.to_string().contains("missing exclusion set 'vendored'"));

        let mut json = serde_json::to_value(sample_plan()).unwrap();
        let first = json["rules"][0].clone();
        json["rules"].as_array_mut().unwrap().push(first);
        let err = serde_json::from_value::<Plan>(json).unwrap_err();
        assert!(err.to_string().contains("declared more than once in the plan"));
    }

    #[test]
    fn test_overlay_from_toml_shape() {
        let overlay: Overlay = serde_json::from_value(serde_json::json!({
            "mode": "development",
            "output": {"filename": "js/[name].bundle.js"}
        }))
        .unwrap();

        assert_eq!(overlay.mode, "development");
        assert_eq!(overlay.output.filename.as_deref(), Some("js/[name].bundle.js"));
        assert!(overlay.rules.is_empty());
        assert!(overlay.optimization.is_none());
    }
}
