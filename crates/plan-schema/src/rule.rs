//! Rules: a path pattern bound to an ordered chain of transform steps.

use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::path::Path;

use crate::error::ConfigurationError;

/// Regular expression over a file path, e.g. `\.(ttf|otf)$`.
///
/// Two patterns are equal when their source text is equal; the source text
/// is the key a rule is merged by.
#[derive(Debug, Clone)]
pub struct RulePattern {
    source: String,
    regex: Regex,
}

impl RulePattern {
    pub fn new(source: &str) -> Result<Self, ConfigurationError> {
        let regex = Regex::new(source).map_err(|e| ConfigurationError::InvalidPattern {
            pattern: source.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            source: source.to_string(),
            regex,
        })
    }

    /// Pattern matching a single extension (without the dot).
    pub fn extension(ext: &str) -> Result<Self, ConfigurationError> {
        Self::new(&format!(r"\.{}$", regex_lite::escape(ext)))
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn is_match(&self, path: &Path) -> bool {
        self.regex.is_match(&path.to_string_lossy())
    }
}

impl PartialEq for RulePattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for RulePattern {}

impl fmt::Display for RulePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl Serialize for RulePattern {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.source)
    }
}

impl<'de> Deserialize<'de> for RulePattern {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let source = String::deserialize(deserializer)?;
        Self::new(&source).map_err(serde::de::Error::custom)
    }
}

/// One named, configurable unit in a rule's chain.
///
/// Options are handed to the transformer untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformStep {
    pub loader: String,

    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub options: Map<String, Value>,
}

impl TransformStep {
    /// A step with no options.
    pub fn new(loader: &str) -> Self {
        Self {
            loader: loader.to_string(),
            options: Map::new(),
        }
    }

    /// Add one option, overwriting any previous value under `key`.
    pub fn option(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.options.insert(key.to_string(), value.into());
        self
    }
}

/// Binds a path pattern to a non-empty, ordered chain of steps.
///
/// Steps run in declared order, each consuming the previous step's output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawRule")]
pub struct Rule {
    test: RulePattern,
    exclude: String,
    steps: Vec<TransformStep>,
}

#[derive(Deserialize)]
struct RawRule {
    test: RulePattern,
    exclude: String,
    steps: Vec<TransformStep>,
}

impl TryFrom<RawRule> for Rule {
    type Error = ConfigurationError;

    fn try_from(raw: RawRule) -> Result<Self, Self::Error> {
        Rule::new(raw.test, &raw.exclude, raw.steps)
    }
}

impl Rule {
    /// Create a rule. Fails if `steps` is empty.
    pub fn new(
        test: RulePattern,
        exclude: &str,
        steps: Vec<TransformStep>,
    ) -> Result<Self, ConfigurationError> {
        if steps.is_empty() {
            return Err(ConfigurationError::EmptySteps {
                pattern: test.as_str().to_string(),
            });
        }
        Ok(Self {
            test,
            exclude: exclude.to_string(),
            steps,
        })
    }

    pub fn test(&self) -> &RulePattern {
        &self.test
    }

    /// The merge key.
    pub fn key(&self) -> &str {
        self.test.as_str()
    }

    /// Name of the exclusion set this rule honours.
    pub fn exclude(&self) -> &str {
        &self.exclude
    }

    pub fn steps(&self) -> &[TransformStep] {
        &self.steps
    }

    /// Loader identifiers in execution order.
    pub fn loaders(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.loader.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pattern_matches_path_suffix() {
        let images = RulePattern::new(r"\.(jpe?g|png|gif|svg)$").unwrap();

        assert!(images.is_match(Path::new("src/img/logo.svg")));
        assert!(images.is_match(Path::new("photo.jpeg")));
        assert!(images.is_match(Path::new("photo.jpg")));
        assert!(!images.is_match(Path::new("logo.svg.map")));
    }

    #[test]
    fn test_extension_pattern_is_escaped() {
        let style = RulePattern::extension("style").unwrap();
        assert_eq!(style.as_str(), r"\.style$");
        assert!(style.is_match(Path::new("a.style")));
        assert!(!style.is_match(Path::new("astyle")));
    }

    #[test]
    fn test_invalid_pattern() {
        let err = RulePattern::new(r"\.(js").unwrap_err();
        assert!(matches!(err, ConfigurationError::InvalidPattern { .. }));
    }

    #[test]
    fn test_empty_chain_rejected() {
        let err = Rule::new(RulePattern::extension("js").unwrap(), "vendored", vec![]).unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::EmptySteps {
                pattern: r"\.js$".to_string()
            }
        );
    }

    #[test]
    fn test_step_options_pass_through() {
        let step = TransformStep::new("elm-webpack-loader")
            .option("debug", true)
            .option("cwd", "/srv/app");

        assert_eq!(step.options["debug"], json!(true));
        assert_eq!(step.options["cwd"], json!("/srv/app"));
    }

    #[test]
    fn test_rule_deserialization_validates() {
        let ok: Rule = serde_json::from_value(json!({
            "test": "\\.scss$",
            "exclude": "vendored",
            "steps": [{"loader": "css-loader"}, {"loader": "sass-loader"}]
        }))
        .unwrap();
        assert_eq!(ok.loaders(), vec!["css-loader", "sass-loader"]);

        let empty = serde_json::from_value::<Rule>(json!({
            "test": "\\.scss$",
            "exclude": "vendored",
            "steps": []
        }));
        assert!(empty.is_err());
    }
}
