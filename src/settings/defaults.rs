//! Project settings and their built-in values (layer 1)

use serde::{Deserialize, Serialize};

/// Domain written into the deployment marker file unless configured.
pub const DEFAULT_DOMAIN: &str = "clickworthiness.online";

/// File name of the project settings file inside the base directory.
pub const SETTINGS_FILE: &str = "bundle-plan.toml";

/// Layout and deployment settings of one front-end project.
///
/// All paths are relative to the base directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectSettings {
    /// Directory holding application sources (default: "src")
    pub source_dir: String,

    /// Entry script inside `source_dir` (default: "index.js")
    pub entry: String,

    /// Markup template inside `source_dir` (default: "index.html")
    pub template: String,

    /// Where the built page injects its scripts (default: "body")
    pub inject: String,

    /// Build output directory (default: "dist")
    pub output_dir: String,

    /// Static files served in development and copied in production
    /// (default: "assets")
    pub assets_dir: String,

    /// Custom domain for the deployment marker file
    pub domain: String,

    /// Extra globs added to the vendored exclusion set
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl Default for ProjectSettings {
    fn default() -> Self {
        Self {
            source_dir: "src".to_string(),
            entry: "index.js".to_string(),
            template: "index.html".to_string(),
            inject: "body".to_string(),
            output_dir: "dist".to_string(),
            assets_dir: "assets".to_string(),
            domain: DEFAULT_DOMAIN.to_string(),
            exclude: Vec::new(),
        }
    }
}

impl ProjectSettings {
    /// Convert to JSON Value for merging
    pub fn to_value(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let defaults = ProjectSettings::default();
        assert_eq!(defaults.source_dir, "src");
        assert_eq!(defaults.entry, "index.js");
        assert_eq!(defaults.output_dir, "dist");
        assert_eq!(defaults.assets_dir, "assets");
        assert_eq!(defaults.domain, "clickworthiness.online");
        assert!(defaults.exclude.is_empty());
    }

    #[test]
    fn test_to_value_round_trips() {
        let defaults = ProjectSettings::default();
        let value = defaults.to_value().unwrap();

        assert_eq!(value["template"], "index.html");
        assert_eq!(value["exclude"], serde_json::json!([]));
        let parsed: ProjectSettings = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, defaults);
    }
}
