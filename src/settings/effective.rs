//! Effective settings with provenance
//!
//! Captures the merged project settings plus where each layer came from.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

use super::defaults::{ProjectSettings, SETTINGS_FILE};
use super::layers::merge_layers;

/// Origin of a settings layer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SettingsOrigin {
    Builtin,
    Project,
    Cli,
}

/// A contributing settings layer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SettingsSource {
    pub origin: SettingsOrigin,

    /// File path (None for builtin/cli)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// SHA-256 digest of raw file bytes (None for builtin/cli)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
}

/// Project settings resolved for one base directory
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EffectiveSettings {
    /// Directory every relative setting is resolved against
    pub base_dir: PathBuf,

    pub settings: ProjectSettings,

    /// Contributing layers in precedence order
    pub sources: Vec<SettingsSource>,
}

impl EffectiveSettings {
    /// Built-in settings only; nothing is read from disk.
    pub fn builtin(base_dir: &Path) -> Self {
        Self {
            base_dir: base_dir.to_path_buf(),
            settings: ProjectSettings::default(),
            sources: vec![SettingsSource {
                origin: SettingsOrigin::Builtin,
                path: None,
                digest: None,
            }],
        }
    }

    /// Build effective settings from layers.
    ///
    /// Without an explicit `settings_path`, `<base_dir>/bundle-plan.toml` is
    /// used when it exists.
    pub fn build(
        base_dir: &Path,
        settings_path: Option<&Path>,
        cli_overrides: Option<Value>,
    ) -> Result<Self, SettingsError> {
        let builtin = ProjectSettings::default()
            .to_value()
            .map_err(|e| SettingsError::ParseError(format!("builtin settings: {}", e)))?;
        let mut layers = vec![builtin];
        let mut sources = vec![SettingsSource {
            origin: SettingsOrigin::Builtin,
            path: None,
            digest: None,
        }];

        let default_path = base_dir.join(SETTINGS_FILE);
        let project_path = match settings_path {
            Some(path) => Some(path),
            None if default_path.exists() => Some(default_path.as_path()),
            None => None,
        };

        if let Some(path) = project_path {
            let (value, digest) = Self::load_toml_file(path)?;
            tracing::debug!(path = %path.display(), %digest, "loaded project settings");
            layers.push(value);
            sources.push(SettingsSource {
                origin: SettingsOrigin::Project,
                path: Some(path.to_string_lossy().to_string()),
                digest: Some(digest),
            });
        }

        if let Some(cli) = cli_overrides {
            layers.push(cli);
            sources.push(SettingsSource {
                origin: SettingsOrigin::Cli,
                path: None,
                digest: None,
            });
        }

        let merged = merge_layers(layers);
        let settings: ProjectSettings = serde_json::from_value(merged)
            .map_err(|e| SettingsError::ParseError(format!("invalid settings: {}", e)))?;

        Self::validate(&settings)?;

        Ok(Self {
            base_dir: base_dir.to_path_buf(),
            settings,
            sources,
        })
    }

    /// Load and parse a TOML file, returning the value and digest
    fn load_toml_file(path: &Path) -> Result<(Value, String), SettingsError> {
        let bytes = fs::read(path)
            .map_err(|e| SettingsError::IoError(format!("{}: {}", path.display(), e)))?;

        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        let digest = hex::encode(hasher.finalize());

        let contents = String::from_utf8(bytes)
            .map_err(|e| SettingsError::ParseError(format!("Invalid UTF-8: {}", e)))?;

        let value: Value = toml::from_str(&contents)
            .map_err(|e| SettingsError::ParseError(format!("TOML parse error: {}", e)))?;

        Ok((value, digest))
    }

    fn validate(settings: &ProjectSettings) -> Result<(), SettingsError> {
        let required = [
            ("source_dir", &settings.source_dir),
            ("entry", &settings.entry),
            ("template", &settings.template),
            ("inject", &settings.inject),
            ("output_dir", &settings.output_dir),
            ("assets_dir", &settings.assets_dir),
            ("domain", &settings.domain),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(SettingsError::ValidationError(format!(
                    "{} must not be empty",
                    name
                )));
            }
        }

        // The output directory is wiped before production builds
        if settings.output_dir == settings.source_dir || settings.output_dir == settings.assets_dir
        {
            return Err(SettingsError::ValidationError(format!(
                "output_dir '{}' must differ from source_dir and assets_dir",
                settings.output_dir
            )));
        }

        if settings.domain.contains("://") || settings.domain.contains('/') {
            return Err(SettingsError::ValidationError(format!(
                "domain '{}' must be a bare host name",
                settings.domain
            )));
        }

        Ok(())
    }
}

/// Settings errors
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn test_build_with_defaults_only() {
        let dir = TempDir::new().unwrap();
        let effective = EffectiveSettings::build(dir.path(), None, None).unwrap();

        assert_eq!(effective.settings, ProjectSettings::default());
        assert_eq!(effective.sources.len(), 1);
        assert_eq!(effective.sources[0].origin, SettingsOrigin::Builtin);
        assert_eq!(effective, EffectiveSettings::builtin(dir.path()));
    }

    #[test]
    fn test_project_file_discovered_in_base_dir() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(SETTINGS_FILE),
            "domain = \"example.org\"\nexclude = [\"**/generated/**\"]\n",
        )
        .unwrap();

        let effective = EffectiveSettings::build(dir.path(), None, None).unwrap();

        assert_eq!(effective.settings.domain, "example.org");
        assert_eq!(effective.settings.exclude, vec!["**/generated/**"]);
        assert_eq!(effective.sources[1].origin, SettingsOrigin::Project);
        assert_eq!(effective.sources[1].digest.as_ref().unwrap().len(), 64);
    }

    #[test]
    fn test_explicit_file_and_cli_override() {
        let dir = TempDir::new().unwrap();
        let mut temp = NamedTempFile::new().unwrap();
        writeln!(temp, "assets_dir = \"static\"").unwrap();
        writeln!(temp, "domain = \"from-file.org\"").unwrap();

        let cli = serde_json::json!({"domain": "from-cli.org"});
        let effective = EffectiveSettings::build(dir.path(), Some(temp.path()), Some(cli)).unwrap();

        assert_eq!(effective.settings.assets_dir, "static");
        assert_eq!(effective.settings.domain, "from-cli.org");
        assert_eq!(effective.sources.len(), 3);
        assert_eq!(effective.sources[2].origin, SettingsOrigin::Cli);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let dir = TempDir::new().unwrap();
        let cli = serde_json::json!({"minify": true});

        let err = EffectiveSettings::build(dir.path(), None, Some(cli)).unwrap_err();
        assert!(matches!(err, SettingsError::ParseError(_)));
    }

    #[test]
    fn test_output_dir_must_not_be_sources() {
        let dir = TempDir::new().unwrap();
        let cli = serde_json::json!({"output_dir": "src"});

        let err = EffectiveSettings::build(dir.path(), None, Some(cli)).unwrap_err();
        assert!(err.to_string().contains("output_dir"));
    }

    #[test]
    fn test_domain_must_be_bare() {
        let dir = TempDir::new().unwrap();
        let cli = serde_json::json!({"domain": "https://example.org"});

        let err = EffectiveSettings::build(dir.path(), None, Some(cli)).unwrap_err();
        assert!(matches!(err, SettingsError::ValidationError(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope.toml");

        let err = EffectiveSettings::build(dir.path(), Some(missing.as_path()), None).unwrap_err();
        assert!(matches!(err, SettingsError::IoError(_)));
    }

    #[test]
    fn test_toml_types_checked_against_settings() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(SETTINGS_FILE), "output_dir = 3\n").unwrap();

        let err = EffectiveSettings::build(dir.path(), None, None).unwrap_err();
        assert!(matches!(err, SettingsError::ParseError(_)));
    }

    #[test]
    fn test_invalid_toml() {
        let dir = TempDir::new().unwrap();
        let mut temp = NamedTempFile::new().unwrap();
        writeln!(temp, "domain = ").unwrap();

        let err = EffectiveSettings::build(dir.path(), Some(temp.path()), None).unwrap_err();
        assert!(err.to_string().contains("TOML parse error"));
    }
}
