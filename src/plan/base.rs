//! Base plan: everything shared by development and production.

use plan_schema::{
    BasePlan, ConfigurationError, ExclusionRegistry, ExclusionSet, OptimizationOverlay,
    OutputOverlay, Plugin, Resolution, Rule, RulePattern, TransformStep, VENDORED,
};
use serde_json::json;
use std::path::{Path, PathBuf};

use crate::settings::ProjectSettings;

/// Scripts.
pub const SCRIPT_PATTERN: &str = r"\.js$";
/// Raster and vector images.
pub const IMAGE_PATTERN: &str = r"\.(jpe?g|png|gif|svg)$";
/// Font files.
pub const FONT_PATTERN: &str = r"\.(ttf|otf)$";

/// Extensions that may be omitted from import paths.
pub const RESOLVE_EXTENSIONS: &[&str] = &[".js", ".elm", ".scss"];

/// Build the base plan for a project rooted at `base_dir`.
pub fn base_plan(base_dir: &Path, settings: &ProjectSettings) -> Result<BasePlan, ConfigurationError> {
    let vendored = ExclusionSet::vendored(settings.exclude.as_slice())?;
    let exclusions = ExclusionRegistry::new().with(vendored);
    let source_dir = base_dir.join(&settings.source_dir);

    Ok(BasePlan {
        entry: source_dir.join(&settings.entry),
        output: OutputOverlay {
            directory: Some(base_dir.join(&settings.output_dir)),
            filename: None,
        },
        resolve: Resolution {
            search_paths: vec![source_dir, PathBuf::from("node_modules")],
            extensions: RESOLVE_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        },
        rules: vec![
            Rule::new(
                RulePattern::new(SCRIPT_PATTERN)?,
                VENDORED,
                vec![TransformStep::new("babel-loader")
                    .option("presets", json!(["@babel/preset-env"]))],
            )?,
            Rule::new(
                RulePattern::new(IMAGE_PATTERN)?,
                VENDORED,
                vec![TransformStep::new("file-loader")],
            )?,
            Rule::new(
                RulePattern::new(FONT_PATTERN)?,
                VENDORED,
                vec![TransformStep::new("file-loader")],
            )?,
        ],
        plugins: vec![Plugin::HtmlTemplate {
            template: Path::new(&settings.source_dir).join(&settings.template),
            inject: settings.inject.clone(),
        }],
        optimization: OptimizationOverlay::default(),
        exclusions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout() {
        let plan = base_plan(Path::new("/srv/app"), &ProjectSettings::default()).unwrap();

        assert_eq!(plan.entry, PathBuf::from("/srv/app/src/index.js"));
        assert_eq!(plan.output.directory, Some(PathBuf::from("/srv/app/dist")));
        assert!(plan.output.filename.is_none());
        assert_eq!(
            plan.resolve.search_paths,
            vec![PathBuf::from("/srv/app/src"), PathBuf::from("node_modules")]
        );
        assert_eq!(plan.resolve.extensions, vec![".js", ".elm", ".scss"]);
    }

    #[test]
    fn test_rules_share_vendored_exclusions() {
        let plan = base_plan(Path::new("/srv/app"), &ProjectSettings::default()).unwrap();

        let keys: Vec<_> = plan.rules.iter().map(|r| r.key()).collect();
        assert_eq!(keys, vec![SCRIPT_PATTERN, IMAGE_PATTERN, FONT_PATTERN]);
        assert!(plan.rules.iter().all(|r| r.exclude() == VENDORED));
        assert_eq!(
            plan.exclusions.get(VENDORED).unwrap().patterns(),
            &["**/elm-stuff/**", "**/node_modules/**"]
        );
    }

    #[test]
    fn test_babel_preset() {
        let plan = base_plan(Path::new("."), &ProjectSettings::default()).unwrap();
        let babel = &plan.rules[0].steps()[0];

        assert_eq!(babel.loader, "babel-loader");
        assert_eq!(babel.options["presets"], json!(["@babel/preset-env"]));
    }

    #[test]
    fn test_template_plugin() {
        let plan = base_plan(Path::new("."), &ProjectSettings::default()).unwrap();
        assert_eq!(
            plan.plugins,
            vec![Plugin::HtmlTemplate {
                template: PathBuf::from("src/index.html"),
                inject: "body".to_string(),
            }]
        );
    }

    #[test]
    fn test_extra_exclusions_from_settings() {
        let settings = ProjectSettings {
            exclude: vec!["**/generated/**".to_string()],
            ..Default::default()
        };
        let plan = base_plan(Path::new("."), &settings).unwrap();

        let set = plan.exclusions.get(VENDORED).unwrap();
        assert!(set.is_excluded(Path::new("src/generated/Api.js")));
    }

    #[test]
    fn test_invalid_extra_exclusion() {
        let settings = ProjectSettings {
            exclude: vec!["[".to_string()],
            ..Default::default()
        };
        let err = base_plan(Path::new("."), &settings).unwrap_err();
        assert!(matches!(err, ConfigurationError::InvalidGlob { .. }));
    }
}
