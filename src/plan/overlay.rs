//! Development and production overlays.
//!
//! Both environments declare a stylesheet rule and a functional-language
//! rule with the same keys; their chains are mutually exclusive and rely on
//! the keyed replacement in [`super::merge`].

use plan_schema::{
    ConfigurationError, DevServer, Minimizer, Mode, OptimizationOverlay, OutputOverlay, Overlay,
    Plugin, Rule, RulePattern, ScriptCompress, TransformStep, VENDORED,
};
use std::path::Path;

use crate::settings::ProjectSettings;

/// Stylesheets.
pub const STYLE_PATTERN: &str = r"\.scss$";
/// Functional-language modules.
pub const ELM_PATTERN: &str = r"\.elm$";

/// Development bundle names: stable per entry, no content hash.
pub const DEV_FILENAME: &str = "js/[name].bundle.js";
/// Production bundle names carry a content hash.
pub const PROD_FILENAME: &str = "js/[name]-[hash].bundle.js";

pub const PROD_CSS_FILENAME: &str = "css/[name]-[hash].css";
pub const PROD_CSS_CHUNK_FILENAME: &str = "css/[id]-[hash].css";

/// Marker file read by static hosting to bind the custom domain.
pub const MARKER_FILE: &str = "CNAME";

/// Loader that hands styles to the extract plugin instead of injecting them.
pub const EXTRACT_CSS_LOADER: &str = "mini-css-extract-plugin/loader";

/// Overlay for `mode`.
pub fn overlay_for(
    mode: Mode,
    base_dir: &Path,
    settings: &ProjectSettings,
) -> Result<Overlay, ConfigurationError> {
    match mode {
        Mode::Development => development(base_dir, settings),
        Mode::Production => production(base_dir, settings),
    }
}

/// Fast rebuilds: styles injected at runtime, hot-reloaded debug modules,
/// no minification, assets served from disk with SPA fallback.
pub fn development(base_dir: &Path, settings: &ProjectSettings) -> Result<Overlay, ConfigurationError> {
    let cwd = base_dir.to_string_lossy().to_string();

    Ok(Overlay {
        output: OutputOverlay {
            directory: None,
            filename: Some(DEV_FILENAME.to_string()),
        },
        rules: vec![
            style_rule("style-loader")?,
            Rule::new(
                RulePattern::new(ELM_PATTERN)?,
                VENDORED,
                vec![
                    TransformStep::new("elm-hot-webpack-loader"),
                    TransformStep::new("elm-webpack-loader")
                        .option("cwd", cwd)
                        .option("debug", true),
                ],
            )?,
        ],
        optimization: Some(OptimizationOverlay {
            minimize: Some(false),
            minimizers: Vec::new(),
        }),
        dev_server: Some(DevServer {
            inline: true,
            stats: "errors-only".to_string(),
            history_api_fallback: true,
            content_base: base_dir.join(&settings.assets_dir),
        }),
        ..Overlay::new(Mode::Development.as_str())
    })
}

/// Cacheable output: cleaned directory, hashed names, extracted and
/// minified styles, optimized modules, and the domain marker file.
pub fn production(base_dir: &Path, settings: &ProjectSettings) -> Result<Overlay, ConfigurationError> {
    let cwd = base_dir.to_string_lossy().to_string();

    Ok(Overlay {
        output: OutputOverlay {
            directory: None,
            filename: Some(PROD_FILENAME.to_string()),
        },
        plugins: vec![
            Plugin::Clean {
                root: base_dir.to_path_buf(),
                exclude: Vec::new(),
                verbose: true,
                dry: false,
            },
            Plugin::CopyStatic {
                from: settings.assets_dir.clone().into(),
            },
            Plugin::ExtractCss {
                filename: PROD_CSS_FILENAME.to_string(),
                chunk_filename: PROD_CSS_CHUNK_FILENAME.to_string(),
            },
            Plugin::CreateFile {
                directory: base_dir.join(&settings.output_dir),
                file_name: MARKER_FILE.to_string(),
                content: settings.domain.clone(),
            },
        ],
        rules: vec![
            style_rule(EXTRACT_CSS_LOADER)?,
            Rule::new(
                RulePattern::new(ELM_PATTERN)?,
                VENDORED,
                vec![TransformStep::new("elm-webpack-loader")
                    .option("cwd", cwd)
                    .option("optimize", true)],
            )?,
        ],
        optimization: Some(OptimizationOverlay {
            minimize: Some(true),
            minimizers: vec![
                Minimizer::Css,
                Minimizer::Script {
                    compress: ScriptCompress::default(),
                    mangle: true,
                },
            ],
        }),
        ..Overlay::new(Mode::Production.as_str())
    })
}

/// `<first> -> css-loader -> sass-loader`; only the first step differs
/// between environments.
fn style_rule(first: &str) -> Result<Rule, ConfigurationError> {
    Rule::new(
        RulePattern::new(STYLE_PATTERN)?,
        VENDORED,
        vec![
            TransformStep::new(first),
            TransformStep::new("css-loader"),
            TransformStep::new("sass-loader"),
        ],
    )
}
