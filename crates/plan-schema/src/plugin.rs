//! Plugins and optimization directives.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// An output-producing unit not tied to a file extension.
///
/// Plugins run in the order they appear in a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Plugin {
    /// Render the entry page from a markup template.
    HtmlTemplate { template: PathBuf, inject: String },

    /// Remove artifacts of a previous build before writing.
    Clean {
        root: PathBuf,
        #[serde(default)]
        exclude: Vec<String>,
        verbose: bool,
        dry: bool,
    },

    /// Copy a static directory into the output verbatim.
    CopyStatic { from: PathBuf },

    /// Extract stylesheets into standalone files.
    ExtractCss {
        filename: String,
        chunk_filename: String,
    },

    /// Write a fixed file into the output.
    CreateFile {
        directory: PathBuf,
        file_name: String,
        content: String,
    },
}

impl Plugin {
    /// Short identifier used in logs and explanations.
    pub fn kind(&self) -> &'static str {
        match self {
            Plugin::HtmlTemplate { .. } => "html_template",
            Plugin::Clean { .. } => "clean",
            Plugin::CopyStatic { .. } => "copy_static",
            Plugin::ExtractCss { .. } => "extract_css",
            Plugin::CreateFile { .. } => "create_file",
        }
    }
}

/// Helper functions emitted by the functional-language compiler that are
/// free of side effects: the curried-application wrappers `F2`..`F9` and
/// `A2`..`A9`.
///
/// The minifier may drop calls to these when their result is unused. A name
/// missing from this list costs only size; a name with side effects on this
/// list miscompiles silently.
pub const PURE_HELPERS: &[&str] = &[
    "F2", "F3", "F4", "F5", "F6", "F7", "F8", "F9", "A2", "A3", "A4", "A5", "A6", "A7", "A8",
    "A9",
];

/// Script compressor settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptCompress {
    pub pure_funcs: Vec<String>,
    pub pure_getters: bool,
    pub keep_fargs: bool,
    pub unsafe_comps: bool,
    #[serde(rename = "unsafe")]
    pub unsafe_transforms: bool,
    pub passes: u32,
}

impl Default for ScriptCompress {
    fn default() -> Self {
        Self {
            pure_funcs: PURE_HELPERS.iter().map(|s| s.to_string()).collect(),
            pure_getters: true,
            keep_fargs: false,
            unsafe_comps: true,
            unsafe_transforms: true,
            passes: 3,
        }
    }
}

/// One minification pass over emitted output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Minimizer {
    Css,
    Script { compress: ScriptCompress, mangle: bool },
}

/// Optimization directives as written by a base plan or an overlay.
///
/// `minimize` left unset defers to the other side of a merge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizationOverlay {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimize: Option<bool>,

    #[serde(default)]
    pub minimizers: Vec<Minimizer>,
}

/// Resolved optimization directives of a plan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Optimization {
    pub minimize: bool,
    pub minimizers: Vec<Minimizer>,
}

/// Local serving configuration used in development.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DevServer {
    /// Inject the live-reload client into the bundle.
    pub inline: bool,
    pub stats: String,
    /// Serve the entry page for any unmatched path.
    pub history_api_fallback: bool,
    pub content_base: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pure_helpers_cover_arities() {
        assert_eq!(PURE_HELPERS.len(), 16);
        for n in 2..=9 {
            assert!(PURE_HELPERS.contains(&format!("F{}", n).as_str()));
            assert!(PURE_HELPERS.contains(&format!("A{}", n).as_str()));
        }
    }

    #[test]
    fn test_script_compress_defaults() {
        let compress = ScriptCompress::default();
        assert!(compress.pure_getters);
        assert!(!compress.keep_fargs);
        assert_eq!(compress.passes, 3);

        let value = serde_json::to_value(&compress).unwrap();
        assert_eq!(value["unsafe"], json!(true));
        assert_eq!(value["pure_funcs"][0], json!("F2"));
    }

    #[test]
    fn test_plugin_tagging() {
        let plugin = Plugin::CreateFile {
            directory: PathBuf::from("dist"),
            file_name: "CNAME".to_string(),
            content: "example.org".to_string(),
        };
        let value = serde_json::to_value(&plugin).unwrap();

        assert_eq!(value["kind"], json!("create_file"));
        assert_eq!(plugin.kind(), "create_file");

        let parsed: Plugin = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, plugin);
    }
}
