//! Shared exclusion sets
//!
//! An exclusion set is compiled once and shared by every rule that names it.
//! Rules carry only the name; the registry owns the compiled sets.

use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use crate::error::ConfigurationError;

/// Name of the exclusion set every built-in rule references.
pub const VENDORED: &str = "vendored";

/// Vendored and generated directories that are never transformed.
pub const VENDORED_PATTERNS: &[&str] = &["**/elm-stuff/**", "**/node_modules/**"];

/// An immutable, named set of path globs.
#[derive(Debug, Clone)]
pub struct ExclusionSet {
    name: String,
    patterns: Vec<String>,
    glob_set: GlobSet,
}

impl ExclusionSet {
    /// Compile a set from its patterns.
    pub fn new<S: AsRef<str>>(name: &str, patterns: &[S]) -> Result<Self, ConfigurationError> {
        let mut builder = GlobSetBuilder::new();
        let mut kept = Vec::with_capacity(patterns.len());

        for pattern in patterns {
            let pattern = pattern.as_ref().trim();
            if pattern.is_empty() {
                continue;
            }
            let glob = Glob::new(pattern).map_err(|e| ConfigurationError::InvalidGlob {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            })?;
            builder.add(glob);
            kept.push(pattern.to_string());
        }

        let glob_set = builder.build().map_err(|e| ConfigurationError::InvalidGlob {
            pattern: kept.join(", "),
            reason: e.to_string(),
        })?;

        Ok(Self {
            name: name.to_string(),
            patterns: kept,
            glob_set,
        })
    }

    /// The vendored set, optionally extended with extra patterns.
    pub fn vendored<S: AsRef<str>>(extra: &[S]) -> Result<Self, ConfigurationError> {
        let mut patterns: Vec<&str> = VENDORED_PATTERNS.to_vec();
        patterns.extend(extra.iter().map(|p| p.as_ref()));
        Self::new(VENDORED, patterns.as_slice())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Check if a path should be left untouched
    pub fn is_excluded(&self, path: &Path) -> bool {
        let path_str = path.to_string_lossy();
        self.glob_set.is_match(path_str.as_ref())
    }

    /// The first pattern excluding `path`, for diagnostics.
    pub fn matching_pattern(&self, path: &Path) -> Option<&str> {
        let path_str = path.to_string_lossy();
        self.glob_set
            .matches(path_str.as_ref())
            .first()
            .map(|&i| self.patterns[i].as_str())
    }
}

impl PartialEq for ExclusionSet {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.patterns == other.patterns
    }
}

/// Every exclusion set known to a plan, keyed by name.
///
/// Cloning the registry clones `Arc`s, never the compiled sets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, Vec<String>>", into = "BTreeMap<String, Vec<String>>")]
pub struct ExclusionRegistry {
    sets: BTreeMap<String, Arc<ExclusionSet>>,
}

impl ExclusionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a set under its own name. A later set with the same name
    /// replaces the earlier one.
    pub fn with(mut self, set: ExclusionSet) -> Self {
        self.insert(Arc::new(set));
        self
    }

    pub fn insert(&mut self, set: Arc<ExclusionSet>) {
        self.sets.insert(set.name().to_string(), set);
    }

    pub fn get(&self, name: &str) -> Option<&Arc<ExclusionSet>> {
        self.sets.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.sets.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<ExclusionSet>> {
        self.sets.values()
    }
}

impl TryFrom<BTreeMap<String, Vec<String>>> for ExclusionRegistry {
    type Error = ConfigurationError;

    fn try_from(raw: BTreeMap<String, Vec<String>>) -> Result<Self, Self::Error> {
        let mut registry = Self::new();
        for (name, patterns) in raw {
            registry.insert(Arc::new(ExclusionSet::new(&name, patterns.as_slice())?));
        }
        Ok(registry)
    }
}

impl From<ExclusionRegistry> for BTreeMap<String, Vec<String>> {
    fn from(registry: ExclusionRegistry) -> Self {
        registry
            .sets
            .into_iter()
            .map(|(name, set)| (name, set.patterns.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vendored_excludes_dependencies() {
        let set = ExclusionSet::vendored::<&str>(&[]).unwrap();

        assert!(set.is_excluded(Path::new("node_modules/lodash/index.js")));
        assert!(set.is_excluded(Path::new("web/node_modules/x.js")));
        assert!(set.is_excluded(Path::new("elm-stuff/0.19.1/Main.elm")));
    }

    #[test]
    fn test_sources_not_excluded() {
        let set = ExclusionSet::vendored::<&str>(&[]).unwrap();

        assert!(!set.is_excluded(Path::new("src/index.js")));
        assert!(!set.is_excluded(Path::new("src/Main.elm")));
        assert!(!set.is_excluded(Path::new("src/node_modules.js")));
    }

    #[test]
    fn test_extra_patterns() {
        let set = ExclusionSet::vendored(&["**/generated/**", "  "]).unwrap();

        assert_eq!(set.patterns().len(), 3);
        assert!(set.is_excluded(Path::new("src/generated/Api.elm")));
        assert_eq!(
            set.matching_pattern(Path::new("src/generated/Api.elm")),
            Some("**/generated/**")
        );
        assert_eq!(set.matching_pattern(Path::new("src/Main.elm")), None);
    }

    #[test]
    fn test_invalid_glob() {
        let err = ExclusionSet::new("bad", &["a/[b"]).unwrap_err();
        assert!(matches!(err, ConfigurationError::InvalidGlob { .. }));
    }

    #[test]
    fn test_registry_shares_sets() {
        let registry = ExclusionRegistry::new().with(ExclusionSet::vendored::<&str>(&[]).unwrap());
        let copy = registry.clone();

        assert!(Arc::ptr_eq(
            registry.get(VENDORED).unwrap(),
            copy.get(VENDORED).unwrap()
        ));
        assert!(!registry.contains("other"));
    }

    #[test]
    fn test_registry_serializes_as_patterns() {
        let registry = ExclusionRegistry::new().with(ExclusionSet::vendored::<&str>(&[]).unwrap());
        let json = serde_json::to_value(&registry).unwrap();

        assert_eq!(
            json,
            serde_json::json!({"vendored": ["**/elm-stuff/**", "**/node_modules/**"]})
        );

        let parsed: ExclusionRegistry = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, registry);
    }
}
