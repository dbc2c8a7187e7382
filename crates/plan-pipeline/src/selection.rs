//! Choosing the rule for a path.

use plan_schema::{Plan, Rule};
use serde::Serialize;
use std::path::Path;

use crate::PipelineError;

/// Outcome of rule selection for one path.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection<'a> {
    /// No rule applies; the file is emitted unmodified.
    PassThrough,
    Rule(&'a Rule),
}

impl<'a> Selection<'a> {
    pub fn rule(&self) -> Option<&'a Rule> {
        match self {
            Selection::PassThrough => None,
            Selection::Rule(rule) => Some(rule),
        }
    }
}

/// Select the single rule that applies to `path`.
///
/// A rule applies when its pattern matches and its exclusion set does not
/// exclude the path. More than one applicable rule is an error.
pub fn select<'a>(plan: &'a Plan, path: &Path) -> Result<Selection<'a>, PipelineError> {
    let mut applicable: Vec<&Rule> = Vec::new();

    for rule in &plan.rules {
        if !rule.test().is_match(path) {
            continue;
        }
        let exclusions = plan.exclusions.get(rule.exclude()).ok_or_else(|| {
            PipelineError::MissingExclusionSet {
                pattern: rule.key().to_string(),
                name: rule.exclude().to_string(),
            }
        })?;
        if exclusions.is_excluded(path) {
            continue;
        }
        applicable.push(rule);
    }

    match applicable.as_slice() {
        [] => Ok(Selection::PassThrough),
        [rule] => Ok(Selection::Rule(rule)),
        many => Err(PipelineError::AmbiguousRule {
            path: path.to_path_buf(),
            patterns: many.iter().map(|r| r.key().to_string()).collect(),
        }),
    }
}

/// Why a path is or is not transformed, in a printable form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectionExplanation {
    pub path: String,
    pub mode: String,

    /// Pattern of the selected rule.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule: Option<String>,

    /// Loaders of the selected rule, in execution order.
    pub loaders: Vec<String>,

    /// Rules whose pattern matched but whose exclusion set skipped the path,
    /// with the excluding glob.
    pub excluded_by: Vec<ExcludedMatch>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExcludedMatch {
    pub rule: String,
    pub exclusion_set: String,
    pub glob: String,
}

impl SelectionExplanation {
    /// Human-readable summary
    pub fn to_human(&self) -> String {
        let mut out = format!("{} ({})\n", self.path, self.mode);
        match &self.rule {
            Some(rule) => {
                out.push_str(&format!("  rule: {}\n", rule));
                for (i, loader) in self.loaders.iter().enumerate() {
                    out.push_str(&format!("  {}. {}\n", i + 1, loader));
                }
            }
            None => out.push_str("  pass-through (no rule applies)\n"),
        }
        for excluded in &self.excluded_by {
            out.push_str(&format!(
                "  skipped {}: excluded by '{}' in set '{}'\n",
                excluded.rule, excluded.glob, excluded.exclusion_set
            ));
        }
        out
    }
}

/// Explain rule selection for `path`.
pub fn explain(plan: &Plan, path: &Path) -> Result<SelectionExplanation, PipelineError> {
    let selection = select(plan, path)?;

    let excluded_by = plan
        .rules
        .iter()
        .filter(|rule| rule.test().is_match(path))
        .filter_map(|rule| {
            let set = plan.exclusions.get(rule.exclude())?;
            let glob = set.matching_pattern(path)?;
            Some(ExcludedMatch {
                rule: rule.key().to_string(),
                exclusion_set: set.name().to_string(),
                glob: glob.to_string(),
            })
        })
        .collect();

    let rule = selection.rule();
    Ok(SelectionExplanation {
        path: path.to_string_lossy().to_string(),
        mode: plan.mode.to_string(),
        rule: rule.map(|r| r.key().to_string()),
        loaders: rule
            .map(|r| r.loaders().into_iter().map(String::from).collect())
            .unwrap_or_default(),
        excluded_by,
    })
}
