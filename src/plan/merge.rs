//! Plan merge engine
//!
//! Combines a base plan and one overlay into a plan:
//! - Scalars: overlay wins when set, otherwise base
//! - Positional lists (plugins, resolution, minimizers): base then overlay
//! - Rules: keyed by pattern; an overlay rule replaces the base rule with
//!   the same key in place, new keys are appended in overlay order
//! - Nested objects (output, resolve, optimization): merged field by field

use plan_schema::{
    AssemblyError, BasePlan, ConfigurationError, MergeConflictError, Mode, Optimization, Output,
    Overlay, Plan, Resolution, Rule, RuleOrigin,
};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt::Debug;

/// What to do when both sides set a scalar to different values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MergePolicy {
    /// Overlay wins; the override is logged as a warning.
    #[default]
    Lenient,
    /// Fail with a merge conflict.
    Strict,
}

/// Record of what the overlay changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    /// Keys of base rules replaced by overlay rules.
    pub replaced_rules: Vec<String>,
    /// Keys of rules only the overlay declares.
    pub added_rules: Vec<String>,
    /// Scalars set by both sides to different values.
    pub overridden: Vec<&'static str>,
}

/// Merge with the lenient policy.
pub fn merge(base: &BasePlan, overlay: &Overlay) -> Result<Plan, AssemblyError> {
    merge_with(base, overlay, MergePolicy::Lenient).map(|(plan, _)| plan)
}

/// Merge `overlay` onto `base`.
///
/// Rules are keyed by their pattern text: `\.(scss)$` does not replace
/// `\.scss$`. Two rules that both match a file named after one of the
/// plan's resolvable extensions fail the merge instead.
///
/// Fails without producing a plan if the overlay's mode is unknown, a rule
/// key repeats within one side, a rule names a missing exclusion set, rules
/// overlap on an extension, or a required field is set by neither side.
pub fn merge_with(
    base: &BasePlan,
    overlay: &Overlay,
    policy: MergePolicy,
) -> Result<(Plan, MergeReport), AssemblyError> {
    let mode: Mode = overlay.mode.parse()?;
    let mut report = MergeReport::default();

    let mut scalars = Scalars {
        policy,
        report: &mut report,
    };
    let entry = scalars
        .pick("entry", Some(&base.entry), overlay.entry.as_ref())?
        .ok_or(ConfigurationError::MissingField("entry"))?;
    let directory = scalars
        .pick(
            "output.directory",
            base.output.directory.as_ref(),
            overlay.output.directory.as_ref(),
        )?
        .ok_or(ConfigurationError::MissingField("output.directory"))?;
    let filename = scalars
        .pick(
            "output.filename",
            base.output.filename.as_ref(),
            overlay.output.filename.as_ref(),
        )?
        .ok_or(ConfigurationError::MissingField("output.filename"))?;

    let overlay_optimization = overlay.optimization.clone().unwrap_or_default();
    let minimize = scalars
        .pick(
            "optimization.minimize",
            base.optimization.minimize.as_ref(),
            overlay_optimization.minimize.as_ref(),
        )?
        .unwrap_or(false);

    let rules = merge_rules(&base.rules, &overlay.rules, &mut report)?;

    let plan = Plan {
        mode,
        entry,
        output: Output {
            directory,
            filename,
        },
        resolve: Resolution {
            search_paths: concat(&base.resolve.search_paths, &overlay.resolve.search_paths),
            extensions: concat(&base.resolve.extensions, &overlay.resolve.extensions),
        },
        rules,
        plugins: concat(&base.plugins, &overlay.plugins),
        optimization: Optimization {
            minimize,
            minimizers: concat(
                &base.optimization.minimizers,
                &overlay_optimization.minimizers,
            ),
        },
        dev_server: overlay.dev_server.clone(),
        exclusions: base.exclusions.clone(),
    };
    plan.validate()?;

    tracing::debug!(
        %mode,
        rules = plan.rules.len(),
        plugins = plan.plugins.len(),
        replaced = report.replaced_rules.len(),
        "merged plan"
    );

    Ok((plan, report))
}

struct Scalars<'r> {
    policy: MergePolicy,
    report: &'r mut MergeReport,
}

impl Scalars<'_> {
    fn pick<T: Clone + PartialEq + Debug>(
        &mut self,
        field: &'static str,
        base: Option<&T>,
        overlay: Option<&T>,
    ) -> Result<Option<T>, MergeConflictError> {
        match (base, overlay) {
            (Some(b), Some(o)) if b != o => {
                if self.policy == MergePolicy::Strict {
                    return Err(MergeConflictError {
                        field,
                        base: format!("{:?}", b),
                        overlay: format!("{:?}", o),
                    });
                }
                tracing::warn!(field, base = ?b, overlay = ?o, "overlay overrides base value");
                self.report.overridden.push(field);
                Ok(Some(o.clone()))
            }
            (_, Some(o)) => Ok(Some(o.clone())),
            (b, None) => Ok(b.cloned()),
        }
    }
}

fn merge_rules(
    base: &[Rule],
    overlay: &[Rule],
    report: &mut MergeReport,
) -> Result<Vec<Rule>, ConfigurationError> {
    ensure_unique(base, RuleOrigin::Base)?;
    ensure_unique(overlay, RuleOrigin::Overlay)?;

    let mut merged: Vec<Rule> = base
        .iter()
        .map(|rule| match overlay.iter().find(|o| o.key() == rule.key()) {
            Some(replacement) => {
                tracing::debug!(
                    rule = rule.key(),
                    base = ?rule.loaders(),
                    overlay = ?replacement.loaders(),
                    "overlay rule replaces base rule"
                );
                report.replaced_rules.push(rule.key().to_string());
                replacement.clone()
            }
            None => rule.clone(),
        })
        .collect();

    for rule in overlay {
        if !base.iter().any(|b| b.key() == rule.key()) {
            report.added_rules.push(rule.key().to_string());
            merged.push(rule.clone());
        }
    }

    Ok(merged)
}

fn ensure_unique(rules: &[Rule], origin: RuleOrigin) -> Result<(), ConfigurationError> {
    let mut seen = HashSet::new();
    for rule in rules {
        if !seen.insert(rule.key()) {
            return Err(ConfigurationError::DuplicateRule {
                pattern: rule.key().to_string(),
                origin,
            });
        }
    }
    Ok(())
}

fn concat<T: Clone>(base: &[T], overlay: &[T]) -> Vec<T> {
    base.iter().chain(overlay).cloned().collect()
}
