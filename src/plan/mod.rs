//! Plan assembly
//!
//! A plan is assembled in three steps:
//! 1. Base plan and its exclusion set, built once from settings
//! 2. The overlay for the requested environment
//! 3. Merge of the two

mod base;
mod merge;
mod overlay;

pub use base::{base_plan, FONT_PATTERN, IMAGE_PATTERN, RESOLVE_EXTENSIONS, SCRIPT_PATTERN};
pub use merge::{merge, merge_with, MergePolicy, MergeReport};
pub use overlay::{
    development, overlay_for, production, DEV_FILENAME, ELM_PATTERN, EXTRACT_CSS_LOADER,
    MARKER_FILE, PROD_FILENAME, STYLE_PATTERN,
};

use plan_schema::{AssemblyError, Mode, Plan};
use std::path::Path;

use crate::settings::EffectiveSettings;

/// Assemble the development plan for a project using built-in settings.
pub fn assemble_development(base_dir: &Path) -> Result<Plan, AssemblyError> {
    assemble(Mode::Development, &EffectiveSettings::builtin(base_dir))
}

/// Assemble the production plan for a project using built-in settings.
pub fn assemble_production(base_dir: &Path) -> Result<Plan, AssemblyError> {
    assemble(Mode::Production, &EffectiveSettings::builtin(base_dir))
}

/// Assemble the plan for `mode` with the lenient merge policy.
pub fn assemble(mode: Mode, effective: &EffectiveSettings) -> Result<Plan, AssemblyError> {
    assemble_with(mode, effective, MergePolicy::Lenient).map(|(plan, _)| plan)
}

/// Assemble the plan for `mode`, also returning what the overlay changed.
pub fn assemble_with(
    mode: Mode,
    effective: &EffectiveSettings,
    policy: MergePolicy,
) -> Result<(Plan, MergeReport), AssemblyError> {
    let base_dir = effective.base_dir.as_path();
    let base = base_plan(base_dir, &effective.settings)?;
    let overlay = overlay_for(mode, base_dir, &effective.settings)?;

    tracing::info!(%mode, base_dir = %base_dir.display(), "assembling plan");
    merge_with(&base, &overlay, policy)
}
