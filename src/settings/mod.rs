//! Project settings
//!
//! Settings parameterize plan assembly and are resolved in three layers:
//! 1. Built-in defaults
//! 2. Project file (`<base>/bundle-plan.toml` or an explicit path)
//! 3. CLI overrides

mod defaults;
mod effective;
mod layers;

pub use defaults::{ProjectSettings, DEFAULT_DOMAIN, SETTINGS_FILE};
pub use effective::{EffectiveSettings, SettingsError, SettingsOrigin, SettingsSource};
pub use layers::{deep_merge, merge_layers};
