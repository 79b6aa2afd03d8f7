//! # aawga-settings
//!
//! Configuration for the artifact generation pipeline.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults**: [`AawgaSettings::default()`]
//! 2. **User file**: `~/.aawga/settings.json` (deep-merged over defaults)
//! 3. **Environment variables**: `AAWGA_*`, `USE_DUMMY_AGENT`, `OPENAI_API_KEY`
//!
//! Loading happens once, in the binary. The resulting value is handed to
//! the workflow factory, which turns it into explicit constructor arguments;
//! nothing downstream reads the process environment.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{
    apply_env_overrides, apply_env_overrides_from, deep_merge, load_settings,
    load_settings_from_path, settings_path, validate,
};
pub use types::*;
