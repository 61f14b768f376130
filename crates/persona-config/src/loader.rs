// SPDX-FileCopyrightText: 2026 Persona Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered configuration loading with Figment.
//!
//! Lookup order: `/etc/persona/persona.toml`, then
//! `<config dir>/persona/persona.toml`, then `./persona.toml`, then
//! `PERSONA_*` environment variables.

#![allow(clippy::result_large_err)] // figment::Error is external

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::PersonaConfig;

/// Config file name searched in every layer.
pub const CONFIG_FILE_NAME: &str = "persona.toml";

/// Sections recognized in `PERSONA_<SECTION>_<KEY>` variable names.
const ENV_SECTIONS: &[&str] = &[
    "agent",
    "provider",
    "gemini",
    "openrouter",
    "reply",
    "storage",
    "channel",
];

/// Candidate config files, lowest priority first.
pub fn config_file_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("/etc/persona").join(CONFIG_FILE_NAME)];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("persona").join(CONFIG_FILE_NAME));
    }
    paths.push(PathBuf::from(CONFIG_FILE_NAME));
    paths
}

/// Builds the full layered figment without extracting it.
pub fn build_figment() -> Figment {
    config_file_paths()
        .into_iter()
        .fold(
            Figment::new().merge(Serialized::defaults(PersonaConfig::default())),
            |figment, path| figment.merge(Toml::file(path)),
        )
        .merge(env_provider())
}

/// Loads configuration from the standard hierarchy with env var overrides.
pub fn load_config() -> Result<PersonaConfig, figment::Error> {
    build_figment().extract()
}

/// Loads configuration from an explicit file, still honoring env overrides.
pub fn load_config_from_path(path: &Path) -> Result<PersonaConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(PersonaConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Loads configuration from a TOML string only (no files, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<PersonaConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(PersonaConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Maps `PERSONA_GEMINI_API_KEY` to `gemini.api_key`.
///
/// Only the first underscore after a known section name becomes a dot, so
/// keys that contain underscores survive intact.
fn env_provider() -> Env {
    Env::prefixed("PERSONA_").map(|key| {
        let key = key.as_str().to_ascii_lowercase();
        ENV_SECTIONS
            .iter()
            .find_map(|section| {
                key.strip_prefix(section)
                    .and_then(|rest| rest.strip_prefix('_'))
                    .map(|rest| format!("{section}.{rest}"))
            })
            .unwrap_or(key)
            .into()
    })
}
