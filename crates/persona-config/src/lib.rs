// SPDX-FileCopyrightText: 2026 Persona Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the Persona chat bot.
//!
//! TOML files are merged over compiled defaults and `PERSONA_*` environment
//! variables override both. Every problem found is reported at once as a
//! miette diagnostic.
//!
//! ```no_run
//! use persona_config::load_and_validate;
//!
//! let config = load_and_validate(None).expect("config errors");
//! println!("active provider: {}", config.provider.active);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

use std::path::Path;

use persona_core::PersonaError;

pub use diagnostic::{ConfigError, render_errors};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::{PersonaConfig, ProviderKind};

/// Loads and validates configuration.
///
/// With `path`, only that file is read (plus env overrides); otherwise the
/// standard hierarchy is used.
pub fn load_and_validate(path: Option<&Path>) -> Result<PersonaConfig, Vec<ConfigError>> {
    let loaded = match path {
        Some(path) => loader::load_config_from_path(path),
        None => loader::load_config(),
    };

    match loaded {
        Ok(config) => {
            validation::validate_config(&config)?;
            tracing::debug!(provider = %config.provider.active, "configuration loaded");
            Ok(config)
        }
        Err(err) => {
            let sources = match path {
                Some(path) => read_sources([path.to_path_buf()]),
                None => read_sources(loader::config_file_paths()),
            };
            Err(diagnostic::figment_to_config_errors(err, &sources))
        }
    }
}

/// Loads and validates configuration from a TOML string.
pub fn load_and_validate_str(toml_content: &str) -> Result<PersonaConfig, Vec<ConfigError>> {
    match loader::load_config_from_str(toml_content) {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => {
            let sources = vec![("<inline>".to_string(), toml_content.to_string())];
            Err(diagnostic::figment_to_config_errors(err, &sources))
        }
    }
}

/// Returns the configured API key, else the value of `env_var`.
///
/// Empty strings count as unset.
pub fn resolve_api_key(configured: Option<&str>, env_var: &str) -> Result<String, PersonaError> {
    if let Some(key) = configured.map(str::trim)
        && !key.is_empty()
    {
        return Ok(key.to_string());
    }

    std::env::var(env_var)
        .ok()
        .filter(|key| !key.trim().is_empty())
        .ok_or_else(|| {
            PersonaError::Config(format!(
                "API key not found. Set it in persona.toml or the {env_var} environment variable."
            ))
        })
}

/// Reads config files for diagnostic spans, keyed by the path Figment reports.
fn read_sources(paths: impl IntoIterator<Item = std::path::PathBuf>) -> Vec<(String, String)> {
    paths
        .into_iter()
        .filter_map(|path| {
            let content = std::fs::read_to_string(&path).ok()?;
            let absolute = if path.is_relative() {
                std::env::current_dir().ok()?.join(&path)
            } else {
                path
            };
            Some((absolute.display().to_string(), content))
        })
        .collect()
}
