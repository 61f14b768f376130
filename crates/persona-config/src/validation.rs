// SPDX-FileCopyrightText: 2026 Persona Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.

use crate::diagnostic::ConfigError;
use crate::model::PersonaConfig;

/// Checks semantic constraints serde cannot express.
///
/// Collects every problem instead of stopping at the first one.
pub fn validate_config(config: &PersonaConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    if config.storage.database_path.trim().is_empty() {
        fail("storage.database_path must not be empty".to_string());
    }

    if config.reply.delay_min_ms > config.reply.delay_max_ms {
        fail(format!(
            "reply.delay_min_ms ({}) must not exceed reply.delay_max_ms ({})",
            config.reply.delay_min_ms, config.reply.delay_max_ms
        ));
    }

    if config.reply.max_history == 0 {
        fail("reply.max_history must be at least 1".to_string());
    }

    if config.reply.retrieval_limit == 0 {
        fail("reply.retrieval_limit must be at least 1".to_string());
    }

    for (section, model) in [
        ("gemini", &config.gemini.model),
        ("openrouter", &config.openrouter.model),
    ] {
        if model.trim().is_empty() {
            fail(format!("{section}.model must not be empty"));
        }
    }

    if config.agent.fallback_reply.trim().is_empty() {
        fail("agent.fallback_reply must not be empty".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(validate_config(&PersonaConfig::default()).is_ok());
    }

    #[test]
    fn inverted_delay_range_fails() {
        let mut config = PersonaConfig::default();
        config.reply.delay_min_ms = 5000;
        config.reply.delay_max_ms = 100;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("delay_min_ms"));
    }

    #[test]
    fn equal_delay_bounds_are_allowed() {
        let mut config = PersonaConfig::default();
        config.reply.delay_min_ms = 0;
        config.reply.delay_max_ms = 0;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn collects_all_errors() {
        let mut config = PersonaConfig::default();
        config.storage.database_path = "  ".to_string();
        config.reply.max_history = 0;
        config.gemini.model = String::new();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }
}
