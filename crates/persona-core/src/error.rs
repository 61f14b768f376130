// SPDX-FileCopyrightText: 2026 Persona Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Persona chat bot.

use thiserror::Error;

/// The primary error type used across all Persona crates.
#[derive(Debug, Error)]
pub enum PersonaError {
    /// Configuration errors (invalid TOML, missing API keys, bad ranges).
    #[error("configuration error: {0}")]
    Config(String),

    /// Knowledge store errors (database open, malformed query, constraint failure).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// AI provider errors (transport failure, non-success status, empty output).
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The provider kept signalling rate limiting after every retry.
    #[error("rate limited: {message}")]
    RateLimited { message: String },

    /// Caller supplied input that cannot be processed.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// File system errors (chat export or persona prompt files).
    #[error("i/o error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl PersonaError {
    /// Convenience constructor for provider errors without an underlying cause.
    pub fn provider(message: impl Into<String>) -> Self {
        Self::Provider {
            message: message.into(),
            source: None,
        }
    }

    /// Wraps any error as a storage error.
    pub fn storage<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Storage {
            source: Box::new(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_constructor_has_no_source() {
        let err = PersonaError::provider("No response from AI");
        assert_eq!(err.to_string(), "provider error: No response from AI");
        assert!(std::error::Error::source(&err).is_none());
    }

    #[test]
    fn io_errors_convert() {
        fn open() -> Result<(), PersonaError> {
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "chat.txt"))?;
            Ok(())
        }
        assert!(matches!(open(), Err(PersonaError::Io { .. })));
    }
}
