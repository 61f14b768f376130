// SPDX-FileCopyrightText: 2026 Persona Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Persona chat bot.
//!
//! This crate provides the error type, the shared domain types, and the
//! adapter traits that the storage and AI provider crates implement. It also
//! hosts the rate-limit retry policy shared by every provider backend.

pub mod error;
pub mod retry;
pub mod traits;
pub mod types;

pub use error::PersonaError;
pub use retry::RetryPolicy;
pub use traits::{AiProvider, PluginAdapter};
pub use types::{
    AdapterType, ChatRole, ChatTurn, GenerationRequest, GenerationResponse, HealthStatus,
    InboundMessage, KnowledgeEntry, NewKnowledgeEntry, OutboundMessage, SearchResult,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persona_error_has_all_variants() {
        let _config = PersonaError::Config("test".into());
        let _storage = PersonaError::Storage {
            source: Box::new(std::io::Error::other("test")),
        };
        let _provider = PersonaError::Provider {
            message: "test".into(),
            source: None,
        };
        let _limited = PersonaError::RateLimited {
            message: "slow down".into(),
        };
        let _input = PersonaError::InvalidInput("test".into());
        let _io = PersonaError::Io {
            source: std::io::Error::other("test"),
        };
        let _internal = PersonaError::Internal("test".into());
    }

    #[test]
    fn adapter_type_display_round_trip() {
        use std::str::FromStr;

        for variant in [AdapterType::Provider, AdapterType::Storage] {
            let s = variant.to_string();
            let parsed = AdapterType::from_str(&s).expect("should parse back");
            assert_eq!(variant, parsed);
        }
    }

    #[test]
    fn all_traits_are_exported() {
        fn _assert_plugin_adapter<T: PluginAdapter>() {}
        fn _assert_ai_provider<T: AiProvider>() {}
    }
}
