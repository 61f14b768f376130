// SPDX-FileCopyrightText: 2026 Persona Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `persona check` command implementation.
//!
//! Verifies that the knowledge store opens and answers queries and that the
//! configured AI provider accepts a minimal request.

use std::io::IsTerminal;
use std::time::{Duration, Instant};

use colored::Colorize;

use persona_config::PersonaConfig;
use persona_core::{AiProvider, HealthStatus, PersonaError, PluginAdapter};

use crate::providers::create_provider;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckStatus {
    Pass,
    Fail,
}

/// Result of a single check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub duration: Duration,
}

impl CheckResult {
    fn new(name: &str, status: CheckStatus, message: impl Into<String>, start: Instant) -> Self {
        Self {
            name: name.to_string(),
            status,
            message: message.into(),
            duration: start.elapsed(),
        }
    }
}

/// Runs every check and prints a report. Fails when any check fails.
pub async fn run_check(config: &PersonaConfig, plain: bool) -> Result<(), PersonaError> {
    let use_color = !plain && std::io::stdout().is_terminal();

    let results = vec![
        check_store(config).await,
        check_provider(config).await,
    ];

    println!();
    println!("  persona check");
    println!("  {}", "-".repeat(50));
    for result in &results {
        println!("{}", render(result, use_color));
    }
    println!();

    let failed = results
        .iter()
        .filter(|r| r.status == CheckStatus::Fail)
        .count();
    if failed > 0 {
        return Err(PersonaError::Internal(format!("{failed} check(s) failed")));
    }
    println!("  All checks passed.");
    println!();
    Ok(())
}

fn render(result: &CheckResult, use_color: bool) -> String {
    let duration_ms = result.duration.as_millis();
    match (&result.status, use_color) {
        (CheckStatus::Pass, true) => format!(
            "    {} {:<20} {} ({duration_ms}ms)",
            "✓".green(),
            result.name,
            result.message
        ),
        (CheckStatus::Fail, true) => format!(
            "    {} {:<20} {} ({duration_ms}ms)",
            "✗".red(),
            result.name,
            result.message.red()
        ),
        (CheckStatus::Pass, false) => format!(
            "    [OK]   {:<20} {} ({duration_ms}ms)",
            result.name, result.message
        ),
        (CheckStatus::Fail, false) => format!(
            "    [FAIL] {:<20} {} ({duration_ms}ms)",
            result.name, result.message
        ),
    }
}

/// Opens the store, runs its health query, and counts entries.
async fn check_store(config: &PersonaConfig) -> CheckResult {
    let start = Instant::now();
    let name = "Knowledge store";

    let store = match persona_storage::open_store(&config.storage).await {
        Ok(store) => store,
        Err(e) => return CheckResult::new(name, CheckStatus::Fail, e.to_string(), start),
    };

    match store.health_check().await {
        Ok(HealthStatus::Healthy) => {}
        Ok(status) => {
            return CheckResult::new(name, CheckStatus::Fail, format!("{status:?}"), start);
        }
        Err(e) => return CheckResult::new(name, CheckStatus::Fail, e.to_string(), start),
    }

    match store.count().await {
        Ok(count) => CheckResult::new(
            name,
            CheckStatus::Pass,
            format!("{count} entries in {}", config.storage.database_path),
            start,
        ),
        Err(e) => CheckResult::new(name, CheckStatus::Fail, e.to_string(), start),
    }
}

/// Sends the provider's connection probe.
async fn check_provider(config: &PersonaConfig) -> CheckResult {
    let start = Instant::now();
    let name = "AI provider";

    let provider = match create_provider(config) {
        Ok(provider) => provider,
        Err(e) => return CheckResult::new(name, CheckStatus::Fail, e.to_string(), start),
    };

    probe(provider.as_ref(), name, start).await
}

async fn probe(provider: &dyn AiProvider, name: &str, start: Instant) -> CheckResult {
    let label = format!("{} ({})", provider.name(), provider.model());
    if provider.test_connection().await {
        CheckResult::new(name, CheckStatus::Pass, format!("{label} reachable"), start)
    } else {
        CheckResult::new(
            name,
            CheckStatus::Fail,
            format!("{label} did not answer"),
            start,
        )
    }
}

#[cfg(test)]
mod tests {
    use persona_test_utils::MockProvider;

    use super::*;

    #[tokio::test]
    async fn probe_reports_reachability() {
        let ok = probe(&MockProvider::new(), "AI provider", Instant::now()).await;
        assert_eq!(ok.status, CheckStatus::Pass);
        assert!(ok.message.contains("mock-provider (mock-model)"));

        let down = probe(&MockProvider::unreachable(), "AI provider", Instant::now()).await;
        assert_eq!(down.status, CheckStatus::Fail);
    }

    #[tokio::test]
    async fn store_check_passes_on_fresh_database() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = PersonaConfig::default();
        config.storage.database_path = dir.path().join("k.db").display().to_string();

        let result = check_store(&config).await;
        assert_eq!(result.status, CheckStatus::Pass, "{}", result.message);
        assert!(result.message.starts_with("0 entries"));
    }

    #[test]
    fn plain_render_has_no_escape_codes() {
        let result = CheckResult {
            name: "AI provider".into(),
            status: CheckStatus::Fail,
            message: "gemini did not answer".into(),
            duration: Duration::from_millis(12),
        };
        let line = render(&result, false);
        assert!(line.contains("[FAIL]"));
        assert!(line.ends_with("gemini did not answer (12ms)"));
        assert!(!line.contains('\u{1b}'));
    }
}
