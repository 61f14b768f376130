// SPDX-FileCopyrightText: 2026 Persona Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-processing of raw model output.

use std::sync::LazyLock;

use regex::Regex;

static CITATION_MARKER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[\d+\]").unwrap());

static SPACE_BEFORE_PUNCTUATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+([,.!?])").unwrap());

/// Removes `[n]` citation markers, pulls sentence punctuation back onto the
/// preceding word, and trims the result.
pub fn clean_response(raw: &str) -> String {
    let without_citations = CITATION_MARKER.replace_all(raw, "");
    SPACE_BEFORE_PUNCTUATION
        .replace_all(&without_citations, "$1")
        .trim()
        .to_string()
}
