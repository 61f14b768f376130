// SPDX-FileCopyrightText: 2026 Persona Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Keyword extraction for knowledge lookups.

use std::collections::HashSet;

/// Indonesian and English function words that carry no retrieval signal.
pub const STOP_WORDS: &[&str] = &[
    // Indonesian
    "yang", "dan", "di", "dari", "untuk", "ke", "ini", "itu", "dengan", "pada", "adalah", "atau",
    "juga", "akan", "sudah", "tidak", "ada", "bisa", "saya", "kamu", "aku", "dia", "mereka",
    "kami", "kita", "apa",
    // English
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "is", "was", "are",
    "were", "be", "been", "have", "has", "had", "do", "does", "did", "will", "would", "could",
    "should",
];

/// Lowercased, de-duplicated content words of `text`, in first-seen order.
///
/// Punctuation becomes whitespace; single-character tokens, numbers, and
/// [`STOP_WORDS`] are dropped.
pub fn extract_keywords(text: &str) -> Vec<String> {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { ' ' })
        .collect();

    let mut seen = HashSet::new();
    cleaned
        .split_whitespace()
        .filter(|word| word.chars().count() > 1)
        .filter(|word| !word.chars().all(char::is_numeric))
        .filter(|word| !STOP_WORDS.contains(word))
        .filter(|word| seen.insert(word.to_string()))
        .map(str::to_string)
        .collect()
}

/// Builds an FTS5 expression matching any keyword.
///
/// Each keyword is quoted so words like `not` or `near` are taken literally.
pub fn or_query(keywords: &[String]) -> String {
    keywords
        .iter()
        .map(|k| format!("\"{}\"", k.replace('"', "\"\"")))
        .collect::<Vec<_>>()
        .join(" OR ")
}
