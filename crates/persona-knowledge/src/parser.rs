// SPDX-FileCopyrightText: 2026 Persona Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Parser for exported chat logs.
//!
//! Four line shapes start a new utterance:
//!
//! ```text
//! [DD/MM/YYYY, HH:MM:SS] Sender: message
//! DD/MM/YYYY, HH:MM - Sender: message
//! DD/MM/YY, HH:MM - Sender: message
//! DD/MM/YY HH.MM - Sender: message
//! ```
//!
//! Any other non-empty line continues the previous utterance.

use std::collections::{BTreeSet, HashMap};
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use persona_core::NewKnowledgeEntry;

/// Category assigned to entries produced from chat exports.
pub const IMPORTED_CATEGORY: &str = "imported_chat";

/// Substrings that mark channel-generated service events rather than speech.
pub const SERVICE_MARKERS: &[&str] = &[
    "Messages and calls are end-to-end encrypted",
    "created group",
    "changed the subject",
    "changed this group's icon",
    "left the group",
    "joined using",
    "<Media omitted>",
];

/// Line endings of membership notices such as `Sari left`.
pub const SERVICE_LINE_SUFFIXES: &[&str] = &[" left", " was removed"];

/// Timestamp/sender line shapes, most specific first.
static LINE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"^\[(\d{2}/\d{2}/\d{4},\s\d{2}:\d{2}:\d{2})\]\s([^:]+):\s(.*)$").unwrap(),
        Regex::new(r"^(\d{2}/\d{2}/\d{4},\s\d{2}:\d{2})\s-\s([^:]+):\s(.*)$").unwrap(),
        Regex::new(r"^(\d{2}/\d{2}/\d{2},\s\d{2}:\d{2})\s-\s([^:]+):\s(.*)$").unwrap(),
    ]
});

/// Dotted-time locale variant; normalized to `DD/MM/YY, HH:MM`.
static DOTTED_TIME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{2}/\d{2}/\d{2})\s(\d{2})\.(\d{2})\s-\s([^:]+):\s(.*)$").unwrap()
});

/// One message from the export, possibly spanning several lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedUtterance {
    pub timestamp: String,
    pub sender: String,
    pub message: String,
}

/// Message count for one sender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SenderCount {
    pub name: String,
    pub count: usize,
}

/// Summary used to pick which sender to import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatStats {
    pub total_messages: usize,
    pub unique_senders: usize,
    /// Sorted by count, highest first.
    pub senders: Vec<SenderCount>,
}

/// Splits a raw export into utterances.
pub fn parse(text: &str) -> Vec<ParsedUtterance> {
    let mut utterances: Vec<ParsedUtterance> = Vec::new();

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if let Some(utterance) = parse_line(line) {
            utterances.push(utterance);
        } else if let Some(current) = utterances.last_mut() {
            current.message.push('\n');
            current.message.push_str(line);
        }
    }

    utterances
}

fn parse_line(line: &str) -> Option<ParsedUtterance> {
    for pattern in LINE_PATTERNS.iter() {
        if let Some(caps) = pattern.captures(line) {
            return Some(ParsedUtterance {
                timestamp: caps[1].to_string(),
                sender: caps[2].trim().to_string(),
                message: caps[3].to_string(),
            });
        }
    }

    DOTTED_TIME_PATTERN.captures(line).map(|caps| ParsedUtterance {
        timestamp: format!("{}, {}:{}", &caps[1], &caps[2], &caps[3]),
        sender: caps[4].trim().to_string(),
        message: caps[5].to_string(),
    })
}

/// Keeps only utterances from `sender` (case-insensitive).
pub fn filter_by_sender(utterances: &[ParsedUtterance], sender: &str) -> Vec<ParsedUtterance> {
    utterances
        .iter()
        .filter(|u| same_sender(&u.sender, sender))
        .cloned()
        .collect()
}

fn same_sender(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

/// `true` if the message is a channel service event.
pub fn is_service_message(message: &str) -> bool {
    SERVICE_MARKERS.iter().any(|marker| message.contains(marker))
        || message
            .lines()
            .any(|line| SERVICE_LINE_SUFFIXES.iter().any(|s| line.ends_with(s)))
}

/// Maps utterances to knowledge entries, dropping service events and,
/// when `sender` is given, everyone else's messages.
pub fn convert_to_knowledge(
    utterances: &[ParsedUtterance],
    sender: Option<&str>,
) -> Vec<NewKnowledgeEntry> {
    utterances
        .iter()
        .filter(|u| !is_service_message(&u.message))
        .filter(|u| sender.is_none_or(|s| same_sender(&u.sender, s)))
        .map(|u| {
            NewKnowledgeEntry::new(u.message.clone(), IMPORTED_CATEGORY)
                .with_context(format!("From chat with {} at {}", u.sender, u.timestamp))
        })
        .collect()
}

/// Distinct senders, alphabetically.
pub fn unique_senders(utterances: &[ParsedUtterance]) -> Vec<String> {
    utterances
        .iter()
        .map(|u| u.sender.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Per-sender message counts, busiest sender first (ties by name).
pub fn chat_stats(utterances: &[ParsedUtterance]) -> ChatStats {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for u in utterances {
        *counts.entry(u.sender.as_str()).or_default() += 1;
    }

    let mut senders: Vec<SenderCount> = counts
        .into_iter()
        .map(|(name, count)| SenderCount {
            name: name.to_string(),
            count,
        })
        .collect();
    senders.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));

    ChatStats {
        total_messages: utterances.len(),
        unique_senders: senders.len(),
        senders,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bracketed_seconds_format() {
        let parsed = parse("[01/01/2024, 10:00:00] Budi: halo");
        assert_eq!(
            parsed,
            vec![ParsedUtterance {
                timestamp: "01/01/2024, 10:00:00".into(),
                sender: "Budi".into(),
                message: "halo".into(),
            }]
        );
    }

    #[test]
    fn continuation_lines_are_joined() {
        let parsed = parse("[01/01/2024, 10:00:00] Budi: halo\napa kabar");
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].message, "halo\napa kabar");
    }

    #[test]
    fn dashed_formats_with_both_year_widths() {
        let text = "12/03/2024, 09:15 - Sari: pagi\n12/03/24, 09:16 - Budi: pagi juga";
        let parsed = parse(text);
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].timestamp, "12/03/2024, 09:15");
        assert_eq!(parsed[1].timestamp, "12/03/24, 09:16");
        assert_eq!(parsed[1].sender, "Budi");
    }

    #[test]
    fn dotted_time_is_normalized() {
        let parsed = parse("05/06/24 21.30 - Adit: udah makan?");
        assert_eq!(parsed[0].timestamp, "05/06/24, 21:30");
        assert_eq!(parsed[0].sender, "Adit");
        assert_eq!(parsed[0].message, "udah makan?");
    }

    #[test]
    fn leading_orphan_lines_are_dropped() {
        let parsed = parse("random header\n\n   \n[01/01/2024, 10:00:00] Budi: halo\n");
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].message, "halo");
    }

    #[test]
    fn message_may_contain_colons() {
        let parsed = parse("01/01/24, 08:00 - Budi: jam 10:30 ya");
        assert_eq!(parsed[0].message, "jam 10:30 ya");
    }

    #[test]
    fn filter_is_case_insensitive() {
        let parsed = parse("01/01/24, 08:00 - Budi: a\n01/01/24, 08:01 - Sari: b");
        let only = filter_by_sender(&parsed, "budi");
        assert_eq!(only.len(), 1);
        assert_eq!(only[0].sender, "Budi");
    }

    #[test]
    fn service_events_are_skipped() {
        let text = "\
01/01/24, 08:00 - Budi: Messages and calls are end-to-end encrypted
01/01/24, 08:01 - Budi: <Media omitted>
01/01/24, 08:02 - Budi: Sari left
01/01/24, 08:03 - Budi: ketemu di kafe ya";
        let entries = convert_to_knowledge(&parse(text), None);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].content, "ketemu di kafe ya");
        assert_eq!(entries[0].category, IMPORTED_CATEGORY);
        assert_eq!(
            entries[0].context.as_deref(),
            Some("From chat with Budi at 01/01/24, 08:03")
        );
    }

    #[test]
    fn leftover_is_not_a_service_event() {
        assert!(!is_service_message("masih ada leftover pizza"));
        assert!(is_service_message("Budi left"));
    }

    #[test]
    fn convert_restricts_sender() {
        let parsed = parse("01/01/24, 08:00 - Budi: a1\n01/01/24, 08:01 - Sari: b2");
        let entries = convert_to_knowledge(&parsed, Some("SARI"));
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].content, "b2");
    }

    #[test]
    fn stats_sorted_by_count() {
        let text = "\
01/01/24, 08:00 - Budi: a
01/01/24, 08:01 - Sari: b
01/01/24, 08:02 - Sari: c
01/01/24, 08:03 - Adit: d";
        let parsed = parse(text);
        let stats = chat_stats(&parsed);
        assert_eq!(stats.total_messages, 4);
        assert_eq!(stats.unique_senders, 3);
        let names: Vec<_> = stats.senders.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Sari", "Adit", "Budi"]);
        assert_eq!(unique_senders(&parsed), vec!["Adit", "Budi", "Sari"]);
    }
}
