// SPDX-FileCopyrightText: 2026 Persona Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bounded per-conversation turn history.
//!
//! Each conversation owns its own deque behind a sharded map, so
//! independent conversations never contend on a shared lock.

use std::collections::VecDeque;

use dashmap::DashMap;

use persona_core::{ChatRole, ChatTurn};

/// Default number of turns kept per conversation.
pub const DEFAULT_MAX_TURNS: usize = 20;

/// In-process conversation history, evicting the oldest turn first.
#[derive(Debug)]
pub struct ConversationMemory {
    conversations: DashMap<String, VecDeque<ChatTurn>>,
    max_turns: usize,
}

impl Default for ConversationMemory {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_TURNS)
    }
}

impl ConversationMemory {
    /// A `max_turns` of zero is treated as one.
    pub fn new(max_turns: usize) -> Self {
        Self {
            conversations: DashMap::new(),
            max_turns: max_turns.max(1),
        }
    }

    pub fn max_turns(&self) -> usize {
        self.max_turns
    }

    /// Appends a turn, dropping the oldest ones past the cap.
    pub fn add_turn(&self, conversation_id: &str, role: ChatRole, content: impl Into<String>) {
        let mut turns = self
            .conversations
            .entry(conversation_id.to_string())
            .or_default();
        turns.push_back(ChatTurn {
            role,
            content: content.into(),
        });
        while turns.len() > self.max_turns {
            turns.pop_front();
        }
    }

    /// Snapshot of a conversation's turns, oldest first. Empty if unseen.
    pub fn history(&self, conversation_id: &str) -> Vec<ChatTurn> {
        self.conversations
            .get(conversation_id)
            .map(|turns| turns.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn clear(&self, conversation_id: &str) {
        self.conversations.remove(conversation_id);
    }

    /// Number of conversations with at least one stored turn.
    pub fn conversation_count(&self) -> usize {
        self.conversations.len()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn unseen_conversation_is_empty() {
        assert!(ConversationMemory::default().history("nobody").is_empty());
    }

    #[test]
    fn keeps_last_twenty_in_order() {
        let memory = ConversationMemory::default();
        for i in 0..25 {
            memory.add_turn("c1", ChatRole::User, format!("pesan {i}"));
        }
        let history = memory.history("c1");
        assert_eq!(history.len(), 20);
        assert_eq!(history[0].content, "pesan 5");
        assert_eq!(history[19].content, "pesan 24");
    }

    #[test]
    fn conversations_are_isolated() {
        let memory = ConversationMemory::new(5);
        memory.add_turn("a", ChatRole::User, "halo");
        memory.add_turn("b", ChatRole::Assistant, "hai");
        assert_eq!(memory.history("a"), vec![ChatTurn::user("halo")]);
        assert_eq!(memory.history("b"), vec![ChatTurn::assistant("hai")]);

        memory.clear("a");
        assert!(memory.history("a").is_empty());
        assert_eq!(memory.history("b").len(), 1);
        assert_eq!(memory.conversation_count(), 1);
    }

    #[test]
    fn concurrent_writers_never_exceed_cap() {
        let memory = Arc::new(ConversationMemory::default());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let memory = Arc::clone(&memory);
                std::thread::spawn(move || {
                    let id = format!("conv-{}", t % 2);
                    for i in 0..50 {
                        memory.add_turn(&id, ChatRole::User, format!("{t}-{i}"));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(memory.history("conv-0").len(), 20);
        assert_eq!(memory.history("conv-1").len(), 20);
    }
}
