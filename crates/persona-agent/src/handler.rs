// SPDX-FileCopyrightText: 2026 Persona Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inbound message handling.
//!
//! Preconditions for a message to be answered:
//! - its text is not blank
//! - it was not sent by the bot's own account (`channel.self_id`)
//! - it does not come from a group conversation
//! - its sender is on `channel.allowed_senders`, when that list is non-empty
//!
//! Messages within one conversation are processed one at a time so that
//! history is read and written in arrival order. Different conversations
//! never wait on each other.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use persona_config::PersonaConfig;
use persona_config::model::ChannelConfig;
use persona_context::ConversationMemory;
use persona_core::{ChatRole, InboundMessage, OutboundMessage, PersonaError};

use crate::responder::ResponseGenerator;

/// Why an inbound message was ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Empty,
    OwnMessage,
    Group,
    SenderNotAllowed,
}

/// Snapshot of handler state for status output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandlerStats {
    pub knowledge_count: u64,
    pub conversations: usize,
}

/// Answers inbound messages and keeps conversation memory in step.
pub struct MessageHandler {
    responder: ResponseGenerator,
    memory: Arc<ConversationMemory>,
    channel: ChannelConfig,
    fallback_reply: String,
    use_context: bool,
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl MessageHandler {
    pub fn new(
        responder: ResponseGenerator,
        memory: Arc<ConversationMemory>,
        config: &PersonaConfig,
    ) -> Self {
        Self {
            responder,
            memory,
            channel: config.channel.clone(),
            fallback_reply: config.agent.fallback_reply.clone(),
            use_context: config.reply.use_context,
            locks: DashMap::new(),
        }
    }

    pub fn memory(&self) -> &Arc<ConversationMemory> {
        &self.memory
    }

    pub fn responder(&self) -> &ResponseGenerator {
        &self.responder
    }

    /// Checks the answering preconditions.
    pub fn screen(&self, message: &InboundMessage) -> Result<(), SkipReason> {
        if message.text.trim().is_empty() {
            return Err(SkipReason::Empty);
        }
        if self.channel.self_id.as_deref() == Some(message.sender_id.as_str()) {
            return Err(SkipReason::OwnMessage);
        }
        if message.is_group {
            return Err(SkipReason::Group);
        }
        if !self.channel.allowed_senders.is_empty()
            && !self.channel.allowed_senders.contains(&message.sender_id)
        {
            return Err(SkipReason::SenderNotAllowed);
        }
        Ok(())
    }

    /// Produces the reply for `message`, or `None` when it is ignored.
    ///
    /// A failed generation yields the configured fallback reply and leaves
    /// only the user turn in memory.
    pub async fn handle(&self, message: &InboundMessage) -> Option<OutboundMessage> {
        if let Err(reason) = self.screen(message) {
            debug!(
                conversation_id = message.conversation_id.as_str(),
                ?reason,
                "ignoring inbound message"
            );
            return None;
        }

        let conversation_id = message.conversation_id.as_str();
        let text = message.text.trim();

        let lock = Arc::clone(
            self.locks
                .entry(conversation_id.to_string())
                .or_default()
                .value(),
        );
        let _guard = lock.lock().await;

        info!(conversation_id, "handling inbound message");

        let history = self.memory.history(conversation_id);
        let outcome = self
            .responder
            .generate_with_delay(text, self.use_context, &history)
            .await;

        self.memory.add_turn(conversation_id, ChatRole::User, text);

        if outcome.success && !outcome.text.is_empty() {
            self.memory
                .add_turn(conversation_id, ChatRole::Assistant, outcome.text.clone());
            info!(
                conversation_id,
                context_used = outcome.context_used,
                "reply ready"
            );
            return Some(OutboundMessage {
                conversation_id: conversation_id.to_string(),
                text: outcome.text,
                is_fallback: false,
            });
        }

        warn!(
            conversation_id,
            error = outcome.error.as_deref().unwrap_or("empty reply"),
            "sending fallback reply"
        );
        Some(OutboundMessage {
            conversation_id: conversation_id.to_string(),
            text: self.fallback_reply.clone(),
            is_fallback: true,
        })
    }

    /// Forgets the history of one conversation.
    ///
    /// The conversation lock stays registered so a reply still in flight
    /// keeps later messages waiting behind it.
    pub fn reset(&self, conversation_id: &str) {
        self.memory.clear(conversation_id);
    }

    pub async fn stats(&self) -> Result<HandlerStats, PersonaError> {
        Ok(HandlerStats {
            knowledge_count: self.responder.retriever().store().count().await?,
            conversations: self.memory.conversation_count(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use persona_core::ChatTurn;
    use persona_test_utils::{MockProvider, TestHarness};
    use tracing_test::traced_test;

    use super::*;
    use crate::responder::ReplyDelay;

    fn inbound(conversation_id: &str, sender_id: &str, text: &str) -> InboundMessage {
        InboundMessage {
            conversation_id: conversation_id.into(),
            sender_id: sender_id.into(),
            text: text.into(),
            is_group: false,
        }
    }

    fn handler_with(harness: &TestHarness, config: &PersonaConfig) -> MessageHandler {
        let responder = ResponseGenerator::new(
            Arc::clone(&harness.retriever),
            harness.prompt.clone(),
            harness.provider.clone(),
        )
        .with_delay(ReplyDelay::none());
        MessageHandler::new(responder, Arc::clone(&harness.memory), config)
    }

    fn handler(harness: &TestHarness) -> MessageHandler {
        handler_with(harness, &PersonaConfig::default())
    }

    #[tokio::test]
    async fn screens_preconditions() {
        let harness = TestHarness::new().await.unwrap();
        let mut config = PersonaConfig::default();
        config.channel.self_id = Some("bot".into());
        config.channel.allowed_senders = vec!["budi".into()];
        let handler = handler_with(&harness, &config);

        assert_eq!(handler.screen(&inbound("c", "budi", "   ")), Err(SkipReason::Empty));
        assert_eq!(handler.screen(&inbound("c", "bot", "halo")), Err(SkipReason::OwnMessage));
        let mut group = inbound("g", "budi", "halo");
        group.is_group = true;
        assert_eq!(handler.screen(&group), Err(SkipReason::Group));
        assert_eq!(
            handler.screen(&inbound("c", "sari", "halo")),
            Err(SkipReason::SenderNotAllowed)
        );
        assert_eq!(handler.screen(&inbound("c", "budi", "halo")), Ok(()));
    }

    #[tokio::test]
    async fn empty_allow_list_accepts_everyone() {
        let harness = TestHarness::new().await.unwrap();
        let handler = handler(&harness);
        assert_eq!(handler.screen(&inbound("c", "anyone", "halo")), Ok(()));
    }

    #[tokio::test]
    async fn ignored_messages_touch_nothing() {
        let harness = TestHarness::new().await.unwrap();
        let handler = handler(&harness);
        let mut group = inbound("g", "budi", "halo");
        group.is_group = true;

        assert!(handler.handle(&group).await.is_none());
        assert!(harness.provider.requests().await.is_empty());
        assert!(harness.memory.history("g").is_empty());
    }

    #[tokio::test]
    async fn success_records_both_turns() {
        let harness =
            TestHarness::with_provider(MockProvider::with_responses(["baik kok [1] !"]))
                .await
                .unwrap();
        let handler = handler(&harness);

        let reply = handler.handle(&inbound("c1", "budi", " apa kabar? ")).await.unwrap();
        assert_eq!(reply.text, "baik kok!");
        assert!(!reply.is_fallback);
        assert_eq!(
            harness.memory.history("c1"),
            vec![ChatTurn::user("apa kabar?"), ChatTurn::assistant("baik kok!")]
        );
    }

    #[tokio::test]
    async fn history_excludes_the_live_message() {
        let harness = TestHarness::new().await.unwrap();
        let handler = handler(&harness);

        handler.handle(&inbound("c1", "budi", "pertama")).await;
        handler.handle(&inbound("c1", "budi", "kedua")).await;

        let messages = harness.provider.last_request().await.unwrap().messages;
        let user_turns: Vec<_> = messages
            .iter()
            .filter(|t| t.role == ChatRole::User)
            .map(|t| t.content.as_str())
            .collect();
        assert_eq!(user_turns, ["pertama", "kedua"]);
    }

    #[tokio::test]
    #[traced_test]
    async fn failure_sends_fallback_and_keeps_user_turn() {
        let provider = MockProvider::new();
        provider.push_failure("Rate limit exceeded").await;
        let harness = TestHarness::with_provider(provider).await.unwrap();
        let handler = handler(&harness);

        let reply = handler.handle(&inbound("c1", "budi", "halo")).await.unwrap();
        assert!(reply.is_fallback);
        assert_eq!(reply.text, PersonaConfig::default().agent.fallback_reply);
        assert_eq!(harness.memory.history("c1"), vec![ChatTurn::user("halo")]);
        assert!(logs_contain("sending fallback reply"));
    }

    #[tokio::test]
    async fn empty_cleaned_reply_falls_back() {
        let harness = TestHarness::with_provider(MockProvider::with_responses(["[1]"]))
            .await
            .unwrap();
        let handler = handler(&harness);

        let reply = handler.handle(&inbound("c1", "budi", "halo")).await.unwrap();
        assert!(reply.is_fallback);
        assert_eq!(harness.memory.history("c1").len(), 1);
    }

    #[tokio::test]
    async fn conversations_are_isolated() {
        let harness = TestHarness::new().await.unwrap();
        let handler = Arc::new(handler(&harness));

        let mut tasks = Vec::new();
        for id in ["a", "b", "c"] {
            let handler = Arc::clone(&handler);
            tasks.push(tokio::spawn(async move {
                for n in 0..3 {
                    handler.handle(&inbound(id, id, &format!("{id}-{n}"))).await;
                }
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        for id in ["a", "b", "c"] {
            let history = harness.memory.history(id);
            assert_eq!(history.len(), 6);
            let users: Vec<_> = history
                .iter()
                .filter(|t| t.role == ChatRole::User)
                .map(|t| t.content.clone())
                .collect();
            assert_eq!(users, [format!("{id}-0"), format!("{id}-1"), format!("{id}-2")]);
        }
    }

    #[tokio::test]
    async fn reset_and_stats() {
        let harness = TestHarness::new().await.unwrap();
        harness.remember("Adit", "nonton film").await.unwrap();
        let handler = handler(&harness);

        handler.handle(&inbound("c1", "budi", "halo")).await;
        assert_eq!(
            handler.stats().await.unwrap(),
            HandlerStats {
                knowledge_count: 1,
                conversations: 1
            }
        );

        handler.reset("c1");
        assert!(harness.memory.history("c1").is_empty());
    }

    #[tokio::test]
    async fn reset_does_not_unblock_waiting_messages() {
        let harness = TestHarness::new().await.unwrap();
        let handler = Arc::new(handler(&harness));
        handler.handle(&inbound("c1", "budi", "halo")).await;

        let lock = Arc::clone(handler.locks.get("c1").unwrap().value());
        let in_flight = lock.lock().await;
        handler.reset("c1");

        let pending = tokio::spawn({
            let handler = Arc::clone(&handler);
            async move { handler.handle(&inbound("c1", "budi", "lagi apa")).await }
        });
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!pending.is_finished());
        assert!(harness.memory.history("c1").is_empty());

        drop(in_flight);
        let reply = pending.await.unwrap().unwrap();
        assert!(!reply.is_fallback);
        assert_eq!(harness.memory.history("c1").len(), 2);
    }
}
