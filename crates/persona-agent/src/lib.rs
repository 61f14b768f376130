// SPDX-FileCopyrightText: 2026 Persona Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Response orchestration for the Persona chat bot.
//!
//! [`ResponseGenerator`] turns one user message into a cleaned reply:
//! retrieve memories, build the prompt, call the active provider, strip
//! citation markers. [`MessageHandler`] sits in front of it, filtering
//! inbound traffic and keeping conversation memory consistent.

pub mod cleanup;
pub mod handler;
pub mod responder;

pub use cleanup::clean_response;
pub use handler::{HandlerStats, MessageHandler, SkipReason};
pub use responder::{ReplyDelay, ResponseGenerator, ResponseOutcome};
