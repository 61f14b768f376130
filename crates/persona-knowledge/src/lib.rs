// SPDX-FileCopyrightText: 2026 Persona Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Knowledge ingestion and retrieval.
//!
//! [`parser`] turns chat exports into utterances, [`import`] writes the
//! chosen sender's utterances to the store, and [`retriever`] turns a user
//! message into a formatted block of recalled knowledge.

pub mod import;
pub mod keywords;
pub mod parser;
pub mod retriever;

pub use import::{ImportOptions, ImportOutcome, import_chat};
pub use keywords::extract_keywords;
pub use parser::{ChatStats, ParsedUtterance, SenderCount};
pub use retriever::{KnowledgeRetriever, RetrievalResult};
