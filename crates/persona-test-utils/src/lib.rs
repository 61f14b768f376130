// SPDX-FileCopyrightText: 2026 Persona Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Persona integration tests.
//!
//! - [`MockProvider`] - scripted AI provider that records every request
//! - [`TestHarness`] - in-memory store, retriever, and memory wired together

pub mod harness;
pub mod mock_provider;

pub use harness::TestHarness;
pub use mock_provider::MockProvider;
