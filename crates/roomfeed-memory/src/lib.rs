//! In-process backend for roomfeed.
//!
//! [`MemoryBackend`] plays all three collaborators at once: document store,
//! change source and auth provider. It enforces the chat application's
//! write rules so that rejected writes behave as they would against the
//! hosted store. Used by the integration tests and for local runs.

pub mod backend;
pub mod ordering;
pub mod rules;

pub use backend::MemoryBackend;
pub use rules::{ChatRules, OpenRules, WriteRules};
