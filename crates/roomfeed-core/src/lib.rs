//! roomfeed core: types, collaborator traits and errors
//!
//! This crate defines the abstractions the change-feed projection engine
//! is built on:
//! - Change source: push-based, ordered batches of document changes
//! - Document store: CRUD whose writes may be rejected by server rules
//! - Auth provider: current identity plus a persistent auth-state watch
//! - Entity: anything a projection can hold, keyed by document id
//!
//! Nothing here performs I/O; backends live in their own crates.

pub mod config;
pub mod error;
pub mod observe;
pub mod traits;
pub mod types;

pub use config::SubscriptionConfig;
pub use error::{FeedError, Result};
pub use traits::{
    decode_document, AuthProvider, AuthUser, ChangeFeed, ChangeSource, DocumentStore, Entity,
};
pub use types::{
    ChangeBatch, ChangeEvent, ChangeKind, CollectionPath, Direction, Document, Fields, OrderBy,
    Query, RawChange, Record,
};
