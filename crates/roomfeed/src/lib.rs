//! roomfeed: a realtime chat client over a change-feed projection engine
//!
//! - **Models**: `Room`, `Chat` and `UserProfile` decoded from documents
//! - **Feeds**: live, ordered, locally projected views of rooms and chats
//! - **Writes**: room creation, chat posting and profile registration,
//!   validated by the store and observed back through the feeds
//! - **Auth gate**: route guards and a persistent auth-state watcher
//!
//! # Quick Start
//!
//! ```no_run
//! use roomfeed::prelude::*;
//!
//! # async fn run() -> Result<()> {
//! let backend = MemoryBackend::new();
//! backend.sign_in("tech-user");
//!
//! let client = ChatClient::with_backend(backend, ClientConfig::default());
//! let rooms = client.watch_rooms().await?;
//! rooms.wait_ready().await?;
//!
//! for room in rooms.snapshot() {
//!     println!("{}: {}", room.id, room.name);
//! }
//! client.leave(rooms)?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod gate;
pub mod models;
pub mod prelude;

// Re-export core types
pub use roomfeed_core::{
    decode_document, observe, AuthProvider, AuthUser, ChangeBatch, ChangeEvent, ChangeFeed,
    ChangeKind, ChangeSource, CollectionPath, Direction, Document, DocumentStore, Entity,
    FeedError, Fields, OrderBy, Query, RawChange, Record, Result, SubscriptionConfig,
};

// Re-export the engine
pub use roomfeed_projector::{
    decode_batch, ApplyOutcome, Projection, ProjectionStore, SubscriptionHandle, SubscriptionId,
    SubscriptionManager, SubscriptionState, SubscriptionStatus,
};

// Re-export implementations
pub use roomfeed_memory::{ChatRules, MemoryBackend, OpenRules, WriteRules};

// Re-export main types from this crate
pub use client::{ChatClient, RoomFeed};
pub use config::ClientConfig;
pub use gate::{Access, AuthGate, AuthWatcher, Guard, Route};
pub use models::{Chat, NewRoom, Room, UserProfile};
