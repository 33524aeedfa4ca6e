//! roomfeed Prelude
//!
//! ```
//! use roomfeed::prelude::*;
//! ```

// Core types
pub use crate::{Document, FeedError, Fields, Query, Result};

// Configs
pub use crate::{ClientConfig, SubscriptionConfig};

// Traits
pub use crate::{AuthProvider, ChangeSource, DocumentStore, Entity};

// Engine
pub use crate::{Projection, SubscriptionHandle, SubscriptionManager, SubscriptionState};

// Implementations
pub use crate::MemoryBackend;

// Chat
pub use crate::{Access, AuthGate, AuthWatcher, ChatClient, Guard, Route, RoomFeed};
pub use crate::{Chat, NewRoom, Room, UserProfile};

// Re-export common external deps
pub use anyhow;
pub use serde::{Deserialize, Serialize};
pub use std::sync::Arc;
pub use tracing;
