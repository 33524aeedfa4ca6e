//! Projector: change feed → local projection
//!
//! Turns a remote change feed into an in-memory, id-keyed collection.
//!
//! Key features:
//! - Normalization of raw change notifications into typed events
//! - Idempotent, order-preserving apply (safe to replay after reconnect)
//! - One live subscription per query scope
//! - Unsubscribe fences further application immediately

pub mod normalizer;
pub mod projection;
pub mod subscription;

pub use normalizer::{decode_batch, normalize, normalize_batch, to_event};
pub use projection::{ApplyOutcome, Projection, ProjectionStore};
pub use subscription::{
    SubscriptionHandle, SubscriptionId, SubscriptionManager, SubscriptionState,
    SubscriptionStatus,
};
