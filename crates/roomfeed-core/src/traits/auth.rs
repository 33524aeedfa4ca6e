use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// Signed-in identity as reported by the auth provider
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AuthUser {
    pub uid: String,
}

impl AuthUser {
    pub fn new(uid: impl Into<String>) -> Self {
        Self { uid: uid.into() }
    }
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Resolve the current auth state
    async fn current_user(&self) -> Result<Option<AuthUser>>;

    /// Persistent view of the auth state.
    ///
    /// The receiver observes every sign-in and sign-out for the lifetime of
    /// the provider, not just the first resolved value.
    fn watch(&self) -> watch::Receiver<Option<AuthUser>>;
}
