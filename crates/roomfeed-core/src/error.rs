use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FeedError {
    #[error("Protocol violation: {0}")]
    ProtocolViolation(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Write rejected on {collection}: {reason}")]
    WriteRejected { collection: String, reason: String },

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Not authenticated")]
    Unauthenticated,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Subscription failed: {0}")]
    SubscriptionFailed(String),

    #[error("Scope already has an active subscription: {0}")]
    AlreadySubscribed(String),

    #[error("Unknown subscription: {0}")]
    UnknownSubscription(u64),

    #[error("Subscription on {0} did not become ready in time")]
    ReadyTimeout(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

impl FeedError {
    pub fn write_rejected(collection: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::WriteRejected {
            collection: collection.into(),
            reason: reason.into(),
        }
    }

    /// The change source broke its contract (unknown kind, undecodable payload).
    pub fn is_protocol_violation(&self) -> bool {
        matches!(self, Self::ProtocolViolation(_) | Self::Decode(_))
    }

    /// The store refused a write on validation grounds.
    pub fn is_write_rejection(&self) -> bool {
        matches!(self, Self::WriteRejected { .. })
    }

    /// The caller was not allowed to read or write at all.
    pub fn is_access_error(&self) -> bool {
        matches!(self, Self::PermissionDenied(_) | Self::Unauthenticated)
    }
}

pub type Result<T> = std::result::Result<T, FeedError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert!(FeedError::ProtocolViolation("bogus".into()).is_protocol_violation());
        assert!(FeedError::Decode("missing name".into()).is_protocol_violation());
        assert!(FeedError::write_rejected("rooms", "empty name").is_write_rejection());
        assert!(FeedError::PermissionDenied("rooms".into()).is_access_error());
        assert!(FeedError::Unauthenticated.is_access_error());

        let rejected = FeedError::write_rejected("rooms", "empty name");
        assert!(!rejected.is_protocol_violation());
        assert!(!rejected.is_access_error());
    }

    #[test]
    fn test_display() {
        let err = FeedError::write_rejected("rooms/r1/chats", "body must not be empty");
        assert_eq!(
            err.to_string(),
            "Write rejected on rooms/r1/chats: body must not be empty"
        );
    }
}
