use crate::error::Result;
use crate::types::{ChangeBatch, Query};
use async_trait::async_trait;
use futures::stream::BoxStream;

/// Ordered stream of change batches for one listener.
///
/// An `Err` item means the listener is gone (network loss, revoked access);
/// nothing more will arrive on this feed.
pub type ChangeFeed = BoxStream<'static, Result<ChangeBatch>>;

/// Remote change source: push-based feed of document mutations
#[async_trait]
pub trait ChangeSource: Send + Sync {
    /// Open a listener for `query`.
    ///
    /// The first batch describes every document currently matching the
    /// query as `added`, in the requested order. Later batches carry the
    /// mutations in the order the source observed them. Dropping the feed
    /// closes the listener.
    async fn listen(&self, query: &Query) -> Result<ChangeFeed>;
}
