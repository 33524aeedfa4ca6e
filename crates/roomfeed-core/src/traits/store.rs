use crate::error::Result;
use crate::types::{CollectionPath, Document, Fields};
use async_trait::async_trait;

/// Document store CRUD.
///
/// Every write may be refused by the store's own validation and access
/// rules. Callers get the refusal back as an error; nothing local is
/// updated ahead of the store's answer.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read one document
    async fn get(&self, collection: &CollectionPath, id: &str) -> Result<Option<Document>>;

    /// Create or overwrite a document under a caller-chosen id
    async fn set(&self, collection: &CollectionPath, id: &str, fields: Fields) -> Result<()>;

    /// Create a document under a store-assigned id, returning the id
    async fn add(&self, collection: &CollectionPath, fields: Fields) -> Result<String>;

    /// Delete a document; deleting a missing document is not an error
    async fn delete(&self, collection: &CollectionPath, id: &str) -> Result<()>;
}
