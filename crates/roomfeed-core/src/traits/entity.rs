use crate::error::{FeedError, Result};
use crate::types::Document;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Something a projection can hold: identified by a store-assigned id and
/// decodable from a document snapshot.
pub trait Entity: Clone + Send + Sync + 'static {
    fn id(&self) -> &str;

    fn from_document(doc: Document) -> Result<Self>;
}

/// Decode a document into a serde type, with the document id merged in as
/// an `id` field.
pub fn decode_document<T: DeserializeOwned>(doc: Document) -> Result<T> {
    let Document { id, mut fields } = doc;
    fields.insert("id".to_string(), Value::String(id.clone()));

    serde_json::from_value(Value::Object(fields))
        .map_err(|e| FeedError::Decode(format!("document '{}': {}", id, e)))
}

impl Entity for Document {
    fn id(&self) -> &str {
        &self.id
    }

    fn from_document(doc: Document) -> Result<Self> {
        Ok(doc)
    }
}
