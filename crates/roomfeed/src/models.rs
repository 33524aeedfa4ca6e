//! Chat domain entities.
//!
//! Stored field names are camelCase (`topImageUrl`, `createdAt`); the
//! document id is merged in on decode and never written as a field.

use chrono::{DateTime, Utc};
use roomfeed_core::{decode_document, Document, Entity, FeedError, Fields, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    #[serde(skip_serializing)]
    pub id: String,
    pub name: String,
    pub top_image_url: String,
    pub created_at: DateTime<Utc>,
}

impl Entity for Room {
    fn id(&self) -> &str {
        &self.id
    }

    fn from_document(doc: Document) -> Result<Self> {
        decode_document(doc)
    }
}

/// A room that has not been stored yet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRoom {
    pub name: String,
    pub top_image_url: String,
    pub created_at: DateTime<Utc>,
}

impl NewRoom {
    /// New room stamped with the current time
    pub fn new(name: impl Into<String>, top_image_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            top_image_url: top_image_url.into(),
            created_at: Utc::now(),
        }
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }
}

/// A message in a room's `chats` collection. The author's name and icon are
/// copied from their profile at posting time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    #[serde(skip_serializing)]
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub icon_image_url: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

impl Chat {
    pub(crate) fn draft(author: &UserProfile, body: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            user_id: author.uid.clone(),
            name: author.name.clone(),
            icon_image_url: author.icon_image_url.clone(),
            body: body.into(),
            created_at: Utc::now(),
        }
    }
}

impl Entity for Chat {
    fn id(&self) -> &str {
        &self.id
    }

    fn from_document(doc: Document) -> Result<Self> {
        decode_document(doc)
    }
}

/// Registered profile, stored at `users/{uid}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(rename = "id", skip_serializing)]
    pub uid: String,
    pub name: String,
    pub icon_image_url: String,
}

impl Entity for UserProfile {
    fn id(&self) -> &str {
        &self.uid
    }

    fn from_document(doc: Document) -> Result<Self> {
        decode_document(doc)
    }
}

/// Serialize a model into the field map written to the store.
pub(crate) fn to_fields<T: Serialize>(value: &T) -> Result<Fields> {
    match serde_json::to_value(value)? {
        Value::Object(fields) => Ok(fields),
        other => Err(FeedError::InvalidState(format!(
            "expected an object, got {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room_doc() -> Document {
        Document::new("tech-room")
            .with_field("name", "Tech")
            .with_field("topImageUrl", "https://example.com/top.png")
            .with_field("createdAt", "2020-05-07T07:43:40Z")
    }

    #[test]
    fn test_room_decodes_from_document() {
        let room = Room::from_document(room_doc()).unwrap();
        assert_eq!(room.id, "tech-room");
        assert_eq!(room.top_image_url, "https://example.com/top.png");
        assert_eq!(room.created_at.to_rfc3339(), "2020-05-07T07:43:40+00:00");
    }

    #[test]
    fn test_room_missing_field_is_decode_error() {
        let mut doc = room_doc();
        doc.fields.remove("topImageUrl");
        let err = Room::from_document(doc).unwrap_err();
        assert!(err.is_protocol_violation());
    }

    #[test]
    fn test_fields_never_carry_the_id() {
        let room = Room::from_document(room_doc()).unwrap();
        let fields = to_fields(&room).unwrap();
        assert!(!fields.contains_key("id"));
        assert_eq!(fields["topImageUrl"], "https://example.com/top.png");
        assert!(fields.contains_key("createdAt"));
    }

    #[test]
    fn test_chat_draft_copies_author() {
        let author = UserProfile {
            uid: "tech-user".into(),
            name: "Tech".into(),
            icon_image_url: "https://example.com/icon.png".into(),
        };
        let chat = Chat::draft(&author, "hello");
        let fields = to_fields(&chat).unwrap();
        assert_eq!(fields["userId"], "tech-user");
        assert_eq!(fields["name"], "Tech");
        assert_eq!(fields["iconImageUrl"], "https://example.com/icon.png");
        assert_eq!(fields["body"], "hello");
    }

    #[test]
    fn test_profile_id_is_uid() {
        let doc = Document::new("tech-user")
            .with_field("name", "Tech")
            .with_field("iconImageUrl", "https://example.com/icon.png");
        let profile = UserProfile::from_document(doc).unwrap();
        assert_eq!(profile.id(), "tech-user");
        assert!(!to_fields(&profile).unwrap().contains_key("id"));
    }
}
