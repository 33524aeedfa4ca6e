//! Server-side write rules.
//!
//! The chat rules mirror what the hosted store enforces: a user may only
//! write their own profile, rooms need a name, an image and a creation
//! time, and chats must be authored by the caller.

use chrono::{DateTime, Utc};
use roomfeed_core::{AuthUser, CollectionPath, FeedError, Fields, Result};
use serde_json::Value;

/// Decides whether a write is accepted.
pub trait WriteRules: Send + Sync {
    /// `id` is the target document id; `caller` is already authenticated.
    fn check_write(
        &self,
        collection: &CollectionPath,
        id: &str,
        fields: &Fields,
        caller: &AuthUser,
    ) -> Result<()>;
}

/// Accept every authenticated write.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenRules;

impl WriteRules for OpenRules {
    fn check_write(&self, _: &CollectionPath, _: &str, _: &Fields, _: &AuthUser) -> Result<()> {
        Ok(())
    }
}

/// Rules for the `users`, `rooms` and `rooms/{id}/chats` collections.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChatRules;

impl WriteRules for ChatRules {
    fn check_write(
        &self,
        collection: &CollectionPath,
        id: &str,
        fields: &Fields,
        caller: &AuthUser,
    ) -> Result<()> {
        let segments: Vec<&str> = collection.segments().iter().map(String::as_str).collect();
        let check = Check { collection, fields };

        match segments.as_slice() {
            ["users"] => {
                if id != caller.uid {
                    return Err(check.reject("users may only write their own profile"));
                }
                check.non_empty("name")?;
                check.non_empty("iconImageUrl")
            }
            ["rooms"] => {
                check.non_empty("name")?;
                check.non_empty("topImageUrl")?;
                check.timestamp("createdAt")
            }
            ["rooms", _, "chats"] => {
                if check.string("userId") != Some(caller.uid.as_str()) {
                    return Err(check.reject("userId must be the caller's uid"));
                }
                check.non_empty("name")?;
                check.non_empty("iconImageUrl")?;
                check.non_empty("body")?;
                check.timestamp("createdAt")
            }
            _ => Err(FeedError::PermissionDenied(format!(
                "no write access to {}",
                collection
            ))),
        }
    }
}

struct Check<'a> {
    collection: &'a CollectionPath,
    fields: &'a Fields,
}

impl Check<'_> {
    fn reject(&self, reason: impl Into<String>) -> FeedError {
        FeedError::write_rejected(self.collection.to_string(), reason)
    }

    fn string(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }

    fn non_empty(&self, name: &str) -> Result<()> {
        match self.string(name) {
            Some(value) if !value.is_empty() => Ok(()),
            _ => Err(self.reject(format!("{} must be a non-empty string", name))),
        }
    }

    fn timestamp(&self, name: &str) -> Result<()> {
        match self.string(name).map(DateTime::parse_from_rfc3339) {
            Some(Ok(_)) => Ok(()),
            _ => Err(self.reject(format!("{} must be a timestamp", name))),
        }
    }
}

/// Parse a field written by the rules above back into a UTC timestamp.
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    value
        .as_str()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|t| t.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> Fields {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    fn caller() -> AuthUser {
        AuthUser::new("tech-user")
    }

    fn rooms() -> CollectionPath {
        CollectionPath::new("rooms")
    }

    fn chats() -> CollectionPath {
        rooms().child("tech-room", "chats")
    }

    fn room(name: &str, image: &str, created_at: &str) -> Fields {
        fields(json!({ "name": name, "topImageUrl": image, "createdAt": created_at }))
    }

    fn chat(user_id: &str, name: &str, icon: &str, body: &str, created_at: &str) -> Fields {
        fields(json!({
            "userId": user_id,
            "name": name,
            "iconImageUrl": icon,
            "body": body,
            "createdAt": created_at,
        }))
    }

    const NOW: &str = "2020-05-07T07:43:40Z";

    #[test]
    fn test_own_profile_accepted() {
        let profile = fields(json!({ "name": "testUser", "iconImageUrl": "https://example.com" }));
        let users = CollectionPath::new("users");
        assert!(ChatRules.check_write(&users, "tech-user", &profile, &caller()).is_ok());
    }

    #[test]
    fn test_profile_rules() {
        let users = CollectionPath::new("users");

        let someone_else = fields(json!({ "name": "testUser", "iconImageUrl": "https://example.com" }));
        let err = ChatRules
            .check_write(&users, "tech-user2", &someone_else, &caller())
            .unwrap_err();
        assert!(err.is_write_rejection());

        let no_name = fields(json!({ "name": "", "iconImageUrl": "https://example.com" }));
        assert!(ChatRules.check_write(&users, "tech-user", &no_name, &caller()).is_err());

        let no_icon = fields(json!({ "name": "testUser", "iconImageUrl": "" }));
        assert!(ChatRules.check_write(&users, "tech-user", &no_icon, &caller()).is_err());
    }

    #[test]
    fn test_room_rules() {
        let ok = room("Dinner talk", "https://example.com", NOW);
        assert!(ChatRules.check_write(&rooms(), "tech-room", &ok, &caller()).is_ok());

        for bad in [
            room("", "https://example.com", NOW),
            room("Dinner talk", "", NOW),
            room("Dinner talk", "https://example.com", ""),
        ] {
            let err = ChatRules
                .check_write(&rooms(), "tech-room", &bad, &caller())
                .unwrap_err();
            assert!(err.is_write_rejection(), "{:?}", bad);
        }

        let missing_created_at = fields(json!({ "name": "A", "topImageUrl": "https://example.com" }));
        assert!(ChatRules
            .check_write(&rooms(), "tech-room", &missing_created_at, &caller())
            .is_err());
    }

    #[test]
    fn test_chat_rules() {
        let ok = chat("tech-user", "testUser", "https://example.com", "hello", NOW);
        assert!(ChatRules.check_write(&chats(), "c1", &ok, &caller()).is_ok());

        for bad in [
            chat("tech-user2", "techUser", "https://example.com", "hello", NOW),
            chat("tech-user", "", "https://example.com", "hello", NOW),
            chat("tech-user", "techUser", "", "hello", NOW),
            chat("tech-user", "testUser", "https://example.com", "", NOW),
            chat("tech-user", "testUser", "https://example.com", "hello", ""),
        ] {
            let err = ChatRules.check_write(&chats(), "c1", &bad, &caller()).unwrap_err();
            assert!(err.is_write_rejection(), "{:?}", bad);
        }
    }

    #[test]
    fn test_unknown_collection_denied() {
        let err = ChatRules
            .check_write(&CollectionPath::new("secrets"), "s1", &Fields::new(), &caller())
            .unwrap_err();
        assert!(err.is_access_error());

        assert!(OpenRules
            .check_write(&CollectionPath::new("secrets"), "s1", &Fields::new(), &caller())
            .is_ok());
    }

    #[test]
    fn test_parse_timestamp() {
        let parsed = parse_timestamp(&json!("2020-05-07T16:43:40+09:00")).unwrap();
        assert_eq!(parsed.to_rfc3339(), "2020-05-07T07:43:40+00:00");
        assert!(parse_timestamp(&json!("yesterday")).is_none());
        assert!(parse_timestamp(&json!(12)).is_none());
    }
}
