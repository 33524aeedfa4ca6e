use roomfeed_core::{CollectionPath, FeedError, Result, SubscriptionConfig};
use serde::{Deserialize, Serialize};

/// Configuration for the chat client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Top-level collection holding rooms
    /// Default: "rooms"
    #[serde(default = "default_rooms_collection")]
    pub rooms_collection: String,

    /// Per-room subcollection holding chats
    /// Default: "chats"
    #[serde(default = "default_chats_collection")]
    pub chats_collection: String,

    /// Top-level collection holding user profiles, keyed by uid
    /// Default: "users"
    #[serde(default = "default_users_collection")]
    pub users_collection: String,

    /// Field rooms and chats are ordered by (ascending)
    /// Default: "createdAt"
    #[serde(default = "default_order_field")]
    pub order_field: String,

    #[serde(default)]
    pub subscription: SubscriptionConfig,
}

fn default_rooms_collection() -> String {
    "rooms".to_string()
}

fn default_chats_collection() -> String {
    "chats".to_string()
}

fn default_users_collection() -> String {
    "users".to_string()
}

fn default_order_field() -> String {
    "createdAt".to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            rooms_collection: default_rooms_collection(),
            chats_collection: default_chats_collection(),
            users_collection: default_users_collection(),
            order_field: default_order_field(),
            subscription: SubscriptionConfig::default(),
        }
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from JSON; missing keys take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| FeedError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_rooms_collection(mut self, name: impl Into<String>) -> Self {
        self.rooms_collection = name.into();
        self
    }

    pub fn with_chats_collection(mut self, name: impl Into<String>) -> Self {
        self.chats_collection = name.into();
        self
    }

    pub fn with_users_collection(mut self, name: impl Into<String>) -> Self {
        self.users_collection = name.into();
        self
    }

    pub fn with_order_field(mut self, field: impl Into<String>) -> Self {
        self.order_field = field.into();
        self
    }

    pub fn with_subscription(mut self, config: SubscriptionConfig) -> Self {
        self.subscription = config;
        self
    }

    pub fn validate(&self) -> Result<()> {
        for (key, value) in [
            ("rooms_collection", &self.rooms_collection),
            ("chats_collection", &self.chats_collection),
            ("users_collection", &self.users_collection),
            ("order_field", &self.order_field),
        ] {
            if value.is_empty() {
                return Err(FeedError::Config(format!("{} must not be empty", key)));
            }
            if value.contains('/') {
                return Err(FeedError::Config(format!(
                    "{} must be a single name, got '{}'",
                    key, value
                )));
            }
        }
        Ok(())
    }

    pub fn rooms_path(&self) -> CollectionPath {
        CollectionPath::new(self.rooms_collection.clone())
    }

    pub fn chats_path(&self, room_id: &str) -> CollectionPath {
        self.rooms_path()
            .child(room_id, self.chats_collection.clone())
    }

    pub fn users_path(&self) -> CollectionPath {
        CollectionPath::new(self.users_collection.clone())
    }
}
