use crate::config::ClientConfig;
use crate::gate::{AuthGate, AuthWatcher};
use crate::models::{to_fields, Chat, NewRoom, Room, UserProfile};
use roomfeed_core::{
    observe, AuthProvider, AuthUser, ChangeSource, Direction, DocumentStore, Entity, FeedError,
    Query, Result,
};
use roomfeed_projector::{Projection, SubscriptionHandle, SubscriptionManager, SubscriptionStatus};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A live view of one collection: the subscription feeding it and the
/// projection it maintains.
pub struct RoomFeed<T: Entity> {
    handle: SubscriptionHandle,
    projection: Projection<T>,
}

impl<T: Entity> RoomFeed<T> {
    pub fn handle(&self) -> &SubscriptionHandle {
        &self.handle
    }

    pub fn projection(&self) -> &Projection<T> {
        &self.projection
    }

    pub fn scope(&self) -> &str {
        self.handle.scope()
    }

    pub fn status(&self) -> SubscriptionStatus {
        self.handle.status()
    }

    /// Current ordered contents
    pub fn snapshot(&self) -> Vec<T> {
        self.projection.snapshot()
    }

    pub fn get(&self, id: &str) -> Option<T> {
        self.projection.get(id)
    }

    /// Wait for the initial batch
    pub async fn wait_ready(&self) -> Result<()> {
        self.handle.wait_ready().await
    }

    pub async fn wait_for_batches(&self, n: u64) -> Result<()> {
        self.handle.wait_for_batches(n).await
    }
}

/// Chat client over injected change source, document store and auth
/// provider.
///
/// Writes go to the store only. Local projections change solely through
/// the change feeds, so a rejected write never shows up in a snapshot.
pub struct ChatClient {
    subscriptions: SubscriptionManager,
    store: Arc<dyn DocumentStore>,
    auth: Arc<dyn AuthProvider>,
    config: ClientConfig,
}

impl ChatClient {
    pub fn new(
        source: Arc<dyn ChangeSource>,
        store: Arc<dyn DocumentStore>,
        auth: Arc<dyn AuthProvider>,
        config: ClientConfig,
    ) -> Self {
        let subscriptions = SubscriptionManager::with_config(source, config.subscription.clone());
        Self {
            subscriptions,
            store,
            auth,
            config,
        }
    }

    /// Client whose three collaborators are one backend
    pub fn with_backend<B>(backend: B, config: ClientConfig) -> Self
    where
        B: ChangeSource + DocumentStore + AuthProvider + 'static,
    {
        let backend = Arc::new(backend);
        Self::new(backend.clone(), backend.clone(), backend, config)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn subscriptions(&self) -> &SubscriptionManager {
        &self.subscriptions
    }

    pub fn gate(&self) -> AuthGate {
        AuthGate::new(
            Arc::clone(&self.auth),
            Arc::clone(&self.store),
            self.config.users_path(),
        )
    }

    pub fn auth_watcher(&self) -> AuthWatcher {
        AuthWatcher::new(self.auth.watch())
    }

    /// Live room list, oldest first
    pub async fn watch_rooms(&self) -> Result<RoomFeed<Room>> {
        let query = Query::collection(self.config.rooms_path())
            .order_by(self.config.order_field.clone(), Direction::Ascending);
        self.watch(query).await
    }

    /// Live chat history of one room, oldest first
    pub async fn watch_chats(&self, room_id: &str) -> Result<RoomFeed<Chat>> {
        let query = Query::collection(self.config.chats_path(room_id))
            .order_by(self.config.order_field.clone(), Direction::Ascending);
        self.watch(query).await
    }

    async fn watch<T: Entity>(&self, query: Query) -> Result<RoomFeed<T>> {
        let projection = Projection::new();
        let handle = self.subscriptions.subscribe(&query, projection.clone()).await?;
        Ok(RoomFeed { handle, projection })
    }

    /// Stop a feed and drop its contents.
    pub fn leave<T: Entity>(&self, feed: RoomFeed<T>) -> Result<()> {
        let result = self.subscriptions.unsubscribe(&feed.handle);
        feed.projection.clear();
        debug!("Left {}", feed.handle.scope());
        result
    }

    pub async fn create_room(&self, room: NewRoom) -> Result<String> {
        self.require_user().await?;
        let fields = to_fields(&room)?;
        let result = self.store.add(&self.config.rooms_path(), fields).await;
        self.record_write("room", result)
    }

    /// Post `body` to a room as the signed-in user. Requires a registered
    /// profile, whose name and icon are copied onto the chat.
    pub async fn post_chat(&self, room_id: &str, body: &str) -> Result<String> {
        let user = self.require_user().await?;
        let author = self
            .profile_of(&user)
            .await?
            .ok_or_else(|| FeedError::NotFound(format!("profile for {}", user.uid)))?;

        let fields = to_fields(&Chat::draft(&author, body))?;
        let result = self.store.add(&self.config.chats_path(room_id), fields).await;
        self.record_write("chat", result)
    }

    /// Create or overwrite the signed-in user's profile.
    pub async fn register_profile(&self, name: &str, icon_image_url: &str) -> Result<UserProfile> {
        let user = self.require_user().await?;
        let profile = UserProfile {
            uid: user.uid.clone(),
            name: name.to_string(),
            icon_image_url: icon_image_url.to_string(),
        };

        let fields = to_fields(&profile)?;
        let result = self
            .store
            .set(&self.config.users_path(), &user.uid, fields)
            .await;
        self.record_write("profile", result)?;
        info!("Registered profile for {}", user.uid);
        Ok(profile)
    }

    /// Profile of the signed-in user; `None` when signed out or unregistered
    pub async fn current_profile(&self) -> Result<Option<UserProfile>> {
        match self.auth.current_user().await? {
            Some(user) => self.profile_of(&user).await,
            None => Ok(None),
        }
    }

    /// One-off read of a room
    pub async fn room(&self, id: &str) -> Result<Option<Room>> {
        self.store
            .get(&self.config.rooms_path(), id)
            .await?
            .map(Room::from_document)
            .transpose()
    }

    /// Close every open feed. Projections keep their contents.
    pub fn shutdown(&self) -> usize {
        let closed = self.subscriptions.unsubscribe_all();
        info!("Chat client shut down, closed {} subscriptions", closed);
        closed
    }

    async fn require_user(&self) -> Result<AuthUser> {
        self.auth.current_user().await?.ok_or(FeedError::Unauthenticated)
    }

    async fn profile_of(&self, user: &AuthUser) -> Result<Option<UserProfile>> {
        self.store
            .get(&self.config.users_path(), &user.uid)
            .await?
            .map(UserProfile::from_document)
            .transpose()
    }

    fn record_write<T>(&self, what: &str, result: Result<T>) -> Result<T> {
        observe::record_write(result.is_ok());
        if let Err(err) = &result {
            warn!("{} write rejected: {}", what, err);
        }
        result
    }
}
