//! Route guards driven by auth state and profile registration.
//!
//! Every check reads the current auth state afresh, and [`AuthWatcher`]
//! observes every sign-in and sign-out for as long as it is held.

use roomfeed_core::{AuthProvider, AuthUser, CollectionPath, DocumentStore, FeedError, Result};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Home,
    Login,
    Register,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Home => "/",
            Route::Login => "/login",
            Route::Register => "/register",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Guard {
    /// Signed-in users only
    RequireAuth,
    /// Signed-in users with a registered profile
    RequireProfile,
    /// Login screen: signed-in users are sent home
    GuestOnly,
    /// Registration screen: signed-in users without a profile
    UnregisteredOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Granted,
    Redirect(Route),
}

pub struct AuthGate {
    auth: Arc<dyn AuthProvider>,
    store: Arc<dyn DocumentStore>,
    users: CollectionPath,
}

impl AuthGate {
    pub fn new(
        auth: Arc<dyn AuthProvider>,
        store: Arc<dyn DocumentStore>,
        users: CollectionPath,
    ) -> Self {
        Self { auth, store, users }
    }

    pub async fn is_authenticated(&self) -> Result<bool> {
        Ok(self.auth.current_user().await?.is_some())
    }

    /// Whether the signed-in user has a profile. Always false when signed out.
    pub async fn has_profile(&self) -> Result<bool> {
        match self.auth.current_user().await? {
            Some(user) => self.profile_exists(&user).await,
            None => Ok(false),
        }
    }

    pub async fn check(&self, guard: Guard) -> Result<Access> {
        let user = self.auth.current_user().await?;
        let access = match (guard, user) {
            (Guard::GuestOnly, Some(_)) => Access::Redirect(Route::Home),
            (Guard::GuestOnly, None) => Access::Granted,
            (_, None) => Access::Redirect(Route::Login),
            (Guard::RequireAuth, Some(_)) => Access::Granted,
            (Guard::RequireProfile, Some(user)) => {
                if self.profile_exists(&user).await? {
                    Access::Granted
                } else {
                    Access::Redirect(Route::Register)
                }
            }
            (Guard::UnregisteredOnly, Some(user)) => {
                if self.profile_exists(&user).await? {
                    Access::Redirect(Route::Home)
                } else {
                    Access::Granted
                }
            }
        };
        debug!("{:?} -> {:?}", guard, access);
        Ok(access)
    }

    async fn profile_exists(&self, user: &AuthUser) -> Result<bool> {
        Ok(self.store.get(&self.users, &user.uid).await?.is_some())
    }
}

/// Persistent view of the auth state
#[derive(Debug, Clone)]
pub struct AuthWatcher {
    rx: watch::Receiver<Option<AuthUser>>,
}

impl AuthWatcher {
    pub fn new(rx: watch::Receiver<Option<AuthUser>>) -> Self {
        Self { rx }
    }

    pub fn current(&self) -> Option<AuthUser> {
        self.rx.borrow().clone()
    }

    /// Wait for the next sign-in or sign-out and return the new state.
    pub async fn changed(&mut self) -> Result<Option<AuthUser>> {
        self.rx
            .changed()
            .await
            .map_err(|_| FeedError::InvalidState("auth provider dropped".to_string()))?;
        Ok(self.rx.borrow_and_update().clone())
    }

    /// Wait until someone is signed in.
    pub async fn signed_in(&mut self) -> Result<AuthUser> {
        let state = self
            .rx
            .wait_for(|user| user.is_some())
            .await
            .map_err(|_| FeedError::InvalidState("auth provider dropped".to_string()))?;
        state.clone().ok_or(FeedError::Unauthenticated)
    }

    /// Wait until nobody is signed in.
    pub async fn signed_out(&mut self) -> Result<()> {
        self.rx
            .wait_for(|user| user.is_none())
            .await
            .map_err(|_| FeedError::InvalidState("auth provider dropped".to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roomfeed_memory::MemoryBackend;
    use serde_json::json;

    fn gate(backend: &MemoryBackend) -> AuthGate {
        let backend = Arc::new(backend.clone());
        AuthGate::new(backend.clone(), backend, CollectionPath::new("users"))
    }

    async fn register(backend: &MemoryBackend, uid: &str) {
        let fields = match json!({"name": "Tech", "iconImageUrl": "https://example.com/i.png"}) {
            serde_json::Value::Object(map) => map,
            _ => unreachable!(),
        };
        backend
            .set(&CollectionPath::new("users"), uid, fields)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_signed_out() {
        let backend = MemoryBackend::new();
        let gate = gate(&backend);

        assert!(!gate.is_authenticated().await.unwrap());
        assert!(!gate.has_profile().await.unwrap());
        assert_eq!(gate.check(Guard::GuestOnly).await.unwrap(), Access::Granted);
        for guard in [Guard::RequireAuth, Guard::RequireProfile, Guard::UnregisteredOnly] {
            assert_eq!(
                gate.check(guard).await.unwrap(),
                Access::Redirect(Route::Login)
            );
        }
    }

    #[tokio::test]
    async fn test_signed_in_without_profile() {
        let backend = MemoryBackend::new();
        let gate = gate(&backend);
        backend.sign_in("tech-user");

        assert_eq!(gate.check(Guard::RequireAuth).await.unwrap(), Access::Granted);
        assert_eq!(
            gate.check(Guard::RequireProfile).await.unwrap(),
            Access::Redirect(Route::Register)
        );
        assert_eq!(
            gate.check(Guard::UnregisteredOnly).await.unwrap(),
            Access::Granted
        );
        assert_eq!(
            gate.check(Guard::GuestOnly).await.unwrap(),
            Access::Redirect(Route::Home)
        );
    }

    #[tokio::test]
    async fn test_registered() {
        let backend = MemoryBackend::new();
        let gate = gate(&backend);
        backend.sign_in("tech-user");
        register(&backend, "tech-user").await;

        assert!(gate.has_profile().await.unwrap());
        assert_eq!(gate.check(Guard::RequireProfile).await.unwrap(), Access::Granted);
        assert_eq!(
            gate.check(Guard::UnregisteredOnly).await.unwrap(),
            Access::Redirect(Route::Home)
        );
    }

    #[tokio::test]
    async fn test_checks_follow_later_sign_out() {
        let backend = MemoryBackend::new();
        let gate = gate(&backend);
        backend.sign_in("tech-user");
        assert_eq!(gate.check(Guard::RequireAuth).await.unwrap(), Access::Granted);

        backend.sign_out();
        assert_eq!(
            gate.check(Guard::RequireAuth).await.unwrap(),
            Access::Redirect(Route::Login)
        );
    }

    #[tokio::test]
    async fn test_watcher_sees_every_transition() {
        let backend = MemoryBackend::new();
        let mut watcher = AuthWatcher::new(backend.watch());
        assert!(watcher.current().is_none());

        backend.sign_in("a");
        assert_eq!(watcher.changed().await.unwrap().unwrap().uid, "a");
        backend.sign_out();
        assert!(watcher.changed().await.unwrap().is_none());
        backend.sign_in("b");
        assert_eq!(watcher.signed_in().await.unwrap().uid, "b");
    }

    #[test]
    fn test_route_paths() {
        assert_eq!(Route::Home.path(), "/");
        assert_eq!(Route::Login.path(), "/login");
        assert_eq!(Route::Register.path(), "/register");
    }
}
