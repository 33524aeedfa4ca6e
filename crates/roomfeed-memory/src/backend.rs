use crate::ordering::sort_documents;
use crate::rules::{ChatRules, WriteRules};
use async_trait::async_trait;
use futures::StreamExt;
use indexmap::IndexMap;
use parking_lot::Mutex;
use roomfeed_core::{
    AuthProvider, AuthUser, ChangeBatch, ChangeFeed, ChangeSource, CollectionPath, Document,
    DocumentStore, FeedError, Fields, Query, RawChange, Result,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info};

type FeedSender = mpsc::UnboundedSender<Result<ChangeBatch>>;

struct Listener {
    collection: CollectionPath,
    tx: FeedSender,
}

#[derive(Default)]
struct State {
    /// Documents per collection, in insertion order
    collections: HashMap<CollectionPath, IndexMap<String, Fields>>,
    listeners: Vec<Listener>,
}

impl State {
    /// Deliver a batch to every listener on `collection`, dropping listeners
    /// whose feed has been closed.
    fn broadcast(&mut self, collection: &CollectionPath, batch: ChangeBatch) -> usize {
        let mut delivered = 0;
        self.listeners.retain(|listener| {
            if listener.collection != *collection {
                return true;
            }
            let alive = listener.tx.send(Ok(batch.clone())).is_ok();
            if alive {
                delivered += 1;
            }
            alive
        });
        delivered
    }

    /// End every listener matched by `filter` with `error`.
    fn fail_listeners<F>(&mut self, filter: F, error: impl Fn() -> FeedError) -> usize
    where
        F: Fn(&Listener) -> bool,
    {
        let before = self.listeners.len();
        self.listeners.retain(|listener| {
            if filter(listener) {
                let _ = listener.tx.send(Err(error()));
                false
            } else {
                true
            }
        });
        before - self.listeners.len()
    }
}

struct Inner {
    state: Mutex<State>,
    auth: watch::Sender<Option<AuthUser>>,
    rules: Arc<dyn WriteRules>,
}

/// In-memory document store, change source and auth provider.
///
/// Cloning is cheap and every clone shares the same data, listeners and
/// auth state.
#[derive(Clone)]
pub struct MemoryBackend {
    inner: Arc<Inner>,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    /// Backend enforcing the chat write rules
    pub fn new() -> Self {
        Self::with_rules(Arc::new(ChatRules))
    }

    pub fn with_rules(rules: Arc<dyn WriteRules>) -> Self {
        let (auth, _) = watch::channel(None);
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State::default()),
                auth,
                rules,
            }),
        }
    }

    pub fn sign_in(&self, uid: impl Into<String>) -> AuthUser {
        let user = AuthUser::new(uid);
        info!("Signed in as {}", user.uid);
        self.inner.auth.send_replace(Some(user.clone()));
        user
    }

    /// Sign out. Open listeners lose read access and are ended with a
    /// permission error.
    pub fn sign_out(&self) {
        let previous = self.inner.auth.send_replace(None);
        if let Some(user) = previous {
            info!("Signed out {}", user.uid);
        }
        let ended = self.inner.state.lock().fail_listeners(
            |_| true,
            || FeedError::PermissionDenied("signed out".to_string()),
        );
        if ended > 0 {
            debug!("Ended {} listeners on sign-out", ended);
        }
    }

    /// Deliver a raw batch to the listeners of `collection` without touching
    /// stored data. Simulates redelivery or a misbehaving source.
    pub fn push_raw(&self, collection: &CollectionPath, batch: ChangeBatch) -> usize {
        self.inner.state.lock().broadcast(collection, batch)
    }

    /// Drop the listeners of `collection` as a lost connection would.
    pub fn disconnect(&self, collection: &CollectionPath) -> usize {
        self.inner.state.lock().fail_listeners(
            |listener| listener.collection == *collection,
            || FeedError::SubscriptionFailed("connection lost".to_string()),
        )
    }

    /// Open listeners on `collection` whose feed is still held
    pub fn listener_count(&self, collection: &CollectionPath) -> usize {
        self.inner
            .state
            .lock()
            .listeners
            .iter()
            .filter(|l| l.collection == *collection && !l.tx.is_closed())
            .count()
    }

    /// Listener entries held across all collections, closed ones included
    pub fn registered_listeners(&self) -> usize {
        self.inner.state.lock().listeners.len()
    }

    /// Every stored document of `collection`, bypassing access rules
    pub fn documents(&self, collection: &CollectionPath) -> Vec<Document> {
        self.inner
            .state
            .lock()
            .collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|(id, fields)| Document::with_fields(id.clone(), fields.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn caller(&self) -> Option<AuthUser> {
        self.inner.auth.borrow().clone()
    }

    fn require_reader(&self, collection: &CollectionPath) -> Result<AuthUser> {
        self.caller().ok_or_else(|| {
            FeedError::PermissionDenied(format!("read of {} requires sign-in", collection))
        })
    }

    fn write(&self, collection: &CollectionPath, id: &str, fields: Fields) -> Result<()> {
        let caller = self.caller().ok_or_else(|| {
            FeedError::PermissionDenied(format!("write to {} requires sign-in", collection))
        })?;
        self.inner
            .rules
            .check_write(collection, id, &fields, &caller)?;

        let mut state = self.inner.state.lock();
        let docs = state.collections.entry(collection.clone()).or_default();
        let existed = docs.insert(id.to_string(), fields.clone()).is_some();

        let document = Document::with_fields(id, fields);
        let change = if existed {
            RawChange::modified(document)
        } else {
            RawChange::added(document)
        };
        debug!("{} {}/{}", change.kind, collection, id);
        state.broadcast(collection, vec![change]);
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryBackend {
    async fn get(&self, collection: &CollectionPath, id: &str) -> Result<Option<Document>> {
        self.require_reader(collection)?;
        let state = self.inner.state.lock();
        Ok(state
            .collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|fields| Document::with_fields(id, fields.clone())))
    }

    async fn set(&self, collection: &CollectionPath, id: &str, fields: Fields) -> Result<()> {
        self.write(collection, id, fields)
    }

    async fn add(&self, collection: &CollectionPath, fields: Fields) -> Result<String> {
        let id = uuid::Uuid::new_v4().simple().to_string();
        self.write(collection, &id, fields)?;
        Ok(id)
    }

    async fn delete(&self, collection: &CollectionPath, id: &str) -> Result<()> {
        if self.caller().is_none() {
            return Err(FeedError::PermissionDenied(format!(
                "delete in {} requires sign-in",
                collection
            )));
        }

        let mut state = self.inner.state.lock();
        let removed = state
            .collections
            .get_mut(collection)
            .and_then(|docs| docs.shift_remove(id));

        if let Some(fields) = removed {
            debug!("removed {}/{}", collection, id);
            state.broadcast(
                collection,
                vec![RawChange::removed(Document::with_fields(id, fields))],
            );
        }
        Ok(())
    }
}

#[async_trait]
impl ChangeSource for MemoryBackend {
    async fn listen(&self, query: &Query) -> Result<ChangeFeed> {
        self.require_reader(&query.collection)?;

        let (tx, rx) = mpsc::unbounded_channel();
        {
            let mut state = self.inner.state.lock();
            let before = state.listeners.len();
            state.listeners.retain(|l| !l.tx.is_closed());
            if state.listeners.len() < before {
                debug!("Pruned {} closed listeners", before - state.listeners.len());
            }

            let mut current: Vec<Document> = state
                .collections
                .get(&query.collection)
                .map(|docs| {
                    docs.iter()
                        .map(|(id, fields)| Document::with_fields(id.clone(), fields.clone()))
                        .collect()
                })
                .unwrap_or_default();
            if let Some(order) = &query.order_by {
                sort_documents(&mut current, order);
            }

            // Initial snapshot goes out before any later change can be queued
            let initial: ChangeBatch = current.into_iter().map(RawChange::added).collect();
            let _ = tx.send(Ok(initial));
            state.listeners.push(Listener {
                collection: query.collection.clone(),
                tx,
            });
        }
        info!("Listening on {}", query.scope());

        let feed = futures::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|item| (item, rx))
        });
        Ok(feed.boxed())
    }
}

#[async_trait]
impl AuthProvider for MemoryBackend {
    async fn current_user(&self) -> Result<Option<AuthUser>> {
        Ok(self.caller())
    }

    fn watch(&self) -> watch::Receiver<Option<AuthUser>> {
        self.inner.auth.subscribe()
    }
}
