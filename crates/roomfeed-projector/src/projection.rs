use indexmap::IndexMap;
use parking_lot::Mutex;
use roomfeed_core::{ChangeEvent, Entity};
use std::sync::Arc;
use tokio::sync::watch;

/// What a single `apply` did to the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Inserted,
    Replaced,
    Removed,
    /// Duplicate add, or modify/remove of an id the store does not hold
    Ignored,
}

impl ApplyOutcome {
    pub fn changed(&self) -> bool {
        !matches!(self, ApplyOutcome::Ignored)
    }
}

/// Ordered, id-keyed collection folded from change events.
///
/// Order is arrival order of `Added` events; it is never re-sorted.
/// Every operation is idempotent, so replaying a redelivered batch leaves
/// the store as it was.
#[derive(Debug, Clone)]
pub struct ProjectionStore<T: Entity> {
    items: IndexMap<String, T>,
}

impl<T: Entity> Default for ProjectionStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Entity> ProjectionStore<T> {
    pub fn new() -> Self {
        Self {
            items: IndexMap::new(),
        }
    }

    /// Fold events into an empty store.
    pub fn replay<I>(events: I) -> Self
    where
        I: IntoIterator<Item = ChangeEvent<T>>,
    {
        let mut store = Self::new();
        store.apply_all(events);
        store
    }

    pub fn apply(&mut self, event: ChangeEvent<T>) -> ApplyOutcome {
        match event {
            ChangeEvent::Added(item) => {
                if self.items.contains_key(item.id()) {
                    return ApplyOutcome::Ignored;
                }
                self.items.insert(item.id().to_string(), item);
                ApplyOutcome::Inserted
            }
            ChangeEvent::Modified(item) => match self.items.get_mut(item.id()) {
                Some(slot) => {
                    *slot = item;
                    ApplyOutcome::Replaced
                }
                None => ApplyOutcome::Ignored,
            },
            ChangeEvent::Removed(id) => match self.items.shift_remove(&id) {
                Some(_) => ApplyOutcome::Removed,
                None => ApplyOutcome::Ignored,
            },
        }
    }

    /// Apply events in order, returning how many changed the store.
    pub fn apply_all<I>(&mut self, events: I) -> usize
    where
        I: IntoIterator<Item = ChangeEvent<T>>,
    {
        events
            .into_iter()
            .map(|event| self.apply(event))
            .filter(ApplyOutcome::changed)
            .count()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn snapshot(&self) -> Vec<T> {
        self.items.values().cloned().collect()
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        self.items.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.items.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.values()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

struct Shared<T: Entity> {
    store: Mutex<ProjectionStore<T>>,
    version: watch::Sender<u64>,
}

/// Shared handle to a projection.
///
/// Consumers read through it and may clear it; events are applied only by
/// the subscription feeding it. Each applied batch and each clear bumps
/// `version`.
pub struct Projection<T: Entity> {
    shared: Arc<Shared<T>>,
}

impl<T: Entity> Clone for Projection<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T: Entity> Default for Projection<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Entity> Projection<T> {
    pub fn new() -> Self {
        let (version, _) = watch::channel(0);
        Self {
            shared: Arc::new(Shared {
                store: Mutex::new(ProjectionStore::new()),
                version,
            }),
        }
    }

    /// Current contents, in projection order
    pub fn snapshot(&self) -> Vec<T> {
        self.shared.store.lock().snapshot()
    }

    pub fn get(&self, id: &str) -> Option<T> {
        self.shared.store.lock().get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.shared.store.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.store.lock().is_empty()
    }

    pub fn clear(&self) {
        self.shared.store.lock().clear();
        self.shared.version.send_modify(|v| *v += 1);
    }

    pub fn version(&self) -> u64 {
        *self.shared.version.borrow()
    }

    /// Wait until the version moves past `since`, returning the new version.
    pub async fn changed(&self, since: u64) -> u64 {
        let mut rx = self.shared.version.subscribe();
        let result = rx.wait_for(|v| *v > since).await.map(|v| *v);
        match result {
            Ok(v) => v,
            // The sender lives as long as `self`
            Err(_) => self.version(),
        }
    }

    /// Apply one batch under a single lock so readers never see half of it.
    pub(crate) fn apply_batch(&self, events: Vec<ChangeEvent<T>>) -> usize {
        let changed = self.shared.store.lock().apply_all(events);
        self.shared.version.send_modify(|v| *v += 1);
        changed
    }
}
