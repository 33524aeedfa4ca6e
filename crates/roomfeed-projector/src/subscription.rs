use crate::normalizer;
use crate::projection::Projection;
use futures::StreamExt;
use parking_lot::Mutex;
use roomfeed_core::{
    observe, ChangeFeed, ChangeSource, Entity, FeedError, Query, Result, SubscriptionConfig,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

pub type SubscriptionId = u64;

#[derive(Debug, Clone)]
pub enum SubscriptionState {
    /// Listener open, first batch not applied yet
    Opening,
    Live,
    /// Closed by `unsubscribe`
    Closed,
    /// Ended by the feed (network loss, revoked access) or by a protocol
    /// violation. Terminal: recovering means clearing the projection and
    /// subscribing again.
    Failed(Arc<FeedError>),
}

impl SubscriptionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SubscriptionState::Closed | SubscriptionState::Failed(_))
    }
}

#[derive(Debug, Clone)]
pub struct SubscriptionStatus {
    pub state: SubscriptionState,
    /// Batches applied so far
    pub batches: u64,
    /// Events contained in those batches
    pub events: u64,
}

impl SubscriptionStatus {
    fn opening() -> Self {
        Self {
            state: SubscriptionState::Opening,
            batches: 0,
            events: 0,
        }
    }
}

/// Opaque reference to an open subscription
#[derive(Debug, Clone)]
pub struct SubscriptionHandle {
    id: SubscriptionId,
    scope: String,
    status: watch::Receiver<SubscriptionStatus>,
    ready_timeout: Duration,
}

impl SubscriptionHandle {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub fn status(&self) -> SubscriptionStatus {
        self.status.borrow().clone()
    }

    /// The error that ended this subscription, if it failed
    pub fn failure(&self) -> Option<Arc<FeedError>> {
        match &self.status.borrow().state {
            SubscriptionState::Failed(err) => Some(Arc::clone(err)),
            _ => None,
        }
    }

    /// Wait until at least `n` batches have been applied.
    pub async fn wait_for_batches(&self, n: u64) -> Result<()> {
        let mut rx = self.status.clone();
        let status = rx
            .wait_for(|s| s.batches >= n || s.state.is_terminal())
            .await
            .map_err(|_| {
                FeedError::InvalidState(format!("subscription {} was dropped", self.id))
            })?
            .clone();

        if status.batches >= n {
            return Ok(());
        }
        match status.state {
            SubscriptionState::Failed(err) => Err(FeedError::SubscriptionFailed(err.to_string())),
            _ => Err(FeedError::InvalidState(format!(
                "subscription {} closed after {} of {} batches",
                self.id, status.batches, n
            ))),
        }
    }

    /// Wait for the first batch, bounded by the configured ready timeout.
    pub async fn wait_ready(&self) -> Result<()> {
        tokio::time::timeout(self.ready_timeout, self.wait_for_batches(1))
            .await
            .map_err(|_| FeedError::ReadyTimeout(self.scope.clone()))?
    }

    /// Wait until the subscription is closed or has failed.
    pub async fn wait_terminated(&self) -> SubscriptionState {
        let mut rx = self.status.clone();
        let result = rx.wait_for(|s| s.state.is_terminal()).await;
        match result {
            Ok(status) => status.state.clone(),
            Err(_) => SubscriptionState::Closed,
        }
    }
}

struct ActiveSubscription {
    id: SubscriptionId,
    /// `true` while batches may be applied. The pump holds this lock for the
    /// whole of each apply, so flipping it waits out an in-flight batch.
    gate: Arc<Mutex<bool>>,
    status: Arc<watch::Sender<SubscriptionStatus>>,
    task: JoinHandle<()>,
}

impl ActiveSubscription {
    fn is_terminal(&self) -> bool {
        self.status.borrow().state.is_terminal()
    }

    fn close(self) {
        {
            let mut open = self.gate.lock();
            *open = false;
            let mut was_live = false;
            self.status.send_modify(|s| {
                if !s.state.is_terminal() {
                    s.state = SubscriptionState::Closed;
                    was_live = true;
                }
            });
            if was_live {
                observe::record_subscription_closed();
            }
        }
        self.task.abort();
    }
}

/// Owns the open/close lifecycle of change-feed subscriptions.
///
/// Each subscription gets one pump task that reads its feed in order,
/// normalizes a whole batch, then applies it to the projection before
/// reading the next one. Different subscriptions run independently.
pub struct SubscriptionManager {
    source: Arc<dyn ChangeSource>,
    config: SubscriptionConfig,
    next_id: AtomicU64,
    active: Mutex<HashMap<String, ActiveSubscription>>,
}

impl SubscriptionManager {
    pub fn new(source: Arc<dyn ChangeSource>) -> Self {
        Self::with_config(source, SubscriptionConfig::default())
    }

    pub fn with_config(source: Arc<dyn ChangeSource>, config: SubscriptionConfig) -> Self {
        Self {
            source,
            config,
            next_id: AtomicU64::new(1),
            active: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &SubscriptionConfig {
        &self.config
    }

    /// Open a subscription for `query` that feeds `projection`.
    ///
    /// Fails with `AlreadySubscribed` if the query's scope has a live
    /// subscription, unless `replace_existing` is configured, in which case
    /// the old one is closed first. Must be called inside a tokio runtime.
    pub async fn subscribe<T: Entity>(
        &self,
        query: &Query,
        projection: Projection<T>,
    ) -> Result<SubscriptionHandle> {
        let scope = query.scope();
        self.claim_scope(&scope)?;

        if !projection.is_empty() {
            warn!(
                "Subscribing {} into a projection that still holds {} entries",
                scope,
                projection.len()
            );
        }

        let feed = self.source.listen(query).await?;

        let mut active = self.active.lock();
        if active.get(&scope).is_some_and(|s| !s.is_terminal()) && !self.config.replace_existing
        {
            // Someone else opened this scope while we were waiting on the source
            return Err(FeedError::AlreadySubscribed(scope));
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let gate = Arc::new(Mutex::new(true));
        let (status_tx, status_rx) = watch::channel(SubscriptionStatus::opening());
        let status = Arc::new(status_tx);

        let task = tokio::spawn(pump(
            id,
            scope.clone(),
            feed,
            projection,
            Arc::clone(&gate),
            Arc::clone(&status),
        ));

        let entry = ActiveSubscription {
            id,
            gate,
            status,
            task,
        };
        if let Some(previous) = active.insert(scope.clone(), entry) {
            if !previous.is_terminal() {
                info!("Replacing subscription {} on {}", previous.id, scope);
            }
            previous.close();
        }
        drop(active);

        observe::record_subscription_opened();
        info!("Subscription {} opened on {}", id, scope);

        Ok(SubscriptionHandle {
            id,
            scope,
            status: status_rx,
            ready_timeout: self.config.ready_timeout(),
        })
    }

    /// Stop the listener behind `handle`.
    ///
    /// A batch already being applied finishes; nothing is applied after
    /// this returns. The projection is left as it is.
    pub fn unsubscribe(&self, handle: &SubscriptionHandle) -> Result<()> {
        let entry = {
            let mut active = self.active.lock();
            match active.get(handle.scope()) {
                Some(entry) if entry.id == handle.id() => active.remove(handle.scope()),
                _ => None,
            }
        };

        match entry {
            Some(entry) => {
                entry.close();
                info!("Subscription {} closed on {}", handle.id(), handle.scope());
                Ok(())
            }
            None => Err(FeedError::UnknownSubscription(handle.id())),
        }
    }

    /// Close every subscription (sign-out, shutdown).
    pub fn unsubscribe_all(&self) -> usize {
        let entries: Vec<_> = self.active.lock().drain().collect();
        let count = entries.len();
        for (scope, entry) in entries {
            debug!("Closing subscription {} on {}", entry.id, scope);
            entry.close();
        }
        count
    }

    /// Whether `scope` has a subscription that is still delivering
    pub fn is_active(&self, scope: &str) -> bool {
        self.active
            .lock()
            .get(scope)
            .is_some_and(|entry| !entry.is_terminal())
    }

    pub fn active_scopes(&self) -> Vec<String> {
        let mut scopes: Vec<String> = self
            .active
            .lock()
            .iter()
            .filter(|(_, entry)| !entry.is_terminal())
            .map(|(scope, _)| scope.clone())
            .collect();
        scopes.sort();
        scopes
    }

    /// Check the one-per-scope policy before opening a listener.
    ///
    /// Terminated entries are reaped here. A live entry that is going to
    /// be replaced stays open until the new listener is up, so a failed
    /// `listen` leaves it untouched.
    fn claim_scope(&self, scope: &str) -> Result<()> {
        let mut active = self.active.lock();
        let Some(existing) = active.get(scope) else {
            return Ok(());
        };

        if !existing.is_terminal() {
            if self.config.replace_existing {
                debug!("Subscription {} on {} will be replaced", existing.id, scope);
                return Ok(());
            }
            return Err(FeedError::AlreadySubscribed(scope.to_string()));
        }

        debug!("Reaping finished subscription {} on {}", existing.id, scope);
        if let Some(existing) = active.remove(scope) {
            existing.close();
        }
        Ok(())
    }
}

impl Drop for SubscriptionManager {
    fn drop(&mut self) {
        for (_, entry) in self.active.get_mut().drain() {
            entry.close();
        }
    }
}

async fn pump<T: Entity>(
    id: SubscriptionId,
    scope: String,
    mut feed: ChangeFeed,
    projection: Projection<T>,
    gate: Arc<Mutex<bool>>,
    status: Arc<watch::Sender<SubscriptionStatus>>,
) {
    while let Some(delivery) = feed.next().await {
        let events = match delivery.and_then(normalizer::decode_batch::<T>) {
            Ok(events) => events,
            Err(err) => {
                fail(id, &scope, &gate, &status, err);
                return;
            }
        };

        let start = Instant::now();
        let count = events.len() as u64;
        {
            let open = gate.lock();
            if !*open {
                debug!("Subscription {} closed, dropping batch of {}", id, count);
                return;
            }
            let changed = projection.apply_batch(events);
            status.send_modify(|s| {
                s.state = SubscriptionState::Live;
                s.batches += 1;
                s.events += count;
            });
            debug!(
                "Subscription {} applied {} events ({} changed) in {:?}",
                id,
                count,
                changed,
                start.elapsed()
            );
        }
        observe::record_batch_applied(start.elapsed(), count);
    }

    fail(
        id,
        &scope,
        &gate,
        &status,
        FeedError::SubscriptionFailed("change feed ended".to_string()),
    );
}

fn fail(
    id: SubscriptionId,
    scope: &str,
    gate: &Mutex<bool>,
    status: &watch::Sender<SubscriptionStatus>,
    err: FeedError,
) {
    let open = gate.lock();
    if !*open {
        return;
    }

    if err.is_protocol_violation() {
        tracing::error!("Subscription {} on {} hit a protocol violation: {}", id, scope, err);
    } else {
        warn!("Subscription {} on {} failed: {}", id, scope, err);
    }
    observe::record_subscription_failed(err.is_protocol_violation());
    observe::record_subscription_closed();

    let err = Arc::new(err);
    status.send_modify(|s| s.state = SubscriptionState::Failed(err));
}
