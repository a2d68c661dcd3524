//! Single-filter event query
//!
//! An [`EventQuery`] keeps one pool subscription open and folds what it
//! delivers into an [`EventQueryResult`]. Creating the query mounts it,
//! [`EventQuery::update`] re-renders it with new dependencies, and dropping
//! it unmounts it.
//!
//! State is published on a `tokio::sync::watch` channel. Readers either take
//! a snapshot with [`EventQuery::result`] or await changes on the receiver
//! returned by [`EventQuery::subscribe_changes`].

use crate::{
    EventQueryResult,
    pool::{PoolSubscription, RelayPool, SubscriptionMessage},
    relays::{Relay, relay_urls},
};
use nostr_sdk::Filter;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

/// Options shared by every query flavour
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventQueryOptions {
    /// When false no subscription is opened
    pub enabled: bool,
    /// Relays to read from; empty means every relay in the pool
    pub read_from_relays: Vec<Relay>,
}

impl Default for EventQueryOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            read_from_relays: Vec::new(),
        }
    }
}

impl EventQueryOptions {
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn read_from_relays(mut self, relays: Vec<Relay>) -> Self {
        self.read_from_relays = relays;
        self
    }

    pub fn relay_urls(&self) -> Vec<String> {
        relay_urls(&self.read_from_relays)
    }
}

/// Value identity of a subscription's dependencies
///
/// Two keys are equal when the enabled flag, the relay URLs and the
/// serialized filters are equal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SubscriptionKey {
    enabled: bool,
    relay_urls: Vec<String>,
    filters: String,
}

impl SubscriptionKey {
    pub(crate) fn new(filters: &[Filter], options: &EventQueryOptions) -> Self {
        Self {
            enabled: options.enabled,
            relay_urls: options.relay_urls(),
            filters: serde_json::to_string(filters).unwrap_or_default(),
        }
    }
}

/// A running pool subscription and the task applying its messages to `T`
///
/// Dropping it unmounts the subscription. The mounted flag is cleared while
/// holding the state's write lock and checked under the same lock before
/// every apply, so no message reaches the state after the drop returns.
/// Dropping while holding a borrow of the same watch channel deadlocks.
pub(crate) struct ActiveSubscription<T> {
    mounted: Arc<AtomicBool>,
    state: Arc<watch::Sender<T>>,
    task: JoinHandle<()>,
}

impl<T: Send + Sync + 'static> ActiveSubscription<T> {
    /// Spawn a task that folds every message of `subscription` into `state`
    ///
    /// `apply` returns whether the state changed; readers are only notified
    /// when it did.
    pub(crate) fn spawn<F>(
        mut subscription: PoolSubscription,
        state: Arc<watch::Sender<T>>,
        mut apply: F,
    ) -> Self
    where
        F: FnMut(&mut T, SubscriptionMessage) -> bool + Send + 'static,
    {
        let mounted = Arc::new(AtomicBool::new(true));
        let flag = mounted.clone();
        let shared = state.clone();

        let task = tokio::spawn(async move {
            while let Some(message) = subscription.recv().await {
                let mut unmounted = false;
                shared.send_if_modified(|value| {
                    if !flag.load(Ordering::Acquire) {
                        unmounted = true;
                        return false;
                    }
                    apply(value, message)
                });
                if unmounted {
                    trace!("Ignoring message for unmounted subscription {}", subscription.id());
                    break;
                }
            }
            subscription.close();
        });

        Self {
            mounted,
            state,
            task,
        }
    }
}

impl<T> Drop for ActiveSubscription<T> {
    fn drop(&mut self) {
        self.state.send_if_modified(|_| {
            self.mounted.store(false, Ordering::Release);
            false
        });
        // Aborting drops the task's PoolSubscription, which unsubscribes
        self.task.abort();
    }
}

/// Deduplicated, arrival-ordered, EOSE-tracked state for one set of filters
///
/// Must be created inside a Tokio runtime.
///
/// # Example
///
/// ```no_run
/// use nostr_query_core::{ClientPool, EventQuery, EventQueryOptions};
/// use nostr_sdk::{Client, Filter, Kind};
/// use std::sync::Arc;
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let client = Client::default();
/// client.add_relay("wss://relay.damus.io").await?;
/// client.connect().await;
///
/// let pool = Arc::new(ClientPool::new(client));
/// let filters = vec![Filter::new().kind(Kind::TextNote).limit(20)];
/// let query = EventQuery::new(pool, filters, EventQueryOptions::default());
///
/// let result = query.wait_for_eose().await;
/// println!("{}", result);
/// # Ok(())
/// # }
/// ```
pub struct EventQuery<P: RelayPool> {
    pool: Arc<P>,
    state: Arc<watch::Sender<EventQueryResult>>,
    key: SubscriptionKey,
    active: Option<ActiveSubscription<EventQueryResult>>,
}

impl<P: RelayPool> EventQuery<P> {
    /// Mount the query, subscribing right away if enabled
    pub fn new(pool: Arc<P>, filters: Vec<Filter>, options: EventQueryOptions) -> Self {
        let (state, _) = watch::channel(EventQueryResult::new());
        let state = Arc::new(state);
        let key = SubscriptionKey::new(&filters, &options);

        let mut query = Self {
            pool,
            state,
            key,
            active: None,
        };
        query.start(filters, &options);
        query
    }

    /// Re-render with possibly new filters and options
    ///
    /// Resubscribes only when the enabled flag, relay URLs or filters differ
    /// by value from the current ones. Events and EOSE collected so far are
    /// kept.
    pub fn update(&mut self, filters: Vec<Filter>, options: EventQueryOptions) {
        let key = SubscriptionKey::new(&filters, &options);
        if key == self.key {
            return;
        }

        debug!("Query dependencies changed, resubscribing");
        self.stop();
        self.key = key;
        self.start(filters, &options);
    }

    /// Snapshot of the current state
    pub fn result(&self) -> EventQueryResult {
        self.state.borrow().clone()
    }

    /// Receiver notified on every state change
    pub fn subscribe_changes(&self) -> watch::Receiver<EventQueryResult> {
        self.state.subscribe()
    }

    /// Whether a pool subscription is currently open
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Wait until the relays signal the end of stored events
    ///
    /// Never resolves for a disabled query.
    pub async fn wait_for_eose(&self) -> EventQueryResult {
        let mut changes = self.state.subscribe();
        match changes.wait_for(|result| result.eose).await {
            Ok(result) => result.clone(),
            // The sender lives in self, so this only happens during teardown
            Err(_) => self.result(),
        }
    }

    fn start(&mut self, filters: Vec<Filter>, options: &EventQueryOptions) {
        if !options.enabled {
            return;
        }

        let subscription = self.pool.subscribe(&options.relay_urls(), filters);
        debug!("Opened query subscription {}", subscription.id());

        self.active = Some(ActiveSubscription::spawn(
            subscription,
            self.state.clone(),
            apply_message,
        ));
    }

    fn stop(&mut self) {
        self.active = None;
    }
}

impl<P: RelayPool> Drop for EventQuery<P> {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Fold one subscription message into query state
///
/// Returns whether anything changed.
pub(crate) fn apply_message(result: &mut EventQueryResult, message: SubscriptionMessage) -> bool {
    match message {
        SubscriptionMessage::Event(event) => {
            let inserted = result.insert(event);
            if !inserted {
                trace!("Duplicate event ignored");
            }
            inserted
        }
        SubscriptionMessage::Eose => result.mark_eose(),
    }
}
