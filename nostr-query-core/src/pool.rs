//! The relay pool seam
//!
//! Queries never talk to relays directly. They ask a [`RelayPool`] for a
//! subscription and consume the [`SubscriptionMessage`]s it delivers. The
//! pool owns connections, framing and signature checks.
//!
//! [`ClientPool`] adapts a `nostr_sdk::Client`: it filters the client's
//! notification stream down to one subscription id and folds the per-relay
//! EOSE messages into a single [`SubscriptionMessage::Eose`].

use crate::NostrEvent;
use nostr_sdk::prelude::*;
use std::collections::HashSet;
use std::time::Duration;
use tokio::sync::{broadcast::error::RecvError, mpsc, oneshot};
use tracing::{debug, trace, warn};

/// How long to wait for every relay's EOSE before reporting EOSE anyway
pub const DEFAULT_EOSE_TIMEOUT: Duration = Duration::from_millis(3400);

/// A message delivered on a pool subscription
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionMessage {
    /// An event matching the subscription's filters (may be a duplicate)
    Event(NostrEvent),
    /// The relays have sent all stored events
    Eose,
}

/// A live subscription handed out by a [`RelayPool`]
///
/// Dropping or closing the subscription runs its close hook exactly once,
/// which tells the pool to unsubscribe.
pub struct PoolSubscription {
    id: String,
    messages: mpsc::UnboundedReceiver<SubscriptionMessage>,
    on_close: Option<Box<dyn FnOnce() + Send>>,
}

impl PoolSubscription {
    pub fn new<F>(
        id: impl Into<String>,
        messages: mpsc::UnboundedReceiver<SubscriptionMessage>,
        on_close: F,
    ) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            id: id.into(),
            messages,
            on_close: Some(Box::new(on_close)),
        }
    }

    /// Create a subscription together with the sender that feeds it
    pub fn channel<F>(
        id: impl Into<String>,
        on_close: F,
    ) -> (mpsc::UnboundedSender<SubscriptionMessage>, Self)
    where
        F: FnOnce() + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, Self::new(id, rx, on_close))
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Next message, or `None` once the pool side has gone away
    pub async fn recv(&mut self) -> Option<SubscriptionMessage> {
        self.messages.recv().await
    }

    /// Unsubscribe
    pub fn close(mut self) {
        self.run_close();
    }

    fn run_close(&mut self) {
        if let Some(on_close) = self.on_close.take() {
            debug!("Closing subscription {}", self.id);
            on_close();
        }
    }
}

impl Drop for PoolSubscription {
    fn drop(&mut self) {
        self.run_close();
    }
}

impl std::fmt::Debug for PoolSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PoolSubscription")
            .field("id", &self.id)
            .field("closed", &self.on_close.is_none())
            .finish()
    }
}

/// Something that can open relay subscriptions
///
/// Subscribing returns immediately; events and EOSE arrive asynchronously on
/// the returned [`PoolSubscription`]. An empty `relay_urls` slice means every
/// relay the pool knows about.
pub trait RelayPool: Send + Sync + 'static {
    fn subscribe(&self, relay_urls: &[String], filters: Vec<Filter>) -> PoolSubscription;
}

impl<P: RelayPool> RelayPool for std::sync::Arc<P> {
    fn subscribe(&self, relay_urls: &[String], filters: Vec<Filter>) -> PoolSubscription {
        (**self).subscribe(relay_urls, filters)
    }
}

/// Folds per-relay EOSE messages into one end-of-stream signal
///
/// The signal fires when every expected relay has reported EOSE, or when
/// [`EoseTracker::timeout`] is called first. It fires at most once.
#[derive(Debug, Clone)]
pub struct EoseTracker {
    expected: usize,
    seen: HashSet<String>,
    done: bool,
}

impl EoseTracker {
    pub fn new(expected: usize) -> Self {
        Self {
            expected,
            seen: HashSet::new(),
            done: false,
        }
    }

    /// Record EOSE from one relay; returns `true` if the signal fires now
    pub fn relay_eose(&mut self, relay_url: &str) -> bool {
        if self.done {
            return false;
        }
        self.seen.insert(relay_url.to_string());
        if self.seen.len() >= self.expected {
            self.done = true;
            return true;
        }
        false
    }

    /// Give up waiting; returns `true` if the signal fires now
    pub fn timeout(&mut self) -> bool {
        if self.done {
            return false;
        }
        self.done = true;
        true
    }

    pub fn is_done(&self) -> bool {
        self.done
    }
}

/// A [`RelayPool`] backed by a `nostr_sdk::Client`
///
/// Must be used from within a Tokio runtime.
#[derive(Debug, Clone)]
pub struct ClientPool {
    client: Client,
    eose_timeout: Duration,
}

impl ClientPool {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            eose_timeout: DEFAULT_EOSE_TIMEOUT,
        }
    }

    pub fn with_eose_timeout(mut self, eose_timeout: Duration) -> Self {
        self.eose_timeout = eose_timeout;
        self
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

impl RelayPool for ClientPool {
    fn subscribe(&self, relay_urls: &[String], filters: Vec<Filter>) -> PoolSubscription {
        spawn_client_subscription(self.client.clone(), relay_urls, filters, self.eose_timeout)
    }
}

impl RelayPool for Client {
    fn subscribe(&self, relay_urls: &[String], filters: Vec<Filter>) -> PoolSubscription {
        spawn_client_subscription(self.clone(), relay_urls, filters, DEFAULT_EOSE_TIMEOUT)
    }
}

fn spawn_client_subscription(
    client: Client,
    relay_urls: &[String],
    filters: Vec<Filter>,
    eose_timeout: Duration,
) -> PoolSubscription {
    let id = SubscriptionId::generate();
    let (tx, rx) = mpsc::unbounded_channel();
    let (close_tx, close_rx) = oneshot::channel::<()>();

    tokio::spawn(forward_notifications(
        client,
        id.clone(),
        relay_urls.to_vec(),
        filters,
        eose_timeout,
        tx,
        close_rx,
    ));

    PoolSubscription::new(id.to_string(), rx, move || {
        let _ = close_tx.send(());
    })
}

async fn forward_notifications(
    client: Client,
    id: SubscriptionId,
    relay_urls: Vec<String>,
    filters: Vec<Filter>,
    eose_timeout: Duration,
    tx: mpsc::UnboundedSender<SubscriptionMessage>,
    mut close_rx: oneshot::Receiver<()>,
) {
    // Listen before subscribing so nothing sent in between is lost
    let mut notifications = client.notifications();

    let targets = prepare_targets(&client, relay_urls).await;
    let mut tracker = EoseTracker::new(targets.len());

    if targets.is_empty() {
        warn!("Subscription {} has no relays to read from", id);
        tracker.timeout();
        let _ = tx.send(SubscriptionMessage::Eose);
    } else if let Err(e) = client
        .subscribe_with_id_to(targets.clone(), id.clone(), filters, None)
        .await
    {
        // Relays may still come up; EOSE is left to the timeout
        warn!("Failed to subscribe {} on {} relay(s): {}", id, targets.len(), e);
    } else {
        debug!("Subscribed {} on {} relay(s)", id, targets.len());
    }

    let deadline = tokio::time::sleep(eose_timeout);
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            _ = &mut close_rx => break,
            _ = tx.closed() => break,
            _ = &mut deadline, if !tracker.is_done() => {
                if tracker.timeout() {
                    debug!("EOSE timeout for {}", id);
                    let _ = tx.send(SubscriptionMessage::Eose);
                }
            }
            notification = notifications.recv() => match notification {
                Ok(RelayPoolNotification::Event { subscription_id, event, .. }) => {
                    if subscription_id == id {
                        let _ = tx.send(SubscriptionMessage::Event(NostrEvent::from(*event)));
                    }
                }
                Ok(RelayPoolNotification::Message {
                    relay_url,
                    message: RelayMessage::EndOfStoredEvents(subscription_id),
                }) => {
                    if subscription_id == id && tracker.relay_eose(relay_url.as_str()) {
                        let _ = tx.send(SubscriptionMessage::Eose);
                    }
                }
                Ok(RelayPoolNotification::Shutdown) => {
                    debug!("Relay pool shut down, ending {}", id);
                    return;
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Subscription {} lagged, {} notifications skipped", id, skipped);
                }
                Err(RecvError::Closed) => return,
            }
        }
    }

    trace!("Unsubscribing {}", id);
    client.unsubscribe(id).await;
}

/// Resolve the relays a subscription should read from
///
/// An empty list means every relay the client knows. Otherwise URLs are
/// parsed and deduplicated, and relays the client does not know yet are
/// added and connected. Unparsable URLs and relays the client refuses to
/// add are skipped.
async fn prepare_targets(client: &Client, relay_urls: Vec<String>) -> Vec<Url> {
    let known: HashSet<Url> = client.relays().await.into_keys().collect();
    if relay_urls.is_empty() {
        return known.into_iter().collect();
    }

    let mut seen = HashSet::new();
    let mut targets = Vec::new();
    for relay_url in relay_urls {
        let url = match Url::parse(&relay_url) {
            Ok(url) => url,
            Err(e) => {
                warn!("Skipping invalid relay URL {}: {}", relay_url, e);
                continue;
            }
        };
        if !seen.insert(url.clone()) {
            continue;
        }

        if !known.contains(&url) {
            if let Err(e) = client.add_relay(url.clone()).await {
                warn!("Failed to add relay {}: {}", url, e);
                continue;
            }
            debug!("Added relay {}", url);
            if let Err(e) = client.connect_relay(url.clone()).await {
                warn!("Failed to connect to relay {}: {}", url, e);
            }
        }
        targets.push(url);
    }
    targets
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_eose_tracker_waits_for_all_relays() {
        let mut tracker = EoseTracker::new(2);

        assert!(!tracker.relay_eose("wss://a.example"));
        assert!(!tracker.relay_eose("wss://a.example"));
        assert!(tracker.relay_eose("wss://b.example"));
        assert!(!tracker.relay_eose("wss://c.example"));
        assert!(tracker.is_done());
    }

    #[test]
    fn test_eose_tracker_timeout_fires_once() {
        let mut tracker = EoseTracker::new(3);

        assert!(!tracker.relay_eose("wss://a.example"));
        assert!(tracker.timeout());
        assert!(!tracker.timeout());
        assert!(!tracker.relay_eose("wss://b.example"));
    }

    #[test]
    fn test_close_hook_runs_once() {
        let closed = Arc::new(AtomicUsize::new(0));
        let counter = closed.clone();
        let (_tx, sub) = PoolSubscription::channel("sub", move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        sub.close();
        assert_eq!(closed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_drop_runs_close_hook() {
        let closed = Arc::new(AtomicUsize::new(0));
        let counter = closed.clone();
        {
            let (_tx, _sub) = PoolSubscription::channel("sub", move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }
        assert_eq!(closed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_recv_delivers_in_order() {
        let (tx, mut sub) = PoolSubscription::channel("sub", || {});
        let event = crate::NostrEventBuilder::new().id("a").build();

        tx.send(SubscriptionMessage::Event(event.clone())).unwrap();
        tx.send(SubscriptionMessage::Eose).unwrap();
        drop(tx);

        assert_eq!(sub.recv().await, Some(SubscriptionMessage::Event(event)));
        assert_eq!(sub.recv().await, Some(SubscriptionMessage::Eose));
        assert_eq!(sub.recv().await, None);
        assert_eq!(sub.id(), "sub");
    }

    async fn first_message(subscription: &mut PoolSubscription) -> Option<SubscriptionMessage> {
        tokio::time::timeout(Duration::from_secs(5), subscription.recv())
            .await
            .ok()
            .flatten()
    }

    #[tokio::test]
    async fn test_client_without_relays_reports_eose_immediately() {
        let pool = ClientPool::new(Client::default()).with_eose_timeout(Duration::from_secs(60));
        let mut subscription = pool.subscribe(&[], vec![Filter::new().kind(Kind::TextNote)]);

        assert_eq!(first_message(&mut subscription).await, Some(SubscriptionMessage::Eose));
    }

    #[tokio::test]
    async fn test_only_invalid_urls_reports_eose_immediately() {
        let pool = ClientPool::new(Client::default()).with_eose_timeout(Duration::from_secs(60));
        let urls = vec!["not a relay url".to_string()];
        let mut subscription = pool.subscribe(&urls, vec![Filter::new()]);

        assert_eq!(first_message(&mut subscription).await, Some(SubscriptionMessage::Eose));
        assert!(pool.client().relays().await.is_empty());
    }

    #[tokio::test]
    async fn test_prepare_targets_adds_and_deduplicates() {
        let client = Client::default();
        let urls = vec![
            "ws://127.0.0.1:1".to_string(),
            "ws://127.0.0.1:1/".to_string(),
            "bogus".to_string(),
        ];

        let targets = prepare_targets(&client, urls).await;

        assert_eq!(targets.len(), 1);
        assert!(client.relays().await.contains_key(&targets[0]));
    }

    #[tokio::test]
    async fn test_unreachable_relay_reports_eose_after_timeout() {
        let timeout = Duration::from_millis(50);
        let pool = ClientPool::new(Client::default()).with_eose_timeout(timeout);
        let urls = vec!["ws://127.0.0.1:1".to_string()];

        let started = std::time::Instant::now();
        let mut subscription = pool.subscribe(&urls, vec![Filter::new().kind(Kind::TextNote)]);

        assert_eq!(first_message(&mut subscription).await, Some(SubscriptionMessage::Eose));
        assert!(started.elapsed() >= timeout);
        assert_eq!(pool.client().relays().await.len(), 1);
    }
}
