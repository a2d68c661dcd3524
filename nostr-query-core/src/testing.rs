//! In-memory relay pool for tests and demos
//!
//! [`FakePool`] records every subscription it hands out and lets the caller
//! push events and EOSE into any of them by index, in the order subscriptions
//! were opened.

use crate::{
    NostrEvent,
    pool::{PoolSubscription, RelayPool, SubscriptionMessage},
};
use nostr_sdk::{Filter, PublicKey};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::mpsc;

struct FakeSubscription {
    relay_urls: Vec<String>,
    filters: Vec<Filter>,
    sender: mpsc::UnboundedSender<SubscriptionMessage>,
    closed: Arc<AtomicBool>,
}

#[derive(Default)]
pub struct FakePool {
    subscriptions: Mutex<Vec<FakeSubscription>>,
}

impl FakePool {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<FakeSubscription>> {
        self.subscriptions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Number of subscriptions opened so far, closed ones included
    pub fn subscription_count(&self) -> usize {
        self.lock().len()
    }

    /// Number of subscriptions not yet closed
    pub fn open_count(&self) -> usize {
        self.lock()
            .iter()
            .filter(|sub| !sub.closed.load(Ordering::SeqCst))
            .count()
    }

    pub fn relay_urls(&self, index: usize) -> Vec<String> {
        self.lock()[index].relay_urls.clone()
    }

    pub fn filters(&self, index: usize) -> Vec<Filter> {
        self.lock()[index].filters.clone()
    }

    /// Index of the most recent subscription whose filters name `author`
    pub fn index_for_author(&self, author: &PublicKey) -> Option<usize> {
        self.lock().iter().rposition(|sub| {
            sub.filters.iter().any(|filter| {
                filter
                    .authors
                    .as_ref()
                    .is_some_and(|authors| authors.contains(author))
            })
        })
    }

    /// Deliver an event; silently dropped if the subscription is gone
    pub fn send_event(&self, index: usize, event: NostrEvent) {
        let _ = self.lock()[index]
            .sender
            .send(SubscriptionMessage::Event(event));
    }

    pub fn send_eose(&self, index: usize) {
        let _ = self.lock()[index].sender.send(SubscriptionMessage::Eose);
    }

    pub fn is_closed(&self, index: usize) -> bool {
        self.lock()[index].closed.load(Ordering::SeqCst)
    }

    /// Wait up to a second for a subscription to be closed
    pub async fn wait_closed(&self, index: usize) -> bool {
        for _ in 0..1000 {
            if self.is_closed(index) {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        false
    }
}

impl RelayPool for FakePool {
    fn subscribe(&self, relay_urls: &[String], filters: Vec<Filter>) -> PoolSubscription {
        let mut subscriptions = self.lock();
        let closed = Arc::new(AtomicBool::new(false));
        let flag = closed.clone();
        let (sender, subscription) =
            PoolSubscription::channel(format!("fake-{}", subscriptions.len()), move || {
                flag.store(true, Ordering::SeqCst);
            });

        subscriptions.push(FakeSubscription {
            relay_urls: relay_urls.to_vec(),
            filters,
            sender,
            closed,
        });
        subscription
    }
}
