//! Per-author fan-out of the single-filter query
//!
//! [`EventQueryByAuthor`] runs one independent subscription per author, each
//! with the shared filters narrowed to that author, and keeps a separate
//! deduplicated result and EOSE flag for every author.

use crate::{
    EventQueryResult,
    pool::{RelayPool, SubscriptionMessage},
    query::{ActiveSubscription, EventQueryOptions, SubscriptionKey},
};
use nostr_sdk::{Filter, PublicKey};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

/// Results keyed by author
pub type AuthorResults = BTreeMap<PublicKey, EventQueryResult>;

/// Narrow every filter to a single author
///
/// Any authors already present on a filter are replaced.
pub fn filters_for_author(filters: &[Filter], author: PublicKey) -> Vec<Filter> {
    filters
        .iter()
        .map(|filter| {
            let mut filter = filter.clone();
            filter.authors = Some(HashSet::from([author]));
            filter
        })
        .collect()
}

/// Authors that have received at least one event
///
/// Authors whose subscription only produced EOSE so far are left out.
pub fn authors_with_events(results: &AuthorResults) -> AuthorResults {
    results
        .iter()
        .filter(|(_, result)| !result.is_empty())
        .map(|(author, result)| (*author, result.clone()))
        .collect()
}

/// One subscription per author, results grouped by author
///
/// Must be created inside a Tokio runtime.
pub struct EventQueryByAuthor<P: RelayPool> {
    pool: Arc<P>,
    filters: Vec<Filter>,
    authors: Vec<PublicKey>,
    options: EventQueryOptions,
    key: SubscriptionKey,
    state: Arc<watch::Sender<AuthorResults>>,
    queries: HashMap<PublicKey, ActiveSubscription<AuthorResults>>,
}

impl<P: RelayPool> EventQueryByAuthor<P> {
    /// Mount the query, subscribing for every author right away if enabled
    pub fn new(
        pool: Arc<P>,
        filters: Vec<Filter>,
        authors: Vec<PublicKey>,
        options: EventQueryOptions,
    ) -> Self {
        let (state, _) = watch::channel(AuthorResults::new());
        let key = SubscriptionKey::new(&filters, &options);

        let mut query = Self {
            pool,
            filters,
            authors,
            options,
            key,
            state: Arc::new(state),
            queries: HashMap::new(),
        };
        query.start_missing();
        query
    }

    /// Replace the author list
    ///
    /// Subscriptions are started for authors that have none yet. Authors no
    /// longer in the list keep their subscription and results.
    pub fn set_authors(&mut self, authors: Vec<PublicKey>) {
        self.authors = authors;
        self.start_missing();
    }

    /// Re-render with possibly new filters and options
    ///
    /// When the enabled flag, relay URLs or filters differ by value, every
    /// subscription is closed and, if still enabled, restarted for the
    /// current authors. Results collected so far are kept.
    pub fn update(&mut self, filters: Vec<Filter>, options: EventQueryOptions) {
        let key = SubscriptionKey::new(&filters, &options);
        if key == self.key {
            return;
        }

        debug!(
            "Grouped query dependencies changed, restarting {} subscription(s)",
            self.queries.len()
        );
        self.stop_all();
        self.key = key;
        self.filters = filters;
        self.options = options;
        self.start_missing();
    }

    /// Results for every author that has received at least one event
    pub fn result(&self) -> AuthorResults {
        authors_with_events(&self.state.borrow())
    }

    /// Result for one author, if it has received any event
    pub fn result_for(&self, author: &PublicKey) -> Option<EventQueryResult> {
        self.state
            .borrow()
            .get(author)
            .filter(|result| !result.is_empty())
            .cloned()
    }

    /// Receiver notified on every state change
    ///
    /// The published map also holds authors with EOSE but no events; pass it
    /// through [`authors_with_events`] to get the same view as [`Self::result`].
    pub fn subscribe_changes(&self) -> watch::Receiver<AuthorResults> {
        self.state.subscribe()
    }

    /// Authors with a running subscription
    pub fn active_authors(&self) -> Vec<PublicKey> {
        let mut authors: Vec<PublicKey> = self.queries.keys().copied().collect();
        authors.sort();
        authors
    }

    /// Wait until every author in the current list has reached EOSE
    ///
    /// Never resolves for a disabled query with a non-empty author list.
    pub async fn wait_for_eose(&self) -> AuthorResults {
        let authors = self.authors.clone();
        let mut changes = self.state.subscribe();
        let done = changes
            .wait_for(|results| {
                authors
                    .iter()
                    .all(|author| results.get(author).is_some_and(|result| result.eose))
            })
            .await
            .is_ok();
        if !done {
            debug!("Grouped query torn down before EOSE");
        }
        self.result()
    }

    fn start_missing(&mut self) {
        if !self.options.enabled {
            return;
        }

        let relay_urls = self.options.relay_urls();
        for author in self.authors.clone() {
            // Repeated authors share the first subscription
            if self.queries.contains_key(&author) {
                continue;
            }

            let subscription = self
                .pool
                .subscribe(&relay_urls, filters_for_author(&self.filters, author));
            debug!("Opened subscription {} for author {}", subscription.id(), author);

            let state = self.state.clone();
            let active = ActiveSubscription::spawn(subscription, state, move |results, message| {
                apply_author_message(results, author, message)
            });
            self.queries.insert(author, active);
        }
    }

    fn stop_all(&mut self) {
        self.queries.clear();
    }
}

impl<P: RelayPool> Drop for EventQueryByAuthor<P> {
    fn drop(&mut self) {
        self.stop_all();
    }
}

fn apply_author_message(
    results: &mut AuthorResults,
    author: PublicKey,
    message: SubscriptionMessage,
) -> bool {
    let result = results.entry(author).or_default();
    match message {
        SubscriptionMessage::Event(event) => result.insert(event),
        SubscriptionMessage::Eose => result.mark_eose(),
    }
}
