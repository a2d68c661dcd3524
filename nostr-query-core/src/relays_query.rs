//! Relay list lookup on top of [`EventQuery`]

use crate::{
    EventQueryResult,
    pool::RelayPool,
    query::{EventQuery, EventQueryOptions},
    relays::{Relay, find_all_relays, relay_list_filter},
};
use nostr_sdk::{Filter, PublicKey};
use std::sync::Arc;

/// Relays to use and whether the lookup has finished
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelaysResult {
    pub relays: Vec<Relay>,
    pub eose: bool,
}

/// Pick relays from a relay list query result
///
/// Until EOSE the starting relays are returned. After EOSE the relays of the
/// newest relay list event win; with no such event the starting relays stay.
pub fn resolve_relays(result: &EventQueryResult, starting_relays: &[Relay]) -> RelaysResult {
    let relays = if result.eose {
        result
            .most_recent()
            .map(find_all_relays)
            .unwrap_or_else(|| starting_relays.to_vec())
    } else {
        starting_relays.to_vec()
    };

    RelaysResult {
        relays,
        eose: result.eose,
    }
}

/// Looks up the NIP-65 relay list of a set of authors
///
/// The query itself reads from `starting_relays`.
pub struct RelaysQuery<P: RelayPool> {
    query: EventQuery<P>,
    starting_relays: Vec<Relay>,
}

impl<P: RelayPool> RelaysQuery<P> {
    pub fn new(
        pool: Arc<P>,
        authors: Vec<PublicKey>,
        enabled: bool,
        starting_relays: Vec<Relay>,
    ) -> Self {
        let (filters, options) = Self::dependencies(authors, enabled, &starting_relays);
        Self {
            query: EventQuery::new(pool, filters, options),
            starting_relays,
        }
    }

    /// Re-render with new inputs; resubscribes only if they changed
    pub fn update(&mut self, authors: Vec<PublicKey>, enabled: bool, starting_relays: Vec<Relay>) {
        let (filters, options) = Self::dependencies(authors, enabled, &starting_relays);
        self.query.update(filters, options);
        self.starting_relays = starting_relays;
    }

    pub fn relays(&self) -> RelaysResult {
        resolve_relays(&self.query.result(), &self.starting_relays)
    }

    /// Wait for EOSE, then resolve
    pub async fn wait_for_eose(&self) -> RelaysResult {
        let result = self.query.wait_for_eose().await;
        resolve_relays(&result, &self.starting_relays)
    }

    /// The underlying relay list events
    pub fn query(&self) -> &EventQuery<P> {
        &self.query
    }

    fn dependencies(
        authors: Vec<PublicKey>,
        enabled: bool,
        starting_relays: &[Relay],
    ) -> (Vec<Filter>, EventQueryOptions) {
        let options = EventQueryOptions::default()
            .enabled(enabled)
            .read_from_relays(starting_relays.to_vec());
        (vec![relay_list_filter(authors)], options)
    }
}
