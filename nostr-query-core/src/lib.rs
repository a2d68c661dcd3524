//! Nostr Query Core Library
//!
//! This library turns the asynchronous, multi-relay, possibly duplicated and
//! unordered event stream of a Nostr relay pool into observable view state:
//! deduplicated by id, kept in arrival order, with end-of-stored-events
//! (EOSE) tracking and a mount/update/unmount lifecycle.
//!
//! Relay connections, framing and signature checks stay with the relay pool
//! (`nostr-sdk`); this crate only synchronizes state.
//!
//! # Features
//!
//! - [`EventQuery`]: one subscription, one deduplicated result
//! - [`EventQueryByAuthor`]: one subscription per author, results grouped by author
//! - [`RelaysQuery`]: NIP-65 relay list lookup with fallback relays
//! - Tag helpers ([`find_tag`], [`find_all_tags`]) and relay list parsing
//! - Timestamp ordering and replaceable-event selection
//! - [`RelayPool`] seam with an adapter for `nostr_sdk::Client`
//!
//! # Examples
//!
//! ## Working with results
//!
//! ```
//! use nostr_query_core::{EventQueryResult, NostrEventBuilder};
//!
//! let mut result = EventQueryResult::new();
//! result.insert(NostrEventBuilder::new().id("b").created_at(20).build());
//! result.insert(NostrEventBuilder::new().id("a").created_at(10).build());
//! result.insert(NostrEventBuilder::new().id("b").created_at(20).build());
//!
//! assert_eq!(result.len(), 2);
//! assert_eq!(result.sorted()[0].id, "a");
//! assert_eq!(result.most_recent().unwrap().id, "b");
//! ```
//!
//! ## Querying relays
//!
//! ```no_run
//! use nostr_query_core::{ClientPool, EventQuery, EventQueryOptions, Relay};
//! use nostr_sdk::{Client, Filter, Kind};
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Client::default();
//! client.add_relay("wss://relay.damus.io").await?;
//! client.connect().await;
//!
//! let options = EventQueryOptions::default()
//!     .read_from_relays(vec![Relay::read_write("wss://relay.damus.io")]);
//! let query = EventQuery::new(
//!     Arc::new(ClientPool::new(client)),
//!     vec![Filter::new().kind(Kind::TextNote).limit(10)],
//!     options,
//! );
//!
//! for event in query.wait_for_eose().await.sorted_descending() {
//!     println!("{}", event.content);
//! }
//! # Ok(())
//! # }
//! ```

// Public modules
pub mod builder;
pub mod conversion;
pub mod display;
pub mod error;
pub mod event;
pub mod grouped;
pub mod iter;
pub mod pool;
pub mod query;
pub mod relays;
pub mod relays_query;
pub mod result;
pub mod sort;
pub mod tags;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

// Re-export commonly used types and functions
pub use builder::NostrEventBuilder;
pub use conversion::{event_to_json, json_to_event};
pub use error::{Error, Result};
pub use event::NostrEvent;
pub use grouped::{AuthorResults, EventQueryByAuthor, authors_with_events, filters_for_author};
pub use pool::{ClientPool, EoseTracker, PoolSubscription, RelayPool, SubscriptionMessage};
pub use query::{EventQuery, EventQueryOptions};
pub use relays::{
    KIND_RELAY_METADATA, Relay, find_all_relays, read_relays, relay_list_filter, relay_urls,
    write_relays,
};
pub use relays_query::{RelaysQuery, RelaysResult, resolve_relays};
pub use result::EventQueryResult;
pub use sort::{most_recent_replaceable_event, sort_events, sort_events_descending};
pub use tags::{find_all_tags, find_tag};
