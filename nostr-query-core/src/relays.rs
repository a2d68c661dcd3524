//! Relay descriptors and NIP-65 relay list parsing

use crate::{NostrEvent, tags::find_all_tags};
use nostr_sdk::{Filter, Kind, PublicKey};
use serde::{Deserialize, Serialize};

/// Kind of the replaceable event carrying an author's relay list (NIP-65)
pub const KIND_RELAY_METADATA: u16 = 10002;

/// A relay URL and what it is used for
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Relay {
    pub url: String,
    #[serde(default = "default_true")]
    pub read: bool,
    #[serde(default = "default_true")]
    pub write: bool,
}

fn default_true() -> bool {
    true
}

impl Relay {
    pub fn new(url: impl Into<String>, read: bool, write: bool) -> Self {
        Self {
            url: url.into(),
            read,
            write,
        }
    }

    /// A relay used for both reading and writing
    pub fn read_write(url: impl Into<String>) -> Self {
        Self::new(url, true, true)
    }
}

/// URLs of the given relays, in order
pub fn relay_urls(relays: &[Relay]) -> Vec<String> {
    relays.iter().map(|relay| relay.url.clone()).collect()
}

/// Only the relays marked for reading
pub fn read_relays(relays: &[Relay]) -> Vec<Relay> {
    relays.iter().filter(|relay| relay.read).cloned().collect()
}

/// Only the relays marked for writing
pub fn write_relays(relays: &[Relay]) -> Vec<Relay> {
    relays.iter().filter(|relay| relay.write).cloned().collect()
}

/// Parse the `r` tags of a relay list event
///
/// A tag carrying only the URL means read and write. Otherwise the relay is
/// readable if the second or third element is `"read"` and writable if the
/// second or third element is `"write"`.
///
/// # Example
///
/// ```
/// use nostr_query_core::{NostrEventBuilder, Relay, find_all_relays};
///
/// let event = NostrEventBuilder::new()
///     .kind(10002)
///     .add_tag(vec!["r", "wss://both.example"])
///     .add_tag(vec!["r", "wss://inbox.example", "read"])
///     .build();
///
/// assert_eq!(
///     find_all_relays(&event),
///     vec![
///         Relay::new("wss://both.example", true, true),
///         Relay::new("wss://inbox.example", true, false),
///     ]
/// );
/// ```
pub fn find_all_relays(event: &NostrEvent) -> Vec<Relay> {
    let Some(relay_tags) = find_all_tags(event, "r") else {
        return Vec::new();
    };

    relay_tags
        .into_iter()
        .filter_map(|mut values| {
            if values.is_empty() {
                return None;
            }
            let markers = values.split_off(1);
            let url = values.remove(0);
            if markers.is_empty() {
                return Some(Relay::read_write(url));
            }
            let marked = |marker: &str| markers.iter().take(2).any(|m| m == marker);
            Some(Relay::new(url, marked("read"), marked("write")))
        })
        .collect()
}

/// Filter for the relay lists of the given authors
pub fn relay_list_filter<I>(authors: I) -> Filter
where
    I: IntoIterator<Item = PublicKey>,
{
    Filter::new()
        .kind(Kind::from(KIND_RELAY_METADATA))
        .authors(authors)
}
