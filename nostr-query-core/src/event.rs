//! The event record held by query state

use serde::{Deserialize, Serialize};

/// A Nostr event as delivered by a relay subscription
///
/// Field names and JSON layout follow NIP-01, so a `NostrEvent` serializes to
/// the same object a relay sends on the wire.
///
/// # Example
///
/// ```
/// use nostr_query_core::{NostrEvent, NostrEventBuilder};
///
/// let event = NostrEventBuilder::new()
///     .id("abc123")
///     .pubkey("def456")
///     .created_at(1234567890)
///     .kind(1)
///     .content("Hello!")
///     .sig("sig789")
///     .build();
///
/// let json = serde_json::to_string(&event).unwrap();
/// let deserialized: NostrEvent = serde_json::from_str(&json).unwrap();
/// assert_eq!(event, deserialized);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NostrEvent {
    pub id: String,
    pub pubkey: String,
    pub created_at: u64,
    pub kind: u16,
    pub tags: Vec<Vec<String>>,
    pub content: String,
    pub sig: String,
}

impl NostrEvent {
    /// Whether this is a replaceable event kind (NIP-01: 0, 3, 10000..20000)
    pub fn is_replaceable(&self) -> bool {
        self.kind == 0 || self.kind == 3 || (10_000..20_000).contains(&self.kind)
    }
}
