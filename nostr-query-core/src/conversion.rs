//! Conversion between nostr-sdk events, JSON and NostrEvent
//!
//! Relay pools hand us `nostr_sdk::Event` values; query state stores the
//! plain `NostrEvent` record so that it can be cloned, compared and
//! serialized without touching any cryptographic types.

use crate::{
    NostrEvent,
    error::{Error, Result},
};

// ============================================================================
// From/TryFrom Trait Implementations
// ============================================================================

/// Convert from a nostr-sdk Event to a NostrEvent (infallible)
impl From<nostr_sdk::Event> for NostrEvent {
    fn from(nostr_event: nostr_sdk::Event) -> Self {
        NostrEvent::from(&nostr_event)
    }
}

impl From<&nostr_sdk::Event> for NostrEvent {
    fn from(nostr_event: &nostr_sdk::Event) -> Self {
        NostrEvent {
            id: nostr_event.id.to_hex(),
            pubkey: nostr_event.pubkey.to_string(),
            created_at: nostr_event.created_at.as_u64(),
            kind: nostr_event.kind.as_u16(),
            tags: nostr_event
                .tags
                .iter()
                .map(|tag| tag.as_vec().iter().map(|s| s.to_string()).collect())
                .collect(),
            content: nostr_event.content.clone(),
            sig: nostr_event.sig.to_string(),
        }
    }
}

/// Convert from a JSON string slice to a NostrEvent (fallible)
///
/// No id or signature verification is performed; that is the relay pool's job.
///
/// # Example
///
/// ```
/// use nostr_query_core::NostrEvent;
/// use std::convert::TryFrom;
///
/// let json = r#"{"id":"abc","pubkey":"def","created_at":1234567890,"kind":1,"tags":[],"content":"Hello","sig":"123"}"#;
/// let event = NostrEvent::try_from(json)?;
/// assert_eq!(event.content, "Hello");
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
impl TryFrom<&str> for NostrEvent {
    type Error = Error;

    fn try_from(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| {
            let msg = e.to_string();
            let hint = if msg.contains("missing field") {
                " (required Nostr event fields: id, pubkey, created_at, kind, tags, content, sig)"
            } else if msg.contains("invalid type") && msg.contains("sequence") {
                " (hint: tags must be an array of string arrays)"
            } else if msg.contains("invalid value") && msg.contains("u16") {
                " (hint: kind must fit in 0-65535)"
            } else {
                ""
            };

            Error::Conversion(format!("{}{}", msg, hint))
        })
    }
}

/// Convert from an owned JSON string to a NostrEvent (fallible)
impl TryFrom<String> for NostrEvent {
    type Error = Error;

    fn try_from(json: String) -> Result<Self> {
        NostrEvent::try_from(json.as_str())
    }
}

/// Convert from a NostrEvent reference to a compact JSON string (fallible)
impl TryFrom<&NostrEvent> for String {
    type Error = Error;

    fn try_from(event: &NostrEvent) -> Result<Self> {
        Ok(serde_json::to_string(event)?)
    }
}

// ============================================================================
// Convenience Functions (for ergonomics)
// ============================================================================

/// Parse a JSON string into a NostrEvent
///
/// This is a convenience wrapper around `NostrEvent::try_from()`.
pub fn json_to_event(json: &str) -> Result<NostrEvent> {
    NostrEvent::try_from(json)
}

/// Serialize a NostrEvent into a compact JSON string
///
/// This is a convenience wrapper around `String::try_from()`.
pub fn event_to_json(event: &NostrEvent) -> Result<String> {
    String::try_from(event)
}
