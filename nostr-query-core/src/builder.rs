//! Builder pattern for NostrEvent construction

use crate::NostrEvent;

/// Fluent builder for constructing NostrEvent instances
///
/// # Example
///
/// ```
/// use nostr_query_core::NostrEventBuilder;
///
/// let event = NostrEventBuilder::new()
///     .id("abc123")
///     .pubkey("def456")
///     .created_at(1234567890)
///     .kind(10002)
///     .add_tag(vec!["r", "wss://relay.example.com"])
///     .add_tag(vec!["r", "wss://inbox.example.com", "read"])
///     .sig("sig789")
///     .build();
///
/// assert_eq!(event.id, "abc123");
/// assert_eq!(event.tags.len(), 2);
/// ```
pub struct NostrEventBuilder {
    id: String,
    pubkey: String,
    created_at: u64,
    kind: u16,
    tags: Vec<Vec<String>>,
    content: String,
    sig: String,
}

impl NostrEventBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self {
            id: String::new(),
            pubkey: String::new(),
            created_at: 0,
            kind: 0,
            tags: Vec::new(),
            content: String::new(),
            sig: String::new(),
        }
    }

    /// Set the event ID
    pub fn id<S: Into<String>>(mut self, id: S) -> Self {
        self.id = id.into();
        self
    }

    /// Set the author's public key
    pub fn pubkey<S: Into<String>>(mut self, pubkey: S) -> Self {
        self.pubkey = pubkey.into();
        self
    }

    /// Set the creation timestamp (unix seconds)
    pub fn created_at(mut self, timestamp: u64) -> Self {
        self.created_at = timestamp;
        self
    }

    pub fn kind(mut self, kind: u16) -> Self {
        self.kind = kind;
        self
    }

    pub fn content<S: Into<String>>(mut self, content: S) -> Self {
        self.content = content.into();
        self
    }

    pub fn sig<S: Into<String>>(mut self, sig: S) -> Self {
        self.sig = sig.into();
        self
    }

    /// Add a single tag
    ///
    /// The first value is the tag name, the rest are its values.
    pub fn add_tag<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.push(values.into_iter().map(|s| s.into()).collect());
        self
    }

    /// Replace all tags at once
    pub fn tags(mut self, tags: Vec<Vec<String>>) -> Self {
        self.tags = tags;
        self
    }

    /// Build the NostrEvent
    pub fn build(self) -> NostrEvent {
        NostrEvent {
            id: self.id,
            pubkey: self.pubkey,
            created_at: self.created_at,
            kind: self.kind,
            tags: self.tags,
            content: self.content,
            sig: self.sig,
        }
    }
}

impl Default for NostrEventBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_basic() {
        let event = NostrEventBuilder::new()
            .id("test_id")
            .pubkey("test_pubkey")
            .created_at(1234567890)
            .kind(1)
            .content("Hello!")
            .sig("test_sig")
            .build();

        assert_eq!(event.id, "test_id");
        assert_eq!(event.pubkey, "test_pubkey");
        assert_eq!(event.created_at, 1234567890);
        assert_eq!(event.kind, 1);
        assert_eq!(event.content, "Hello!");
        assert_eq!(event.sig, "test_sig");
        assert!(event.tags.is_empty());
    }

    #[test]
    fn test_builder_with_tags() {
        let event = NostrEventBuilder::new()
            .id("test")
            .add_tag(vec!["e", "event_id"])
            .add_tag(vec!["p", "pubkey_id", "relay_url"])
            .add_tag(vec!["t", "nostr"])
            .build();

        assert_eq!(event.tags.len(), 3);
        assert_eq!(event.tags[0], vec!["e", "event_id"]);
        assert_eq!(event.tags[1], vec!["p", "pubkey_id", "relay_url"]);
        assert_eq!(event.tags[2], vec!["t", "nostr"]);
    }

    #[test]
    fn test_builder_default() {
        let event = NostrEventBuilder::default().build();

        assert_eq!(event.id, "");
        assert_eq!(event.created_at, 0);
        assert_eq!(event.kind, 0);
        assert!(event.tags.is_empty());
    }

    #[test]
    fn test_builder_replace_tags() {
        let event = NostrEventBuilder::new()
            .add_tag(vec!["a"])
            .tags(vec![vec!["r".to_string(), "wss://r.example".to_string()]])
            .build();

        assert_eq!(event.tags, vec![vec!["r", "wss://r.example"]]);
    }
}
