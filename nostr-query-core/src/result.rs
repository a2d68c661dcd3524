//! Query state: arrival-ordered, deduplicated events plus the EOSE flag

use crate::{NostrEvent, sort};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// The state a query publishes to its readers
///
/// Events are keyed by id and iterate in arrival order. The first event to
/// arrive with a given id wins; later copies from other relays are ignored.
/// `eose` turns true once the relay pool signals the end of stored events and
/// never turns back.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventQueryResult {
    pub events: IndexMap<String, NostrEvent>,
    pub eose: bool,
}

impl EventQueryResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an event unless its id is already present
    ///
    /// Returns `true` if the state changed.
    pub fn insert(&mut self, event: NostrEvent) -> bool {
        if self.events.contains_key(&event.id) {
            return false;
        }
        self.events.insert(event.id.clone(), event);
        true
    }

    /// Record the end of stored events
    ///
    /// Returns `true` only on the first call.
    pub fn mark_eose(&mut self) -> bool {
        if self.eose {
            return false;
        }
        self.eose = true;
        true
    }

    pub fn get(&self, id: &str) -> Option<&NostrEvent> {
        self.events.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.events.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Events in arrival order
    pub fn iter(&self) -> impl Iterator<Item = &NostrEvent> {
        self.events.values()
    }

    /// Events oldest first, ties in arrival order
    pub fn sorted(&self) -> Vec<NostrEvent> {
        sort::sort_events(self.events.values().cloned())
    }

    /// Events newest first, ties latest arrival first
    pub fn sorted_descending(&self) -> Vec<NostrEvent> {
        sort::sort_events_descending(self.events.values().cloned())
    }

    /// The current version of a replaceable event in this result
    pub fn most_recent(&self) -> Option<&NostrEvent> {
        sort::most_recent_replaceable_event(self.events.values())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NostrEventBuilder;

    fn event(id: &str, created_at: u64, content: &str) -> NostrEvent {
        NostrEventBuilder::new()
            .id(id)
            .created_at(created_at)
            .content(content)
            .build()
    }

    #[test]
    fn test_insert_dedups_by_id() {
        let mut result = EventQueryResult::new();

        assert!(result.insert(event("a", 1, "first copy")));
        assert!(!result.insert(event("a", 1, "second copy")));

        assert_eq!(result.len(), 1);
        assert_eq!(result.get("a").unwrap().content, "first copy");
    }

    #[test]
    fn test_insertion_order_is_arrival_order() {
        let mut result = EventQueryResult::new();
        result.insert(event("z", 30, ""));
        result.insert(event("a", 10, ""));
        result.insert(event("m", 20, ""));

        let ids: Vec<&str> = result.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["z", "a", "m"]);
    }

    #[test]
    fn test_mark_eose_is_monotonic() {
        let mut result = EventQueryResult::new();

        assert!(!result.eose);
        assert!(result.mark_eose());
        assert!(!result.mark_eose());
        assert!(result.eose);
    }

    #[test]
    fn test_sorted_views() {
        let mut result = EventQueryResult::new();
        result.insert(event("b", 20, ""));
        result.insert(event("a", 10, ""));
        result.insert(event("c", 20, ""));

        let asc: Vec<String> = result.sorted().into_iter().map(|e| e.id).collect();
        let desc: Vec<String> = result.sorted_descending().into_iter().map(|e| e.id).collect();

        assert_eq!(asc, vec!["a", "b", "c"]);
        assert_eq!(desc, vec!["c", "b", "a"]);
        assert_eq!(result.most_recent().unwrap().id, "c");
    }

    #[test]
    fn test_empty_result() {
        let result = EventQueryResult::new();

        assert!(result.is_empty());
        assert!(!result.contains("a"));
        assert!(result.most_recent().is_none());
    }
}
