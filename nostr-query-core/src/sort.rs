//! Timestamp ordering and replaceable-event selection
//!
//! Relays deliver events in no particular order. These helpers order them by
//! `created_at`, breaking ties by position in the input so that the result is
//! deterministic for a given arrival order.

use crate::NostrEvent;

/// Sort events oldest first
///
/// Events sharing a timestamp keep their input order.
pub fn sort_events<I>(events: I) -> Vec<NostrEvent>
where
    I: IntoIterator<Item = NostrEvent>,
{
    let mut sorted: Vec<NostrEvent> = events.into_iter().collect();
    // Vec::sort_by_key is stable
    sorted.sort_by_key(|event| event.created_at);
    sorted
}

/// Sort events newest first
///
/// Events sharing a timestamp appear in reverse input order, so the last one
/// to arrive comes first.
pub fn sort_events_descending<I>(events: I) -> Vec<NostrEvent>
where
    I: IntoIterator<Item = NostrEvent>,
{
    let mut sorted = sort_events(events);
    sorted.reverse();
    sorted
}

/// Pick the current version of a replaceable event
///
/// This is the newest event; among events with the same timestamp, the one
/// that arrived last wins. Returns `None` for an empty input.
///
/// # Example
///
/// ```
/// use nostr_query_core::{NostrEventBuilder, most_recent_replaceable_event};
///
/// let events = vec![
///     NostrEventBuilder::new().id("old").created_at(100).build(),
///     NostrEventBuilder::new().id("new").created_at(200).build(),
///     NostrEventBuilder::new().id("older").created_at(50).build(),
/// ];
///
/// let newest = most_recent_replaceable_event(&events).unwrap();
/// assert_eq!(newest.id, "new");
/// ```
pub fn most_recent_replaceable_event<'a, I>(events: I) -> Option<&'a NostrEvent>
where
    I: IntoIterator<Item = &'a NostrEvent>,
{
    // max_by_key returns the last maximum
    events.into_iter().max_by_key(|event| event.created_at)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NostrEventBuilder;

    fn event(id: &str, created_at: u64) -> NostrEvent {
        NostrEventBuilder::new().id(id).created_at(created_at).build()
    }

    fn ids(events: &[NostrEvent]) -> Vec<&str> {
        events.iter().map(|e| e.id.as_str()).collect()
    }

    #[test]
    fn test_sort_events_ascending() {
        let sorted = sort_events(vec![event("c", 30), event("a", 10), event("b", 20)]);
        assert_eq!(ids(&sorted), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_sort_events_ties_keep_arrival_order() {
        let input: Vec<NostrEvent> = (0..12).map(|i| event(&format!("e{}", i), 5)).collect();
        let sorted = sort_events(input.clone());

        assert_eq!(sorted, input);
    }

    #[test]
    fn test_sort_events_descending() {
        let sorted = sort_events_descending(vec![event("a", 10), event("c", 30), event("b", 20)]);
        assert_eq!(ids(&sorted), vec!["c", "b", "a"]);
    }

    #[test]
    fn test_sort_events_descending_ties_latest_first() {
        let sorted =
            sort_events_descending(vec![event("first", 7), event("x", 1), event("second", 7)]);
        assert_eq!(ids(&sorted), vec!["second", "first", "x"]);
    }

    #[test]
    fn test_sort_empty() {
        assert!(sort_events(Vec::new()).is_empty());
        assert!(sort_events_descending(Vec::new()).is_empty());
    }

    #[test]
    fn test_most_recent_replaceable_event() {
        let events = vec![event("a", 1), event("b", 3), event("c", 2)];
        assert_eq!(most_recent_replaceable_event(&events).unwrap().id, "b");
    }

    #[test]
    fn test_most_recent_replaceable_event_tie_prefers_latest_arrival() {
        let events = vec![event("early", 9), event("late", 9)];
        assert_eq!(most_recent_replaceable_event(&events).unwrap().id, "late");
    }

    #[test]
    fn test_most_recent_replaceable_event_empty() {
        let events: Vec<NostrEvent> = Vec::new();
        assert!(most_recent_replaceable_event(&events).is_none());
    }
}
