//! Iterator trait implementations

use crate::{EventQueryResult, NostrEvent};
use std::iter::FromIterator;

/// Implement FromIterator for EventQueryResult
///
/// Collecting applies the same dedup rule as a live query: the first event
/// with a given id wins. The collected result has not seen EOSE.
///
/// # Example
///
/// ```
/// use nostr_query_core::{EventQueryResult, NostrEventBuilder};
///
/// let result: EventQueryResult = vec![
///     NostrEventBuilder::new().id("1").build(),
///     NostrEventBuilder::new().id("2").build(),
///     NostrEventBuilder::new().id("1").build(),
/// ]
/// .into_iter()
/// .collect();
///
/// assert_eq!(result.len(), 2);
/// assert!(!result.eose);
/// ```
impl FromIterator<NostrEvent> for EventQueryResult {
    fn from_iter<T: IntoIterator<Item = NostrEvent>>(iter: T) -> Self {
        let mut result = EventQueryResult::new();
        result.extend(iter);
        result
    }
}

/// Allow EventQueryResult to be extended from an iterator
impl Extend<NostrEvent> for EventQueryResult {
    fn extend<T: IntoIterator<Item = NostrEvent>>(&mut self, iter: T) {
        for event in iter {
            self.insert(event);
        }
    }
}

impl<'a> IntoIterator for &'a EventQueryResult {
    type Item = &'a NostrEvent;
    type IntoIter = indexmap::map::Values<'a, String, NostrEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.values()
    }
}
