//! Tag lookup helpers

use crate::NostrEvent;

/// Find every tag named `tag` and return its values (the name stripped)
///
/// Returns `None` when the event carries no such tag, never an empty vector.
///
/// # Example
///
/// ```
/// use nostr_query_core::{NostrEventBuilder, find_all_tags};
///
/// let event = NostrEventBuilder::new()
///     .add_tag(vec!["p", "alice"])
///     .add_tag(vec!["e", "note1"])
///     .add_tag(vec!["p", "bob", "wss://relay.example.com"])
///     .build();
///
/// let p_tags = find_all_tags(&event, "p").unwrap();
/// assert_eq!(p_tags, vec![vec!["alice"], vec!["bob", "wss://relay.example.com"]]);
/// assert!(find_all_tags(&event, "t").is_none());
/// ```
pub fn find_all_tags(event: &NostrEvent, tag: &str) -> Option<Vec<Vec<String>>> {
    let found: Vec<Vec<String>> = event
        .tags
        .iter()
        .filter(|values| values.first().is_some_and(|name| name == tag))
        .map(|values| values[1..].to_vec())
        .collect();

    if found.is_empty() { None } else { Some(found) }
}

/// First value of the first tag named `tag`
///
/// Returns `None` if no tag matches or the first match carries no value.
pub fn find_tag<'a>(event: &'a NostrEvent, tag: &str) -> Option<&'a str> {
    event
        .tags
        .iter()
        .find(|values| values.first().is_some_and(|name| name == tag))
        .and_then(|values| values.get(1))
        .map(String::as_str)
}
