//! Display implementations for NostrEvent and EventQueryResult

use crate::{EventQueryResult, NostrEvent};
use std::fmt;

/// Display implementation that outputs pretty-printed JSON
impl fmt::Display for NostrEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string_pretty(self) {
            Ok(json) => write!(f, "{}", json),
            Err(_) => write!(f, "<invalid NostrEvent>"),
        }
    }
}

/// One-line summary: event count and EOSE state
impl fmt::Display for EventQueryResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} event{} ({})",
            self.len(),
            if self.len() == 1 { "" } else { "s" },
            if self.eose { "eose" } else { "loading" }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NostrEventBuilder;

    #[test]
    fn test_display_simple_event() {
        let event = NostrEventBuilder::new()
            .id("abc123")
            .pubkey("def456")
            .created_at(1234567890)
            .kind(1)
            .content("Hello, Nostr!")
            .sig("sig789")
            .build();

        let output = format!("{}", event);

        assert!(output.contains("\"id\""));
        assert!(output.contains("\"abc123\""));
        assert!(output.contains("\"Hello, Nostr!\""));
        assert!(output.contains("1234567890"));
        assert!(output.contains('\n'));
    }

    #[test]
    fn test_display_is_valid_json() {
        let event = NostrEventBuilder::new()
            .id("test")
            .kind(1)
            .add_tag(vec!["e", "event_id"])
            .build();

        let output = format!("{}", event);

        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["id"], "test");
        assert_eq!(parsed["kind"], 1);
        assert_eq!(parsed["tags"][0][0], "e");
    }

    #[test]
    fn test_display_query_result() {
        let mut result = EventQueryResult::new();
        assert_eq!(result.to_string(), "0 events (loading)");

        result.insert(NostrEventBuilder::new().id("a").build());
        result.mark_eose();
        assert_eq!(result.to_string(), "1 event (eose)");
    }
}
