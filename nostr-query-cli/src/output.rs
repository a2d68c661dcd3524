use anyhow::Result;
use chrono::DateTime;
use clap::ValueEnum;
use nostr_query_core::{NostrEvent, Relay, event_to_json};

/// How events are written to stdout
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One JSON object per line
    Json,
    /// Timestamp, author and content, one event per line
    Text,
}

/// Order in which a finished result is printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortOrder {
    /// Newest first
    Newest,
    /// Oldest first
    Oldest,
    /// As received from the relays
    Arrival,
}

pub fn format_timestamp(created_at: u64) -> String {
    i64::try_from(created_at)
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| created_at.to_string())
}

/// Shorten a hex key for display: first 8 characters
pub fn short_key(key: &str) -> &str {
    key.get(..8).unwrap_or(key)
}

pub fn format_event(event: &NostrEvent, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(event_to_json(event)?),
        OutputFormat::Text => {
            let content = event.content.replace('\n', " ");
            Ok(format!(
                "{}  {}  kind:{}  {}",
                format_timestamp(event.created_at),
                short_key(&event.pubkey),
                event.kind,
                content
            ))
        }
    }
}

pub fn format_relay(relay: &Relay) -> String {
    let mode = match (relay.read, relay.write) {
        (true, true) => "read+write",
        (true, false) => "read",
        (false, true) => "write",
        (false, false) => "-",
    };
    format!("{}\t{}", relay.url, mode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nostr_query_core::NostrEventBuilder;

    fn sample() -> NostrEvent {
        NostrEventBuilder::new()
            .id("abc")
            .pubkey("0123456789abcdef")
            .created_at(0)
            .kind(1)
            .content("line one\nline two")
            .sig("sig")
            .build()
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(0), "1970-01-01 00:00:00 UTC");
        assert_eq!(format_timestamp(1_700_000_000), "2023-11-14 22:13:20 UTC");
    }

    #[test]
    fn test_format_event_text() {
        let line = format_event(&sample(), OutputFormat::Text).unwrap();
        assert_eq!(line, "1970-01-01 00:00:00 UTC  01234567  kind:1  line one line two");
    }

    #[test]
    fn test_format_event_json_is_single_line() {
        let line = format_event(&sample(), OutputFormat::Json).unwrap();

        assert!(!line.contains('\n'));
        let parsed: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed["id"], "abc");
    }

    #[test]
    fn test_short_key() {
        assert_eq!(short_key("abc"), "abc");
        assert_eq!(short_key("0123456789"), "01234567");
    }

    #[test]
    fn test_format_relay() {
        assert_eq!(format_relay(&Relay::read_write("wss://a")), "wss://a\tread+write");
        assert_eq!(format_relay(&Relay::new("wss://b", true, false)), "wss://b\tread");
        assert_eq!(format_relay(&Relay::new("wss://c", false, true)), "wss://c\twrite");
    }
}
