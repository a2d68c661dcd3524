use anyhow::{Context, Result};
use clap::Args;
use nostr_sdk::{Filter, Kind, PublicKey, Timestamp};

/// Filter flags shared by the query subcommands
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Event kind to match (repeatable)
    #[arg(short, long = "kind", value_name = "KIND")]
    pub kinds: Vec<u16>,

    /// Maximum number of stored events each relay should return
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Only events created at or after this unix timestamp
    #[arg(long, value_name = "UNIX_SECS")]
    pub since: Option<u64>,

    /// Only events created at or before this unix timestamp
    #[arg(long, value_name = "UNIX_SECS")]
    pub until: Option<u64>,
}

impl FilterArgs {
    /// Build a filter without an author restriction
    pub fn to_filter(&self) -> Result<Filter> {
        if let (Some(since), Some(until)) = (self.since, self.until)
            && since > until
        {
            anyhow::bail!("--since ({}) is after --until ({})", since, until);
        }

        let mut filter = Filter::new();
        if !self.kinds.is_empty() {
            filter = filter.kinds(self.kinds.iter().map(|kind| Kind::from(*kind)));
        }
        if let Some(limit) = self.limit {
            filter = filter.limit(limit);
        }
        if let Some(since) = self.since {
            filter = filter.since(Timestamp::from(since));
        }
        if let Some(until) = self.until {
            filter = filter.until(Timestamp::from(until));
        }
        Ok(filter)
    }
}

/// Parse public keys given as hex or npub
pub fn parse_authors(authors: &[String]) -> Result<Vec<PublicKey>> {
    authors
        .iter()
        .map(|author| {
            PublicKey::parse(author).with_context(|| format!("Invalid public key: {}", author))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use nostr_sdk::Keys;

    #[test]
    fn test_empty_args_match_everything() {
        let filter = FilterArgs::default().to_filter().unwrap();
        let json = serde_json::to_value(&filter).unwrap();

        assert_eq!(json, serde_json::json!({}));
    }

    #[test]
    fn test_filter_fields() {
        let args = FilterArgs {
            kinds: vec![1, 6],
            limit: Some(25),
            since: Some(100),
            until: Some(200),
        };
        let json = serde_json::to_value(args.to_filter().unwrap()).unwrap();

        assert_eq!(json["kinds"], serde_json::json!([1, 6]));
        assert_eq!(json["limit"], 25);
        assert_eq!(json["since"], 100);
        assert_eq!(json["until"], 200);
    }

    #[test]
    fn test_since_after_until_rejected() {
        let args = FilterArgs {
            since: Some(300),
            until: Some(200),
            ..FilterArgs::default()
        };
        assert!(args.to_filter().is_err());
    }

    #[test]
    fn test_parse_authors_hex() {
        let key = Keys::generate().public_key();
        let parsed = parse_authors(&[key.to_hex()]).unwrap();

        assert_eq!(parsed, vec![key]);
    }

    #[test]
    fn test_parse_authors_invalid() {
        let err = parse_authors(&["not-a-key".to_string()]).unwrap_err();
        assert!(err.to_string().contains("Invalid public key"));
    }
}
