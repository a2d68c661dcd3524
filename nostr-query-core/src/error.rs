//! Error types for nostr-query-core

use thiserror::Error;

/// Result type alias for nostr-query-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the library
///
/// Subscriptions never fail from the caller's point of view; relay problems
/// surface as an early EOSE. Errors only come from event conversion.
#[derive(Error, Debug)]
pub enum Error {
    /// JSON serialization error
    #[error("JSON parsing failed: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Conversion error, with a hint about the offending field when known
    #[error("Conversion failed: {0}")]
    Conversion(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_error_converts() {
        let err: Error = serde_json::from_str::<u16>("x").unwrap_err().into();

        assert!(matches!(err, Error::JsonParse(_)));
        assert!(err.to_string().starts_with("JSON parsing failed"));
    }

    #[test]
    fn test_conversion_message() {
        let err = Error::Conversion("missing field `id`".to_string());
        assert_eq!(err.to_string(), "Conversion failed: missing field `id`");
    }
}
