//! Domain errors

use std::path::PathBuf;

use thiserror::Error;

use super::events::EventKind;

/// Errors raised at the broker boundary when an event arrives with a
/// kind or payload that only becomes known at runtime.
#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("Unknown event kind '{kind}'")]
    UnknownKind { kind: String },

    #[error("Invalid payload for {kind}: {source}")]
    InvalidPayload {
        kind: EventKind,
        #[source]
        source: serde_json::Error,
    },
}

impl BrokerError {
    /// Short stable label (snake_case) for logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            BrokerError::UnknownKind { .. } => "unknown_kind",
            BrokerError::InvalidPayload { .. } => "invalid_payload",
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Result type for broker-boundary operations
pub type BrokerResult<T> = Result<T, BrokerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_kind_message_names_the_kind() {
        let err = BrokerError::UnknownKind {
            kind: "order.exploded".to_string(),
        };
        assert_eq!(err.to_string(), "Unknown event kind 'order.exploded'");
        assert_eq!(err.as_label(), "unknown_kind");
    }

    #[test]
    fn invalid_payload_keeps_source() {
        let source = serde_json::from_str::<u32>("\"nope\"").unwrap_err();
        let err = BrokerError::InvalidPayload {
            kind: EventKind::OrderCreated,
            source,
        };
        assert!(err.to_string().starts_with("Invalid payload for order.created"));
        assert!(std::error::Error::source(&err).is_some());
        assert_eq!(err.as_label(), "invalid_payload");
    }
}
