//! Error types for request building and delivery.

use std::time::Duration;

use thiserror::Error;

/// Errors surfaced through the typed error continuation.
#[derive(Debug, Error)]
pub enum Error {
    /// The response parser failed. Always wraps the underlying cause.
    #[error("failed to parse response: {message}")]
    Parse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Transport-level failure reported by the executor, passed through
    /// unmodified.
    #[error("network error: {0}")]
    Http(String),

    /// The server answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Credential or header retrieval failed. Never raised by the builder
    /// itself; the slot exists so an executor with auth-token injection can
    /// use the same error channel.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Invalid header name/value or otherwise unusable request configuration.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A single attempt exceeded its deadline.
    #[error("request timed out after {elapsed:?}")]
    Timeout { elapsed: Duration },
}

impl Error {
    /// Wrap an arbitrary parser failure as a typed parse error.
    pub fn parse(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Parse {
            message: source.to_string(),
            source: Some(Box::new(source)),
        }
    }

    /// Parse error with a message only, for parsers without a source error.
    pub fn parse_message(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
            source: None,
        }
    }

    /// Whether an executor may transparently retry after this error.
    ///
    /// Transport failures, timeouts and 429/5xx responses are transient;
    /// parse, auth and other client-side errors are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(_) | Self::Timeout { .. } => true,
            Self::Api { status, .. } => *status == 429 || *status >= 500,
            Self::Parse { .. } | Self::Auth(_) | Self::Configuration(_) => false,
        }
    }
}
