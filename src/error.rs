//! Crate-level error types.
//!
//! [`LookoutError`] unifies every error source (configuration, WebSocket,
//! JSON, terminal I/O) behind a single enum so callers can match on the
//! variant they care about while still using the `?` operator for easy
//! propagation.
//!
//! [`RequestError`] is the narrower taxonomy of a single classification
//! request. Its variants never escape the search orchestrator as errors:
//! they collapse to "no result" or to a silent no-op.

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, LookoutError>;

/// Top-level error type returned by all public APIs.
#[derive(Debug, thiserror::Error)]
pub enum LookoutError {
    /// A configuration value was missing or malformed.
    #[error("configuration error: {0}")]
    Config(String),

    /// A WebSocket operation (connect, send, receive) failed.
    #[error("websocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    /// JSON serialization or deserialization failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Terminal or file I/O failed.
    #[error("io error: {0}")]
    Io(String),

    /// The backend rejected a call or the connection dropped mid-call.
    #[error("transport error: {0}")]
    Transport(String),

    /// A collaborator handle was not available at call time.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(&'static str),
}

/// Why a classification request produced no intent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestError {
    /// The request text was empty; the backend was never contacted.
    #[error("request text is empty")]
    EmptyRequest,

    /// No response arrived within the request timeout.
    #[error("request timed out")]
    RequestTimeout,

    /// A newer request replaced this one before it completed.
    #[error("request superseded by a newer request")]
    RequestSuperseded,

    /// The backend or connection failed.
    #[error("transport failure: {0}")]
    TransportFailure(String),

    /// The collaborator needed for the call was not initialized.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(&'static str),
}

impl RequestError {
    /// Returns `true` for outcomes that are part of normal operation and
    /// must not be logged as failures.
    pub fn is_silent(&self) -> bool {
        matches!(self, Self::EmptyRequest | Self::RequestSuperseded)
    }
}

impl From<LookoutError> for RequestError {
    fn from(err: LookoutError) -> Self {
        match err {
            LookoutError::ServiceUnavailable(name) => Self::ServiceUnavailable(name),
            other => Self::TransportFailure(other.to_string()),
        }
    }
}
