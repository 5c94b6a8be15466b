//! Error types for the ichiba realtime client.
//!
//! Transport-level failures never escape as panics: inside the connection
//! task they become state transitions (retry or `Failed`), and only
//! `open` and the REST collaborator return errors directly. Retry
//! exhaustion is surfaced through the connection state
//! (`ConnectionState::Failed`), not as a returned error.

use thiserror::Error;

/// Client-facing errors
#[derive(Debug, Error)]
pub enum ClientError {
    /// A bearer token or user identity is missing or empty; no
    /// connection attempt is made
    #[error("missing credential: realtime requires a bearer token and a user identity")]
    MissingCredential,

    /// The realtime connection is switched off by configuration
    #[error("realtime connection is disabled by configuration")]
    RealtimeDisabled,

    /// The connection attempt did not complete within the handshake window
    #[error("handshake timed out")]
    HandshakeTimeout,

    /// Transport-level failure (abnormal close, network error)
    #[error("transport error: {0}")]
    Transport(String),

    /// A REST request failed at the HTTP layer
    #[error("api request failed: {0}")]
    Api(#[from] reqwest::Error),

    /// A REST request completed with a non-success status
    #[error("api request failed with status {status}")]
    ApiStatus { status: u16 },
}
