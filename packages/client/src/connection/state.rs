//! Connection lifecycle states.
//!
//! This module contains the state vocabulary and pure predicates over it;
//! the transitions themselves are driven by the connection task.

use std::fmt;

/// Lifecycle state of one realtime connection.
///
/// `Closed` is reached by a manual `close` or a normal server closure and
/// is terminal. Any other closure routes back through `Connecting` after
/// a backoff delay until the retry bound is hit, at which point the
/// connection parks in `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Not yet started
    Idle,
    /// Transport connection in progress
    Connecting,
    /// Transport open, auth handshake sent, waiting for first frame
    Authenticating,
    /// Authenticated and processing traffic
    Ready,
    /// Manual shutdown in progress
    Closing,
    /// Terminal: closed on purpose, no reconnect will follow
    Closed,
    /// Terminal for this handle: recovery requires a fresh `open`
    Failed(ConnectionFailure),
}

/// Why a connection gave up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionFailure {
    /// Every allowed reconnect attempt failed without reaching `Ready`
    MaxRetriesExceeded,
}

impl ConnectionState {
    /// Whether outbound envelopes are accepted in this state
    pub fn can_send(&self) -> bool {
        matches!(self, ConnectionState::Ready)
    }

    /// Whether the connection will make no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, ConnectionState::Closed | ConnectionState::Failed(_))
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Idle => write!(f, "idle"),
            ConnectionState::Connecting => write!(f, "connecting"),
            ConnectionState::Authenticating => write!(f, "authenticating"),
            ConnectionState::Ready => write!(f, "ready"),
            ConnectionState::Closing => write!(f, "closing"),
            ConnectionState::Closed => write!(f, "closed"),
            ConnectionState::Failed(ConnectionFailure::MaxRetriesExceeded) => {
                write!(f, "failed (max retries exceeded)")
            }
        }
    }
}
