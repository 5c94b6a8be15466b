//! Endpoint construction for the two realtime streams.

use std::fmt;

/// Which stream a connection serves.
///
/// The global updates stream carries notifications for the whole account;
/// a room scope carries one chat conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionScope {
    /// Global notification stream (`/api/chat/updates`)
    Updates,
    /// Per-room chat stream (`/api/chat/<room_id>/ws`)
    Room(i64),
}

impl ConnectionScope {
    /// Build the full endpoint URL, attaching the credential as the
    /// `token` query parameter the backend expects.
    pub fn endpoint_url(&self, ws_base_url: &str, token: &str) -> String {
        let base = ws_base_url.trim_end_matches('/');
        match self {
            ConnectionScope::Updates => format!("{}/api/chat/updates?token={}", base, token),
            ConnectionScope::Room(room_id) => {
                format!("{}/api/chat/{}/ws?token={}", base, room_id, token)
            }
        }
    }
}

impl fmt::Display for ConnectionScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionScope::Updates => write!(f, "updates"),
            ConnectionScope::Room(room_id) => write!(f, "room {}", room_id),
        }
    }
}
