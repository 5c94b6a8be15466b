//! Wire protocol for the ichiba realtime streams.
//!
//! The backend speaks JSON text frames with a `type` tag and camelCase
//! field names. This module defines the payload models, the envelope sum
//! types for both directions, and the codec converting between wire text
//! and typed envelopes.

pub mod codec;
pub mod envelope;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use envelope::{ClientEnvelope, ServerEnvelope};

/// A user notification, delivered either in the REST snapshot or as a
/// live `new_notification` push.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    /// Unique, stable identity key for deduplication
    pub id: i64,
    pub title: String,
    pub message: String,
    #[serde(rename = "isRead")]
    pub is_read: bool,
    /// Sole sort key for the reconciled view (newest first)
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

/// A chat message within one room stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: i64,
    pub content: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    pub read: bool,
    #[serde(rename = "senderId")]
    pub sender_id: i64,
}

/// A payment agreement update pushed into a chat room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentAgreement {
    pub id: i64,
    pub status: String,
    pub amount: f64,
    #[serde(default)]
    pub description: String,
}

/// Informational payload of a `chat_room_created` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRoomInfo {
    pub id: i64,
    #[serde(default)]
    pub name: String,
}

/// Reference to the authenticated user, the identity half of the
/// credential pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    pub id: i64,
}
