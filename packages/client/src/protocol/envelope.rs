//! Envelope sum types over the fixed message vocabulary.
//!
//! Inbound and outbound messages share the same framing: a JSON object
//! with a `type` tag and a type-dependent body. Inbound envelopes are
//! produced by [`super::codec::decode`]; a frame whose tag is outside the
//! known vocabulary decodes to [`ServerEnvelope::Unknown`] so that a
//! backend protocol addition never tears down the connection.

use serde::Serialize;

use super::{ChatMessage, ChatRoomInfo, Notification, PaymentAgreement};

/// Messages received from the server.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEnvelope {
    /// Authentication acknowledged; the connection is ready for traffic
    AuthSuccess,
    /// A new chat message for the room stream
    NewMessage { message: ChatMessage },
    /// A previously sent message was read by its recipient
    MessageRead { message_id: i64 },
    /// A payment agreement was created or changed state
    PaymentAgreement { agreement: PaymentAgreement },
    /// A single pushed notification (`notification` / `new_notification`)
    Notification { data: Notification },
    /// The server-side notification snapshot sent at connection time
    InitialNotifications { data: Vec<Notification> },
    /// A service interest request was accepted
    InterestAccepted { request_id: i64 },
    /// A chat room was created for one of the user's conversations
    ChatRoomCreated { chat_room: ChatRoomInfo },
    /// Forward-compatibility arm: a structurally valid frame with a tag
    /// this client does not know. Logged and dropped by the dispatcher.
    Unknown { message_type: String },
}

/// Messages sent to the server.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEnvelope {
    /// Authentication handshake carrying the bearer token
    Auth { token: String },
    /// Liveness probe
    Ping,
    /// Post a new chat message to the room stream
    SendMessage { content: String },
    /// Acknowledge one notification as read
    MarkAsRead {
        #[serde(rename = "notificationId")]
        notification_id: i64,
    },
    /// Acknowledge every notification as read
    MarkAllRead,
}
