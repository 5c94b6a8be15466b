//! Room transcript state for the per-room chat stream.
//!
//! The transcript is append-only within a room session: history loads
//! once, live messages append, and the only in-place mutations are the
//! read flag and the system messages synthesized from payment-agreement
//! events.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use ichiba_shared::time::{Clock, SystemClock};

use crate::{
    connection::ConnectionHandle,
    dispatch::StreamHandler,
    protocol::{ChatMessage, ChatRoomInfo, ClientEnvelope, PaymentAgreement},
};

/// Sender id used for synthesized system messages
pub const SYSTEM_SENDER_ID: i64 = 0;

/// Ordered message log of one chat room.
#[derive(Debug, Default)]
pub struct RoomTranscript {
    messages: Vec<ChatMessage>,
}

impl RoomTranscript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the REST-fetched history as the transcript baseline.
    ///
    /// Messages already present (a push that raced the history fetch)
    /// are kept; the result is ordered oldest first.
    pub fn load_history(&mut self, items: Vec<ChatMessage>) {
        for item in items {
            self.push(item);
        }
        self.messages
            .sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
    }

    /// Append one message. Returns false when the id is already present.
    pub fn push(&mut self, message: ChatMessage) -> bool {
        if self.messages.iter().any(|m| m.id == message.id) {
            return false;
        }
        self.messages.push(message);
        true
    }

    /// Flip the read flag of one message in place.
    pub fn mark_read(&mut self, message_id: i64) -> bool {
        match self.messages.iter_mut().find(|m| m.id == message_id) {
            Some(message) if !message.read => {
                message.read = true;
                true
            }
            _ => false,
        }
    }

    /// Surface a payment-agreement update as a system message.
    ///
    /// Synthesized messages use the negated agreement id so they can
    /// never collide with server-assigned message ids, and are born read.
    pub fn apply_agreement(&mut self, agreement: &PaymentAgreement, now: DateTime<Utc>) {
        let message = ChatMessage {
            id: -agreement.id,
            content: format!(
                "Payment agreement '{}' ({:.2}) is now {}",
                agreement.description, agreement.amount, agreement.status
            ),
            created_at: now,
            read: true,
            sender_id: SYSTEM_SENDER_ID,
        };
        // An agreement can change state more than once; keep the latest
        if let Some(existing) = self.messages.iter_mut().find(|m| m.id == message.id) {
            *existing = message;
        } else {
            self.messages.push(message);
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Unread messages sent by anyone other than the given user
    pub fn unread_from_others(&self, own_user_id: i64) -> usize {
        self.messages
            .iter()
            .filter(|m| !m.read && m.sender_id != own_user_id && m.sender_id != SYSTEM_SENDER_ID)
            .count()
    }
}

/// Stream-facing wrapper around one room's transcript.
pub struct RoomFeed {
    transcript: Mutex<RoomTranscript>,
    clock: Arc<dyn Clock>,
}

impl Default for RoomFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl RoomFeed {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            transcript: Mutex::new(RoomTranscript::new()),
            clock,
        }
    }

    /// Load the REST-fetched history into the transcript
    pub fn load_history(&self, items: Vec<ChatMessage>) {
        self.lock().load_history(items);
    }

    /// Snapshot of the transcript, oldest first
    pub fn messages(&self) -> Vec<ChatMessage> {
        self.lock().messages().to_vec()
    }

    /// Unread messages from other participants
    pub fn unread_from_others(&self, own_user_id: i64) -> usize {
        self.lock().unread_from_others(own_user_id)
    }

    /// Post a message through the room connection.
    ///
    /// Fire-and-forget: the transcript appends when the server echoes the
    /// message back on the stream, not here. Returns whether the intent
    /// was handed to the connection.
    pub fn send_message(&self, content: impl Into<String>, handle: &ConnectionHandle) -> bool {
        handle.try_send(ClientEnvelope::SendMessage {
            content: content.into(),
        })
    }

    fn lock(&self) -> MutexGuard<'_, RoomTranscript> {
        self.transcript.lock().expect("room transcript lock poisoned")
    }
}

impl StreamHandler for RoomFeed {
    fn on_chat_message(&self, message: ChatMessage) {
        tracing::debug!("Received chat message {}", message.id);
        self.lock().push(message);
    }

    fn on_message_read(&self, message_id: i64) {
        self.lock().mark_read(message_id);
    }

    fn on_payment_agreement(&self, agreement: PaymentAgreement) {
        tracing::info!(
            "Payment agreement {} is now {}",
            agreement.id,
            agreement.status
        );
        let now = self.clock.now_utc();
        self.lock().apply_agreement(&agreement, now);
    }

    fn on_chat_room_created(&self, chat_room: ChatRoomInfo) {
        tracing::info!("Chat room {} created: {}", chat_room.id, chat_room.name);
    }
}
