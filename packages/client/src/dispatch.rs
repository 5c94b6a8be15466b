//! Message routing between transport and application logic.
//!
//! The dispatcher is the single integration point consumers register
//! against: the connection task decodes frames and hands every envelope
//! here. Handlers run synchronously on the message-receipt path and must
//! not block; anything that needs I/O has to hand off and return.

use std::sync::Arc;

use crate::protocol::{ChatMessage, ChatRoomInfo, Notification, PaymentAgreement, ServerEnvelope};

/// Application-side handler for inbound stream events.
///
/// Every method defaults to a no-op so consumers implement only the
/// events their stream carries.
pub trait StreamHandler: Send + Sync {
    /// The server acknowledged authentication
    fn on_auth_success(&self) {}

    /// A chat message arrived on the room stream
    fn on_chat_message(&self, _message: ChatMessage) {}

    /// A previously sent message was read
    fn on_message_read(&self, _message_id: i64) {}

    /// A payment agreement was created or changed state
    fn on_payment_agreement(&self, _agreement: PaymentAgreement) {}

    /// A notification was pushed on the updates stream
    fn on_notification(&self, _notification: Notification) {}

    /// The server-side notification snapshot arrived
    fn on_initial_notifications(&self, _notifications: Vec<Notification>) {}

    /// A service interest request was accepted
    fn on_interest_accepted(&self, _request_id: i64) {}

    /// A chat room was created for one of the user's conversations
    fn on_chat_room_created(&self, _chat_room: ChatRoomInfo) {}
}

/// Routes decoded envelopes to the registered handler by type.
#[derive(Clone)]
pub struct Dispatcher {
    handler: Arc<dyn StreamHandler>,
}

impl Dispatcher {
    pub fn new(handler: Arc<dyn StreamHandler>) -> Self {
        Self { handler }
    }

    /// Route one envelope. Total: unknown types are logged and dropped,
    /// never surfaced as an error.
    pub fn dispatch(&self, envelope: ServerEnvelope) {
        match envelope {
            ServerEnvelope::AuthSuccess => self.handler.on_auth_success(),
            ServerEnvelope::NewMessage { message } => self.handler.on_chat_message(message),
            ServerEnvelope::MessageRead { message_id } => self.handler.on_message_read(message_id),
            ServerEnvelope::PaymentAgreement { agreement } => {
                self.handler.on_payment_agreement(agreement)
            }
            ServerEnvelope::Notification { data } => self.handler.on_notification(data),
            ServerEnvelope::InitialNotifications { data } => {
                self.handler.on_initial_notifications(data)
            }
            ServerEnvelope::InterestAccepted { request_id } => {
                self.handler.on_interest_accepted(request_id)
            }
            ServerEnvelope::ChatRoomCreated { chat_room } => {
                self.handler.on_chat_room_created(chat_room)
            }
            ServerEnvelope::Unknown { message_type } => {
                tracing::warn!("Dropping message with unknown type '{}'", message_type);
            }
        }
    }
}
