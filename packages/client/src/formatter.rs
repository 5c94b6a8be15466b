//! Message formatting utilities for client display.

use chrono::{DateTime, Utc};
use ichiba_shared::time::format_rfc3339;

use crate::chat::SYSTEM_SENDER_ID;
use crate::connection::ConnectionState;
use crate::protocol::{ChatMessage, Notification};

/// Message formatter for client display
pub struct MessageFormatter;

impl MessageFormatter {
    /// Format a chat message for the room view.
    ///
    /// System messages (agreement updates) render without a sender line.
    pub fn format_chat_message(message: &ChatMessage) -> String {
        let timestamp_str = format_rfc3339(&message.created_at);
        if message.sender_id == SYSTEM_SENDER_ID {
            return format!("\n* {} ({})\n", message.content, timestamp_str);
        }
        format!(
            "\n\n------------------------------------------------------------\n\
             @user {}: {}\n\
             sent at {}\n\
             ------------------------------------------------------------\n",
            message.sender_id, message.content, timestamp_str
        )
    }

    /// Format one notification line
    pub fn format_notification(notification: &Notification) -> String {
        let marker = if notification.is_read { " " } else { "*" };
        let timestamp_str = format_rfc3339(&notification.created_at);
        format!(
            "\n{} [{}] {}: {} ({})\n",
            marker, notification.id, notification.title, notification.message, timestamp_str
        )
    }

    /// Format the unread banner shown above the notification list
    pub fn format_unread_banner(unread: usize, total: usize) -> String {
        let mut output = String::new();
        output.push_str("\n============================================================\n");
        output.push_str(&format!("Notifications: {} unread of {}\n", unread, total));
        output.push_str("============================================================\n");
        output
    }

    /// Format a confirmation line after sending a message
    pub fn format_sent_confirmation(sent_at: DateTime<Utc>) -> String {
        format!("sent at {}\n", format_rfc3339(&sent_at))
    }

    /// Format a connection state change for status display
    pub fn format_connection_state(state: ConnectionState) -> String {
        format!("\n[connection: {}]\n", state)
    }
}
