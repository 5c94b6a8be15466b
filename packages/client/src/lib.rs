//! Realtime client library for the ichiba marketplace.
//!
//! This library keeps a client connected to the backend's WebSocket
//! streams (the account-wide updates stream and per-room chat streams),
//! recovering transparently from drops, and reconciles the pushed
//! notification stream with REST-fetched snapshots into one
//! de-duplicated, ordered view.
//!
//! The moving parts, leaf to root:
//!
//! - [`protocol`]: wire models, envelope sum types, and the JSON codec
//! - [`connection`]: the reconnecting connection state machine
//! - [`dispatch`]: routing of decoded envelopes to registered handlers
//! - [`reconciler`]: snapshot/push merging for notifications
//! - [`notifications`] / [`chat`]: consumer-side feeds built on the above
//! - [`api`]: the REST collaborators (snapshot fetch, acknowledgements)

pub mod api;
pub mod chat;
pub mod config;
pub mod connection;
pub mod credentials;
pub mod dispatch;
pub mod error;
pub mod formatter;
pub mod notifications;
pub mod protocol;
pub mod reconciler;
pub mod ui;

pub use api::{ChatApi, HttpApi, NotificationApi};
pub use chat::{RoomFeed, RoomTranscript};
pub use config::ClientConfig;
pub use connection::{
    Connection, ConnectionFailure, ConnectionHandle, ConnectionScope, ConnectionState,
};
pub use credentials::{CredentialProvider, StaticCredentials};
pub use dispatch::{Dispatcher, StreamHandler};
pub use error::ClientError;
pub use notifications::NotificationFeed;
pub use protocol::{ChatMessage, ClientEnvelope, Notification, ServerEnvelope, UserRef};
pub use reconciler::NotificationReconciler;
