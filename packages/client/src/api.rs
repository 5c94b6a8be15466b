//! REST collaborators.
//!
//! The backend performs the real business logic; this module only wraps
//! the endpoints the realtime client consumes: the notification snapshot,
//! read acknowledgements, and chat history. The traits keep consumers
//! testable without a network.

use async_trait::async_trait;

use crate::{
    config::ClientConfig,
    credentials::CredentialProvider,
    error::ClientError,
    protocol::{ChatMessage, ChatRoomInfo, Notification, PaymentAgreement},
};

/// Notification endpoints.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationApi: Send + Sync {
    /// Fetch the point-in-time notification snapshot
    async fn fetch_notifications(&self) -> Result<Vec<Notification>, ClientError>;

    /// Acknowledge one notification as read
    async fn mark_notification_read(&self, id: i64) -> Result<(), ClientError>;

    /// Acknowledge every notification as read
    async fn mark_all_notifications_read(&self) -> Result<(), ClientError>;
}

/// Chat endpoints.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatApi: Send + Sync {
    /// List the user's chat rooms
    async fn list_rooms(&self) -> Result<Vec<ChatRoomInfo>, ClientError>;

    /// Fetch the message history of one room
    async fn room_messages(&self, room_id: i64) -> Result<Vec<ChatMessage>, ClientError>;

    /// Propose a payment agreement in one room
    async fn create_agreement(
        &self,
        room_id: i64,
        amount: f64,
        description: String,
    ) -> Result<PaymentAgreement, ClientError>;

    /// Accept a previously proposed agreement
    async fn accept_agreement(
        &self,
        room_id: i64,
        agreement_id: i64,
    ) -> Result<PaymentAgreement, ClientError>;
}

/// HTTP implementation of the REST collaborators.
pub struct HttpApi {
    base_url: String,
    token: String,
    http: reqwest::Client,
}

impl HttpApi {
    /// Build an API client for the configured backend.
    ///
    /// Fails with [`ClientError::MissingCredential`] when no bearer token
    /// is available; every request carries the token.
    pub fn new(
        config: &ClientConfig,
        credentials: &dyn CredentialProvider,
    ) -> Result<Self, ClientError> {
        let token = credentials
            .token()
            .filter(|t| !t.trim().is_empty())
            .ok_or(ClientError::MissingCredential)?;
        Ok(Self {
            base_url: config.rest_base_url.trim_end_matches('/').to_string(),
            token,
            http: reqwest::Client::new(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let response = self
            .http
            .get(self.url(path))
            .bearer_auth(&self.token)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::ApiStatus {
                status: status.as_u16(),
            });
        }
        Ok(response.json().await?)
    }

    async fn post_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<T, ClientError> {
        let response = self
            .http
            .post(self.url(path))
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::ApiStatus {
                status: status.as_u16(),
            });
        }
        Ok(response.json().await?)
    }

    async fn patch_empty(&self, path: &str) -> Result<(), ClientError> {
        let response = self
            .http
            .patch(self.url(path))
            .bearer_auth(&self.token)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::ApiStatus {
                status: status.as_u16(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl NotificationApi for HttpApi {
    async fn fetch_notifications(&self) -> Result<Vec<Notification>, ClientError> {
        self.get_json("/api/notifications").await
    }

    async fn mark_notification_read(&self, id: i64) -> Result<(), ClientError> {
        self.patch_empty(&format!("/api/notifications/{}/read", id))
            .await
    }

    async fn mark_all_notifications_read(&self) -> Result<(), ClientError> {
        self.patch_empty("/api/notifications/read-all").await
    }
}

#[async_trait]
impl ChatApi for HttpApi {
    async fn list_rooms(&self) -> Result<Vec<ChatRoomInfo>, ClientError> {
        self.get_json("/api/chat").await
    }

    async fn room_messages(&self, room_id: i64) -> Result<Vec<ChatMessage>, ClientError> {
        self.get_json(&format!("/api/chat/{}/messages", room_id))
            .await
    }

    async fn create_agreement(
        &self,
        room_id: i64,
        amount: f64,
        description: String,
    ) -> Result<PaymentAgreement, ClientError> {
        let body = serde_json::json!({
            "amount": amount,
            "description": description,
        });
        self.post_json(&format!("/api/chat/{}/agreements", room_id), &body)
            .await
    }

    async fn accept_agreement(
        &self,
        room_id: i64,
        agreement_id: i64,
    ) -> Result<PaymentAgreement, ClientError> {
        let body = serde_json::json!({});
        self.post_json(
            &format!("/api/chat/{}/agreements/{}/accept", room_id, agreement_id),
            &body,
        )
        .await
    }
}
