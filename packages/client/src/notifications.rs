//! Notification feed.
//!
//! Consumer-side glue between the updates stream, the REST snapshot and
//! the reconciled notification set. The feed is the only writer to its
//! reconciler; the dispatcher and the REST refresh call into it from
//! different tasks, so every operation takes the lock for its whole
//! mutation and `view` never observes a partial update.

use std::sync::{Mutex, MutexGuard};

use crate::{
    api::NotificationApi,
    connection::ConnectionHandle,
    dispatch::StreamHandler,
    error::ClientError,
    protocol::{ClientEnvelope, Notification},
    reconciler::NotificationReconciler,
};

/// Reconciled notification state fed by the updates stream.
#[derive(Default)]
pub struct NotificationFeed {
    reconciler: Mutex<NotificationReconciler>,
}

impl NotificationFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the REST snapshot and merge it into the live set.
    ///
    /// Safe to call while pushes are already arriving: entries pushed
    /// before the response lands survive the merge. Returns the size of
    /// the fetched snapshot.
    pub async fn refresh(&self, api: &dyn NotificationApi) -> Result<usize, ClientError> {
        let items = api.fetch_notifications().await?;
        let count = items.len();
        self.lock().load_snapshot(items);
        tracing::debug!("Merged notification snapshot of {} entries", count);
        Ok(count)
    }

    /// The reconciled notification set, newest first
    pub fn view(&self) -> Vec<Notification> {
        self.lock().view()
    }

    /// Number of unread notifications
    pub fn unread_count(&self) -> usize {
        self.lock().unread_count()
    }

    /// Mark one notification as read locally and tell the backend.
    ///
    /// The local mutation is optimistic: it is kept even when the intent
    /// cannot be sent, and there is no rollback if the backend rejects
    /// the acknowledgement. Returns whether anything changed locally.
    pub fn mark_read(&self, id: i64, handle: &ConnectionHandle) -> bool {
        let changed = self.lock().mark_read(id);
        if changed {
            handle.try_send(ClientEnvelope::MarkAsRead {
                notification_id: id,
            });
        }
        changed
    }

    /// Mark every notification as read locally and tell the backend.
    ///
    /// Same optimistic contract as [`Self::mark_read`]. Returns how many
    /// entries changed locally.
    pub fn mark_all_read(&self, handle: &ConnectionHandle) -> usize {
        let changed = self.lock().mark_all_read();
        if changed > 0 {
            handle.try_send(ClientEnvelope::MarkAllRead);
        }
        changed
    }

    fn lock(&self) -> MutexGuard<'_, NotificationReconciler> {
        self.reconciler.lock().expect("notification reconciler lock poisoned")
    }
}

impl StreamHandler for NotificationFeed {
    fn on_notification(&self, notification: Notification) {
        tracing::debug!("Received pushed notification {}", notification.id);
        self.lock().apply_push(notification);
    }

    fn on_initial_notifications(&self, notifications: Vec<Notification>) {
        tracing::debug!(
            "Received initial notification batch of {} entries",
            notifications.len()
        );
        self.lock().load_snapshot(notifications);
    }

    fn on_interest_accepted(&self, request_id: i64) {
        tracing::info!("Interest request {} was accepted", request_id);
    }
}
