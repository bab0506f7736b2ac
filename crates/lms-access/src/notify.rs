//! Notification Sink
//!
//! Delivery transport is a collaborator concern; this module only defines
//! the record shape and the seam the sweep emits through.

use crate::model::UserId;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Notification severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// Informational
    Info,
    /// Needs the user's attention
    Warning,
}

/// Notification record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    /// Recipient
    pub user_id: UserId,
    /// Severity
    pub kind: NotificationKind,
    /// Short headline
    pub title: String,
    /// Body text
    pub message: String,
    /// Emission instant
    pub created_at: DateTime<Utc>,
}

/// Sink accepting notification records for later delivery.
pub trait NotificationSink: Send + Sync {
    /// Accept one notification. Failures are the caller's to log; emission
    /// is a best-effort side channel.
    fn push(&self, notification: Notification) -> Result<(), NotifyError>;
}

/// Notification error
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// Sink rejected or could not accept the record
    #[error("notification sink unavailable: {0}")]
    Unavailable(String),
}

/// In-memory sink, the default wiring and the test double.
pub struct InMemorySink {
    notifications: Arc<RwLock<Vec<Notification>>>,
}

impl InMemorySink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self {
            notifications: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Notifications queued for one user
    pub fn for_user(&self, user_id: &UserId) -> Vec<Notification> {
        self.notifications
            .read()
            .iter()
            .filter(|n| n.user_id == *user_id)
            .cloned()
            .collect()
    }

    /// Total queued notifications
    pub fn len(&self) -> usize {
        self.notifications.read().len()
    }

    /// No queued notifications
    pub fn is_empty(&self) -> bool {
        self.notifications.read().is_empty()
    }
}

impl Default for InMemorySink {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationSink for InMemorySink {
    fn push(&self, notification: Notification) -> Result<(), NotifyError> {
        self.notifications.write().push(notification);
        Ok(())
    }
}
