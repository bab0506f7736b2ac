//! Payment Expiry Sweep
//!
//! Scheduled batch job that force-expires pending payments whose
//! confirmation window has elapsed and notifies the affected users. Each
//! invocation is idempotent and self-contained: the same semantics apply
//! whether a timer or an operator triggers it.

use crate::notify::{Notification, NotificationKind, NotificationSink};
use crate::payments::PaymentLedger;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Result of one sweep invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepOutcome {
    /// Number of payments force-expired by this invocation
    pub expired_count: usize,
    /// IDs of the expired payments
    pub expired_ids: Vec<Uuid>,
}

/// Expiry sweep job
pub struct ExpirySweepJob {
    ledger: Arc<PaymentLedger>,
    notifications: Arc<dyn NotificationSink>,
}

impl ExpirySweepJob {
    /// Create a sweep job over the given ledger and sink
    pub fn new(ledger: Arc<PaymentLedger>, notifications: Arc<dyn NotificationSink>) -> Self {
        Self {
            ledger,
            notifications,
        }
    }

    /// Expire stale pending payments as of `now`.
    ///
    /// The batch update is a single atomic write; notification emission
    /// runs afterwards and is best-effort. A sink failure is logged and
    /// the expiry stands.
    pub fn sweep(&self, now: DateTime<Utc>) -> SweepOutcome {
        let expired = self.ledger.expire_batch(now);

        if expired.is_empty() {
            return SweepOutcome {
                expired_count: 0,
                expired_ids: Vec::new(),
            };
        }

        tracing::info!(count = expired.len(), "Expired stale pending payments");

        for record in &expired {
            let notification = Notification {
                user_id: record.user_id,
                kind: NotificationKind::Warning,
                title: "Payment expired".into(),
                message: format!(
                    "Your payment of {} for the {} plan expired after 15 minutes without confirmation. Please submit a new payment.",
                    record.amount, record.plan
                ),
                created_at: now,
            };

            if let Err(e) = self.notifications.push(notification) {
                tracing::warn!(
                    payment_id = %record.id,
                    user_id = %record.user_id,
                    error = %e,
                    "Failed to emit expiry notification"
                );
            }
        }

        SweepOutcome {
            expired_count: expired.len(),
            expired_ids: expired.iter().map(|r| r.id).collect(),
        }
    }

    /// Run the sweep on a fixed interval until the task is dropped.
    pub async fn run(self: Arc<Self>, interval: std::time::Duration) {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            let outcome = self.sweep(Utc::now());
            if outcome.expired_count > 0 {
                tracing::debug!(
                    expired = outcome.expired_count,
                    "Sweep tick completed"
                );
            }
        }
    }
}
