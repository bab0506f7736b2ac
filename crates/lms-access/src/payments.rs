//! Payment Lifecycle State Machine
//!
//! A payment starts `pending` and moves exactly once to one of the
//! terminal states `confirmed`, `declined`, or `expired`. Transitions are
//! compare-and-swap: the current status is re-checked under the write
//! lock, so a manual confirm racing the auto-expire sweep loses cleanly
//! instead of overwriting. Records are never deleted; terminal states are
//! permanent history.

use crate::model::{SubscriptionPlan, UserId};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// How long a pending payment waits for confirmation before the sweep
/// force-expires it.
pub const PENDING_WINDOW_MINUTES: i64 = 15;

/// Note written onto auto-expired payments
pub const AUTO_EXPIRE_NOTE: &str = "Auto-expired after 15 minutes without confirmation";

/// Payment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Awaiting confirmation, still inside the pending window
    Pending,
    /// Administratively confirmed; the subscription was granted
    Confirmed,
    /// Administratively rejected
    Declined,
    /// Force-expired by the sweep after the window elapsed
    Expired,
}

impl PaymentStatus {
    /// Terminal states have no outgoing transitions.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// One payment attempt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRecord {
    /// Unique payment ID
    pub id: Uuid,
    /// Paying user
    pub user_id: UserId,
    /// Plan the payment is for
    pub plan: SubscriptionPlan,
    /// Amount submitted
    pub amount: Decimal,
    /// Current lifecycle state
    pub status: PaymentStatus,
    /// Submission instant; the pending window counts from here
    pub created_at: DateTime<Utc>,
    /// Set on decline and on auto-expiry
    pub declined_at: Option<DateTime<Utc>>,
    /// Free-form admin note, set on decline/expiry
    pub admin_notes: Option<String>,
}

/// Payment ledger
///
/// In-memory store of every payment attempt. All mutation goes through the
/// status-guarded transitions below.
pub struct PaymentLedger {
    payments: Arc<RwLock<HashMap<Uuid, PaymentRecord>>>,
}

impl PaymentLedger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self {
            payments: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Record a new payment attempt in the `pending` state.
    pub fn submit(
        &self,
        user_id: UserId,
        plan: SubscriptionPlan,
        amount: Decimal,
        now: DateTime<Utc>,
    ) -> PaymentRecord {
        let record = PaymentRecord {
            id: Uuid::new_v4(),
            user_id,
            plan,
            amount,
            status: PaymentStatus::Pending,
            created_at: now,
            declined_at: None,
            admin_notes: None,
        };

        self.payments.write().insert(record.id, record.clone());
        tracing::debug!(payment_id = %record.id, user_id = %user_id, plan = %plan, "Payment submitted");
        record
    }

    /// Get payment by ID
    pub fn get(&self, id: &Uuid) -> Option<PaymentRecord> {
        self.payments.read().get(id).cloned()
    }

    /// Payment history for one user
    pub fn payments_for_user(&self, user_id: &UserId) -> Vec<PaymentRecord> {
        self.payments
            .read()
            .values()
            .filter(|p| p.user_id == *user_id)
            .cloned()
            .collect()
    }

    /// `pending -> confirmed` (administrative confirmation).
    ///
    /// The caller must apply the subscription to the user's profile in the
    /// same call path; the ledger only records the transition.
    pub fn confirm(&self, id: &Uuid, _now: DateTime<Utc>) -> Result<PaymentRecord, PaymentError> {
        self.transition(id, PaymentStatus::Confirmed, |_| {})
    }

    /// `pending -> declined` (administrative rejection). Access stays locked.
    pub fn decline(
        &self,
        id: &Uuid,
        now: DateTime<Utc>,
        notes: Option<&str>,
    ) -> Result<PaymentRecord, PaymentError> {
        self.transition(id, PaymentStatus::Declined, |record| {
            record.declined_at = Some(now);
            record.admin_notes = notes.map(str::to_string);
        })
    }

    /// `pending -> expired` (sweep-only, pending window elapsed).
    pub fn expire(&self, id: &Uuid, now: DateTime<Utc>) -> Result<PaymentRecord, PaymentError> {
        self.transition(id, PaymentStatus::Expired, |record| {
            record.declined_at = Some(now);
            record.admin_notes = Some(AUTO_EXPIRE_NOTE.to_string());
        })
    }

    /// IDs of pending payments whose window has elapsed at `now`.
    pub fn stale_pending(&self, now: DateTime<Utc>) -> Vec<Uuid> {
        let cutoff = now - chrono::Duration::minutes(PENDING_WINDOW_MINUTES);
        self.payments
            .read()
            .values()
            .filter(|p| p.status == PaymentStatus::Pending && p.created_at <= cutoff)
            .map(|p| p.id)
            .collect()
    }

    /// Expire every stale pending payment in one batch.
    ///
    /// Scan and update happen under a single write lock: no reader can
    /// observe a partially-swept ledger, and the per-record status check
    /// still guards against a confirm that won the race before the lock
    /// was taken.
    pub fn expire_batch(&self, now: DateTime<Utc>) -> Vec<PaymentRecord> {
        let cutoff = now - chrono::Duration::minutes(PENDING_WINDOW_MINUTES);
        let mut payments = self.payments.write();

        let mut expired = Vec::new();
        for record in payments.values_mut() {
            if record.status == PaymentStatus::Pending && record.created_at <= cutoff {
                record.status = PaymentStatus::Expired;
                record.declined_at = Some(now);
                record.admin_notes = Some(AUTO_EXPIRE_NOTE.to_string());
                expired.push(record.clone());
            }
        }

        expired
    }

    fn transition(
        &self,
        id: &Uuid,
        target: PaymentStatus,
        apply: impl FnOnce(&mut PaymentRecord),
    ) -> Result<PaymentRecord, PaymentError> {
        let mut payments = self.payments.write();
        let record = payments.get_mut(id).ok_or(PaymentError::NotFound)?;

        // Compare-and-swap: only pending records move. A record that
        // already reached a terminal state is reported, never overwritten.
        if record.status != PaymentStatus::Pending {
            tracing::warn!(
                payment_id = %id,
                current = ?record.status,
                attempted = ?target,
                "Rejected transition on non-pending payment"
            );
            return Err(PaymentError::NotPending {
                current: record.status,
            });
        }

        record.status = target;
        apply(record);

        tracing::info!(payment_id = %id, status = ?target, "Payment transition applied");
        Ok(record.clone())
    }
}

impl Default for PaymentLedger {
    fn default() -> Self {
        Self::new()
    }
}

/// Payment error
#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    /// No payment with the given ID
    #[error("payment not found")]
    NotFound,
    /// Transition attempted on a record that already left `pending`
    #[error("payment already {current:?}; only pending payments can transition")]
    NotPending {
        /// Terminal state the record already holds
        current: PaymentStatus,
    },
}
