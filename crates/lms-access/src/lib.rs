//! OpenLMS Access Platform
//!
//! Access policy and payment lifecycle engine for the learning platform.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         ACCESS PLATFORM                                 │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  ACCESS POLICY EVALUATOR                         │   │
//! │  │   Settings ─► Trial Window ─► Plan Tier ─► AccessDecision        │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐  ┌─────────────┐ │
//! │  │   Payment    │  │    Expiry    │  │     Role     │  │   Teacher   │ │
//! │  │  Lifecycle   │  │    Sweep     │  │   Routing    │  │   Linking   │ │
//! │  └──────────────┘  └──────────────┘  └──────────────┘  └─────────────┘ │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 NOTIFICATION SIDE CHANNEL                        │   │
//! │  │   Expired payments ─► per-user warning records                   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]
#![allow(dead_code)]

pub mod linking;
pub mod model;
pub mod notify;
pub mod payments;
pub mod policy;
pub mod roles;
pub mod settings;
pub mod sweep;

use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

pub use linking::{InvitationStore, Role, RoleAssignmentStore, TeacherAccountLinker};
pub use model::{ProfileStore, SubscriptionPlan, UserId, UserProfile};
pub use notify::{InMemorySink, Notification, NotificationKind, NotificationSink};
pub use payments::{PaymentLedger, PaymentRecord, PaymentStatus};
pub use policy::{evaluate, AccessDecision};
pub use roles::{resolve, Destination, Resolution, RoleSignals, Signal};
pub use settings::{AppSettings, SettingsStore};
pub use sweep::{ExpirySweepJob, SweepOutcome};

/// Term granted by a confirmed recurring payment
const SUBSCRIPTION_TERM_DAYS: i64 = 30;
/// Stand-in expiry for lifetime purchases
const LIFETIME_TERM_DAYS: i64 = 36_500;

/// Access engine error types
#[derive(Debug, Error)]
pub enum EngineError {
    /// Payment ledger rejected the operation
    #[error("payment error: {0}")]
    Payment(#[from] payments::PaymentError),
    /// Profile store rejected the operation
    #[error("profile error: {0}")]
    Profile(#[from] model::ProfileError),
}

/// Access Platform
pub struct AccessEngine {
    /// Settings snapshot store
    pub settings: Arc<SettingsStore>,
    /// Profile store
    pub profiles: Arc<ProfileStore>,
    /// Payment ledger
    pub payments: Arc<PaymentLedger>,
    /// Teacher invitations
    pub invitations: Arc<InvitationStore>,
    /// Role assignments
    pub roles: Arc<RoleAssignmentStore>,
    /// Notification sink
    pub notifications: Arc<InMemorySink>,
    /// Expiry sweep job
    pub sweep: Arc<ExpirySweepJob>,
    /// Teacher account linker
    pub linker: TeacherAccountLinker,
}

impl AccessEngine {
    /// Create a new engine with in-memory stores
    pub fn new() -> Self {
        let payments = Arc::new(PaymentLedger::new());
        let invitations = Arc::new(InvitationStore::new());
        let roles = Arc::new(RoleAssignmentStore::new());
        let notifications = Arc::new(InMemorySink::new());
        Self {
            settings: Arc::new(SettingsStore::default()),
            profiles: Arc::new(ProfileStore::new()),
            payments: payments.clone(),
            invitations: invitations.clone(),
            roles: roles.clone(),
            notifications: notifications.clone(),
            sweep: Arc::new(ExpirySweepJob::new(payments, notifications)),
            linker: TeacherAccountLinker::new(invitations, roles),
        }
    }

    /// Evaluate access for one user at one instant.
    ///
    /// Takes the current settings snapshot; a missing profile degrades to
    /// the locked decision, never an error.
    pub fn evaluate_access(&self, user_id: &UserId, now: DateTime<Utc>) -> AccessDecision {
        let settings = self.settings.snapshot();
        let profile = self.profiles.get(user_id);
        policy::evaluate(&settings, profile.as_ref(), now)
    }

    /// Record a new pending payment
    pub fn submit_payment(
        &self,
        user_id: UserId,
        plan: SubscriptionPlan,
        amount: rust_decimal::Decimal,
        now: DateTime<Utc>,
    ) -> PaymentRecord {
        self.payments.submit(user_id, plan, amount, now)
    }

    /// Confirm a pending payment and grant the subscription.
    ///
    /// The ledger transition and the profile upgrade happen in the same
    /// call path; if the compare-and-swap loses (the sweep expired the
    /// payment first), the profile is left untouched.
    pub fn confirm_payment(
        &self,
        payment_id: &Uuid,
        now: DateTime<Utc>,
    ) -> Result<PaymentRecord, EngineError> {
        let record = self.payments.confirm(payment_id, now)?;

        let term = match record.plan {
            SubscriptionPlan::Lifetime => LIFETIME_TERM_DAYS,
            _ => SUBSCRIPTION_TERM_DAYS,
        };
        self.profiles.apply_subscription(
            &record.user_id,
            record.plan,
            Some(now + chrono::Duration::days(term)),
        )?;

        Ok(record)
    }

    /// Decline a pending payment. Access stays locked.
    pub fn decline_payment(
        &self,
        payment_id: &Uuid,
        now: DateTime<Utc>,
        notes: Option<&str>,
    ) -> Result<PaymentRecord, EngineError> {
        Ok(self.payments.decline(payment_id, now, notes)?)
    }

    /// Run the expiry sweep on demand, with the same semantics as a
    /// scheduled tick.
    pub fn sweep_now(&self, now: DateTime<Utc>) -> SweepOutcome {
        self.sweep.sweep(now)
    }

    /// Start-of-session hook: link any pending teacher invitation, then
    /// report the role signals this engine owns.
    ///
    /// The linker runs before the teacher signal is read, so a freshly
    /// linked teacher is never briefly routed as a plain user. Classroom
    /// membership is sourced externally and stays `Unknown` here; the
    /// caller merges it in once its query resolves.
    pub fn start_session(&self, user_id: UserId, email: &str) -> RoleSignals {
        self.linker.try_link(user_id, email);

        RoleSignals {
            admin: Signal::from_bool(self.roles.has_role(&user_id, Role::Admin)),
            teacher: Signal::from_bool(self.roles.has_role(&user_id, Role::Teacher)),
            classroom_student: Signal::Unknown,
        }
    }
}

impl Default for AccessEngine {
    fn default() -> Self {
        Self::new()
    }
}
