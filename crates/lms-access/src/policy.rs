//! Access Policy Evaluation
//!
//! Pure derivation of a user's effective access tier from the settings
//! snapshot, the profile record, and the supplied instant. Decisions are
//! never persisted; trial countdowns are time-dependent, so callers
//! re-evaluate whenever `now` or the inputs change.

use crate::model::{SubscriptionPlan, UserProfile};
use crate::settings::AppSettings;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Derived access decision. Never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessDecision {
    /// Effective plan the decision was computed for
    pub plan: SubscriptionPlan,
    /// Trial window still open at `now`
    pub is_in_trial: bool,
    /// Whole days left in the trial, rounded up; 0 when no open trial
    pub trial_days_remaining: i64,
    /// Trial is over and no paid plan covers the user
    pub trial_expired: bool,
    /// Trial or an unexpired paid subscription grants access
    pub is_active: bool,
    /// Basic-tier gate
    pub has_basic_access: bool,
    /// Pro-tier gate
    pub has_pro_access: bool,
}

impl AccessDecision {
    /// Full access is the pro tier under another name.
    pub fn has_full_access(&self) -> bool {
        self.has_pro_access
    }

    fn full(plan: SubscriptionPlan) -> Self {
        Self {
            plan,
            is_in_trial: false,
            trial_days_remaining: 0,
            trial_expired: false,
            is_active: true,
            has_basic_access: true,
            has_pro_access: true,
        }
    }

    fn locked() -> Self {
        Self {
            plan: SubscriptionPlan::Free,
            is_in_trial: false,
            trial_days_remaining: 0,
            trial_expired: true,
            is_active: false,
            has_basic_access: false,
            has_pro_access: false,
        }
    }
}

/// Evaluate the access policy for one user at one instant.
///
/// Total and panic-free: an absent profile (unauthenticated, not yet
/// loaded, or a failed profile read) degrades to the locked decision
/// rather than erroring.
pub fn evaluate(
    settings: &AppSettings,
    profile: Option<&UserProfile>,
    now: DateTime<Utc>,
) -> AccessDecision {
    // Global kill switch: paid features disabled means everyone rides free,
    // independent of any per-user data.
    if !settings.paid_features_enabled {
        return AccessDecision::full(SubscriptionPlan::Lifetime);
    }

    let profile = match profile {
        Some(p) => p,
        None => return AccessDecision::locked(),
    };

    let is_in_trial = profile.trial_ends_at.is_some_and(|t| t > now);
    let trial_days_remaining = profile
        .trial_ends_at
        .map(|t| ceil_days(t - now))
        .unwrap_or(0);

    let subscription_active = profile.subscription_expires_at.is_some_and(|t| t > now);

    let plan = profile.subscription_plan;
    let is_active = is_in_trial || (plan.is_paid() && subscription_active);
    let has_pro_access = is_in_trial || (plan.is_pro() && subscription_active);
    let trial_expired = !is_in_trial && (!plan.is_paid() || !subscription_active);

    AccessDecision {
        plan,
        is_in_trial,
        trial_days_remaining,
        trial_expired,
        is_active,
        // Basic access requires only an active paid plan or trial; the
        // expression is identical to `is_active` on purpose.
        has_basic_access: is_active,
        has_pro_access,
    }
}

/// Ceiling of a duration in days, clamped at zero.
///
/// A trial with any remaining time, however small, reports at least one
/// day.
fn ceil_days(remaining: chrono::Duration) -> i64 {
    if remaining <= chrono::Duration::zero() {
        return 0;
    }
    ((remaining.num_milliseconds() + MILLIS_PER_DAY - 1) / MILLIS_PER_DAY).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::UserProfile;
    use chrono::Duration;
    use uuid::Uuid;

    fn settings(enabled: bool) -> AppSettings {
        AppSettings {
            paid_features_enabled: enabled,
        }
    }

    fn profile(plan: SubscriptionPlan) -> UserProfile {
        UserProfile {
            user_id: Uuid::new_v4(),
            email: "student@example.com".into(),
            subscription_plan: plan,
            trial_ends_at: None,
            subscription_expires_at: None,
        }
    }

    #[test]
    fn test_kill_switch_grants_full_access() {
        let now = Utc::now();
        let decision = evaluate(&settings(false), None, now);

        assert_eq!(decision.plan, SubscriptionPlan::Lifetime);
        assert!(decision.is_active);
        assert!(decision.has_basic_access);
        assert!(decision.has_pro_access);
        assert!(decision.has_full_access());
        assert!(!decision.trial_expired);

        // Same override with an expired free profile present.
        let mut p = profile(SubscriptionPlan::Free);
        p.trial_ends_at = Some(now - Duration::days(10));
        let decision = evaluate(&settings(false), Some(&p), now);
        assert!(decision.has_pro_access);
    }

    #[test]
    fn test_absent_profile_is_locked() {
        let decision = evaluate(&settings(true), None, Utc::now());

        assert_eq!(decision.plan, SubscriptionPlan::Free);
        assert!(!decision.is_active);
        assert!(!decision.has_basic_access);
        assert!(!decision.has_pro_access);
        assert!(decision.trial_expired);
    }

    #[test]
    fn test_open_trial_on_free_plan_grants_pro() {
        let now = Utc::now();
        let mut p = profile(SubscriptionPlan::Free);
        p.trial_ends_at = Some(now + Duration::days(3));

        let decision = evaluate(&settings(true), Some(&p), now);

        assert!(decision.is_in_trial);
        assert!(decision.has_pro_access);
        assert!(decision.has_basic_access);
        assert!(!decision.trial_expired);
        assert_eq!(decision.trial_days_remaining, 3);
    }

    #[test]
    fn test_lapsed_trial_on_free_plan_is_expired() {
        let now = Utc::now();
        let mut p = profile(SubscriptionPlan::Free);
        p.trial_ends_at = Some(now - Duration::hours(1));

        let decision = evaluate(&settings(true), Some(&p), now);

        assert!(!decision.is_in_trial);
        assert!(!decision.is_active);
        assert!(decision.trial_expired);
        assert_eq!(decision.trial_days_remaining, 0);
    }

    #[test]
    fn test_basic_plan_grants_basic_not_pro() {
        let now = Utc::now();
        let mut p = profile(SubscriptionPlan::Basic);
        p.subscription_expires_at = Some(now + Duration::days(20));

        let decision = evaluate(&settings(true), Some(&p), now);

        assert!(decision.is_active);
        assert!(decision.has_basic_access);
        assert!(!decision.has_pro_access);
        assert!(!decision.trial_expired);
    }

    #[test]
    fn test_expired_basic_subscription_is_a_hard_cliff() {
        let now = Utc::now();
        let mut p = profile(SubscriptionPlan::Basic);
        p.subscription_expires_at = Some(now - Duration::seconds(1));

        let decision = evaluate(&settings(true), Some(&p), now);

        assert!(!decision.is_active);
        assert!(!decision.has_basic_access);
        assert!(decision.trial_expired);
    }

    #[test]
    fn test_lapsed_trial_with_active_pro_plan() {
        let now = Utc::now();
        let mut p = profile(SubscriptionPlan::Pro);
        p.trial_ends_at = Some(now - Duration::seconds(1));
        p.subscription_expires_at = Some(now + Duration::days(1));

        let decision = evaluate(&settings(true), Some(&p), now);

        assert!(!decision.is_in_trial);
        assert!(decision.has_pro_access);
        assert!(decision.is_active);
        assert!(!decision.trial_expired);
    }

    #[test]
    fn test_missing_trial_never_counts_as_active() {
        let decision = evaluate(
            &settings(true),
            Some(&profile(SubscriptionPlan::Free)),
            Utc::now(),
        );

        assert!(!decision.is_in_trial);
        assert!(decision.trial_expired);
    }

    #[test]
    fn test_trial_days_round_up() {
        let now = Utc::now();
        let mut p = profile(SubscriptionPlan::Free);

        // Any remaining sliver reports one day.
        p.trial_ends_at = Some(now + Duration::seconds(30));
        assert_eq!(
            evaluate(&settings(true), Some(&p), now).trial_days_remaining,
            1
        );

        // Even a sub-second remainder: still in trial, still one day.
        p.trial_ends_at = Some(now + Duration::milliseconds(500));
        let d = evaluate(&settings(true), Some(&p), now);
        assert!(d.is_in_trial);
        assert_eq!(d.trial_days_remaining, 1);

        // One day plus a second rounds up to two.
        p.trial_ends_at = Some(now + Duration::days(1) + Duration::seconds(1));
        assert_eq!(
            evaluate(&settings(true), Some(&p), now).trial_days_remaining,
            2
        );
    }

    #[test]
    fn test_tier_monotonicity() {
        let now = Utc::now();
        for plan in [
            SubscriptionPlan::Free,
            SubscriptionPlan::Basic,
            SubscriptionPlan::Pro,
            SubscriptionPlan::ProPlus,
            SubscriptionPlan::Lifetime,
        ] {
            for trial in [None, Some(now + Duration::days(1)), Some(now - Duration::days(1))] {
                for expiry in [None, Some(now + Duration::days(1)), Some(now - Duration::days(1))]
                {
                    let mut p = profile(plan);
                    p.trial_ends_at = trial;
                    p.subscription_expires_at = expiry;
                    let d = evaluate(&settings(true), Some(&p), now);

                    // pro implies basic implies active
                    assert!(!d.has_pro_access || d.has_basic_access);
                    assert!(!d.has_basic_access || d.is_active);
                    assert_eq!(d.has_basic_access, d.is_active);
                }
            }
        }
    }
}
