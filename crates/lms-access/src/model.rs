//! User Profile & Subscription Data Model

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// User ID
pub type UserId = Uuid;

/// Subscription plan tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionPlan {
    /// No paid plan
    Free,
    /// Entry paid tier
    Basic,
    /// Pro tier
    Pro,
    /// Pro tier with add-ons; same access level as Pro
    ProPlus,
    /// One-time purchase, pro-level access
    Lifetime,
}

impl SubscriptionPlan {
    /// Any tier above Free
    pub fn is_paid(&self) -> bool {
        !matches!(self, Self::Free)
    }

    /// Tiers carrying pro-level entitlements
    pub fn is_pro(&self) -> bool {
        matches!(self, Self::Pro | Self::ProPlus | Self::Lifetime)
    }

    /// Display name used in notifications and invoicing text
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Basic => "basic",
            Self::Pro => "pro",
            Self::ProPlus => "pro_plus",
            Self::Lifetime => "lifetime",
        }
    }
}

impl std::fmt::Display for SubscriptionPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User profile, owned by the identity subsystem.
///
/// This engine reads all fields and writes only the subscription fields,
/// through the payment-confirmation path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    /// Identity-linked user ID
    pub user_id: UserId,
    /// Login email, matched case-insensitively by the teacher linker
    pub email: String,
    /// Current plan tier
    pub subscription_plan: SubscriptionPlan,
    /// End of the trial window, if one was granted
    pub trial_ends_at: Option<DateTime<Utc>>,
    /// Paid subscription expiry; `None` means no running subscription
    pub subscription_expires_at: Option<DateTime<Utc>>,
}

impl UserProfile {
    /// Create a free-plan profile with no trial
    pub fn new(user_id: UserId, email: &str) -> Self {
        Self {
            user_id,
            email: email.to_string(),
            subscription_plan: SubscriptionPlan::Free,
            trial_ends_at: None,
            subscription_expires_at: None,
        }
    }
}

/// Profile store
pub struct ProfileStore {
    profiles: Arc<RwLock<HashMap<UserId, UserProfile>>>,
}

impl ProfileStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            profiles: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Insert or replace a profile
    pub fn upsert(&self, profile: UserProfile) {
        self.profiles.write().insert(profile.user_id, profile);
    }

    /// Get profile by user ID
    pub fn get(&self, user_id: &UserId) -> Option<UserProfile> {
        self.profiles.read().get(user_id).cloned()
    }

    /// Apply a confirmed subscription to the profile.
    ///
    /// This is the write the payment-confirmation path must perform in the
    /// same call path as the `pending -> confirmed` transition.
    pub fn apply_subscription(
        &self,
        user_id: &UserId,
        plan: SubscriptionPlan,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<UserProfile, ProfileError> {
        let mut profiles = self.profiles.write();
        let profile = profiles.get_mut(user_id).ok_or(ProfileError::NotFound)?;

        profile.subscription_plan = plan;
        profile.subscription_expires_at = expires_at;

        Ok(profile.clone())
    }
}

impl Default for ProfileStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Profile error
#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    /// No profile for the user ID
    #[error("profile not found")]
    NotFound,
}
