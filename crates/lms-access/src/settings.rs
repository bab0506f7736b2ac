//! Application Settings Snapshot

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Process-wide feature flags consumed by the access policy.
///
/// Snapshots are taken per evaluation; the evaluator never reads ambient
/// global state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    /// Global kill switch: when false, every user has full access and the
    /// per-user policy is bypassed entirely.
    pub paid_features_enabled: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            paid_features_enabled: true,
        }
    }
}

/// Settings store
///
/// Holds the current settings snapshot. An admin write replaces the
/// snapshot; readers always see a complete, consistent value.
pub struct SettingsStore {
    current: Arc<RwLock<AppSettings>>,
}

impl SettingsStore {
    /// Create a store with the given initial snapshot
    pub fn new(initial: AppSettings) -> Self {
        Self {
            current: Arc::new(RwLock::new(initial)),
        }
    }

    /// Current snapshot
    pub fn snapshot(&self) -> AppSettings {
        self.current.read().clone()
    }

    /// Admin write: replace the snapshot
    pub fn update(&self, settings: AppSettings) {
        tracing::info!(
            paid_features_enabled = settings.paid_features_enabled,
            "Settings updated"
        );
        *self.current.write() = settings;
    }
}

impl Default for SettingsStore {
    fn default() -> Self {
        Self::new(AppSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_replaced_on_update() {
        let store = SettingsStore::default();
        assert!(store.snapshot().paid_features_enabled);

        store.update(AppSettings {
            paid_features_enabled: false,
        });
        assert!(!store.snapshot().paid_features_enabled);
    }
}
