use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, RwLock, RwLockReadGuard};

use serde_json::Value as JsonValue;

use super::snapshot::ConfigurationSnapshot;

/// The process-wide configuration, shared between readers and the reloader.
///
/// Readers see either the complete old resources or the complete new ones.
/// Built from a seeded or loaded snapshot, so the built-in resources are
/// always visible.
#[derive(Debug, Clone)]
pub struct LiveConfig {
    inner: Arc<RwLock<ConfigurationSnapshot>>,
}

impl LiveConfig {
    pub fn new(snapshot: ConfigurationSnapshot) -> Self {
        Self {
            inner: Arc::new(RwLock::new(snapshot)),
        }
    }

    /// Read access to the current snapshot.
    ///
    /// A lock poisoned by a panicking writer still holds a complete snapshot,
    /// since the writer only ever swaps whole collections.
    pub fn read(&self) -> RwLockReadGuard<'_, ConfigurationSnapshot> {
        self.inner.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// A copy of the current snapshot.
    pub fn snapshot(&self) -> ConfigurationSnapshot {
        self.read().clone()
    }

    pub fn config_paths(&self) -> Vec<PathBuf> {
        self.read().config_paths.clone()
    }

    pub fn notifier_value_map(&self) -> HashMap<String, JsonValue> {
        self.read().notifier_value_map()
    }

    /// Swaps in the resources of `next`, keeping the directory list.
    pub(crate) fn publish(&self, next: ConfigurationSnapshot) {
        let mut guard = self
            .inner
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        guard.update_resources(next);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::BuiltinCatalog;
    use crate::resource::{CredentialConfig, CredentialType};
    use std::thread;

    #[test]
    fn test_new_live_config_exposes_defaults() {
        let seeded =
            ConfigurationSnapshot::seeded(vec![PathBuf::from("/cfg")], &BuiltinCatalog::new())
                .unwrap();
        let live = LiveConfig::new(seeded);

        let snapshot = live.snapshot();
        assert!(snapshot.credentials.contains_key("aws.default"));
        assert!(snapshot.pipeling_connections.contains_key("aws.default"));
        assert!(live.notifier_value_map().contains_key("default"));
    }

    #[test]
    fn test_publish_swaps_resources() {
        let live = LiveConfig::new(ConfigurationSnapshot::empty(vec![PathBuf::from("/cfg")]));
        let reader = live.clone();

        let mut next = ConfigurationSnapshot::empty(Vec::new());
        let credential = CredentialConfig::empty(CredentialType::Slack).into_credential("ops");
        next.credentials
            .insert(credential.name().to_string(), credential);
        live.publish(next);

        assert!(reader.read().credentials.contains_key("slack.ops"));
        assert_eq!(reader.config_paths(), vec![PathBuf::from("/cfg")]);
    }

    #[test]
    fn test_concurrent_readers_see_whole_snapshots() {
        let live = LiveConfig::new(ConfigurationSnapshot::empty(Vec::new()));
        let writer = live.clone();

        let handle = thread::spawn(move || {
            for i in 0..50 {
                let mut next = ConfigurationSnapshot::empty(Vec::new());
                for kind in [CredentialType::Aws, CredentialType::Gcp] {
                    let credential =
                        CredentialConfig::empty(kind).into_credential(&format!("c{}", i));
                    next.credentials
                        .insert(credential.name().to_string(), credential);
                }
                writer.publish(next);
            }
        });

        for _ in 0..200 {
            let count = live.read().credentials.len();
            assert!(count == 0 || count == 2, "partial snapshot with {} credentials", count);
        }
        handle.join().unwrap();
    }
}
