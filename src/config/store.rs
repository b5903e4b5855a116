//! In-memory adaptive settings store

use arc_swap::ArcSwap;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::debug;

use super::schema::{AdaptiveConfig, NetworkPreset};

/// Change channel capacity (ring buffer size)
const CHANGE_CHANNEL_CAPACITY: usize = 16;

/// Settings change notification
///
/// Consumed by UI layers and by the persistence collaborator, which
/// writes the new snapshot back to durable storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsChange {
    /// A network preset rewrote the dependent fields
    PresetApplied(NetworkPreset),
    /// The configuration was replaced wholesale
    Updated,
}

/// Adaptive settings store
///
/// Uses `ArcSwap` for lock-free snapshot reads, so the queue engine can
/// consult the configuration on hot paths without contending with the
/// single writer. The embedding application seeds the store from its
/// durable configuration at startup and subscribes for changes to
/// persist.
pub struct SettingsStore {
    /// Lock-free snapshot cache
    cache: ArcSwap<AdaptiveConfig>,
    change_tx: broadcast::Sender<SettingsChange>,
}

impl SettingsStore {
    /// Create a store seeded with `config`
    ///
    /// Out-of-range values are clamped before the snapshot is published.
    pub fn new(config: AdaptiveConfig) -> Self {
        let (change_tx, _rx) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            cache: ArcSwap::from_pointee(config.clamped()),
            change_tx,
        }
    }

    /// Current configuration snapshot (lock-free)
    pub fn snapshot(&self) -> Arc<AdaptiveConfig> {
        self.cache.load_full()
    }

    /// Replace the configuration wholesale
    pub fn update(&self, config: AdaptiveConfig) {
        self.cache.store(Arc::new(config.clamped()));
        // If there are no subscribers, send returns Err which is normal
        let _ = self.change_tx.send(SettingsChange::Updated);
    }

    /// Apply a network preset to the current configuration
    pub fn apply_network_preset(&self, preset: NetworkPreset) {
        let mut config = (*self.cache.load_full()).clone();
        config.apply_network_preset(preset);
        config.clamp();
        self.cache.store(Arc::new(config));
        let _ = self.change_tx.send(SettingsChange::PresetApplied(preset));
        debug!(?preset, "Applied network preset");
    }

    /// Subscribe to change notifications
    pub fn subscribe(&self) -> broadcast::Receiver<SettingsChange> {
        self.change_tx.subscribe()
    }
}

impl Default for SettingsStore {
    fn default() -> Self {
        Self::new(AdaptiveConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::FrameDropPolicy;

    #[test]
    fn test_snapshot_reflects_seed() {
        let store = SettingsStore::new(AdaptiveConfig {
            enabled: true,
            ..Default::default()
        });
        assert!(store.snapshot().enabled);
    }

    #[test]
    fn test_clamps_on_new_and_update() {
        let store = SettingsStore::new(AdaptiveConfig {
            frame_queue_depth: 9,
            ..Default::default()
        });
        assert_eq!(store.snapshot().frame_queue_depth, 5);

        store.update(AdaptiveConfig {
            frame_queue_depth: 0,
            input_buffer_ms: 200,
            ..Default::default()
        });
        let snapshot = store.snapshot();
        assert_eq!(snapshot.frame_queue_depth, 1);
        assert_eq!(snapshot.input_buffer_ms, 50);
    }

    #[test]
    fn test_preset_application_notifies() {
        let store = SettingsStore::default();
        let mut rx = store.subscribe();

        store.apply_network_preset(NetworkPreset::PoorInternet);

        let snapshot = store.snapshot();
        assert_eq!(snapshot.frame_queue_depth, 5);
        assert_eq!(snapshot.frame_drop_policy, FrameDropPolicy::RepeatLast);
        assert_eq!(
            rx.try_recv().unwrap(),
            SettingsChange::PresetApplied(NetworkPreset::PoorInternet)
        );
    }

    #[test]
    fn test_update_notifies() {
        let store = SettingsStore::default();
        let mut rx = store.subscribe();

        store.update(AdaptiveConfig::default());

        assert_eq!(rx.try_recv().unwrap(), SettingsChange::Updated);
    }
}
