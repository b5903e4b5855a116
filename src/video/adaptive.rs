//! Adaptive pacing control
//!
//! Maps the user's network-quality configuration onto the live pacing
//! parameters the queue engine enforces. The adaptive capability is
//! resolved at pacer construction: without a settings store the
//! controller always yields the fixed defaults.

use std::sync::Arc;
use std::time::Duration;

use crate::config::schema::{FrameDropPolicy, DEFAULT_QUEUE_DEPTH};
use crate::config::{AdaptiveConfig, SettingsStore};

/// Live pacing parameters enforced by the queue engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacingParams {
    /// Pacing-queue capacity for subsequent submits
    pub queue_depth: usize,
    /// Policy run when a submit finds the queue full
    pub drop_policy: FrameDropPolicy,
    /// Re-present the last rendered frame on producer stall
    pub frame_repetition: bool,
    /// Input coalescing hint, consumed by the input pipeline
    pub input_coalescing: bool,
    /// Input buffering budget
    pub input_buffer: Duration,
}

impl PacingParams {
    /// Fixed parameters used when the adaptive capability is absent
    pub fn fixed() -> Self {
        Self {
            queue_depth: DEFAULT_QUEUE_DEPTH,
            drop_policy: FrameDropPolicy::DropOldest,
            frame_repetition: false,
            input_coalescing: false,
            input_buffer: Duration::ZERO,
        }
    }

    /// Derive parameters from a clamped configuration snapshot
    pub fn from_config(config: &AdaptiveConfig) -> Self {
        Self {
            queue_depth: config.frame_queue_depth,
            drop_policy: config.frame_drop_policy,
            frame_repetition: config.enable_frame_repetition,
            input_coalescing: config.enable_input_coalescing,
            input_buffer: Duration::from_millis(u64::from(config.input_buffer_ms)),
        }
    }

    /// Producer-stall threshold for a given frame arrival interval
    ///
    /// Two missed arrival intervals plus the input buffering budget:
    /// one missed interval is ordinary network jitter, two means the
    /// producer has genuinely stopped delivering.
    pub fn stall_threshold(&self, frame_interval: Duration) -> Duration {
        frame_interval * 2 + self.input_buffer
    }
}

/// Maps the network-quality configuration onto pacing parameters
pub struct AdaptiveController {
    store: Option<Arc<SettingsStore>>,
}

impl AdaptiveController {
    /// Fixed-behavior controller (adaptive capability absent)
    pub fn fixed() -> Self {
        Self { store: None }
    }

    /// Adaptive controller bound to a settings store
    pub fn adaptive(store: Arc<SettingsStore>) -> Self {
        Self { store: Some(store) }
    }

    /// Check whether a settings store is attached
    pub fn is_adaptive(&self) -> bool {
        self.store.is_some()
    }

    /// Attach or replace the settings store
    pub fn attach_store(&mut self, store: Arc<SettingsStore>) {
        self.store = Some(store);
    }

    /// Current pacing parameters
    ///
    /// Returns the store-derived values when adaptive pacing is enabled
    /// in the configuration, the fixed defaults otherwise.
    pub fn current_params(&self) -> PacingParams {
        match &self.store {
            Some(store) => {
                let config = store.snapshot();
                if config.enabled {
                    PacingParams::from_config(&config)
                } else {
                    PacingParams::fixed()
                }
            }
            None => PacingParams::fixed(),
        }
    }
}

/// Runtime adaptive readback for UI overlays
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AdaptiveStatus {
    /// Queue depth currently enforced
    pub effective_queue_depth: usize,
    /// Whether the producer is currently considered stalled
    pub stall_detected: bool,
    /// Total stall-triggered frame repetitions
    pub frames_repeated: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NetworkPreset;

    #[test]
    fn test_fixed_controller_params() {
        let controller = AdaptiveController::fixed();
        assert!(!controller.is_adaptive());
        assert_eq!(controller.current_params(), PacingParams::fixed());
    }

    #[test]
    fn test_disabled_config_falls_back_to_fixed() {
        let store = Arc::new(SettingsStore::new(AdaptiveConfig {
            enabled: false,
            frame_queue_depth: 5,
            ..Default::default()
        }));
        let controller = AdaptiveController::adaptive(store);
        assert_eq!(controller.current_params(), PacingParams::fixed());
    }

    #[test]
    fn test_enabled_config_drives_params() {
        let store = Arc::new(SettingsStore::new(AdaptiveConfig {
            enabled: true,
            ..Default::default()
        }));
        store.apply_network_preset(NetworkPreset::PoorInternet);

        let controller = AdaptiveController::adaptive(store);
        let params = controller.current_params();
        assert_eq!(params.queue_depth, 5);
        assert_eq!(params.drop_policy, FrameDropPolicy::RepeatLast);
        assert!(params.frame_repetition);
        assert_eq!(params.input_buffer, Duration::from_millis(16));
    }

    #[test]
    fn test_stall_threshold() {
        let mut params = PacingParams::fixed();
        let interval = Duration::from_millis(10);
        assert_eq!(params.stall_threshold(interval), Duration::from_millis(20));

        params.input_buffer = Duration::from_millis(16);
        assert_eq!(params.stall_threshold(interval), Duration::from_millis(36));
    }
}
