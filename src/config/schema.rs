//! Adaptive pacing configuration schema

use serde::{Deserialize, Serialize};

/// Smallest pacing-queue depth an adaptive configuration may select
pub const MIN_QUEUE_DEPTH: usize = 1;
/// Largest pacing-queue depth an adaptive configuration may select
pub const MAX_QUEUE_DEPTH: usize = 5;
/// Queue depth enforced when adaptive pacing is not active
pub const DEFAULT_QUEUE_DEPTH: usize = 3;
/// Largest input buffering budget in milliseconds
pub const MAX_INPUT_BUFFER_MS: u32 = 50;

/// Maximum number of frames the engine can own for a given queue depth:
/// the pacing queue itself, one frame in flight to the renderer, and
/// one frame in the deferred-free slot. Decoders size their frame pool
/// from this bound.
pub const fn max_outstanding_frames(queue_depth: usize) -> usize {
    queue_depth + 1 + 1
}

/// Frame drop policy when the pacing queue is full
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameDropPolicy {
    /// Evict the oldest queued frame (lowest latency)
    #[default]
    DropOldest,
    /// Discard the incoming frame (preserve buffered continuity)
    DropNewest,
    /// Re-present the last rendered frame on producer stall (smoothness
    /// priority). Queue overflow under this policy still evicts the
    /// oldest frame; repetition is a stall-path substitute, not an
    /// overflow response.
    RepeatLast,
}

/// Network quality preset
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkPreset {
    /// Minimal buffering, lowest latency
    Lan,
    /// Moderate buffering (default)
    #[default]
    Wifi,
    /// Maximum buffering, smoothness priority
    PoorInternet,
}

/// Adaptive pacing configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdaptiveConfig {
    /// Whether adaptive pacing is enabled
    pub enabled: bool,
    /// Network quality preset
    pub network_preset: NetworkPreset,
    /// Drop policy when the pacing queue is full
    pub frame_drop_policy: FrameDropPolicy,
    /// Pacing queue depth (1-5)
    pub frame_queue_depth: usize,
    /// Re-present the last rendered frame when the producer stalls
    pub enable_frame_repetition: bool,
    /// Coalesce input events into the frame cadence
    pub enable_input_coalescing: bool,
    /// Input buffering budget in milliseconds (0-50)
    pub input_buffer_ms: u32,
}

impl Default for AdaptiveConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            network_preset: NetworkPreset::Wifi,
            frame_drop_policy: FrameDropPolicy::DropOldest,
            frame_queue_depth: DEFAULT_QUEUE_DEPTH,
            enable_frame_repetition: false,
            enable_input_coalescing: false,
            input_buffer_ms: 0,
        }
    }
}

impl AdaptiveConfig {
    /// Clamp out-of-range values to their valid bounds
    ///
    /// Applied on every load and store update, so persisted values
    /// edited out of range never reach the queue engine.
    pub fn clamp(&mut self) {
        self.frame_queue_depth = self
            .frame_queue_depth
            .clamp(MIN_QUEUE_DEPTH, MAX_QUEUE_DEPTH);
        self.input_buffer_ms = self.input_buffer_ms.min(MAX_INPUT_BUFFER_MS);
    }

    /// Copy of this configuration with values clamped
    pub fn clamped(mut self) -> Self {
        self.clamp();
        self
    }

    /// Apply a network preset, rewriting the dependent fields
    pub fn apply_network_preset(&mut self, preset: NetworkPreset) {
        self.network_preset = preset;

        match preset {
            NetworkPreset::Lan => {
                self.frame_queue_depth = 1;
                self.frame_drop_policy = FrameDropPolicy::DropOldest;
                self.enable_frame_repetition = false;
                self.enable_input_coalescing = false;
                self.input_buffer_ms = 0;
            }
            NetworkPreset::Wifi => {
                self.frame_queue_depth = 3;
                self.frame_drop_policy = FrameDropPolicy::DropOldest;
                self.enable_frame_repetition = false;
                self.enable_input_coalescing = false;
                self.input_buffer_ms = 0;
            }
            NetworkPreset::PoorInternet => {
                self.frame_queue_depth = 5;
                self.frame_drop_policy = FrameDropPolicy::RepeatLast;
                self.enable_frame_repetition = true;
                self.enable_input_coalescing = true;
                // ~1 frame at 60fps
                self.input_buffer_ms = 16;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AdaptiveConfig::default();
        assert!(!config.enabled);
        assert_eq!(config.network_preset, NetworkPreset::Wifi);
        assert_eq!(config.frame_drop_policy, FrameDropPolicy::DropOldest);
        assert_eq!(config.frame_queue_depth, DEFAULT_QUEUE_DEPTH);
        assert!(!config.enable_frame_repetition);
        assert_eq!(config.input_buffer_ms, 0);
    }

    #[test]
    fn test_preset_lan() {
        // Start from a dirty state so the preset must rewrite everything
        let mut config = AdaptiveConfig {
            frame_queue_depth: 5,
            frame_drop_policy: FrameDropPolicy::RepeatLast,
            enable_frame_repetition: true,
            enable_input_coalescing: true,
            input_buffer_ms: 40,
            ..Default::default()
        };
        config.apply_network_preset(NetworkPreset::Lan);

        assert_eq!(config.network_preset, NetworkPreset::Lan);
        assert_eq!(config.frame_queue_depth, 1);
        assert_eq!(config.frame_drop_policy, FrameDropPolicy::DropOldest);
        assert!(!config.enable_frame_repetition);
        assert!(!config.enable_input_coalescing);
        assert_eq!(config.input_buffer_ms, 0);
    }

    #[test]
    fn test_preset_wifi() {
        let mut config = AdaptiveConfig::default();
        config.apply_network_preset(NetworkPreset::PoorInternet);
        config.apply_network_preset(NetworkPreset::Wifi);

        assert_eq!(config.frame_queue_depth, 3);
        assert_eq!(config.frame_drop_policy, FrameDropPolicy::DropOldest);
        assert!(!config.enable_frame_repetition);
        assert!(!config.enable_input_coalescing);
        assert_eq!(config.input_buffer_ms, 0);
    }

    #[test]
    fn test_preset_poor_internet() {
        let mut config = AdaptiveConfig::default();
        config.apply_network_preset(NetworkPreset::PoorInternet);

        assert_eq!(config.frame_queue_depth, 5);
        assert_eq!(config.frame_drop_policy, FrameDropPolicy::RepeatLast);
        assert!(config.enable_frame_repetition);
        assert!(config.enable_input_coalescing);
        assert_eq!(config.input_buffer_ms, 16);
    }

    #[test]
    fn test_clamp_queue_depth() {
        let low = AdaptiveConfig {
            frame_queue_depth: 0,
            ..Default::default()
        }
        .clamped();
        assert_eq!(low.frame_queue_depth, 1);

        let high = AdaptiveConfig {
            frame_queue_depth: 9,
            ..Default::default()
        }
        .clamped();
        assert_eq!(high.frame_queue_depth, 5);
    }

    #[test]
    fn test_clamp_input_buffer() {
        let config = AdaptiveConfig {
            input_buffer_ms: 200,
            ..Default::default()
        }
        .clamped();
        assert_eq!(config.input_buffer_ms, 50);
    }

    #[test]
    fn test_outstanding_frames_bound() {
        assert_eq!(max_outstanding_frames(1), 3);
        assert_eq!(max_outstanding_frames(DEFAULT_QUEUE_DEPTH), 5);
        assert_eq!(max_outstanding_frames(MAX_QUEUE_DEPTH), 7);
    }

    #[test]
    fn test_serde_round_trip() {
        let mut config = AdaptiveConfig::default();
        config.enabled = true;
        config.apply_network_preset(NetworkPreset::PoorInternet);

        let json = serde_json::to_string(&config).unwrap();
        let parsed: AdaptiveConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_serde_missing_fields_default() {
        let parsed: AdaptiveConfig = serde_json::from_str("{\"enabled\":true}").unwrap();
        assert!(parsed.enabled);
        assert_eq!(parsed.frame_queue_depth, DEFAULT_QUEUE_DEPTH);
        assert_eq!(parsed.network_preset, NetworkPreset::Wifi);
    }
}
