//! Adaptive streaming configuration
//!
//! The schema types model the user-facing adaptive settings; the store
//! holds the live in-memory snapshot. Durable persistence belongs to
//! the embedding application, which loads a snapshot at startup and
//! saves it back on change notifications.

pub mod schema;
pub mod store;

pub use schema::{
    max_outstanding_frames, AdaptiveConfig, FrameDropPolicy, NetworkPreset, DEFAULT_QUEUE_DEPTH,
    MAX_INPUT_BUFFER_MS, MAX_QUEUE_DEPTH, MIN_QUEUE_DEPTH,
};
pub use store::{SettingsChange, SettingsStore};
