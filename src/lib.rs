//! framepacer - Real-time frame pacing for low-latency streaming clients
//!
//! This crate reconciles an irregular, bursty stream of decoded video
//! frames with a fixed-rate display refresh signal. Frames are
//! buffered in a small bounded queue, promoted on vsync ticks, and
//! drawn with a one-cycle deferred free; a configurable drop policy
//! absorbs overload and an optional repetition path absorbs producer
//! stalls. Buffering strategy adapts to live network conditions
//! through a settings store the embedding application controls.

pub mod config;
pub mod error;
pub mod stats;
pub mod utils;
pub mod video;

pub use error::{PacerError, Result};
pub use video::{
    Pacer, PacerState, Renderer, RendererAttributes, VideoFrame, VsyncProvider, VsyncTicker,
};
