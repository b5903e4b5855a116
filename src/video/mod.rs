//! Frame pacing module
//!
//! This module provides the pacing engine that schedules decoded video
//! frames onto the display refresh cadence, together with its frame,
//! renderer, and vsync-source contracts.

pub mod adaptive;
pub mod format;
pub mod frame;
pub mod pacer;
pub mod renderer;
pub mod vsync;

pub use adaptive::{AdaptiveController, AdaptiveStatus, PacingParams};
pub use format::{PixelFormat, Resolution};
pub use frame::{FrameMeta, VideoFrame};
pub use pacer::{Pacer, PacerState, VsyncTicker};
pub use renderer::{Renderer, RendererAttributes};
pub use vsync::{
    AsyncVsyncSource, SurfaceHandle, SyncVsyncSource, TimerVsyncSource, VsyncProvider,
};
