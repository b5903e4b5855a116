//! Decoded frame handle
//!
//! A [`VideoFrame`] is owned by exactly one holder at any instant: the
//! decoder, one pacing-queue slot, the render-queue slot, the renderer
//! invocation in flight, or the deferred-free slot. The type is
//! deliberately not `Clone`; ownership moves across each boundary and
//! the buffer is released by the normal `Drop` exactly once.

use bytes::Bytes;
use std::time::{Duration, Instant};

use super::format::{PixelFormat, Resolution};

/// A decoded video frame with presentation metadata
#[derive(Debug)]
pub struct VideoFrame {
    /// Decoded pixel data
    data: Bytes,
    /// Picture resolution
    pub resolution: Resolution,
    /// Pixel format
    pub format: PixelFormat,
    /// Stride (bytes per line of the first plane)
    pub stride: u32,
    /// Frame sequence number assigned by the decoder
    pub sequence: u64,
    /// Presentation timestamp relative to stream start
    pub pts: Duration,
    /// When the decoder produced this frame
    pub decode_ts: Instant,
}

impl VideoFrame {
    /// Create a new frame
    pub fn new(
        data: Bytes,
        resolution: Resolution,
        format: PixelFormat,
        stride: u32,
        sequence: u64,
        pts: Duration,
    ) -> Self {
        Self {
            data,
            resolution,
            format,
            stride,
            sequence,
            pts,
            decode_ts: Instant::now(),
        }
    }

    /// Create a frame from a Vec<u8>
    pub fn from_vec(
        data: Vec<u8>,
        resolution: Resolution,
        format: PixelFormat,
        stride: u32,
        sequence: u64,
        pts: Duration,
    ) -> Self {
        Self::new(Bytes::from(data), resolution, format, stride, sequence, pts)
    }

    /// Get frame data as bytes slice
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Get data length
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the pixel buffer is empty
    ///
    /// An empty buffer marks an invalid handle; the pacer rejects such
    /// frames at submission.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get width
    pub fn width(&self) -> u32 {
        self.resolution.width
    }

    /// Get height
    pub fn height(&self) -> u32 {
        self.resolution.height
    }

    /// Get age of this frame (time since decode)
    pub fn age(&self) -> Duration {
        self.decode_ts.elapsed()
    }
}

/// Frame metadata without pixel data (for logging/stats)
#[derive(Debug, Clone)]
pub struct FrameMeta {
    pub resolution: Resolution,
    pub format: PixelFormat,
    pub size: usize,
    pub sequence: u64,
    pub pts: Duration,
}

impl From<&VideoFrame> for FrameMeta {
    fn from(frame: &VideoFrame) -> Self {
        Self {
            resolution: frame.resolution,
            format: frame.format,
            size: frame.len(),
            sequence: frame.sequence,
            pts: frame.pts,
        }
    }
}
