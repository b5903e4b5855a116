//! Decoded-picture format definitions

use serde::{Deserialize, Serialize};
use std::fmt;

/// Pixel formats a decoder hands to the pacing engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PixelFormat {
    /// NV12 semi-planar format (Y plane + interleaved UV)
    Nv12,
    /// YUV420 planar format
    Yuv420,
    /// YUV444 planar format
    Yuv444,
    /// P010 semi-planar 10-bit format (HDR streams)
    P010,
    /// RGBA format (4 bytes per pixel)
    Rgba,
    /// BGRA format (4 bytes per pixel)
    Bgra,
    /// RGB24 format (3 bytes per pixel)
    Rgb24,
}

impl PixelFormat {
    /// Get bytes per pixel for packed formats
    /// Returns None for planar formats
    pub fn bytes_per_pixel(&self) -> Option<usize> {
        match self {
            PixelFormat::Nv12 | PixelFormat::Yuv420 | PixelFormat::Yuv444 | PixelFormat::P010 => {
                None
            }
            PixelFormat::Rgba | PixelFormat::Bgra => Some(4),
            PixelFormat::Rgb24 => Some(3),
        }
    }

    /// Calculate expected frame size for a given resolution
    pub fn frame_size(&self, resolution: Resolution) -> usize {
        let pixels = resolution.pixel_count();
        match self {
            PixelFormat::Nv12 | PixelFormat::Yuv420 => pixels * 3 / 2,
            PixelFormat::Yuv444 => pixels * 3,
            PixelFormat::P010 => pixels * 3,
            PixelFormat::Rgba | PixelFormat::Bgra => pixels * 4,
            PixelFormat::Rgb24 => pixels * 3,
        }
    }

    /// Check if format carries more than 8 bits per sample
    pub fn is_high_bit_depth(&self) -> bool {
        matches!(self, PixelFormat::P010)
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PixelFormat::Nv12 => "NV12",
            PixelFormat::Yuv420 => "YUV420",
            PixelFormat::Yuv444 => "YUV444",
            PixelFormat::P010 => "P010",
            PixelFormat::Rgba => "RGBA",
            PixelFormat::Bgra => "BGRA",
            PixelFormat::Rgb24 => "RGB24",
        };
        write!(f, "{}", name)
    }
}

/// Picture resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    /// 1280x720
    pub const HD720: Resolution = Resolution {
        width: 1280,
        height: 720,
    };
    /// 1920x1080
    pub const HD1080: Resolution = Resolution {
        width: 1920,
        height: 1080,
    };
    /// 3840x2160
    pub const UHD4K: Resolution = Resolution {
        width: 3840,
        height: 2160,
    };

    /// Create a new resolution
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Total pixel count
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_size() {
        let res = Resolution::new(4, 2);
        assert_eq!(PixelFormat::Nv12.frame_size(res), 12);
        assert_eq!(PixelFormat::Yuv444.frame_size(res), 24);
        assert_eq!(PixelFormat::Rgba.frame_size(res), 32);
        assert_eq!(PixelFormat::Rgb24.frame_size(res), 24);
    }

    #[test]
    fn test_bytes_per_pixel() {
        assert_eq!(PixelFormat::Nv12.bytes_per_pixel(), None);
        assert_eq!(PixelFormat::Bgra.bytes_per_pixel(), Some(4));
        assert_eq!(PixelFormat::Rgb24.bytes_per_pixel(), Some(3));
    }

    #[test]
    fn test_display() {
        assert_eq!(Resolution::HD1080.to_string(), "1920x1080");
        assert_eq!(PixelFormat::P010.to_string(), "P010");
    }
}
