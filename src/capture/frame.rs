use std::time::Instant;

use serde::{Deserialize, Serialize};

/// An owned BGR frame
///
/// Pixel storage is 3-channel 8-bit BGR, row-major with `stride` bytes per
/// row. A frame is exclusively owned by whichever stage holds it; `Clone` is
/// a deep copy, and frames cross thread boundaries either by deep copy or by
/// freezing into an `Arc<Frame>` that is never written again.
#[derive(Clone)]
pub struct Frame {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Bytes per row; `>= width * 3`
    pub stride: u32,
    pub sequence: u64,
    /// Capture timestamp for latency tracking
    pub timestamp: Instant,
}

impl Frame {
    /// Frame from a tightly packed BGR buffer (`stride == width * 3`)
    pub fn from_bgr(data: Vec<u8>, width: u32, height: u32, sequence: u64) -> Self {
        debug_assert_eq!(data.len(), (width * height * 3) as usize);
        Self {
            data,
            width,
            height,
            stride: width * 3,
            sequence,
            timestamp: Instant::now(),
        }
    }

    /// Zero-sized placeholder, e.g. for "nothing captured yet" paths
    pub fn empty() -> Self {
        Self {
            data: Vec::new(),
            width: 0,
            height: 0,
            stride: 0,
            sequence: 0,
            timestamp: Instant::now(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.data.is_empty()
    }

    /// Pixel row `y`, truncated to the visible `width * 3` bytes
    pub fn row(&self, y: usize) -> &[u8] {
        let start = y * self.stride as usize;
        &self.data[start..start + self.width as usize * 3]
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("stride", &self.stride)
            .field("sequence", &self.sequence)
            .field("bytes", &self.data.len())
            .finish()
    }
}

/// Pixel formats we read from capture devices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PixelFormat {
    Rgb24,
    Bgr24,
    Yuyv,
    Mjpeg,
}
