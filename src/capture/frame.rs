//! Frame data structures for captured camera content

use std::time::Instant;

use crate::selection::CropRect;

/// A captured frame from the camera, tightly packed RGB8
#[derive(Debug, Clone)]
pub struct CapturedFrame {
    /// Raw RGB pixel data (3 bytes per pixel, row-major)
    pub data: Vec<u8>,
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Timestamp when frame was captured
    pub timestamp: Instant,
}

impl CapturedFrame {
    /// Create a new captured frame
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            data,
            width,
            height,
            timestamp: Instant::now(),
        }
    }

    /// Get frame dimensions as (width, height)
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Extract a sub-rectangle of the frame as a new frame.
    ///
    /// The rectangle is clamped to the frame bounds, so a rectangle that
    /// hangs over an edge yields the intersection rather than an error.
    pub fn crop(&self, rect: &CropRect) -> CapturedFrame {
        let x = rect.x.min(self.width);
        let y = rect.y.min(self.height);
        let width = rect.width.min(self.width - x);
        let height = rect.height.min(self.height - y);

        let mut region = Vec::with_capacity((width * height * 3) as usize);
        for row in y..(y + height) {
            let start = ((row * self.width + x) * 3) as usize;
            let end = start + (width * 3) as usize;
            if end <= self.data.len() {
                region.extend_from_slice(&self.data[start..end]);
            }
        }

        CapturedFrame {
            data: region,
            width,
            height,
            timestamp: self.timestamp,
        }
    }
}
