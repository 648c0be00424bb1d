//! Frame buffer snapshot.

use crate::sdk::Resolution;

/// One grayscale image taken from a camera's frame buffer.
///
/// Frames are transient: they live for one iteration of the capture loop
/// and are not retained by the system.
#[derive(Clone)]
pub struct Frame {
    /// Row-major 8-bit grayscale pixels.
    pixels: Vec<u8>,
    width: u32,
    height: u32,
    /// Update step of the capture system that produced the frame.
    sequence: u64,
}

impl Frame {
    /// Wraps a row-major grayscale buffer of `width` x `height` pixels.
    pub fn new(pixels: Vec<u8>, width: u32, height: u32, sequence: u64) -> Self {
        Self {
            pixels,
            width,
            height,
            sequence,
        }
    }

    /// Raw pixel data.
    #[inline]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Frame width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Frame height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Frame dimensions.
    #[inline]
    pub fn resolution(&self) -> Resolution {
        Resolution::new(self.width, self.height)
    }

    /// Update step that produced the frame.
    #[inline]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Returns true if the pixel buffer matches the dimensions.
    pub fn is_valid(&self) -> bool {
        self.pixels.len() == self.resolution().pixel_count()
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("sequence", &self.sequence)
            .field("pixel_bytes", &self.pixels.len())
            .finish()
    }
}
