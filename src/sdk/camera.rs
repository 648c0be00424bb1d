//! Camera identity and settings as exposed by the capture system.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Index of a camera within the current capture-system session.
///
/// Indices follow the enumeration order of the system and are only
/// meaningful for the session that produced them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CameraId(pub usize);

impl fmt::Display for CameraId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "camera[{}]", self.0)
    }
}

/// Sensor resolution in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Resolution {
    /// Creates a resolution of `width` x `height` pixels.
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Number of pixels in a full frame.
    #[inline]
    pub fn pixel_count(&self) -> usize {
        (self.width as usize) * (self.height as usize)
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Processing mode of a camera, using the capture system's numeric codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoType {
    /// Segment mode (0).
    Segment,
    /// Raw grayscale (1).
    Grayscale,
    /// Object mode (2).
    Object,
    /// Precision mode (4).
    Precision,
    /// Motion-JPEG (6).
    Mjpeg,
    /// Color H.264 (9).
    ColorH264,
}

impl VideoType {
    /// Numeric code used by the capture system.
    pub fn code(self) -> i32 {
        match self {
            VideoType::Segment => 0,
            VideoType::Grayscale => 1,
            VideoType::Object => 2,
            VideoType::Precision => 4,
            VideoType::Mjpeg => 6,
            VideoType::ColorH264 => 9,
        }
    }

    /// Maps a numeric code back to a video type.
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(VideoType::Segment),
            1 => Some(VideoType::Grayscale),
            2 => Some(VideoType::Object),
            4 => Some(VideoType::Precision),
            6 => Some(VideoType::Mjpeg),
            9 => Some(VideoType::ColorH264),
            _ => None,
        }
    }
}

/// Descriptive, read-only facts about one camera.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraInfo {
    /// Index in the current session.
    pub id: CameraId,
    /// Display name reported by the system, e.g. `Prime 13 #11000`.
    pub name: String,
    /// Serial number.
    pub serial: u32,
}

/// Live, mutable settings of one camera.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraSettings {
    /// Frames per second.
    pub frame_rate: u32,
    /// Processing mode.
    pub video_type: VideoType,
    /// Exposure time in microseconds.
    pub exposure: u32,
    /// Threshold value, 0-255.
    pub threshold: u8,
    /// IR illumination intensity, 0-15.
    pub intensity: u8,
    /// Imager gain level; 8 is the maximum on current hardware.
    pub image_gain: u8,
    /// Whether the IR filter switch is engaged.
    pub filter_switch: bool,
    /// Sensor resolution; fixed by the hardware.
    pub resolution: Resolution,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            frame_rate: 120,
            video_type: VideoType::Object,
            exposure: 250,
            threshold: 200,
            intensity: 15,
            image_gain: 1,
            filter_switch: true,
            resolution: Resolution::new(1280, 1024),
        }
    }
}
