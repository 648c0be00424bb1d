//! Access to the motion-capture system.
//!
//! The tools never talk to camera hardware directly. Profiles, camera
//! enumeration, camera settings and frame buffers all go through a
//! [`CaptureSystem`] implementation, held for the duration of a run by a
//! [`Session`] that guarantees a single shutdown.

mod camera;
mod output;
mod simulated;
mod system;

pub use camera::{CameraId, CameraInfo, CameraSettings, Resolution, VideoType};
pub use output::{decode_text, text_output};
pub use simulated::{SimulatedSystem, MAX_IMAGE_GAIN, MAX_INTENSITY};
pub use system::{CaptureSystem, SdkError, Session};
