//! Capture-system abstraction and session lifetime.
//!
//! Everything the tools do is mediated by the motion-capture system:
//! profile loading, camera enumeration, camera settings and frame buffers.
//! This trait is the seam between the tools and whichever backend provides
//! those calls.

use super::camera::{CameraId, CameraInfo, CameraSettings};
use crate::capture::Frame;
use crate::retry::Transient;
use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors reported by the capture system.
#[derive(Debug, Error)]
pub enum SdkError {
    /// The camera has not produced a frame yet. Retrying may succeed.
    #[error("no frame available")]
    NoFrame,
    #[error("profile file not found: {}", .0.display())]
    ProfileNotFound(PathBuf),
    #[error("invalid profile {}: {reason}", .path.display())]
    InvalidProfile { path: PathBuf, reason: String },
    #[error("unknown camera: {0}")]
    UnknownCamera(CameraId),
    #[error("invalid camera setting: {0}")]
    InvalidSetting(String),
    #[error("capture system returned invalid UTF-8 text: {0}")]
    InvalidText(#[from] std::string::FromUtf8Error),
    #[error("capture system session is shut down")]
    ShutDown,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Transient for SdkError {
    fn is_transient(&self) -> bool {
        matches!(self, SdkError::NoFrame)
    }
}

/// Operations the tools need from the motion-capture system.
pub trait CaptureSystem {
    /// Loads a profile, replacing the current camera setup.
    fn load_profile(&mut self, path: &Path) -> Result<(), SdkError>;

    /// Writes the current camera setup as a profile.
    fn save_profile(&mut self, path: &Path) -> Result<(), SdkError>;

    /// Advances the system by one processing step, refreshing frame buffers.
    fn update(&mut self) -> Result<(), SdkError>;

    /// Lists the cameras known to the session, in system order.
    fn cameras(&self) -> Result<Vec<CameraInfo>, SdkError>;

    /// Reads the live settings of a camera.
    fn camera_settings(&self, id: CameraId) -> Result<CameraSettings, SdkError>;

    /// Applies settings to a camera.
    fn apply_settings(&mut self, id: CameraId, settings: &CameraSettings) -> Result<(), SdkError>;

    /// Returns the most recent frame of a camera.
    ///
    /// Fails with [`SdkError::NoFrame`] while no frame is available.
    fn frame_buffer(&mut self, id: CameraId) -> Result<Frame, SdkError>;

    /// Ends the session and releases the system.
    fn shutdown(&mut self) -> Result<(), SdkError>;
}

/// Scoped capture-system session.
///
/// Shuts the system down exactly once: either through [`Session::shutdown`]
/// or, on any other exit path, when the session is dropped.
pub struct Session<S: CaptureSystem> {
    system: S,
    active: bool,
}

impl<S: CaptureSystem> Session<S> {
    /// Takes ownership of a running system.
    pub fn open(system: S) -> Self {
        tracing::debug!("Capture system session opened");
        Self {
            system,
            active: true,
        }
    }

    /// Shuts the session down, reporting any failure.
    pub fn shutdown(mut self) -> Result<(), SdkError> {
        self.close()
    }

    fn close(&mut self) -> Result<(), SdkError> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        tracing::info!("Shutting down capture system");
        self.system.shutdown()
    }
}

impl<S: CaptureSystem> Deref for Session<S> {
    type Target = S;

    fn deref(&self) -> &S {
        &self.system
    }
}

impl<S: CaptureSystem> DerefMut for Session<S> {
    fn deref_mut(&mut self) -> &mut S {
        &mut self.system
    }
}

impl<S: CaptureSystem> Drop for Session<S> {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            tracing::warn!(error = %e, "Capture system shutdown failed");
        }
    }
}
