//! In-process capture system.
//!
//! Stands in for the vendor library when it is not linked. Cameras come from
//! the `[simulation]` configuration or from a loaded profile; profiles are
//! stored as TOML. Frame buffers carry a deterministic grayscale pattern and
//! stay empty until the first [`CaptureSystem::update`].

use super::camera::{CameraId, CameraInfo, CameraSettings, Resolution};
use super::output::text_output;
use super::system::{CaptureSystem, SdkError};
use crate::capture::Frame;
use crate::config::SimulationConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Highest imager gain level accepted by the hardware.
pub const MAX_IMAGE_GAIN: u8 = 8;

/// Highest IR illumination intensity.
pub const MAX_INTENSITY: u8 = 15;

#[derive(Debug, Clone)]
struct SimulatedCamera {
    /// Name as the system stores it, NUL-padded like a fixed C buffer.
    raw_name: Vec<u8>,
    serial: u32,
    settings: CameraSettings,
    /// Sensor size; settings cannot change it.
    sensor: Resolution,
}

impl SimulatedCamera {
    fn new(name: &str, serial: u32, settings: CameraSettings) -> Self {
        let mut raw_name = name.as_bytes().to_vec();
        raw_name.resize(raw_name.len() + 4, 0);
        Self {
            raw_name,
            serial,
            sensor: settings.resolution,
            settings,
        }
    }
}

/// On-disk profile layout.
#[derive(Debug, Serialize, Deserialize, Default)]
struct ProfileDocument {
    #[serde(default, rename = "camera")]
    cameras: Vec<ProfileCamera>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ProfileCamera {
    name: String,
    serial: u32,
    settings: CameraSettings,
}

/// Capture system simulated in memory.
#[derive(Debug)]
pub struct SimulatedSystem {
    cameras: Vec<SimulatedCamera>,
    /// Number of update steps taken since the last profile load.
    step: u64,
    loaded_profile: Option<PathBuf>,
    running: bool,
}

impl SimulatedSystem {
    /// Creates a system exposing the configured cameras.
    pub fn new(config: &SimulationConfig) -> Self {
        let cameras = config
            .cameras
            .iter()
            .map(|cam| {
                let settings = CameraSettings {
                    frame_rate: cam.frame_rate,
                    resolution: Resolution::new(cam.width, cam.height),
                    ..CameraSettings::default()
                };
                SimulatedCamera::new(&cam.name, cam.serial, settings)
            })
            .collect::<Vec<_>>();

        tracing::info!(cameras = cameras.len(), "Simulated capture system initialized");
        Self {
            cameras,
            step: 0,
            loaded_profile: None,
            running: true,
        }
    }

    /// Path of the most recently loaded profile.
    pub fn loaded_profile(&self) -> Option<&Path> {
        self.loaded_profile.as_deref()
    }

    /// Whether the session is still running.
    pub fn is_running(&self) -> bool {
        self.running
    }

    fn ensure_running(&self) -> Result<(), SdkError> {
        if self.running {
            Ok(())
        } else {
            Err(SdkError::ShutDown)
        }
    }

    fn camera(&self, id: CameraId) -> Result<&SimulatedCamera, SdkError> {
        self.cameras.get(id.0).ok_or(SdkError::UnknownCamera(id))
    }

    /// Raw name buffer, as the vendor call hands it out.
    fn raw_camera_name(&self, id: CameraId) -> Result<Vec<u8>, SdkError> {
        Ok(self.camera(id)?.raw_name.clone())
    }

    fn render_frame(&self, camera: &SimulatedCamera) -> Frame {
        let Resolution { width, height } = camera.settings.resolution;
        let seq = self.step;
        let pixels: Vec<u8> = (0..camera.settings.resolution.pixel_count())
            .map(|i| {
                let x = (i % width as usize) as u64;
                let y = (i / width as usize) as u64;
                ((x + y + seq * 4 + camera.serial as u64) % 256) as u8
            })
            .collect();
        Frame::new(pixels, width, height, seq)
    }
}

impl Default for SimulatedSystem {
    fn default() -> Self {
        Self::new(&SimulationConfig::default())
    }
}

impl CaptureSystem for SimulatedSystem {
    fn load_profile(&mut self, path: &Path) -> Result<(), SdkError> {
        self.ensure_running()?;
        if !path.exists() {
            return Err(SdkError::ProfileNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        let document: ProfileDocument =
            toml::from_str(&content).map_err(|e| SdkError::InvalidProfile {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        // A profile without cameras leaves the configured ones in place.
        if !document.cameras.is_empty() {
            self.cameras = document
                .cameras
                .into_iter()
                .map(|cam| SimulatedCamera::new(&cam.name, cam.serial, cam.settings))
                .collect();
        }
        self.step = 0;
        self.loaded_profile = Some(path.to_path_buf());

        tracing::info!(
            profile = %path.display(),
            cameras = self.cameras.len(),
            "Profile loaded"
        );
        Ok(())
    }

    fn save_profile(&mut self, path: &Path) -> Result<(), SdkError> {
        self.ensure_running()?;
        let cameras = self
            .cameras
            .iter()
            .enumerate()
            .map(|(index, cam)| {
                Ok(ProfileCamera {
                    name: text_output(|| self.raw_camera_name(CameraId(index)))?,
                    serial: cam.serial,
                    settings: cam.settings.clone(),
                })
            })
            .collect::<Result<Vec<_>, SdkError>>()?;
        let content =
            toml::to_string_pretty(&ProfileDocument { cameras }).map_err(|e| {
                SdkError::InvalidProfile {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                }
            })?;
        std::fs::write(path, content)?;
        tracing::info!(profile = %path.display(), "Profile saved");
        Ok(())
    }

    fn update(&mut self) -> Result<(), SdkError> {
        self.ensure_running()?;
        self.step += 1;
        Ok(())
    }

    fn cameras(&self) -> Result<Vec<CameraInfo>, SdkError> {
        self.ensure_running()?;
        self.cameras
            .iter()
            .enumerate()
            .map(|(index, cam)| {
                let id = CameraId(index);
                Ok(CameraInfo {
                    id,
                    name: text_output(|| self.raw_camera_name(id))?,
                    serial: cam.serial,
                })
            })
            .collect()
    }

    fn camera_settings(&self, id: CameraId) -> Result<CameraSettings, SdkError> {
        self.ensure_running()?;
        Ok(self.camera(id)?.settings.clone())
    }

    fn apply_settings(&mut self, id: CameraId, settings: &CameraSettings) -> Result<(), SdkError> {
        self.ensure_running()?;
        let camera = self
            .cameras
            .get_mut(id.0)
            .ok_or(SdkError::UnknownCamera(id))?;

        if settings.frame_rate == 0 {
            return Err(SdkError::InvalidSetting("frame rate must be positive".into()));
        }
        if settings.image_gain > MAX_IMAGE_GAIN {
            return Err(SdkError::InvalidSetting(format!(
                "image gain {} exceeds maximum {}",
                settings.image_gain, MAX_IMAGE_GAIN
            )));
        }
        if settings.intensity > MAX_INTENSITY {
            return Err(SdkError::InvalidSetting(format!(
                "intensity {} exceeds maximum {}",
                settings.intensity, MAX_INTENSITY
            )));
        }
        if settings.resolution != camera.sensor {
            return Err(SdkError::InvalidSetting(format!(
                "resolution {} differs from sensor resolution {}",
                settings.resolution, camera.sensor
            )));
        }

        camera.settings = settings.clone();
        tracing::debug!(camera = %id, ?settings, "Camera settings applied");
        Ok(())
    }

    fn frame_buffer(&mut self, id: CameraId) -> Result<Frame, SdkError> {
        self.ensure_running()?;
        let camera = self.camera(id)?;
        if self.step == 0 {
            return Err(SdkError::NoFrame);
        }
        Ok(self.render_frame(camera))
    }

    fn shutdown(&mut self) -> Result<(), SdkError> {
        self.ensure_running()?;
        self.running = false;
        tracing::info!("Simulated capture system shut down");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimulatedCameraConfig;

    fn small_system() -> SimulatedSystem {
        SimulatedSystem::new(&SimulationConfig {
            cameras: vec![
                SimulatedCameraConfig {
                    name: "Prime 13 #11000".into(),
                    serial: 11000,
                    width: 16,
                    height: 8,
                    frame_rate: 120,
                },
                SimulatedCameraConfig {
                    name: "Prime 17W #10187".into(),
                    serial: 10187,
                    width: 32,
                    height: 16,
                    frame_rate: 180,
                },
            ],
        })
    }

    #[test]
    fn test_cameras_in_configured_order() {
        let system = small_system();
        let cameras = system.cameras().unwrap();
        assert_eq!(cameras.len(), 2);
        assert_eq!(cameras[0].name, "Prime 13 #11000");
        assert_eq!(cameras[1].id, CameraId(1));
        assert_eq!(cameras[1].serial, 10187);
    }

    #[test]
    fn test_no_frame_before_update() {
        let mut system = small_system();
        assert!(matches!(
            system.frame_buffer(CameraId(0)),
            Err(SdkError::NoFrame)
        ));

        system.update().unwrap();
        let frame = system.frame_buffer(CameraId(1)).unwrap();
        assert_eq!(frame.width(), 32);
        assert_eq!(frame.height(), 16);
        assert!(frame.is_valid());
        assert_eq!(frame.sequence(), 1);
    }

    #[test]
    fn test_unknown_camera() {
        let mut system = small_system();
        system.update().unwrap();
        assert!(matches!(
            system.frame_buffer(CameraId(7)),
            Err(SdkError::UnknownCamera(CameraId(7)))
        ));
    }

    #[test]
    fn test_apply_settings_validates() {
        let mut system = small_system();
        let mut settings = system.camera_settings(CameraId(0)).unwrap();
        settings.image_gain = 9;
        assert!(matches!(
            system.apply_settings(CameraId(0), &settings),
            Err(SdkError::InvalidSetting(_))
        ));

        settings.image_gain = 8;
        settings.exposure = 33000;
        system.apply_settings(CameraId(0), &settings).unwrap();
        assert_eq!(system.camera_settings(CameraId(0)).unwrap().exposure, 33000);
    }

    #[test]
    fn test_profile_round_trip_restores_cameras() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.motive");

        let mut system = small_system();
        let mut settings = system.camera_settings(CameraId(1)).unwrap();
        settings.threshold = 40;
        system.apply_settings(CameraId(1), &settings).unwrap();
        system.save_profile(&path).unwrap();

        let mut other = SimulatedSystem::new(&SimulationConfig { cameras: vec![] });
        assert!(other.cameras().unwrap().is_empty());
        other.load_profile(&path).unwrap();

        let cameras = other.cameras().unwrap();
        assert_eq!(cameras.len(), 2);
        assert_eq!(cameras[1].name, "Prime 17W #10187");
        assert_eq!(other.camera_settings(CameraId(1)).unwrap().threshold, 40);
        assert_eq!(other.loaded_profile(), Some(path.as_path()));
    }

    #[test]
    fn test_profile_without_cameras_keeps_configured_ones() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.motive");
        std::fs::write(&path, "").unwrap();

        let mut system = SimulatedSystem::default();
        system.load_profile(&path).unwrap();

        let cameras = system.cameras().unwrap();
        assert_eq!(cameras.len(), 10);
        assert!(cameras[1].name.contains("10187"));
        assert_eq!(system.loaded_profile(), Some(path.as_path()));
    }

    #[test]
    fn test_load_missing_profile() {
        let mut system = small_system();
        let result = system.load_profile(Path::new("/definitely/not/here.motive"));
        assert!(matches!(result, Err(SdkError::ProfileNotFound(_))));
    }

    #[test]
    fn test_load_malformed_profile() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.motive");
        std::fs::write(&path, "[[camera]]\nname = 3\n").unwrap();

        let mut system = small_system();
        assert!(matches!(
            system.load_profile(&path),
            Err(SdkError::InvalidProfile { .. })
        ));
    }

    #[test]
    fn test_calls_fail_after_shutdown() {
        let mut system = small_system();
        system.shutdown().unwrap();
        assert!(!system.is_running());
        assert!(matches!(system.update(), Err(SdkError::ShutDown)));
        assert!(matches!(system.shutdown(), Err(SdkError::ShutDown)));
    }
}
