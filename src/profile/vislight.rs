//! Visible-light camera setup.
//!
//! Reconfigures every camera of a loaded profile for recording visible-light
//! video and saves the result next to the original profile, with the
//! `_vislight` suffix.

use super::backup::{load_profile, BackupPolicy};
use super::paths::vislight_profile_path;
use super::ProfileError;
use crate::sdk::{CameraSettings, CaptureSystem, SdkError, VideoType, MAX_IMAGE_GAIN};
use std::path::{Path, PathBuf};

/// Frame rate applied to every camera.
pub const VISLIGHT_FRAME_RATE: u32 = 30;

/// Cameras whose name contains this get the full visible-light setup.
pub const VISLIGHT_MODEL: &str = "Prime 13";

const VISLIGHT_EXPOSURE: u32 = 33_000;
const VISLIGHT_THRESHOLD: u8 = 40;
const VISLIGHT_INTENSITY: u8 = 0;

/// Computes the visible-light settings for a camera.
pub fn vislight_settings(name: &str, current: &CameraSettings) -> CameraSettings {
    let mut settings = CameraSettings {
        frame_rate: VISLIGHT_FRAME_RATE,
        video_type: VideoType::Segment,
        ..current.clone()
    };
    if name.contains(VISLIGHT_MODEL) {
        settings.exposure = VISLIGHT_EXPOSURE;
        settings.threshold = VISLIGHT_THRESHOLD;
        settings.intensity = VISLIGHT_INTENSITY;
        settings.image_gain = MAX_IMAGE_GAIN;
        settings.filter_switch = false;
    }
    settings
}

/// Applies [`vislight_settings`] to every camera. Returns the number of
/// cameras reconfigured.
pub fn configure_cameras<S>(system: &mut S) -> Result<usize, SdkError>
where
    S: CaptureSystem + ?Sized,
{
    let cameras = system.cameras()?;
    for camera in &cameras {
        let current = system.camera_settings(camera.id)?;
        let settings = vislight_settings(&camera.name, &current);
        system.apply_settings(camera.id, &settings)?;
        tracing::info!(
            camera = %camera.name,
            full_setup = camera.name.contains(VISLIGHT_MODEL),
            "Camera configured for visible light"
        );
    }
    Ok(cameras.len())
}

/// Loads `profile`, reconfigures its cameras and saves the derived profile.
///
/// Returns the path of the saved profile.
pub fn write_vislight_profile<S>(
    system: &mut S,
    profile: &Path,
    backup: &BackupPolicy,
) -> Result<PathBuf, ProfileError>
where
    S: CaptureSystem + ?Sized,
{
    load_profile(system, profile, backup)?;
    let count = configure_cameras(system)?;

    let output = vislight_profile_path(profile);
    system.save_profile(&output)?;
    tracing::info!(cameras = count, profile = %output.display(), "Visible-light profile written");
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimulationConfig;
    use crate::sdk::{CameraId, SimulatedSystem};

    #[test]
    fn test_prime_13_gets_full_setup() {
        let current = CameraSettings::default();
        let settings = vislight_settings("Prime 13 #11000", &current);

        assert_eq!(settings.frame_rate, 30);
        assert_eq!(settings.video_type, VideoType::Segment);
        assert_eq!(settings.exposure, 33_000);
        assert_eq!(settings.threshold, 40);
        assert_eq!(settings.intensity, 0);
        assert_eq!(settings.image_gain, 8);
        assert!(!settings.filter_switch);
        assert_eq!(settings.resolution, current.resolution);
    }

    #[test]
    fn test_other_cameras_keep_exposure() {
        let current = CameraSettings {
            exposure: 500,
            threshold: 180,
            intensity: 12,
            ..CameraSettings::default()
        };
        let settings = vislight_settings("Prime 17W #10187", &current);

        assert_eq!(settings.frame_rate, 30);
        assert_eq!(settings.video_type, VideoType::Segment);
        assert_eq!(settings.exposure, 500);
        assert_eq!(settings.threshold, 180);
        assert_eq!(settings.intensity, 12);
        assert_eq!(settings.image_gain, current.image_gain);
        assert!(settings.filter_switch);
    }

    #[test]
    fn test_write_vislight_profile() {
        let dir = tempfile::tempdir().unwrap();
        let profile = dir.path().join("session.motive");
        SimulatedSystem::default().save_profile(&profile).unwrap();

        let mut system = SimulatedSystem::new(&SimulationConfig { cameras: vec![] });
        let output = write_vislight_profile(&mut system, &profile, &BackupPolicy::Disabled).unwrap();
        assert_eq!(output, dir.path().join("session_vislight.motive"));

        let mut reloaded = SimulatedSystem::new(&SimulationConfig { cameras: vec![] });
        reloaded.load_profile(&output).unwrap();
        let cameras = reloaded.cameras().unwrap();
        assert_eq!(cameras.len(), 10);
        for camera in cameras {
            let settings = reloaded.camera_settings(camera.id).unwrap();
            assert_eq!(settings.frame_rate, 30);
            if camera.name.contains("Prime 13") {
                assert_eq!(settings.exposure, 33_000);
            } else {
                assert_eq!(settings.exposure, CameraSettings::default().exposure);
            }
        }

        // The source profile is left unchanged.
        let mut original = SimulatedSystem::new(&SimulationConfig { cameras: vec![] });
        original.load_profile(&profile).unwrap();
        assert_eq!(original.camera_settings(CameraId(0)).unwrap().frame_rate, 120);
    }
}
