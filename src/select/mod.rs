//! Choosing a camera or a profile file.
//!
//! Cameras are matched by name substring, or picked interactively from the
//! live camera list. The picker only ever sees `(id, label)` choices and
//! returns the selected one; nothing else is shared with it.

mod picker;

pub use picker::{Picker, TerminalPicker};

use crate::profile::PROFILE_EXTENSION;
use crate::sdk::{CameraId, CameraInfo, CaptureSystem, SdkError};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while selecting.
#[derive(Debug, Error)]
pub enum SelectError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Sdk(#[from] SdkError),
}

/// Returns the first camera whose name contains `needle`, in list order.
pub fn find_camera<'a>(cameras: &'a [CameraInfo], needle: &str) -> Option<&'a CameraInfo> {
    cameras.iter().find(|cam| cam.name.contains(needle))
}

/// Looks up a camera of the running system by name substring.
pub fn get_camera<S>(system: &S, needle: &str) -> Result<Option<CameraInfo>, SdkError>
where
    S: CaptureSystem + ?Sized,
{
    let cameras = system.cameras()?;
    let found = find_camera(&cameras, needle).cloned();
    match &found {
        Some(cam) => tracing::info!(camera = %cam.name, id = %cam.id, "Camera selected"),
        None => tracing::warn!(needle, "No camera name matches"),
    }
    Ok(found)
}

/// One selectable camera.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraChoice {
    /// Camera handle for this session.
    pub id: CameraId,
    /// Text shown in the menu.
    pub label: String,
}

/// Builds the choice list from the live camera enumeration.
pub fn camera_choices<S>(system: &S) -> Result<Vec<CameraChoice>, SdkError>
where
    S: CaptureSystem + ?Sized,
{
    Ok(system
        .cameras()?
        .into_iter()
        .map(|cam| CameraChoice {
            id: cam.id,
            label: format!("Camera {}", cam.name),
        })
        .collect())
}

/// Lets the operator pick a camera. `None` if nothing was chosen.
pub fn pick_camera<S, P>(system: &S, picker: &mut P) -> Result<Option<CameraId>, SelectError>
where
    S: CaptureSystem + ?Sized,
    P: Picker + ?Sized,
{
    let choices = camera_choices(system)?;
    if choices.is_empty() {
        tracing::warn!("No cameras to choose from");
        return Ok(None);
    }
    let labels: Vec<&str> = choices.iter().map(|c| c.label.as_str()).collect();
    let picked = picker
        .pick("Choose a camera:", &labels)?
        .and_then(|index| choices.get(index))
        .map(|choice| choice.id);
    Ok(picked)
}

/// Profile files in `dir`, sorted by name.
pub fn profile_candidates(dir: &Path) -> Result<Vec<PathBuf>, SelectError> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == PROFILE_EXTENSION) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Lets the operator pick a profile file from `dir`.
pub fn pick_profile_file<P>(dir: &Path, picker: &mut P) -> Result<Option<PathBuf>, SelectError>
where
    P: Picker + ?Sized,
{
    let files = profile_candidates(dir)?;
    if files.is_empty() {
        tracing::warn!(dir = %dir.display(), "No profile files found");
        return Ok(None);
    }
    let labels: Vec<String> = files
        .iter()
        .map(|path| {
            path.file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default()
        })
        .collect();
    let labels: Vec<&str> = labels.iter().map(String::as_str).collect();
    let picked = picker
        .pick("Choose a profile file to load:", &labels)?
        .and_then(|index| files.get(index).cloned());
    Ok(picked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SimulatedCameraConfig, SimulationConfig};
    use crate::sdk::SimulatedSystem;

    struct FixedPicker(Option<usize>);

    impl Picker for FixedPicker {
        fn pick(&mut self, _prompt: &str, _labels: &[&str]) -> Result<Option<usize>, SelectError> {
            Ok(self.0)
        }
    }

    fn info(index: usize, name: &str) -> CameraInfo {
        CameraInfo {
            id: CameraId(index),
            name: name.to_string(),
            serial: 0,
        }
    }

    fn lab_system() -> SimulatedSystem {
        let camera = |name: &str, serial| SimulatedCameraConfig {
            name: name.into(),
            serial,
            width: 8,
            height: 8,
            frame_rate: 100,
        };
        SimulatedSystem::new(&SimulationConfig {
            cameras: vec![
                camera("Prime13_#11000", 11000),
                camera("Prime17W_#10187", 10187),
            ],
        })
    }

    #[test]
    fn test_find_camera_by_serial_substring() {
        let cameras = vec![info(0, "Prime13_#11000"), info(1, "Prime17W_#10187")];
        let found = find_camera(&cameras, "10187").unwrap();
        assert_eq!(found.id, CameraId(1));
    }

    #[test]
    fn test_find_camera_first_match_wins() {
        let cameras = vec![info(0, "Prime13_#11000"), info(1, "Prime13_#11079")];
        assert_eq!(find_camera(&cameras, "Prime13").unwrap().id, CameraId(0));
    }

    #[test]
    fn test_find_camera_no_match() {
        let cameras = vec![info(0, "Prime13_#11000")];
        assert!(find_camera(&cameras, "9956").is_none());
        assert!(find_camera(&[], "").is_none());
    }

    #[test]
    fn test_get_camera_from_system() {
        let system = lab_system();
        let cam = get_camera(&system, "10187").unwrap().unwrap();
        assert_eq!(cam.name, "Prime17W_#10187");
        assert!(get_camera(&system, "nope").unwrap().is_none());
    }

    #[test]
    fn test_choices_follow_live_enumeration() {
        let choices = camera_choices(&lab_system()).unwrap();
        assert_eq!(
            choices,
            vec![
                CameraChoice {
                    id: CameraId(0),
                    label: "Camera Prime13_#11000".into()
                },
                CameraChoice {
                    id: CameraId(1),
                    label: "Camera Prime17W_#10187".into()
                },
            ]
        );
    }

    #[test]
    fn test_pick_camera_returns_selection() {
        let system = lab_system();
        assert_eq!(
            pick_camera(&system, &mut FixedPicker(Some(1))).unwrap(),
            Some(CameraId(1))
        );
        assert_eq!(pick_camera(&system, &mut FixedPicker(None)).unwrap(), None);
        assert_eq!(pick_camera(&system, &mut FixedPicker(Some(9))).unwrap(), None);
    }

    #[test]
    fn test_profile_candidates_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.motive", "a.motive", "notes.txt"] {
            std::fs::write(dir.path().join(name), "").unwrap();
        }
        std::fs::create_dir(dir.path().join("dir.motive")).unwrap();

        let files = profile_candidates(dir.path()).unwrap();
        assert_eq!(
            files,
            vec![dir.path().join("a.motive"), dir.path().join("b.motive")]
        );

        let picked = pick_profile_file(dir.path(), &mut FixedPicker(Some(1))).unwrap();
        assert_eq!(picked, Some(dir.path().join("b.motive")));
    }
}
