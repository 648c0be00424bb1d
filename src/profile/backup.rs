//! Backup snapshot of the camera setup.
//!
//! After an operation that changes the setup, the current profile can be
//! written to a well-known location so the last session survives a crash.
//! Whether that happens is a configuration choice; the default is off.

use super::paths::{backup_profile_path, check_profile_file, ensure_dir};
use super::ProfileError;
use crate::config::BackupConfig;
use crate::sdk::{CaptureSystem, SdkError};
use std::path::{Path, PathBuf};

/// Whether and where to write backup profiles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackupPolicy {
    Disabled,
    Enabled(PathBuf),
}

impl BackupPolicy {
    /// Resolves the policy, locating the default backup path if needed.
    pub fn from_config(config: &BackupConfig) -> Result<Self, ProfileError> {
        if !config.enabled {
            return Ok(BackupPolicy::Disabled);
        }
        let path = match &config.path {
            Some(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    ensure_dir(parent)?;
                }
                path.clone()
            }
            None => backup_profile_path()?,
        };
        Ok(BackupPolicy::Enabled(path))
    }
}

/// Location of the last backed-up profile.
///
/// This is where an enabled policy built from the same `config` writes its
/// snapshots: the configured path if set, the default data-dir file otherwise.
pub fn last_profile_path(config: &BackupConfig) -> Result<PathBuf, ProfileError> {
    match &config.path {
        Some(path) => Ok(path.clone()),
        None => backup_profile_path(),
    }
}

/// Runs `call`, then snapshots the profile if the policy asks for it.
///
/// The snapshot is taken right after `call` returns successfully; a failed
/// call leaves the previous backup untouched.
pub fn with_backup<S, T, F>(system: &mut S, policy: &BackupPolicy, call: F) -> Result<T, ProfileError>
where
    S: CaptureSystem + ?Sized,
    F: FnOnce(&mut S) -> Result<T, SdkError>,
{
    let value = call(system)?;
    if let BackupPolicy::Enabled(path) = policy {
        system.save_profile(path)?;
        tracing::info!(backup = %path.display(), "Backup profile saved");
    }
    Ok(value)
}

/// Checks and loads a profile, then snapshots it per `policy`.
pub fn load_profile<S>(system: &mut S, path: &Path, policy: &BackupPolicy) -> Result<(), ProfileError>
where
    S: CaptureSystem + ?Sized,
{
    check_profile_file(path)?;
    with_backup(system, policy, |system| system.load_profile(path))
}
