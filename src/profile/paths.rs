//! Profile file locations and checks.

use super::ProfileError;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Extension of capture-system profile files, without the dot.
pub const PROFILE_EXTENSION: &str = "motive";

/// Suffix of profiles written by the visible-light configuration.
pub const VISLIGHT_SUFFIX: &str = "_vislight";

/// Directory under the user data directory holding the backup profile.
pub const BACKUP_DIR_NAME: &str = "MotivePy";

/// File name of the backup ("last") profile.
pub const BACKUP_FILE_NAME: &str = "last_profile.motive";

/// Inserts `suffix` between a profile's stem and its extension.
///
/// `/a/b/session.motive` with `_vislight` becomes
/// `/a/b/session_vislight.motive`. A path without an extension gets the
/// suffix appended.
pub fn derived_profile_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_stem().map(OsString::from).unwrap_or_default();
    name.push(suffix);
    if let Some(ext) = path.extension() {
        name.push(".");
        name.push(ext);
    }
    path.with_file_name(name)
}

/// Output path of the visible-light configuration for `path`.
pub fn vislight_profile_path(path: &Path) -> PathBuf {
    derived_profile_path(path, VISLIGHT_SUFFIX)
}

/// Fails unless `path` exists.
pub fn check_file_exists(path: &Path) -> Result<(), ProfileError> {
    if path.exists() {
        Ok(())
    } else {
        Err(ProfileError::NotFound(path.to_path_buf()))
    }
}

/// Fails unless `path` carries the given extension.
pub fn check_file_extension(path: &Path, extension: &str) -> Result<(), ProfileError> {
    match path.extension() {
        Some(ext) if ext == extension => Ok(()),
        _ => Err(ProfileError::WrongExtension {
            path: path.to_path_buf(),
            expected: extension.to_string(),
        }),
    }
}

/// Checks a profile before handing it to the capture system.
pub fn check_profile_file(path: &Path) -> Result<(), ProfileError> {
    check_file_exists(path)?;
    check_file_extension(path, PROFILE_EXTENSION)
}

/// Returns the backup directory, creating it if needed.
pub fn backup_dir() -> Result<PathBuf, ProfileError> {
    let dir = dirs::data_dir()
        .ok_or(ProfileError::NoDataDir)?
        .join(BACKUP_DIR_NAME);
    ensure_dir(&dir)?;
    Ok(dir)
}

/// Default location of the backup profile.
pub fn backup_profile_path() -> Result<PathBuf, ProfileError> {
    Ok(backup_dir()?.join(BACKUP_FILE_NAME))
}

pub(crate) fn ensure_dir(dir: &Path) -> Result<(), ProfileError> {
    if !dir.exists() {
        tracing::warn!(
            dir = %dir.display(),
            "Data directory not found, creating it"
        );
        std::fs::create_dir_all(dir)?;
    }
    Ok(())
}
