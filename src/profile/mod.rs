//! Profile files: locations, checks, backups and derived setups.
//!
//! Profiles themselves are opaque to the tools; they are read and written
//! only through the capture system. This module decides which paths are
//! handed to it.

mod backup;
mod paths;
mod vislight;

pub use backup::{last_profile_path, load_profile, with_backup, BackupPolicy};
pub use paths::{
    backup_dir, backup_profile_path, check_file_exists, check_file_extension, check_profile_file,
    derived_profile_path, vislight_profile_path, BACKUP_DIR_NAME, BACKUP_FILE_NAME,
    PROFILE_EXTENSION, VISLIGHT_SUFFIX,
};
pub use vislight::{
    configure_cameras, vislight_settings, write_vislight_profile, VISLIGHT_FRAME_RATE,
    VISLIGHT_MODEL,
};

use crate::sdk::SdkError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while handling profile files.
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("file '{}' does not exist", .0.display())]
    NotFound(PathBuf),
    #[error("file '{}' must have '.{expected}' extension", .path.display())]
    WrongExtension { path: PathBuf, expected: String },
    #[error("no user data directory on this platform")]
    NoDataDir,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Sdk(#[from] SdkError),
}
