//! Tool configuration.
//!
//! All settings have defaults matching the behavior of the lab scripts, so
//! a configuration file is optional. Command-line flags override it.

use crate::capture::CaptureOptions;
use crate::retry::{Backoff, BackoffStrategy, RetryPolicy};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid record time (must be a finite number of seconds)")]
    InvalidRecordTime,
    #[error("invalid {0} (must be a positive rate)")]
    InvalidFrameRate(&'static str),
    #[error("invalid JPEG quality {0} (must be 1-100)")]
    InvalidQuality(u8),
    #[error("invalid backoff (initial must be positive and not above max)")]
    InvalidBackoff,
    #[error("failed to read config file: {0}")]
    FileReadError(String),
    #[error("failed to parse config file: {0}")]
    ParseError(String),
}

/// Recording and display settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Maximum recording time in seconds.
    pub record_secs: f64,
    /// Output video file.
    pub video_file: PathBuf,
    /// Display rate cap; unset displays every frame.
    pub display_fps: Option<f64>,
    /// Recording rate cap; unset records every frame.
    pub write_fps: Option<f64>,
    /// JPEG quality of recorded frames.
    pub jpeg_quality: u8,
    /// How long to wait for a camera frame before giving up.
    pub frame_timeout_secs: f64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            record_secs: 60.0,
            video_file: PathBuf::from("video.avi"),
            display_fps: None,
            write_fps: None,
            jpeg_quality: 90,
            frame_timeout_secs: 3.0,
        }
    }
}

/// Pacing of retries while waiting for a frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Delay growth between attempts.
    pub strategy: BackoffStrategy,
    /// First delay in milliseconds; must be positive.
    pub initial_backoff_ms: u64,
    /// Delay cap in milliseconds.
    pub max_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            strategy: BackoffStrategy::Exponential,
            initial_backoff_ms: 1,
            max_backoff_ms: 50,
        }
    }
}

impl RetryConfig {
    /// Backoff schedule described by this section.
    pub fn backoff(&self) -> Backoff {
        Backoff {
            strategy: self.strategy,
            initial: Duration::from_millis(self.initial_backoff_ms),
            max: Duration::from_millis(self.max_backoff_ms),
        }
    }
}

/// Backup snapshot of the camera setup after profile changes.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct BackupConfig {
    /// Write a backup profile after each profile load.
    pub enabled: bool,
    /// Backup location; defaults to the per-user data directory.
    pub path: Option<PathBuf>,
}

/// One camera of the simulated capture system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulatedCameraConfig {
    /// Display name, e.g. `Prime 13 #11000`.
    pub name: String,
    /// Serial number.
    pub serial: u32,
    /// Sensor width in pixels.
    pub width: u32,
    /// Sensor height in pixels.
    pub height: u32,
    /// Initial frame rate.
    pub frame_rate: u32,
}

impl SimulatedCameraConfig {
    fn prime(model: &str, serial: u32) -> Self {
        let (width, height) = match model {
            "Prime 13" | "Prime 13W" => (1280, 1024),
            _ => (1664, 1088),
        };
        Self {
            name: format!("{} #{}", model, serial),
            serial,
            width,
            height,
            frame_rate: 120,
        }
    }
}

/// Cameras exposed by the simulated capture system.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Cameras in enumeration order, used when no profile lists cameras.
    pub cameras: Vec<SimulatedCameraConfig>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        let cameras = [
            ("Prime 13", 11000),
            ("Prime 17W", 10187),
            ("Prime 17W", 10189),
            ("Prime 13W", 10910),
            ("Prime 17W", 9997),
            ("Prime 17W", 10188),
            ("Prime 13W", 10190),
            ("Prime 13", 11079),
            ("Prime 17W", 9956),
            ("Prime 13W", 11202),
        ]
        .into_iter()
        .map(|(model, serial)| SimulatedCameraConfig::prime(model, serial))
        .collect();
        Self { cameras }
    }
}

/// Full configuration file format.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    /// `[capture]` section.
    #[serde(default)]
    pub capture: CaptureConfig,
    /// `[retry]` section.
    #[serde(default)]
    pub retry: RetryConfig,
    /// `[backup]` section.
    #[serde(default)]
    pub backup: BackupConfig,
    /// `[simulation]` section.
    #[serde(default)]
    pub simulation: SimulationConfig,
}

impl FileConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        let config: FileConfig =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.capture.record_secs.is_finite() {
            return Err(ConfigError::InvalidRecordTime);
        }
        for (name, rate) in [
            ("display rate", self.capture.display_fps),
            ("write rate", self.capture.write_fps),
        ] {
            if let Some(rate) = rate {
                if !(rate.is_finite() && rate > 0.0) {
                    return Err(ConfigError::InvalidFrameRate(name));
                }
            }
        }
        if !(1..=100).contains(&self.capture.jpeg_quality) {
            return Err(ConfigError::InvalidQuality(self.capture.jpeg_quality));
        }
        if self.retry.initial_backoff_ms == 0
            || self.retry.max_backoff_ms < self.retry.initial_backoff_ms
        {
            return Err(ConfigError::InvalidBackoff);
        }
        Ok(())
    }

    /// Capture loop options derived from this configuration.
    pub fn capture_options(&self) -> CaptureOptions {
        CaptureOptions {
            max_duration: Duration::try_from_secs_f64(self.capture.record_secs.max(0.0))
                .unwrap_or(Duration::MAX),
            frame_retry: RetryPolicy::from_secs_f64(
                self.capture.frame_timeout_secs,
                self.retry.backoff(),
            ),
            display_interval: self.capture.display_fps.map(rate_interval),
            write_interval: self.capture.write_fps.map(rate_interval),
        }
    }
}

fn rate_interval(fps: f64) -> Duration {
    Duration::try_from_secs_f64(1.0 / fps).unwrap_or(Duration::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        let config = FileConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.capture.video_file, PathBuf::from("video.avi"));
        assert_eq!(config.simulation.cameras.len(), 10);
        assert!(!config.backup.enabled);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lab.toml");
        std::fs::write(
            &path,
            "[capture]\nrecord_secs = 5.0\nwrite_fps = 25.0\n\n[backup]\nenabled = true\n",
        )
        .unwrap();

        let config = FileConfig::from_file(&path).unwrap();
        assert_eq!(config.capture.record_secs, 5.0);
        assert_eq!(config.capture.jpeg_quality, 90);
        assert!(config.backup.enabled);
        assert!(config.backup.path.is_none());

        let options = config.capture_options();
        assert_eq!(options.max_duration, Duration::from_secs(5));
        assert_eq!(options.write_interval, Some(Duration::from_millis(40)));
        assert_eq!(options.display_interval, None);
        assert_eq!(options.frame_retry.timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_invalid_quality_rejected() {
        let mut config = FileConfig::default();
        config.capture.jpeg_quality = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidQuality(0))
        ));
    }

    #[test]
    fn test_invalid_rate_rejected() {
        let mut config = FileConfig::default();
        config.capture.display_fps = Some(0.0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidFrameRate("display rate"))
        ));
    }

    #[test]
    fn test_zero_backoff_rejected() {
        let mut config = FileConfig::default();
        config.retry.initial_backoff_ms = 0;
        config.retry.max_backoff_ms = 0;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidBackoff)));

        config.retry.initial_backoff_ms = 10;
        config.retry.max_backoff_ms = 5;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidBackoff)));
    }

    #[test]
    fn test_negative_record_time_is_zero_duration() {
        let mut config = FileConfig::default();
        config.capture.record_secs = -3.0;
        assert!(config.validate().is_ok());
        assert_eq!(config.capture_options().max_duration, Duration::ZERO);
    }

    #[test]
    fn test_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[capture\n").unwrap();
        assert!(matches!(
            FileConfig::from_file(&path),
            Err(ConfigError::ParseError(_))
        ));
    }
}
