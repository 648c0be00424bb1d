//! Recording through OpenCV's video I/O.

use super::{Frame, FrameSink, SinkError, VideoFormat};
use crate::sdk::Resolution;
use opencv::core::{Mat, Scalar, Size, CV_8UC1};
use opencv::prelude::*;
use opencv::videoio::{VideoWriter, VIDEOWRITER_PROP_QUALITY};
use std::path::Path;

/// Motion-JPEG video file written by OpenCV's `VideoWriter`.
pub struct OpenCvVideoWriter {
    writer: VideoWriter,
    resolution: Resolution,
    /// Single-channel image reused for every frame.
    buffer: Mat,
    frames: usize,
    closed: bool,
}

impl OpenCvVideoWriter {
    /// Creates (or truncates) a grayscale MJPG video file.
    pub fn create(path: impl AsRef<Path>, format: VideoFormat) -> Result<Self, SinkError> {
        format.validate()?;
        let path = path.as_ref();
        let filename = path.to_str().ok_or_else(|| {
            SinkError::InvalidParameters(format!("path '{}' is not UTF-8", path.display()))
        })?;
        let size = Size::new(to_i32(format.resolution.width)?, to_i32(format.resolution.height)?);

        let fourcc = VideoWriter::fourcc('M', 'J', 'P', 'G')?;
        let mut writer =
            VideoWriter::new(filename, fourcc, f64::from(format.frame_rate), size, false)?;
        if !writer.is_opened()? {
            return Err(SinkError::InvalidParameters(format!(
                "OpenCV cannot open '{}' for writing",
                path.display()
            )));
        }
        // Not every backend honors the quality property.
        let _ = writer.set(VIDEOWRITER_PROP_QUALITY, f64::from(format.quality));

        let buffer =
            Mat::new_rows_cols_with_default(size.height, size.width, CV_8UC1, Scalar::all(0.0))?;
        tracing::info!(
            file = %path.display(),
            fps = format.frame_rate,
            resolution = %format.resolution,
            "OpenCV video writer created"
        );
        Ok(Self {
            writer,
            resolution: format.resolution,
            buffer,
            frames: 0,
            closed: false,
        })
    }

    /// Number of frames written so far.
    pub fn frame_count(&self) -> usize {
        self.frames
    }
}

impl FrameSink for OpenCvVideoWriter {
    fn append(&mut self, frame: &Frame) -> Result<(), SinkError> {
        if frame.resolution() != self.resolution || !frame.is_valid() {
            return Err(SinkError::FrameSize {
                expected: self.resolution,
                actual: frame.resolution(),
            });
        }
        if self.closed {
            return Err(SinkError::Closed);
        }
        self.buffer.data_bytes_mut()?.copy_from_slice(frame.pixels());
        self.writer.write(&self.buffer)?;
        self.frames += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<(), SinkError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.writer.release()?;
        tracing::info!(frames = self.frames, "Video writer closed");
        Ok(())
    }
}

impl Drop for OpenCvVideoWriter {
    fn drop(&mut self) {
        if !self.closed {
            if let Err(e) = self.close() {
                tracing::warn!(error = %e, "Failed to finalize video on drop");
            }
        }
    }
}

fn to_i32(value: u32) -> Result<i32, SinkError> {
    i32::try_from(value).map_err(|_| SinkError::TooLarge)
}
