//! Video output for recorded frames.
//!
//! Recordings are Motion-JPEG AVI files (fourcc `MJPG`). With the `opencv`
//! feature they are written by OpenCV's `VideoWriter`; otherwise
//! [`AviMjpegWriter`] encodes each frame with the `image` crate and stores
//! it in a RIFF AVI container. [`open_video_sink`] picks the backend.

use super::Frame;
use crate::sdk::Resolution;
use image::codecs::jpeg::JpegEncoder;
use image::ExtendedColorType;
use std::fs::File;
use std::io::{self, BufWriter, Seek, SeekFrom, Write};
use std::path::Path;
use thiserror::Error;

/// Errors raised by a frame sink.
#[derive(Debug, Error)]
pub enum SinkError {
    /// Writing the output failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// JPEG encoding of a frame failed.
    #[error("failed to encode frame: {0}")]
    Encode(#[from] image::ImageError),
    /// OpenCV rejected a call.
    #[cfg(feature = "opencv")]
    #[error("OpenCV error: {0}")]
    OpenCv(#[from] opencv::Error),
    /// A frame does not match the video resolution.
    #[error("frame is {actual}, writer expects {expected}")]
    FrameSize {
        /// Resolution of the video.
        expected: Resolution,
        /// Resolution of the rejected frame.
        actual: Resolution,
    },
    /// The video format or output cannot be used.
    #[error("invalid writer parameters: {0}")]
    InvalidParameters(String),
    /// The video outgrew the container's 32-bit sizes.
    #[error("video exceeds the 4 GiB AVI size limit")]
    TooLarge,
    /// The sink was already closed.
    #[error("video writer is closed")]
    Closed,
}

/// Destination for recorded frames.
pub trait FrameSink {
    /// Appends one frame to the output.
    fn append(&mut self, frame: &Frame) -> Result<(), SinkError>;

    /// Finalizes the output. Closing twice is a no-op.
    fn close(&mut self) -> Result<(), SinkError>;
}

/// Parameters of a recorded video, taken from the camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoFormat {
    /// Frames per second.
    pub frame_rate: u32,
    /// Frame size in pixels.
    pub resolution: Resolution,
    /// JPEG quality, 1-100.
    pub quality: u8,
}

impl VideoFormat {
    /// Fails unless frames of this format can be recorded.
    pub fn validate(&self) -> Result<(), SinkError> {
        if self.frame_rate == 0 {
            return Err(SinkError::InvalidParameters("frame rate must be positive".into()));
        }
        if self.resolution.width == 0 || self.resolution.height == 0 {
            return Err(SinkError::InvalidParameters("empty resolution".into()));
        }
        if !(1..=100).contains(&self.quality) {
            return Err(SinkError::InvalidParameters(format!(
                "JPEG quality {} outside 1-100",
                self.quality
            )));
        }
        Ok(())
    }
}

/// Creates (or truncates) the video file at `path`.
#[cfg(feature = "opencv")]
pub fn open_video_sink(path: &Path, format: VideoFormat) -> Result<Box<dyn FrameSink>, SinkError> {
    Ok(Box::new(super::OpenCvVideoWriter::create(path, format)?))
}

/// Creates (or truncates) the video file at `path`.
#[cfg(not(feature = "opencv"))]
pub fn open_video_sink(path: &Path, format: VideoFormat) -> Result<Box<dyn FrameSink>, SinkError> {
    Ok(Box::new(AviMjpegWriter::create(path, format)?))
}

const AVIF_HASINDEX: u32 = 0x10;
const AVIIF_KEYFRAME: u32 = 0x10;
const STREAM_CHUNK: &[u8; 4] = b"00dc";

struct IndexEntry {
    offset: u32,
    size: u32,
}

/// Byte positions of header fields patched when the file is closed.
struct HeaderFields {
    riff_size: u64,
    max_bytes_per_sec: u64,
    total_frames: u64,
    avih_buffer_size: u64,
    stream_length: u64,
    strh_buffer_size: u64,
    movi_size: u64,
    /// Position of the `movi` fourcc; index offsets are relative to it.
    movi_start: u64,
}

/// Motion-JPEG AVI writer.
pub struct AviMjpegWriter<W: Write + Seek> {
    out: Option<W>,
    format: VideoFormat,
    fields: HeaderFields,
    index: Vec<IndexEntry>,
    largest_chunk: u32,
    encoded: Vec<u8>,
    closed: bool,
}

impl AviMjpegWriter<BufWriter<File>> {
    /// Creates (or truncates) a video file.
    pub fn create(path: impl AsRef<Path>, format: VideoFormat) -> Result<Self, SinkError> {
        format.validate()?;
        let path = path.as_ref();
        let file = File::create(path)?;
        tracing::info!(
            file = %path.display(),
            fps = format.frame_rate,
            resolution = %format.resolution,
            "Video writer created"
        );
        Self::new(BufWriter::new(file), format)
    }
}

impl<W: Write + Seek> AviMjpegWriter<W> {
    /// Writes the container header to `out`.
    pub fn new(mut out: W, format: VideoFormat) -> Result<Self, SinkError> {
        format.validate()?;
        let fields = write_header(&mut out, &format)?;
        Ok(Self {
            out: Some(out),
            format,
            fields,
            index: Vec::new(),
            largest_chunk: 0,
            encoded: Vec::new(),
            closed: false,
        })
    }

    /// Number of frames written so far.
    pub fn frame_count(&self) -> usize {
        self.index.len()
    }

    /// Closes the writer and returns the underlying output.
    pub fn into_inner(mut self) -> Result<W, SinkError> {
        self.close()?;
        self.out.take().ok_or(SinkError::Closed)
    }

    fn finish(&mut self) -> Result<(), SinkError> {
        let Some(out) = self.out.as_mut() else {
            return Ok(());
        };

        let idx1_start = out.stream_position()?;
        let idx1_len = (self.index.len() * 16) as u64;
        out.write_all(b"idx1")?;
        write_u32(out, to_u32(idx1_len)?)?;
        for entry in &self.index {
            out.write_all(STREAM_CHUNK)?;
            write_u32(out, AVIIF_KEYFRAME)?;
            write_u32(out, entry.offset)?;
            write_u32(out, entry.size)?;
        }
        let end = out.stream_position()?;

        let frames = to_u32(self.index.len() as u64)?;
        let bytes_per_sec = self.largest_chunk.saturating_mul(self.format.frame_rate);
        let movi_len = idx1_start - self.fields.movi_start;

        patch_u32(out, self.fields.riff_size, to_u32(end - 8)?)?;
        patch_u32(out, self.fields.max_bytes_per_sec, bytes_per_sec)?;
        patch_u32(out, self.fields.total_frames, frames)?;
        patch_u32(out, self.fields.avih_buffer_size, self.largest_chunk)?;
        patch_u32(out, self.fields.stream_length, frames)?;
        patch_u32(out, self.fields.strh_buffer_size, self.largest_chunk)?;
        patch_u32(out, self.fields.movi_size, to_u32(movi_len)?)?;
        out.seek(SeekFrom::Start(end))?;
        out.flush()?;
        Ok(())
    }
}

impl<W: Write + Seek> FrameSink for AviMjpegWriter<W> {
    fn append(&mut self, frame: &Frame) -> Result<(), SinkError> {
        if frame.resolution() != self.format.resolution {
            return Err(SinkError::FrameSize {
                expected: self.format.resolution,
                actual: frame.resolution(),
            });
        }
        if self.closed {
            return Err(SinkError::Closed);
        }
        let out = self.out.as_mut().ok_or(SinkError::Closed)?;

        self.encoded.clear();
        JpegEncoder::new_with_quality(&mut self.encoded, self.format.quality).encode(
            frame.pixels(),
            frame.width(),
            frame.height(),
            ExtendedColorType::L8,
        )?;

        let chunk_start = out.stream_position()?;
        let size = to_u32(self.encoded.len() as u64)?;
        out.write_all(STREAM_CHUNK)?;
        write_u32(out, size)?;
        out.write_all(&self.encoded)?;
        if size % 2 == 1 {
            out.write_all(&[0])?;
        }

        self.index.push(IndexEntry {
            offset: to_u32(chunk_start - self.fields.movi_start)?,
            size,
        });
        self.largest_chunk = self.largest_chunk.max(size);
        Ok(())
    }

    fn close(&mut self) -> Result<(), SinkError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.finish()?;
        tracing::info!(frames = self.index.len(), "Video writer closed");
        Ok(())
    }
}

impl<W: Write + Seek> Drop for AviMjpegWriter<W> {
    fn drop(&mut self) {
        if !self.closed {
            if let Err(e) = self.close() {
                tracing::warn!(error = %e, "Failed to finalize video on drop");
            }
        }
    }
}

fn to_u32(value: u64) -> Result<u32, SinkError> {
    u32::try_from(value).map_err(|_| SinkError::TooLarge)
}

fn write_u32<W: Write>(out: &mut W, value: u32) -> io::Result<()> {
    out.write_all(&value.to_le_bytes())
}

fn write_u16<W: Write>(out: &mut W, value: u16) -> io::Result<()> {
    out.write_all(&value.to_le_bytes())
}

fn patch_u32<W: Write + Seek>(out: &mut W, at: u64, value: u32) -> io::Result<()> {
    out.seek(SeekFrom::Start(at))?;
    write_u32(out, value)
}

fn write_header<W: Write + Seek>(
    out: &mut W,
    format: &VideoFormat,
) -> Result<HeaderFields, SinkError> {
    let Resolution { width, height } = format.resolution;
    let start = out.stream_position()?;

    out.write_all(b"RIFF")?;
    write_u32(out, 0)?;
    out.write_all(b"AVI ")?;

    // hdrl = 'hdrl' + avih chunk (8 + 56) + strl list (12 + 64 + 48)
    out.write_all(b"LIST")?;
    write_u32(out, 4 + 64 + 124)?;
    out.write_all(b"hdrl")?;

    out.write_all(b"avih")?;
    write_u32(out, 56)?;
    let avih = out.stream_position()?;
    write_u32(out, 1_000_000 / format.frame_rate)?;
    write_u32(out, 0)?; // max bytes per second
    write_u32(out, 0)?; // padding granularity
    write_u32(out, AVIF_HASINDEX)?;
    write_u32(out, 0)?; // total frames
    write_u32(out, 0)?; // initial frames
    write_u32(out, 1)?; // streams
    write_u32(out, 0)?; // suggested buffer size
    write_u32(out, width)?;
    write_u32(out, height)?;
    for _ in 0..4 {
        write_u32(out, 0)?;
    }

    out.write_all(b"LIST")?;
    write_u32(out, 4 + 64 + 48)?;
    out.write_all(b"strl")?;

    out.write_all(b"strh")?;
    write_u32(out, 56)?;
    let strh = out.stream_position()?;
    out.write_all(b"vids")?;
    out.write_all(b"MJPG")?;
    write_u32(out, 0)?; // flags
    write_u16(out, 0)?; // priority
    write_u16(out, 0)?; // language
    write_u32(out, 0)?; // initial frames
    write_u32(out, 1)?; // scale
    write_u32(out, format.frame_rate)?; // rate
    write_u32(out, 0)?; // start
    write_u32(out, 0)?; // length
    write_u32(out, 0)?; // suggested buffer size
    write_u32(out, u32::MAX)?; // quality: default
    write_u32(out, 0)?; // sample size
    write_u16(out, 0)?;
    write_u16(out, 0)?;
    write_u16(out, width.min(u16::MAX as u32) as u16)?;
    write_u16(out, height.min(u16::MAX as u32) as u16)?;

    out.write_all(b"strf")?;
    write_u32(out, 40)?;
    write_u32(out, 40)?; // header size
    write_u32(out, width)?;
    write_u32(out, height)?;
    write_u16(out, 1)?; // planes
    write_u16(out, 24)?; // bit count
    out.write_all(b"MJPG")?;
    write_u32(out, width.saturating_mul(height).saturating_mul(3))?;
    for _ in 0..4 {
        write_u32(out, 0)?;
    }

    out.write_all(b"LIST")?;
    let movi_size = out.stream_position()?;
    write_u32(out, 4)?;
    let movi_start = out.stream_position()?;
    out.write_all(b"movi")?;

    Ok(HeaderFields {
        riff_size: start + 4,
        max_bytes_per_sec: avih + 4,
        total_frames: avih + 16,
        avih_buffer_size: avih + 28,
        stream_length: strh + 32,
        strh_buffer_size: strh + 36,
        movi_size,
        movi_start,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn format() -> VideoFormat {
        VideoFormat {
            frame_rate: 30,
            resolution: Resolution::new(16, 8),
            quality: 80,
        }
    }

    fn frame(seq: u64) -> Frame {
        let pixels = (0..128).map(|i| ((i * 2 + seq) % 256) as u8).collect();
        Frame::new(pixels, 16, 8, seq)
    }

    fn read_u32(data: &[u8], at: usize) -> u32 {
        u32::from_le_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]])
    }

    #[test]
    fn test_header_layout() {
        let writer = AviMjpegWriter::new(Cursor::new(Vec::new()), format()).unwrap();
        let data = writer.into_inner().unwrap().into_inner();

        assert_eq!(&data[0..4], b"RIFF");
        assert_eq!(&data[8..12], b"AVI ");
        assert_eq!(&data[12..16], b"LIST");
        assert_eq!(&data[20..24], b"hdrl");
        assert_eq!(&data[24..28], b"avih");
        assert_eq!(read_u32(&data, 32), 1_000_000 / 30);
        assert_eq!(&data[100..104], b"strh");
        assert_eq!(&data[108..112], b"vids");
        assert_eq!(&data[112..116], b"MJPG");
        assert_eq!(&data[164..168], b"strf");
        assert_eq!(&data[212..216], b"LIST");
        assert_eq!(&data[220..224], b"movi");
        assert_eq!(&data[224..228], b"idx1");
        assert_eq!(read_u32(&data, 4) as usize, data.len() - 8);
    }

    #[test]
    fn test_frames_are_indexed() {
        let mut writer = AviMjpegWriter::new(Cursor::new(Vec::new()), format()).unwrap();
        for seq in 0..3 {
            writer.append(&frame(seq)).unwrap();
        }
        assert_eq!(writer.frame_count(), 3);
        let data = writer.into_inner().unwrap().into_inner();

        // Frame counts patched into avih and strh.
        assert_eq!(read_u32(&data, 48), 3);
        assert_eq!(read_u32(&data, 140), 3);

        // First chunk directly follows the movi fourcc and holds a JPEG.
        assert_eq!(&data[224..228], b"00dc");
        assert_eq!(&data[232..234], &[0xFF, 0xD8]);

        let movi_size = read_u32(&data, 216) as usize;
        let idx1 = 220 + movi_size;
        assert_eq!(&data[idx1..idx1 + 4], b"idx1");
        assert_eq!(read_u32(&data, idx1 + 4), 3 * 16);
        assert_eq!(read_u32(&data, idx1 + 16), 4);
        assert_eq!(read_u32(&data, 4) as usize, data.len() - 8);
    }

    #[test]
    fn test_rejects_mismatched_frame() {
        let mut writer = AviMjpegWriter::new(Cursor::new(Vec::new()), format()).unwrap();
        let wrong = Frame::new(vec![0; 4], 2, 2, 1);
        assert!(matches!(
            writer.append(&wrong),
            Err(SinkError::FrameSize { .. })
        ));
    }

    #[test]
    fn test_append_after_close_fails() {
        let mut writer = AviMjpegWriter::new(Cursor::new(Vec::new()), format()).unwrap();
        writer.close().unwrap();
        writer.close().unwrap();
        assert!(matches!(writer.append(&frame(0)), Err(SinkError::Closed)));
    }

    #[test]
    fn test_invalid_parameters() {
        let mut bad = format();
        bad.quality = 0;
        assert!(matches!(
            AviMjpegWriter::new(Cursor::new(Vec::new()), bad),
            Err(SinkError::InvalidParameters(_))
        ));
        bad = format();
        bad.frame_rate = 0;
        assert!(AviMjpegWriter::new(Cursor::new(Vec::new()), bad).is_err());
    }

    #[cfg(not(feature = "opencv"))]
    #[test]
    fn test_open_video_sink_writes_avi() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("video.avi");
        let mut sink = open_video_sink(&path, format()).unwrap();
        sink.append(&frame(1)).unwrap();
        sink.append(&frame(2)).unwrap();
        sink.close().unwrap();
        drop(sink);

        let data = std::fs::read(&path).unwrap();
        assert_eq!(&data[0..4], b"RIFF");
        assert_eq!(read_u32(&data, 48), 2);
    }

    #[test]
    fn test_drop_finalizes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("video.avi");
        {
            let mut writer = AviMjpegWriter::create(&path, format()).unwrap();
            writer.append(&frame(1)).unwrap();
        }
        let data = std::fs::read(&path).unwrap();
        assert_eq!(read_u32(&data, 4) as usize, data.len() - 8);
        assert_eq!(read_u32(&data, 48), 1);
    }
}
