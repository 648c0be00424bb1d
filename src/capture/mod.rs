//! Live video: frames, display, recording and the acquisition loop.
//!
//! Frames are pulled from a camera's frame buffer through the capture
//! system, shown on a [`FrameDisplay`], and optionally appended to a
//! [`FrameSink`].

mod capture_loop;
mod display;
mod frame;
#[cfg(feature = "opencv")]
mod opencv_writer;
mod writer;

pub use capture_loop::{run_capture, CaptureError, CaptureOptions, CaptureSummary, StopReason};
#[cfg(feature = "window")]
pub use display::WindowDisplay;
pub use display::{
    window_title, DisplayError, FrameDisplay, HeadlessDisplay, Interrupt, KeyPress,
};
pub use frame::Frame;
#[cfg(feature = "opencv")]
pub use opencv_writer::OpenCvVideoWriter;
pub use writer::{open_video_sink, AviMjpegWriter, FrameSink, SinkError, VideoFormat};
