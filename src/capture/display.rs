//! Live display of frames and operator key input.

use super::Frame;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;

/// Errors raised by a display backend.
#[derive(Debug, Error)]
pub enum DisplayError {
    /// The window system reported an error.
    #[error("display backend error: {0}")]
    Backend(String),
    /// The Ctrl-C handler could not be installed.
    #[error("failed to install interrupt handler: {0}")]
    Interrupt(#[from] ctrlc::Error),
}

/// A key pressed by the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyPress {
    /// The Escape key, also reported for Ctrl-C and a closed window.
    Escape,
    /// A character key.
    Char(char),
}

impl KeyPress {
    /// Escape and `q` stop the capture loop.
    pub fn is_cancel(self) -> bool {
        matches!(self, KeyPress::Escape | KeyPress::Char('q'))
    }
}

/// Shows frames to the operator and reports key presses.
pub trait FrameDisplay {
    /// Renders a frame.
    fn show(&mut self, frame: &Frame) -> Result<(), DisplayError>;

    /// Returns a key pressed since the last poll, without blocking.
    fn poll_key(&mut self) -> Result<Option<KeyPress>, DisplayError>;
}

/// Title of the live video window.
pub fn window_title(frame_rate: u32) -> String {
    format!(
        "Live Video. Framerate={}Hz.        (Esc or q to exit)",
        frame_rate
    )
}

/// Pending Ctrl-C, shared between the signal handler and a display.
///
/// Displays report a pending interrupt as [`KeyPress::Escape`], so the
/// capture loop stops normally and the video file is finalized.
#[derive(Debug, Clone, Default)]
pub struct Interrupt(Arc<AtomicBool>);

impl Interrupt {
    /// Installs the process-wide Ctrl-C handler.
    ///
    /// The handler can be installed once per process.
    pub fn install() -> Result<Self, DisplayError> {
        let interrupt = Self::default();
        let flag = interrupt.0.clone();
        ctrlc::set_handler(move || {
            flag.store(true, Ordering::SeqCst);
        })?;
        tracing::info!("Press Ctrl-C to stop");
        Ok(interrupt)
    }

    /// Marks an interrupt as pending.
    pub fn raise(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Returns whether an interrupt is pending and clears it.
    pub fn take(&self) -> bool {
        self.0.swap(false, Ordering::SeqCst)
    }
}

/// Display without a window.
///
/// Frames are only logged; an interrupt (Ctrl-C) is reported as Escape.
pub struct HeadlessDisplay {
    interrupt: Interrupt,
    frames_shown: u64,
}

impl HeadlessDisplay {
    /// Creates a display cancelled through `interrupt`.
    pub fn new(interrupt: Interrupt) -> Self {
        Self {
            interrupt,
            frames_shown: 0,
        }
    }

    /// Number of frames passed to [`FrameDisplay::show`].
    pub fn frames_shown(&self) -> u64 {
        self.frames_shown
    }
}

impl FrameDisplay for HeadlessDisplay {
    fn show(&mut self, frame: &Frame) -> Result<(), DisplayError> {
        self.frames_shown += 1;
        tracing::trace!(?frame, "Frame displayed");
        Ok(())
    }

    fn poll_key(&mut self) -> Result<Option<KeyPress>, DisplayError> {
        if self.interrupt.take() {
            Ok(Some(KeyPress::Escape))
        } else {
            Ok(None)
        }
    }
}

#[cfg(feature = "window")]
pub use window::WindowDisplay;

#[cfg(feature = "window")]
mod window {
    use super::{DisplayError, FrameDisplay, Interrupt, KeyPress};
    use crate::capture::Frame;
    use minifb::{Key, KeyRepeat, Window, WindowOptions};

    /// Native window showing the grayscale frames.
    ///
    /// Ctrl-C in the terminal is reported like Escape in the window.
    pub struct WindowDisplay {
        title: String,
        window: Option<Window>,
        buffer: Vec<u32>,
        interrupt: Interrupt,
    }

    impl WindowDisplay {
        /// The window opens on the first frame, sized to it.
        pub fn new(title: impl Into<String>, interrupt: Interrupt) -> Self {
            Self {
                title: title.into(),
                window: None,
                buffer: Vec::new(),
                interrupt,
            }
        }
    }

    fn backend(e: minifb::Error) -> DisplayError {
        DisplayError::Backend(e.to_string())
    }

    impl FrameDisplay for WindowDisplay {
        fn show(&mut self, frame: &Frame) -> Result<(), DisplayError> {
            let width = frame.width() as usize;
            let height = frame.height() as usize;

            if self.window.is_none() {
                let window = Window::new(&self.title, width, height, WindowOptions::default())
                    .map_err(backend)?;
                self.window = Some(window);
            }

            self.buffer.clear();
            self.buffer.extend(frame.pixels().iter().map(|&v| {
                let v = v as u32;
                (v << 16) | (v << 8) | v
            }));

            if let Some(window) = self.window.as_mut() {
                window
                    .update_with_buffer(&self.buffer, width, height)
                    .map_err(backend)?;
            }
            Ok(())
        }

        fn poll_key(&mut self) -> Result<Option<KeyPress>, DisplayError> {
            if self.interrupt.take() {
                return Ok(Some(KeyPress::Escape));
            }
            let Some(window) = self.window.as_ref() else {
                return Ok(None);
            };
            // Closing the window counts as cancel.
            if !window.is_open() {
                return Ok(Some(KeyPress::Escape));
            }
            let key = window
                .get_keys_pressed(KeyRepeat::No)
                .into_iter()
                .find_map(|key| match key {
                    Key::Escape => Some(KeyPress::Escape),
                    Key::Q => Some(KeyPress::Char('q')),
                    _ => None,
                });
            Ok(key)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_keys() {
        assert!(KeyPress::Escape.is_cancel());
        assert!(KeyPress::Char('q').is_cancel());
        assert!(!KeyPress::Char('Q').is_cancel());
        assert!(!KeyPress::Char(' ').is_cancel());
    }

    #[test]
    fn test_headless_interrupt_reports_escape_once() {
        let interrupt = Interrupt::default();
        let mut display = HeadlessDisplay::new(interrupt.clone());

        assert_eq!(display.poll_key().unwrap(), None);
        interrupt.raise();
        assert_eq!(display.poll_key().unwrap(), Some(KeyPress::Escape));
        assert_eq!(display.poll_key().unwrap(), None);
    }

    #[cfg(feature = "window")]
    #[test]
    fn test_window_reports_interrupt_as_escape() {
        let interrupt = Interrupt::default();
        let mut display = WindowDisplay::new(window_title(30), interrupt.clone());

        assert_eq!(display.poll_key().unwrap(), None);
        interrupt.raise();
        assert_eq!(display.poll_key().unwrap(), Some(KeyPress::Escape));
        assert_eq!(display.poll_key().unwrap(), None);
    }

    #[test]
    fn test_headless_counts_frames() {
        let mut display = HeadlessDisplay::new(Interrupt::default());
        let frame = Frame::new(vec![0; 4], 2, 2, 1);
        display.show(&frame).unwrap();
        display.show(&frame).unwrap();
        assert_eq!(display.frames_shown(), 2);
    }

    #[test]
    fn test_window_title() {
        assert_eq!(
            window_title(100),
            "Live Video. Framerate=100Hz.        (Esc or q to exit)"
        );
    }
}
