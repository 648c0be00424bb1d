//! Motive Lab
//!
//! Laboratory tools driving a motion-capture system: loading and deriving
//! camera profiles, configuring cameras, and displaying or recording video
//! from a camera's frame buffer.
//!
//! # Architecture
//!
//! ```text
//! profile ──► sdk (CaptureSystem) ◄── select
//!                    │
//!                    ▼
//!   capture: update → frame buffer (retry) → display → sink
//! ```
//!
//! The capture system is reached only through [`sdk::CaptureSystem`]; a
//! [`sdk::Session`] owns it for the run and shuts it down exactly once.
//!
//! # Example
//!
//! ```no_run
//! use motive_lab::{
//!     capture::{run_capture, CaptureOptions, HeadlessDisplay, Interrupt},
//!     sdk::{Session, SimulatedSystem},
//!     select::get_camera,
//! };
//!
//! let mut session = Session::open(SimulatedSystem::default());
//! let camera = get_camera(&*session, "10187").unwrap().unwrap();
//!
//! let mut display = HeadlessDisplay::new(Interrupt::default());
//! run_capture(&mut *session, camera.id, &mut display, None, &CaptureOptions::default())
//!     .unwrap();
//!
//! session.shutdown().unwrap();
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod capture;
pub mod config;
pub mod profile;
pub mod retry;
pub mod sdk;
pub mod select;

// Re-export commonly used types at crate root
pub use capture::{run_capture, CaptureOptions, Frame, FrameDisplay, FrameSink};
pub use config::FileConfig;
pub use retry::{Backoff, RetryPolicy};
pub use sdk::{CameraId, CaptureSystem, SdkError, Session, SimulatedSystem};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
