//! Acquisition loop: update, fetch, display, record.

use super::{DisplayError, FrameDisplay, FrameSink, SinkError};
use crate::retry::{RetryError, RetryPolicy};
use crate::sdk::{CameraId, CaptureSystem, SdkError};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Errors that end the capture loop.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("no frame from {camera}: timed out after {timeout:?}")]
    FrameTimeout { camera: CameraId, timeout: Duration },
    #[error(transparent)]
    Sdk(#[from] SdkError),
    #[error(transparent)]
    Display(#[from] DisplayError),
    #[error(transparent)]
    Sink(#[from] SinkError),
}

/// Loop parameters.
#[derive(Debug, Clone)]
pub struct CaptureOptions {
    /// Recording time limit. Only applies when a sink is given.
    pub max_duration: Duration,
    /// Retry policy for fetching each frame.
    pub frame_retry: RetryPolicy,
    /// Minimum time between displayed frames; `None` shows every frame.
    pub display_interval: Option<Duration>,
    /// Minimum time between recorded frames; `None` records every frame.
    pub write_interval: Option<Duration>,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            max_duration: Duration::from_secs(60),
            frame_retry: RetryPolicy::default(),
            display_interval: None,
            write_interval: None,
        }
    }
}

/// Why the loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Recording ran past the time limit.
    TimeLimit,
    /// The operator pressed a cancel key.
    Cancelled,
}

/// Counters for a finished loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureSummary {
    /// Frames fetched from the camera.
    pub iterations: u64,
    /// Frames passed to the display.
    pub frames_displayed: u64,
    /// Frames appended to the sink.
    pub frames_written: u64,
    /// Wall time spent in the loop.
    pub elapsed: Duration,
    /// What ended the loop.
    pub stop_reason: StopReason,
}

/// Gate letting an action through at most once per interval.
struct Pacer {
    interval: Option<Duration>,
    next: Option<Instant>,
}

impl Pacer {
    fn new(interval: Option<Duration>) -> Self {
        Self {
            interval,
            next: None,
        }
    }

    fn due(&mut self, now: Instant) -> bool {
        let Some(interval) = self.interval else {
            return true;
        };
        match self.next {
            Some(next) if now < next => false,
            _ => {
                self.next = now.checked_add(interval);
                true
            }
        }
    }
}

/// Instantaneous loop rate, measured between consecutive ticks.
struct RateMeter {
    last: Instant,
}

impl RateMeter {
    fn new(now: Instant) -> Self {
        Self { last: now }
    }

    fn tick(&mut self, now: Instant) -> f64 {
        let dt = now.duration_since(self.last).as_secs_f64();
        self.last = now;
        (1.0 / (dt + 1e-5)).round()
    }
}

/// Runs the live video loop for one camera.
///
/// Each iteration polls the display for a key, advances the capture system,
/// fetches the camera's frame buffer (retrying while no frame is available),
/// shows it, and appends it to `sink` if one is given. With a sink the loop
/// stops once the elapsed time exceeds `max_duration`; without one only a
/// cancel key stops it. The sink is closed on every exit path.
pub fn run_capture<S, D>(
    system: &mut S,
    camera: CameraId,
    display: &mut D,
    mut sink: Option<&mut dyn FrameSink>,
    options: &CaptureOptions,
) -> Result<CaptureSummary, CaptureError>
where
    S: CaptureSystem + ?Sized,
    D: FrameDisplay + ?Sized,
{
    let result = capture_frames(system, camera, display, &mut sink, options);

    let Some(sink) = sink else {
        tracing::info!("Did not write video to file");
        return result;
    };
    match (result, sink.close()) {
        (Ok(summary), Ok(())) => {
            tracing::info!(frames = summary.frames_written, "Wrote video to file");
            Ok(summary)
        }
        (Ok(_), Err(e)) => Err(e.into()),
        (Err(e), close) => {
            if let Err(close_err) = close {
                tracing::warn!(error = %close_err, "Failed to close video after capture error");
            }
            Err(e)
        }
    }
}

fn capture_frames<S, D>(
    system: &mut S,
    camera: CameraId,
    display: &mut D,
    sink: &mut Option<&mut dyn FrameSink>,
    options: &CaptureOptions,
) -> Result<CaptureSummary, CaptureError>
where
    S: CaptureSystem + ?Sized,
    D: FrameDisplay + ?Sized,
{
    let start = Instant::now();
    let mut meter = RateMeter::new(start);
    let mut display_pacer = Pacer::new(options.display_interval);
    let mut write_pacer = Pacer::new(options.write_interval);

    let mut iterations = 0u64;
    let mut frames_displayed = 0u64;
    let mut frames_written = 0u64;

    tracing::info!(
        %camera,
        recording = sink.is_some(),
        max_duration = ?options.max_duration,
        "Capture started"
    );

    let stop_reason = loop {
        let key = display.poll_key()?;
        let fps = meter.tick(Instant::now());
        tracing::debug!(fps, "Loop rate");

        system.update()?;
        let frame = options
            .frame_retry
            .run(|| system.frame_buffer(camera))
            .map_err(|e| match e {
                RetryError::TimedOut(timeout) => CaptureError::FrameTimeout { camera, timeout },
                RetryError::Failed(e) => CaptureError::Sdk(e),
            })?;
        iterations += 1;

        let now = Instant::now();
        if display_pacer.due(now) {
            display.show(&frame)?;
            frames_displayed += 1;
        }

        if let Some(sink) = sink.as_deref_mut() {
            if write_pacer.due(now) {
                sink.append(&frame)?;
                frames_written += 1;
            }
            if start.elapsed() > options.max_duration {
                break StopReason::TimeLimit;
            }
        }

        if key.is_some_and(|k| k.is_cancel()) {
            break StopReason::Cancelled;
        }
    };

    let summary = CaptureSummary {
        iterations,
        frames_displayed,
        frames_written,
        elapsed: start.elapsed(),
        stop_reason,
    };
    tracing::info!(
        iterations,
        frames_written,
        elapsed = ?summary.elapsed,
        reason = ?stop_reason,
        "Capture stopped"
    );
    Ok(summary)
}
