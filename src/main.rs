//! Motive camera video tool
//!
//! Shows the live video of one camera and, unless told otherwise, records
//! it to a Motion-JPEG AVI file.

use anyhow::{bail, Context};
use clap::Parser;
use motive_lab::{
    capture::{
        open_video_sink, run_capture, window_title, FrameDisplay, FrameSink, HeadlessDisplay,
        Interrupt, VideoFormat,
    },
    config::FileConfig,
    profile::{last_profile_path, load_profile, BackupPolicy},
    sdk::{CameraId, CaptureSystem, Session, SimulatedSystem},
    select::{get_camera, pick_camera, pick_profile_file, TerminalPicker},
};
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Parser)]
#[command(
    name = "motive-video",
    version,
    about = "This is the motive camera video tool. It can show and save the video data from any camera.",
    after_help = "If no profile is given, a list of profile files in the current directory is offered to choose from."
)]
struct Args {
    /// Name of the profile file to load.
    #[arg(short = 'p', value_name = "FILE", conflicts_with = "last_profile")]
    profile_file: Option<PathBuf>,

    /// Load the last backed-up profile.
    #[arg(short = 'l', long = "last")]
    last_profile: bool,

    /// Name (or part of it) of the camera from which to get the video.
    #[arg(short = 'c', value_name = "NAME")]
    camera_name: Option<String>,

    /// Maximum recording time in seconds (the actual time unless stopped manually).
    #[arg(short = 't', value_name = "SECONDS")]
    record_time: Option<f64>,

    /// Show the video without saving it.
    #[arg(short = 's')]
    show_only: bool,

    /// Name of the file the video will be saved as.
    #[arg(short = 'f', value_name = "FILE")]
    video_filename: Option<PathBuf>,

    /// Recorded frames per second, independent of the display rate.
    #[arg(long, value_name = "FPS")]
    write_fps: Option<f64>,

    /// Displayed frames per second.
    #[arg(long, value_name = "FPS")]
    display_fps: Option<f64>,

    /// Log frames instead of opening a video window.
    #[arg(long)]
    headless: bool,

    /// TOML configuration file.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();
    info!("Motive video v{}", motive_lab::VERSION);

    let config = load_config(&args)?;
    let backup = BackupPolicy::from_config(&config.backup)?;

    let mut session = Session::open(SimulatedSystem::new(&config.simulation));

    let profile = resolve_profile(&args, &config)?;
    load_profile(&mut *session, &profile, &backup)
        .with_context(|| format!("failed to load profile {}", profile.display()))?;

    let camera = resolve_camera(&*session, args.camera_name.as_deref())?;
    let settings = session.camera_settings(camera)?;

    let mut display = open_display(args.headless, settings.frame_rate)?;
    let mut writer = if args.show_only {
        None
    } else {
        let format = VideoFormat {
            frame_rate: settings.frame_rate,
            resolution: settings.resolution,
            quality: config.capture.jpeg_quality,
        };
        Some(open_video_sink(&config.capture.video_file, format)?)
    };

    let summary = run_capture(
        &mut *session,
        camera,
        &mut *display,
        writer.as_mut().map(|w| &mut **w as &mut dyn FrameSink),
        &config.capture_options(),
    )?;

    info!(
        frames = summary.iterations,
        written = summary.frames_written,
        reason = ?summary.stop_reason,
        "Done"
    );

    drop(writer);
    session.shutdown()?;
    Ok(())
}

fn load_config(args: &Args) -> anyhow::Result<FileConfig> {
    let mut config = match &args.config {
        Some(path) => FileConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => FileConfig::default(),
    };

    if let Some(secs) = args.record_time {
        config.capture.record_secs = secs;
    }
    if let Some(file) = &args.video_filename {
        config.capture.video_file = file.clone();
    }
    if args.write_fps.is_some() {
        config.capture.write_fps = args.write_fps;
    }
    if args.display_fps.is_some() {
        config.capture.display_fps = args.display_fps;
    }
    config.validate()?;
    Ok(config)
}

fn resolve_profile(args: &Args, config: &FileConfig) -> anyhow::Result<PathBuf> {
    if args.last_profile {
        return Ok(last_profile_path(&config.backup)?);
    }
    if let Some(path) = &args.profile_file {
        return Ok(path.clone());
    }
    let dir = std::env::current_dir()?;
    match pick_profile_file(&dir, &mut TerminalPicker::stdio())? {
        Some(path) => Ok(path),
        None => bail!("no profile file chosen"),
    }
}

fn resolve_camera<S: CaptureSystem>(system: &S, name: Option<&str>) -> anyhow::Result<CameraId> {
    let camera = match name {
        Some(name) => get_camera(system, name)?
            .map(|cam| cam.id)
            .with_context(|| format!("no camera name contains '{}'", name))?,
        None => pick_camera(system, &mut TerminalPicker::stdio())?.context("no camera chosen")?,
    };
    Ok(camera)
}

#[cfg(feature = "window")]
fn open_display(headless: bool, frame_rate: u32) -> anyhow::Result<Box<dyn FrameDisplay>> {
    let interrupt = Interrupt::install()?;
    if headless {
        return Ok(Box::new(HeadlessDisplay::new(interrupt)));
    }
    Ok(Box::new(motive_lab::capture::WindowDisplay::new(
        window_title(frame_rate),
        interrupt,
    )))
}

#[cfg(not(feature = "window"))]
fn open_display(_headless: bool, frame_rate: u32) -> anyhow::Result<Box<dyn FrameDisplay>> {
    info!("{}", window_title(frame_rate));
    Ok(Box::new(HeadlessDisplay::new(Interrupt::install()?)))
}
