//! Visible-light profile tool
//!
//! Loads a profile, sets every camera up for visible-light video and saves
//! the result as `<profile>_vislight.motive`.

use anyhow::{bail, Context};
use clap::Parser;
use motive_lab::{
    config::FileConfig,
    profile::{write_vislight_profile, BackupPolicy},
    sdk::{Session, SimulatedSystem},
    select::{pick_profile_file, TerminalPicker},
};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "motive-vislight",
    version,
    about = "Derives a visible-light camera profile from an existing profile."
)]
struct Args {
    /// Profile file to start from; chosen interactively if omitted.
    #[arg(short = 'p', value_name = "FILE")]
    profile_file: Option<PathBuf>,

    /// TOML configuration file.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => FileConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => FileConfig::default(),
    };
    let backup = BackupPolicy::from_config(&config.backup)?;

    let profile = match args.profile_file {
        Some(path) => path,
        None => {
            let dir = std::env::current_dir()?;
            match pick_profile_file(&dir, &mut TerminalPicker::stdio())? {
                Some(path) => path,
                None => bail!("no profile file chosen"),
            }
        }
    };

    let mut session = Session::open(SimulatedSystem::new(&config.simulation));
    let output = write_vislight_profile(&mut *session, &profile, &backup)?;
    session.shutdown()?;

    println!("{}", output.display());
    Ok(())
}
