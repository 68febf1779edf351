//! CubeCAD grid editor
//!
//! # Usage
//!
//! ```bash
//! # Print the cubes and log lines of a saved project
//! editor replay project_log.txt
//!
//! # Run an input script and save the resulting log
//! editor run clicks.toml --save project_log.txt
//!
//! # Resolve a pointer position with a custom config
//! editor --config cubecad.toml resolve 400 300 --tilt -30
//! ```

use anyhow::{Context, Result};
use cad::SessionConfig;
use clap::Parser;
use editor::{Cli, Command};
use glam::DVec2;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.common.default_log_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = match cli.common.config_path() {
        Some(path) => SessionConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => SessionConfig::load_or_default().context("Failed to load default config")?,
    };

    let output = match &cli.command {
        Command::Replay { log } => editor::commands::replay(&config, log)
            .with_context(|| format!("Failed to replay {}", log.display()))?,
        Command::Run { script, log, save } => {
            editor::commands::run(&config, script, log.as_deref(), save.as_deref())
                .with_context(|| format!("Failed to run script {}", script.display()))?
        }
        Command::Resolve {
            x,
            y,
            camera,
            resolver,
        } => editor::commands::resolve(&config, DVec2::new(*x, *y), camera, *resolver)
            .context("Failed to resolve pointer")?,
    };

    print!("{output}");
    Ok(())
}
