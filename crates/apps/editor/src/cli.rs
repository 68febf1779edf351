//! Command line arguments for the editor binary
//!
//! ```bash
//! # Print the cubes and log lines of a saved project
//! editor replay project_log.txt
//!
//! # Run an input script, seeded from a log, and save the result
//! editor run clicks.toml --log project_log.txt --save out.txt
//!
//! # Which cell is under pixel (400, 300) for a tilted camera?
//! editor resolve 400 300 --tilt -30 --turn 15
//! ```

use cad::camera::CameraState;
use cad::resolver::ResolverKind;
use clap::{Args, Parser, Subcommand, ValueEnum};
use glam::DVec2;
use std::path::PathBuf;

/// CubeCAD grid editor
#[derive(Parser, Debug)]
#[command(name = "editor")]
#[command(about = "Headless CubeCAD grid editor", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub common: CommonArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Arguments shared by every subcommand
#[derive(Args, Debug, Clone, Default)]
pub struct CommonArgs {
    /// Session configuration file (TOML); defaults to the user config directory
    #[arg(long, short = 'c', value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Log at debug level when RUST_LOG is not set
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

impl CommonArgs {
    /// Get the config path if specified
    pub fn config_path(&self) -> Option<&PathBuf> {
        self.config.as_ref()
    }

    /// Filter directive used when RUST_LOG is unset
    pub fn default_log_filter(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else {
            "info"
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Load a project log and print the cube set and log lines
    Replay {
        /// Project log file
        log: PathBuf,
    },

    /// Run a TOML input script against a fresh session
    Run {
        /// Input script file
        script: PathBuf,

        /// Project log to load before the script runs
        #[arg(long, value_name = "PATH")]
        log: Option<PathBuf>,

        /// Where to save the resulting project log
        #[arg(long, value_name = "PATH")]
        save: Option<PathBuf>,
    },

    /// Print the grid cell under a pointer position
    Resolve {
        /// Pointer x in viewport pixels
        #[arg(allow_negative_numbers = true)]
        x: f64,

        /// Pointer y in viewport pixels
        #[arg(allow_negative_numbers = true)]
        y: f64,

        #[command(flatten)]
        camera: CameraArgs,

        /// Resolution strategy (defaults to the configured one)
        #[arg(long, value_enum)]
        resolver: Option<ResolverArg>,
    },
}

/// Camera pose for one-off resolution
#[derive(Args, Debug, Clone)]
pub struct CameraArgs {
    /// Rotation about the horizontal axis in degrees
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub tilt: f64,

    /// Rotation about the vertical axis in degrees
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub turn: f64,

    /// Zoom factor
    #[arg(long, default_value_t = 1.0)]
    pub zoom: f64,

    /// Horizontal pan in view units
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub pan_x: f64,

    /// Vertical pan in view units (up is positive)
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub pan_y: f64,
}

impl CameraArgs {
    pub fn state(&self) -> CameraState {
        CameraState {
            zoom: self.zoom,
            pan: DVec2::new(self.pan_x, self.pan_y),
            tilt: self.tilt,
            turn: self.turn,
        }
    }
}

/// Command-line names for the resolution strategies
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolverArg {
    RayPlane,
    Affine,
    Buckets,
}

impl From<ResolverArg> for ResolverKind {
    fn from(arg: ResolverArg) -> Self {
        match arg {
            ResolverArg::RayPlane => ResolverKind::RayPlane,
            ResolverArg::Affine => ResolverKind::Affine,
            ResolverArg::Buckets => ResolverKind::Buckets,
        }
    }
}
