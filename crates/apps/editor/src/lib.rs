//! Headless CubeCAD grid editor
//!
//! Drives a [`cad::EditorSession`] from the command line: replays saved
//! project logs, runs TOML input scripts and resolves single pointer
//! positions. Windowing and rendering hosts embed `cad` directly.

pub mod cli;
pub mod commands;
pub mod script;

pub use cli::{Cli, Command, CommonArgs};
pub use script::{InputScript, ScriptAction, ScriptReport, ScriptStep};
