//! Core of the CubeCAD grid editor
//!
//! Places unit cubes on a 2D grid seen through an orbit/pan/zoom camera. This
//! crate holds everything except the window, the widgets and the drawing:
//! the host delivers pointer events and renders [`session::RenderView`]
//! snapshots.
//!
//! # Modules
//!
//! - [`camera`]: orbit camera with forward and inverse transforms
//! - [`resolver`]: pointer-to-grid-cell strategies (ray/plane, inverse affine, screen buckets)
//! - [`placement`]: cube set, edit modes and the append-only placement log
//! - [`project_log`]: project log text format, load and save
//! - [`input`]: pointer events and drag tracking
//! - [`session`]: one editing session wiring the above together
//! - [`config`]: TOML session configuration
//! - [`grid`]: grid cells and dimensions

pub mod camera;
pub mod config;
pub mod error;
pub mod grid;
pub mod input;
pub mod placement;
pub mod project_log;
pub mod resolver;
pub mod session;

pub use camera::{CameraConfig, CameraModel, CameraState, DragMode, Projection, Viewport, ZoomPolicy};
pub use config::SessionConfig;
pub use error::{Error, Result};
pub use grid::{GridCell, GridSize};
pub use input::{InputEvent, MouseButton};
pub use placement::{CubeSet, EditMode, PlacementAction, PlacementEvent, PlacementLog, PlacementPolicy};
pub use resolver::{PointerResolver, ResolveMiss, ResolverKind};
pub use session::{EditorSession, RenderView, SessionUpdate};
