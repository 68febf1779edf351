//! Session configuration
//!
//! Stored as TOML, by default at `<config dir>/cubecad/config.toml`. Every
//! field has a default, so a partial file (or none at all) is valid:
//!
//! ```toml
//! [grid]
//! columns = 16
//! rows = 16
//!
//! [camera]
//! tilt_sensitivity = 0.25
//! zoom_max = inf          # no upper zoom bound
//!
//! [editor]
//! resolver = "buckets"
//! placement_policy = "toggle"
//! ```

use crate::camera::{CameraConfig, Projection, Viewport, ZoomPolicy};
use crate::error::{Error, Result};
use crate::grid::GridSize;
use crate::input::{DragBindings, MouseButton};
use crate::placement::{EditMode, PlacementPolicy};
use crate::resolver::{ResolverKind, MAX_BUCKET_CELLS};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Grid dimensions and cell size
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub columns: u32,
    pub rows: u32,
    /// Cell edge length in world units
    pub cell_size: f64,
}

impl Default for GridConfig {
    fn default() -> Self {
        let size = GridSize::default();
        Self {
            columns: size.columns,
            rows: size.rows,
            cell_size: 1.0,
        }
    }
}

impl GridConfig {
    pub fn size(&self) -> GridSize {
        GridSize::new(self.columns, self.rows)
    }
}

/// Editing behaviour
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Pointer resolution strategy
    pub resolver: ResolverKind,
    /// How clicks change occupancy
    pub placement_policy: PlacementPolicy,
    /// Mode the session starts in
    pub initial_mode: EditMode,
    /// Buttons driving orbit and pan drags
    pub drag: DragBindings,
}

/// Complete configuration for one editing session
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub grid: GridConfig,
    pub camera: CameraConfig,
    pub viewport: Viewport,
    pub editor: EditorConfig,
}

impl SessionConfig {
    /// Default config file location
    pub fn default_path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|p| p.join("cubecad").join("config.toml"))
            .ok_or(Error::NoConfigDir)
    }

    /// Parse and validate a TOML document
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate the config at `path`
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|err| Error::io(path, err))?;
        let config = Self::from_toml(&content)?;
        info!(path = %path.display(), "loaded session config");
        Ok(config)
    }

    /// Load the config at the default location, or defaults when there is none
    pub fn load_or_default() -> Result<Self> {
        let path = match Self::default_path() {
            Ok(path) => path,
            Err(Error::NoConfigDir) => {
                debug!("no config directory, using default session config");
                return Ok(Self::default());
            }
            Err(err) => return Err(err),
        };
        if !path.exists() {
            debug!(path = %path.display(), "no session config, using defaults");
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Save to `path`, creating parent directories if needed
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.validate()?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| Error::io(parent, err))?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).map_err(|err| Error::io(path, err))?;
        info!(path = %path.display(), "saved session config");
        Ok(())
    }

    /// Reject values a session cannot work with
    pub fn validate(&self) -> Result<()> {
        let grid = &self.grid;
        if grid.columns == 0 || grid.rows == 0 {
            return invalid(format!(
                "grid must have at least one cell, got {}x{}",
                grid.columns, grid.rows
            ));
        }
        if grid.columns > i32::MAX as u32 || grid.rows > i32::MAX as u32 {
            return invalid("grid dimensions exceed the cell coordinate range");
        }
        if !positive(grid.cell_size) {
            return invalid(format!("grid.cell_size must be positive, got {}", grid.cell_size));
        }

        if !positive(self.viewport.width) || !positive(self.viewport.height) {
            return invalid(format!(
                "viewport must have a positive size, got {}x{}",
                self.viewport.width, self.viewport.height
            ));
        }

        self.validate_camera()?;

        let drag = self.editor.drag;
        if drag.orbit == drag.pan {
            return invalid("orbit and pan drags must use different buttons");
        }
        if drag.orbit == MouseButton::Left || drag.pan == MouseButton::Left {
            return invalid("the left button is reserved for placing cubes");
        }
        if self.editor.resolver == ResolverKind::Affine
            && !matches!(self.camera.projection, Projection::Orthographic)
        {
            return invalid("the affine resolver requires an orthographic projection");
        }
        let cells = u64::from(grid.columns) * u64::from(grid.rows);
        if self.editor.resolver == ResolverKind::Buckets && cells > MAX_BUCKET_CELLS as u64 {
            return invalid(format!(
                "the buckets resolver supports at most {MAX_BUCKET_CELLS} cells, got {cells}"
            ));
        }
        Ok(())
    }

    fn validate_camera(&self) -> Result<()> {
        let camera = &self.camera;
        if !positive(camera.zoom_min) {
            return invalid(format!("camera.zoom_min must be positive, got {}", camera.zoom_min));
        }
        let max = camera.zoom_max;
        if max.is_nan() || max < camera.zoom_min {
            return invalid(format!(
                "camera.zoom_max ({max}) must be at least zoom_min ({})",
                camera.zoom_min
            ));
        }
        let zoom = camera.initial.zoom;
        if !zoom.is_finite() || camera.clamp_zoom(zoom) != zoom {
            return invalid(format!("camera.initial.zoom ({zoom}) is outside the zoom bounds"));
        }
        if !positive(camera.pixels_per_unit) {
            return invalid("camera.pixels_per_unit must be positive");
        }
        let sensitivities = [
            camera.tilt_sensitivity,
            camera.turn_sensitivity,
            camera.pan_sensitivity,
        ];
        if sensitivities.iter().any(|k| !k.is_finite()) {
            return invalid("camera sensitivities must be finite");
        }

        match camera.zoom_policy {
            ZoomPolicy::Multiplicative { base, step } => {
                if !positive(base) || base == 1.0 || !step.is_finite() || step == 0.0 {
                    return invalid("multiplicative zoom needs base > 0, base != 1 and a non-zero step");
                }
            }
            ZoomPolicy::Additive { divisor } => {
                if !divisor.is_finite() || divisor == 0.0 {
                    return invalid("additive zoom needs a non-zero divisor");
                }
            }
        }

        if let Projection::Perspective {
            fov_y_degrees,
            near,
            far,
            eye_distance,
        } = camera.projection
        {
            if !positive(fov_y_degrees) || fov_y_degrees >= 180.0 {
                return invalid(format!("fov_y_degrees must be in (0, 180), got {fov_y_degrees}"));
            }
            if !positive(near) || !far.is_finite() || far <= near {
                return invalid(format!("perspective needs 0 < near < far, got {near}..{far}"));
            }
            if !positive(eye_distance) {
                return invalid("perspective eye_distance must be positive");
            }
        }
        Ok(())
    }
}

fn positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

fn invalid(message: impl Into<String>) -> Result<()> {
    Err(Error::InvalidConfig(message.into()))
}
