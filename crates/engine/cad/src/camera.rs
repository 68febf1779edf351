//! Orbit/pan/zoom camera for the grid viewport
//!
//! The camera maps world coordinates (grid on the z=0 plane, +Z up out of the
//! grid) to viewport pixels and back.
//!
//! # Components
//!
//! - [`CameraState`]: the mutable part (zoom, pan, tilt, turn)
//! - [`CameraConfig`]: sensitivities, zoom policy and limits, projection kind
//! - [`CameraModel`]: state + config + viewport, with forward and inverse transforms
//!
//! # Transform pipeline
//!
//! 1. Rotate about X by `tilt`, producing intermediate Y/Z
//! 2. Rotate about Y by `turn`, using the intermediate Z
//! 3. Scale (orthographic: `zoom * pixels_per_unit`; perspective: `pixels_per_unit`)
//! 4. Translate by `pan` (perspective additionally pushes the scene `eye_distance / zoom` away)
//! 5. Project (orthographic: one view unit per pixel; perspective: vertical FOV)
//! 6. Map to pixels with the viewport centre as origin and Y pointing down
//!
//! The rotation order is fixed: swapping it changes how dragging feels.

use glam::{DAffine2, DMat2, DMat3, DMat4, DVec2, DVec3, DVec4};
use serde::{Deserialize, Serialize};

// ============================================================================
// Camera State
// ============================================================================

/// Mutable camera parameters
///
/// Orbit angles are in degrees and accumulate without wrapping; only their
/// sine and cosine are ever used.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraState {
    /// Scale factor, always within the configured zoom bounds
    pub zoom: f64,
    /// Translation in view units, Y up
    pub pan: DVec2,
    /// Rotation about the horizontal (X) axis in degrees
    pub tilt: f64,
    /// Rotation about the vertical (Y) axis in degrees
    pub turn: f64,
}

impl Default for CameraState {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            pan: DVec2::ZERO,
            tilt: 0.0,
            turn: 0.0,
        }
    }
}

// ============================================================================
// Configuration
// ============================================================================

/// Half of the depth range covered by the orthographic projection, in view units
const ORTHO_HALF_DEPTH: f64 = 1.0e6;

/// Projection used by the viewport
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Projection {
    /// Flat painter-style view: one view unit per pixel
    Orthographic,
    /// OpenGL-style perspective view
    Perspective {
        /// Vertical field of view in degrees
        fov_y_degrees: f64,
        /// Near clip distance
        near: f64,
        /// Far clip distance
        far: f64,
        /// Distance from the eye to the orbit target at zoom 1
        eye_distance: f64,
    },
}

impl Projection {
    /// Perspective defaults matching a 45 degree lens looking from 20 units away
    pub const fn perspective() -> Self {
        Self::Perspective {
            fov_y_degrees: 45.0,
            near: 1.0,
            far: 200.0,
            eye_distance: 20.0,
        }
    }
}

/// How wheel deltas change the zoom factor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ZoomPolicy {
    /// `zoom *= base ^ (delta / step)`; one wheel notch is `step`
    Multiplicative { base: f64, step: f64 },
    /// `zoom += delta / divisor`
    Additive { divisor: f64 },
}

impl Default for ZoomPolicy {
    fn default() -> Self {
        Self::Multiplicative {
            base: 1.2,
            step: 120.0,
        }
    }
}

/// Which camera parameter a pointer drag changes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DragMode {
    Orbit,
    Pan,
}

/// Viewport size in pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
        }
    }
}

impl Viewport {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Pixel position of the viewport centre
    pub fn center(&self) -> DVec2 {
        DVec2::new(self.width / 2.0, self.height / 2.0)
    }

    pub fn aspect(&self) -> f64 {
        self.width / self.height
    }
}

/// Configuration for [`CameraModel`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Projection kind and its parameters
    pub projection: Projection,
    /// World-to-view scale at zoom 1
    pub pixels_per_unit: f64,
    /// Degrees of tilt per pixel of vertical drag
    pub tilt_sensitivity: f64,
    /// Degrees of turn per pixel of horizontal drag
    pub turn_sensitivity: f64,
    /// View units of pan per pixel of drag
    pub pan_sensitivity: f64,
    /// Wheel handling
    pub zoom_policy: ZoomPolicy,
    /// Lower zoom bound
    pub zoom_min: f64,
    /// Upper zoom bound (`f64::INFINITY` for none)
    pub zoom_max: f64,
    /// State the camera starts in and returns to on reset
    pub initial: CameraState,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self::orthographic()
    }
}

impl CameraConfig {
    /// Flat view: pan follows the pointer pixel for pixel
    pub fn orthographic() -> Self {
        Self {
            projection: Projection::Orthographic,
            pixels_per_unit: 32.0,
            tilt_sensitivity: 0.5,
            turn_sensitivity: 0.5,
            pan_sensitivity: 1.0,
            zoom_policy: ZoomPolicy::default(),
            zoom_min: 0.1,
            zoom_max: 50.0,
            initial: CameraState::default(),
        }
    }

    /// OpenGL-style view: pan moves the scene by a hundredth of a unit per pixel
    pub fn perspective() -> Self {
        Self {
            projection: Projection::perspective(),
            pixels_per_unit: 1.0,
            pan_sensitivity: 0.01,
            ..Self::orthographic()
        }
    }

    /// Clamp a zoom value into the configured bounds
    pub fn clamp_zoom(&self, zoom: f64) -> f64 {
        zoom.max(self.zoom_min).min(self.zoom_max)
    }
}

// ============================================================================
// Ray
// ============================================================================

/// Segment between two unprojected depth samples of the same pixel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    /// World point at the near depth sample
    pub near: DVec3,
    /// World point at the far depth sample
    pub far: DVec3,
}

impl Ray {
    /// Point at parameter `t` (0 = near, 1 = far)
    pub fn point_at(&self, t: f64) -> DVec3 {
        self.near + (self.far - self.near) * t
    }

    /// Parameter where the segment's line crosses the z=0 plane
    ///
    /// `None` when the ray runs parallel to the plane.
    pub fn ground_parameter(&self) -> Option<f64> {
        let span = self.far - self.near;
        if span.z.abs() <= 1e-9 * span.length() {
            return None;
        }
        Some(-self.near.z / span.z)
    }
}

// ============================================================================
// Camera Model
// ============================================================================

/// Camera owned by one viewport session
///
/// # Examples
///
/// ```
/// use cad::camera::{CameraConfig, CameraModel, DragMode, Viewport};
/// use glam::DVec3;
///
/// let mut camera = CameraModel::new(CameraConfig::orthographic(), Viewport::new(500.0, 500.0));
/// camera.apply_drag(10.0, -20.0, DragMode::Orbit);
/// assert_eq!(camera.state().tilt, -10.0);
/// assert_eq!(camera.state().turn, 5.0);
///
/// let screen = camera.project(DVec3::new(1.0, 2.0, 0.0));
/// let ray = camera.unproject_ray(screen, 0.0, 1.0);
/// let t = ray.ground_parameter().unwrap();
/// assert!((ray.point_at(t) - DVec3::new(1.0, 2.0, 0.0)).length() < 1e-6);
/// ```
#[derive(Debug, Clone)]
pub struct CameraModel {
    state: CameraState,
    config: CameraConfig,
    viewport: Viewport,
    revision: u64,
}

impl CameraModel {
    /// Create a camera in the configured initial state
    pub fn new(config: CameraConfig, viewport: Viewport) -> Self {
        let mut state = config.initial;
        state.zoom = config.clamp_zoom(state.zoom);
        Self {
            state,
            config,
            viewport,
            revision: 0,
        }
    }

    pub fn state(&self) -> &CameraState {
        &self.state
    }

    pub fn config(&self) -> &CameraConfig {
        &self.config
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Counter bumped on every change that moves projected geometry
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn is_orthographic(&self) -> bool {
        matches!(self.config.projection, Projection::Orthographic)
    }

    /// Replace the whole state (zoom is clamped)
    pub fn set_state(&mut self, mut state: CameraState) {
        state.zoom = self.config.clamp_zoom(state.zoom);
        self.state = state;
        self.touch();
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.touch();
    }

    /// Return to the configured initial state
    pub fn reset(&mut self) {
        let initial = self.config.initial;
        self.set_state(initial);
        tracing::debug!("Camera reset");
    }

    fn touch(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }

    /// Apply a pointer drag of `(dx, dy)` pixels
    pub fn apply_drag(&mut self, dx: f64, dy: f64, mode: DragMode) {
        match mode {
            DragMode::Orbit => {
                self.state.tilt += dy * self.config.tilt_sensitivity;
                self.state.turn += dx * self.config.turn_sensitivity;
            }
            DragMode::Pan => {
                // Screen Y grows downward, view Y grows upward
                self.state.pan += DVec2::new(dx, -dy) * self.config.pan_sensitivity;
            }
        }
        self.touch();
    }

    /// Apply a wheel delta (120 per notch on most mice)
    ///
    /// Returns whether the zoom factor changed.
    pub fn apply_zoom(&mut self, wheel_delta: f64) -> bool {
        let zoom = self.state.zoom;
        let proposed = match self.config.zoom_policy {
            ZoomPolicy::Multiplicative { base, step } => zoom * base.powf(wheel_delta / step),
            ZoomPolicy::Additive { divisor } => zoom + wheel_delta / divisor,
        };

        if proposed.is_nan() {
            tracing::warn!(wheel_delta, "Ignoring wheel delta that produced a NaN zoom");
            return false;
        }

        let clamped = self.config.clamp_zoom(proposed);
        if !clamped.is_finite() || clamped == zoom {
            return false;
        }

        self.state.zoom = clamped;
        self.touch();
        true
    }

    // ------------------------------------------------------------------------
    // Transforms
    // ------------------------------------------------------------------------

    /// Orbit rotation: tilt about X first, then turn about Y
    pub fn rotation(&self) -> DMat3 {
        DMat3::from_rotation_y(self.state.turn.to_radians())
            * DMat3::from_rotation_x(self.state.tilt.to_radians())
    }

    /// World to view space
    pub fn view_matrix(&self) -> DMat4 {
        let (scale, depth) = match self.config.projection {
            Projection::Orthographic => (
                self.state.zoom * self.config.pixels_per_unit,
                ORTHO_HALF_DEPTH,
            ),
            Projection::Perspective { eye_distance, .. } => {
                (self.config.pixels_per_unit, eye_distance / self.state.zoom)
            }
        };

        DMat4::from_translation(self.state.pan.extend(-depth))
            * DMat4::from_scale(DVec3::splat(scale))
            * DMat4::from_mat3(self.rotation())
    }

    /// View space to clip space
    pub fn projection_matrix(&self) -> DMat4 {
        match self.config.projection {
            Projection::Orthographic => {
                let half = self.viewport.center();
                DMat4::orthographic_rh_gl(
                    -half.x,
                    half.x,
                    -half.y,
                    half.y,
                    0.0,
                    2.0 * ORTHO_HALF_DEPTH,
                )
            }
            Projection::Perspective {
                fov_y_degrees,
                near,
                far,
                ..
            } => DMat4::perspective_rh_gl(
                fov_y_degrees.to_radians(),
                self.viewport.aspect(),
                near,
                far,
            ),
        }
    }

    /// World to clip space
    pub fn view_projection(&self) -> DMat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Project a world point to viewport pixels plus window depth in `[0, 1]`
    pub fn project_with_depth(&self, world: DVec3) -> DVec3 {
        let clip = self.view_projection() * world.extend(1.0);
        let ndc = clip.truncate() / clip.w;
        DVec3::new(
            (ndc.x + 1.0) * 0.5 * self.viewport.width,
            (1.0 - ndc.y) * 0.5 * self.viewport.height,
            (ndc.z + 1.0) * 0.5,
        )
    }

    /// Project a world point to viewport pixels
    pub fn project(&self, world: DVec3) -> DVec2 {
        self.project_with_depth(world).truncate()
    }

    /// World point under `screen` at window depth `depth` (0 = near, 1 = far)
    pub fn unproject(&self, screen: DVec2, depth: f64) -> DVec3 {
        self.unproject_with(&self.view_projection().inverse(), screen, depth)
    }

    /// Near and far world points under `screen`
    pub fn unproject_ray(&self, screen: DVec2, near_depth: f64, far_depth: f64) -> Ray {
        let inverse = self.view_projection().inverse();
        Ray {
            near: self.unproject_with(&inverse, screen, near_depth),
            far: self.unproject_with(&inverse, screen, far_depth),
        }
    }

    fn unproject_with(&self, inverse: &DMat4, screen: DVec2, depth: f64) -> DVec3 {
        let ndc = DVec4::new(
            2.0 * screen.x / self.viewport.width - 1.0,
            1.0 - 2.0 * screen.y / self.viewport.height,
            2.0 * depth - 1.0,
            1.0,
        );
        let world = *inverse * ndc;
        world.truncate() / world.w
    }

    /// Affine map from ground-plane coordinates (z=0, world units) to pixels
    ///
    /// Only orthographic views map the plane affinely; perspective views
    /// return `None`, as do orientations that show the plane edge-on.
    pub fn ground_affine(&self) -> Option<DAffine2> {
        if !self.is_orthographic() {
            return None;
        }

        let scale = self.state.zoom * self.config.pixels_per_unit;
        let rotation = self.rotation();
        let x_axis = rotation.x_axis;
        let y_axis = rotation.y_axis;

        let linear = DMat2::from_cols(
            DVec2::new(scale * x_axis.x, -scale * x_axis.y),
            DVec2::new(scale * y_axis.x, -scale * y_axis.y),
        );
        if linear.determinant().abs() < 1e-9 * scale * scale {
            return None;
        }

        let center = self.viewport.center();
        let translation = DVec2::new(center.x + self.state.pan.x, center.y - self.state.pan.y);
        Some(DAffine2::from_mat2_translation(linear, translation))
    }

    /// Ground-plane point under `screen` using the inverse of [`Self::ground_affine`]
    pub fn screen_to_ground(&self, screen: DVec2) -> Option<DVec2> {
        self.ground_affine()
            .map(|affine| affine.inverse().transform_point2(screen))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ortho_camera() -> CameraModel {
        CameraModel::new(CameraConfig::orthographic(), Viewport::new(500.0, 500.0))
    }

    #[test]
    fn test_orbit_drag() {
        let mut camera = ortho_camera();
        camera.apply_drag(10.0, -20.0, DragMode::Orbit);
        let state = camera.state();
        assert_eq!(state.tilt, -10.0);
        assert_eq!(state.turn, 5.0);
        assert_eq!(state.zoom, 1.0);
        assert_eq!(state.pan, DVec2::ZERO);
    }

    #[test]
    fn test_pan_drag_flips_y() {
        let mut camera = ortho_camera();
        camera.apply_drag(4.0, 6.0, DragMode::Pan);
        assert_eq!(camera.state().pan, DVec2::new(4.0, -6.0));
        assert_eq!(camera.state().tilt, 0.0);
    }

    #[test]
    fn test_angles_accumulate_unbounded() {
        let mut camera = ortho_camera();
        for _ in 0..10 {
            camera.apply_drag(0.0, 100.0, DragMode::Orbit);
        }
        assert_eq!(camera.state().tilt, 500.0);
    }

    #[test]
    fn test_zoom_clamped_to_min() {
        let mut camera = ortho_camera();
        for _ in 0..1000 {
            camera.apply_zoom(-120.0);
        }
        assert_eq!(camera.state().zoom, 0.1);
    }

    #[test]
    fn test_zoom_clamped_to_max() {
        let mut camera = ortho_camera();
        for _ in 0..1000 {
            camera.apply_zoom(120.0);
        }
        assert_eq!(camera.state().zoom, 50.0);
    }

    #[test]
    fn test_zoom_unbounded_max() {
        let config = CameraConfig {
            zoom_max: f64::INFINITY,
            ..CameraConfig::orthographic()
        };
        let mut camera = CameraModel::new(config, Viewport::default());
        for _ in 0..30 {
            camera.apply_zoom(120.0);
        }
        assert!(camera.state().zoom > 50.0);
    }

    #[test]
    fn test_multiplicative_zoom_one_notch() {
        let mut camera = ortho_camera();
        assert!(camera.apply_zoom(120.0));
        assert!((camera.state().zoom - 1.2).abs() < 1e-12);
    }

    #[test]
    fn test_additive_zoom() {
        let config = CameraConfig {
            zoom_policy: ZoomPolicy::Additive { divisor: 1200.0 },
            ..CameraConfig::orthographic()
        };
        let mut camera = CameraModel::new(config, Viewport::default());
        camera.apply_zoom(120.0);
        assert!((camera.state().zoom - 1.1).abs() < 1e-12);
    }

    #[test]
    fn test_zero_wheel_delta_is_not_a_change() {
        let mut camera = ortho_camera();
        let revision = camera.revision();
        assert!(!camera.apply_zoom(0.0));
        assert_eq!(camera.revision(), revision);
    }

    #[test]
    fn test_identity_projection_centres_origin() {
        let camera = ortho_camera();
        let screen = camera.project(DVec3::ZERO);
        assert!((screen - DVec2::new(250.0, 250.0)).length() < 1e-9);

        // +Y in the world is up on screen
        let up = camera.project(DVec3::new(0.0, 1.0, 0.0));
        assert!((up - DVec2::new(250.0, 218.0)).length() < 1e-9);
    }

    #[test]
    fn test_project_matches_two_step_euler() {
        let mut camera = ortho_camera();
        camera.set_state(CameraState {
            zoom: 1.5,
            pan: DVec2::new(7.0, -3.0),
            tilt: 30.0,
            turn: -40.0,
        });

        let (x, y, z) = (2.0_f64, 3.0_f64, 1.0_f64);
        let (tilt, turn) = (30.0_f64.to_radians(), (-40.0_f64).to_radians());
        let y_rot = y * tilt.cos() - z * tilt.sin();
        let z_rot = y * tilt.sin() + z * tilt.cos();
        let x_proj = x * turn.cos() + z_rot * turn.sin();
        let scale = 1.5 * 32.0;
        let expected = DVec2::new(250.0 + x_proj * scale + 7.0, 250.0 - (y_rot * scale - 3.0));

        let screen = camera.project(DVec3::new(x, y, z));
        assert!((screen - expected).length() < 1e-6, "{screen:?} != {expected:?}");
    }

    #[test]
    fn test_unproject_inverts_project() {
        let mut camera = CameraModel::new(CameraConfig::perspective(), Viewport::new(800.0, 600.0));
        camera.apply_drag(30.0, 50.0, DragMode::Orbit);
        camera.apply_zoom(240.0);

        let world = DVec3::new(1.5, -2.0, 0.75);
        let screen = camera.project_with_depth(world);
        let back = camera.unproject(screen.truncate(), screen.z);
        assert!((back - world).length() < 1e-6, "{back:?} != {world:?}");
    }

    #[test]
    fn test_ground_affine_matches_projection() {
        let mut camera = ortho_camera();
        camera.set_state(CameraState {
            zoom: 2.0,
            pan: DVec2::new(-40.0, 12.0),
            tilt: 25.0,
            turn: 10.0,
        });
        let affine = camera.ground_affine().unwrap();
        let point = DVec2::new(3.25, -1.5);
        let via_affine = affine.transform_point2(point);
        let via_projection = camera.project(point.extend(0.0));
        assert!((via_affine - via_projection).length() < 1e-6);
    }

    #[test]
    fn test_ground_affine_edge_on_is_none() {
        let mut camera = ortho_camera();
        camera.set_state(CameraState {
            tilt: 90.0,
            ..CameraState::default()
        });
        assert!(camera.ground_affine().is_none());
    }

    #[test]
    fn test_ground_affine_none_for_perspective() {
        let camera = CameraModel::new(CameraConfig::perspective(), Viewport::default());
        assert!(camera.ground_affine().is_none());
    }

    #[test]
    fn test_reset_restores_initial() {
        let mut camera = ortho_camera();
        camera.apply_drag(10.0, 10.0, DragMode::Orbit);
        camera.apply_zoom(360.0);
        camera.reset();
        assert_eq!(*camera.state(), CameraState::default());
    }

    #[test]
    fn test_revision_tracks_changes() {
        let mut camera = ortho_camera();
        let start = camera.revision();
        camera.apply_drag(1.0, 0.0, DragMode::Pan);
        assert_eq!(camera.revision(), start + 1);
        camera.set_viewport(Viewport::new(640.0, 480.0));
        assert_eq!(camera.revision(), start + 2);
    }

    #[test]
    fn test_initial_zoom_clamped() {
        let config = CameraConfig {
            initial: CameraState {
                zoom: 0.01,
                ..CameraState::default()
            },
            ..CameraConfig::orthographic()
        };
        let camera = CameraModel::new(config, Viewport::default());
        assert_eq!(camera.state().zoom, 0.1);
    }
}
