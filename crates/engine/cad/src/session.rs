//! Editing session
//!
//! [`EditorSession`] owns one camera, one pointer resolver and one placement
//! log. The host feeds it [`InputEvent`]s and draws from [`RenderView`]
//! snapshots; nothing here touches a window or a GPU.
//!
//! Event handling order:
//!
//! 1. Drag tracking (right/middle button motion moves the camera)
//! 2. Left press resolves the pointer and applies a placement click
//! 3. Wheel zoom
//! 4. Resolver caches are synced and the hover cell is recomputed

use crate::camera::{CameraModel, CameraState, Viewport};
use crate::config::SessionConfig;
use crate::error::Result;
use crate::grid::{GridCell, GridSize};
use crate::input::{DragTracker, InputEvent, MouseButton};
use crate::placement::{CubeSet, EditMode, PlacementEvent, PlacementLog, PlacementPolicy};
use crate::project_log::{self, LoadReport};
use crate::resolver::{PointerResolver, ResolveMiss};
use glam::DVec2;
use std::path::Path;
use tracing::{debug, info};

/// What a single input event changed
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SessionUpdate {
    /// Event appended to the placement log
    pub placement: Option<PlacementEvent>,
    /// Why a left click designated no cell
    pub miss: Option<ResolveMiss>,
    /// Camera state changed (drag or zoom)
    pub camera_changed: bool,
    /// Hover cell changed
    pub hover_changed: bool,
}

impl SessionUpdate {
    /// Whether the host should redraw
    pub fn needs_redraw(&self) -> bool {
        self.placement.is_some() || self.camera_changed || self.hover_changed
    }
}

/// Everything a renderer needs for one frame
#[derive(Debug, Clone, Copy)]
pub struct RenderView<'a> {
    pub camera: &'a CameraModel,
    pub cubes: &'a CubeSet,
    pub hover: Option<GridCell>,
    pub mode: EditMode,
}

/// One grid editor viewport
pub struct EditorSession {
    camera: CameraModel,
    resolver: Box<dyn PointerResolver>,
    cell_size: f64,
    tracker: DragTracker,
    log: PlacementLog,
    mode: EditMode,
    policy: PlacementPolicy,
    hover: Option<GridCell>,
}

impl EditorSession {
    /// Create a session from a validated configuration
    pub fn new(config: &SessionConfig) -> Result<Self> {
        config.validate()?;

        let camera = CameraModel::new(config.camera.clone(), config.viewport);
        let mut resolver = config
            .editor
            .resolver
            .build(config.grid.size(), config.grid.cell_size);
        resolver.sync(&camera);

        info!(
            columns = config.grid.columns,
            rows = config.grid.rows,
            resolver = ?config.editor.resolver,
            policy = ?config.editor.placement_policy,
            "editor session created"
        );

        Ok(Self {
            camera,
            resolver,
            cell_size: config.grid.cell_size,
            tracker: DragTracker::new(config.editor.drag),
            log: PlacementLog::new(),
            mode: config.editor.initial_mode,
            policy: config.editor.placement_policy,
            hover: None,
        })
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn camera(&self) -> &CameraModel {
        &self.camera
    }

    pub fn grid(&self) -> GridSize {
        self.resolver.grid()
    }

    /// Cell edge length in world units
    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    pub fn log(&self) -> &PlacementLog {
        &self.log
    }

    pub fn cubes(&self) -> &CubeSet {
        self.log.cubes()
    }

    pub fn hover(&self) -> Option<GridCell> {
        self.hover
    }

    pub fn mode(&self) -> EditMode {
        self.mode
    }

    pub fn policy(&self) -> PlacementPolicy {
        self.policy
    }

    pub fn render_view(&self) -> RenderView<'_> {
        RenderView {
            camera: &self.camera,
            cubes: self.log.cubes(),
            hover: self.hover,
            mode: self.mode,
        }
    }

    // ------------------------------------------------------------------------
    // Mode
    // ------------------------------------------------------------------------

    pub fn set_mode(&mut self, mode: EditMode) {
        if self.mode != mode {
            debug!(?mode, "edit mode changed");
        }
        self.mode = mode;
    }

    pub fn toggle_mode(&mut self) -> EditMode {
        self.set_mode(self.mode.toggle());
        self.mode
    }

    pub fn set_policy(&mut self, policy: PlacementPolicy) {
        self.policy = policy;
    }

    // ------------------------------------------------------------------------
    // Input
    // ------------------------------------------------------------------------

    /// Feed one pointer event
    pub fn handle(&mut self, event: InputEvent) -> SessionUpdate {
        let mut update = SessionUpdate::default();

        if let Some(drag) = self.tracker.update(&event) {
            self.camera.apply_drag(drag.delta.x, drag.delta.y, drag.mode);
            update.camera_changed = true;
        }

        match event {
            InputEvent::Press {
                button: MouseButton::Left,
                x,
                y,
            } => match self.click_at(DVec2::new(x, y)) {
                Ok(placement) => update.placement = placement,
                Err(miss) => update.miss = Some(miss),
            },
            InputEvent::Wheel { delta } => {
                update.camera_changed |= self.camera.apply_zoom(delta);
            }
            _ => {}
        }

        if update.camera_changed {
            self.resolver.sync(&self.camera);
        }
        update.hover_changed = self.refresh_hover();
        update
    }

    /// Apply a placement click at `pointer`
    ///
    /// `Ok(None)` means the pointer hit a cell but the click was a no-op
    /// under the current policy and mode.
    pub fn click_at(
        &mut self,
        pointer: DVec2,
    ) -> std::result::Result<Option<PlacementEvent>, ResolveMiss> {
        let cell = self.resolver.locate(&self.camera, pointer)?;
        let event = self.log.click(cell, self.policy, self.mode);
        match event {
            Some(event) => debug!(%event, "placement"),
            None => debug!(%cell, mode = ?self.mode, "click changed nothing"),
        }
        Ok(event)
    }

    /// Cell under `pointer`, or why there is none
    pub fn locate(&self, pointer: DVec2) -> std::result::Result<GridCell, ResolveMiss> {
        self.resolver.locate(&self.camera, pointer)
    }

    /// Cell under `pointer`, if any
    pub fn resolve(&self, pointer: DVec2) -> Option<GridCell> {
        self.resolver.resolve(&self.camera, pointer)
    }

    fn refresh_hover(&mut self) -> bool {
        let hover = self
            .tracker
            .position()
            .and_then(|pointer| self.resolver.resolve(&self.camera, pointer));
        let changed = hover != self.hover;
        self.hover = hover;
        changed
    }

    // ------------------------------------------------------------------------
    // Camera
    // ------------------------------------------------------------------------

    /// Replace the camera state (zoom is clamped)
    pub fn set_camera_state(&mut self, state: CameraState) {
        self.camera.set_state(state);
        self.camera_moved();
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.camera.set_viewport(viewport);
        self.camera_moved();
    }

    /// Return the camera to its configured initial state
    pub fn reset_camera(&mut self) {
        self.camera.reset();
        self.camera_moved();
    }

    fn camera_moved(&mut self) {
        self.resolver.sync(&self.camera);
        self.refresh_hover();
    }

    // ------------------------------------------------------------------------
    // Log
    // ------------------------------------------------------------------------

    /// Drop every cube and event
    pub fn clear(&mut self) {
        self.log.clear();
        info!("placement log cleared");
    }

    /// Replace cubes and events together
    pub fn replace_log(&mut self, log: PlacementLog) {
        self.log = log;
    }

    /// Save the placement log to `path`
    pub fn save_log(&self, path: impl AsRef<Path>) -> Result<()> {
        project_log::save(&self.log, path)
    }

    /// Load a placement log from `path`, replacing the current one
    ///
    /// On I/O failure the current log is left as it was.
    pub fn load_log(&mut self, path: impl AsRef<Path>) -> Result<LoadReport> {
        let (log, report) = project_log::load(path, self.grid())?;
        self.replace_log(log);
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::ResolverKind;

    // Default config: 800x600 viewport, 32 px per cell, centre (400, 300)
    fn cell_center(cell: GridCell) -> (f64, f64) {
        (
            400.0 + 32.0 * (cell.column as f64 + 0.5),
            300.0 - 32.0 * (cell.row as f64 + 0.5),
        )
    }

    fn left_click(session: &mut EditorSession, cell: GridCell) -> SessionUpdate {
        let (x, y) = cell_center(cell);
        let update = session.handle(InputEvent::Press {
            button: MouseButton::Left,
            x,
            y,
        });
        session.handle(InputEvent::Release {
            button: MouseButton::Left,
        });
        update
    }

    #[test]
    fn test_click_places_and_erases() {
        let mut session = EditorSession::new(&SessionConfig::default()).unwrap();
        let cell = GridCell::new(3, 4);

        let update = left_click(&mut session, cell);
        assert_eq!(update.placement.map(|e| e.to_string()), Some("1: P(3,4)".into()));
        assert!(session.cubes().contains(cell));

        session.set_mode(EditMode::Erasing);
        let update = left_click(&mut session, cell);
        assert_eq!(update.placement.map(|e| e.to_string()), Some("2: E(3,4)".into()));
        assert!(session.cubes().is_empty());
    }

    #[test]
    fn test_click_outside_grid_is_a_miss() {
        let mut session = EditorSession::new(&SessionConfig::default()).unwrap();
        let update = session.handle(InputEvent::Press {
            button: MouseButton::Left,
            x: 10.0,
            y: 10.0,
        });
        assert!(matches!(update.miss, Some(ResolveMiss::OutOfBounds { .. })));
        assert!(update.placement.is_none());
        assert!(session.log().is_empty());
    }

    #[test]
    fn test_hover_follows_pointer() {
        let mut session = EditorSession::new(&SessionConfig::default()).unwrap();
        let (x, y) = cell_center(GridCell::new(5, 6));

        let update = session.handle(InputEvent::Move { x, y });
        assert!(update.hover_changed);
        assert_eq!(session.hover(), Some(GridCell::new(5, 6)));

        let update = session.handle(InputEvent::Move { x: x + 1.0, y });
        assert!(!update.hover_changed);

        session.handle(InputEvent::Move { x: 0.0, y: 0.0 });
        assert_eq!(session.hover(), None);
        assert_eq!(session.render_view().hover, None);
    }

    #[test]
    fn test_right_drag_orbits_camera() {
        let mut session = EditorSession::new(&SessionConfig::default()).unwrap();
        session.handle(InputEvent::Press {
            button: MouseButton::Right,
            x: 100.0,
            y: 100.0,
        });
        let update = session.handle(InputEvent::Move { x: 110.0, y: 80.0 });
        assert!(update.camera_changed);

        let state = session.camera().state();
        assert_eq!(state.tilt, -10.0);
        assert_eq!(state.turn, 5.0);
        assert_eq!(state.zoom, 1.0);
        assert_eq!(state.pan, DVec2::ZERO);
    }

    #[test]
    fn test_wheel_zooms_and_clamps() {
        let mut session = EditorSession::new(&SessionConfig::default()).unwrap();
        for _ in 0..1000 {
            session.handle(InputEvent::Wheel { delta: -120.0 });
        }
        assert_eq!(session.camera().state().zoom, 0.1);
        let update = session.handle(InputEvent::Wheel { delta: -120.0 });
        assert!(!update.camera_changed);
    }

    #[test]
    fn test_bucket_resolver_tracks_camera() {
        let mut config = SessionConfig::default();
        config.editor.resolver = ResolverKind::Buckets;
        let mut session = EditorSession::new(&config).unwrap();

        let mut state = *session.camera().state();
        state.tilt = -30.0;
        state.turn = 15.0;
        session.set_camera_state(state);

        let cell = GridCell::new(7, 2);
        let pointer = session.camera().project(glam::DVec3::new(7.5, 2.5, 0.0));
        assert_eq!(session.resolve(pointer), Some(cell));

        // Pan drag moves the camera; the buckets must follow
        session.handle(InputEvent::Press {
            button: MouseButton::Middle,
            x: 0.0,
            y: 0.0,
        });
        session.handle(InputEvent::Move { x: 64.0, y: 0.0 });
        let pointer = session.camera().project(glam::DVec3::new(7.5, 2.5, 0.0));
        assert_eq!(session.resolve(pointer), Some(cell));
    }

    #[test]
    fn test_toggle_policy() {
        let mut config = SessionConfig::default();
        config.editor.placement_policy = PlacementPolicy::Toggle;
        let mut session = EditorSession::new(&config).unwrap();
        let cell = GridCell::new(0, 0);

        left_click(&mut session, cell);
        left_click(&mut session, cell);
        assert_eq!(session.log().display_lines(), vec!["1: P(0,0)", "2: E(0,0)"]);
    }

    #[test]
    fn test_reset_camera() {
        let mut session = EditorSession::new(&SessionConfig::default()).unwrap();
        let mut state = *session.camera().state();
        state.zoom = 3.0;
        session.set_camera_state(state);
        session.reset_camera();
        assert_eq!(*session.camera().state(), CameraState::default());
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = SessionConfig::default();
        config.grid.rows = 0;
        assert!(EditorSession::new(&config).is_err());
    }

    #[test]
    fn test_load_failure_keeps_log() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = EditorSession::new(&SessionConfig::default()).unwrap();
        left_click(&mut session, GridCell::new(1, 1));

        assert!(session.load_log(dir.path().join("missing.txt")).is_err());
        assert_eq!(session.log().len(), 1);
    }

    #[test]
    fn test_left_drag_does_not_move_camera() {
        let mut session = EditorSession::new(&SessionConfig::default()).unwrap();
        session.handle(InputEvent::Press {
            button: MouseButton::Left,
            x: 0.0,
            y: 0.0,
        });
        let update = session.handle(InputEvent::Move { x: 50.0, y: 50.0 });
        assert!(!update.camera_changed);
        assert_eq!(session.camera().revision(), 0);
    }
}
