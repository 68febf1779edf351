//! Scripted input sessions
//!
//! An input script is a TOML list of steps replayed against an
//! [`EditorSession`] in order:
//!
//! ```toml
//! [[steps]]
//! type = "move"
//! x = 512.0
//! y = 156.0
//!
//! [[steps]]
//! type = "press"
//! button = "left"
//! x = 512.0
//! y = 156.0
//!
//! [[steps]]
//! type = "release"
//! button = "left"
//!
//! [[steps]]
//! type = "mode"
//! mode = "erasing"
//!
//! # Left click on the projected centre of a cell
//! [[steps]]
//! type = "click_cell"
//! column = 3
//! row = 4
//! ```
//!
//! Pointer steps (`move`, `press`, `release`, `wheel`) are delivered as
//! [`InputEvent`]s; the rest stand in for toolbar buttons.

use cad::{EditMode, EditorSession, Error, GridCell, InputEvent, MouseButton, PlacementEvent};
use glam::DVec3;
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info};

/// One step of an input script
///
/// Pointer steps use the [`InputEvent`] encoding directly.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ScriptStep {
    /// `move`, `press`, `release` or `wheel`
    Pointer(InputEvent),
    /// Toolbar-style command
    Action(ScriptAction),
}

/// Script steps that are not pointer events
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScriptAction {
    /// Select the edit mode
    Mode { mode: EditMode },
    /// Switch between placing and erasing
    ToggleMode,
    /// Move to, press and release the left button over a cell centre
    ClickCell { column: i32, row: i32 },
    /// Return the camera to its initial state
    ResetCamera,
}

/// Input script loaded from TOML
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct InputScript {
    pub steps: Vec<ScriptStep>,
}

/// What running a script did
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScriptReport {
    /// Steps executed
    pub steps: usize,
    /// Events appended to the placement log
    pub placements: Vec<PlacementEvent>,
    /// Left clicks that designated no cell
    pub misses: usize,
}

impl InputScript {
    /// Parse a script from TOML text
    pub fn from_toml(content: &str) -> cad::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load a script from a file
    pub fn from_file(path: &Path) -> cad::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|err| Error::io(path, err))?;
        let script = Self::from_toml(&content)?;
        info!(path = %path.display(), steps = script.steps.len(), "loaded input script");
        Ok(script)
    }

    /// Run every step against `session`
    pub fn run(&self, session: &mut EditorSession) -> ScriptReport {
        let mut report = ScriptReport::default();
        for (index, step) in self.steps.iter().enumerate() {
            debug!(index, ?step, "script step");
            match step {
                ScriptStep::Pointer(event) => deliver(session, *event, &mut report),
                ScriptStep::Action(ScriptAction::Mode { mode }) => session.set_mode(*mode),
                ScriptStep::Action(ScriptAction::ToggleMode) => {
                    session.toggle_mode();
                }
                ScriptStep::Action(ScriptAction::ResetCamera) => session.reset_camera(),
                ScriptStep::Action(ScriptAction::ClickCell { column, row }) => {
                    let pointer = cell_center(session, GridCell::new(*column, *row));
                    for event in [
                        InputEvent::Move {
                            x: pointer.x,
                            y: pointer.y,
                        },
                        InputEvent::Press {
                            button: MouseButton::Left,
                            x: pointer.x,
                            y: pointer.y,
                        },
                        InputEvent::Release {
                            button: MouseButton::Left,
                        },
                    ] {
                        deliver(session, event, &mut report);
                    }
                }
            }
            report.steps += 1;
        }
        report
    }
}

fn deliver(session: &mut EditorSession, event: InputEvent, report: &mut ScriptReport) {
    let update = session.handle(event);
    if let Some(placement) = update.placement {
        report.placements.push(placement);
    }
    if update.miss.is_some() {
        report.misses += 1;
    }
}

/// Screen position of a cell centre under the session's current camera
pub fn cell_center(session: &EditorSession, cell: GridCell) -> glam::DVec2 {
    let size = session.cell_size();
    session.camera().project(DVec3::new(
        (cell.column as f64 + 0.5) * size,
        (cell.row as f64 + 0.5) * size,
        0.0,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cad::SessionConfig;

    #[test]
    fn test_parse_empty_script() {
        let script = InputScript::from_toml("").unwrap();
        assert!(script.steps.is_empty());
    }

    #[test]
    fn test_parse_steps() {
        let script = InputScript::from_toml(
            r#"
            [[steps]]
            type = "move"
            x = 100.0
            y = 200.0

            [[steps]]
            type = "press"
            button = "right"
            x = 100.0
            y = 200.0

            [[steps]]
            type = "mode"
            mode = "erasing"

            [[steps]]
            type = "toggle_mode"

            [[steps]]
            type = "click_cell"
            column = 3
            row = 4
            "#,
        )
        .unwrap();

        assert_eq!(script.steps.len(), 5);
        assert_eq!(
            script.steps[0],
            ScriptStep::Pointer(InputEvent::Move { x: 100.0, y: 200.0 })
        );
        assert_eq!(
            script.steps[1],
            ScriptStep::Pointer(InputEvent::Press {
                button: MouseButton::Right,
                x: 100.0,
                y: 200.0,
            })
        );
        assert_eq!(
            script.steps[2],
            ScriptStep::Action(ScriptAction::Mode {
                mode: EditMode::Erasing
            })
        );
        assert_eq!(script.steps[3], ScriptStep::Action(ScriptAction::ToggleMode));
        assert_eq!(
            script.steps[4],
            ScriptStep::Action(ScriptAction::ClickCell { column: 3, row: 4 })
        );
    }

    #[test]
    fn test_unknown_step_is_config_error() {
        let err = InputScript::from_toml("[[steps]]\ntype = \"teleport\"").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_run_place_and_erase() {
        let script = InputScript::from_toml(
            r#"
            [[steps]]
            type = "click_cell"
            column = 3
            row = 4

            [[steps]]
            type = "mode"
            mode = "erasing"

            [[steps]]
            type = "click_cell"
            column = 3
            row = 4

            [[steps]]
            type = "click_cell"
            column = 40
            row = 4
            "#,
        )
        .unwrap();

        let mut session = EditorSession::new(&SessionConfig::default()).unwrap();
        let report = script.run(&mut session);

        assert_eq!(report.steps, 4);
        assert_eq!(report.misses, 1);
        let lines: Vec<_> = report.placements.iter().map(ToString::to_string).collect();
        assert_eq!(lines, vec!["1: P(3,4)", "2: E(3,4)"]);
        assert!(session.cubes().is_empty());
    }

    #[test]
    fn test_run_pointer_steps() {
        // Default view: 32 px per cell, origin at (400, 300), y up
        let script = InputScript::from_toml(
            r#"
            [[steps]]
            type = "press"
            button = "left"
            x = 416.0
            y = 284.0

            [[steps]]
            type = "release"
            button = "left"

            [[steps]]
            type = "wheel"
            delta = 120.0
            "#,
        )
        .unwrap();

        let mut session = EditorSession::new(&SessionConfig::default()).unwrap();
        let report = script.run(&mut session);

        assert_eq!(report.placements.len(), 1);
        assert_eq!(report.placements[0].cell, GridCell::new(0, 0));
        assert!((session.camera().state().zoom - 1.2).abs() < 1e-12);
    }
}
