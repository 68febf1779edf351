//! Pointer input types
//!
//! The windowing toolkit is an external collaborator: it translates its own
//! events into [`InputEvent`] values in viewport-local pixel coordinates and
//! hands them to the session. [`DragTracker`] turns the raw stream into
//! camera drags.

use crate::camera::DragMode;
use glam::DVec2;
use serde::{Deserialize, Serialize};

// ============================================================================
// Mouse Types
// ============================================================================

/// Mouse button identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Mouse button state flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MouseButtons {
    pub left: bool,
    pub right: bool,
    pub middle: bool,
}

impl MouseButtons {
    pub fn set(&mut self, button: MouseButton, pressed: bool) {
        match button {
            MouseButton::Left => self.left = pressed,
            MouseButton::Right => self.right = pressed,
            MouseButton::Middle => self.middle = pressed,
        }
    }

    pub fn is_pressed(&self, button: MouseButton) -> bool {
        match button {
            MouseButton::Left => self.left,
            MouseButton::Right => self.right,
            MouseButton::Middle => self.middle,
        }
    }
}

/// One pointer event in viewport-local pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputEvent {
    /// Pointer moved to `(x, y)`
    Move { x: f64, y: f64 },
    /// Button pressed at `(x, y)`
    Press { button: MouseButton, x: f64, y: f64 },
    /// Button released
    Release { button: MouseButton },
    /// Wheel turned; 120 per notch, positive away from the user
    Wheel { delta: f64 },
}

impl InputEvent {
    /// Pointer position carried by the event, if any
    pub fn position(&self) -> Option<DVec2> {
        match *self {
            Self::Move { x, y } | Self::Press { x, y, .. } => Some(DVec2::new(x, y)),
            Self::Release { .. } | Self::Wheel { .. } => None,
        }
    }
}

// ============================================================================
// Drag Tracking
// ============================================================================

/// Which button drives which camera drag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DragBindings {
    pub orbit: MouseButton,
    pub pan: MouseButton,
}

impl Default for DragBindings {
    fn default() -> Self {
        Self {
            orbit: MouseButton::Right,
            pan: MouseButton::Middle,
        }
    }
}

impl DragBindings {
    /// Drag mode for the buttons currently held, orbit winning over pan
    pub fn mode_for(&self, buttons: &MouseButtons) -> Option<DragMode> {
        if buttons.is_pressed(self.orbit) {
            Some(DragMode::Orbit)
        } else if buttons.is_pressed(self.pan) {
            Some(DragMode::Pan)
        } else {
            None
        }
    }
}

/// A drag step produced by a pointer move while a drag button is held
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Drag {
    pub delta: DVec2,
    pub mode: DragMode,
}

/// Tracks button state and the last pointer position between events
#[derive(Debug, Clone, Default)]
pub struct DragTracker {
    bindings: DragBindings,
    buttons: MouseButtons,
    last_position: Option<DVec2>,
}

impl DragTracker {
    pub fn new(bindings: DragBindings) -> Self {
        Self {
            bindings,
            ..Self::default()
        }
    }

    pub fn buttons(&self) -> MouseButtons {
        self.buttons
    }

    /// Last known pointer position
    pub fn position(&self) -> Option<DVec2> {
        self.last_position
    }

    /// Feed an event; returns the drag it implies, if any
    pub fn update(&mut self, event: &InputEvent) -> Option<Drag> {
        match *event {
            InputEvent::Move { x, y } => {
                let position = DVec2::new(x, y);
                let previous = self.last_position.replace(position);
                let mode = self.bindings.mode_for(&self.buttons)?;
                let delta = position - previous?;
                (delta != DVec2::ZERO).then_some(Drag { delta, mode })
            }
            InputEvent::Press { button, x, y } => {
                self.buttons.set(button, true);
                self.last_position = Some(DVec2::new(x, y));
                None
            }
            InputEvent::Release { button } => {
                self.buttons.set(button, false);
                None
            }
            InputEvent::Wheel { .. } => None,
        }
    }
}
