//! Cube placement state and the append-only placement log
//!
//! Every successful place or erase appends a [`PlacementEvent`]; clicks that
//! would not change occupancy append nothing. Events carry absolute actions,
//! so replaying a log (even twice over) rebuilds the same [`CubeSet`].

use crate::grid::GridCell;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

// ============================================================================
// Cube Set
// ============================================================================

/// Occupied cells, at most one cube per cell
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CubeSet {
    cells: BTreeSet<GridCell>,
}

impl CubeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, cell: GridCell) -> bool {
        self.cells.contains(&cell)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Cells in ascending (column, row) order
    pub fn iter(&self) -> impl Iterator<Item = GridCell> + '_ {
        self.cells.iter().copied()
    }

    /// Apply an absolute action; returns whether occupancy changed
    fn apply(&mut self, action: PlacementAction, cell: GridCell) -> bool {
        match action {
            PlacementAction::Place => self.cells.insert(cell),
            PlacementAction::Erase => self.cells.remove(&cell),
        }
    }
}

impl FromIterator<GridCell> for CubeSet {
    fn from_iter<I: IntoIterator<Item = GridCell>>(iter: I) -> Self {
        Self {
            cells: iter.into_iter().collect(),
        }
    }
}

// ============================================================================
// Events
// ============================================================================

/// What a log entry does to its cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementAction {
    Place,
    Erase,
}

impl PlacementAction {
    /// Single-letter code used in the project log
    pub fn code(&self) -> char {
        match self {
            Self::Place => 'P',
            Self::Erase => 'E',
        }
    }

    pub fn from_code(code: char) -> Option<Self> {
        match code {
            'P' => Some(Self::Place),
            'E' => Some(Self::Erase),
            _ => None,
        }
    }
}

/// One entry of the placement log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementEvent {
    /// 1-based position in the log
    pub sequence: u32,
    pub action: PlacementAction,
    pub cell: GridCell,
}

impl fmt::Display for PlacementEvent {
    /// Canonical project-log line, e.g. `1: P(3,4)`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}({},{})",
            self.sequence,
            self.action.code(),
            self.cell.column,
            self.cell.row
        )
    }
}

// ============================================================================
// Edit Mode and Policy
// ============================================================================

/// Toolbar mode selecting what a click does under [`PlacementPolicy::ModeGated`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditMode {
    #[default]
    Placing,
    Erasing,
}

impl EditMode {
    /// Toggle between Placing and Erasing
    pub fn toggle(&self) -> Self {
        match self {
            EditMode::Placing => EditMode::Erasing,
            EditMode::Erasing => EditMode::Placing,
        }
    }

    pub fn is_placing(&self) -> bool {
        matches!(self, EditMode::Placing)
    }
}

/// How a click on a cell is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementPolicy {
    /// Placing adds absent cells, Erasing removes present ones; anything else is a no-op
    #[default]
    ModeGated,
    /// Every click flips occupancy; the edit mode is ignored
    Toggle,
}

impl PlacementPolicy {
    /// Action a click on `cell` should perform, or `None` for a no-op
    pub fn action_for(&self, occupied: bool, mode: EditMode) -> Option<PlacementAction> {
        match (self, mode, occupied) {
            (Self::Toggle, _, false) | (Self::ModeGated, EditMode::Placing, false) => {
                Some(PlacementAction::Place)
            }
            (Self::Toggle, _, true) | (Self::ModeGated, EditMode::Erasing, true) => {
                Some(PlacementAction::Erase)
            }
            (Self::ModeGated, _, _) => None,
        }
    }
}

// ============================================================================
// Placement Log
// ============================================================================

/// Cube set plus the ordered events that produced it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlacementLog {
    events: Vec<PlacementEvent>,
    cubes: CubeSet,
}

impl PlacementLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a log by replaying `actions` in order
    ///
    /// Actions that would not change occupancy are dropped, so the result
    /// satisfies the same invariants as a log built click by click.
    pub fn from_actions(actions: impl IntoIterator<Item = (PlacementAction, GridCell)>) -> Self {
        let mut log = Self::new();
        for (action, cell) in actions {
            log.apply(action, cell);
        }
        log
    }

    /// Cube set produced by replaying `events` against an empty set
    pub fn replay<'a>(events: impl IntoIterator<Item = &'a PlacementEvent>) -> CubeSet {
        let mut cubes = CubeSet::new();
        for event in events {
            cubes.apply(event.action, event.cell);
        }
        cubes
    }

    pub fn events(&self) -> &[PlacementEvent] {
        &self.events
    }

    pub fn cubes(&self) -> &CubeSet {
        &self.cubes
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Drop all cubes and events
    pub fn clear(&mut self) {
        self.events.clear();
        self.cubes = CubeSet::new();
    }

    /// Apply `action` to `cell`, logging it only if occupancy changed
    pub fn apply(&mut self, action: PlacementAction, cell: GridCell) -> Option<PlacementEvent> {
        if !self.cubes.apply(action, cell) {
            return None;
        }
        let event = PlacementEvent {
            sequence: self.events.len() as u32 + 1,
            action,
            cell,
        };
        self.events.push(event);
        Some(event)
    }

    pub fn place(&mut self, cell: GridCell) -> Option<PlacementEvent> {
        self.apply(PlacementAction::Place, cell)
    }

    pub fn erase(&mut self, cell: GridCell) -> Option<PlacementEvent> {
        self.apply(PlacementAction::Erase, cell)
    }

    /// Handle a click on `cell` under `policy` and `mode`
    pub fn click(
        &mut self,
        cell: GridCell,
        policy: PlacementPolicy,
        mode: EditMode,
    ) -> Option<PlacementEvent> {
        let action = policy.action_for(self.cubes.contains(cell), mode)?;
        self.apply(action, cell)
    }

    /// Log lines as shown to the user and written to disk
    pub fn display_lines(&self) -> Vec<String> {
        self.events.iter().map(ToString::to_string).collect()
    }
}
