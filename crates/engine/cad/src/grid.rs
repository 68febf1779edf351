//! Grid cells and grid dimensions
//!
//! Cells are unit squares on the z=0 ground plane. Cell `(column, row)` covers
//! the half-open area `[column, column + 1) x [row, row + 1)` in cell units.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Integer coordinate of one grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridCell {
    pub column: i32,
    pub row: i32,
}

impl GridCell {
    pub const fn new(column: i32, row: i32) -> Self {
        Self { column, row }
    }

    /// Cell containing the ground-plane point `(x, y)`, measured in cell units
    ///
    /// Uses floor semantics: a coordinate exactly on `n` lands in cell `n`.
    /// Returns `None` for non-finite input or coordinates outside `i32`.
    pub fn containing(x: f64, y: f64) -> Option<Self> {
        let column = floor_to_i32(x)?;
        let row = floor_to_i32(y)?;
        Some(Self { column, row })
    }
}

impl fmt::Display for GridCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.column, self.row)
    }
}

impl From<(i32, i32)> for GridCell {
    fn from((column, row): (i32, i32)) -> Self {
        Self { column, row }
    }
}

fn floor_to_i32(value: f64) -> Option<i32> {
    let floored = value.floor();
    if !floored.is_finite() || floored < i32::MIN as f64 || floored > i32::MAX as f64 {
        return None;
    }
    Some(floored as i32)
}

/// Grid dimensions in cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSize {
    pub columns: u32,
    pub rows: u32,
}

impl Default for GridSize {
    fn default() -> Self {
        Self {
            columns: 16,
            rows: 16,
        }
    }
}

impl GridSize {
    pub const fn new(columns: u32, rows: u32) -> Self {
        Self { columns, rows }
    }

    /// Whether `cell` lies inside `0 <= column < columns`, `0 <= row < rows`
    pub fn contains(&self, cell: GridCell) -> bool {
        cell.column >= 0
            && cell.row >= 0
            && (cell.column as u32) < self.columns
            && (cell.row as u32) < self.rows
    }

    /// Total number of cells
    pub fn len(&self) -> usize {
        self.columns as usize * self.rows as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All cells in row-major order (row 0 first, columns ascending)
    pub fn cells(&self) -> impl Iterator<Item = GridCell> + '_ {
        (0..self.rows as i32)
            .flat_map(move |row| (0..self.columns as i32).map(move |column| GridCell { column, row }))
    }
}
