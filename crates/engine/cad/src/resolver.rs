//! Pointer-to-grid-cell resolution
//!
//! Three strategies share the [`PointerResolver`] contract:
//!
//! - [`RayPlaneResolver`]: unproject the pointer at near and far depth and
//!   intersect the segment's line with the z=0 ground plane. Works for any
//!   projection.
//! - [`AffineResolver`]: invert the ground plane's affine screen mapping.
//!   Orthographic views only.
//! - [`BucketResolver`]: hit-test the pointer against every cell's projected
//!   screen quad. Quads own their lower edges only, so a pointer on a shared
//!   edge lands in the higher cell just as flooring would put it; placed
//!   cubes do not occlude anything.
//!
//! Misses are ordinary results ([`ResolveMiss`]), never errors.

use crate::camera::CameraModel;
use crate::grid::{GridCell, GridSize};
use glam::{DVec2, DVec3};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a pointer did not designate a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveMiss {
    /// No ground-plane point lies under the pointer (parallel or behind the eye)
    InvalidPointer,
    /// The pointer hit the ground plane outside the grid
    OutOfBounds { column: i32, row: i32 },
}

impl fmt::Display for ResolveMiss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPointer => write!(f, "pointer does not reach the ground plane"),
            Self::OutOfBounds { column, row } => {
                write!(f, "cell ({column},{row}) is outside the grid")
            }
        }
    }
}

/// Maps a pointer position to the grid cell it designates
pub trait PointerResolver {
    /// Cell under `pointer`, or the reason there is none
    fn locate(&self, camera: &CameraModel, pointer: DVec2) -> Result<GridCell, ResolveMiss>;

    /// Cell under `pointer`, if any
    fn resolve(&self, camera: &CameraModel, pointer: DVec2) -> Option<GridCell> {
        self.locate(camera, pointer).ok()
    }

    /// Refresh cached screen-space data after the camera changed
    fn sync(&mut self, _camera: &CameraModel) {}

    /// Grid this resolver validates against
    fn grid(&self) -> GridSize;
}

/// Strategy selector used by configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolverKind {
    /// Ray/ground-plane intersection
    #[default]
    RayPlane,
    /// Inverse of the ground plane's affine screen mapping
    Affine,
    /// Projected cell quads
    Buckets,
}

impl ResolverKind {
    /// Build the resolver for `grid` with cells `cell_size` world units wide
    pub fn build(self, grid: GridSize, cell_size: f64) -> Box<dyn PointerResolver> {
        match self {
            Self::RayPlane => Box::new(RayPlaneResolver::new(grid, cell_size)),
            Self::Affine => Box::new(AffineResolver::new(grid, cell_size)),
            Self::Buckets => Box::new(BucketResolver::new(grid, cell_size)),
        }
    }
}

/// Turn a ground-plane point into a bounds-checked cell
fn cell_at(grid: GridSize, cell_size: f64, ground: DVec2) -> Result<GridCell, ResolveMiss> {
    let cell = GridCell::containing(ground.x / cell_size, ground.y / cell_size)
        .ok_or(ResolveMiss::InvalidPointer)?;
    if grid.contains(cell) {
        Ok(cell)
    } else {
        Err(ResolveMiss::OutOfBounds {
            column: cell.column,
            row: cell.row,
        })
    }
}

// ============================================================================
// Ray / Plane
// ============================================================================

/// Intersects the pointer ray with the z=0 plane
#[derive(Debug, Clone)]
pub struct RayPlaneResolver {
    grid: GridSize,
    cell_size: f64,
}

impl RayPlaneResolver {
    pub fn new(grid: GridSize, cell_size: f64) -> Self {
        Self { grid, cell_size }
    }

    /// Ground-plane point under `pointer`
    ///
    /// `None` when the ray runs parallel to the plane or meets it in front of
    /// the near plane.
    pub fn ground_point(camera: &CameraModel, pointer: DVec2) -> Option<DVec3> {
        let ray = camera.unproject_ray(pointer, 0.0, 1.0);
        let t = ray.ground_parameter()?;
        if t < 0.0 || !t.is_finite() {
            return None;
        }
        Some(ray.point_at(t))
    }
}

impl PointerResolver for RayPlaneResolver {
    fn locate(&self, camera: &CameraModel, pointer: DVec2) -> Result<GridCell, ResolveMiss> {
        let hit = Self::ground_point(camera, pointer).ok_or(ResolveMiss::InvalidPointer)?;
        cell_at(self.grid, self.cell_size, hit.truncate())
    }

    fn grid(&self) -> GridSize {
        self.grid
    }
}

// ============================================================================
// Inverse Affine
// ============================================================================

/// Maps the pointer through the inverse ground-plane affine transform
#[derive(Debug, Clone)]
pub struct AffineResolver {
    grid: GridSize,
    cell_size: f64,
}

impl AffineResolver {
    pub fn new(grid: GridSize, cell_size: f64) -> Self {
        Self { grid, cell_size }
    }
}

impl PointerResolver for AffineResolver {
    fn locate(&self, camera: &CameraModel, pointer: DVec2) -> Result<GridCell, ResolveMiss> {
        let local = camera
            .screen_to_ground(pointer)
            .ok_or(ResolveMiss::InvalidPointer)?;
        cell_at(self.grid, self.cell_size, local)
    }

    fn grid(&self) -> GridSize {
        self.grid
    }
}

// ============================================================================
// Screen Buckets
// ============================================================================

/// A cell's projected outline
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellQuad {
    pub cell: GridCell,
    /// Corners in ground-plane order: (c, r), (c+1, r), (c+1, r+1), (c, r+1)
    pub corners: [DVec2; 4],
}

impl CellQuad {
    /// Project the four corners of `cell`
    pub fn project(camera: &CameraModel, cell: GridCell, cell_size: f64) -> Self {
        let x0 = cell.column as f64 * cell_size;
        let y0 = cell.row as f64 * cell_size;
        let x1 = x0 + cell_size;
        let y1 = y0 + cell_size;
        let corners = [(x0, y0), (x1, y0), (x1, y1), (x0, y1)]
            .map(|(x, y)| camera.project(DVec3::new(x, y, 0.0)));
        Self { cell, corners }
    }

    /// Whether `point` lies inside the quad or on one of its lower edges
    ///
    /// The edges at `c` and `r` belong to the quad, the edges at `c+1` and
    /// `r+1` belong to its neighbours. Works for either winding; a quad
    /// collapsed to a line or point contains nothing.
    pub fn contains(&self, point: DVec2) -> bool {
        let mut positive = false;
        let mut negative = false;
        for i in 0..4 {
            let a = self.corners[i];
            let b = self.corners[(i + 1) % 4];
            let side = edge_function(a, b, point);
            // Edges 1 and 2 run along column c+1 and row r+1
            if side == 0.0 && (i == 1 || i == 2) {
                return false;
            }
            positive |= side > 0.0;
            negative |= side < 0.0;
            if positive && negative {
                return false;
            }
        }
        positive || negative
    }
}

/// Signed area of the parallelogram spanned by `a -> b` and `a -> c`
///
/// Evaluated from the lexicographically smaller endpoint, so the two quads
/// sharing an edge get exactly opposite signs for the same point.
fn edge_function(a: DVec2, b: DVec2, c: DVec2) -> f64 {
    if a.x < b.x || (a.x == b.x && a.y <= b.y) {
        (b - a).perp_dot(c - a)
    } else {
        -(a - b).perp_dot(c - b)
    }
}

/// Largest grid the bucket resolver will project
pub const MAX_BUCKET_CELLS: usize = 1 << 20;

/// Hit-tests against pre-projected cell quads
#[derive(Debug, Clone)]
pub struct BucketResolver {
    grid: GridSize,
    cell_size: f64,
    quads: Vec<CellQuad>,
    revision: Option<u64>,
}

impl BucketResolver {
    pub fn new(grid: GridSize, cell_size: f64) -> Self {
        Self {
            grid,
            cell_size,
            quads: Vec::new(),
            revision: None,
        }
    }

    /// Projected quads from the last [`PointerResolver::sync`]
    pub fn quads(&self) -> &[CellQuad] {
        &self.quads
    }

    fn is_current(&self, camera: &CameraModel) -> bool {
        self.revision == Some(camera.revision())
    }

    fn first_hit(quads: impl Iterator<Item = CellQuad>, pointer: DVec2) -> Option<GridCell> {
        quads
            .filter(|quad| quad.contains(pointer))
            .map(|quad| quad.cell)
            .next()
    }
}

impl PointerResolver for BucketResolver {
    fn locate(&self, camera: &CameraModel, pointer: DVec2) -> Result<GridCell, ResolveMiss> {
        let hit = if self.is_current(camera) {
            Self::first_hit(self.quads.iter().copied(), pointer)
        } else {
            tracing::trace!("Screen buckets stale, projecting on the fly");
            Self::first_hit(
                self.grid
                    .cells()
                    .map(|cell| CellQuad::project(camera, cell, self.cell_size)),
                pointer,
            )
        };
        // Buckets only cover the grid, so a miss cannot name an outside cell
        hit.ok_or(ResolveMiss::InvalidPointer)
    }

    fn sync(&mut self, camera: &CameraModel) {
        if self.is_current(camera) {
            return;
        }
        self.quads.clear();
        self.quads.extend(
            self.grid
                .cells()
                .map(|cell| CellQuad::project(camera, cell, self.cell_size)),
        );
        self.revision = Some(camera.revision());
    }

    fn grid(&self) -> GridSize {
        self.grid
    }
}
