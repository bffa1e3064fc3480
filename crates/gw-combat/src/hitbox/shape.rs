use gw_core::{Coordinate, Direction};
use serde::{Deserialize, Serialize};

use crate::error::{CombatError, CombatResult};

/// An offset from a hit box's origin cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RelativeCoordinate {
    /// X offset.
    pub dx: i32,
    /// Y offset.
    pub dy: i32,
    /// Z offset.
    #[serde(default)]
    pub dz: i32,
}

impl RelativeCoordinate {
    /// A planar offset.
    pub const fn planar(dx: i32, dy: i32) -> Self {
        Self { dx, dy, dz: 0 }
    }
}

/// The set of cells a hit box covers, relative to its position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<RelativeCoordinate>", into = "Vec<RelativeCoordinate>")]
pub struct HitBoxShape {
    cells: Vec<RelativeCoordinate>,
}

impl HitBoxShape {
    /// A shape from explicit offsets. Duplicates are merged; an empty set is rejected.
    pub fn new(mut cells: Vec<RelativeCoordinate>) -> CombatResult<Self> {
        cells.sort();
        cells.dedup();
        if cells.is_empty() {
            return Err(CombatError::InvalidShape("a shape needs at least one cell".into()));
        }
        Ok(Self { cells })
    }

    /// Just the origin cell.
    pub fn single_cell() -> Self {
        Self {
            cells: vec![RelativeCoordinate::planar(0, 0)],
        }
    }

    /// `length` cells starting at the origin and extending in `direction`.
    pub fn line(length: u32, direction: Direction) -> CombatResult<Self> {
        if length == 0 {
            return Err(CombatError::InvalidShape("line length must be positive".into()));
        }
        let (dx, dy, dz) = direction.delta();
        let cells = (0..length as i32)
            .map(|k| RelativeCoordinate {
                dx: dx * k,
                dy: dy * k,
                dz: dz * k,
            })
            .collect();
        Self::new(cells)
    }

    /// A plus sign with arms of `radius` cells.
    pub fn cross(radius: u32) -> Self {
        let r = radius as i32;
        let mut cells = vec![RelativeCoordinate::planar(0, 0)];
        for k in 1..=r {
            cells.extend([
                RelativeCoordinate::planar(k, 0),
                RelativeCoordinate::planar(-k, 0),
                RelativeCoordinate::planar(0, k),
                RelativeCoordinate::planar(0, -k),
            ]);
        }
        cells.sort();
        Self { cells }
    }

    /// A `(2r+1)` square centred on the origin.
    pub fn square(radius: u32) -> Self {
        let r = radius as i32;
        let mut cells = Vec::new();
        for dx in -r..=r {
            for dy in -r..=r {
                cells.push(RelativeCoordinate::planar(dx, dy));
            }
        }
        Self { cells }
    }

    /// A planar disc of Euclidean `radius`.
    pub fn circle(radius: u32) -> Self {
        let r = radius as i32;
        let limit = r * r;
        let mut cells = Vec::new();
        for dx in -r..=r {
            for dy in -r..=r {
                if dx * dx + dy * dy <= limit {
                    cells.push(RelativeCoordinate::planar(dx, dy));
                }
            }
        }
        Self { cells }
    }

    /// The relative cells, sorted.
    pub fn cells(&self) -> &[RelativeCoordinate] {
        &self.cells
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Always false; shapes are never empty.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Absolute cells around `origin`. Offsets that would leave the grid
    /// (negative x or y) are dropped, not clamped.
    pub fn to_absolute(&self, origin: Coordinate) -> Vec<Coordinate> {
        self.cells
            .iter()
            .filter_map(|c| origin.try_offset(c.dx, c.dy, c.dz))
            .collect()
    }
}

impl TryFrom<Vec<RelativeCoordinate>> for HitBoxShape {
    type Error = CombatError;

    fn try_from(cells: Vec<RelativeCoordinate>) -> CombatResult<Self> {
        Self::new(cells)
    }
}

impl From<HitBoxShape> for Vec<RelativeCoordinate> {
    fn from(shape: HitBoxShape) -> Self {
        shape.cells
    }
}
