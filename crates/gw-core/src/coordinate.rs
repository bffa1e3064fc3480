use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// A cell on a physical map.
///
/// `x` and `y` are never negative; `z` is unconstrained so levels below
/// ground (caves, dungeons) can use negative values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawCoordinate", into = "RawCoordinate")]
pub struct Coordinate {
    x: i32,
    y: i32,
    z: i32,
}

#[derive(Serialize, Deserialize)]
struct RawCoordinate {
    x: i32,
    y: i32,
    #[serde(default)]
    z: i32,
}

impl TryFrom<RawCoordinate> for Coordinate {
    type Error = CoreError;

    fn try_from(raw: RawCoordinate) -> CoreResult<Self> {
        Coordinate::new(raw.x, raw.y, raw.z)
    }
}

impl From<Coordinate> for RawCoordinate {
    fn from(c: Coordinate) -> Self {
        RawCoordinate {
            x: c.x,
            y: c.y,
            z: c.z,
        }
    }
}

impl Coordinate {
    /// Create a coordinate, rejecting negative `x` or `y`.
    pub fn new(x: i32, y: i32, z: i32) -> CoreResult<Self> {
        if x < 0 || y < 0 {
            return Err(CoreError::validation(format!(
                "coordinate ({x}, {y}, {z}) has a negative planar component"
            )));
        }
        Ok(Self { x, y, z })
    }

    /// Shorthand for a ground-level coordinate.
    pub fn planar(x: i32, y: i32) -> CoreResult<Self> {
        Self::new(x, y, 0)
    }

    /// The x component.
    pub fn x(self) -> i32 {
        self.x
    }

    /// The y component.
    pub fn y(self) -> i32 {
        self.y
    }

    /// The z (level) component.
    pub fn z(self) -> i32 {
        self.z
    }

    /// The coordinate shifted by the given offsets, or `None` if it leaves the grid.
    pub fn try_offset(self, dx: i32, dy: i32, dz: i32) -> Option<Self> {
        let x = self.x.checked_add(dx)?;
        let y = self.y.checked_add(dy)?;
        let z = self.z.checked_add(dz)?;
        Self::new(x, y, z).ok()
    }

    /// The adjacent coordinate in `direction`, if it stays on the grid.
    pub fn neighbor(self, direction: Direction) -> Option<Self> {
        let (dx, dy, dz) = direction.delta();
        self.try_offset(dx, dy, dz)
    }

    /// All on-grid neighbours in the given directions.
    pub fn neighbors(self, directions: &[Direction]) -> Vec<Self> {
        directions
            .iter()
            .filter_map(|d| self.neighbor(*d))
            .collect()
    }

    /// Sum of absolute component differences.
    pub fn manhattan_distance(self, other: Self) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y) + self.z.abs_diff(other.z)
    }

    /// Largest absolute component difference (king-move distance).
    pub fn chebyshev_distance(self, other: Self) -> u32 {
        self.x
            .abs_diff(other.x)
            .max(self.y.abs_diff(other.y))
            .max(self.z.abs_diff(other.z))
    }

    /// Straight-line distance.
    pub fn euclidean_distance(self, other: Self) -> f64 {
        let dx = f64::from(self.x - other.x);
        let dy = f64::from(self.y - other.y);
        let dz = f64::from(self.z - other.z);
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// The single-step direction that best approaches `other`.
    ///
    /// Planar movement wins over vertical movement; `None` when both are equal.
    pub fn direction_to(self, other: Self) -> Option<Direction> {
        let sx = (other.x - self.x).signum();
        let sy = (other.y - self.y).signum();
        if sx == 0 && sy == 0 {
            return match (other.z - self.z).signum() {
                1 => Some(Direction::Up),
                -1 => Some(Direction::Down),
                _ => None,
            };
        }
        Direction::from_planar_delta(sx, sy)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Compass directions plus vertical movement.
///
/// North points toward decreasing `y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Toward decreasing `y`.
    North,
    /// Decreasing `y`, increasing `x`.
    NorthEast,
    /// Toward increasing `x`.
    East,
    /// Increasing `y`, increasing `x`.
    SouthEast,
    /// Toward increasing `y`.
    South,
    /// Increasing `y`, decreasing `x`.
    SouthWest,
    /// Toward decreasing `x`.
    West,
    /// Decreasing `y`, decreasing `x`.
    NorthWest,
    /// Toward increasing `z`.
    Up,
    /// Toward decreasing `z`.
    Down,
}

impl Direction {
    /// The eight planar directions, clockwise from north.
    pub const PLANAR: [Direction; 8] = [
        Direction::North,
        Direction::NorthEast,
        Direction::East,
        Direction::SouthEast,
        Direction::South,
        Direction::SouthWest,
        Direction::West,
        Direction::NorthWest,
    ];

    /// The four orthogonal planar directions.
    pub const CARDINAL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// Unit offset `(dx, dy, dz)` of one step in this direction.
    pub fn delta(self) -> (i32, i32, i32) {
        match self {
            Self::North => (0, -1, 0),
            Self::NorthEast => (1, -1, 0),
            Self::East => (1, 0, 0),
            Self::SouthEast => (1, 1, 0),
            Self::South => (0, 1, 0),
            Self::SouthWest => (-1, 1, 0),
            Self::West => (-1, 0, 0),
            Self::NorthWest => (-1, -1, 0),
            Self::Up => (0, 0, 1),
            Self::Down => (0, 0, -1),
        }
    }

    /// The reverse direction.
    pub fn opposite(self) -> Self {
        match self {
            Self::North => Self::South,
            Self::NorthEast => Self::SouthWest,
            Self::East => Self::West,
            Self::SouthEast => Self::NorthWest,
            Self::South => Self::North,
            Self::SouthWest => Self::NorthEast,
            Self::West => Self::East,
            Self::NorthWest => Self::SouthEast,
            Self::Up => Self::Down,
            Self::Down => Self::Up,
        }
    }

    /// True for the four diagonal compass points.
    pub fn is_diagonal(self) -> bool {
        matches!(
            self,
            Self::NorthEast | Self::SouthEast | Self::SouthWest | Self::NorthWest
        )
    }

    /// Planar heading in degrees, clockwise from north. `None` for vertical directions.
    pub fn heading_degrees(self) -> Option<f64> {
        let index = Self::PLANAR.iter().position(|d| *d == self)?;
        Some(index as f64 * 45.0)
    }

    fn from_planar_delta(sx: i32, sy: i32) -> Option<Self> {
        Self::PLANAR.into_iter().find(|d| {
            let (dx, dy, _) = d.delta();
            dx == sx && dy == sy
        })
    }
}
