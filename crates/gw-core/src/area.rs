use serde::{Deserialize, Serialize};

use crate::coordinate::Coordinate;
use crate::error::{CoreError, CoreResult};

/// A set of coordinates described by a shape.
///
/// Used for gateway activation zones and spawn regions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum Area {
    /// A single cell.
    Point {
        /// The cell.
        at: Coordinate,
    },
    /// An axis-aligned cuboid, bounds inclusive.
    Rect {
        /// Corner with the smallest components.
        min: Coordinate,
        /// Corner with the largest components.
        max: Coordinate,
    },
    /// A planar disc on the centre's level.
    Circle {
        /// Centre cell.
        center: Coordinate,
        /// Euclidean radius in cells.
        radius: u32,
    },
    /// The union of several areas.
    Composite {
        /// Member areas.
        parts: Vec<Area>,
    },
}

impl Area {
    /// A single-cell area.
    pub fn point(at: Coordinate) -> Self {
        Self::Point { at }
    }

    /// A cuboid area; rejects corners given in the wrong order.
    pub fn rect(min: Coordinate, max: Coordinate) -> CoreResult<Self> {
        if min.x() > max.x() || min.y() > max.y() || min.z() > max.z() {
            return Err(CoreError::validation(format!(
                "rect corners out of order: {min} > {max}"
            )));
        }
        Ok(Self::Rect { min, max })
    }

    /// A planar disc.
    pub fn circle(center: Coordinate, radius: u32) -> Self {
        Self::Circle { center, radius }
    }

    /// A union of areas; rejects an empty list.
    pub fn composite(parts: Vec<Area>) -> CoreResult<Self> {
        if parts.is_empty() {
            return Err(CoreError::validation("composite area needs at least one part"));
        }
        Ok(Self::Composite { parts })
    }

    /// Whether `coord` lies inside the area.
    pub fn contains(&self, coord: Coordinate) -> bool {
        match self {
            Self::Point { at } => *at == coord,
            Self::Rect { min, max } => {
                (min.x()..=max.x()).contains(&coord.x())
                    && (min.y()..=max.y()).contains(&coord.y())
                    && (min.z()..=max.z()).contains(&coord.z())
            }
            Self::Circle { center, radius } => {
                coord.z() == center.z()
                    && coord.euclidean_distance(*center) <= f64::from(*radius)
            }
            Self::Composite { parts } => parts.iter().any(|p| p.contains(coord)),
        }
    }

    /// Every coordinate in the area, sorted and without duplicates.
    pub fn coordinates(&self) -> Vec<Coordinate> {
        let mut out = Vec::new();
        self.collect_into(&mut out);
        out.sort();
        out.dedup();
        out
    }

    fn collect_into(&self, out: &mut Vec<Coordinate>) {
        match self {
            Self::Point { at } => out.push(*at),
            Self::Rect { min, max } => {
                for z in min.z()..=max.z() {
                    for y in min.y()..=max.y() {
                        for x in min.x()..=max.x() {
                            if let Ok(c) = Coordinate::new(x, y, z) {
                                out.push(c);
                            }
                        }
                    }
                }
            }
            Self::Circle { center, radius } => {
                let r = *radius as i32;
                for dy in -r..=r {
                    for dx in -r..=r {
                        if let Some(c) = center.try_offset(dx, dy, 0) {
                            if self.contains(c) {
                                out.push(c);
                            }
                        }
                    }
                }
            }
            Self::Composite { parts } => {
                for part in parts {
                    part.collect_into(out);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(x: i32, y: i32) -> Coordinate {
        Coordinate::planar(x, y).unwrap()
    }

    #[test]
    fn rect_contains_inclusive_bounds() {
        let area = Area::rect(c(1, 1), c(3, 2)).unwrap();
        assert!(area.contains(c(1, 1)));
        assert!(area.contains(c(3, 2)));
        assert!(!area.contains(c(4, 2)));
        assert_eq!(area.coordinates().len(), 6);
    }

    #[test]
    fn rect_rejects_swapped_corners() {
        assert!(Area::rect(c(3, 3), c(1, 1)).is_err());
    }

    #[test]
    fn circle_stays_on_grid() {
        let area = Area::circle(c(0, 0), 1);
        let cells = area.coordinates();
        assert_eq!(cells, vec![c(0, 0), c(0, 1), c(1, 0)]);
    }

    #[test]
    fn composite_union_dedups() {
        let area = Area::composite(vec![Area::point(c(2, 2)), Area::point(c(2, 2))]).unwrap();
        assert_eq!(area.coordinates(), vec![c(2, 2)]);
        assert!(Area::composite(vec![]).is_err());
    }
}
