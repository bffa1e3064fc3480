use gw_core::{Coordinate, MovementCapability};

use crate::map::PhysicalMapAggregate;

/// Line rasterisation and line-of-sight queries over a map.
#[derive(Debug, Clone, Copy, Default)]
pub struct MapGeometryService;

impl MapGeometryService {
    /// Cells on the 3-D Bresenham line from `from` to `to`, both ends included.
    pub fn line(from: Coordinate, to: Coordinate) -> Vec<Coordinate> {
        let (x0, y0, z0) = (from.x(), from.y(), from.z());
        let (dx, dy, dz) = (
            (to.x() - x0).abs(),
            (to.y() - y0).abs(),
            (to.z() - z0).abs(),
        );
        let (sx, sy, sz) = (
            (to.x() - x0).signum(),
            (to.y() - y0).signum(),
            (to.z() - z0).signum(),
        );
        let (mut x, mut y, mut z) = (x0, y0, z0);
        let mut cells = vec![from];

        // Drive along the dominant axis, stepping the other two on error overflow.
        if dx >= dy && dx >= dz {
            let (mut e1, mut e2) = (2 * dy - dx, 2 * dz - dx);
            for _ in 0..dx {
                if e1 > 0 {
                    y += sy;
                    e1 -= 2 * dx;
                }
                if e2 > 0 {
                    z += sz;
                    e2 -= 2 * dx;
                }
                e1 += 2 * dy;
                e2 += 2 * dz;
                x += sx;
                push_cell(&mut cells, x, y, z);
            }
        } else if dy >= dx && dy >= dz {
            let (mut e1, mut e2) = (2 * dx - dy, 2 * dz - dy);
            for _ in 0..dy {
                if e1 > 0 {
                    x += sx;
                    e1 -= 2 * dy;
                }
                if e2 > 0 {
                    z += sz;
                    e2 -= 2 * dy;
                }
                e1 += 2 * dx;
                e2 += 2 * dz;
                y += sy;
                push_cell(&mut cells, x, y, z);
            }
        } else {
            let (mut e1, mut e2) = (2 * dy - dz, 2 * dx - dz);
            for _ in 0..dz {
                if e1 > 0 {
                    y += sy;
                    e1 -= 2 * dz;
                }
                if e2 > 0 {
                    x += sx;
                    e2 -= 2 * dz;
                }
                e1 += 2 * dy;
                e2 += 2 * dx;
                z += sz;
                push_cell(&mut cells, x, y, z);
            }
        }
        cells
    }

    /// Whether `to` can be seen from `from`.
    ///
    /// Every cell of the line after the viewer's own counts, the target cell
    /// included: an actor hidden in a forest cannot be spotted, but can still
    /// look out of it.
    pub fn is_visible(map: &PhysicalMapAggregate, from: Coordinate, to: Coordinate) -> bool {
        if from == to {
            return true;
        }
        Self::line(from, to)
            .iter()
            .skip(1)
            .all(|c| !map.is_sight_blocked(*c))
    }

    /// Whether a mover with `capability` can walk the straight line between two cells.
    pub fn has_clear_walk(
        map: &PhysicalMapAggregate,
        from: Coordinate,
        to: Coordinate,
        capability: &MovementCapability,
    ) -> bool {
        Self::line(from, to)
            .iter()
            .all(|c| map.tile(*c).is_some_and(|t| t.is_passable(capability)))
    }
}

fn push_cell(cells: &mut Vec<Coordinate>, x: i32, y: i32, z: i32) {
    // Lines between valid coordinates stay non-negative.
    if let Ok(c) = Coordinate::new(x, y, z) {
        cells.push(c);
    }
}

#[cfg(test)]
mod tests {
    use gw_core::SpotId;
    use proptest::prelude::*;

    use super::*;

    fn at(x: i32, y: i32) -> Coordinate {
        Coordinate::planar(x, y).unwrap()
    }

    fn walled() -> PhysicalMapAggregate {
        PhysicalMapAggregate::from_ascii(
            SpotId::new(1).unwrap(),
            &[
                ".....", //
                "..#..",
                ".....",
            ],
        )
        .unwrap()
    }

    #[test]
    fn straight_and_diagonal_lines() {
        assert_eq!(MapGeometryService::line(at(0, 0), at(3, 0)), vec![at(0, 0), at(1, 0), at(2, 0), at(3, 0)]);
        assert_eq!(MapGeometryService::line(at(0, 0), at(2, 2)), vec![at(0, 0), at(1, 1), at(2, 2)]);
        assert_eq!(MapGeometryService::line(at(1, 1), at(1, 1)), vec![at(1, 1)]);
    }

    #[test]
    fn vertical_line() {
        let from = Coordinate::new(0, 0, 0).unwrap();
        let to = Coordinate::new(0, 0, -2).unwrap();
        assert_eq!(MapGeometryService::line(from, to).len(), 3);
    }

    #[test]
    fn walls_block_sight_including_the_target_cell() {
        let map = walled();
        assert!(!MapGeometryService::is_visible(&map, at(0, 1), at(4, 1)));
        assert!(MapGeometryService::is_visible(&map, at(0, 0), at(4, 0)));
        assert!(MapGeometryService::is_visible(&map, at(2, 1), at(2, 1)));
        // the wall cell itself is hidden, the viewer's own cell is not
        assert!(!MapGeometryService::is_visible(&map, at(1, 1), at(2, 1)));
        assert!(MapGeometryService::is_visible(&map, at(2, 1), at(1, 1)));
    }

    #[test]
    fn actor_in_forest_is_hidden_but_sees_out() {
        let map = PhysicalMapAggregate::from_ascii(SpotId::new(1).unwrap(), &["..T.."]).unwrap();
        assert!(!MapGeometryService::is_visible(&map, at(0, 0), at(2, 0)));
        assert!(MapGeometryService::is_visible(&map, at(2, 0), at(0, 0)));
        assert!(!MapGeometryService::is_visible(&map, at(0, 0), at(4, 0)));
    }

    #[test]
    fn clear_walk_checks_every_cell() {
        let map = walled();
        let walker = MovementCapability::walker();
        assert!(!MapGeometryService::has_clear_walk(&map, at(0, 1), at(4, 1), &walker));
        assert!(MapGeometryService::has_clear_walk(&map, at(0, 2), at(4, 2), &walker));
    }

    proptest! {
        #[test]
        fn line_is_connected_and_ends_at_target(
            x0 in 0i32..20, y0 in 0i32..20, x1 in 0i32..20, y1 in 0i32..20,
        ) {
            let line = MapGeometryService::line(at(x0, y0), at(x1, y1));
            prop_assert_eq!(line.first().copied(), Some(at(x0, y0)));
            prop_assert_eq!(line.last().copied(), Some(at(x1, y1)));
            for pair in line.windows(2) {
                prop_assert_eq!(pair[0].chebyshev_distance(pair[1]), 1);
            }
        }
    }
}
