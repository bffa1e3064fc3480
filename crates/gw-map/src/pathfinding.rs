//! Grid pathfinding honouring per-mover movement capability.
//!
//! [`PathfindingService`] validates the request and post-processes the result;
//! the search itself is a pluggable [`PathfindingStrategy`], A* by default.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, BinaryHeap};

use gw_core::{Coordinate, Direction, MovementCapability};
use tracing::debug;

use crate::error::{MapError, MapResult};
use crate::geometry::MapGeometryService;
use crate::map::PhysicalMapAggregate;

/// Cheapest per-cell cost of any terrain; keeps the heuristic admissible.
const MIN_STEP_COST: f64 = 0.8;

/// Options for [`PathfindingService::calculate_path`].
#[derive(Debug, Clone)]
pub struct PathOptions {
    /// Accept an impassable goal and return the path to the closest reachable cell.
    pub allow_partial_path: bool,
    /// Return an empty path instead of an error.
    pub ignore_errors: bool,
    /// Remove intermediate waypoints that a straight walk can skip.
    pub smooth: bool,
    /// Node expansions before the search gives up.
    pub max_iterations: usize,
    /// Extra cells to treat as impassable, typically other blocking objects.
    pub blocked: BTreeSet<Coordinate>,
}

impl Default for PathOptions {
    fn default() -> Self {
        Self {
            allow_partial_path: false,
            ignore_errors: false,
            smooth: false,
            max_iterations: 2_000,
            blocked: BTreeSet::new(),
        }
    }
}

impl PathOptions {
    /// Allow partial paths.
    pub fn with_partial(mut self) -> Self {
        self.allow_partial_path = true;
        self
    }

    /// Swallow errors into an empty path.
    pub fn ignoring_errors(mut self) -> Self {
        self.ignore_errors = true;
        self
    }

    /// Smooth the result.
    pub fn smoothed(mut self) -> Self {
        self.smooth = true;
        self
    }

    /// Set the expansion limit.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Treat extra cells as impassable.
    pub fn with_blocked(mut self, blocked: BTreeSet<Coordinate>) -> Self {
        self.blocked = blocked;
        self
    }
}

/// Outcome of a raw search.
#[derive(Debug, Clone, PartialEq)]
pub struct PathSearch {
    /// Cells from start to the last reached cell, inclusive.
    pub path: Vec<Coordinate>,
    /// Whether the last cell is the goal.
    pub reached_goal: bool,
}

/// A grid search algorithm.
pub trait PathfindingStrategy {
    /// Search from `start` to `goal`. On failure the path leads to the explored
    /// cell closest to the goal.
    fn find_path(
        &self,
        map: &PhysicalMapAggregate,
        start: Coordinate,
        goal: Coordinate,
        capability: &MovementCapability,
        options: &PathOptions,
    ) -> PathSearch;
}

/// Node in the A* open set.
#[derive(Debug, Clone, Copy)]
struct PathNode {
    coord: Coordinate,
    f_cost: f64,
}

impl PartialEq for PathNode {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PathNode {}

impl Ord for PathNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse order for min-heap; coordinate breaks ties deterministically.
        other
            .f_cost
            .total_cmp(&self.f_cost)
            .then_with(|| other.coord.cmp(&self.coord))
    }
}

impl PartialOrd for PathNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A* over the eight planar neighbours, plus up and down for flyers.
///
/// Diagonal steps may not cut corners past impassable cells.
#[derive(Debug, Clone, Copy, Default)]
pub struct AStarStrategy;

impl AStarStrategy {
    fn enterable(
        map: &PhysicalMapAggregate,
        coord: Coordinate,
        goal: Coordinate,
        capability: &MovementCapability,
        options: &PathOptions,
    ) -> Option<f64> {
        if coord != goal && options.blocked.contains(&coord) {
            return None;
        }
        map.tile(coord)?.movement_cost(capability)
    }

    fn neighbors(
        map: &PhysicalMapAggregate,
        from: Coordinate,
        goal: Coordinate,
        capability: &MovementCapability,
        options: &PathOptions,
    ) -> Vec<(Coordinate, f64)> {
        let mut out = Vec::with_capacity(10);
        for direction in Direction::PLANAR {
            let Some(next) = from.neighbor(direction) else {
                continue;
            };
            let Some(cost) = Self::enterable(map, next, goal, capability, options) else {
                continue;
            };
            if direction.is_diagonal() {
                let (dx, dy, _) = direction.delta();
                let side_a = from.try_offset(dx, 0, 0);
                let side_b = from.try_offset(0, dy, 0);
                let clear = |side: Option<Coordinate>| {
                    side.and_then(|c| map.tile(c))
                        .is_some_and(|t| t.is_passable(capability))
                };
                if !(clear(side_a) && clear(side_b)) {
                    continue;
                }
                out.push((next, cost * std::f64::consts::SQRT_2));
            } else {
                out.push((next, cost));
            }
        }
        if capability.can_fly || capability.can_phase {
            for direction in [Direction::Up, Direction::Down] {
                if let Some(next) = from.neighbor(direction) {
                    if let Some(cost) = Self::enterable(map, next, goal, capability, options) {
                        out.push((next, cost));
                    }
                }
            }
        }
        out
    }
}

impl PathfindingStrategy for AStarStrategy {
    fn find_path(
        &self,
        map: &PhysicalMapAggregate,
        start: Coordinate,
        goal: Coordinate,
        capability: &MovementCapability,
        options: &PathOptions,
    ) -> PathSearch {
        let heuristic = |c: Coordinate| c.euclidean_distance(goal) * MIN_STEP_COST;

        let mut open_set = BinaryHeap::new();
        let mut came_from: BTreeMap<Coordinate, Coordinate> = BTreeMap::new();
        let mut g_scores: BTreeMap<Coordinate, f64> = BTreeMap::new();
        let mut closest = (heuristic(start), start);
        let mut iterations = 0;

        g_scores.insert(start, 0.0);
        open_set.push(PathNode {
            coord: start,
            f_cost: heuristic(start),
        });

        while let Some(current) = open_set.pop() {
            if current.coord == goal {
                return PathSearch {
                    path: reconstruct_path(&came_from, goal),
                    reached_goal: true,
                };
            }
            iterations += 1;
            if iterations > options.max_iterations {
                debug!(%start, %goal, iterations, "path search hit iteration limit");
                break;
            }

            let current_g = g_scores.get(&current.coord).copied().unwrap_or(f64::INFINITY);
            if current.f_cost > current_g + heuristic(current.coord) + f64::EPSILON {
                // Stale heap entry.
                continue;
            }
            let h = heuristic(current.coord);
            if h < closest.0 {
                closest = (h, current.coord);
            }

            for (neighbor, step_cost) in Self::neighbors(map, current.coord, goal, capability, options) {
                let tentative_g = current_g + step_cost;
                let neighbor_g = g_scores.get(&neighbor).copied().unwrap_or(f64::INFINITY);
                if tentative_g < neighbor_g {
                    came_from.insert(neighbor, current.coord);
                    g_scores.insert(neighbor, tentative_g);
                    open_set.push(PathNode {
                        coord: neighbor,
                        f_cost: tentative_g + heuristic(neighbor),
                    });
                }
            }
        }

        PathSearch {
            path: reconstruct_path(&came_from, closest.1),
            reached_goal: false,
        }
    }
}

/// Reconstruct path from came_from map.
fn reconstruct_path(came_from: &BTreeMap<Coordinate, Coordinate>, mut current: Coordinate) -> Vec<Coordinate> {
    let mut path = vec![current];
    while let Some(&prev) = came_from.get(&current) {
        path.push(prev);
        current = prev;
    }
    path.reverse();
    path
}

/// Validating front end over a [`PathfindingStrategy`].
#[derive(Debug, Clone, Default)]
pub struct PathfindingService<S = AStarStrategy> {
    strategy: S,
}

impl<S: PathfindingStrategy> PathfindingService<S> {
    /// A service over `strategy`.
    pub fn new(strategy: S) -> Self {
        Self { strategy }
    }

    /// Compute a path from `start` to `goal`, both included.
    ///
    /// The start must always be passable and the goal too unless partial paths
    /// are allowed. `start == goal` yields `[start]`. With `ignore_errors` every
    /// failure becomes an empty path.
    pub fn calculate_path(
        &self,
        map: &PhysicalMapAggregate,
        start: Coordinate,
        goal: Coordinate,
        capability: &MovementCapability,
        options: &PathOptions,
    ) -> MapResult<Vec<Coordinate>> {
        match self.try_calculate(map, start, goal, capability, options) {
            Ok(path) => Ok(path),
            Err(err) if options.ignore_errors => {
                debug!(%start, %goal, %err, "path request failed, returning empty path");
                Ok(Vec::new())
            }
            Err(err) => Err(err),
        }
    }

    fn try_calculate(
        &self,
        map: &PhysicalMapAggregate,
        start: Coordinate,
        goal: Coordinate,
        capability: &MovementCapability,
        options: &PathOptions,
    ) -> MapResult<Vec<Coordinate>> {
        let passable = |c: Coordinate| map.tile(c).is_some_and(|t| t.is_passable(capability));
        if !passable(start) {
            return Err(MapError::InvalidPathRequest(format!("start {start} is not passable")));
        }
        if start == goal {
            return Ok(vec![start]);
        }
        if !options.allow_partial_path && !passable(goal) {
            return Err(MapError::InvalidPathRequest(format!("goal {goal} is not passable")));
        }

        let search = self.strategy.find_path(map, start, goal, capability, options);
        if !search.reached_goal && (!options.allow_partial_path || search.path.len() < 2) {
            return Err(MapError::PathNotFound { start, goal });
        }
        let path = if options.smooth {
            smooth_path(map, &search.path, capability)
        } else {
            search.path
        };
        Ok(path)
    }
}

/// Greedy line-of-sight smoothing: from each kept waypoint jump to the farthest
/// later waypoint reachable by a straight clear walk.
pub fn smooth_path(
    map: &PhysicalMapAggregate,
    path: &[Coordinate],
    capability: &MovementCapability,
) -> Vec<Coordinate> {
    let Some(&first) = path.first() else {
        return Vec::new();
    };
    let mut smoothed = vec![first];
    let mut current = 0;
    while current < path.len() - 1 {
        let mut next = current + 1;
        for candidate in (current + 2..path.len()).rev() {
            if MapGeometryService::has_clear_walk(map, path[current], path[candidate], capability) {
                next = candidate;
                break;
            }
        }
        smoothed.push(path[next]);
        current = next;
    }
    smoothed
}

#[cfg(test)]
mod tests {
    use gw_core::SpotId;

    use super::*;

    fn at(x: i32, y: i32) -> Coordinate {
        Coordinate::planar(x, y).unwrap()
    }

    fn map(rows: &[&str]) -> PhysicalMapAggregate {
        PhysicalMapAggregate::from_ascii(SpotId::new(1).unwrap(), rows).unwrap()
    }

    fn service() -> PathfindingService {
        PathfindingService::default()
    }

    #[test]
    fn start_equals_goal() {
        let m = map(&["..."]);
        let path = service()
            .calculate_path(&m, at(1, 0), at(1, 0), &MovementCapability::walker(), &PathOptions::default())
            .unwrap();
        assert_eq!(path, vec![at(1, 0)]);
    }

    #[test]
    fn straight_path() {
        let m = map(&["....."]);
        let path = service()
            .calculate_path(&m, at(0, 0), at(4, 0), &MovementCapability::walker(), &PathOptions::default())
            .unwrap();
        assert_eq!(path.len(), 5);
        assert_eq!(path.first(), Some(&at(0, 0)));
        assert_eq!(path.last(), Some(&at(4, 0)));
    }

    #[test]
    fn detours_around_wall() {
        let m = map(&[
            "...", //
            ".#.",
            "...",
        ]);
        let path = service()
            .calculate_path(&m, at(0, 1), at(2, 1), &MovementCapability::walker(), &PathOptions::default())
            .unwrap();
        assert!(!path.contains(&at(1, 1)));
        for pair in path.windows(2) {
            assert_eq!(pair[0].chebyshev_distance(pair[1]), 1);
        }
    }

    #[test]
    fn no_corner_cutting() {
        let m = map(&[
            ".#", //
            "..",
        ]);
        let path = service()
            .calculate_path(&m, at(0, 0), at(1, 1), &MovementCapability::walker(), &PathOptions::default())
            .unwrap();
        assert_eq!(path, vec![at(0, 0), at(0, 1), at(1, 1)]);
    }

    #[test]
    fn impassable_start_or_goal_is_invalid() {
        let m = map(&[".#."]);
        let walker = MovementCapability::walker();
        let err = service()
            .calculate_path(&m, at(1, 0), at(0, 0), &walker, &PathOptions::default())
            .unwrap_err();
        assert!(matches!(err, MapError::InvalidPathRequest(_)));
        let err = service()
            .calculate_path(&m, at(0, 0), at(1, 0), &walker, &PathOptions::default())
            .unwrap_err();
        assert!(matches!(err, MapError::InvalidPathRequest(_)));
        let empty = service()
            .calculate_path(&m, at(0, 0), at(1, 0), &walker, &PathOptions::default().ignoring_errors())
            .unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn unreachable_goal() {
        let m = map(&[".#."]);
        let walker = MovementCapability::walker();
        let err = service()
            .calculate_path(&m, at(0, 0), at(2, 0), &walker, &PathOptions::default())
            .unwrap_err();
        assert!(matches!(err, MapError::PathNotFound { .. }));
    }

    #[test]
    fn partial_path_gets_close() {
        let m = map(&["...#"]);
        let path = service()
            .calculate_path(&m, at(0, 0), at(3, 0), &MovementCapability::walker(), &PathOptions::default().with_partial())
            .unwrap();
        assert_eq!(path.last(), Some(&at(2, 0)));
    }

    #[test]
    fn blocked_cells_avoided_but_goal_allowed() {
        let m = map(&["...", "..."]);
        let blocked: BTreeSet<_> = [at(1, 0), at(2, 0)].into_iter().collect();
        let path = service()
            .calculate_path(
                &m,
                at(0, 0),
                at(2, 0),
                &MovementCapability::walker(),
                &PathOptions::default().with_blocked(blocked),
            )
            .unwrap();
        assert!(!path.contains(&at(1, 0)));
        assert_eq!(path.last(), Some(&at(2, 0)));
    }

    #[test]
    fn flyers_cross_water() {
        let m = map(&[".~~."]);
        let walker = MovementCapability::walker();
        assert!(service()
            .calculate_path(&m, at(0, 0), at(3, 0), &walker, &PathOptions::default())
            .is_err());
        let path = service()
            .calculate_path(&m, at(0, 0), at(3, 0), &MovementCapability::flyer(), &PathOptions::default())
            .unwrap();
        assert_eq!(path.len(), 4);
    }

    #[test]
    fn smoothing_drops_intermediate_waypoints() {
        let m = map(&["....."]);
        let path = service()
            .calculate_path(
                &m,
                at(0, 0),
                at(4, 0),
                &MovementCapability::walker(),
                &PathOptions::default().smoothed(),
            )
            .unwrap();
        assert_eq!(path, vec![at(0, 0), at(4, 0)]);
    }

    #[test]
    fn iteration_limit_fails_long_searches() {
        let m = map(&[".........."]);
        let err = service()
            .calculate_path(
                &m,
                at(0, 0),
                at(9, 0),
                &MovementCapability::walker(),
                &PathOptions::default().with_max_iterations(2),
            )
            .unwrap_err();
        assert!(matches!(err, MapError::PathNotFound { .. }));
    }
}
