use gw_core::{Coordinate, MovementCapability, MovementCost, TerrainType};
use serde::{Deserialize, Serialize};

use crate::error::{MapError, MapResult};

/// One grid cell: terrain plus an optional walkability override.
///
/// Tiles are values. The map replaces a tile instead of mutating it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tile {
    coordinate: Coordinate,
    terrain: TerrainType,
    walkable_override: Option<bool>,
}

impl Tile {
    /// A tile without override.
    pub fn new(coordinate: Coordinate, terrain: TerrainType) -> Self {
        Self {
            coordinate,
            terrain,
            walkable_override: None,
        }
    }

    /// Parse a terrain symbol as used by ASCII map layouts.
    pub fn terrain_from_symbol(symbol: char) -> MapResult<TerrainType> {
        let terrain = match symbol {
            '.' => TerrainType::Grass,
            '=' => TerrainType::Road,
            's' => TerrainType::Sand,
            'T' => TerrainType::Forest,
            '%' => TerrainType::Swamp,
            ',' => TerrainType::ShallowWater,
            '~' => TerrainType::DeepWater,
            '^' => TerrainType::Mountain,
            '#' => TerrainType::Wall,
            'L' => TerrainType::Lava,
            'v' => TerrainType::Chasm,
            other => {
                return Err(MapError::InvalidGrid(format!(
                    "unknown terrain symbol '{other}'"
                )));
            }
        };
        Ok(terrain)
    }

    /// Position of the tile.
    pub fn coordinate(&self) -> Coordinate {
        self.coordinate
    }

    /// Underlying terrain.
    pub fn terrain(&self) -> TerrainType {
        self.terrain
    }

    /// The override, if one is set.
    pub fn walkable_override(&self) -> Option<bool> {
        self.walkable_override
    }

    /// Copy with a walkability override.
    pub fn with_override(self, walkable: bool) -> Self {
        Self {
            walkable_override: Some(walkable),
            ..self
        }
    }

    /// Copy without override.
    pub fn without_override(self) -> Self {
        Self {
            walkable_override: None,
            ..self
        }
    }

    /// Copy with different terrain; the override is kept.
    pub fn with_terrain(self, terrain: TerrainType) -> Self {
        Self { terrain, ..self }
    }

    /// Whether a mover with `capability` may enter. The override wins over terrain.
    pub fn is_passable(&self, capability: &MovementCapability) -> bool {
        self.movement_cost(capability).is_some()
    }

    /// Cost of entering the tile, `None` when it cannot be entered.
    ///
    /// A forced-walkable tile costs what its terrain costs, or 1.0 when the
    /// terrain itself is impassable.
    pub fn movement_cost(&self, capability: &MovementCapability) -> Option<f64> {
        match self.walkable_override {
            Some(false) => None,
            Some(true) => Some(MovementCost::for_terrain(self.terrain, capability).unwrap_or(1.0)),
            None => MovementCost::for_terrain(self.terrain, capability),
        }
    }

    /// Whether the tile stops line of sight.
    pub fn is_sight_blocked(&self) -> bool {
        self.terrain.is_sight_blocking()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(x: i32, y: i32) -> Coordinate {
        Coordinate::planar(x, y).unwrap()
    }

    #[test]
    fn override_wins_over_terrain() {
        let wall = Tile::new(at(0, 0), TerrainType::Wall);
        let walker = MovementCapability::walker();
        assert!(!wall.is_passable(&walker));
        assert!(wall.with_override(true).is_passable(&walker));
        assert_eq!(wall.with_override(true).movement_cost(&walker), Some(1.0));

        let grass = Tile::new(at(0, 0), TerrainType::Grass).with_override(false);
        assert!(!grass.is_passable(&MovementCapability::ghost()));
        assert!(grass.without_override().is_passable(&walker));
    }

    #[test]
    fn terrain_change_keeps_override() {
        let tile = Tile::new(at(1, 1), TerrainType::Grass)
            .with_override(false)
            .with_terrain(TerrainType::Road);
        assert_eq!(tile.terrain(), TerrainType::Road);
        assert_eq!(tile.walkable_override(), Some(false));
    }

    #[test]
    fn symbols() {
        assert_eq!(Tile::terrain_from_symbol('#').unwrap(), TerrainType::Wall);
        assert_eq!(Tile::terrain_from_symbol('~').unwrap(), TerrainType::DeepWater);
        assert!(Tile::terrain_from_symbol('?').is_err());
    }
}
