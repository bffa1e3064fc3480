use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// The ground a tile is made of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerrainType {
    /// Open ground.
    Grass,
    /// Paved ground, cheapest to walk.
    Road,
    /// Loose ground.
    Sand,
    /// Walkable but slow, blocks sight.
    Forest,
    /// Walkable but very slow.
    Swamp,
    /// Wadeable water.
    ShallowWater,
    /// Water that requires swimming.
    DeepWater,
    /// Impassable on foot, blocks sight.
    Mountain,
    /// Solid wall, blocks sight.
    Wall,
    /// Molten rock; only flyers cross it.
    Lava,
    /// A drop; only flyers cross it.
    Chasm,
}

impl TerrainType {
    /// Whether the terrain stops line of sight.
    pub fn is_sight_blocking(self) -> bool {
        matches!(self, Self::Forest | Self::Mountain | Self::Wall)
    }

    /// Whether a mover with `capability` can enter the terrain.
    pub fn can_pass(self, capability: &MovementCapability) -> bool {
        MovementCost::for_terrain(self, capability).is_some()
    }
}

/// How an object is able to move across terrain.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MovementCapability {
    /// Can cross land.
    pub can_walk: bool,
    /// Can cross deep water.
    pub can_swim: bool,
    /// Ignores ground terrain except walls and mountains.
    pub can_fly: bool,
    /// Passes through walls and mountains.
    pub can_phase: bool,
    /// Cells per tick; divides terrain cost.
    pub speed: f64,
}

impl Default for MovementCapability {
    fn default() -> Self {
        Self::walker()
    }
}

impl MovementCapability {
    /// Build a capability, rejecting non-positive speed.
    pub fn new(
        can_walk: bool,
        can_swim: bool,
        can_fly: bool,
        can_phase: bool,
        speed: f64,
    ) -> CoreResult<Self> {
        if !(speed.is_finite() && speed > 0.0) {
            return Err(CoreError::validation(format!(
                "movement speed must be positive, got {speed}"
            )));
        }
        Ok(Self {
            can_walk,
            can_swim,
            can_fly,
            can_phase,
            speed,
        })
    }

    /// A land-bound mover.
    pub fn walker() -> Self {
        Self {
            can_walk: true,
            can_swim: false,
            can_fly: false,
            can_phase: false,
            speed: 1.0,
        }
    }

    /// A mover at home on land and in deep water.
    pub fn swimmer() -> Self {
        Self {
            can_swim: true,
            ..Self::walker()
        }
    }

    /// A flying mover.
    pub fn flyer() -> Self {
        Self {
            can_fly: true,
            ..Self::walker()
        }
    }

    /// A mover that passes through everything.
    pub fn ghost() -> Self {
        Self {
            can_walk: true,
            can_swim: true,
            can_fly: true,
            can_phase: true,
            speed: 1.0,
        }
    }

    /// The capability projectiles use: flies over water and chasms, stopped by walls.
    pub fn projectile() -> Self {
        Self {
            can_walk: false,
            can_swim: false,
            can_fly: true,
            can_phase: false,
            speed: 1.0,
        }
    }

    /// Same capability with a different speed.
    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = speed;
        self
    }
}

/// Movement cost lookup.
pub struct MovementCost;

impl MovementCost {
    /// Base cost of entering `terrain`, or `None` when `capability` cannot enter it.
    pub fn for_terrain(terrain: TerrainType, capability: &MovementCapability) -> Option<f64> {
        use TerrainType::*;

        if capability.can_phase {
            return Some(1.0);
        }
        if capability.can_fly {
            return match terrain {
                Wall | Mountain => None,
                Forest => Some(1.5),
                _ => Some(1.0),
            };
        }
        match terrain {
            Road if capability.can_walk => Some(0.8),
            Grass | Sand if capability.can_walk => Some(1.0),
            Forest if capability.can_walk => Some(2.0),
            Swamp if capability.can_walk => Some(3.0),
            ShallowWater if capability.can_walk || capability.can_swim => Some(2.0),
            DeepWater if capability.can_swim => Some(1.5),
            _ => None,
        }
    }

    /// Cost adjusted for the mover's speed.
    pub fn effective(terrain: TerrainType, capability: &MovementCapability) -> Option<f64> {
        Self::for_terrain(terrain, capability).map(|cost| cost / capability.speed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walls_stop_everything_but_ghosts() {
        assert!(!TerrainType::Wall.can_pass(&MovementCapability::walker()));
        assert!(!TerrainType::Wall.can_pass(&MovementCapability::flyer()));
        assert!(!TerrainType::Wall.can_pass(&MovementCapability::projectile()));
        assert!(TerrainType::Wall.can_pass(&MovementCapability::ghost()));
    }

    #[test]
    fn deep_water_needs_swimming_or_flight() {
        assert!(!TerrainType::DeepWater.can_pass(&MovementCapability::walker()));
        assert!(TerrainType::DeepWater.can_pass(&MovementCapability::swimmer()));
        assert!(TerrainType::DeepWater.can_pass(&MovementCapability::projectile()));
    }

    #[test]
    fn speed_scales_cost() {
        let fast = MovementCapability::walker().with_speed(2.0);
        assert_eq!(MovementCost::effective(TerrainType::Grass, &fast), Some(0.5));
    }

    #[test]
    fn non_positive_speed_rejected() {
        assert!(MovementCapability::new(true, false, false, false, 0.0).is_err());
        assert!(MovementCapability::new(true, false, false, false, f64::NAN).is_err());
    }

    #[test]
    fn sight_blocking_terrain() {
        assert!(TerrainType::Wall.is_sight_blocking());
        assert!(TerrainType::Forest.is_sight_blocking());
        assert!(!TerrainType::DeepWater.is_sight_blocking());
    }
}
