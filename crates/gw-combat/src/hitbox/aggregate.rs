use std::collections::BTreeSet;

use gw_core::{
    BaseStats, Coordinate, HitBoxEndReason, HitBoxId, MovementCapability, SpotId, WorldEventKind,
    WorldObjectId, WorldTick,
};
use serde::{Deserialize, Serialize};

use super::shape::HitBoxShape;
use crate::error::{CombatError, CombatResult};

/// What happens when a hit box touches impassable terrain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ObstacleCollisionPolicy {
    /// Stop at the first obstacle.
    #[default]
    Deactivate,
    /// Ignore obstacles.
    PassThrough,
}

/// What happens when a hit box records a hit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TargetCollisionPolicy {
    /// Stop after the first hit.
    Deactivate,
    /// Keep going and hit every target once.
    #[default]
    KeepActive,
}

/// Cells per tick along each axis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HitBoxVelocity {
    /// X per tick.
    pub dx: f64,
    /// Y per tick.
    pub dy: f64,
    /// Z per tick.
    pub dz: f64,
}

impl HitBoxVelocity {
    /// A velocity; every component must be finite.
    pub fn new(dx: f64, dy: f64, dz: f64) -> CombatResult<Self> {
        if !(dx.is_finite() && dy.is_finite() && dz.is_finite()) {
            return Err(CombatError::InvalidHitBox(format!(
                "velocity ({dx}, {dy}, {dz}) is not finite"
            )));
        }
        Ok(Self { dx, dy, dz })
    }

    /// Standing still.
    pub const fn zero() -> Self {
        Self {
            dx: 0.0,
            dy: 0.0,
            dz: 0.0,
        }
    }

    /// Largest absolute component; drives substep selection.
    pub fn magnitude(&self) -> f64 {
        self.dx.abs().max(self.dy.abs()).max(self.dz.abs())
    }

    /// Whether the hit box moves at all.
    pub fn is_stationary(&self) -> bool {
        self.magnitude() == 0.0
    }
}

/// Sub-cell position of a moving hit box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PrecisePosition {
    /// X.
    pub x: f64,
    /// Y.
    pub y: f64,
    /// Z.
    pub z: f64,
}

impl From<Coordinate> for PrecisePosition {
    fn from(c: Coordinate) -> Self {
        Self {
            x: f64::from(c.x()),
            y: f64::from(c.y()),
            z: f64::from(c.z()),
        }
    }
}

impl PrecisePosition {
    /// The grid cell containing the position, or `None` off the grid.
    pub fn to_coordinate(self) -> Option<Coordinate> {
        Coordinate::new(
            self.x.round() as i32,
            self.y.round() as i32,
            self.z.round() as i32,
        )
        .ok()
    }
}

/// Why a hit box was cut short by the collision budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Deferral {
    /// Checked part of its cells before the budget ran out.
    Interrupted,
    /// Got no checks at all, starting at `since`.
    Starved {
        /// First tick without checks.
        since: WorldTick,
    },
}

/// Everything needed to create a hit box.
#[derive(Debug, Clone, PartialEq)]
pub struct HitBoxSpawn {
    /// Identity.
    pub id: HitBoxId,
    /// Map the hit box lives on.
    pub spot_id: SpotId,
    /// Attacker; never hit by its own hit box.
    pub owner_id: WorldObjectId,
    /// Covered cells.
    pub shape: HitBoxShape,
    /// Spawn cell.
    pub origin: Coordinate,
    /// Movement per tick.
    pub velocity: HitBoxVelocity,
    /// Creation tick.
    pub start_tick: WorldTick,
    /// First tick with collisions.
    pub activation_tick: WorldTick,
    /// Lifetime in ticks, counted from `start_tick`.
    pub duration: u64,
    /// Damage scaling.
    pub power_multiplier: f64,
    /// Attacker stats at cast time.
    pub attacker_stats: Option<BaseStats>,
    /// Obstacle behaviour.
    pub obstacle_policy: ObstacleCollisionPolicy,
    /// Target behaviour.
    pub target_policy: TargetCollisionPolicy,
    /// Which terrain counts as an obstacle.
    pub capability: MovementCapability,
    /// Clear the hit registry every N ticks after activation.
    pub rehit_interval: Option<u64>,
}

/// A moving or stationary attack volume.
///
/// Invariants: `duration > 0`, `activation_tick >= start_tick`, non-empty
/// shape. Each target is hit at most once per activation window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HitBoxAggregate {
    id: HitBoxId,
    spot_id: SpotId,
    owner_id: WorldObjectId,
    shape: HitBoxShape,
    position: PrecisePosition,
    coordinate: Coordinate,
    velocity: HitBoxVelocity,
    start_tick: WorldTick,
    activation_tick: WorldTick,
    duration: u64,
    power_multiplier: f64,
    attacker_stats: Option<BaseStats>,
    obstacle_policy: ObstacleCollisionPolicy,
    target_policy: TargetCollisionPolicy,
    capability: MovementCapability,
    rehit_interval: Option<u64>,
    hit_registry: BTreeSet<WorldObjectId>,
    registry_window: u64,
    is_active: bool,
    deferral: Option<Deferral>,
    #[serde(skip)]
    events: Vec<WorldEventKind>,
}

impl HitBoxAggregate {
    /// Validate and create a hit box; raises `HitBoxCreated`.
    pub fn create(spawn: HitBoxSpawn) -> CombatResult<Self> {
        if spawn.duration == 0 {
            return Err(CombatError::InvalidHitBox("duration must be positive".into()));
        }
        if spawn.activation_tick < spawn.start_tick {
            return Err(CombatError::InvalidHitBox(format!(
                "activation {} precedes start {}",
                spawn.activation_tick, spawn.start_tick
            )));
        }
        if !(spawn.power_multiplier.is_finite() && spawn.power_multiplier >= 0.0) {
            return Err(CombatError::InvalidHitBox(format!(
                "power multiplier {} must be a non-negative number",
                spawn.power_multiplier
            )));
        }
        if spawn.rehit_interval == Some(0) {
            return Err(CombatError::InvalidHitBox("rehit interval must be positive".into()));
        }
        HitBoxVelocity::new(spawn.velocity.dx, spawn.velocity.dy, spawn.velocity.dz)?;

        let created = WorldEventKind::HitBoxCreated {
            spot_id: spawn.spot_id,
            hit_box_id: spawn.id,
            owner_id: spawn.owner_id,
            coordinate: spawn.origin,
        };
        Ok(Self {
            id: spawn.id,
            spot_id: spawn.spot_id,
            owner_id: spawn.owner_id,
            shape: spawn.shape,
            position: spawn.origin.into(),
            coordinate: spawn.origin,
            velocity: spawn.velocity,
            start_tick: spawn.start_tick,
            activation_tick: spawn.activation_tick,
            duration: spawn.duration,
            power_multiplier: spawn.power_multiplier,
            attacker_stats: spawn.attacker_stats,
            obstacle_policy: spawn.obstacle_policy,
            target_policy: spawn.target_policy,
            capability: spawn.capability,
            rehit_interval: spawn.rehit_interval,
            hit_registry: BTreeSet::new(),
            registry_window: 0,
            is_active: true,
            deferral: None,
            events: vec![created],
        })
    }

    /// Identity.
    pub fn id(&self) -> HitBoxId {
        self.id
    }

    /// Map the hit box lives on.
    pub fn spot_id(&self) -> SpotId {
        self.spot_id
    }

    /// Attacker.
    pub fn owner_id(&self) -> WorldObjectId {
        self.owner_id
    }

    /// Covered cells.
    pub fn shape(&self) -> &HitBoxShape {
        &self.shape
    }

    /// Current grid cell.
    pub fn coordinate(&self) -> Coordinate {
        self.coordinate
    }

    /// Current sub-cell position.
    pub fn position(&self) -> PrecisePosition {
        self.position
    }

    /// Movement per tick.
    pub fn velocity(&self) -> HitBoxVelocity {
        self.velocity
    }

    /// Creation tick.
    pub fn start_tick(&self) -> WorldTick {
        self.start_tick
    }

    /// First live tick.
    pub fn activation_tick(&self) -> WorldTick {
        self.activation_tick
    }

    /// Lifetime in ticks.
    pub fn duration(&self) -> u64 {
        self.duration
    }

    /// Damage scaling.
    pub fn power_multiplier(&self) -> f64 {
        self.power_multiplier
    }

    /// Attacker stats snapshot.
    pub fn attacker_stats(&self) -> Option<BaseStats> {
        self.attacker_stats
    }

    /// Obstacle behaviour.
    pub fn obstacle_policy(&self) -> ObstacleCollisionPolicy {
        self.obstacle_policy
    }

    /// Target behaviour.
    pub fn target_policy(&self) -> TargetCollisionPolicy {
        self.target_policy
    }

    /// Capability used for obstacle tests.
    pub fn capability(&self) -> &MovementCapability {
        &self.capability
    }

    /// Whether the hit box still takes part in the simulation.
    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// Whether collisions are checked at `current_tick`.
    pub fn is_activated(&self, current_tick: WorldTick) -> bool {
        self.is_active && current_tick >= self.activation_tick
    }

    /// Whether the lifetime has elapsed at `current_tick`.
    pub fn is_expired(&self, current_tick: WorldTick) -> bool {
        current_tick.since(self.start_tick) >= self.duration
    }

    /// Whether processing stopped early last tick for lack of collision budget.
    pub fn is_deferred(&self) -> bool {
        self.deferral.is_some()
    }

    /// How the last tick fell short of the collision budget, if it did.
    pub fn deferral(&self) -> Option<Deferral> {
        self.deferral
    }

    /// Processing order under a shared budget: boxes starved longest first,
    /// then interrupted ones, then the rest, each by id.
    pub fn schedule_key(&self) -> (u8, u64, HitBoxId) {
        match self.deferral {
            Some(Deferral::Starved { since }) => (0, since.value(), self.id),
            Some(Deferral::Interrupted) => (1, 0, self.id),
            None => (2, 0, self.id),
        }
    }

    /// Targets hit in the current activation window.
    pub fn hit_targets(&self) -> impl Iterator<Item = WorldObjectId> + '_ {
        self.hit_registry.iter().copied()
    }

    /// Whether `target` was hit in the current activation window.
    pub fn has_hit(&self, target: WorldObjectId) -> bool {
        self.hit_registry.contains(&target)
    }

    /// Deactivate once the lifetime has elapsed. Returns true if the hit box is now inactive.
    pub fn check_expiry(&mut self, current_tick: WorldTick) -> bool {
        if self.is_active && self.is_expired(current_tick) {
            self.deactivate(HitBoxEndReason::Expired);
        }
        !self.is_active
    }

    /// Move by `fraction` of a tick's velocity. Returns false, deactivating
    /// the hit box, when it leaves the grid.
    pub fn advance(&mut self, fraction: f64) -> CombatResult<bool> {
        if !self.is_active {
            return Err(CombatError::HitBoxInactive(self.id));
        }
        self.position.x += self.velocity.dx * fraction;
        self.position.y += self.velocity.dy * fraction;
        self.position.z += self.velocity.dz * fraction;
        match self.position.to_coordinate() {
            Some(c) => {
                self.coordinate = c;
                Ok(true)
            }
            None => {
                self.deactivate(HitBoxEndReason::OutOfBounds);
                Ok(false)
            }
        }
    }

    /// Cells covered at the current position.
    pub fn covered_coordinates(&self) -> Vec<Coordinate> {
        self.shape.to_absolute(self.coordinate)
    }

    /// Start a new activation window when the rehit interval has elapsed.
    pub fn refresh_registry(&mut self, current_tick: WorldTick) {
        let Some(interval) = self.rehit_interval else {
            return;
        };
        if current_tick < self.activation_tick {
            return;
        }
        let window = current_tick.since(self.activation_tick) / interval;
        if window != self.registry_window {
            self.registry_window = window;
            self.hit_registry.clear();
        }
    }

    /// Record a hit on `target`. Returns false when it was already hit in this window.
    pub fn record_hit(&mut self, target: WorldObjectId, at: Coordinate) -> CombatResult<bool> {
        if !self.is_active {
            return Err(CombatError::HitBoxInactive(self.id));
        }
        if !self.hit_registry.insert(target) {
            return Ok(false);
        }
        self.events.push(WorldEventKind::HitBoxHitRecorded {
            spot_id: self.spot_id,
            hit_box_id: self.id,
            owner_id: self.owner_id,
            target_id: target,
            hit_coordinate: at,
            power_multiplier: self.power_multiplier,
            attacker_stats: self.attacker_stats,
        });
        Ok(true)
    }

    /// Record that an obstacle stopped the hit box.
    pub fn record_obstacle(&mut self, at: Coordinate) {
        self.events.push(WorldEventKind::HitBoxObstacleHit {
            spot_id: self.spot_id,
            hit_box_id: self.id,
            coordinate: at,
        });
    }

    /// Stop the hit box. Idempotent.
    pub fn deactivate(&mut self, reason: HitBoxEndReason) {
        if !self.is_active {
            return;
        }
        self.is_active = false;
        self.deferral = None;
        self.events.push(WorldEventKind::HitBoxDeactivated {
            spot_id: self.spot_id,
            hit_box_id: self.id,
            reason,
        });
    }

    /// The budget ran out while this hit box was being checked.
    pub fn interrupt(&mut self) {
        self.deferral = Some(Deferral::Interrupted);
    }

    /// The budget was gone before this hit box got any checks.
    /// Keeps the tick of the first missed turn.
    pub fn starve(&mut self, current_tick: WorldTick) {
        if !matches!(self.deferral, Some(Deferral::Starved { .. })) {
            self.deferral = Some(Deferral::Starved { since: current_tick });
        }
    }

    /// Clear any deferral before processing.
    pub fn resume(&mut self) {
        self.deferral = None;
    }

    /// Events raised since the last flush.
    pub fn get_events(&self) -> &[WorldEventKind] {
        &self.events
    }

    /// Hand over pending events.
    pub fn take_events(&mut self) -> Vec<WorldEventKind> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use proptest::prelude::*;

    use super::*;

    pub(crate) fn spawn(start: u64, activation: u64, duration: u64) -> HitBoxSpawn {
        HitBoxSpawn {
            id: HitBoxId::new(1).unwrap(),
            spot_id: SpotId::new(1).unwrap(),
            owner_id: WorldObjectId::new(1).unwrap(),
            shape: HitBoxShape::single_cell(),
            origin: Coordinate::planar(2, 2).unwrap(),
            velocity: HitBoxVelocity::zero(),
            start_tick: WorldTick(start),
            activation_tick: WorldTick(activation),
            duration,
            power_multiplier: 1.0,
            attacker_stats: None,
            obstacle_policy: ObstacleCollisionPolicy::Deactivate,
            target_policy: TargetCollisionPolicy::KeepActive,
            capability: MovementCapability::projectile(),
            rehit_interval: None,
        }
    }

    #[test]
    fn construction_validation() {
        assert!(HitBoxAggregate::create(spawn(5, 5, 0)).is_err());
        assert!(HitBoxAggregate::create(spawn(5, 4, 3)).is_err());
        let mut bad = spawn(5, 5, 3);
        bad.rehit_interval = Some(0);
        assert!(HitBoxAggregate::create(bad).is_err());
        let mut bad = spawn(5, 5, 3);
        bad.velocity.dx = f64::NAN;
        assert!(HitBoxAggregate::create(bad).is_err());
        let hb = HitBoxAggregate::create(spawn(5, 5, 3)).unwrap();
        assert!(matches!(hb.get_events(), [WorldEventKind::HitBoxCreated { .. }]));
    }

    #[test]
    fn hit_registry_dedups() {
        let mut hb = HitBoxAggregate::create(spawn(0, 0, 5)).unwrap();
        let target = WorldObjectId::new(2).unwrap();
        let at = hb.coordinate();
        assert!(hb.record_hit(target, at).unwrap());
        assert!(!hb.record_hit(target, at).unwrap());
        assert_eq!(hb.take_events().len(), 2);
    }

    #[test]
    fn rehit_interval_opens_new_window() {
        let mut s = spawn(0, 0, 10);
        s.rehit_interval = Some(3);
        let mut hb = HitBoxAggregate::create(s).unwrap();
        let target = WorldObjectId::new(2).unwrap();
        let at = hb.coordinate();
        hb.refresh_registry(WorldTick(1));
        assert!(hb.record_hit(target, at).unwrap());
        hb.refresh_registry(WorldTick(2));
        assert!(hb.has_hit(target));
        hb.refresh_registry(WorldTick(3));
        assert!(!hb.has_hit(target));
    }

    #[test]
    fn advancing_off_grid_deactivates() {
        let mut s = spawn(0, 0, 10);
        s.origin = Coordinate::planar(0, 0).unwrap();
        s.velocity = HitBoxVelocity::new(-1.0, 0.0, 0.0).unwrap();
        let mut hb = HitBoxAggregate::create(s).unwrap();
        assert!(!hb.advance(1.0).unwrap());
        assert!(!hb.is_active());
        assert!(matches!(hb.advance(1.0), Err(CombatError::HitBoxInactive(_))));
    }

    #[test]
    fn deactivate_is_idempotent() {
        let mut hb = HitBoxAggregate::create(spawn(0, 0, 1)).unwrap();
        hb.take_events();
        hb.deactivate(HitBoxEndReason::Target);
        hb.deactivate(HitBoxEndReason::Expired);
        assert_eq!(hb.take_events().len(), 1);
    }

    proptest! {
        #[test]
        fn activation_and_expiry_windows(
            start in 0u64..50,
            delay in 0u64..10,
            duration in 1u64..20,
            probe in 0u64..100,
        ) {
            let mut hb = HitBoxAggregate::create(spawn(start, start + delay, duration)).unwrap();
            let tick = WorldTick(probe);
            if probe < start + delay {
                prop_assert!(!hb.is_activated(tick));
            }
            hb.check_expiry(tick);
            if probe.saturating_sub(start) >= duration {
                prop_assert!(!hb.is_active());
            }
        }
    }
}
