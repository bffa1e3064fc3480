//! Hit box movement and collision resolution.
//!
//! Every tick each active hit box is advanced in velocity-dependent substeps.
//! Once live, each covered cell is tested against terrain and then against the
//! actors standing on it. One budget caps the tile and object checks of a
//! whole tick, across every map. Hit boxes the budget cannot cover still move
//! at their velocity, are flagged deferred, and are scheduled ahead of the
//! others next tick, the longest-starved first.

use gw_core::{HitBoxEndReason, SpotId, WorldTick};
use gw_map::PhysicalMapAggregate;
use tracing::{debug, trace};

use super::aggregate::{HitBoxAggregate, ObstacleCollisionPolicy, TargetCollisionPolicy};
use super::config::HitBoxConfigService;
use crate::error::CombatResult;

/// Remaining collision checks for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollisionBudget {
    limit: u32,
    used: u32,
}

impl CollisionBudget {
    /// A fresh budget.
    pub fn new(limit: u32) -> Self {
        Self { limit, used: 0 }
    }

    /// Spend one check. Returns false when nothing is left.
    pub fn try_consume(&mut self) -> bool {
        if self.used >= self.limit {
            return false;
        }
        self.used += 1;
        true
    }

    /// Checks spent so far.
    pub fn used(&self) -> u32 {
        self.used
    }

    /// Whether the budget is spent.
    pub fn is_exhausted(&self) -> bool {
        self.used >= self.limit
    }
}

/// How processing one hit box ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionOutcome {
    /// All substeps ran and the hit box is still active.
    Completed,
    /// The hit box ended during processing (or was already inactive).
    Deactivated(Option<HitBoxEndReason>),
    /// The budget ran out; the hit box is deferred to the next tick.
    ChecksExhausted,
}

/// Summary of one call to [`HitBoxCollisionDomainService::process_world`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollisionReport {
    /// Hit boxes that ran to completion and stay active.
    pub completed: usize,
    /// Hit boxes that ended this tick.
    pub deactivated: usize,
    /// Hit boxes pushed to the next tick.
    pub deferred: usize,
    /// Tile and object checks spent.
    pub checks_used: u32,
}

/// Moves hit boxes and resolves their collisions.
#[derive(Debug, Clone)]
pub struct HitBoxCollisionDomainService {
    config: HitBoxConfigService,
}

impl HitBoxCollisionDomainService {
    /// A service using `config` for substeps and budget.
    pub fn new(config: HitBoxConfigService) -> Self {
        Self { config }
    }

    /// The substep and budget configuration.
    pub fn config(&self) -> &HitBoxConfigService {
        &self.config
    }

    /// Advance and collide one hit box for `current_tick`, spending from `budget`.
    pub fn process(
        &self,
        hit_box: &mut HitBoxAggregate,
        map: &PhysicalMapAggregate,
        current_tick: WorldTick,
        budget: &mut CollisionBudget,
    ) -> CombatResult<CollisionOutcome> {
        if !hit_box.is_active() {
            return Ok(CollisionOutcome::Deactivated(None));
        }
        if hit_box.check_expiry(current_tick) {
            return Ok(CollisionOutcome::Deactivated(Some(HitBoxEndReason::Expired)));
        }
        hit_box.resume();

        let substeps = self.config.get_substeps_for_hit_box(hit_box);
        let fraction = 1.0 / f64::from(substeps);
        for step in 0..substeps {
            if !hit_box.advance(fraction)? {
                return Ok(CollisionOutcome::Deactivated(Some(HitBoxEndReason::OutOfBounds)));
            }
            if !hit_box.is_activated(current_tick) {
                continue;
            }
            hit_box.refresh_registry(current_tick);
            let remaining = f64::from(substeps - step - 1) * fraction;

            for coord in hit_box.covered_coordinates() {
                if !budget.try_consume() {
                    return Self::interrupt(hit_box, remaining);
                }
                let passable = map
                    .tile(coord)
                    .is_some_and(|t| t.is_passable(hit_box.capability()));
                if !passable && hit_box.obstacle_policy() == ObstacleCollisionPolicy::Deactivate {
                    hit_box.record_obstacle(coord);
                    hit_box.deactivate(HitBoxEndReason::Obstacle);
                    return Ok(CollisionOutcome::Deactivated(Some(HitBoxEndReason::Obstacle)));
                }

                for object in map.objects_in_range(coord, 0) {
                    if object.id == hit_box.owner_id() || !object.component.is_actor() {
                        continue;
                    }
                    if !budget.try_consume() {
                        return Self::interrupt(hit_box, remaining);
                    }
                    if hit_box.record_hit(object.id, coord)? {
                        trace!(hit_box = %hit_box.id(), target = %object.id, %coord, "hit recorded");
                        if hit_box.target_policy() == TargetCollisionPolicy::Deactivate {
                            hit_box.deactivate(HitBoxEndReason::Target);
                            return Ok(CollisionOutcome::Deactivated(Some(HitBoxEndReason::Target)));
                        }
                    }
                }
            }
        }
        Ok(CollisionOutcome::Completed)
    }

    /// Finish the tick's movement without checks once the budget is gone.
    fn interrupt(hit_box: &mut HitBoxAggregate, remaining: f64) -> CombatResult<CollisionOutcome> {
        hit_box.interrupt();
        Self::coast(hit_box, remaining)
    }

    fn coast(hit_box: &mut HitBoxAggregate, fraction: f64) -> CombatResult<CollisionOutcome> {
        if fraction > 0.0 && !hit_box.advance(fraction)? {
            return Ok(CollisionOutcome::Deactivated(Some(HitBoxEndReason::OutOfBounds)));
        }
        Ok(CollisionOutcome::ChecksExhausted)
    }

    /// A fresh budget for one tick.
    pub fn budget(&self) -> CollisionBudget {
        CollisionBudget::new(self.config.max_collision_checks_per_tick())
    }

    /// Process the hit boxes of a single map, spending from `budget`.
    pub fn process_all(
        &self,
        hit_boxes: &mut [HitBoxAggregate],
        map: &PhysicalMapAggregate,
        current_tick: WorldTick,
        budget: &mut CollisionBudget,
    ) -> CombatResult<CollisionReport> {
        let spot_id = map.spot_id();
        self.process_world(hit_boxes, |spot| (spot == spot_id).then_some(map), current_tick, budget)
    }

    /// Process hit boxes from any number of maps for `current_tick`, all
    /// spending from the one `budget`. Hit boxes whose map `map_for` does not
    /// know are left untouched.
    pub fn process_world<'m>(
        &self,
        hit_boxes: &mut [HitBoxAggregate],
        map_for: impl Fn(SpotId) -> Option<&'m PhysicalMapAggregate>,
        current_tick: WorldTick,
        budget: &mut CollisionBudget,
    ) -> CombatResult<CollisionReport> {
        hit_boxes.sort_by_key(HitBoxAggregate::schedule_key);
        let used_before = budget.used();
        let mut report = CollisionReport::default();

        for hit_box in hit_boxes.iter_mut() {
            if !hit_box.is_active() {
                continue;
            }
            let Some(map) = map_for(hit_box.spot_id()) else {
                continue;
            };
            if budget.is_exhausted() {
                // Lifetime and movement go on while starved.
                if hit_box.check_expiry(current_tick) {
                    report.deactivated += 1;
                    continue;
                }
                hit_box.starve(current_tick);
                match Self::coast(hit_box, 1.0)? {
                    CollisionOutcome::Deactivated(_) => report.deactivated += 1,
                    _ => report.deferred += 1,
                }
                continue;
            }
            match self.process(hit_box, map, current_tick, budget)? {
                CollisionOutcome::Completed => report.completed += 1,
                CollisionOutcome::Deactivated(_) => report.deactivated += 1,
                CollisionOutcome::ChecksExhausted => report.deferred += 1,
            }
        }
        report.checks_used = budget.used() - used_before;
        if report.deferred > 0 {
            debug!(
                tick = current_tick.value(),
                deferred = report.deferred,
                "collision budget exhausted"
            );
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use gw_core::{
        Coordinate, HitBoxId, MovementCapability, Race, SpotId, WorldEventKind, WorldObjectId,
    };
    use gw_map::{ActorComponent, ObjectComponent, ObjectType, WorldObject};
    use proptest::prelude::*;

    use super::*;
    use crate::hitbox::aggregate::{Deferral, HitBoxSpawn, HitBoxVelocity};
    use crate::hitbox::aggregate::tests::spawn;
    use crate::hitbox::config::HitBoxConfig;
    use crate::hitbox::shape::HitBoxShape;

    fn at(x: i32, y: i32) -> Coordinate {
        Coordinate::planar(x, y).unwrap()
    }

    fn oid(n: u64) -> WorldObjectId {
        WorldObjectId::new(n).unwrap()
    }

    fn service(max_checks: u32) -> HitBoxCollisionDomainService {
        HitBoxCollisionDomainService::new(
            HitBoxConfigService::new(HitBoxConfig::default().with_max_checks(max_checks)).unwrap(),
        )
    }

    fn dummy(id: u64, c: Coordinate) -> WorldObject {
        WorldObject::new(
            oid(id),
            c,
            ObjectType::Npc,
            true,
            ObjectComponent::Actor(ActorComponent::new(Race::Human, MovementCapability::walker())),
        )
    }

    fn field() -> PhysicalMapAggregate {
        field_on(1)
    }

    fn field_on(spot: u64) -> PhysicalMapAggregate {
        PhysicalMapAggregate::from_ascii(
            SpotId::new(spot).unwrap(),
            &[
                "......", //
                "......",
                "......",
                "....#.",
            ],
        )
        .unwrap()
    }

    fn hits(hb: &mut HitBoxAggregate) -> usize {
        hb.take_events()
            .iter()
            .filter(|e| matches!(e, WorldEventKind::HitBoxHitRecorded { .. }))
            .count()
    }

    #[test]
    fn stationary_single_cell_hits_once() {
        let mut map = field();
        map.add_object(dummy(2, at(2, 2))).unwrap();
        let mut hb = HitBoxAggregate::create(spawn(10, 10, 5)).unwrap();
        let svc = service(100);

        let mut total = 0;
        for t in 10..20 {
            let mut budget = CollisionBudget::new(100);
            svc.process(&mut hb, &map, WorldTick(t), &mut budget).unwrap();
            total += hits(&mut hb);
        }
        assert_eq!(total, 1);
        assert!(!hb.is_active());
    }

    #[test]
    fn owner_is_never_hit() {
        let mut map = field();
        map.add_object(dummy(1, at(2, 2))).unwrap();
        let mut hb = HitBoxAggregate::create(spawn(0, 0, 5)).unwrap();
        let mut budget = CollisionBudget::new(100);
        service(100).process(&mut hb, &map, WorldTick(0), &mut budget).unwrap();
        assert_eq!(hits(&mut hb), 0);
    }

    #[test]
    fn not_live_before_activation() {
        let mut map = field();
        map.add_object(dummy(2, at(2, 2))).unwrap();
        let mut hb = HitBoxAggregate::create(spawn(0, 3, 10)).unwrap();
        let svc = service(100);
        for t in 0..3 {
            let mut budget = CollisionBudget::new(100);
            svc.process(&mut hb, &map, WorldTick(t), &mut budget).unwrap();
            assert_eq!(budget.used(), 0);
        }
        let mut budget = CollisionBudget::new(100);
        svc.process(&mut hb, &map, WorldTick(3), &mut budget).unwrap();
        assert_eq!(hits(&mut hb), 1);
    }

    #[test]
    fn projectile_stops_at_wall() {
        let map = field();
        let mut s = spawn(0, 0, 10);
        s.origin = at(1, 3);
        s.velocity = HitBoxVelocity::new(1.0, 0.0, 0.0).unwrap();
        let mut hb = HitBoxAggregate::create(s).unwrap();
        let svc = service(100);
        let mut outcome = CollisionOutcome::Completed;
        for t in 0..5 {
            let mut budget = CollisionBudget::new(100);
            outcome = svc.process(&mut hb, &map, WorldTick(t), &mut budget).unwrap();
            if outcome != CollisionOutcome::Completed {
                break;
            }
        }
        assert_eq!(outcome, CollisionOutcome::Deactivated(Some(HitBoxEndReason::Obstacle)));
        assert_eq!(hb.coordinate(), at(4, 3));
    }

    #[test]
    fn pass_through_ignores_walls() {
        let map = field();
        let mut s = spawn(0, 0, 10);
        s.origin = at(3, 3);
        s.velocity = HitBoxVelocity::new(1.0, 0.0, 0.0).unwrap();
        s.obstacle_policy = ObstacleCollisionPolicy::PassThrough;
        let mut hb = HitBoxAggregate::create(s).unwrap();
        let mut budget = CollisionBudget::new(100);
        let outcome = service(100).process(&mut hb, &map, WorldTick(0), &mut budget).unwrap();
        assert_eq!(outcome, CollisionOutcome::Completed);
        assert!(hb.is_active());
    }

    #[test]
    fn off_map_cell_is_an_obstacle() {
        let map = field();
        let mut s = spawn(0, 0, 10);
        s.origin = at(5, 0);
        s.shape = HitBoxShape::line(2, gw_core::Direction::East).unwrap();
        let mut hb = HitBoxAggregate::create(s).unwrap();
        let mut budget = CollisionBudget::new(100);
        let outcome = service(100).process(&mut hb, &map, WorldTick(0), &mut budget).unwrap();
        assert_eq!(outcome, CollisionOutcome::Deactivated(Some(HitBoxEndReason::Obstacle)));
    }

    #[test]
    fn deactivate_on_target_stops_after_first_hit() {
        let mut map = field();
        map.add_object(dummy(2, at(1, 0))).unwrap();
        map.add_object(dummy(3, at(2, 0))).unwrap();
        let mut s = spawn(0, 0, 10);
        s.origin = at(0, 0);
        s.shape = HitBoxShape::line(3, gw_core::Direction::East).unwrap();
        s.target_policy = TargetCollisionPolicy::Deactivate;
        let mut hb = HitBoxAggregate::create(s).unwrap();
        let mut budget = CollisionBudget::new(100);
        let outcome = service(100).process(&mut hb, &map, WorldTick(0), &mut budget).unwrap();
        assert_eq!(outcome, CollisionOutcome::Deactivated(Some(HitBoxEndReason::Target)));
        assert_eq!(hits(&mut hb), 1);
    }

    #[test]
    fn exhausted_budget_defers_and_resumes_first() {
        let mut map = field();
        map.add_object(dummy(5, at(0, 0))).unwrap();
        let mut boxes = Vec::new();
        for id in 1..=3u64 {
            let mut s = spawn(0, 0, 10);
            s.id = HitBoxId::new(id).unwrap();
            s.owner_id = oid(9);
            s.origin = at(0, 0);
            s.shape = HitBoxShape::square(1);
            boxes.push(HitBoxAggregate::create(s).unwrap());
        }
        let svc = service(6);
        let mut budget = svc.budget();
        let report = svc.process_all(&mut boxes, &map, WorldTick(0), &mut budget).unwrap();
        assert_eq!(report.checks_used, 6);
        assert_eq!(report.deferred, 2);
        assert!(boxes.iter().filter(|b| b.is_deferred()).count() == 2);
        assert_eq!(boxes[1].deferral(), Some(Deferral::Interrupted));
        assert_eq!(boxes[2].deferral(), Some(Deferral::Starved { since: WorldTick(0) }));

        let mut budget = svc.budget();
        let report = svc.process_all(&mut boxes, &map, WorldTick(1), &mut budget).unwrap();
        assert_eq!(boxes[0].id(), HitBoxId::new(3).unwrap());
        assert_eq!(boxes[1].id(), HitBoxId::new(2).unwrap());
        assert!(report.checks_used <= 6);
    }

    #[test]
    fn budget_hog_cannot_starve_a_moving_hit_box() {
        let mut map = field();
        map.add_object(dummy(50, at(4, 0))).unwrap();

        let mut hog = spawn(0, 0, 20);
        hog.owner_id = oid(9);
        hog.origin = at(2, 1);
        hog.shape = HitBoxShape::square(2);
        hog.obstacle_policy = ObstacleCollisionPolicy::PassThrough;

        let mut arrow = spawn(0, 0, 20);
        arrow.id = HitBoxId::new(2).unwrap();
        arrow.owner_id = oid(9);
        arrow.origin = at(0, 0);
        arrow.velocity = HitBoxVelocity::new(1.0, 0.0, 0.0).unwrap();
        arrow.obstacle_policy = ObstacleCollisionPolicy::PassThrough;

        let mut boxes = vec![
            HitBoxAggregate::create(hog).unwrap(),
            HitBoxAggregate::create(arrow).unwrap(),
        ];
        let svc = service(6);
        let mut starved_in_a_row = 0;
        for t in 0..4 {
            let mut budget = svc.budget();
            svc.process_all(&mut boxes, &map, WorldTick(t), &mut budget).unwrap();
            let arrow = boxes.iter().find(|b| b.id() == HitBoxId::new(2).unwrap()).unwrap();
            match arrow.deferral() {
                Some(Deferral::Starved { since }) if since < WorldTick(t) => starved_in_a_row += 1,
                _ => {}
            }
        }
        assert_eq!(starved_in_a_row, 0);

        let arrow = boxes.iter().find(|b| b.id() == HitBoxId::new(2).unwrap()).unwrap();
        assert_eq!(arrow.coordinate(), at(4, 0));
        assert!(arrow.is_active());
        assert!(arrow.has_hit(oid(50)));
    }

    #[test]
    fn interrupted_hit_box_keeps_its_speed() {
        let map = field();
        let mut s = spawn(0, 0, 10);
        s.origin = at(0, 0);
        s.shape = HitBoxShape::square(1);
        s.velocity = HitBoxVelocity::new(2.0, 0.0, 0.0).unwrap();
        s.obstacle_policy = ObstacleCollisionPolicy::PassThrough;
        let mut hb = HitBoxAggregate::create(s).unwrap();
        let mut budget = CollisionBudget::new(1);
        let outcome = service(1).process(&mut hb, &map, WorldTick(0), &mut budget).unwrap();
        assert_eq!(outcome, CollisionOutcome::ChecksExhausted);
        assert_eq!(hb.deferral(), Some(Deferral::Interrupted));
        assert_eq!(hb.coordinate(), at(2, 0));
    }

    #[test]
    fn one_budget_spans_every_map() {
        let mut maps = BTreeMap::new();
        let mut boxes = Vec::new();
        for spot in 1..=2u64 {
            let mut map = field_on(spot);
            map.add_object(dummy(10 + spot, at(2, 2))).unwrap();
            maps.insert(SpotId::new(spot).unwrap(), map);
            let mut s = spawn(0, 0, 5);
            s.id = HitBoxId::new(spot).unwrap();
            s.spot_id = SpotId::new(spot).unwrap();
            boxes.push(HitBoxAggregate::create(s).unwrap());
        }
        let svc = service(2);

        let mut budget = svc.budget();
        let report = svc.process_world(&mut boxes, |s| maps.get(&s), WorldTick(0), &mut budget).unwrap();
        assert_eq!(budget.used(), 2);
        assert_eq!((report.completed, report.deferred), (1, 1));
        let hit_count: usize = boxes.iter_mut().map(hits).sum();
        assert_eq!(hit_count, 1);

        let mut budget = svc.budget();
        svc.process_world(&mut boxes, |s| maps.get(&s), WorldTick(1), &mut budget).unwrap();
        assert!(boxes.iter().all(|b| b.hit_targets().count() == 1));
    }

    #[test]
    fn starved_hit_boxes_still_expire() {
        let map = field();
        let mut boxes = Vec::new();
        for id in 1..=2u64 {
            let mut s: HitBoxSpawn = spawn(0, 0, 1);
            s.id = HitBoxId::new(id).unwrap();
            s.shape = HitBoxShape::square(2);
            boxes.push(HitBoxAggregate::create(s).unwrap());
        }
        let svc = service(1);
        let mut budget = svc.budget();
        svc.process_all(&mut boxes, &map, WorldTick(1), &mut budget).unwrap();
        assert!(boxes.iter().all(|b| !b.is_active()));
    }

    proptest! {
        #[test]
        fn checks_never_exceed_budget(
            limit in 1u32..40,
            count in 1usize..6,
            radius in 0u32..3,
            actors in 0u64..6,
            spots in 1u64..4,
        ) {
            let mut maps = BTreeMap::new();
            for spot in 1..=spots {
                let mut map = field_on(spot);
                for n in 0..actors {
                    map.add_object(dummy(100 + n, at(n as i32, 1))).unwrap();
                }
                maps.insert(SpotId::new(spot).unwrap(), map);
            }
            let mut boxes = Vec::new();
            for id in 0..count as u64 {
                let mut s = spawn(0, 0, 5);
                s.id = HitBoxId::new(id + 1).unwrap();
                s.spot_id = SpotId::new(id % spots + 1).unwrap();
                s.origin = at((id % 6) as i32, 1);
                s.shape = HitBoxShape::square(radius);
                s.velocity = HitBoxVelocity::new(0.5, 0.0, 0.0).unwrap();
                s.obstacle_policy = ObstacleCollisionPolicy::PassThrough;
                boxes.push(HitBoxAggregate::create(s).unwrap());
            }
            let svc = service(limit);
            for t in 0..3 {
                let mut budget = svc.budget();
                let report = svc
                    .process_world(&mut boxes, |s| maps.get(&s), WorldTick(t), &mut budget)
                    .unwrap();
                prop_assert!(report.checks_used <= limit);
                prop_assert!(budget.used() <= limit);
            }
        }
    }
}
