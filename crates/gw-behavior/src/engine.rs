//! The monster behaviour state machine and action planning.
//!
//! Each tick an autonomous actor first picks a state from its observation,
//! in priority order:
//!
//! 1. a visible threat forces `Flee`
//! 2. straying past the leash forces `Return`
//! 3. too many failed steps force `Return`
//! 4. a `Return` in progress continues until home
//! 5. a visible target gives `Enrage` (below a phase threshold), `Flee`
//!    (below the flee threshold) or `Chase`
//! 6. a lost target gives `Search` for a while, then `Patrol` or `Return`
//! 7. otherwise `Patrol` with a route, `Idle` without
//!
//! and then plans one action for that state.

use gw_combat::{SkillSpec, TargetPriority};
use gw_core::{BehaviorState, Coordinate, Direction, WorldEventKind, WorldObjectId, WorldTick};
use gw_map::pathfinding::smooth_path;
use gw_map::{AutonomousBehaviorComponent, MapGeometryService, PathOptions, PathfindingService, PhysicalMapAggregate};
use tracing::debug;

use crate::config::BehaviorConfig;
use crate::growth::GrowthContext;
use crate::perception::BehaviorObservation;
use crate::skill_selection::{FirstInRangeSkillPolicy, SkillSelectionContext, SkillSelectionPolicy};
use crate::targeting::{TargetSelectionContext, policy_for};

/// One action for this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlannedAction {
    /// Do nothing.
    Wait,
    /// Step onto a neighbouring cell.
    Move {
        /// Destination cell.
        to: Coordinate,
    },
    /// Use the skill in `slot` on a target.
    UseSkill {
        /// Skill slot.
        slot: usize,
        /// Target object.
        target_id: WorldObjectId,
        /// Target's cell when seen.
        target_position: Coordinate,
    },
}

/// Everything the planner needs beyond the observation.
#[derive(Debug, Clone, Copy)]
pub struct PlanActionContext<'a> {
    /// Age modifiers.
    pub growth: GrowthContext,
    /// Threat memory.
    pub targeting: &'a TargetSelectionContext,
    /// How to choose among targets.
    pub target_priority: TargetPriority,
    /// Skills by slot.
    pub skills: &'a [SkillSpec],
    /// Ready and affordable slots.
    pub available_slots: &'a [usize],
}

/// Result of one decision.
#[derive(Debug, Clone, PartialEq)]
pub struct BehaviorDecision {
    /// State before deciding.
    pub previous: BehaviorState,
    /// State after deciding.
    pub state: BehaviorState,
    /// Current target.
    pub target_id: Option<WorldObjectId>,
    /// What to do this tick.
    pub action: PlannedAction,
}

impl BehaviorDecision {
    /// Whether the state changed.
    pub fn changed(&self) -> bool {
        self.previous != self.state
    }

    /// A `BehaviorStateChanged` event when the state changed.
    pub fn state_event(&self, observation: &BehaviorObservation) -> Option<WorldEventKind> {
        self.changed().then(|| WorldEventKind::BehaviorStateChanged {
            spot_id: observation.spot_id,
            object_id: observation.actor_id,
            from: self.previous,
            to: self.state,
        })
    }
}

/// Decides states and actions for autonomous actors.
#[derive(Debug, Clone, Default)]
pub struct BehaviorService<K = FirstInRangeSkillPolicy> {
    config: BehaviorConfig,
    pathfinding: PathfindingService,
    skill_policy: K,
}

impl BehaviorService {
    /// A service with the default skill policy.
    pub fn new(config: BehaviorConfig) -> Self {
        Self::with_skill_policy(config, FirstInRangeSkillPolicy)
    }
}

impl<K: SkillSelectionPolicy> BehaviorService<K> {
    /// A service with a custom skill policy.
    pub fn with_skill_policy(config: BehaviorConfig, skill_policy: K) -> Self {
        Self {
            config,
            pathfinding: PathfindingService::default(),
            skill_policy,
        }
    }

    /// The engine configuration.
    pub fn config(&self) -> &BehaviorConfig {
        &self.config
    }

    /// Power bonus for skills used in `state`.
    pub fn power_bonus(&self, state: BehaviorState) -> f64 {
        if state == BehaviorState::Enrage {
            self.config.enrage_power_bonus
        } else {
            0.0
        }
    }

    /// Pick the next state and one action, updating `component` in place.
    pub fn decide(
        &self,
        map: &PhysicalMapAggregate,
        component: &mut AutonomousBehaviorComponent,
        observation: &BehaviorObservation,
        ctx: &PlanActionContext<'_>,
    ) -> BehaviorDecision {
        let previous = component.state;
        let next = self.next_state(component, observation, ctx);
        if let Some(from) = component.transition_to(next, observation.current_tick) {
            debug!(actor = %observation.actor_id, %from, to = %next, "behaviour state changed");
        }
        let action = self.plan_action(map, component, observation, ctx);
        BehaviorDecision {
            previous,
            state: component.state,
            target_id: component.target_id,
            action,
        }
    }

    /// The state `component` should be in given `observation`.
    ///
    /// Updates the remembered target and clears move failures when they force
    /// a return; the state itself is left for the caller to apply.
    pub fn next_state(
        &self,
        component: &mut AutonomousBehaviorComponent,
        observation: &BehaviorObservation,
        ctx: &PlanActionContext<'_>,
    ) -> BehaviorState {
        let now = observation.current_tick;
        let position = observation.position;
        let hp = observation.hp_percentage;

        if let Some(threat) = observation.nearest_threat() {
            component.target_id = Some(threat.object_id);
            component.last_known_target_position = Some(threat.coordinate);
            return BehaviorState::Flee;
        }

        if position.chebyshev_distance(component.home) > component.leash_distance {
            forget_target(component);
            return BehaviorState::Return;
        }

        if component.move_failures > component.max_move_failures {
            component.reset_move_failures();
            forget_target(component);
            return BehaviorState::Return;
        }

        if component.state == BehaviorState::Return && position != component.home {
            return BehaviorState::Return;
        }

        if ctx.growth.allow_chase {
            let candidates = observation.targets(component.is_hunting());
            let chosen = policy_for(ctx.target_priority).select_target(&candidates, ctx.targeting);
            if let Some(seen) = chosen.and_then(|id| observation.find(id)) {
                component.target_id = Some(seen.object_id);
                component.last_known_target_position = Some(seen.coordinate);
                if let Some(threshold) = ctx.growth.enrage_threshold(&component.phase_thresholds) {
                    if hp <= threshold {
                        return BehaviorState::Enrage;
                    }
                }
                let flee = ctx.growth.effective_flee_threshold(component.flee_threshold);
                if flee > 0.0 && hp <= flee {
                    return BehaviorState::Flee;
                }
                return BehaviorState::Chase;
            }
        }

        match component.state {
            BehaviorState::Chase | BehaviorState::Enrage if component.last_known_target_position.is_some() => {
                component.target_id = None;
                return BehaviorState::Search;
            }
            BehaviorState::Search => {
                if component.ticks_in_state(now) < component.search_duration {
                    return BehaviorState::Search;
                }
                forget_target(component);
                return if component.patrol_points.is_empty() {
                    BehaviorState::Return
                } else {
                    BehaviorState::Patrol
                };
            }
            BehaviorState::Flee => {
                forget_target(component);
                return BehaviorState::Return;
            }
            BehaviorState::Return => return BehaviorState::Idle,
            _ => {}
        }

        component.resting_state()
    }

    /// One action for the component's current state.
    pub fn plan_action(
        &self,
        map: &PhysicalMapAggregate,
        component: &mut AutonomousBehaviorComponent,
        observation: &BehaviorObservation,
        ctx: &PlanActionContext<'_>,
    ) -> PlannedAction {
        let position = observation.position;
        match component.state {
            BehaviorState::Idle => PlannedAction::Wait,
            BehaviorState::Patrol => {
                if component.current_patrol_point() == Some(position) {
                    component.advance_patrol();
                }
                match component.current_patrol_point() {
                    Some(point) if point != position => self.step_toward(map, component, observation, point),
                    _ => PlannedAction::Wait,
                }
            }
            BehaviorState::Chase | BehaviorState::Enrage => {
                let Some(seen) = component.target_id.and_then(|id| observation.find(id)) else {
                    return PlannedAction::Wait;
                };
                let distance = position.chebyshev_distance(seen.coordinate);
                let skills = SkillSelectionContext {
                    skills: ctx.skills,
                    available_slots: ctx.available_slots,
                    target_distance: distance,
                };
                if let Some(slot) = self.skill_policy.select_slot(&skills) {
                    return PlannedAction::UseSkill {
                        slot,
                        target_id: seen.object_id,
                        target_position: seen.coordinate,
                    };
                }
                if distance <= 1 {
                    return PlannedAction::Wait;
                }
                let goal = seen.coordinate;
                self.step_toward(map, component, observation, goal)
            }
            BehaviorState::Search => match component.last_known_target_position {
                Some(goal) if goal != position => self.step_toward(map, component, observation, goal),
                _ => PlannedAction::Wait,
            },
            BehaviorState::Flee => match component.last_known_target_position {
                Some(threat) => self.step_away(map, component, observation, threat),
                None => PlannedAction::Wait,
            },
            BehaviorState::Return => {
                let home = component.home;
                if home == position {
                    PlannedAction::Wait
                } else {
                    self.step_toward(map, component, observation, home)
                }
            }
        }
    }

    /// First step of a path toward `goal`, or a recorded failure.
    fn step_toward(
        &self,
        map: &PhysicalMapAggregate,
        component: &mut AutonomousBehaviorComponent,
        observation: &BehaviorObservation,
        goal: Coordinate,
    ) -> PlannedAction {
        let actor_id = observation.actor_id;
        let start = observation.position;
        let capability = component.actor.capability;
        let options = PathOptions::default()
            .with_partial()
            .ignoring_errors()
            .with_max_iterations(self.config.path_max_iterations)
            .with_blocked(map.blocked_coordinates(Some(actor_id)));
        let path = self
            .pathfinding
            .calculate_path(map, start, goal, &capability, &options)
            .unwrap_or_default();

        let free = |c: Coordinate| map.blocker_at(c, Some(actor_id)).is_none();
        let mut step = None;
        if self.config.smooth_paths && path.len() > 2 {
            let smoothed = smooth_path(map, &path, &capability);
            step = smoothed
                .get(1)
                .and_then(|waypoint| MapGeometryService::line(start, *waypoint).get(1).copied())
                .filter(|c| free(*c));
        }
        if step.is_none() {
            step = path.get(1).copied().filter(|c| free(*c));
        }

        match step {
            Some(to) => {
                component.reset_move_failures();
                PlannedAction::Move { to }
            }
            None => {
                component.record_move_failure();
                debug!(actor = %actor_id, %goal, failures = component.move_failures, "no step toward goal");
                PlannedAction::Wait
            }
        }
    }

    /// The free neighbouring cell that gains most distance from `threat`.
    fn step_away(
        &self,
        map: &PhysicalMapAggregate,
        component: &mut AutonomousBehaviorComponent,
        observation: &BehaviorObservation,
        threat: Coordinate,
    ) -> PlannedAction {
        let position = observation.position;
        let capability = component.actor.capability;
        let current = position.euclidean_distance(threat);
        let best = Direction::PLANAR
            .iter()
            .filter_map(|d| position.neighbor(*d))
            .filter(|n| map.tile(*n).is_some_and(|t| t.is_passable(&capability)))
            .filter(|n| map.blocker_at(*n, Some(observation.actor_id)).is_none())
            .map(|n| (n, n.euclidean_distance(threat)))
            .filter(|(_, d)| *d > current)
            .fold(None, |best: Option<(Coordinate, f64)>, (n, d)| match best {
                Some((_, top)) if top >= d => best,
                _ => Some((n, d)),
            });
        match best {
            Some((to, _)) => {
                component.reset_move_failures();
                PlannedAction::Move { to }
            }
            None => {
                component.record_move_failure();
                PlannedAction::Wait
            }
        }
    }
}

fn forget_target(component: &mut AutonomousBehaviorComponent) {
    component.target_id = None;
    component.last_known_target_position = None;
}

/// Ticks an actor is busy after `action`.
pub fn busy_ticks(action: &PlannedAction, skills: &[SkillSpec]) -> u64 {
    match action {
        PlannedAction::Wait => 0,
        PlannedAction::Move { .. } => 1,
        PlannedAction::UseSkill { slot, .. } => skills.get(*slot).map_or(1, |s| s.cast_ticks.max(1)),
    }
}

/// Tick at which an actor acting at `now` becomes free again.
pub fn busy_until(now: WorldTick, action: &PlannedAction, skills: &[SkillSpec]) -> Option<WorldTick> {
    match busy_ticks(action, skills) {
        0 => None,
        ticks => Some(now.plus(ticks)),
    }
}
