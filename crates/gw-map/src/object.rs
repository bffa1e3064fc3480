//! World objects and their components.
//!
//! Every object carries exactly one [`ObjectComponent`]. The component decides
//! what the object can do: move (actors), think (autonomous actors), or be
//! interacted with (chests, doors, items, resource nodes).

use gw_core::{
    BehaviorState, Coordinate, Direction, ItemId, MonsterId, MovementCapability, PackId, Race,
    WorldObjectId, WorldTick,
};
use serde::{Deserialize, Serialize};

/// Broad category of a world object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectType {
    /// A player character.
    Player,
    /// A monster driven by the behaviour engine.
    Monster,
    /// A non-player character.
    Npc,
    /// A container.
    Chest,
    /// A door.
    Door,
    /// An item lying on the ground.
    Item,
    /// A harvestable resource node.
    Resource,
    /// Anything else that reacts to use (levers, signs).
    Interactable,
    /// Scenery.
    Decoration,
}

/// What kind of interaction an object offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionType {
    /// Open or close.
    Toggle,
    /// Open and loot.
    Open,
    /// Gather a yield.
    Harvest,
    /// Take into the inventory.
    PickUp,
    /// Generic use.
    Use,
}

/// Movement-related state of anything that walks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorComponent {
    /// Facing direction.
    pub direction: Direction,
    /// How the actor moves.
    pub capability: MovementCapability,
    /// Race used by hostility tables.
    pub race: Race,
    /// Pack membership; pack mates are allies.
    pub pack_id: Option<PackId>,
}

impl ActorComponent {
    /// A south-facing actor.
    pub fn new(race: Race, capability: MovementCapability) -> Self {
        Self {
            direction: Direction::South,
            capability,
            race,
            pack_id: None,
        }
    }

    /// Same actor in a pack.
    pub fn with_pack(mut self, pack_id: PackId) -> Self {
        self.pack_id = Some(pack_id);
        self
    }
}

/// State of an actor driven by the behaviour state machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutonomousBehaviorComponent {
    /// Movement state.
    pub actor: ActorComponent,
    /// Monster aggregate backing this object, if any.
    pub monster_id: Option<MonsterId>,
    /// Current state.
    pub state: BehaviorState,
    /// Tick the current state was entered.
    pub state_entered_at: WorldTick,
    /// Object currently chased or fled from.
    pub target_id: Option<WorldObjectId>,
    /// Where the target was last seen.
    pub last_known_target_position: Option<Coordinate>,
    /// Sight radius in cells, before weather.
    pub vision_range: u32,
    /// Field of view in degrees; 360 sees all around.
    pub fov_degrees: f64,
    /// Patrol route.
    pub patrol_points: Vec<Coordinate>,
    /// Index of the next patrol point.
    pub patrol_index: usize,
    /// HP fraction at or below which a chase turns into flight.
    pub flee_threshold: f64,
    /// HP fractions that trigger enrage, highest first.
    pub phase_thresholds: Vec<f64>,
    /// Consecutive failed steps tolerated before giving up.
    pub max_move_failures: u32,
    /// Consecutive failed steps so far.
    pub move_failures: u32,
    /// Hunger, `0.0..=1.0`.
    pub hunger: f64,
    /// Hunger gained per tick.
    pub hunger_rate: f64,
    /// Hunger from which prey becomes a target.
    pub hunt_hunger_threshold: f64,
    /// Spawn coordinate the actor is leashed to.
    pub home: Coordinate,
    /// How far from home the actor may roam.
    pub leash_distance: u32,
    /// Ticks spent searching for a lost target.
    pub search_duration: u64,
}

impl AutonomousBehaviorComponent {
    /// An idle actor at `home` with stock senses.
    pub fn new(actor: ActorComponent, home: Coordinate) -> Self {
        Self {
            actor,
            monster_id: None,
            state: BehaviorState::Idle,
            state_entered_at: WorldTick::ZERO,
            target_id: None,
            last_known_target_position: None,
            vision_range: 6,
            fov_degrees: 360.0,
            patrol_points: Vec::new(),
            patrol_index: 0,
            flee_threshold: 0.0,
            phase_thresholds: Vec::new(),
            max_move_failures: 3,
            move_failures: 0,
            hunger: 0.0,
            hunger_rate: 0.0,
            hunt_hunger_threshold: 0.5,
            home,
            leash_distance: 12,
            search_duration: 5,
        }
    }

    /// Link to a monster aggregate.
    pub fn with_monster(mut self, monster_id: MonsterId) -> Self {
        self.monster_id = Some(monster_id);
        self
    }

    /// Set a patrol route. A non-empty route starts the actor in `Patrol`.
    pub fn with_patrol(mut self, points: Vec<Coordinate>) -> Self {
        self.state = if points.is_empty() {
            BehaviorState::Idle
        } else {
            BehaviorState::Patrol
        };
        self.patrol_points = points;
        self.patrol_index = 0;
        self
    }

    /// Set sight radius and field of view.
    pub fn with_vision(mut self, range: u32, fov_degrees: f64) -> Self {
        self.vision_range = range;
        self.fov_degrees = fov_degrees.clamp(0.0, 360.0);
        self
    }

    /// Set the flee threshold.
    pub fn with_flee_threshold(mut self, threshold: f64) -> Self {
        self.flee_threshold = threshold;
        self
    }

    /// Set enrage thresholds; they are kept sorted highest first.
    pub fn with_phase_thresholds(mut self, mut thresholds: Vec<f64>) -> Self {
        thresholds.sort_by(|a, b| b.total_cmp(a));
        self.phase_thresholds = thresholds;
        self
    }

    /// Set the leash radius.
    pub fn with_leash(mut self, distance: u32) -> Self {
        self.leash_distance = distance;
        self
    }

    /// Set hunger rate and hunting threshold.
    pub fn with_hunger(mut self, rate: f64, hunt_threshold: f64) -> Self {
        self.hunger_rate = rate;
        self.hunt_hunger_threshold = hunt_threshold;
        self
    }

    /// Set the stuck tolerance.
    pub fn with_max_move_failures(mut self, failures: u32) -> Self {
        self.max_move_failures = failures;
        self
    }

    /// Set how long a lost target is searched for.
    pub fn with_search_duration(mut self, ticks: u64) -> Self {
        self.search_duration = ticks;
        self
    }

    /// The state the actor rests in when nothing happens.
    pub fn resting_state(&self) -> BehaviorState {
        if self.patrol_points.is_empty() {
            BehaviorState::Idle
        } else {
            BehaviorState::Patrol
        }
    }

    /// Switch state. Returns the previous state when it actually changed.
    pub fn transition_to(&mut self, state: BehaviorState, tick: WorldTick) -> Option<BehaviorState> {
        if self.state == state {
            return None;
        }
        let from = self.state;
        self.state = state;
        self.state_entered_at = tick;
        Some(from)
    }

    /// Ticks spent in the current state.
    pub fn ticks_in_state(&self, now: WorldTick) -> u64 {
        now.since(self.state_entered_at)
    }

    /// The patrol point currently headed for.
    pub fn current_patrol_point(&self) -> Option<Coordinate> {
        self.patrol_points
            .get(self.patrol_index % self.patrol_points.len().max(1))
            .copied()
    }

    /// Move on to the next patrol point, wrapping around.
    pub fn advance_patrol(&mut self) {
        if !self.patrol_points.is_empty() {
            self.patrol_index = (self.patrol_index + 1) % self.patrol_points.len();
        }
    }

    /// Count a failed step. Returns true once the tolerance is exceeded.
    pub fn record_move_failure(&mut self) -> bool {
        self.move_failures = self.move_failures.saturating_add(1);
        self.move_failures > self.max_move_failures
    }

    /// Forget earlier failed steps.
    pub fn reset_move_failures(&mut self) {
        self.move_failures = 0;
    }

    /// Apply one tick of hunger.
    pub fn grow_hungry(&mut self) {
        self.hunger = (self.hunger + self.hunger_rate).clamp(0.0, 1.0);
    }

    /// Reduce hunger after eating.
    pub fn feed(&mut self, amount: f64) {
        self.hunger = (self.hunger - amount).clamp(0.0, 1.0);
    }

    /// Whether prey is worth hunting right now.
    pub fn is_hunting(&self) -> bool {
        self.hunger >= self.hunt_hunger_threshold
    }
}

/// A container with fixed contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChestComponent {
    /// Items handed out on opening.
    pub items: Vec<ItemId>,
    /// Whether it has been opened.
    pub opened: bool,
}

/// A door.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoorComponent {
    /// Whether it stands open.
    pub open: bool,
}

/// An item on the ground.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundItemComponent {
    /// Item type.
    pub item_id: ItemId,
    /// Stack size.
    pub quantity: u32,
}

/// A resource node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarvestableComponent {
    /// Item yielded per harvest.
    pub item_id: ItemId,
    /// Yields left.
    pub remaining: u32,
}

/// A generic usable object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractableComponent {
    /// Label reported when used.
    pub interaction: String,
}

/// The single component of a world object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "component", rename_all = "snake_case")]
pub enum ObjectComponent {
    /// No behaviour at all.
    Static,
    /// A player-controlled or scripted mover.
    Actor(ActorComponent),
    /// A mover driven by the behaviour engine.
    AutonomousBehavior(AutonomousBehaviorComponent),
    /// A chest.
    Chest(ChestComponent),
    /// A door.
    Door(DoorComponent),
    /// A ground item.
    GroundItem(GroundItemComponent),
    /// A resource node.
    Harvestable(HarvestableComponent),
    /// A generic usable object.
    Interactable(InteractableComponent),
}

impl ObjectComponent {
    /// Whether the object can move.
    pub fn is_actor(&self) -> bool {
        self.actor().is_some()
    }

    /// Movement state, for both plain and autonomous actors.
    pub fn actor(&self) -> Option<&ActorComponent> {
        match self {
            Self::Actor(actor) => Some(actor),
            Self::AutonomousBehavior(auto) => Some(&auto.actor),
            _ => None,
        }
    }

    /// Mutable movement state.
    pub fn actor_mut(&mut self) -> Option<&mut ActorComponent> {
        match self {
            Self::Actor(actor) => Some(actor),
            Self::AutonomousBehavior(auto) => Some(&mut auto.actor),
            _ => None,
        }
    }

    /// Movement capability of an actor.
    pub fn capability(&self) -> Option<MovementCapability> {
        self.actor().map(|a| a.capability)
    }

    /// Facing direction of an actor.
    pub fn direction(&self) -> Option<Direction> {
        self.actor().map(|a| a.direction)
    }

    /// Behaviour state of an autonomous actor.
    pub fn behavior(&self) -> Option<&AutonomousBehaviorComponent> {
        match self {
            Self::AutonomousBehavior(auto) => Some(auto),
            _ => None,
        }
    }

    /// Mutable behaviour state.
    pub fn behavior_mut(&mut self) -> Option<&mut AutonomousBehaviorComponent> {
        match self {
            Self::AutonomousBehavior(auto) => Some(auto),
            _ => None,
        }
    }

    /// The interaction the object offers, if any.
    pub fn interaction_type(&self) -> Option<InteractionType> {
        match self {
            Self::Door(_) => Some(InteractionType::Toggle),
            Self::Chest(_) => Some(InteractionType::Open),
            Self::Harvestable(_) => Some(InteractionType::Harvest),
            Self::GroundItem(_) => Some(InteractionType::PickUp),
            Self::Interactable(_) => Some(InteractionType::Use),
            Self::Static | Self::Actor(_) | Self::AutonomousBehavior(_) => None,
        }
    }
}

/// Something placed on a physical map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldObject {
    /// Identity.
    pub id: WorldObjectId,
    /// Current cell. Changed only through the map.
    pub(crate) coordinate: Coordinate,
    /// Category.
    pub object_type: ObjectType,
    /// Whether it blocks other blocking objects from its cell.
    pub is_blocking: bool,
    /// Capability set.
    pub component: ObjectComponent,
    /// The object may not act before this tick.
    pub busy_until: Option<WorldTick>,
}

impl WorldObject {
    /// A new object.
    pub fn new(
        id: WorldObjectId,
        coordinate: Coordinate,
        object_type: ObjectType,
        is_blocking: bool,
        component: ObjectComponent,
    ) -> Self {
        Self {
            id,
            coordinate,
            object_type,
            is_blocking,
            component,
            busy_until: None,
        }
    }

    /// A blocking player character.
    pub fn player(id: WorldObjectId, coordinate: Coordinate) -> Self {
        Self::new(
            id,
            coordinate,
            ObjectType::Player,
            true,
            ObjectComponent::Actor(ActorComponent::new(Race::Human, MovementCapability::walker())),
        )
    }

    /// A blocking monster with the given behaviour.
    pub fn monster(id: WorldObjectId, coordinate: Coordinate, behavior: AutonomousBehaviorComponent) -> Self {
        Self::new(
            id,
            coordinate,
            ObjectType::Monster,
            true,
            ObjectComponent::AutonomousBehavior(behavior),
        )
    }

    /// A non-blocking item stack.
    pub fn ground_item(id: WorldObjectId, coordinate: Coordinate, item_id: ItemId, quantity: u32) -> Self {
        Self::new(
            id,
            coordinate,
            ObjectType::Item,
            false,
            ObjectComponent::GroundItem(GroundItemComponent { item_id, quantity }),
        )
    }

    /// Current cell.
    pub fn coordinate(&self) -> Coordinate {
        self.coordinate
    }

    /// Whether the object is still busy at `tick`.
    pub fn is_busy(&self, tick: WorldTick) -> bool {
        self.busy_until.is_some_and(|until| until > tick)
    }

    /// The same object standing on `to`, for placing it on another map.
    pub fn relocated(mut self, to: Coordinate) -> Self {
        self.coordinate = to;
        self
    }
}
