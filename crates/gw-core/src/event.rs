use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::coordinate::Coordinate;
use crate::id::{GatewayId, HitBoxId, ItemId, MonsterId, SpotId, WeatherZoneId, WorldObjectId, WorldTick};
use crate::state::{BehaviorState, WeatherType};
use crate::stats::BaseStats;
use crate::terrain::TerrainType;

/// Why a hit box stopped being active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HitBoxEndReason {
    /// Its duration elapsed.
    Expired,
    /// It struck an obstacle under a deactivating policy.
    Obstacle,
    /// It struck a target under a deactivating policy.
    Target,
    /// It left the grid.
    OutOfBounds,
}

/// What happened. Aggregates buffer these; the unit of work wraps them in a [`DomainEvent`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorldEventKind {
    // Map
    /// An object was placed on a map.
    WorldObjectAdded {
        /// Map the object was added to.
        spot_id: SpotId,
        /// The new object.
        object_id: WorldObjectId,
        /// Where it was placed.
        coordinate: Coordinate,
    },
    /// An object was taken off a map.
    WorldObjectRemoved {
        /// Map the object was removed from.
        spot_id: SpotId,
        /// The removed object.
        object_id: WorldObjectId,
        /// Where it stood.
        coordinate: Coordinate,
    },
    /// An object moved one step.
    WorldObjectMoved {
        /// Map of the move.
        spot_id: SpotId,
        /// The moving object.
        object_id: WorldObjectId,
        /// Previous cell.
        from: Coordinate,
        /// New cell.
        to: Coordinate,
    },
    /// A tile's terrain or walkability override changed.
    TileChanged {
        /// Map of the tile.
        spot_id: SpotId,
        /// The tile.
        coordinate: Coordinate,
        /// Terrain after the change.
        terrain: TerrainType,
        /// Override after the change.
        walkable_override: Option<bool>,
    },
    /// A player stepped into a gateway's activation area.
    GatewayTriggered {
        /// Map holding the gateway.
        spot_id: SpotId,
        /// The traveller.
        object_id: WorldObjectId,
        /// The gateway.
        gateway_id: GatewayId,
        /// Destination map.
        target_spot_id: SpotId,
        /// Landing cell on the destination map.
        landing: Coordinate,
    },
    /// An object moved between maps through a gateway.
    ObjectTransferred {
        /// The traveller.
        object_id: WorldObjectId,
        /// Map left.
        from_spot_id: SpotId,
        /// Map entered.
        to_spot_id: SpotId,
        /// Landing cell.
        landing: Coordinate,
    },
    /// A gateway refused passage.
    TransitionDenied {
        /// The traveller.
        object_id: WorldObjectId,
        /// Map the traveller stays on.
        from_spot_id: SpotId,
        /// Map that was refused.
        to_spot_id: SpotId,
        /// Every failed condition.
        reasons: Vec<String>,
    },

    // Interaction
    /// A door opened or closed.
    DoorToggled {
        /// Map of the door.
        spot_id: SpotId,
        /// The door.
        door_id: WorldObjectId,
        /// Who operated it.
        actor_id: WorldObjectId,
        /// State after the toggle.
        open: bool,
    },
    /// A chest was opened and its contents handed out.
    ChestOpened {
        /// Map of the chest.
        spot_id: SpotId,
        /// The chest.
        chest_id: WorldObjectId,
        /// Who opened it.
        actor_id: WorldObjectId,
        /// Items handed out.
        items: Vec<ItemId>,
    },
    /// A resource node yielded an item.
    ResourceHarvested {
        /// Map of the node.
        spot_id: SpotId,
        /// The node.
        source_id: WorldObjectId,
        /// Who harvested it.
        actor_id: WorldObjectId,
        /// Item yielded.
        item_id: ItemId,
        /// Yields left.
        remaining: u32,
    },
    /// A ground item was picked up.
    ItemPickedUp {
        /// Map of the item.
        spot_id: SpotId,
        /// The ground-item object (now removed).
        object_id: WorldObjectId,
        /// Who picked it up.
        actor_id: WorldObjectId,
        /// Item type.
        item_id: ItemId,
        /// Stack size.
        quantity: u32,
    },
    /// A generic interactable was used.
    ObjectInteracted {
        /// Map of the object.
        spot_id: SpotId,
        /// The object.
        object_id: WorldObjectId,
        /// Who used it.
        actor_id: WorldObjectId,
        /// Free-form interaction label.
        interaction: String,
    },
    /// Loot was dropped on the ground.
    ItemDropped {
        /// Map of the drop.
        spot_id: SpotId,
        /// The ground-item object created.
        object_id: WorldObjectId,
        /// Item type.
        item_id: ItemId,
        /// Where it landed.
        coordinate: Coordinate,
    },

    // Combat
    /// A hit box was spawned.
    HitBoxCreated {
        /// Map of the hit box.
        spot_id: SpotId,
        /// The hit box.
        hit_box_id: HitBoxId,
        /// Attacker.
        owner_id: WorldObjectId,
        /// Spawn cell.
        coordinate: Coordinate,
    },
    /// A hit box struck a target for the first time in its current activation.
    HitBoxHitRecorded {
        /// Map of the hit.
        spot_id: SpotId,
        /// The hit box.
        hit_box_id: HitBoxId,
        /// Attacker.
        owner_id: WorldObjectId,
        /// Victim.
        target_id: WorldObjectId,
        /// Cell the hit happened on.
        hit_coordinate: Coordinate,
        /// Damage scaling of the hit box.
        power_multiplier: f64,
        /// Attacker stats at cast time.
        attacker_stats: Option<BaseStats>,
    },
    /// A hit box struck impassable terrain.
    HitBoxObstacleHit {
        /// Map of the collision.
        spot_id: SpotId,
        /// The hit box.
        hit_box_id: HitBoxId,
        /// Obstacle cell.
        coordinate: Coordinate,
    },
    /// A hit box became inactive.
    HitBoxDeactivated {
        /// Map of the hit box.
        spot_id: SpotId,
        /// The hit box.
        hit_box_id: HitBoxId,
        /// Why it ended.
        reason: HitBoxEndReason,
    },
    /// A monster used a skill.
    SkillUsed {
        /// Map of the caster.
        spot_id: SpotId,
        /// The casting monster.
        monster_id: MonsterId,
        /// The caster's map object.
        object_id: WorldObjectId,
        /// Skill name.
        skill: String,
        /// Intended target.
        target_id: Option<WorldObjectId>,
    },

    // Monsters
    /// A monster entered the world.
    MonsterSpawned {
        /// Map of the spawn.
        spot_id: SpotId,
        /// The monster.
        monster_id: MonsterId,
        /// Its map object.
        object_id: WorldObjectId,
        /// Spawn cell.
        coordinate: Coordinate,
    },
    /// A monster took damage.
    MonsterDamaged {
        /// Map of the monster.
        spot_id: SpotId,
        /// The monster.
        monster_id: MonsterId,
        /// Its map object.
        object_id: WorldObjectId,
        /// Attacker.
        attacker_id: WorldObjectId,
        /// Damage dealt.
        damage: u32,
        /// Whether the hit was critical.
        critical: bool,
        /// Hit points left.
        remaining_hp: u32,
    },
    /// A monster's hit points reached zero.
    MonsterDied {
        /// Map of the monster.
        spot_id: SpotId,
        /// The monster.
        monster_id: MonsterId,
        /// Its map object.
        object_id: WorldObjectId,
        /// The attacker that landed the final blow.
        killer_id: Option<WorldObjectId>,
        /// Where it died.
        coordinate: Coordinate,
    },
    /// An autonomous actor changed behaviour state.
    BehaviorStateChanged {
        /// Map of the actor.
        spot_id: SpotId,
        /// The actor.
        object_id: WorldObjectId,
        /// Previous state.
        from: BehaviorState,
        /// New state.
        to: BehaviorState,
    },

    // Weather
    /// A weather zone changed weather.
    WeatherChanged {
        /// The zone.
        zone_id: WeatherZoneId,
        /// Previous weather.
        from: WeatherType,
        /// New weather.
        to: WeatherType,
        /// Whether the transition table was bypassed.
        forced: bool,
    },
}

/// Fieldless mirror of [`WorldEventKind`], used to key handler registries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[allow(missing_docs)]
pub enum EventType {
    WorldObjectAdded,
    WorldObjectRemoved,
    WorldObjectMoved,
    TileChanged,
    GatewayTriggered,
    ObjectTransferred,
    TransitionDenied,
    DoorToggled,
    ChestOpened,
    ResourceHarvested,
    ItemPickedUp,
    ObjectInteracted,
    ItemDropped,
    HitBoxCreated,
    HitBoxHitRecorded,
    HitBoxObstacleHit,
    HitBoxDeactivated,
    SkillUsed,
    MonsterSpawned,
    MonsterDamaged,
    MonsterDied,
    BehaviorStateChanged,
    WeatherChanged,
}

impl WorldEventKind {
    /// The registry key for this event.
    pub fn event_type(&self) -> EventType {
        match self {
            Self::WorldObjectAdded { .. } => EventType::WorldObjectAdded,
            Self::WorldObjectRemoved { .. } => EventType::WorldObjectRemoved,
            Self::WorldObjectMoved { .. } => EventType::WorldObjectMoved,
            Self::TileChanged { .. } => EventType::TileChanged,
            Self::GatewayTriggered { .. } => EventType::GatewayTriggered,
            Self::ObjectTransferred { .. } => EventType::ObjectTransferred,
            Self::TransitionDenied { .. } => EventType::TransitionDenied,
            Self::DoorToggled { .. } => EventType::DoorToggled,
            Self::ChestOpened { .. } => EventType::ChestOpened,
            Self::ResourceHarvested { .. } => EventType::ResourceHarvested,
            Self::ItemPickedUp { .. } => EventType::ItemPickedUp,
            Self::ObjectInteracted { .. } => EventType::ObjectInteracted,
            Self::ItemDropped { .. } => EventType::ItemDropped,
            Self::HitBoxCreated { .. } => EventType::HitBoxCreated,
            Self::HitBoxHitRecorded { .. } => EventType::HitBoxHitRecorded,
            Self::HitBoxObstacleHit { .. } => EventType::HitBoxObstacleHit,
            Self::HitBoxDeactivated { .. } => EventType::HitBoxDeactivated,
            Self::SkillUsed { .. } => EventType::SkillUsed,
            Self::MonsterSpawned { .. } => EventType::MonsterSpawned,
            Self::MonsterDamaged { .. } => EventType::MonsterDamaged,
            Self::MonsterDied { .. } => EventType::MonsterDied,
            Self::BehaviorStateChanged { .. } => EventType::BehaviorStateChanged,
            Self::WeatherChanged { .. } => EventType::WeatherChanged,
        }
    }

    /// Check whether a given map object is involved in this event.
    pub fn involves(&self, id: WorldObjectId) -> bool {
        match self {
            Self::WorldObjectAdded { object_id, .. }
            | Self::WorldObjectRemoved { object_id, .. }
            | Self::WorldObjectMoved { object_id, .. }
            | Self::GatewayTriggered { object_id, .. }
            | Self::ObjectTransferred { object_id, .. }
            | Self::TransitionDenied { object_id, .. }
            | Self::ItemDropped { object_id, .. }
            | Self::MonsterSpawned { object_id, .. }
            | Self::BehaviorStateChanged { object_id, .. } => *object_id == id,
            Self::DoorToggled {
                door_id, actor_id, ..
            } => *door_id == id || *actor_id == id,
            Self::ChestOpened {
                chest_id, actor_id, ..
            } => *chest_id == id || *actor_id == id,
            Self::ResourceHarvested {
                source_id,
                actor_id,
                ..
            } => *source_id == id || *actor_id == id,
            Self::ItemPickedUp {
                object_id,
                actor_id,
                ..
            }
            | Self::ObjectInteracted {
                object_id,
                actor_id,
                ..
            } => *object_id == id || *actor_id == id,
            Self::HitBoxCreated { owner_id, .. } => *owner_id == id,
            Self::HitBoxHitRecorded {
                owner_id,
                target_id,
                ..
            } => *owner_id == id || *target_id == id,
            Self::SkillUsed {
                object_id,
                target_id,
                ..
            } => *object_id == id || *target_id == Some(id),
            Self::MonsterDamaged {
                object_id,
                attacker_id,
                ..
            } => *object_id == id || *attacker_id == id,
            Self::MonsterDied {
                object_id,
                killer_id,
                ..
            } => *object_id == id || *killer_id == Some(id),
            Self::TileChanged { .. }
            | Self::HitBoxObstacleHit { .. }
            | Self::HitBoxDeactivated { .. }
            | Self::WeatherChanged { .. } => false,
        }
    }
}

/// A domain event together with its envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainEvent {
    /// Unique id of this occurrence.
    pub event_id: Uuid,
    /// Wall-clock time the event was recorded.
    pub occurred_at: DateTime<Utc>,
    /// Simulation tick the event belongs to.
    pub tick: WorldTick,
    /// The payload.
    pub kind: WorldEventKind,
}

impl DomainEvent {
    /// Wrap a payload raised during `tick`.
    pub fn new(tick: WorldTick, kind: WorldEventKind) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            tick,
            kind,
        }
    }

    /// Wrap several payloads raised during the same tick.
    pub fn batch(tick: WorldTick, kinds: impl IntoIterator<Item = WorldEventKind>) -> Vec<Self> {
        kinds.into_iter().map(|k| Self::new(tick, k)).collect()
    }

    /// Shorthand for `self.kind.event_type()`.
    pub fn event_type(&self) -> EventType {
        self.kind.event_type()
    }
}
