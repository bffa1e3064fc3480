use std::collections::{BTreeMap, BTreeSet};

use gw_core::{
    Coordinate, Direction, ItemId, SpotId, TerrainType, WorldEventKind, WorldObjectId, WorldTick,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{MapError, MapResult};
use crate::gateway::Gateway;
use crate::object::{ObjectComponent, ObjectType, WorldObject};
use crate::tile::Tile;

/// Result of a successful [`PhysicalMapAggregate::interact`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InteractionOutcome {
    /// A door changed state.
    DoorToggled {
        /// State after the toggle.
        open: bool,
    },
    /// A chest was opened.
    ChestOpened {
        /// Its contents.
        items: Vec<ItemId>,
    },
    /// A resource node yielded an item.
    Harvested {
        /// The yield.
        item_id: ItemId,
        /// Yields left.
        remaining: u32,
    },
    /// A ground item was taken.
    PickedUp {
        /// Item type.
        item_id: ItemId,
        /// Stack size.
        quantity: u32,
    },
    /// A generic object was used.
    Used {
        /// Its interaction label.
        interaction: String,
    },
}

/// One spot's physical map: tiles, objects, gateways and pending events.
///
/// At most one blocking object stands on any cell. Storage does not enforce
/// it; every placement and movement operation does.
#[derive(Debug, Clone)]
pub struct PhysicalMapAggregate {
    spot_id: SpotId,
    tiles: BTreeMap<Coordinate, Tile>,
    objects: BTreeMap<WorldObjectId, WorldObject>,
    gateways: BTreeMap<gw_core::GatewayId, Gateway>,
    events: Vec<WorldEventKind>,

    // Indexes
    by_coordinate: BTreeMap<Coordinate, BTreeSet<WorldObjectId>>,
}

impl PhysicalMapAggregate {
    // -----------------------------------------------------------------------
    // Construction
    // -----------------------------------------------------------------------

    /// A map from explicit tiles. Rejects an empty or duplicated tile list.
    pub fn from_tiles(spot_id: SpotId, tiles: Vec<Tile>) -> MapResult<Self> {
        if tiles.is_empty() {
            return Err(MapError::InvalidGrid("a map needs at least one tile".into()));
        }
        let mut by_coord = BTreeMap::new();
        for tile in tiles {
            if by_coord.insert(tile.coordinate(), tile).is_some() {
                return Err(MapError::InvalidGrid(format!(
                    "duplicate tile at {}",
                    tile.coordinate()
                )));
            }
        }
        Ok(Self {
            spot_id,
            tiles: by_coord,
            objects: BTreeMap::new(),
            gateways: BTreeMap::new(),
            events: Vec::new(),
            by_coordinate: BTreeMap::new(),
        })
    }

    /// A `width` x `height` x `depth` box filled with one terrain, levels `0..depth`.
    pub fn from_grid(
        spot_id: SpotId,
        width: u32,
        height: u32,
        depth: u32,
        terrain: TerrainType,
    ) -> MapResult<Self> {
        if width == 0 || height == 0 || depth == 0 {
            return Err(MapError::InvalidGrid(format!(
                "grid dimensions must be positive, got {width}x{height}x{depth}"
            )));
        }
        let mut tiles = Vec::with_capacity((width * height * depth) as usize);
        for z in 0..depth as i32 {
            for y in 0..height as i32 {
                for x in 0..width as i32 {
                    tiles.push(Tile::new(Coordinate::new(x, y, z)?, terrain));
                }
            }
        }
        Self::from_tiles(spot_id, tiles)
    }

    /// A single-level map from rows of terrain symbols (see [`Tile::terrain_from_symbol`]).
    pub fn from_ascii(spot_id: SpotId, rows: &[&str]) -> MapResult<Self> {
        let width = rows.first().map(|r| r.chars().count()).unwrap_or(0);
        if width == 0 {
            return Err(MapError::InvalidGrid("empty layout".into()));
        }
        let mut tiles = Vec::new();
        for (y, row) in rows.iter().enumerate() {
            if row.chars().count() != width {
                return Err(MapError::InvalidGrid(format!(
                    "row {y} has {} cells, expected {width}",
                    row.chars().count()
                )));
            }
            for (x, symbol) in row.chars().enumerate() {
                let coordinate = Coordinate::planar(x as i32, y as i32)?;
                tiles.push(Tile::new(coordinate, Tile::terrain_from_symbol(symbol)?));
            }
        }
        Self::from_tiles(spot_id, tiles)
    }

    // -----------------------------------------------------------------------
    // Tiles
    // -----------------------------------------------------------------------

    /// The spot this map belongs to.
    pub fn spot_id(&self) -> SpotId {
        self.spot_id
    }

    /// The tile at `coordinate`.
    pub fn tile(&self, coordinate: Coordinate) -> Option<&Tile> {
        self.tiles.get(&coordinate)
    }

    /// The tile at `coordinate`, or `TileNotFound`.
    pub fn tile_or_err(&self, coordinate: Coordinate) -> MapResult<&Tile> {
        self.tiles.get(&coordinate).ok_or(MapError::TileNotFound {
            spot_id: self.spot_id,
            coordinate,
        })
    }

    /// All tiles in coordinate order.
    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.values()
    }

    /// Whether the coordinate lies on the map.
    pub fn contains(&self, coordinate: Coordinate) -> bool {
        self.tiles.contains_key(&coordinate)
    }

    /// Planar extent `(width, height)` of the tile grid.
    pub fn dimensions(&self) -> (u32, u32) {
        self.tiles.keys().fold((0, 0), |(w, h), c| {
            (w.max(c.x() as u32 + 1), h.max(c.y() as u32 + 1))
        })
    }

    /// Whether sight passes through the cell. Missing tiles and closed doors block.
    pub fn is_sight_blocked(&self, coordinate: Coordinate) -> bool {
        let Some(tile) = self.tiles.get(&coordinate) else {
            return true;
        };
        tile.is_sight_blocked()
            || self
                .objects_at(coordinate)
                .iter()
                .any(|o| matches!(o.component, ObjectComponent::Door(d) if !d.open))
    }

    /// Force a tile walkable or unwalkable.
    pub fn set_walkable_override(&mut self, coordinate: Coordinate, walkable: bool) -> MapResult<()> {
        let tile = self.tile_or_err(coordinate)?.with_override(walkable);
        self.replace_tile(tile);
        Ok(())
    }

    /// Drop a tile's override.
    pub fn reset_walkable_override(&mut self, coordinate: Coordinate) -> MapResult<()> {
        let tile = self.tile_or_err(coordinate)?.without_override();
        self.replace_tile(tile);
        Ok(())
    }

    /// Change a tile's terrain.
    pub fn change_terrain(&mut self, coordinate: Coordinate, terrain: TerrainType) -> MapResult<()> {
        let tile = self.tile_or_err(coordinate)?.with_terrain(terrain);
        self.replace_tile(tile);
        Ok(())
    }

    fn replace_tile(&mut self, tile: Tile) {
        self.tiles.insert(tile.coordinate(), tile);
        self.events.push(WorldEventKind::TileChanged {
            spot_id: self.spot_id,
            coordinate: tile.coordinate(),
            terrain: tile.terrain(),
            walkable_override: tile.walkable_override(),
        });
    }

    // -----------------------------------------------------------------------
    // Objects
    // -----------------------------------------------------------------------

    /// Place an object. The cell must exist and be free of other blockers.
    pub fn add_object(&mut self, object: WorldObject) -> MapResult<()> {
        if self.objects.contains_key(&object.id) {
            return Err(MapError::DuplicateObject(object.id));
        }
        self.tile_or_err(object.coordinate)?;
        if object.is_blocking {
            if let Some(occupant) = self.blocker_at(object.coordinate, None) {
                return Err(MapError::Occupied {
                    coordinate: object.coordinate,
                    occupant,
                });
            }
        }
        self.events.push(WorldEventKind::WorldObjectAdded {
            spot_id: self.spot_id,
            object_id: object.id,
            coordinate: object.coordinate,
        });
        self.attach(object);
        Ok(())
    }

    /// Take an object off the map.
    pub fn remove_object(&mut self, id: WorldObjectId) -> MapResult<WorldObject> {
        let object = self.detach(id)?;
        self.events.push(WorldEventKind::WorldObjectRemoved {
            spot_id: self.spot_id,
            object_id: id,
            coordinate: object.coordinate,
        });
        Ok(object)
    }

    /// Put back an earlier copy of an object, replacing whatever state it has
    /// now. Emits no event; the object must still be on the map.
    pub fn restore_object(&mut self, snapshot: WorldObject) -> MapResult<()> {
        self.detach(snapshot.id)?;
        self.attach(snapshot);
        Ok(())
    }

    /// Drop every buffered event recorded after the first `len`.
    pub fn truncate_events(&mut self, len: usize) {
        self.events.truncate(len);
    }

    fn attach(&mut self, object: WorldObject) {
        self.by_coordinate
            .entry(object.coordinate)
            .or_default()
            .insert(object.id);
        self.objects.insert(object.id, object);
    }

    fn detach(&mut self, id: WorldObjectId) -> MapResult<WorldObject> {
        let object = self.objects.remove(&id).ok_or(MapError::ObjectNotFound {
            spot_id: self.spot_id,
            object_id: id,
        })?;
        self.unindex(id, object.coordinate);
        Ok(object)
    }

    fn unindex(&mut self, id: WorldObjectId, coordinate: Coordinate) {
        if let Some(ids) = self.by_coordinate.get_mut(&coordinate) {
            ids.remove(&id);
            if ids.is_empty() {
                self.by_coordinate.remove(&coordinate);
            }
        }
    }

    /// An object by id.
    pub fn object(&self, id: WorldObjectId) -> Option<&WorldObject> {
        self.objects.get(&id)
    }

    /// An object by id, or `ObjectNotFound`.
    pub fn object_or_err(&self, id: WorldObjectId) -> MapResult<&WorldObject> {
        self.objects.get(&id).ok_or(MapError::ObjectNotFound {
            spot_id: self.spot_id,
            object_id: id,
        })
    }

    /// Mutable access to an object's component. Position stays under map control.
    pub fn component_mut(&mut self, id: WorldObjectId) -> MapResult<&mut ObjectComponent> {
        let spot_id = self.spot_id;
        self.objects
            .get_mut(&id)
            .map(|o| &mut o.component)
            .ok_or(MapError::ObjectNotFound {
                spot_id,
                object_id: id,
            })
    }

    /// Every object in id order.
    pub fn objects(&self) -> impl Iterator<Item = &WorldObject> {
        self.objects.values()
    }

    /// Number of objects on the map.
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Ids of every actor, in id order.
    pub fn actor_ids(&self) -> Vec<WorldObjectId> {
        self.objects
            .values()
            .filter(|o| o.component.is_actor())
            .map(|o| o.id)
            .collect()
    }

    /// Objects standing on `coordinate`.
    pub fn objects_at(&self, coordinate: Coordinate) -> Vec<&WorldObject> {
        self.by_coordinate
            .get(&coordinate)
            .map(|ids| ids.iter().filter_map(|id| self.objects.get(id)).collect())
            .unwrap_or_default()
    }

    /// Objects within Chebyshev `radius` of `center`; radius 0 is the cell itself.
    pub fn objects_in_range(&self, center: Coordinate, radius: u32) -> Vec<&WorldObject> {
        if radius == 0 {
            return self.objects_at(center);
        }
        self.objects
            .values()
            .filter(|o| o.coordinate.chebyshev_distance(center) <= radius)
            .collect()
    }

    /// The blocking object on `coordinate`, ignoring `except`.
    pub fn blocker_at(&self, coordinate: Coordinate, except: Option<WorldObjectId>) -> Option<WorldObjectId> {
        self.objects_at(coordinate)
            .into_iter()
            .find(|o| o.is_blocking && Some(o.id) != except)
            .map(|o| o.id)
    }

    /// Cells holding a blocking object other than `except`.
    pub fn blocked_coordinates(&self, except: Option<WorldObjectId>) -> BTreeSet<Coordinate> {
        self.objects
            .values()
            .filter(|o| o.is_blocking && Some(o.id) != except)
            .map(|o| o.coordinate)
            .collect()
    }

    // -----------------------------------------------------------------------
    // Movement
    // -----------------------------------------------------------------------

    /// Step an actor onto a neighbouring cell.
    ///
    /// The cell must exist, be passable for the actor's capability and hold no
    /// other blocking object when the actor itself blocks. Vertical steps need
    /// flight or phasing. A player stepping into a gateway area triggers it.
    pub fn move_object(&mut self, id: WorldObjectId, to: Coordinate) -> MapResult<()> {
        let object = self.object_or_err(id)?;
        let from = object.coordinate;
        let capability = object.component.capability().ok_or(MapError::NotActor(id))?;
        let is_blocking = object.is_blocking;
        let object_type = object.object_type;

        if from.chebyshev_distance(to) != 1 {
            return Err(MapError::NotAdjacent { from, to });
        }
        let tile = self.tile_or_err(to)?;
        let vertical = from.z() != to.z();
        if !tile.is_passable(&capability) || (vertical && !(capability.can_fly || capability.can_phase)) {
            return Err(MapError::Impassable {
                object_id: id,
                coordinate: to,
            });
        }
        if is_blocking {
            if let Some(occupant) = self.blocker_at(to, Some(id)) {
                return Err(MapError::Occupied {
                    coordinate: to,
                    occupant,
                });
            }
        }

        self.unindex(id, from);
        self.by_coordinate.entry(to).or_default().insert(id);
        if let Some(object) = self.objects.get_mut(&id) {
            object.coordinate = to;
            if let (Some(actor), Some(direction)) = (object.component.actor_mut(), from.direction_to(to)) {
                actor.direction = direction;
            }
        }
        self.events.push(WorldEventKind::WorldObjectMoved {
            spot_id: self.spot_id,
            object_id: id,
            from,
            to,
        });
        debug!(spot = %self.spot_id, object = %id, %from, %to, "object moved");

        if object_type == ObjectType::Player {
            let triggered = self
                .gateways
                .values()
                .find(|g| g.is_triggered_at(to))
                .map(|g| (g.id, g.target_spot_id, g.landing));
            if let Some((gateway_id, target_spot_id, landing)) = triggered {
                self.events.push(WorldEventKind::GatewayTriggered {
                    spot_id: self.spot_id,
                    object_id: id,
                    gateway_id,
                    target_spot_id,
                    landing,
                });
            }
        }
        Ok(())
    }

    /// Step an actor one cell in `direction`.
    pub fn move_object_in_direction(&mut self, id: WorldObjectId, direction: Direction) -> MapResult<()> {
        let from = self.object_or_err(id)?.coordinate;
        let to = from.neighbor(direction).ok_or(MapError::OutOfBounds(from))?;
        self.move_object(id, to)
    }

    /// Turn an actor without moving.
    pub fn face(&mut self, id: WorldObjectId, direction: Direction) -> MapResult<()> {
        let actor = self
            .component_mut(id)?
            .actor_mut()
            .ok_or(MapError::NotActor(id))?;
        actor.direction = direction;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Busy handling
    // -----------------------------------------------------------------------

    /// Keep an object from acting before `tick`.
    pub fn set_busy_until(&mut self, id: WorldObjectId, tick: WorldTick) -> MapResult<()> {
        let spot_id = self.spot_id;
        let object = self.objects.get_mut(&id).ok_or(MapError::ObjectNotFound {
            spot_id,
            object_id: id,
        })?;
        object.busy_until = Some(tick);
        Ok(())
    }

    /// Whether the object is still busy at `tick`.
    pub fn is_busy(&self, id: WorldObjectId, tick: WorldTick) -> MapResult<bool> {
        Ok(self.object_or_err(id)?.is_busy(tick))
    }

    // -----------------------------------------------------------------------
    // Interaction
    // -----------------------------------------------------------------------

    /// Let `actor_id` interact with an object on or next to its cell.
    pub fn interact(&mut self, actor_id: WorldObjectId, target_id: WorldObjectId) -> MapResult<InteractionOutcome> {
        let actor = self.object_or_err(actor_id)?;
        if !actor.component.is_actor() {
            return Err(MapError::NotActor(actor_id));
        }
        let actor_at = actor.coordinate;
        let target = self.object_or_err(target_id)?;
        let target_at = target.coordinate;
        if actor_at.chebyshev_distance(target_at) > 1 || actor_at.z() != target_at.z() {
            return Err(MapError::OutOfReach {
                actor: actor_id,
                target: target_id,
            });
        }
        if target.component.interaction_type().is_none() {
            return Err(MapError::NotInteractable(target_id));
        }
        let obstructed = self
            .objects_at(target_at)
            .iter()
            .any(|o| o.id != target_id);
        let spot_id = self.spot_id;

        let target = self
            .objects
            .get_mut(&target_id)
            .ok_or(MapError::ObjectNotFound {
                spot_id,
                object_id: target_id,
            })?;
        let (outcome, event) = match &mut target.component {
            ObjectComponent::Door(door) => {
                if door.open && obstructed {
                    return Err(MapError::DoorObstructed(target_id));
                }
                door.open = !door.open;
                target.is_blocking = !door.open;
                (
                    InteractionOutcome::DoorToggled { open: door.open },
                    WorldEventKind::DoorToggled {
                        spot_id,
                        door_id: target_id,
                        actor_id,
                        open: door.open,
                    },
                )
            }
            ObjectComponent::Chest(chest) => {
                if chest.opened {
                    return Err(MapError::ChestAlreadyOpened(target_id));
                }
                chest.opened = true;
                (
                    InteractionOutcome::ChestOpened {
                        items: chest.items.clone(),
                    },
                    WorldEventKind::ChestOpened {
                        spot_id,
                        chest_id: target_id,
                        actor_id,
                        items: chest.items.clone(),
                    },
                )
            }
            ObjectComponent::Harvestable(node) => {
                if node.remaining == 0 {
                    return Err(MapError::ResourceDepleted(target_id));
                }
                node.remaining -= 1;
                (
                    InteractionOutcome::Harvested {
                        item_id: node.item_id,
                        remaining: node.remaining,
                    },
                    WorldEventKind::ResourceHarvested {
                        spot_id,
                        source_id: target_id,
                        actor_id,
                        item_id: node.item_id,
                        remaining: node.remaining,
                    },
                )
            }
            ObjectComponent::GroundItem(item) => (
                InteractionOutcome::PickedUp {
                    item_id: item.item_id,
                    quantity: item.quantity,
                },
                WorldEventKind::ItemPickedUp {
                    spot_id,
                    object_id: target_id,
                    actor_id,
                    item_id: item.item_id,
                    quantity: item.quantity,
                },
            ),
            ObjectComponent::Interactable(thing) => (
                InteractionOutcome::Used {
                    interaction: thing.interaction.clone(),
                },
                WorldEventKind::ObjectInteracted {
                    spot_id,
                    object_id: target_id,
                    actor_id,
                    interaction: thing.interaction.clone(),
                },
            ),
            ObjectComponent::Static | ObjectComponent::Actor(_) | ObjectComponent::AutonomousBehavior(_) => {
                return Err(MapError::NotInteractable(target_id));
            }
        };

        if matches!(outcome, InteractionOutcome::PickedUp { .. }) {
            self.detach(target_id)?;
        }
        self.events.push(event);
        Ok(outcome)
    }

    // -----------------------------------------------------------------------
    // Gateways
    // -----------------------------------------------------------------------

    /// Register a gateway.
    pub fn add_gateway(&mut self, gateway: Gateway) -> MapResult<()> {
        if self.gateways.contains_key(&gateway.id) {
            return Err(MapError::DuplicateGateway(gateway.id));
        }
        self.gateways.insert(gateway.id, gateway);
        Ok(())
    }

    /// All gateways in id order.
    pub fn gateways(&self) -> impl Iterator<Item = &Gateway> {
        self.gateways.values()
    }

    /// A gateway by id.
    pub fn gateway(&self, id: gw_core::GatewayId) -> Option<&Gateway> {
        self.gateways.get(&id)
    }

    // -----------------------------------------------------------------------
    // Events
    // -----------------------------------------------------------------------

    /// Events raised since the last flush.
    pub fn get_events(&self) -> &[WorldEventKind] {
        &self.events
    }

    /// Drop pending events.
    pub fn clear_events(&mut self) {
        self.events.clear();
    }

    /// Hand over pending events and clear the buffer.
    pub fn take_events(&mut self) -> Vec<WorldEventKind> {
        std::mem::take(&mut self.events)
    }

    /// Append an event raised on behalf of the map by a domain service.
    pub fn record_event(&mut self, event: WorldEventKind) {
        self.events.push(event);
    }
}
