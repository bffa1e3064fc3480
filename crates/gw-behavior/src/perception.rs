//! What an autonomous actor can see this tick.

use gw_core::{Coordinate, Direction, Disposition, SpotId, WeatherType, WorldObjectId, WorldTick};
use gw_map::{MapGeometryService, ObjectType, PhysicalMapAggregate};
use tracing::trace;

use crate::disposition::DispositionResolver;
use crate::error::{BehaviorError, BehaviorResult};

/// An actor in view.
#[derive(Debug, Clone, PartialEq)]
pub struct VisibleObject {
    /// The seen object.
    pub object_id: WorldObjectId,
    /// Its kind.
    pub object_type: ObjectType,
    /// Where it stands.
    pub coordinate: Coordinate,
    /// How the observer regards it.
    pub disposition: Disposition,
    /// Euclidean distance from the observer.
    pub distance: f64,
}

/// Everything the behaviour engine knows about the world this tick.
#[derive(Debug, Clone, PartialEq)]
pub struct BehaviorObservation {
    /// Map of the observer.
    pub spot_id: SpotId,
    /// The observer.
    pub actor_id: WorldObjectId,
    /// Observer's cell.
    pub position: Coordinate,
    /// Observer's hit points as a fraction.
    pub hp_percentage: f64,
    /// Weather over the map.
    pub weather: Option<WeatherType>,
    /// Actors in view, nearest first.
    pub visible: Vec<VisibleObject>,
    /// Tick of the observation.
    pub current_tick: WorldTick,
}

impl BehaviorObservation {
    /// An observation with nothing in view.
    pub fn blind(spot_id: SpotId, actor_id: WorldObjectId, position: Coordinate, hp_percentage: f64, current_tick: WorldTick) -> Self {
        Self {
            spot_id,
            actor_id,
            position,
            hp_percentage,
            weather: None,
            visible: Vec::new(),
            current_tick,
        }
    }

    /// Add a visible object, keeping nearest-first order.
    pub fn with_visible(mut self, object: VisibleObject) -> Self {
        self.visible.push(object);
        sort_visible(&mut self.visible);
        self
    }

    /// A visible object by id.
    pub fn find(&self, id: WorldObjectId) -> Option<&VisibleObject> {
        self.visible.iter().find(|v| v.object_id == id)
    }

    /// The nearest visible threat.
    pub fn nearest_threat(&self) -> Option<&VisibleObject> {
        self.visible.iter().find(|v| v.disposition == Disposition::Threat)
    }

    /// Objects worth chasing. Prey only counts while `hunting`.
    pub fn targets(&self, hunting: bool) -> Vec<&VisibleObject> {
        self.visible
            .iter()
            .filter(|v| match v.disposition {
                Disposition::Hostile => true,
                Disposition::Prey => hunting,
                _ => false,
            })
            .collect()
    }
}

fn sort_visible(visible: &mut [VisibleObject]) {
    visible.sort_by(|a, b| a.distance.total_cmp(&b.distance).then(a.object_id.cmp(&b.object_id)));
}

/// Builds observations from the map.
#[derive(Debug, Clone, Copy, Default)]
pub struct PerceptionService;

impl PerceptionService {
    /// What `actor_id` sees: actors within its weather-scaled vision range,
    /// inside its field of view and with a clear line of sight.
    pub fn observe(
        map: &PhysicalMapAggregate,
        actor_id: WorldObjectId,
        hp_percentage: f64,
        weather: Option<WeatherType>,
        resolver: &DispositionResolver<'_>,
        current_tick: WorldTick,
    ) -> BehaviorResult<BehaviorObservation> {
        let me = map.object_or_err(actor_id)?;
        let behavior = me
            .component
            .behavior()
            .ok_or(BehaviorError::NotAutonomous(actor_id))?;
        let position = me.coordinate();
        let multiplier = weather.map_or(1.0, WeatherType::vision_multiplier);
        let range = (f64::from(behavior.vision_range) * multiplier).round().max(0.0);

        let mut visible: Vec<VisibleObject> = map
            .objects_in_range(position, range as u32)
            .into_iter()
            .filter(|o| o.id != actor_id)
            .filter_map(|o| {
                let other = o.component.actor()?;
                let distance = position.euclidean_distance(o.coordinate());
                if distance > range {
                    return None;
                }
                if !in_field_of_view(position, behavior.actor.direction, behavior.fov_degrees, o.coordinate()) {
                    return None;
                }
                if !MapGeometryService::is_visible(map, position, o.coordinate()) {
                    return None;
                }
                Some(VisibleObject {
                    object_id: o.id,
                    object_type: o.object_type,
                    coordinate: o.coordinate(),
                    disposition: resolver.resolve(&behavior.actor, other),
                    distance,
                })
            })
            .collect();
        sort_visible(&mut visible);
        trace!(actor = %actor_id, seen = visible.len(), range, "observed");

        Ok(BehaviorObservation {
            spot_id: map.spot_id(),
            actor_id,
            position,
            hp_percentage,
            weather,
            visible,
            current_tick,
        })
    }
}

/// Whether `target` lies inside a cone of `fov_degrees` around `facing`.
///
/// A field of view of 360 or more, a vertical facing, or a target on the
/// observer's own cell always pass.
pub fn in_field_of_view(from: Coordinate, facing: Direction, fov_degrees: f64, target: Coordinate) -> bool {
    if fov_degrees >= 360.0 {
        return true;
    }
    let Some(heading) = facing.heading_degrees() else {
        return true;
    };
    let dx = f64::from(target.x() - from.x());
    let dy = f64::from(target.y() - from.y());
    if dx == 0.0 && dy == 0.0 {
        return true;
    }
    // Clockwise from north, north being -y.
    let bearing = dx.atan2(-dy).to_degrees().rem_euclid(360.0);
    let offset = (bearing - heading + 540.0).rem_euclid(360.0) - 180.0;
    offset.abs() <= fov_degrees / 2.0
}

#[cfg(test)]
mod tests {
    use gw_core::{MovementCapability, PackId, Race};
    use gw_map::{ActorComponent, AutonomousBehaviorComponent, WorldObject};

    use super::*;
    use crate::disposition::{PackAllegianceService, RaceHostilityService};

    fn c(x: i32, y: i32) -> Coordinate {
        Coordinate::planar(x, y).unwrap()
    }

    fn oid(v: u64) -> WorldObjectId {
        WorldObjectId::new(v).unwrap()
    }

    fn wolf(id: u64, at: Coordinate, fov: f64, facing: Direction) -> WorldObject {
        let mut actor = ActorComponent::new(Race::Beast, MovementCapability::walker()).with_pack(PackId::new(1).unwrap());
        actor.direction = facing;
        WorldObject::monster(oid(id), at, AutonomousBehaviorComponent::new(actor, at).with_vision(5, fov))
    }

    fn observe(map: &PhysicalMapAggregate, weather: Option<WeatherType>) -> BehaviorObservation {
        let hostility = RaceHostilityService::standard();
        let allegiance = PackAllegianceService;
        let resolver = DispositionResolver::new(&allegiance, &hostility);
        PerceptionService::observe(map, oid(1), 1.0, weather, &resolver, WorldTick(1)).unwrap()
    }

    #[test]
    fn sees_players_and_packmates_in_range() {
        let mut map = PhysicalMapAggregate::from_ascii(
            SpotId::new(1).unwrap(),
            &["..........", "..........", "..........", ".........."],
        )
        .unwrap();
        map.add_object(wolf(1, c(1, 1), 360.0, Direction::South)).unwrap();
        map.add_object(wolf(2, c(2, 1), 360.0, Direction::South)).unwrap();
        map.add_object(WorldObject::player(oid(3), c(4, 2))).unwrap();
        map.add_object(WorldObject::player(oid(4), c(9, 1))).unwrap();

        let obs = observe(&map, None);
        let ids: Vec<_> = obs.visible.iter().map(|v| v.object_id).collect();
        assert_eq!(ids, vec![oid(2), oid(3)]);
        assert_eq!(obs.visible[0].disposition, Disposition::Ally);
        assert_eq!(obs.visible[1].disposition, Disposition::Hostile);
        assert_eq!(obs.targets(false).len(), 1);
    }

    #[test]
    fn walls_block_sight() {
        let mut map = PhysicalMapAggregate::from_ascii(SpotId::new(1).unwrap(), &[".#.."]).unwrap();
        map.add_object(wolf(1, c(0, 0), 360.0, Direction::East)).unwrap();
        map.add_object(WorldObject::player(oid(3), c(2, 0))).unwrap();
        assert!(observe(&map, None).visible.is_empty());
    }

    #[test]
    fn player_hiding_in_forest_is_not_seen() {
        let mut map = PhysicalMapAggregate::from_ascii(SpotId::new(1).unwrap(), &["..T.."]).unwrap();
        map.add_object(wolf(1, c(0, 0), 360.0, Direction::East)).unwrap();
        map.add_object(WorldObject::player(oid(3), c(2, 0))).unwrap();
        assert!(observe(&map, None).visible.is_empty());
    }

    #[test]
    fn fog_shortens_vision() {
        let mut map = PhysicalMapAggregate::from_ascii(SpotId::new(1).unwrap(), &["........"]).unwrap();
        map.add_object(wolf(1, c(0, 0), 360.0, Direction::East)).unwrap();
        map.add_object(WorldObject::player(oid(3), c(4, 0))).unwrap();
        assert_eq!(observe(&map, None).visible.len(), 1);
        assert!(observe(&map, Some(WeatherType::Fog)).visible.is_empty());
        assert_eq!(observe(&map, Some(WeatherType::Cloudy)).visible.len(), 1);
    }

    #[test]
    fn field_of_view_cone() {
        let from = c(5, 5);
        assert!(in_field_of_view(from, Direction::North, 90.0, c(5, 1)));
        assert!(in_field_of_view(from, Direction::North, 90.0, c(6, 3)));
        assert!(!in_field_of_view(from, Direction::North, 90.0, c(8, 4)));
        assert!(!in_field_of_view(from, Direction::North, 90.0, c(5, 8)));
        assert!(!in_field_of_view(from, Direction::East, 90.0, c(2, 5)));
        assert!(in_field_of_view(from, Direction::East, 360.0, c(2, 5)));
    }

    #[test]
    fn narrow_fov_hides_actors_behind() {
        let mut map = PhysicalMapAggregate::from_ascii(SpotId::new(1).unwrap(), &["......."]).unwrap();
        map.add_object(wolf(1, c(3, 0), 90.0, Direction::East)).unwrap();
        map.add_object(WorldObject::player(oid(3), c(1, 0))).unwrap();
        map.add_object(WorldObject::player(oid(4), c(5, 0))).unwrap();
        let obs = observe(&map, None);
        assert_eq!(obs.visible.len(), 1);
        assert_eq!(obs.visible[0].object_id, oid(4));
    }

    #[test]
    fn non_autonomous_rejected() {
        let mut map = PhysicalMapAggregate::from_ascii(SpotId::new(1).unwrap(), &["..."]).unwrap();
        map.add_object(WorldObject::player(oid(1), c(0, 0))).unwrap();
        let hostility = RaceHostilityService::standard();
        let allegiance = PackAllegianceService;
        let resolver = DispositionResolver::new(&allegiance, &hostility);
        let err = PerceptionService::observe(&map, oid(1), 1.0, None, &resolver, WorldTick(0)).unwrap_err();
        assert_eq!(err, BehaviorError::NotAutonomous(oid(1)));
    }
}
