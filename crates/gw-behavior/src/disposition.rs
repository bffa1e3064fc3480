//! How one actor regards another.
//!
//! Two independent questions decide a disposition: are we allies
//! ([`AllegianceService`]), and if not, what does our race think of theirs
//! ([`HostilityService`]). Both are pure lookups over components.

use std::collections::BTreeMap;

use gw_core::{Disposition, Race};
use gw_map::ActorComponent;

/// Decides whether two actors fight on the same side.
pub trait AllegianceService: std::fmt::Debug {
    /// Whether `other` is an ally of `actor`.
    fn is_ally(&self, actor: &ActorComponent, other: &ActorComponent) -> bool;
}

/// Decides the stance of one race toward another.
pub trait HostilityService: std::fmt::Debug {
    /// Stance of `actor` toward `other`.
    fn disposition(&self, actor: &Race, other: &Race) -> Disposition;
}

/// Actors sharing a pack are allies.
#[derive(Debug, Clone, Copy, Default)]
pub struct PackAllegianceService;

impl AllegianceService for PackAllegianceService {
    fn is_ally(&self, actor: &ActorComponent, other: &ActorComponent) -> bool {
        matches!((actor.pack_id, other.pack_id), (Some(a), Some(b)) if a == b)
    }
}

/// A race-to-race table with a fallback.
#[derive(Debug, Clone, PartialEq)]
pub struct RaceHostilityService {
    table: BTreeMap<(Race, Race), Disposition>,
    fallback: Disposition,
}

impl Default for RaceHostilityService {
    fn default() -> Self {
        Self::new(Disposition::Neutral)
    }
}

impl RaceHostilityService {
    /// An empty table answering `fallback`.
    pub fn new(fallback: Disposition) -> Self {
        Self {
            table: BTreeMap::new(),
            fallback,
        }
    }

    /// Add one directed entry.
    pub fn with_entry(mut self, actor: Race, other: Race, disposition: Disposition) -> Self {
        self.table.insert((actor, other), disposition);
        self
    }

    /// The stock table of the arena: beasts and goblins hunt humans, beasts
    /// prey on critters, critters run from everything, dragons scare all.
    pub fn standard() -> Self {
        use Disposition::{Hostile, Prey, Threat};
        use Race::{Beast, Critter, Dragon, Goblin, Human, Undead};
        Self::default()
            .with_entry(Beast, Human, Hostile)
            .with_entry(Beast, Critter, Prey)
            .with_entry(Beast, Dragon, Threat)
            .with_entry(Goblin, Human, Hostile)
            .with_entry(Goblin, Dragon, Threat)
            .with_entry(Undead, Human, Hostile)
            .with_entry(Undead, Beast, Hostile)
            .with_entry(Undead, Goblin, Hostile)
            .with_entry(Dragon, Human, Hostile)
            .with_entry(Dragon, Beast, Prey)
            .with_entry(Critter, Human, Threat)
            .with_entry(Critter, Beast, Threat)
            .with_entry(Human, Undead, Hostile)
    }
}

impl HostilityService for RaceHostilityService {
    fn disposition(&self, actor: &Race, other: &Race) -> Disposition {
        self.table
            .get(&(actor.clone(), other.clone()))
            .copied()
            .unwrap_or(self.fallback)
    }
}

/// Combines allegiance and hostility into one answer.
#[derive(Debug)]
pub struct DispositionResolver<'a> {
    allegiance: &'a dyn AllegianceService,
    hostility: &'a dyn HostilityService,
}

impl<'a> DispositionResolver<'a> {
    /// A resolver over the two services.
    pub fn new(allegiance: &'a dyn AllegianceService, hostility: &'a dyn HostilityService) -> Self {
        Self { allegiance, hostility }
    }

    /// Stance of `actor` toward `other`. Allies are never hostile.
    pub fn resolve(&self, actor: &ActorComponent, other: &ActorComponent) -> Disposition {
        if self.allegiance.is_ally(actor, other) {
            return Disposition::Ally;
        }
        self.hostility.disposition(&actor.race, &other.race)
    }
}

#[cfg(test)]
mod tests {
    use gw_core::{MovementCapability, PackId};

    use super::*;

    fn actor(race: Race, pack: Option<u64>) -> ActorComponent {
        let a = ActorComponent::new(race, MovementCapability::walker());
        match pack {
            Some(p) => a.with_pack(PackId::new(p).unwrap()),
            None => a,
        }
    }

    #[test]
    fn pack_members_are_allies() {
        let s = PackAllegianceService;
        assert!(s.is_ally(&actor(Race::Beast, Some(1)), &actor(Race::Beast, Some(1))));
        assert!(!s.is_ally(&actor(Race::Beast, Some(1)), &actor(Race::Beast, Some(2))));
        assert!(!s.is_ally(&actor(Race::Beast, None), &actor(Race::Beast, None)));
    }

    #[test]
    fn table_lookup_is_directed() {
        let s = RaceHostilityService::standard();
        assert_eq!(s.disposition(&Race::Beast, &Race::Human), Disposition::Hostile);
        assert_eq!(s.disposition(&Race::Critter, &Race::Human), Disposition::Threat);
        assert_eq!(s.disposition(&Race::Human, &Race::Beast), Disposition::Neutral);
        assert_eq!(
            s.disposition(&Race::Custom("slime".into()), &Race::Human),
            Disposition::Neutral
        );
    }

    #[test]
    fn allegiance_beats_hostility() {
        let hostility = RaceHostilityService::default().with_entry(Race::Undead, Race::Undead, Disposition::Hostile);
        let allegiance = PackAllegianceService;
        let resolver = DispositionResolver::new(&allegiance, &hostility);
        assert_eq!(
            resolver.resolve(&actor(Race::Undead, Some(4)), &actor(Race::Undead, Some(4))),
            Disposition::Ally
        );
        assert_eq!(
            resolver.resolve(&actor(Race::Undead, Some(4)), &actor(Race::Undead, None)),
            Disposition::Hostile
        );
    }
}
