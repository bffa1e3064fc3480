//! Monster templates: the injected design data a monster is spawned from.

use gw_core::{
    BaseStats, Coordinate, ItemId, MonsterId, MovementCapability, PackId, Race, TemplateId,
};
use gw_map::{ActorComponent, AutonomousBehaviorComponent};
use serde::{Deserialize, Serialize};

use crate::skill::SkillSpec;

/// Life stage of a monster, by age.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrowthStage {
    /// Young: timid, never chases.
    Juvenile,
    /// Grown.
    #[default]
    Adult,
    /// Old: bold, enrages early.
    Elder,
}

/// The age at which a stage begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrowthStageDefinition {
    /// The stage.
    pub stage: GrowthStage,
    /// Ticks since spawn at which it starts.
    pub min_age_ticks: u64,
}

/// How a monster picks among visible targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetPriority {
    /// Closest by Euclidean distance.
    #[default]
    Nearest,
    /// Most accumulated threat.
    HighestThreat,
}

/// Senses and temperament of a template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorProfile {
    /// Vision radius in cells.
    pub vision_range: u32,
    /// Field of view; 360 sees all around.
    pub fov_degrees: f64,
    /// HP fraction at or below which the monster flees.
    pub flee_threshold: f64,
    /// HP fractions that trigger enrage.
    pub phase_thresholds: Vec<f64>,
    /// Maximum distance from home.
    pub leash_distance: u32,
    /// Failed steps before giving up.
    pub max_move_failures: u32,
    /// Ticks spent looking for a lost target.
    pub search_duration: u64,
    /// Hunger gained per tick.
    pub hunger_rate: f64,
    /// Hunger at which prey becomes a target.
    pub hunt_hunger_threshold: f64,
    /// Target selection.
    pub target_priority: TargetPriority,
    /// Patrol route relative to the spawn point.
    pub patrol_offsets: Vec<(i32, i32)>,
}

impl Default for BehaviorProfile {
    fn default() -> Self {
        Self {
            vision_range: 6,
            fov_degrees: 360.0,
            flee_threshold: 0.0,
            phase_thresholds: Vec::new(),
            leash_distance: 12,
            max_move_failures: 3,
            search_duration: 5,
            hunger_rate: 0.0,
            hunt_hunger_threshold: 0.5,
            target_priority: TargetPriority::Nearest,
            patrol_offsets: Vec::new(),
        }
    }
}

/// An item a dead monster may leave behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LootEntry {
    /// Dropped item.
    pub item_id: ItemId,
    /// Stack size.
    pub quantity: u32,
}

/// Design data of a monster kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonsterTemplate {
    /// Template id.
    pub id: TemplateId,
    /// Display name.
    pub name: String,
    /// Race, for hostility lookup.
    pub race: Race,
    /// Terrain it can move through.
    #[serde(default)]
    pub capability: MovementCapability,
    /// Maximum hit points.
    pub max_hp: u32,
    /// Maximum mana.
    #[serde(default)]
    pub max_mp: u32,
    /// Combat stats.
    #[serde(default)]
    pub stats: BaseStats,
    /// Skills by slot.
    #[serde(default)]
    pub skills: Vec<SkillSpec>,
    /// AI tuning.
    #[serde(default)]
    pub behavior: BehaviorProfile,
    /// Stages by starting age. Empty means always adult.
    #[serde(default)]
    pub growth_stages: Vec<GrowthStageDefinition>,
    /// Drops on death.
    #[serde(default)]
    pub loot: Vec<LootEntry>,
    /// Hunger removed from whoever kills it.
    #[serde(default)]
    pub feed_value: f64,
    /// Pack shared by monsters of this template.
    #[serde(default)]
    pub pack_id: Option<PackId>,
}

impl MonsterTemplate {
    /// A walker with a basic attack and default behaviour.
    pub fn new(id: TemplateId, name: impl Into<String>, race: Race, max_hp: u32) -> Self {
        Self {
            id,
            name: name.into(),
            race,
            capability: MovementCapability::walker(),
            max_hp,
            max_mp: 0,
            stats: BaseStats::default(),
            skills: vec![SkillSpec::basic_attack()],
            behavior: BehaviorProfile::default(),
            growth_stages: Vec::new(),
            loot: Vec::new(),
            feed_value: 0.0,
            pack_id: None,
        }
    }

    /// Set the stats.
    pub fn with_stats(mut self, stats: BaseStats) -> Self {
        self.stats = stats;
        self
    }

    /// Set the mana pool.
    pub fn with_mp(mut self, max_mp: u32) -> Self {
        self.max_mp = max_mp;
        self
    }

    /// Replace the skill list.
    pub fn with_skills(mut self, skills: Vec<SkillSpec>) -> Self {
        self.skills = skills;
        self
    }

    /// Set the behaviour profile.
    pub fn with_behavior(mut self, behavior: BehaviorProfile) -> Self {
        self.behavior = behavior;
        self
    }

    /// Set growth stages; kept sorted by starting age.
    pub fn with_growth(mut self, mut stages: Vec<GrowthStageDefinition>) -> Self {
        stages.sort_by_key(|s| s.min_age_ticks);
        self.growth_stages = stages;
        self
    }

    /// Set the loot list.
    pub fn with_loot(mut self, loot: Vec<LootEntry>) -> Self {
        self.loot = loot;
        self
    }

    /// Set the capability.
    pub fn with_capability(mut self, capability: MovementCapability) -> Self {
        self.capability = capability;
        self
    }

    /// Set the pack.
    pub fn with_pack(mut self, pack_id: PackId) -> Self {
        self.pack_id = Some(pack_id);
        self
    }

    /// Set the feed value.
    pub fn with_feed_value(mut self, feed_value: f64) -> Self {
        self.feed_value = feed_value;
        self
    }

    /// Stage of a monster that is `age_ticks` old.
    pub fn growth_stage_at(&self, age_ticks: u64) -> GrowthStage {
        self.growth_stages
            .iter()
            .rev()
            .find(|s| s.min_age_ticks <= age_ticks)
            .map(|s| s.stage)
            .unwrap_or_default()
    }

    /// The map component of a freshly spawned monster at `home`.
    pub fn behavior_component(&self, monster_id: MonsterId, home: Coordinate) -> AutonomousBehaviorComponent {
        let mut actor = ActorComponent::new(self.race.clone(), self.capability);
        if let Some(pack_id) = self.pack_id {
            actor = actor.with_pack(pack_id);
        }
        let b = &self.behavior;
        let patrol: Vec<Coordinate> = b
            .patrol_offsets
            .iter()
            .filter_map(|(dx, dy)| home.try_offset(*dx, *dy, 0))
            .collect();
        let mut component = AutonomousBehaviorComponent::new(actor, home)
            .with_monster(monster_id)
            .with_vision(b.vision_range, b.fov_degrees)
            .with_flee_threshold(b.flee_threshold)
            .with_phase_thresholds(b.phase_thresholds.clone())
            .with_leash(b.leash_distance)
            .with_hunger(b.hunger_rate, b.hunt_hunger_threshold)
            .with_max_move_failures(b.max_move_failures)
            .with_search_duration(b.search_duration);
        if !patrol.is_empty() {
            component = component.with_patrol(patrol);
        }
        component
    }
}

#[cfg(test)]
mod tests {
    use gw_core::BehaviorState;

    use super::*;

    fn wolf() -> MonsterTemplate {
        MonsterTemplate::new(TemplateId::new(1).unwrap(), "wolf", Race::Beast, 30).with_growth(vec![
            GrowthStageDefinition {
                stage: GrowthStage::Elder,
                min_age_ticks: 100,
            },
            GrowthStageDefinition {
                stage: GrowthStage::Juvenile,
                min_age_ticks: 0,
            },
            GrowthStageDefinition {
                stage: GrowthStage::Adult,
                min_age_ticks: 20,
            },
        ])
    }

    #[test]
    fn growth_stage_by_age() {
        let t = wolf();
        assert_eq!(t.growth_stage_at(0), GrowthStage::Juvenile);
        assert_eq!(t.growth_stage_at(20), GrowthStage::Adult);
        assert_eq!(t.growth_stage_at(150), GrowthStage::Elder);
    }

    #[test]
    fn no_stages_means_adult() {
        let t = MonsterTemplate::new(TemplateId::new(2).unwrap(), "rat", Race::Critter, 5);
        assert_eq!(t.growth_stage_at(1_000), GrowthStage::Adult);
    }

    #[test]
    fn behavior_component_from_profile() {
        let t = wolf()
            .with_pack(PackId::new(3).unwrap())
            .with_behavior(BehaviorProfile {
                vision_range: 8,
                flee_threshold: 0.3,
                patrol_offsets: vec![(2, 0), (-20, 0), (0, 2)],
                ..BehaviorProfile::default()
            });
        let home = Coordinate::planar(5, 5).unwrap();
        let c = t.behavior_component(MonsterId::new(9).unwrap(), home);
        assert_eq!(c.monster_id, MonsterId::new(9).ok());
        assert_eq!(c.vision_range, 8);
        assert_eq!(c.flee_threshold, 0.3);
        assert_eq!(c.actor.pack_id, PackId::new(3).ok());
        assert_eq!(c.patrol_points.len(), 2);
        assert_eq!(c.state, BehaviorState::Patrol);
        assert_eq!(c.home, home);
    }

    #[test]
    fn template_from_json() {
        let json = r#"{ "id": 4, "name": "slime", "race": "critter", "max_hp": 12 }"#;
        let t: MonsterTemplate = serde_json::from_str(json).unwrap();
        assert_eq!(t.max_hp, 12);
        assert!(t.skills.is_empty());
        assert_eq!(t.behavior.vision_range, 6);
    }
}
