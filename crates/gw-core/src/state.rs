use std::fmt;

use serde::{Deserialize, Serialize};

/// States of the autonomous-actor state machine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BehaviorState {
    /// Standing still with nothing to do.
    #[default]
    Idle,
    /// Walking a patrol route.
    Patrol,
    /// Pursuing a target.
    Chase,
    /// Looking for a lost target at its last known position.
    Search,
    /// Running away from a threat.
    Flee,
    /// Walking back to the home coordinate.
    Return,
    /// Low-health combat mode with boosted damage.
    Enrage,
}

impl BehaviorState {
    /// States in which the actor is engaged with a target.
    pub fn is_combat(self) -> bool {
        matches!(self, Self::Chase | Self::Enrage)
    }
}

impl fmt::Display for BehaviorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Idle => "idle",
            Self::Patrol => "patrol",
            Self::Chase => "chase",
            Self::Search => "search",
            Self::Flee => "flee",
            Self::Return => "return",
            Self::Enrage => "enrage",
        };
        f.write_str(label)
    }
}

/// How one actor regards another.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Disposition {
    /// Ignored.
    #[default]
    Neutral,
    /// Never attacked.
    Ally,
    /// Attacked on sight.
    Hostile,
    /// Hunted when hungry.
    Prey,
    /// Fled from.
    Threat,
}

impl Disposition {
    /// Whether the disposition makes the other actor a chase candidate.
    pub fn is_target(self) -> bool {
        matches!(self, Self::Hostile | Self::Prey)
    }
}

/// Weather conditions of a zone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WeatherType {
    /// No clouds.
    #[default]
    Clear,
    /// Overcast.
    Cloudy,
    /// Rainfall.
    Rain,
    /// Thunderstorm.
    Storm,
    /// Thick fog.
    Fog,
    /// Snowfall.
    Snow,
    /// Heavy snow and wind.
    Blizzard,
}

impl WeatherType {
    /// Multiplier applied to vision ranges.
    pub fn vision_multiplier(self) -> f64 {
        match self {
            Self::Clear => 1.0,
            Self::Cloudy => 0.9,
            Self::Rain => 0.7,
            Self::Storm => 0.5,
            Self::Fog => 0.4,
            Self::Snow => 0.7,
            Self::Blizzard => 0.3,
        }
    }
}

impl fmt::Display for WeatherType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Clear => "clear",
            Self::Cloudy => "cloudy",
            Self::Rain => "rain",
            Self::Storm => "storm",
            Self::Fog => "fog",
            Self::Snow => "snow",
            Self::Blizzard => "blizzard",
        };
        f.write_str(label)
    }
}

/// The race of an actor, used by hostility tables.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Race {
    /// Player characters and townsfolk.
    Human,
    /// Wolves, bears, boars.
    Beast,
    /// Goblins and kobolds.
    Goblin,
    /// Skeletons and ghosts.
    Undead,
    /// Dragons.
    Dragon,
    /// Small harmless critters.
    Critter,
    /// A race not covered by the built-in kinds.
    Custom(String),
}

impl fmt::Display for Race {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Human => write!(f, "human"),
            Self::Beast => write!(f, "beast"),
            Self::Goblin => write!(f, "goblin"),
            Self::Undead => write!(f, "undead"),
            Self::Dragon => write!(f, "dragon"),
            Self::Critter => write!(f, "critter"),
            Self::Custom(s) => write!(f, "{s}"),
        }
    }
}
