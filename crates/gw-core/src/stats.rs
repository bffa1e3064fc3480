//! Combat stat value objects.
//!
//! `Hp` and `Mp` come in two flavours: `new` validates and rejects
//! out-of-range input, `create` clamps into range. Damage and healing go
//! through the clamping path so a pool never leaves `0..=max`.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Hit points: a current value bounded by a maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hp {
    current: u32,
    max: u32,
}

impl Hp {
    /// Checked constructor: `max` must be positive and `current <= max`.
    pub fn new(current: u32, max: u32) -> CoreResult<Self> {
        if max == 0 {
            return Err(CoreError::validation("max hp must be positive"));
        }
        if current > max {
            return Err(CoreError::validation(format!(
                "hp {current} exceeds max {max}"
            )));
        }
        Ok(Self { current, max })
    }

    /// Clamping constructor: `current` is clamped into `0..=max`, `max` to at least 1.
    pub fn create(current: i64, max: u32) -> Self {
        let max = max.max(1);
        let current = current.clamp(0, i64::from(max)) as u32;
        Self { current, max }
    }

    /// A full pool.
    pub fn full(max: u32) -> Self {
        Self::create(i64::from(max), max)
    }

    /// Current hit points.
    pub fn current(self) -> u32 {
        self.current
    }

    /// Maximum hit points.
    pub fn max(self) -> u32 {
        self.max
    }

    /// Fraction of hit points left, `0.0..=1.0`.
    pub fn percentage(self) -> f64 {
        f64::from(self.current) / f64::from(self.max)
    }

    /// True when no hit points remain.
    pub fn is_depleted(self) -> bool {
        self.current == 0
    }

    /// Pool after taking `amount` damage.
    pub fn damaged(self, amount: u32) -> Self {
        Self::create(i64::from(self.current) - i64::from(amount), self.max)
    }

    /// Pool after healing `amount`.
    pub fn healed(self, amount: u32) -> Self {
        Self::create(i64::from(self.current) + i64::from(amount), self.max)
    }
}

/// Mana points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mp {
    current: u32,
    max: u32,
}

impl Mp {
    /// Checked constructor: `current <= max`.
    pub fn new(current: u32, max: u32) -> CoreResult<Self> {
        if current > max {
            return Err(CoreError::validation(format!(
                "mp {current} exceeds max {max}"
            )));
        }
        Ok(Self { current, max })
    }

    /// Clamping constructor.
    pub fn create(current: i64, max: u32) -> Self {
        let current = current.clamp(0, i64::from(max)) as u32;
        Self { current, max }
    }

    /// A full pool.
    pub fn full(max: u32) -> Self {
        Self { current: max, max }
    }

    /// Current mana.
    pub fn current(self) -> u32 {
        self.current
    }

    /// Maximum mana.
    pub fn max(self) -> u32 {
        self.max
    }

    /// Whether `cost` can be paid.
    pub fn can_afford(self, cost: u32) -> bool {
        self.current >= cost
    }

    /// Pool after spending `cost`, or `None` if it cannot be paid.
    pub fn spent(self, cost: u32) -> Option<Self> {
        self.current.checked_sub(cost).map(|current| Self {
            current,
            max: self.max,
        })
    }

    /// Pool after regenerating `amount`.
    pub fn regenerated(self, amount: u32) -> Self {
        Self::create(i64::from(self.current) + i64::from(amount), self.max)
    }
}

/// Offensive and defensive stats. Snapshotted into hit boxes at cast time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BaseStats {
    /// Raw attack power.
    pub attack: u32,
    /// Flat damage reduction.
    pub defense: u32,
    /// Chance of a critical hit, `0.0..=1.0`.
    pub crit_chance: f64,
    /// Damage multiplier on a critical hit, `>= 1.0`.
    pub crit_multiplier: f64,
}

impl Default for BaseStats {
    fn default() -> Self {
        Self {
            attack: 10,
            defense: 0,
            crit_chance: 0.0,
            crit_multiplier: 1.5,
        }
    }
}

impl BaseStats {
    /// Checked constructor.
    pub fn new(attack: u32, defense: u32, crit_chance: f64, crit_multiplier: f64) -> CoreResult<Self> {
        if !(0.0..=1.0).contains(&crit_chance) {
            return Err(CoreError::validation(format!(
                "crit chance {crit_chance} outside 0..=1"
            )));
        }
        if !(crit_multiplier.is_finite() && crit_multiplier >= 1.0) {
            return Err(CoreError::validation(format!(
                "crit multiplier {crit_multiplier} below 1"
            )));
        }
        Ok(Self {
            attack,
            defense,
            crit_chance,
            crit_multiplier,
        })
    }
}
