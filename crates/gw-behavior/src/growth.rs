use gw_combat::GrowthStage;

use crate::config::BehaviorConfig;

/// How a monster's age bends its behaviour.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrowthContext {
    /// Whether the monster may chase targets at all.
    pub allow_chase: bool,
    /// Added to the flee threshold.
    pub flee_threshold_modifier: f64,
    /// Added to each enrage threshold.
    pub enrage_threshold_modifier: f64,
}

impl Default for GrowthContext {
    fn default() -> Self {
        Self {
            allow_chase: true,
            flee_threshold_modifier: 0.0,
            enrage_threshold_modifier: 0.0,
        }
    }
}

impl GrowthContext {
    /// Modifiers of a growth stage.
    pub fn for_stage(stage: GrowthStage, config: &BehaviorConfig) -> Self {
        match stage {
            GrowthStage::Juvenile => Self {
                allow_chase: false,
                flee_threshold_modifier: config.juvenile_flee_bonus,
                enrage_threshold_modifier: 0.0,
            },
            GrowthStage::Adult => Self::default(),
            GrowthStage::Elder => Self {
                allow_chase: true,
                flee_threshold_modifier: -config.elder_flee_reduction,
                enrage_threshold_modifier: config.elder_enrage_bonus,
            },
        }
    }

    /// Flee threshold after modifiers, within `0..=1`.
    pub fn effective_flee_threshold(&self, base: f64) -> f64 {
        if base <= 0.0 && self.flee_threshold_modifier <= 0.0 {
            return 0.0;
        }
        (base + self.flee_threshold_modifier).clamp(0.0, 1.0)
    }

    /// The highest enrage threshold after modifiers, if any.
    pub fn enrage_threshold(&self, phase_thresholds: &[f64]) -> Option<f64> {
        phase_thresholds
            .iter()
            .map(|t| (t + self.enrage_threshold_modifier).clamp(0.0, 1.0))
            .fold(None, |best: Option<f64>, t| Some(best.map_or(t, |b| b.max(t))))
    }
}
