//! Damage resolution for recorded hits.

use gw_core::BaseStats;
use rand::Rng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

/// Inputs of one damage roll.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamageInput {
    /// Attacker stats, snapshotted when the hit box was created.
    pub attacker: BaseStats,
    /// Flat reduction of the victim.
    pub defense: u32,
    /// Hit box power (already includes any enrage bonus).
    pub power_multiplier: f64,
}

/// Outcome of a damage roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageResult {
    /// Hit points to remove. Never below 1.
    pub amount: u32,
    /// Whether the crit roll succeeded.
    pub critical: bool,
}

/// Turns a hit into hit point loss.
#[derive(Debug, Clone, Copy, Default)]
pub struct DamageCalculator;

impl DamageCalculator {
    /// Roll damage: `attack * power`, times the crit multiplier on a crit,
    /// minus defense, at least 1.
    pub fn calculate(input: &DamageInput, rng: &mut StdRng) -> DamageResult {
        let mut raw = f64::from(input.attacker.attack) * input.power_multiplier.max(0.0);
        let chance = input.attacker.crit_chance.clamp(0.0, 1.0);
        let critical = chance > 0.0 && rng.random_bool(chance);
        if critical {
            raw *= input.attacker.crit_multiplier.max(1.0);
        }
        let reduced = (raw - f64::from(input.defense)).floor();
        let amount = if reduced >= 1.0 { reduced.min(f64::from(u32::MAX)) as u32 } else { 1 };
        DamageResult { amount, critical }
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;

    fn input(attack: u32, defense: u32, power: f64) -> DamageInput {
        DamageInput {
            attacker: BaseStats::new(attack, 0, 0.0, 2.0).unwrap(),
            defense,
            power_multiplier: power,
        }
    }

    #[test]
    fn attack_minus_defense() {
        let mut rng = StdRng::seed_from_u64(1);
        let result = DamageCalculator::calculate(&input(10, 3, 1.0), &mut rng);
        assert_eq!(result, DamageResult { amount: 7, critical: false });
    }

    #[test]
    fn power_scales_before_defense() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(DamageCalculator::calculate(&input(10, 5, 1.5), &mut rng).amount, 10);
    }

    #[test]
    fn minimum_one() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(DamageCalculator::calculate(&input(2, 50, 1.0), &mut rng).amount, 1);
        assert_eq!(DamageCalculator::calculate(&input(10, 0, 0.0), &mut rng).amount, 1);
    }

    #[test]
    fn guaranteed_crit() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut i = input(10, 2, 1.0);
        i.attacker.crit_chance = 1.0;
        let result = DamageCalculator::calculate(&i, &mut rng);
        assert!(result.critical);
        assert_eq!(result.amount, 18);
    }

    #[test]
    fn same_seed_same_rolls() {
        let mut i = input(10, 0, 1.0);
        i.attacker.crit_chance = 0.5;
        let roll = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            (0..20).map(|_| DamageCalculator::calculate(&i, &mut rng).critical).collect::<Vec<_>>()
        };
        assert_eq!(roll(7), roll(7));
    }
}
