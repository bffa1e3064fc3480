//! Choosing which skill to use on a target.

use gw_combat::SkillSpec;

/// What the skill policy looks at.
#[derive(Debug, Clone, Copy)]
pub struct SkillSelectionContext<'a> {
    /// Skills by slot.
    pub skills: &'a [SkillSpec],
    /// Slots that are ready and affordable, ascending.
    pub available_slots: &'a [usize],
    /// Chebyshev distance to the target.
    pub target_distance: u32,
}

/// Picks a skill slot.
pub trait SkillSelectionPolicy: std::fmt::Debug {
    /// The chosen slot, or `None` if no skill fits.
    fn select_slot(&self, ctx: &SkillSelectionContext<'_>) -> Option<usize>;
}

/// The first available slot whose range covers the target.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstInRangeSkillPolicy;

impl SkillSelectionPolicy for FirstInRangeSkillPolicy {
    fn select_slot(&self, ctx: &SkillSelectionContext<'_>) -> Option<usize> {
        ctx.available_slots.iter().copied().find(|slot| {
            ctx.skills
                .get(*slot)
                .is_some_and(|skill| skill.in_range(ctx.target_distance))
        })
    }
}

#[cfg(test)]
mod tests {
    use gw_combat::HitBoxSpec;

    use super::*;

    fn skills() -> Vec<SkillSpec> {
        vec![
            SkillSpec::basic_attack(),
            SkillSpec {
                name: "spit".into(),
                range: 4,
                mp_cost: 2,
                cooldown_ticks: 5,
                cast_ticks: 1,
                hit_boxes: vec![HitBoxSpec::projectile(2.0, 3)],
            },
        ]
    }

    #[test]
    fn first_in_range() {
        let skills = skills();
        let ctx = |available: &'static [usize], distance| SkillSelectionContext {
            skills: &skills,
            available_slots: available,
            target_distance: distance,
        };
        let policy = FirstInRangeSkillPolicy;
        assert_eq!(policy.select_slot(&ctx(&[0, 1], 1)), Some(0));
        assert_eq!(policy.select_slot(&ctx(&[0, 1], 3)), Some(1));
        assert_eq!(policy.select_slot(&ctx(&[1], 1)), Some(1));
        assert_eq!(policy.select_slot(&ctx(&[0], 3)), None);
        assert_eq!(policy.select_slot(&ctx(&[0, 1], 9)), None);
        assert_eq!(policy.select_slot(&ctx(&[7], 1)), None);
    }
}
