//! Choosing whom to chase.

use std::collections::BTreeMap;

use gw_combat::TargetPriority;
use gw_core::WorldObjectId;

use crate::perception::VisibleObject;

/// Extra knowledge for target selection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TargetSelectionContext {
    /// Remembered threat by attacker.
    pub threat_by_id: BTreeMap<WorldObjectId, f64>,
}

impl TargetSelectionContext {
    /// A context with the given threat table.
    pub fn with_threat(threat_by_id: BTreeMap<WorldObjectId, f64>) -> Self {
        Self { threat_by_id }
    }
}

/// Picks one target among candidates.
pub trait TargetSelectionPolicy: std::fmt::Debug {
    /// The chosen candidate, or `None` when there are none.
    fn select_target(&self, candidates: &[&VisibleObject], ctx: &TargetSelectionContext) -> Option<WorldObjectId>;
}

/// The closest candidate; ties go to the lower id.
#[derive(Debug, Clone, Copy, Default)]
pub struct NearestTargetPolicy;

impl TargetSelectionPolicy for NearestTargetPolicy {
    fn select_target(&self, candidates: &[&VisibleObject], _ctx: &TargetSelectionContext) -> Option<WorldObjectId> {
        candidates
            .iter()
            .min_by(|a, b| a.distance.total_cmp(&b.distance).then(a.object_id.cmp(&b.object_id)))
            .map(|v| v.object_id)
    }
}

/// The candidate with most threat; nearest when nobody has any.
#[derive(Debug, Clone, Copy, Default)]
pub struct HighestThreatTargetPolicy;

impl TargetSelectionPolicy for HighestThreatTargetPolicy {
    fn select_target(&self, candidates: &[&VisibleObject], ctx: &TargetSelectionContext) -> Option<WorldObjectId> {
        let best = candidates
            .iter()
            .filter_map(|v| ctx.threat_by_id.get(&v.object_id).map(|t| (v.object_id, *t)))
            .filter(|(_, t)| *t > 0.0)
            .fold(None, |best: Option<(WorldObjectId, f64)>, (id, threat)| match best {
                Some((_, top)) if top >= threat => best,
                _ => Some((id, threat)),
            });
        match best {
            Some((id, _)) => Some(id),
            None => NearestTargetPolicy.select_target(candidates, ctx),
        }
    }
}

/// The policy for a template's priority.
pub fn policy_for(priority: TargetPriority) -> &'static dyn TargetSelectionPolicy {
    match priority {
        TargetPriority::Nearest => &NearestTargetPolicy,
        TargetPriority::HighestThreat => &HighestThreatTargetPolicy,
    }
}
