//! Threat bookkeeping.
//!
//! Every hit adds threat from the attacker toward the victim. Boss AI reads
//! the table to pick whoever hurt it most.

use std::collections::BTreeMap;

use gw_core::{SpotId, WorldObjectId, WorldTick};
use serde::{Deserialize, Serialize};

/// How long threat is remembered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum AggroMemoryPolicy {
    /// Drop entries untouched for this many ticks.
    ForgetAfter {
        /// Ticks without new threat before an entry is dropped.
        ticks: u64,
    },
    /// Keep entries until explicitly cleared.
    NeverForget,
}

impl Default for AggroMemoryPolicy {
    fn default() -> Self {
        Self::ForgetAfter { ticks: 30 }
    }
}

impl AggroMemoryPolicy {
    fn is_forgotten(self, last_updated: WorldTick, current_tick: WorldTick) -> bool {
        match self {
            Self::ForgetAfter { ticks } => current_tick.since(last_updated) > ticks,
            Self::NeverForget => false,
        }
    }
}

/// Accumulated threat of one attacker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AggroEntry {
    /// Total threat.
    pub threat: f64,
    /// Tick of the last contribution.
    pub last_updated: WorldTick,
}

/// Threat per (spot, victim), then per attacker.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggroTable {
    policy: AggroMemoryPolicy,
    entries: BTreeMap<(SpotId, WorldObjectId), BTreeMap<WorldObjectId, AggroEntry>>,
}

impl AggroTable {
    /// An empty table.
    pub fn new(policy: AggroMemoryPolicy) -> Self {
        Self {
            policy,
            entries: BTreeMap::new(),
        }
    }

    /// The memory policy.
    pub fn policy(&self) -> AggroMemoryPolicy {
        self.policy
    }

    /// Add `amount` threat from `attacker_id` toward `victim_id`.
    ///
    /// An entry that the policy already forgot starts over from zero.
    pub fn add_aggro(
        &mut self,
        spot_id: SpotId,
        victim_id: WorldObjectId,
        attacker_id: WorldObjectId,
        amount: f64,
        current_tick: WorldTick,
    ) {
        let policy = self.policy;
        let entry = self
            .entries
            .entry((spot_id, victim_id))
            .or_default()
            .entry(attacker_id)
            .or_insert(AggroEntry {
                threat: 0.0,
                last_updated: current_tick,
            });
        if policy.is_forgotten(entry.last_updated, current_tick) {
            entry.threat = 0.0;
        }
        entry.threat += amount.max(0.0);
        entry.last_updated = current_tick;
    }

    /// Remembered threat toward `victim_id`, by attacker.
    pub fn get_threat_by_attacker(
        &self,
        spot_id: SpotId,
        victim_id: WorldObjectId,
        current_tick: WorldTick,
    ) -> BTreeMap<WorldObjectId, f64> {
        self.entries
            .get(&(spot_id, victim_id))
            .map(|attackers| {
                attackers
                    .iter()
                    .filter(|(_, e)| !self.policy.is_forgotten(e.last_updated, current_tick))
                    .map(|(id, e)| (*id, e.threat))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The attacker with most remembered threat. Ties go to the lower id.
    pub fn top_attacker(
        &self,
        spot_id: SpotId,
        victim_id: WorldObjectId,
        current_tick: WorldTick,
    ) -> Option<WorldObjectId> {
        self.get_threat_by_attacker(spot_id, victim_id, current_tick)
            .into_iter()
            .fold(None, |best: Option<(WorldObjectId, f64)>, (id, threat)| match best {
                Some((_, top)) if top >= threat => best,
                _ => Some((id, threat)),
            })
            .map(|(id, _)| id)
    }

    /// Forget everything about a victim (it died or despawned).
    pub fn clear_victim(&mut self, spot_id: SpotId, victim_id: WorldObjectId) {
        self.entries.remove(&(spot_id, victim_id));
    }

    /// Remove an attacker from every table on a spot.
    pub fn forget_attacker(&mut self, spot_id: SpotId, attacker_id: WorldObjectId) {
        for ((spot, _), attackers) in self.entries.iter_mut() {
            if *spot == spot_id {
                attackers.remove(&attacker_id);
            }
        }
        self.entries.retain(|_, attackers| !attackers.is_empty());
    }

    /// Drop entries the policy has forgotten.
    pub fn prune(&mut self, current_tick: WorldTick) {
        let policy = self.policy;
        for attackers in self.entries.values_mut() {
            attackers.retain(|_, e| !policy.is_forgotten(e.last_updated, current_tick));
        }
        self.entries.retain(|_, attackers| !attackers.is_empty());
    }

    /// Number of (spot, victim) tables.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no threat is recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oid(v: u64) -> WorldObjectId {
        WorldObjectId::new(v).unwrap()
    }

    fn spot() -> SpotId {
        SpotId::new(1).unwrap()
    }

    #[test]
    fn threat_accumulates() {
        let mut table = AggroTable::new(AggroMemoryPolicy::NeverForget);
        table.add_aggro(spot(), oid(1), oid(2), 5.0, WorldTick(1));
        table.add_aggro(spot(), oid(1), oid(2), 3.0, WorldTick(2));
        table.add_aggro(spot(), oid(1), oid(3), 4.0, WorldTick(2));
        let threat = table.get_threat_by_attacker(spot(), oid(1), WorldTick(100));
        assert_eq!(threat[&oid(2)], 8.0);
        assert_eq!(threat[&oid(3)], 4.0);
        assert_eq!(table.top_attacker(spot(), oid(1), WorldTick(100)), Some(oid(2)));
    }

    #[test]
    fn forget_after_window() {
        let mut table = AggroTable::new(AggroMemoryPolicy::ForgetAfter { ticks: 5 });
        table.add_aggro(spot(), oid(1), oid(2), 5.0, WorldTick(1));
        assert_eq!(table.get_threat_by_attacker(spot(), oid(1), WorldTick(6)).len(), 1);
        assert!(table.get_threat_by_attacker(spot(), oid(1), WorldTick(7)).is_empty());

        table.add_aggro(spot(), oid(1), oid(2), 2.0, WorldTick(10));
        assert_eq!(table.get_threat_by_attacker(spot(), oid(1), WorldTick(10))[&oid(2)], 2.0);
    }

    #[test]
    fn prune_and_clear() {
        let mut table = AggroTable::new(AggroMemoryPolicy::ForgetAfter { ticks: 2 });
        table.add_aggro(spot(), oid(1), oid(2), 1.0, WorldTick(1));
        table.add_aggro(spot(), oid(4), oid(2), 1.0, WorldTick(9));
        table.prune(WorldTick(10));
        assert_eq!(table.len(), 1);
        table.forget_attacker(spot(), oid(2));
        assert!(table.is_empty());

        table.add_aggro(spot(), oid(1), oid(2), 1.0, WorldTick(1));
        table.clear_victim(spot(), oid(1));
        assert!(table.is_empty());
    }

    #[test]
    fn ties_go_to_lower_id() {
        let mut table = AggroTable::new(AggroMemoryPolicy::NeverForget);
        table.add_aggro(spot(), oid(1), oid(5), 3.0, WorldTick(1));
        table.add_aggro(spot(), oid(1), oid(3), 3.0, WorldTick(1));
        assert_eq!(table.top_attacker(spot(), oid(1), WorldTick(1)), Some(oid(3)));
    }
}
