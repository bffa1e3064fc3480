//! Spawn tables: which monsters repopulate a map, where, and how often.

use std::collections::BTreeMap;

use gw_core::{Area, SpotId, TemplateId, WorldTick};
use serde::{Deserialize, Serialize};

/// One line of a spawn table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnEntry {
    /// Monster kind.
    pub template_id: TemplateId,
    /// Where spawns may land.
    pub area: Area,
    /// Population cap for this entry.
    pub max_count: u32,
    /// Minimum ticks between two spawns of this entry.
    pub respawn_ticks: u64,
}

/// The spawn table of one map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnTable {
    spot_id: SpotId,
    entries: Vec<SpawnEntry>,
    #[serde(default)]
    last_spawned: BTreeMap<usize, WorldTick>,
}

impl SpawnTable {
    /// A table that has not spawned anything yet.
    pub fn new(spot_id: SpotId, entries: Vec<SpawnEntry>) -> Self {
        Self {
            spot_id,
            entries,
            last_spawned: BTreeMap::new(),
        }
    }

    /// Map the table belongs to.
    pub fn spot_id(&self) -> SpotId {
        self.spot_id
    }

    /// Entries in declaration order.
    pub fn entries(&self) -> &[SpawnEntry] {
        &self.entries
    }

    /// Whether entry `index` should spawn now, given how many of its
    /// monsters are alive.
    pub fn is_due(&self, index: usize, alive: u32, current_tick: WorldTick) -> bool {
        let Some(entry) = self.entries.get(index) else {
            return false;
        };
        if alive >= entry.max_count {
            return false;
        }
        self.last_spawned
            .get(&index)
            .is_none_or(|last| current_tick.since(*last) >= entry.respawn_ticks)
    }

    /// Indices of entries due now. `alive` maps template to living count.
    pub fn due_entries(&self, alive: &BTreeMap<TemplateId, u32>, current_tick: WorldTick) -> Vec<usize> {
        (0..self.entries.len())
            .filter(|i| {
                let count = alive.get(&self.entries[*i].template_id).copied().unwrap_or(0);
                self.is_due(*i, count, current_tick)
            })
            .collect()
    }

    /// Note that entry `index` spawned at `current_tick`.
    pub fn record_spawn(&mut self, index: usize, current_tick: WorldTick) {
        if index < self.entries.len() {
            self.last_spawned.insert(index, current_tick);
        }
    }
}

#[cfg(test)]
mod tests {
    use gw_core::Coordinate;

    use super::*;

    fn table() -> SpawnTable {
        SpawnTable::new(
            SpotId::new(1).unwrap(),
            vec![SpawnEntry {
                template_id: TemplateId::new(1).unwrap(),
                area: Area::circle(Coordinate::planar(5, 5).unwrap(), 2),
                max_count: 2,
                respawn_ticks: 10,
            }],
        )
    }

    #[test]
    fn first_spawn_is_immediate() {
        assert!(table().is_due(0, 0, WorldTick(0)));
    }

    #[test]
    fn respects_cap_and_timer() {
        let mut t = table();
        t.record_spawn(0, WorldTick(3));
        assert!(!t.is_due(0, 1, WorldTick(12)));
        assert!(t.is_due(0, 1, WorldTick(13)));
        assert!(!t.is_due(0, 2, WorldTick(50)));
        assert!(!t.is_due(5, 0, WorldTick(50)));
    }

    #[test]
    fn due_entries_by_template_count() {
        let t = table();
        let mut alive = BTreeMap::new();
        assert_eq!(t.due_entries(&alive, WorldTick(0)), vec![0]);
        alive.insert(TemplateId::new(1).unwrap(), 2);
        assert!(t.due_entries(&alive, WorldTick(0)).is_empty());
    }
}
