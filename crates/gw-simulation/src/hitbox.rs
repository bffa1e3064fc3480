use std::collections::BTreeMap;

use gw_combat::{HitBoxCollisionDomainService, HitBoxConfig, HitBoxConfigService};
use tracing::debug;

use crate::context::SimContext;
use crate::error::SimResult;
use crate::system::System;

/// Advances every active hit box under one collision budget per tick and
/// drops finished ones.
#[derive(Debug, Clone)]
pub struct HitBoxSystem {
    collisions: HitBoxCollisionDomainService,
    deferred: usize,
}

impl HitBoxSystem {
    /// Fails when `config` is inconsistent.
    pub fn new(config: &HitBoxConfig) -> SimResult<Self> {
        let service = HitBoxConfigService::new(config.clone())?;
        Ok(Self {
            collisions: HitBoxCollisionDomainService::new(service),
            deferred: 0,
        })
    }

    /// Hit boxes pushed to the next tick by the last run.
    pub fn deferred(&self) -> usize {
        self.deferred
    }
}

impl System for HitBoxSystem {
    fn name(&self) -> &str {
        "hit-boxes"
    }

    fn tick(&mut self, ctx: &mut SimContext<'_>) -> SimResult<()> {
        let tick = ctx.tick();
        self.deferred = 0;

        let mut maps = BTreeMap::new();
        let mut hit_boxes = Vec::new();
        for spot_id in ctx.ports.maps.spot_ids() {
            let found = ctx.ports.hit_boxes.find_active_by_spot_id(spot_id);
            if found.is_empty() {
                continue;
            }
            maps.insert(spot_id, ctx.ports.map_or_err(spot_id)?);
            hit_boxes.extend(found);
        }
        if hit_boxes.is_empty() {
            return Ok(());
        }

        let mut budget = self.collisions.budget();
        let report = self
            .collisions
            .process_world(&mut hit_boxes, |spot| maps.get(&spot), tick, &mut budget)?;
        self.deferred = report.deferred;

        hit_boxes.sort_by_key(|hb| (hb.spot_id(), hb.id()));
        for hit_box in &mut hit_boxes {
            ctx.emit_all(hit_box.take_events());
        }
        ctx.ports.hit_boxes.save_all(hit_boxes);
        let purged: usize = maps.keys().map(|spot| ctx.ports.hit_boxes.purge_inactive(*spot)).sum();
        debug!(
            tick = %tick,
            maps = maps.len(),
            completed = report.completed,
            deactivated = report.deactivated,
            deferred = report.deferred,
            checks = report.checks_used,
            purged,
            "hit boxes processed"
        );
        Ok(())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}
