use std::cell::RefCell;
use std::rc::Rc;

use gw_core::{DomainEvent, WorldEventKind, WorldTick};
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::config::SimConfig;
use crate::ports::Ports;

/// The one random number generator of a simulation.
///
/// Clones share the generator, so every roll advances the same sequence
/// regardless of which system or handler makes it.
#[derive(Debug, Clone)]
pub struct SharedRng(Rc<RefCell<StdRng>>);

impl SharedRng {
    /// A generator seeded with `seed`.
    pub fn seeded(seed: u64) -> Self {
        Self(Rc::new(RefCell::new(StdRng::seed_from_u64(seed))))
    }

    /// Run `f` with exclusive access to the generator.
    pub fn with<R>(&self, f: impl FnOnce(&mut StdRng) -> R) -> R {
        f(&mut self.0.borrow_mut())
    }
}

/// Mutable context passed to each system and event handler during a tick.
///
/// Aggregate events are collected here and handed to the unit of work
/// after the system or handler returns.
pub struct SimContext<'a> {
    /// Repositories and services.
    pub ports: &'a Ports,
    /// Settings of the running simulation.
    pub config: &'a SimConfig,
    /// The shared generator.
    pub rng: SharedRng,
    tick: WorldTick,
    pending: Vec<WorldEventKind>,
}

impl<'a> SimContext<'a> {
    /// Context for one system or handler run at `tick`.
    pub fn new(ports: &'a Ports, config: &'a SimConfig, rng: SharedRng, tick: WorldTick) -> Self {
        Self {
            ports,
            config,
            rng,
            tick,
            pending: Vec::new(),
        }
    }

    /// Emit an event at the current tick.
    pub fn emit(&mut self, kind: WorldEventKind) {
        self.pending.push(kind);
    }

    /// Emit everything an aggregate buffered.
    pub fn emit_all(&mut self, kinds: impl IntoIterator<Item = WorldEventKind>) {
        self.pending.extend(kinds);
    }

    /// Events emitted since the last call, stamped with the current tick.
    pub fn take_pending(&mut self) -> Vec<DomainEvent> {
        DomainEvent::batch(self.tick, std::mem::take(&mut self.pending))
    }

    /// Drop events emitted since the last [`take_pending`](Self::take_pending).
    pub fn discard_pending(&mut self) -> usize {
        let dropped = self.pending.len();
        self.pending.clear();
        dropped
    }

    /// The tick being processed.
    pub fn tick(&self) -> WorldTick {
        self.tick
    }
}

#[cfg(test)]
mod tests {
    use rand::Rng;

    use super::*;

    #[test]
    fn clones_share_one_sequence() {
        let a = SharedRng::seeded(5);
        let b = a.clone();
        let first: u64 = a.with(|rng| rng.random());
        let second: u64 = b.with(|rng| rng.random());

        let fresh = SharedRng::seeded(5);
        let expected: Vec<u64> = (0..2).map(|_| fresh.with(|rng| rng.random())).collect();
        assert_eq!(vec![first, second], expected);
    }
}
