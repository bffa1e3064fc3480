use gw_core::{DomainEvent, EventType, WorldTick};
use tracing::{debug, warn};

use crate::behavior::BehaviorSystem;
use crate::config::SimConfig;
use crate::context::{SharedRng, SimContext};
use crate::error::{SimError, SimResult};
use crate::event::EventLog;
use crate::handlers::{
    GatewayTransferHandler, HitDamageHandler, LootDropHandler, MonsterDeathHandler, StaticTransitionRules,
};
use crate::hitbox::HitBoxSystem;
use crate::memory::{InMemoryStore, InMemoryUnitOfWork};
use crate::ports::{Ports, UnitOfWork};
use crate::publisher::{EventHandler, EventPublisher};
use crate::spawn::SpawnSystem;
use crate::system::System;
use crate::transaction::TransactionScope;
use crate::weather::WeatherSystem;

/// The top-level simulation orchestrator.
///
/// Owns the store, RNG, event log, handlers and registered systems, and
/// runs each tick as one transaction: a failing system or synchronous
/// handler leaves the world exactly as it was before the tick.
pub struct WorldSimulationService {
    store: InMemoryStore,
    ports: Ports,
    config: SimConfig,
    rng: SharedRng,
    uow: InMemoryUnitOfWork,
    publisher: EventPublisher,
    systems: Vec<Box<dyn System>>,
    events: EventLog,
}

impl std::fmt::Debug for WorldSimulationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorldSimulationService")
            .field("tick", &self.current_tick())
            .field("systems", &self.systems.len())
            .field("events", &self.events.len())
            .finish()
    }
}

impl WorldSimulationService {
    /// A simulation over `store` with the standard systems and handlers
    /// and no transition rules.
    pub fn new(config: SimConfig, store: InMemoryStore) -> SimResult<Self> {
        Self::with_transition_rules(config, store, StaticTransitionRules::new())
    }

    /// Like [`new`](Self::new), with gateway policies and relations.
    pub fn with_transition_rules(
        config: SimConfig,
        store: InMemoryStore,
        rules: StaticTransitionRules,
    ) -> SimResult<Self> {
        store.reset_aggro(config.aggro_memory);
        let hit_boxes = HitBoxSystem::new(&config.hit_box)?;

        let mut publisher = EventPublisher::new();
        publisher.register_sync(EventType::HitBoxHitRecorded, HitDamageHandler);
        publisher.register_sync(EventType::MonsterDied, MonsterDeathHandler);
        publisher.register_sync(EventType::GatewayTriggered, GatewayTransferHandler::new(rules));
        publisher.register_async(EventType::MonsterDied, LootDropHandler);

        let mut sim = Self {
            ports: store.ports(),
            uow: InMemoryUnitOfWork::new(store.clone()),
            store,
            rng: SharedRng::seeded(config.seed),
            events: EventLog::new(config.max_events),
            publisher,
            systems: Vec::new(),
            config,
        };
        sim.add_system(WeatherSystem::from_config(&sim.config));
        sim.add_system(BehaviorSystem::new(sim.config.behavior.clone()));
        sim.add_system(hit_boxes);
        sim.add_system(SpawnSystem::new());
        Ok(sim)
    }

    /// Register a system. Systems are ticked in registration order.
    pub fn add_system<S: System + 'static>(&mut self, system: S) {
        self.systems.push(Box::new(system));
    }

    /// Run `handler` inside the tick's transaction for every `event_type`.
    pub fn register_sync_handler(&mut self, event_type: EventType, handler: impl EventHandler + 'static) {
        self.publisher.register_sync(event_type, handler);
    }

    /// Run `handler` after commit, in its own transaction.
    pub fn register_async_handler(&mut self, event_type: EventType, handler: impl EventHandler + 'static) {
        self.publisher.register_async(event_type, handler);
    }

    /// Advance the world by one tick and return it.
    ///
    /// On error nothing of the tick is kept, the clock included.
    pub fn tick(&mut self) -> SimResult<WorldTick> {
        let mut scope = TransactionScope::begin(&mut self.uow)?;
        let tick = self.ports.time.advance_tick();
        self.ports.aggro.prune(tick);
        let mut ctx = SimContext::new(&self.ports, &self.config, self.rng.clone(), tick);

        for system in &mut self.systems {
            if !system.is_due(tick) {
                continue;
            }
            if let Err(err) = system.tick(&mut ctx) {
                warn!(tick = %tick, system = system.name(), %err, "system failed, rolling back tick");
                return Err(SimError::system(system.name(), err));
            }
            scope.uow().add_events(ctx.take_pending());
            if let Err(err) = self.publisher.process_sync_events(scope.uow(), &mut ctx) {
                warn!(tick = %tick, system = system.name(), %err, "event handling failed, rolling back tick");
                return Err(err);
            }
        }
        let committed = scope.commit()?;
        let follow_ups = self.publisher.dispatch_async(&committed, &mut self.uow, &mut ctx);
        debug!(
            tick = %tick,
            committed = committed.len(),
            follow_ups = follow_ups.len(),
            "tick committed"
        );
        self.events.extend(committed);
        self.events.extend(follow_ups);
        Ok(tick)
    }

    /// Advance the simulation by `n` ticks.
    pub fn run(&mut self, n: u64) -> SimResult<WorldTick> {
        for _ in 0..n {
            self.tick()?;
        }
        Ok(self.current_tick())
    }

    /// The committed event log.
    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// Committed events, oldest first.
    pub fn committed_events(&self) -> &[DomainEvent] {
        self.events.events()
    }

    /// The tick last completed.
    pub fn current_tick(&self) -> WorldTick {
        self.ports.time.get_current_tick()
    }

    /// Repository and service ports.
    pub fn ports(&self) -> &Ports {
        &self.ports
    }

    /// The backing in-memory store.
    pub fn store(&self) -> &InMemoryStore {
        &self.store
    }

    /// The configuration in use.
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Access a system by downcasting to a concrete type.
    pub fn get_system<T: System + 'static>(&self) -> Option<&T> {
        self.systems.iter().find_map(|s| s.as_any().downcast_ref::<T>())
    }

    /// Access a system mutably by downcasting to a concrete type.
    pub fn get_system_mut<T: System + 'static>(&mut self) -> Option<&mut T> {
        self.systems
            .iter_mut()
            .find_map(|s| s.as_any_mut().downcast_mut::<T>())
    }
}
