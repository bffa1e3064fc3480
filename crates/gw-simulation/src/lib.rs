//! Tick-based world simulation for Gitterwelt.
//!
//! Systems (weather, behaviour, hit boxes, spawning) run against the
//! repository ports each tick. Everything a tick changes goes through one
//! unit of work: the events it raises are drained through the synchronous
//! handlers inside the transaction, and the asynchronous handlers see them
//! only after commit.

/// Monster decision making per tick.
pub mod behavior;
/// Configuration types for simulation runs.
pub mod config;
/// Mutable context passed to systems and handlers.
pub mod context;
/// Error types for the simulation crate.
pub mod error;
/// The committed event log.
pub mod event;
/// The built-in domain event handlers.
pub mod handlers;
/// Hit box advancement per tick.
pub mod hitbox;
/// In-memory adapters for every port.
pub mod memory;
/// Repository, clock and transaction ports.
pub mod ports;
/// Synchronous and asynchronous event dispatch.
pub mod publisher;
/// The built-in arena scenario.
pub mod scenario;
/// Top-level simulation orchestrator.
pub mod simulation;
/// Spawn table processing.
pub mod spawn;
/// The trait that all simulation systems implement.
pub mod system;
/// Rollback-on-drop transaction guard.
pub mod transaction;
/// Weather rolls.
pub mod weather;

pub use behavior::BehaviorSystem;
pub use config::SimConfig;
pub use context::{SharedRng, SimContext};
pub use error::{SimError, SimResult};
pub use event::EventLog;
pub use handlers::{
    GatewayTransferHandler, HitDamageHandler, LootDropHandler, MonsterDeathHandler, StaticTransitionRules,
};
pub use hitbox::HitBoxSystem;
pub use memory::{InMemoryStore, InMemoryUnitOfWork, WorldState};
pub use ports::{
    AggroStore, GameTimeProvider, HitBoxRepository, MonsterRepository, MonsterTemplateRepository,
    PhysicalMapRepository, Ports, SpawnTableRepository, UnitOfWork, Wallet, WeatherZoneRepository,
};
pub use publisher::{EventHandler, EventPublisher};
pub use scenario::Arena;
pub use simulation::WorldSimulationService;
pub use spawn::SpawnSystem;
pub use system::System;
pub use transaction::TransactionScope;
pub use weather::WeatherSystem;
