//! Two-tier domain event dispatch.
//!
//! Synchronous handlers run inside the transaction that raised the event
//! and may fail it. Asynchronous handlers run after commit, each in a
//! transaction of its own; their failures are logged and dropped.

use std::collections::BTreeMap;
use std::fmt;

use gw_core::{DomainEvent, EventType};
use tracing::{debug, warn};

use crate::context::SimContext;
use crate::error::{SimError, SimResult};
use crate::ports::UnitOfWork;
use crate::transaction::TransactionScope;

/// Reacts to one kind of domain event.
///
/// Follow-up events go through [`SimContext::emit`]; they are queued in
/// the same transaction once the handler returns.
pub trait EventHandler: fmt::Debug {
    /// Name used in logs and error contexts.
    fn name(&self) -> &str;

    /// Handle one event.
    fn handle(&self, event: &DomainEvent, ctx: &mut SimContext<'_>) -> SimResult<()>;
}

/// Ordered handler registries keyed by event type.
#[derive(Debug, Default)]
pub struct EventPublisher {
    sync_handlers: BTreeMap<EventType, Vec<Box<dyn EventHandler>>>,
    async_handlers: BTreeMap<EventType, Vec<Box<dyn EventHandler>>>,
}

impl EventPublisher {
    /// A publisher with no handlers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `handler` inside the raising transaction. Handlers of one type run
    /// in registration order.
    pub fn register_sync(&mut self, event_type: EventType, handler: impl EventHandler + 'static) {
        self.sync_handlers.entry(event_type).or_default().push(Box::new(handler));
    }

    /// Run `handler` after commit in its own transaction.
    pub fn register_async(&mut self, event_type: EventType, handler: impl EventHandler + 'static) {
        self.async_handlers.entry(event_type).or_default().push(Box::new(handler));
    }

    /// Number of handlers registered for `event_type` as (sync, async).
    pub fn handler_count(&self, event_type: EventType) -> (usize, usize) {
        let count = |registry: &BTreeMap<EventType, Vec<Box<dyn EventHandler>>>| {
            registry.get(&event_type).map_or(0, Vec::len)
        };
        (count(&self.sync_handlers), count(&self.async_handlers))
    }

    /// Drain the unit of work's queue through the synchronous handlers,
    /// including every follow-up they raise.
    ///
    /// The first failure stops processing; the caller's transaction scope
    /// rolls everything back.
    pub fn process_sync_events<U: UnitOfWork + ?Sized>(&self, uow: &mut U, ctx: &mut SimContext<'_>) -> SimResult<()> {
        while let Some(event) = uow.next_pending() {
            let Some(handlers) = self.sync_handlers.get(&event.event_type()) else {
                continue;
            };
            for handler in handlers {
                if let Err(err) = handler.handle(&event, ctx) {
                    ctx.discard_pending();
                    return Err(SimError::system(handler.name(), err));
                }
                uow.add_events(ctx.take_pending());
            }
        }
        Ok(())
    }

    /// Hand committed events to the asynchronous handlers.
    ///
    /// Each handler run gets its own transaction on `uow`; events it raises
    /// pass through the synchronous handlers of that transaction. Returns
    /// the events committed by successful runs.
    pub fn dispatch_async<U: UnitOfWork + ?Sized>(
        &self,
        committed: &[DomainEvent],
        uow: &mut U,
        ctx: &mut SimContext<'_>,
    ) -> Vec<DomainEvent> {
        let mut follow_ups = Vec::new();
        for event in committed {
            let Some(handlers) = self.async_handlers.get(&event.event_type()) else {
                continue;
            };
            for handler in handlers {
                match self.run_async(handler.as_ref(), event, uow, ctx) {
                    Ok(events) => follow_ups.extend(events),
                    Err(err) => {
                        ctx.discard_pending();
                        warn!(
                            tick = %ctx.tick(),
                            handler = handler.name(),
                            event = ?event.event_type(),
                            %err,
                            "async handler failed"
                        );
                    }
                }
            }
        }
        follow_ups
    }

    fn run_async<U: UnitOfWork + ?Sized>(
        &self,
        handler: &dyn EventHandler,
        event: &DomainEvent,
        uow: &mut U,
        ctx: &mut SimContext<'_>,
    ) -> SimResult<Vec<DomainEvent>> {
        let mut scope = TransactionScope::begin(uow)?;
        handler
            .handle(event, ctx)
            .map_err(|err| SimError::system(handler.name(), err))?;
        scope.uow().add_events(ctx.take_pending());
        self.process_sync_events(scope.uow(), ctx)?;
        let events = scope.commit()?;
        debug!(handler = handler.name(), events = events.len(), "async handler committed");
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use gw_core::{Coordinate, SpotId, WorldEventKind, WorldObjectId, WorldTick};
    use gw_map::PhysicalMapAggregate;

    use super::*;
    use crate::config::SimConfig;
    use crate::context::SharedRng;
    use crate::memory::{InMemoryStore, InMemoryUnitOfWork, WorldState};
    use crate::ports::GameTimeProvider;

    fn spot() -> SpotId {
        SpotId::new(1).unwrap()
    }

    fn obj(n: u64) -> WorldObjectId {
        WorldObjectId::new(n).unwrap()
    }

    fn moved(n: u64) -> WorldEventKind {
        WorldEventKind::WorldObjectMoved {
            spot_id: spot(),
            object_id: obj(n),
            from: Coordinate::planar(0, 0).unwrap(),
            to: Coordinate::planar(1, 0).unwrap(),
        }
    }

    fn removed(n: u64) -> WorldEventKind {
        WorldEventKind::WorldObjectRemoved {
            spot_id: spot(),
            object_id: obj(n),
            coordinate: Coordinate::planar(1, 0).unwrap(),
        }
    }

    /// Answers every move with a removal.
    #[derive(Debug)]
    struct Echo;

    impl EventHandler for Echo {
        fn name(&self) -> &str {
            "echo"
        }

        fn handle(&self, event: &DomainEvent, ctx: &mut SimContext<'_>) -> SimResult<()> {
            if let WorldEventKind::WorldObjectMoved { object_id, .. } = event.kind {
                ctx.emit(removed(object_id.value()));
            }
            Ok(())
        }
    }

    #[derive(Debug, Default)]
    struct Counter(Rc<Cell<usize>>);

    impl EventHandler for Counter {
        fn name(&self) -> &str {
            "counter"
        }

        fn handle(&self, _event: &DomainEvent, _ctx: &mut SimContext<'_>) -> SimResult<()> {
            self.0.set(self.0.get() + 1);
            Ok(())
        }
    }

    /// Advances the clock, then fails.
    #[derive(Debug)]
    struct Broken;

    impl EventHandler for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        fn handle(&self, _event: &DomainEvent, ctx: &mut SimContext<'_>) -> SimResult<()> {
            ctx.ports.time.advance_tick();
            ctx.emit(moved(9));
            Err(gw_core::CoreError::validation("boom").into())
        }
    }

    fn fixture() -> (InMemoryStore, SimConfig) {
        let map = PhysicalMapAggregate::from_ascii(spot(), &["..."]).unwrap();
        (InMemoryStore::new(WorldState::new().with_map(map)), SimConfig::default())
    }

    #[test]
    fn follow_ups_are_processed_in_the_same_transaction() {
        let (store, config) = fixture();
        let ports = store.ports();
        let mut ctx = SimContext::new(&ports, &config, SharedRng::seeded(1), WorldTick(1));
        let removals = Rc::new(Cell::new(0));
        let mut publisher = EventPublisher::new();
        publisher.register_sync(EventType::WorldObjectMoved, Echo);
        publisher.register_sync(EventType::WorldObjectRemoved, Counter(removals.clone()));

        let mut uow = InMemoryUnitOfWork::new(store);
        let mut scope = TransactionScope::begin(&mut uow).unwrap();
        scope.uow().add_events(DomainEvent::batch(WorldTick(1), [moved(1), moved(2)]));
        publisher.process_sync_events(scope.uow(), &mut ctx).unwrap();
        let events = scope.commit().unwrap();

        let types: Vec<EventType> = events.iter().map(DomainEvent::event_type).collect();
        assert_eq!(
            types,
            vec![
                EventType::WorldObjectMoved,
                EventType::WorldObjectMoved,
                EventType::WorldObjectRemoved,
                EventType::WorldObjectRemoved,
            ]
        );
        assert_eq!(removals.get(), 2);
    }

    #[test]
    fn sync_failure_is_wrapped_and_drops_follow_ups() {
        let (store, config) = fixture();
        let ports = store.ports();
        let mut ctx = SimContext::new(&ports, &config, SharedRng::seeded(1), WorldTick(1));
        let mut publisher = EventPublisher::new();
        publisher.register_sync(EventType::WorldObjectMoved, Broken);

        let mut uow = InMemoryUnitOfWork::new(store.clone());
        {
            let mut scope = TransactionScope::begin(&mut uow).unwrap();
            scope.uow().add_events(DomainEvent::batch(WorldTick(1), [moved(1)]));
            let err = publisher.process_sync_events(scope.uow(), &mut ctx).unwrap_err();
            assert_eq!(err.kind(), gw_core::ErrorKind::System);
            assert!(err.to_string().starts_with("broken: "));
        }
        assert_eq!(store.get_current_tick(), WorldTick::ZERO);
        assert!(ctx.take_pending().is_empty());
    }

    #[test]
    fn async_failures_are_swallowed_and_isolated() {
        let (store, config) = fixture();
        let ports = store.ports();
        let mut ctx = SimContext::new(&ports, &config, SharedRng::seeded(1), WorldTick(1));
        let mut publisher = EventPublisher::new();
        publisher.register_async(EventType::WorldObjectMoved, Broken);
        publisher.register_async(EventType::WorldObjectMoved, Echo);

        let mut uow = InMemoryUnitOfWork::new(store.clone());
        let committed = DomainEvent::batch(WorldTick(1), [moved(1)]);
        let follow_ups = publisher.dispatch_async(&committed, &mut uow, &mut ctx);

        assert_eq!(follow_ups.len(), 1);
        assert_eq!(follow_ups[0].event_type(), EventType::WorldObjectRemoved);
        assert_eq!(store.get_current_tick(), WorldTick::ZERO);
        assert!(!uow.is_active());
    }

    #[test]
    fn handler_counts_per_tier() {
        let mut publisher = EventPublisher::new();
        publisher.register_sync(EventType::MonsterDied, Echo);
        publisher.register_async(EventType::MonsterDied, Echo);
        publisher.register_async(EventType::MonsterDied, Counter::default());
        assert_eq!(publisher.handler_count(EventType::MonsterDied), (1, 2));
        assert_eq!(publisher.handler_count(EventType::WeatherChanged), (0, 0));
    }
}
