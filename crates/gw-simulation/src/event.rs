use std::collections::BTreeMap;

use gw_core::{DomainEvent, EventType, WorldObjectId, WorldTick};

/// Committed events of a simulation run, oldest first.
#[derive(Debug, Default)]
pub struct EventLog {
    events: Vec<DomainEvent>,
    max_events: usize,
}

impl EventLog {
    /// Create a new event log with the given maximum capacity (0 = unlimited).
    pub fn new(max_events: usize) -> Self {
        Self {
            events: Vec::new(),
            max_events,
        }
    }

    /// Append an event, dropping the oldest events if the log exceeds its capacity.
    pub fn push(&mut self, event: DomainEvent) {
        self.events.push(event);
        self.trim();
    }

    /// Append a batch in order.
    pub fn extend(&mut self, events: impl IntoIterator<Item = DomainEvent>) {
        self.events.extend(events);
        self.trim();
    }

    fn trim(&mut self) {
        if self.max_events > 0 && self.events.len() > self.max_events {
            let drain_count = self.events.len() - self.max_events;
            self.events.drain(..drain_count);
        }
    }

    /// Every retained event, oldest first.
    pub fn events(&self) -> &[DomainEvent] {
        &self.events
    }

    /// Return all events that occurred at the given tick.
    pub fn events_at_tick(&self, tick: WorldTick) -> Vec<&DomainEvent> {
        self.events.iter().filter(|e| e.tick == tick).collect()
    }

    /// Return all events involving the given map object.
    pub fn events_for_object(&self, id: WorldObjectId) -> Vec<&DomainEvent> {
        self.events.iter().filter(|e| e.kind.involves(id)).collect()
    }

    /// Events of one type.
    pub fn of_type(&self, event_type: EventType) -> Vec<&DomainEvent> {
        self.events.iter().filter(|e| e.event_type() == event_type).collect()
    }

    /// How many events of each type are in the log.
    pub fn count_by_type(&self) -> BTreeMap<EventType, usize> {
        let mut counts = BTreeMap::new();
        for event in &self.events {
            *counts.entry(event.event_type()).or_default() += 1;
        }
        counts
    }

    /// Number of retained events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the log is empty.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Remove all recorded events.
    pub fn clear(&mut self) {
        self.events.clear();
    }
}
