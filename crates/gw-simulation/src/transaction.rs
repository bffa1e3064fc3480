use gw_core::DomainEvent;
use tracing::warn;

use crate::error::SimResult;
use crate::ports::UnitOfWork;

/// An open transaction that rolls back when dropped uncommitted.
///
/// Early returns through `?` therefore leave the store as it was when the
/// scope began.
pub struct TransactionScope<'a, U: UnitOfWork + ?Sized> {
    uow: &'a mut U,
    committed: bool,
}

impl<'a, U: UnitOfWork + ?Sized> TransactionScope<'a, U> {
    /// Begin a transaction on `uow`.
    pub fn begin(uow: &'a mut U) -> SimResult<Self> {
        uow.begin()?;
        Ok(Self { uow, committed: false })
    }

    /// The unit of work inside the scope.
    pub fn uow(&mut self) -> &mut U {
        &mut *self.uow
    }

    /// Commit and return the processed events.
    pub fn commit(mut self) -> SimResult<Vec<DomainEvent>> {
        let events = self.uow.commit()?;
        self.committed = true;
        Ok(events)
    }
}

impl<U: UnitOfWork + ?Sized> Drop for TransactionScope<'_, U> {
    fn drop(&mut self) {
        if !self.committed && self.uow.is_active() {
            warn!("transaction dropped without commit, rolling back");
            self.uow.rollback();
        }
    }
}

#[cfg(test)]
mod tests {
    use gw_core::{SpotId, WorldTick};
    use gw_map::PhysicalMapAggregate;

    use super::*;
    use crate::error::SimError;
    use crate::memory::{InMemoryStore, InMemoryUnitOfWork, WorldState};
    use crate::ports::GameTimeProvider;

    fn store() -> InMemoryStore {
        let map = PhysicalMapAggregate::from_ascii(SpotId::new(1).unwrap(), &["..."]).unwrap();
        InMemoryStore::new(WorldState::new().with_map(map))
    }

    fn failing_tick(store: &InMemoryStore, uow: &mut InMemoryUnitOfWork) -> SimResult<()> {
        let _scope = TransactionScope::begin(uow)?;
        store.advance_tick();
        Err(SimError::NoTransaction)
    }

    #[test]
    fn error_path_rolls_back() {
        let store = store();
        let mut uow = InMemoryUnitOfWork::new(store.clone());
        assert!(failing_tick(&store, &mut uow).is_err());
        assert_eq!(store.get_current_tick(), WorldTick::ZERO);
        assert!(!uow.is_active());
    }

    #[test]
    fn commit_keeps_changes() {
        let store = store();
        let mut uow = InMemoryUnitOfWork::new(store.clone());
        let scope = TransactionScope::begin(&mut uow).unwrap();
        store.advance_tick();
        scope.commit().unwrap();
        assert_eq!(store.get_current_tick(), WorldTick(1));

        // a new transaction can start once the previous one is closed
        let scope = TransactionScope::begin(&mut uow).unwrap();
        drop(scope);
        assert_eq!(store.get_current_tick(), WorldTick(1));
    }
}
