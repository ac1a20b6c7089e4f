//! Programmable event store for tests: canned events, a failure switch, and
//! a query counter observable after the store moves into the engine.

use crate::error::AppError;
use crate::store::memory::InMemoryEventStore;
use crate::store::{EventFilter, EventStore, OccupancyEvent};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Default)]
pub struct MockEventStore {
    inner: InMemoryEventStore,
    fail: bool,
    query_calls: Arc<AtomicUsize>,
}

impl MockEventStore {
    pub fn with_events(events: Vec<OccupancyEvent>) -> Self {
        Self {
            inner: InMemoryEventStore::new(events),
            fail: false,
            query_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A store whose every query fails, for error-propagation tests.
    pub fn failing() -> Self {
        Self {
            inner: InMemoryEventStore::default(),
            fail: true,
            query_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Clone the call counter before handing the store to an engine.
    pub fn query_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.query_calls)
    }
}

impl EventStore for MockEventStore {
    fn query(&self, filter: &EventFilter) -> Result<Vec<OccupancyEvent>, AppError> {
        self.query_calls.fetch_add(1, Ordering::Relaxed);
        if self.fail {
            return Err(AppError::Store("mock query failed".to_string()));
        }
        self.inner.query(filter)
    }

    fn count(&self) -> Result<usize, AppError> {
        if self.fail {
            return Err(AppError::Store("mock count failed".to_string()));
        }
        self.inner.count()
    }
}
