//! In-memory event store, loadable from a JSON snapshot file.

use crate::error::AppError;
use crate::store::{EventFilter, EventStore, OccupancyEvent};
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Clone, Default)]
pub struct InMemoryEventStore {
    events: Vec<OccupancyEvent>,
}

impl InMemoryEventStore {
    /// Events are sorted once here so every `query` hands out pairing-ready
    /// (room, seat, timestamp) ordering.
    pub fn new(mut events: Vec<OccupancyEvent>) -> Self {
        events.sort_by(|a, b| {
            (a.room_no.as_str(), a.seat_no.as_str(), a.timestamp).cmp(&(
                b.room_no.as_str(),
                b.seat_no.as_str(),
                b.timestamp,
            ))
        });
        Self { events }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl EventStore for InMemoryEventStore {
    fn query(&self, filter: &EventFilter) -> Result<Vec<OccupancyEvent>, AppError> {
        Ok(self
            .events
            .iter()
            .filter(|event| {
                filter
                    .period_type
                    .is_none_or(|period| event.period_type == period)
                    && filter
                        .room_no
                        .as_deref()
                        .is_none_or(|room| event.room_no == room)
            })
            .cloned()
            .collect())
    }

    fn count(&self) -> Result<usize, AppError> {
        Ok(self.events.len())
    }
}

#[derive(Debug, Deserialize)]
pub struct EventLogFile {
    pub events: Vec<OccupancyEvent>,
}

#[derive(Debug, Error)]
pub enum EventLogError {
    #[error("failed to read event snapshot: {0}")]
    Read(#[from] std::io::Error),
    #[error("failed to parse event snapshot: {0}")]
    Parse(#[from] serde_json::Error),
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<InMemoryEventStore, EventLogError> {
    let contents = std::fs::read_to_string(path)?;
    let file: EventLogFile = serde_json::from_str(&contents)?;
    Ok(InMemoryEventStore::new(file.events))
}
