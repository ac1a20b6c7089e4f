use crate::error::AppError;
use crate::survival::segment::PeriodType;
use serde::Deserialize;
use std::fmt;
use time::OffsetDateTime;

pub mod memory;
pub mod mock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    Occupied,
    Vacated,
}

/// One occupancy transition from the append-only event log. Read-only here;
/// the log is owned by an external collector.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OccupancyEvent {
    pub room_no: String,
    pub seat_no: String,
    pub kind: EventKind,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub period_type: PeriodType,
}

/// Filters a store may apply before events are paired into sessions.
///
/// Only attributes stored on the event itself belong here. Anything derived
/// from the OCCUPIED timestamp (hour bucket, day type) must be filtered after
/// pairing, or the VACATED half of a pair could be dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventFilter {
    pub period_type: Option<PeriodType>,
    pub room_no: Option<String>,
}

/// Read-only occupancy event source.
///
/// Implementations must return events ordered by (room, seat, timestamp) so
/// that consecutive rows within one seat can be paired.
pub trait EventStore: Send + Sync + fmt::Debug {
    fn query(&self, filter: &EventFilter) -> Result<Vec<OccupancyEvent>, AppError>;

    /// Total number of events the store holds, for health reporting.
    fn count(&self) -> Result<usize, AppError> {
        Ok(self.query(&EventFilter::default())?.len())
    }
}
