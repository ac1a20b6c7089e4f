//! Session extraction: pairing occupancy transitions into completed sessions.
//!
//! Filters on attributes stored with the event (period type, room) are pushed
//! into the store query. Filters on attributes derived from the OCCUPIED
//! timestamp (hour bucket, day type) run after pairing; applying them earlier
//! could drop the VACATED event needed to complete a pair.

use crate::error::AppError;
use crate::store::{EventFilter, EventKind, EventStore, OccupancyEvent};
use crate::survival::segment::{DayType, HourBucket, PeriodType};
use time::{OffsetDateTime, UtcOffset};

/// One continuous occupied interval for a specific seat.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub room_no: String,
    pub seat_no: String,
    pub start_time: OffsetDateTime,
    pub duration_minutes: f64,
    pub period_type: PeriodType,
    /// Hour of day the session started, in the resource's local time.
    pub start_hour: u8,
    pub day_type: DayType,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionFilters {
    pub period_type: Option<PeriodType>,
    pub hour_bucket: Option<HourBucket>,
    pub day_type: Option<DayType>,
    pub room_no: Option<String>,
}

impl SessionFilters {
    /// The subset of filters a store can apply before pairing.
    fn event_filter(&self) -> EventFilter {
        EventFilter {
            period_type: self.period_type,
            room_no: self.room_no.clone(),
        }
    }
}

/// Accepted session duration range, in minutes. Pairs outside it are noise
/// (bounced occupancy) or unterminated sessions and are discarded.
#[derive(Debug, Clone, Copy)]
pub struct SessionBounds {
    pub min_minutes: f64,
    pub max_minutes: f64,
}

/// Query the store and extract completed sessions matching `filters`.
///
/// Store errors propagate unmodified; retry policy belongs to the caller.
pub fn fetch_sessions(
    store: &dyn EventStore,
    filters: &SessionFilters,
    bounds: SessionBounds,
    local_offset: UtcOffset,
) -> Result<Vec<Session>, AppError> {
    let events = store.query(&filters.event_filter())?;
    let mut sessions = pair_sessions(&events, bounds, local_offset);
    sessions.retain(|session| matches_derived_filters(session, filters));
    Ok(sessions)
}

/// Pair each OCCUPIED event with the immediately following event on the same
/// (room, seat). Only OCCUPIED followed by VACATED forms a session; an
/// orphaned OCCUPIED (double scan, missing VACATED) is skipped silently.
fn pair_sessions(
    events: &[OccupancyEvent],
    bounds: SessionBounds,
    local_offset: UtcOffset,
) -> Vec<Session> {
    let mut sessions = Vec::new();

    for pair in events.windows(2) {
        let (current, next) = (&pair[0], &pair[1]);
        if current.room_no != next.room_no || current.seat_no != next.seat_no {
            continue;
        }
        if current.kind != EventKind::Occupied || next.kind != EventKind::Vacated {
            continue;
        }

        let duration_minutes = (next.timestamp - current.timestamp).as_seconds_f64() / 60.0;
        if duration_minutes < bounds.min_minutes || duration_minutes > bounds.max_minutes {
            continue;
        }

        let local_start = current.timestamp.to_offset(local_offset);
        sessions.push(Session {
            room_no: current.room_no.clone(),
            seat_no: current.seat_no.clone(),
            start_time: current.timestamp,
            duration_minutes,
            period_type: current.period_type,
            start_hour: local_start.hour(),
            day_type: DayType::from_weekday(local_start.weekday()),
        });
    }

    sessions
}

fn matches_derived_filters(session: &Session, filters: &SessionFilters) -> bool {
    if let Some(bucket) = filters.hour_bucket
        && !bucket.contains_hour(session.start_hour)
    {
        return false;
    }
    if let Some(day_type) = filters.day_type
        && session.day_type != day_type
    {
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{datetime, offset};

    const KST: UtcOffset = offset!(+9);

    const BOUNDS: SessionBounds = SessionBounds {
        min_minutes: 5.0,
        max_minutes: 1440.0,
    };

    fn event(
        room_no: &str,
        seat_no: &str,
        kind: EventKind,
        timestamp: OffsetDateTime,
    ) -> OccupancyEvent {
        OccupancyEvent {
            room_no: room_no.to_string(),
            seat_no: seat_no.to_string(),
            kind,
            timestamp,
            period_type: PeriodType::Normal,
        }
    }

    #[test]
    fn pairs_occupied_with_following_vacated() {
        let events = vec![
            event(
                "301",
                "A1",
                EventKind::Occupied,
                datetime!(2026-03-02 10:00 +9),
            ),
            event(
                "301",
                "A1",
                EventKind::Vacated,
                datetime!(2026-03-02 11:30 +9),
            ),
        ];

        let sessions = pair_sessions(&events, BOUNDS, KST);

        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].duration_minutes, 90.0);
        assert_eq!(sessions[0].start_hour, 10);
        assert_eq!(sessions[0].day_type, DayType::Weekday);
    }

    #[test]
    fn skips_orphaned_occupied_events() {
        // Double OCCUPIED scan: only the second one has a VACATED partner.
        let events = vec![
            event(
                "301",
                "A1",
                EventKind::Occupied,
                datetime!(2026-03-02 10:00 +9),
            ),
            event(
                "301",
                "A1",
                EventKind::Occupied,
                datetime!(2026-03-02 10:20 +9),
            ),
            event(
                "301",
                "A1",
                EventKind::Vacated,
                datetime!(2026-03-02 11:00 +9),
            ),
        ];

        let sessions = pair_sessions(&events, BOUNDS, KST);

        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].duration_minutes, 40.0);
    }

    #[test]
    fn skips_vacated_without_preceding_occupied() {
        let events = vec![
            event(
                "301",
                "A1",
                EventKind::Vacated,
                datetime!(2026-03-02 09:00 +9),
            ),
            event(
                "301",
                "A1",
                EventKind::Occupied,
                datetime!(2026-03-02 10:00 +9),
            ),
        ];

        assert!(pair_sessions(&events, BOUNDS, KST).is_empty());
    }

    #[test]
    fn discards_durations_outside_bounds() {
        let events = vec![
            // 3 minutes: below the minimum, a bounce.
            event(
                "301",
                "A1",
                EventKind::Occupied,
                datetime!(2026-03-02 10:00 +9),
            ),
            event(
                "301",
                "A1",
                EventKind::Vacated,
                datetime!(2026-03-02 10:03 +9),
            ),
            // 25 hours: over the maximum, an unterminated session.
            event(
                "301",
                "B2",
                EventKind::Occupied,
                datetime!(2026-03-02 10:00 +9),
            ),
            event(
                "301",
                "B2",
                EventKind::Vacated,
                datetime!(2026-03-03 11:00 +9),
            ),
        ];

        assert!(pair_sessions(&events, BOUNDS, KST).is_empty());
    }

    #[test]
    fn does_not_pair_across_seats() {
        let events = vec![
            event(
                "301",
                "A1",
                EventKind::Occupied,
                datetime!(2026-03-02 10:00 +9),
            ),
            event(
                "301",
                "B2",
                EventKind::Vacated,
                datetime!(2026-03-02 11:00 +9),
            ),
        ];

        assert!(pair_sessions(&events, BOUNDS, KST).is_empty());
    }

    #[test]
    fn hour_bucket_filter_applies_to_session_start_only() {
        // Starts 08:30 (EARLY_MORNING), ends 09:40 (MORNING). The session
        // belongs to the start bucket; the crossing must not discard it.
        let events = vec![
            event(
                "301",
                "A1",
                EventKind::Occupied,
                datetime!(2026-03-02 08:30 +9),
            ),
            event(
                "301",
                "A1",
                EventKind::Vacated,
                datetime!(2026-03-02 09:40 +9),
            ),
        ];
        let sessions = pair_sessions(&events, BOUNDS, KST);

        let filters = SessionFilters {
            hour_bucket: Some(HourBucket::EarlyMorning),
            ..SessionFilters::default()
        };
        let kept: Vec<&Session> = sessions
            .iter()
            .filter(|s| matches_derived_filters(s, &filters))
            .collect();
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].duration_minutes, 70.0);

        let morning = SessionFilters {
            hour_bucket: Some(HourBucket::Morning),
            ..SessionFilters::default()
        };
        assert!(!matches_derived_filters(&sessions[0], &morning));
    }

    #[test]
    fn day_type_uses_local_offset() {
        // Friday 16:30 UTC is Saturday 01:30 in +9, so it counts as WEEKEND.
        let events = vec![
            event(
                "301",
                "A1",
                EventKind::Occupied,
                datetime!(2026-03-06 16:30 UTC),
            ),
            event(
                "301",
                "A1",
                EventKind::Vacated,
                datetime!(2026-03-06 17:30 UTC),
            ),
        ];

        let sessions = pair_sessions(&events, BOUNDS, KST);

        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].day_type, DayType::Weekend);
        assert_eq!(sessions[0].start_hour, 1);
    }

    #[test]
    fn night_sessions_match_the_wrapping_bucket() {
        let events = vec![
            event(
                "301",
                "A1",
                EventKind::Occupied,
                datetime!(2026-03-02 23:10 +9),
            ),
            event(
                "301",
                "A1",
                EventKind::Vacated,
                datetime!(2026-03-03 00:30 +9),
            ),
            event(
                "301",
                "B2",
                EventKind::Occupied,
                datetime!(2026-03-03 03:00 +9),
            ),
            event(
                "301",
                "B2",
                EventKind::Vacated,
                datetime!(2026-03-03 04:00 +9),
            ),
        ];
        let sessions = pair_sessions(&events, BOUNDS, KST);
        assert_eq!(sessions.len(), 2);

        let filters = SessionFilters {
            hour_bucket: Some(HourBucket::Night),
            ..SessionFilters::default()
        };
        assert!(
            sessions
                .iter()
                .all(|s| matches_derived_filters(s, &filters))
        );
    }
}
