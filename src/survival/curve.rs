//! Survival curve estimation over completed session durations.
//!
//! All sessions are complete (no censoring), so the Kaplan-Meier estimator
//! reduces to the empirical survivor fraction sampled at fixed intervals.

use crate::survival::sessions::Session;
use serde::Serialize;

/// One sample of S(t): the fraction of sessions still ongoing at `t` minutes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct SurvivalPoint {
    pub minutes_from_start: u32,
    pub survival_probability: f64,
    pub sample_size: usize,
}

/// Build a survival curve from sessions, sampled every `interval_minutes`.
///
/// The curve starts at `(0, 1.0)`, is non-increasing, and stops at the first
/// point where no session survives. Empty input yields an empty curve; the
/// caller falls back to a coarser segment.
pub fn build_curve(sessions: &[Session], interval_minutes: u32) -> Vec<SurvivalPoint> {
    if sessions.is_empty() {
        return Vec::new();
    }

    let mut durations: Vec<f64> = sessions.iter().map(|s| s.duration_minutes).collect();
    durations.sort_by(f64::total_cmp);

    let n = durations.len();
    let max_duration = durations[n - 1];
    let mut points = Vec::new();

    let mut t = 0u32;
    while f64::from(t) <= max_duration + f64::from(interval_minutes) {
        // partition_point is a binary upper bound: count of durations <= t.
        let ended = durations.partition_point(|d| *d <= f64::from(t));
        let surviving = n - ended;
        points.push(SurvivalPoint {
            minutes_from_start: t,
            survival_probability: surviving as f64 / n as f64,
            sample_size: n,
        });

        if surviving == 0 {
            break;
        }
        t += interval_minutes;
    }

    points
}

/// Synthetic exponential-decay curve used when no segment has enough data.
///
/// `sample_size = 0` on every point signals the lack of an empirical basis to
/// downstream confidence scoring.
pub fn default_curve(
    median_minutes: f64,
    max_minutes: f64,
    interval_minutes: u32,
) -> Vec<SurvivalPoint> {
    let lambda = std::f64::consts::LN_2 / median_minutes;
    let mut points = Vec::new();

    let mut t = 0u32;
    while f64::from(t) <= max_minutes {
        points.push(SurvivalPoint {
            minutes_from_start: t,
            survival_probability: (-lambda * f64::from(t)).exp(),
            sample_size: 0,
        });
        t += interval_minutes;
    }

    points
}

/// Survival probability at `minutes`, linearly interpolated between curve
/// points, flat-extrapolated past the last point. Empty curves read as 0.
pub fn interpolate_survival(curve: &[SurvivalPoint], minutes: f64) -> f64 {
    let Some(last) = curve.last() else {
        return 0.0;
    };
    if minutes <= 0.0 {
        return 1.0;
    }
    if minutes >= f64::from(last.minutes_from_start) {
        return last.survival_probability;
    }

    for pair in curve.windows(2) {
        let (prev, curr) = (&pair[0], &pair[1]);
        if minutes <= f64::from(curr.minutes_from_start) {
            let span = f64::from(curr.minutes_from_start) - f64::from(prev.minutes_from_start);
            let ratio = (minutes - f64::from(prev.minutes_from_start)) / span;
            return prev.survival_probability
                + ratio * (curr.survival_probability - prev.survival_probability);
        }
    }

    last.survival_probability
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::survival::segment::{DayType, PeriodType};
    use time::macros::datetime;

    fn session_with_duration(duration_minutes: f64) -> Session {
        Session {
            room_no: "301".to_string(),
            seat_no: "A1".to_string(),
            start_time: datetime!(2026-03-02 10:00 +9),
            duration_minutes,
            period_type: PeriodType::Normal,
            start_hour: 10,
            day_type: DayType::Weekday,
        }
    }

    fn probabilities(curve: &[SurvivalPoint]) -> Vec<(u32, f64)> {
        curve
            .iter()
            .map(|p| (p.minutes_from_start, p.survival_probability))
            .collect()
    }

    #[test]
    fn curve_matches_known_durations() {
        let sessions: Vec<Session> = [30.0, 60.0, 90.0, 120.0]
            .into_iter()
            .map(session_with_duration)
            .collect();

        let curve = build_curve(&sessions, 15);

        assert_eq!(
            probabilities(&curve),
            vec![
                (0, 1.0),
                (15, 1.0),
                (30, 0.75),
                (45, 0.75),
                (60, 0.5),
                (75, 0.5),
                (90, 0.25),
                (105, 0.25),
                (120, 0.0),
            ]
        );
        assert!(curve.iter().all(|p| p.sample_size == 4));
    }

    #[test]
    fn curve_stops_at_full_attrition() {
        let sessions: Vec<Session> = [30.0, 60.0, 90.0, 120.0]
            .into_iter()
            .map(session_with_duration)
            .collect();

        let curve = build_curve(&sessions, 15);

        assert_eq!(curve.last().map(|p| p.minutes_from_start), Some(120));
        assert_eq!(curve.last().map(|p| p.survival_probability), Some(0.0));
    }

    #[test]
    fn empty_sessions_yield_empty_curve() {
        assert!(build_curve(&[], 15).is_empty());
    }

    #[test]
    fn curve_is_non_increasing_and_starts_at_one() {
        let sessions: Vec<Session> = [7.5, 22.0, 22.0, 48.0, 130.0, 260.5]
            .into_iter()
            .map(session_with_duration)
            .collect();

        let curve = build_curve(&sessions, 15);

        assert_eq!(curve[0].minutes_from_start, 0);
        assert_eq!(curve[0].survival_probability, 1.0);
        for pair in curve.windows(2) {
            assert!(pair[1].survival_probability <= pair[0].survival_probability);
            assert!(pair[1].minutes_from_start > pair[0].minutes_from_start);
        }
    }

    #[test]
    fn interpolation_handles_edges() {
        let sessions: Vec<Session> = [30.0, 60.0, 90.0, 120.0]
            .into_iter()
            .map(session_with_duration)
            .collect();
        let curve = build_curve(&sessions, 15);

        assert_eq!(interpolate_survival(&curve, 0.0), 1.0);
        assert_eq!(interpolate_survival(&curve, -5.0), 1.0);
        assert_eq!(interpolate_survival(&curve, 30.0), 0.75);
        // Past the last point: flat extrapolation of the final value.
        assert_eq!(interpolate_survival(&curve, 500.0), 0.0);
        assert_eq!(interpolate_survival(&[], 10.0), 0.0);
    }

    #[test]
    fn interpolation_is_linear_between_points() {
        let sessions: Vec<Session> = [30.0, 60.0, 90.0, 120.0]
            .into_iter()
            .map(session_with_duration)
            .collect();
        let curve = build_curve(&sessions, 15);

        // Midway between S(45)=0.75 and S(60)=0.5.
        let s = interpolate_survival(&curve, 52.5);
        assert!((s - 0.625).abs() < 1e-9);
    }

    #[test]
    fn default_curve_halves_at_the_median() {
        let curve = default_curve(180.0, 1440.0, 15);

        assert_eq!(curve[0].minutes_from_start, 0);
        assert_eq!(curve[0].survival_probability, 1.0);
        assert_eq!(curve.last().map(|p| p.minutes_from_start), Some(1440));
        assert!(curve.iter().all(|p| p.sample_size == 0));

        let at_median = interpolate_survival(&curve, 180.0);
        assert!((at_median - 0.5).abs() < 1e-9);

        for pair in curve.windows(2) {
            assert!(pair[1].survival_probability < pair[0].survival_probability);
        }
    }
}
