//! Conditional remaining-time math over a survival curve.
//!
//! Everything here conditions on the session having already lasted
//! `elapsed_minutes`: S(t | T > E) = S(E + t) / S(E).

use crate::survival::curve::{self, SurvivalPoint};
use serde::Serialize;

/// Horizons (minutes) for the "vacated within N minutes" probability bands.
pub const PROBABILITY_BAND_HORIZONS: [u32; 6] = [15, 30, 60, 120, 180, 240];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ProbabilityBand {
    pub within_minutes: u32,
    pub probability: f64,
}

/// The q-th quantile of remaining minutes given `elapsed_minutes` already
/// spent, found where S(elapsed + t) = S(elapsed) * (1 - q).
///
/// Scans the curve for the bracketing pair and interpolates in probability
/// space; if the curve ends before the target is reached, the final point's
/// time is used.
pub fn conditional_quantile(
    curve: &[SurvivalPoint],
    elapsed_minutes: f64,
    s_at_elapsed: f64,
    quantile: f64,
) -> f64 {
    let target_absolute = s_at_elapsed * (1.0 - quantile);

    for pair in curve.windows(2) {
        let (prev, curr) = (&pair[0], &pair[1]);
        if curr.survival_probability <= target_absolute
            && prev.survival_probability >= target_absolute
        {
            let drop = prev.survival_probability - curr.survival_probability;
            let ratio = if drop == 0.0 {
                0.0
            } else {
                (prev.survival_probability - target_absolute) / drop
            };
            let span = f64::from(curr.minutes_from_start) - f64::from(prev.minutes_from_start);
            let absolute_time = f64::from(prev.minutes_from_start) + ratio * span;
            return (absolute_time - elapsed_minutes).max(0.0);
        }
    }

    match curve.last() {
        Some(last) => (f64::from(last.minutes_from_start) - elapsed_minutes).max(0.0),
        None => 0.0,
    }
}

/// Probability of vacating within each fixed horizon:
/// P = 1 - S(elapsed + horizon) / S(elapsed), clamped to [0, 1] and rounded
/// to 3 decimals. A dead curve (S(elapsed) <= 0) yields probability 1.
pub fn probability_bands(
    curve: &[SurvivalPoint],
    elapsed_minutes: f64,
    s_at_elapsed: f64,
) -> Vec<ProbabilityBand> {
    PROBABILITY_BAND_HORIZONS
        .iter()
        .map(|&within_minutes| {
            if s_at_elapsed <= 0.0 {
                return ProbabilityBand {
                    within_minutes,
                    probability: 1.0,
                };
            }
            let future_s =
                curve::interpolate_survival(curve, elapsed_minutes + f64::from(within_minutes));
            let probability = (1.0 - future_s / s_at_elapsed).clamp(0.0, 1.0);
            ProbabilityBand {
                within_minutes,
                probability: round3(probability),
            }
        })
        .collect()
}

/// Confidence score as a step function of the sample size behind the curve.
pub fn confidence_for_sample(sample_size: usize, min_sample_size: usize) -> f64 {
    if sample_size == 0 {
        0.0
    } else if sample_size < min_sample_size {
        0.3
    } else if sample_size < 100 {
        0.5
    } else if sample_size < 500 {
        0.7
    } else if sample_size < 1000 {
        0.85
    } else {
        0.95
    }
}

/// The curve re-based to `elapsed_minutes = 0` and re-normalized by
/// S(elapsed), for chart consumers. Empty when S(elapsed) <= 0.
pub fn conditional_curve(curve: &[SurvivalPoint], elapsed_minutes: f64) -> Vec<SurvivalPoint> {
    let s_at_elapsed = curve::interpolate_survival(curve, elapsed_minutes);
    if s_at_elapsed <= 0.0 {
        return Vec::new();
    }

    curve
        .iter()
        .filter(|p| f64::from(p.minutes_from_start) >= elapsed_minutes)
        .map(|p| SurvivalPoint {
            minutes_from_start: (f64::from(p.minutes_from_start) - elapsed_minutes).round() as u32,
            survival_probability: round3(p.survival_probability / s_at_elapsed),
            sample_size: p.sample_size,
        })
        .collect()
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    /// The curve for durations [30, 60, 90, 120] at a 15-minute interval.
    fn known_curve() -> Vec<SurvivalPoint> {
        [
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
        .into_iter()
        .map(|(minutes_from_start, survival_probability)| SurvivalPoint {
            minutes_from_start,
            survival_probability,
            sample_size: 4,
        })
        .collect()
    }

    #[test]
    fn median_conditional_on_elapsed_time() {
        let curve = known_curve();
        let s_at_elapsed = curve::interpolate_survival(&curve, 40.0);
        assert!((s_at_elapsed - 0.75).abs() < 1e-9);

        // Target S = 0.375, bracketed by (75, 0.5) and (90, 0.25):
        // absolute time 82.5, so 42.5 minutes remain.
        let median = conditional_quantile(&curve, 40.0, s_at_elapsed, 0.5);
        assert!((median - 42.5).abs() < 1e-9);

        let q25 = conditional_quantile(&curve, 40.0, s_at_elapsed, 0.25);
        assert!((q25 - 16.25).abs() < 1e-9);

        let q75 = conditional_quantile(&curve, 40.0, s_at_elapsed, 0.75);
        assert!((q75 - 68.75).abs() < 1e-9);
    }

    #[test]
    fn quantile_falls_back_to_final_point_when_not_bracketed() {
        // Curve that never reaches the target probability.
        let curve = vec![
            SurvivalPoint {
                minutes_from_start: 0,
                survival_probability: 1.0,
                sample_size: 3,
            },
            SurvivalPoint {
                minutes_from_start: 15,
                survival_probability: 0.9,
                sample_size: 3,
            },
        ];

        let t = conditional_quantile(&curve, 0.0, 1.0, 0.5);
        assert_eq!(t, 15.0);
    }

    #[test]
    fn quantile_is_clamped_to_zero() {
        let curve = known_curve();
        // Elapsed beyond the bracketing time for an easy quantile.
        let t = conditional_quantile(&curve, 119.0, 0.05, 0.25);
        assert_eq!(t, 0.0);
    }

    #[test]
    fn bands_are_non_decreasing_in_horizon() {
        let curve = known_curve();
        let s_at_elapsed = curve::interpolate_survival(&curve, 40.0);

        let bands = probability_bands(&curve, 40.0, s_at_elapsed);

        assert_eq!(bands.len(), PROBABILITY_BAND_HORIZONS.len());
        for pair in bands.windows(2) {
            assert!(pair[1].probability >= pair[0].probability);
        }
        assert_eq!(bands.last().map(|b| b.probability), Some(1.0));
    }

    #[test]
    fn bands_match_manual_computation() {
        let curve = known_curve();
        let bands = probability_bands(&curve, 40.0, 0.75);

        // S(55) = 0.75 - (10/15) * 0.25 = 0.58333..., so
        // P = 1 - 0.58333/0.75 = 0.22222 -> 0.222 after rounding.
        assert_eq!(bands[0].within_minutes, 15);
        assert_eq!(bands[0].probability, 0.222);
    }

    #[test]
    fn dead_curve_gives_certain_bands() {
        let bands = probability_bands(&known_curve(), 200.0, 0.0);
        assert!(bands.iter().all(|b| b.probability == 1.0));
    }

    #[test]
    fn confidence_steps_with_sample_size() {
        assert_eq!(confidence_for_sample(0, 30), 0.0);
        assert_eq!(confidence_for_sample(1, 30), 0.3);
        assert_eq!(confidence_for_sample(29, 30), 0.3);
        assert_eq!(confidence_for_sample(30, 30), 0.5);
        assert_eq!(confidence_for_sample(99, 30), 0.5);
        assert_eq!(confidence_for_sample(100, 30), 0.7);
        assert_eq!(confidence_for_sample(499, 30), 0.7);
        assert_eq!(confidence_for_sample(500, 30), 0.85);
        assert_eq!(confidence_for_sample(999, 30), 0.85);
        assert_eq!(confidence_for_sample(1000, 30), 0.95);
    }

    #[test]
    fn conditional_curve_rebases_and_renormalizes() {
        let curve = known_curve();

        let rebased = conditional_curve(&curve, 45.0);

        // Points at 45, 60, 75, 90, 105, 120 survive the cut.
        assert_eq!(rebased.len(), 6);
        assert_eq!(rebased[0].minutes_from_start, 0);
        assert_eq!(rebased[0].survival_probability, 1.0);
        assert_eq!(rebased[1].minutes_from_start, 15);
        // 0.5 / 0.75 = 0.667 after rounding.
        assert_eq!(rebased[1].survival_probability, 0.667);
        assert_eq!(rebased.last().map(|p| p.survival_probability), Some(0.0));
    }

    #[test]
    fn conditional_curve_is_empty_when_population_exhausted() {
        assert!(conditional_curve(&known_curve(), 300.0).is_empty());
    }
}
