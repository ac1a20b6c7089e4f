//! Seat-vacancy survival prediction engine.
//!
//! Turns historical occupancy sessions into segment survival curves and
//! answers "when will this occupied seat free up" with conditional
//! remaining-time estimates.

use crate::calendar::PeriodClassifier;
use crate::error::AppError;
use crate::store::EventStore;
use serde::Serialize;
use time::{Duration, OffsetDateTime, UtcOffset};
use tracing::{debug, info, warn};

pub mod cache;
pub mod curve;
pub mod predict;
pub mod segment;
pub mod sessions;

use cache::{CachedCurve, CurveCache};
use curve::SurvivalPoint;
use predict::ProbabilityBand;
use segment::{DayType, HourBucket, Segment};
use sessions::SessionBounds;

/// Policy knobs for session extraction, curve building, and caching.
///
/// The defaults mirror the values the system has run with; none of them is
/// derived from anything, so they are all overridable from config.
#[derive(Debug, Clone)]
pub struct PredictionParams {
    pub min_session_minutes: f64,
    pub max_session_minutes: f64,
    pub curve_interval_minutes: u32,
    pub min_sample_size: usize,
    pub cache_ttl: Duration,
    pub default_median_minutes: f64,
    /// Fixed offset used for hour-of-day and weekday derivations.
    pub local_offset: UtcOffset,
}

impl Default for PredictionParams {
    fn default() -> Self {
        Self {
            min_session_minutes: 5.0,
            max_session_minutes: 1440.0,
            curve_interval_minutes: 15,
            min_sample_size: 30,
            cache_ttl: Duration::hours(6),
            default_median_minutes: 180.0,
            local_offset: time::macros::offset!(+9),
        }
    }
}

/// The answer to "when will this occupied seat become free".
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VacancyPrediction {
    pub median_remaining_minutes: u32,
    pub q25_remaining_minutes: u32,
    pub q75_remaining_minutes: u32,
    pub probability_bands: Vec<ProbabilityBand>,
    pub confidence: f64,
    /// Present only when requested: the curve re-based to elapsed = 0.
    pub survival_curve: Option<Vec<SurvivalPoint>>,
    pub segment: Segment,
    pub sample_size: usize,
}

#[derive(Debug)]
struct ResolvedCurve {
    curve: Vec<SurvivalPoint>,
    segment: Segment,
    sample_size: usize,
}

pub struct SurvivalEngine {
    store: Box<dyn EventStore>,
    calendar: Box<dyn PeriodClassifier>,
    cache: CurveCache,
    params: PredictionParams,
}

impl SurvivalEngine {
    pub fn new(
        store: Box<dyn EventStore>,
        calendar: Box<dyn PeriodClassifier>,
        params: PredictionParams,
    ) -> Self {
        let cache = CurveCache::new(params.cache_ttl);
        Self {
            store,
            calendar,
            cache,
            params,
        }
    }

    /// Predict the remaining occupied time for a seat in `room_no` that has
    /// been occupied since `occupied_since`.
    pub fn predict_vacancy(
        &self,
        room_no: &str,
        occupied_since: OffsetDateTime,
        include_curve: bool,
    ) -> Result<VacancyPrediction, AppError> {
        self.predict_vacancy_at(room_no, occupied_since, include_curve, OffsetDateTime::now_utc())
    }

    pub fn predict_vacancy_at(
        &self,
        room_no: &str,
        occupied_since: OffsetDateTime,
        include_curve: bool,
        now: OffsetDateTime,
    ) -> Result<VacancyPrediction, AppError> {
        let elapsed_minutes = ((now - occupied_since).as_seconds_f64() / 60.0).max(0.0);

        let period_type = self.calendar.classify(occupied_since);
        let local_start = occupied_since.to_offset(self.params.local_offset);
        let hour_bucket = HourBucket::from_hour(local_start.hour());
        let day_type = DayType::from_weekday(local_start.weekday());

        let resolved = self.resolve_curve(period_type, hour_bucket, day_type, room_no, now)?;

        // Conditional on the session having survived this long:
        // S(t | T > E) = S(E + t) / S(E).
        let s_at_elapsed = curve::interpolate_survival(&resolved.curve, elapsed_minutes);

        let (median, q25, q75) = if s_at_elapsed <= 0.0 {
            // The population has effectively always vacated by now.
            (0.0, 0.0, 0.0)
        } else {
            (
                predict::conditional_quantile(&resolved.curve, elapsed_minutes, s_at_elapsed, 0.5),
                predict::conditional_quantile(&resolved.curve, elapsed_minutes, s_at_elapsed, 0.25),
                predict::conditional_quantile(&resolved.curve, elapsed_minutes, s_at_elapsed, 0.75),
            )
        };

        Ok(VacancyPrediction {
            median_remaining_minutes: median.round() as u32,
            q25_remaining_minutes: q25.round() as u32,
            q75_remaining_minutes: q75.round() as u32,
            probability_bands: predict::probability_bands(
                &resolved.curve,
                elapsed_minutes,
                s_at_elapsed,
            ),
            confidence: predict::confidence_for_sample(
                resolved.sample_size,
                self.params.min_sample_size,
            ),
            survival_curve: include_curve
                .then(|| predict::conditional_curve(&resolved.curve, elapsed_minutes)),
            segment: resolved.segment,
            sample_size: resolved.sample_size,
        })
    }

    /// Walk the fallback chain until a segment reaches the sample threshold.
    ///
    /// A fresh cached entry below the threshold falls through to the next
    /// level without re-extraction; only a missing or expired entry triggers
    /// an extract-and-build, whose result is cached either way.
    fn resolve_curve(
        &self,
        period_type: segment::PeriodType,
        hour_bucket: HourBucket,
        day_type: DayType,
        room_no: &str,
        now: OffsetDateTime,
    ) -> Result<ResolvedCurve, AppError> {
        for (candidate, filters) in segment::fallback_chain(period_type, hour_bucket, day_type, room_no)
        {
            let key = candidate.cache_key();

            if let Some(cached) = self.cache.get(&key, now)? {
                if cached.sample_size >= self.params.min_sample_size {
                    return Ok(ResolvedCurve {
                        curve: cached.curve,
                        segment: candidate,
                        sample_size: cached.sample_size,
                    });
                }
                debug!(
                    segment = %key,
                    sample_size = cached.sample_size,
                    "Cached segment below sample threshold, falling back"
                );
                continue;
            }

            let extracted = sessions::fetch_sessions(
                self.store.as_ref(),
                &filters,
                self.session_bounds(),
                self.params.local_offset,
            )?;
            let built = curve::build_curve(&extracted, self.params.curve_interval_minutes);
            let sample_size = extracted.len();

            self.cache.put(
                key.clone(),
                CachedCurve {
                    curve: built.clone(),
                    sample_size,
                    updated_at: now,
                },
            )?;

            if sample_size >= self.params.min_sample_size {
                return Ok(ResolvedCurve {
                    curve: built,
                    segment: candidate,
                    sample_size,
                });
            }
            debug!(
                segment = %key,
                sample_size,
                min_sample_size = self.params.min_sample_size,
                "Segment below sample threshold, falling back"
            );
        }

        warn!("No segment reached the sample threshold, using default curve");
        Ok(ResolvedCurve {
            curve: curve::default_curve(
                self.params.default_median_minutes,
                self.params.max_session_minutes,
                self.params.curve_interval_minutes,
            ),
            segment: Segment::catch_all(),
            sample_size: 0,
        })
    }

    /// Clear every cached curve. Idempotent; safe to call while predictions
    /// are in flight. Returns the number of evicted entries.
    pub fn refresh_cache(&self) -> Result<usize, AppError> {
        let evicted = self.cache.clear()?;
        info!(evicted, "Survival curve cache cleared");
        Ok(evicted)
    }

    /// Total events in the backing store, for health reporting.
    pub fn event_count(&self) -> Result<usize, AppError> {
        self.store.count()
    }

    fn session_bounds(&self) -> SessionBounds {
        SessionBounds {
            min_minutes: self.params.min_session_minutes,
            max_minutes: self.params.max_session_minutes,
        }
    }
}

impl std::fmt::Debug for SurvivalEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SurvivalEngine")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}
