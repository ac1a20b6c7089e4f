//! Academic-period classification, consumed by the prediction engine.
//!
//! The calendar itself is maintained elsewhere; this module only answers
//! "which period category does this timestamp fall in".

use crate::survival::segment::PeriodType;
use serde::Deserialize;
use std::fmt;
use time::OffsetDateTime;

pub trait PeriodClassifier: Send + Sync + fmt::Debug {
    fn classify(&self, at: OffsetDateTime) -> PeriodType;
}

/// One named calendar window, half-open: `starts_at <= t < ends_at`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PeriodWindow {
    pub name: String,
    pub period_type: PeriodType,
    #[serde(with = "time::serde::rfc3339")]
    pub starts_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub ends_at: OffsetDateTime,
}

/// Table-driven classifier. When windows overlap, the most recently started
/// one wins; with no match the period defaults to `Normal`.
#[derive(Debug, Clone, Default)]
pub struct CalendarPeriods {
    windows: Vec<PeriodWindow>,
}

impl CalendarPeriods {
    pub fn new(windows: Vec<PeriodWindow>) -> Self {
        Self { windows }
    }
}

impl PeriodClassifier for CalendarPeriods {
    fn classify(&self, at: OffsetDateTime) -> PeriodType {
        self.windows
            .iter()
            .filter(|window| window.starts_at <= at && at < window.ends_at)
            .max_by_key(|window| window.starts_at)
            .map(|window| window.period_type)
            .unwrap_or(PeriodType::Normal)
    }
}

/// Constant classification, for tests and single-period deployments.
#[derive(Debug, Clone, Copy)]
pub struct FixedPeriod(pub PeriodType);

impl PeriodClassifier for FixedPeriod {
    fn classify(&self, _at: OffsetDateTime) -> PeriodType {
        self.0
    }
}
