//! Population segments and the specificity fallback chain.
//!
//! A segment identifies the slice of historical sessions a survival curve is
//! estimated over. Each attribute can be narrowed to a concrete value or
//! widened to `All`; the fallback chain walks from the most specific segment
//! to the least specific one until enough samples are found.

use crate::survival::sessions::SessionFilters;
use serde::{Deserialize, Serialize};
use std::fmt;
use time::Weekday;

/// Academic-calendar period category, supplied by the period classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PeriodType {
    Normal,
    Exam,
    Finals,
    Vacation,
}

impl PeriodType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "NORMAL",
            Self::Exam => "EXAM",
            Self::Finals => "FINALS",
            Self::Vacation => "VACATION",
        }
    }
}

impl fmt::Display for PeriodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fixed hour-of-day ranges a session start falls into. NIGHT wraps midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HourBucket {
    EarlyMorning,
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl HourBucket {
    /// Bucket for a local hour of day (0-23).
    pub fn from_hour(hour: u8) -> Self {
        match hour {
            5..=8 => Self::EarlyMorning,
            9..=12 => Self::Morning,
            13..=17 => Self::Afternoon,
            18..=21 => Self::Evening,
            _ => Self::Night,
        }
    }

    pub fn contains_hour(self, hour: u8) -> bool {
        Self::from_hour(hour) == self
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::EarlyMorning => "EARLY_MORNING",
            Self::Morning => "MORNING",
            Self::Afternoon => "AFTERNOON",
            Self::Evening => "EVENING",
            Self::Night => "NIGHT",
        }
    }
}

impl fmt::Display for HourBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DayType {
    Weekday,
    Weekend,
}

impl DayType {
    pub fn from_weekday(day: Weekday) -> Self {
        match day {
            Weekday::Saturday | Weekday::Sunday => Self::Weekend,
            _ => Self::Weekday,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Weekday => "WEEKDAY",
            Self::Weekend => "WEEKEND",
        }
    }
}

impl fmt::Display for DayType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A segment attribute that is either a concrete value or the wildcard.
///
/// Modeled as a sum type so the wildcard can never collide with a real
/// category value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope<T> {
    All,
    Only(T),
}

impl<T: fmt::Display> fmt::Display for Scope<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("ALL"),
            Self::Only(value) => value.fmt(f),
        }
    }
}

impl<T: Serialize> Serialize for Scope<T> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::All => serializer.serialize_str("ALL"),
            Self::Only(value) => value.serialize(serializer),
        }
    }
}

/// Identifier for the population slice a curve was estimated over.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct Segment {
    pub period_type: Scope<PeriodType>,
    pub hour_bucket: Scope<HourBucket>,
    pub day_type: Scope<DayType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_no: Option<String>,
}

impl Segment {
    /// The least specific segment: no filters at all.
    pub fn catch_all() -> Self {
        Self {
            period_type: Scope::All,
            hour_bucket: Scope::All,
            day_type: Scope::All,
            room_no: None,
        }
    }

    /// Cache key: ordered field values joined by `:`, room omitted when absent.
    pub fn cache_key(&self) -> String {
        let mut key = format!(
            "{}:{}:{}",
            self.period_type, self.hour_bucket, self.day_type
        );
        if let Some(room_no) = &self.room_no {
            key.push(':');
            key.push_str(room_no);
        }
        key
    }
}

/// The five fallback levels for a prediction context, most specific first.
///
/// The last level carries no filters, so it always yields a defined (possibly
/// empty) session set and the chain is guaranteed to terminate.
pub fn fallback_chain(
    period_type: PeriodType,
    hour_bucket: HourBucket,
    day_type: DayType,
    room_no: &str,
) -> [(Segment, SessionFilters); 5] {
    [
        (
            Segment {
                period_type: Scope::Only(period_type),
                hour_bucket: Scope::Only(hour_bucket),
                day_type: Scope::Only(day_type),
                room_no: Some(room_no.to_string()),
            },
            SessionFilters {
                period_type: Some(period_type),
                hour_bucket: Some(hour_bucket),
                day_type: Some(day_type),
                room_no: Some(room_no.to_string()),
            },
        ),
        (
            Segment {
                period_type: Scope::Only(period_type),
                hour_bucket: Scope::Only(hour_bucket),
                day_type: Scope::Only(day_type),
                room_no: None,
            },
            SessionFilters {
                period_type: Some(period_type),
                hour_bucket: Some(hour_bucket),
                day_type: Some(day_type),
                room_no: None,
            },
        ),
        (
            Segment {
                period_type: Scope::Only(period_type),
                hour_bucket: Scope::Only(hour_bucket),
                day_type: Scope::All,
                room_no: None,
            },
            SessionFilters {
                period_type: Some(period_type),
                hour_bucket: Some(hour_bucket),
                day_type: None,
                room_no: None,
            },
        ),
        (
            Segment {
                period_type: Scope::Only(period_type),
                hour_bucket: Scope::All,
                day_type: Scope::All,
                room_no: None,
            },
            SessionFilters {
                period_type: Some(period_type),
                hour_bucket: None,
                day_type: None,
                room_no: None,
            },
        ),
        (Segment::catch_all(), SessionFilters::default()),
    ]
}
