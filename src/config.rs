use crate::calendar::PeriodWindow;
use crate::survival::PredictionParams;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use time::UtcOffset;

pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";
pub const DEFAULT_SERVER_PORT: u16 = 8080;
pub const DEFAULT_TIMEZONE_OFFSET_HOURS: i8 = 9;
pub const DEFAULT_CACHE_TTL_SECS: u64 = 6 * 60 * 60;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub app: AppSection,
    pub logging: LoggingSection,
    #[serde(default)]
    pub events: Option<EventsSection>,
    #[serde(default)]
    pub server: Option<ServerSection>,
    #[serde(default)]
    pub prediction: Option<PredictionSection>,
    #[serde(default)]
    pub calendar: Option<CalendarSection>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppSection {
    pub name: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingSection {
    pub level: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EventsSection {
    /// Path to the JSON occupancy-event snapshot loaded at startup.
    pub snapshot_path: Option<PathBuf>,
    /// Fixed local offset for hour-of-day and weekday derivations (default: +9).
    pub timezone_offset_hours: Option<i8>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSection {
    /// Port to listen on (default: 8080)
    pub port: Option<u16>,
}

/// Overrides for the prediction policy constants. Anything omitted keeps the
/// value the system has always run with.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct PredictionSection {
    pub min_session_minutes: Option<f64>,
    pub max_session_minutes: Option<f64>,
    pub curve_interval_minutes: Option<u32>,
    pub min_sample_size: Option<usize>,
    pub cache_ttl_secs: Option<u64>,
    pub default_median_minutes: Option<f64>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct CalendarSection {
    #[serde(default)]
    pub periods: Vec<PeriodWindow>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Read(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

pub fn load_default() -> Result<Config, ConfigError> {
    load_from_path(DEFAULT_CONFIG_PATH)
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let contents = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&contents)?;
    Ok(config)
}

impl Config {
    pub fn snapshot_path(&self) -> Option<&Path> {
        let path = self.events.as_ref()?.snapshot_path.as_deref()?;
        if path.as_os_str().is_empty() {
            None
        } else {
            Some(path)
        }
    }

    /// Returns the server port (default: 8080)
    pub fn server_port(&self) -> u16 {
        self.server
            .as_ref()
            .and_then(|s| s.port)
            .unwrap_or(DEFAULT_SERVER_PORT)
    }

    /// Local offset for calendar math; an out-of-range value falls back to UTC.
    pub fn local_offset(&self) -> UtcOffset {
        let hours = self
            .events
            .as_ref()
            .and_then(|e| e.timezone_offset_hours)
            .unwrap_or(DEFAULT_TIMEZONE_OFFSET_HOURS);
        UtcOffset::from_hms(hours, 0, 0).unwrap_or(UtcOffset::UTC)
    }

    /// How often the cache-refresh thread clears curves (same as the TTL).
    pub fn cache_refresh_interval(&self) -> Duration {
        let secs = self
            .prediction
            .as_ref()
            .and_then(|p| p.cache_ttl_secs)
            .unwrap_or(DEFAULT_CACHE_TTL_SECS);
        Duration::from_secs(secs)
    }

    /// Prediction policy: configured overrides on top of the defaults.
    pub fn prediction_params(&self) -> PredictionParams {
        let defaults = PredictionParams::default();
        let section = self.prediction.clone().unwrap_or_default();
        PredictionParams {
            min_session_minutes: section
                .min_session_minutes
                .unwrap_or(defaults.min_session_minutes),
            max_session_minutes: section
                .max_session_minutes
                .unwrap_or(defaults.max_session_minutes),
            curve_interval_minutes: section
                .curve_interval_minutes
                .unwrap_or(defaults.curve_interval_minutes),
            min_sample_size: section.min_sample_size.unwrap_or(defaults.min_sample_size),
            cache_ttl: section
                .cache_ttl_secs
                .map(|secs| time::Duration::seconds(secs as i64))
                .unwrap_or(defaults.cache_ttl),
            default_median_minutes: section
                .default_median_minutes
                .unwrap_or(defaults.default_median_minutes),
            local_offset: self.local_offset(),
        }
    }

    pub fn calendar_periods(&self) -> Vec<PeriodWindow> {
        self.calendar
            .as_ref()
            .map(|c| c.periods.clone())
            .unwrap_or_default()
    }
}
