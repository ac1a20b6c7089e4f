//! Time-bounded cache of built survival curves, keyed by segment.
//!
//! Writes are idempotent full-value overwrites, so concurrent requests that
//! both miss the same segment may do duplicate build work and the last writer
//! wins. That duplication is bounded and accepted; no per-key locking.

use crate::error::AppError;
use crate::survival::curve::SurvivalPoint;
use std::collections::HashMap;
use std::sync::RwLock;
use time::{Duration, OffsetDateTime};

#[derive(Debug, Clone, PartialEq)]
pub struct CachedCurve {
    pub curve: Vec<SurvivalPoint>,
    pub sample_size: usize,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug)]
pub struct CurveCache {
    entries: RwLock<HashMap<String, CachedCurve>>,
    ttl: Duration,
}

impl CurveCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Returns the entry for `key` if it is younger than the TTL at `now`.
    /// Expired entries are left in place to be overwritten by the next build.
    pub fn get(&self, key: &str, now: OffsetDateTime) -> Result<Option<CachedCurve>, AppError> {
        let entries = self.entries.read().map_err(|_| AppError::StateLock)?;
        Ok(entries
            .get(key)
            .filter(|entry| now - entry.updated_at < self.ttl)
            .cloned())
    }

    pub fn put(&self, key: String, entry: CachedCurve) -> Result<(), AppError> {
        let mut entries = self.entries.write().map_err(|_| AppError::StateLock)?;
        entries.insert(key, entry);
        Ok(())
    }

    /// Idempotent total clear; returns the number of evicted entries.
    pub fn clear(&self) -> Result<usize, AppError> {
        let mut entries = self.entries.write().map_err(|_| AppError::StateLock)?;
        let evicted = entries.len();
        entries.clear();
        Ok(evicted)
    }
}
