//! TTL-cached epoch manager.
//!
//! Wraps a [`DataSource`] with a configurable time-to-live cache over the
//! [`Aggregator`] built from it. Callers use [`EpochManager::get`] to obtain
//! a fresh-or-cached aggregator; the manager handles staleness checks, up to
//! three rebuild attempts with linear back-off, and graceful fallback to the
//! previous epoch on transient source failure.

use std::thread;
use std::time::{Duration, Instant};

use casewatch_core::time_utils::ObservationClock;
use casewatch_data::aggregator::Aggregator;
use casewatch_data::source::DataSource;

// ── Defaults ──────────────────────────────────────────────────────────────────

/// Default refresh cadence in seconds.
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;

/// Maximum number of rebuild attempts before giving up and returning the
/// stale epoch.
const MAX_RETRY_ATTEMPTS: u32 = 3;

// ── EpochManager ──────────────────────────────────────────────────────────────

/// TTL-cached wrapper that rebuilds the [`Aggregator`] once per data epoch.
pub struct EpochManager<S: DataSource> {
    /// Supplier of the six tables for each epoch.
    source: S,
    /// Timestamp policy forwarded to each aggregator construction.
    clock: ObservationClock,
    /// Maximum age of a cached epoch before it is considered stale.
    cache_ttl: Duration,
    /// Aggregator for the most recent epoch.
    cache: Option<Aggregator>,
    /// When the cache was last populated.
    cache_timestamp: Option<Instant>,
    /// Human-readable description of the last error encountered.
    last_error: Option<String>,
    /// When the last successful rebuild completed.
    last_successful_fetch: Option<Instant>,
}

impl<S: DataSource> EpochManager<S> {
    /// Create a manager with a refresh cadence of `cache_ttl_secs` seconds.
    pub fn new(source: S, cache_ttl_secs: u64, clock: ObservationClock) -> Self {
        Self {
            source,
            clock,
            cache_ttl: Duration::from_secs(cache_ttl_secs),
            cache: None,
            cache_timestamp: None,
            last_error: None,
            last_successful_fetch: None,
        }
    }

    // ── Public API ────────────────────────────────────────────────────────

    /// Return the current epoch's aggregator, rebuilding it when stale.
    ///
    /// When `force_refresh` is `true` the cache is bypassed and a rebuild
    /// is always attempted. On failure the previous epoch (if any) is
    /// returned as a best-effort fallback.
    pub fn get(&mut self, force_refresh: bool) -> Option<&Aggregator> {
        if !force_refresh && self.is_cache_valid() {
            tracing::debug!("returning cached epoch");
            return self.cache.as_ref();
        }

        match self.rebuild_with_retry() {
            Ok(aggregator) => {
                tracing::debug!(dt = aggregator.dt(), ts = aggregator.ts(), "epoch refreshed");
                self.cache = Some(aggregator);
                self.cache_timestamp = Some(Instant::now());
                self.last_successful_fetch = Some(Instant::now());
                self.last_error = None;
                self.cache.as_ref()
            }
            Err(e) => {
                tracing::warn!(error = %e, "epoch rebuild failed; falling back to cached epoch");
                self.last_error = Some(e);
                self.cache.as_ref()
            }
        }
    }

    /// Discard the current epoch, forcing the next [`get`](Self::get) call
    /// to rebuild.
    pub fn invalidate(&mut self) {
        self.cache = None;
        self.cache_timestamp = None;
        tracing::debug!("epoch cache invalidated");
    }

    /// Age of the current epoch, or `None` if nothing has been built yet.
    pub fn cache_age(&self) -> Option<Duration> {
        self.cache_timestamp.map(|ts| ts.elapsed())
    }

    /// Description of the last rebuild error, or `None`.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    // ── Private helpers ───────────────────────────────────────────────────

    /// `true` when the cached epoch is still within its TTL.
    fn is_cache_valid(&self) -> bool {
        match (self.cache.as_ref(), self.cache_timestamp) {
            (Some(_), Some(ts)) => ts.elapsed() < self.cache_ttl,
            _ => false,
        }
    }

    /// Attempt up to [`MAX_RETRY_ATTEMPTS`] rebuilds with linear back-off
    /// (0 ms, 100 ms, 200 ms).
    fn rebuild_with_retry(&mut self) -> Result<Aggregator, String> {
        let mut last_err = String::new();

        for attempt in 0..MAX_RETRY_ATTEMPTS {
            if attempt > 0 {
                let sleep_ms = u64::from(attempt) * 100;
                tracing::debug!(attempt, sleep_ms, "retrying epoch rebuild after back-off");
                thread::sleep(Duration::from_millis(sleep_ms));
            }

            match Aggregator::with_clock(&self.source, &self.clock) {
                Ok(aggregator) => return Ok(aggregator),
                Err(e) => {
                    tracing::warn!(attempt, error = %e, "epoch rebuild attempt failed");
                    last_err = e.to_string();
                }
            }
        }

        Err(last_err)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
