use chrono::{LocalResult, NaiveDate, NaiveTime, TimeZone};
use chrono_tz::Tz;
use tracing::warn;

use crate::error::{CaseWatchError, Result};

/// Format of the snapshot observation date, e.g. `3/1/20`.
const OBSERVATION_DATE_FMT: &str = "%m/%d/%y";

// ── System timezone detection ─────────────────────────────────────────────────

/// Detect the IANA timezone name of the running system.
///
/// Falls back to `"UTC"` if detection fails.
pub fn get_system_timezone() -> String {
    iana_time_zone::get_timezone().unwrap_or_else(|_| "UTC".to_string())
}

// ── Observation-date parsing ──────────────────────────────────────────────────

/// Parse an `M/D/YY` observation-date string (e.g. `"3/1/20"`).
///
/// Surrounding whitespace is ignored. Fails with
/// [`CaseWatchError::DateFormat`] for anything not matching the format.
pub fn parse_observation_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), OBSERVATION_DATE_FMT)
        .map_err(|_| CaseWatchError::DateFormat(raw.to_string()))
}

// ── ObservationClock ──────────────────────────────────────────────────────────

/// Converts observation dates to Unix timestamps under a fixed timezone
/// policy.
///
/// The timestamp of a date is midnight of that date in the configured
/// timezone. The default policy is UTC, which keeps `ts` values identical
/// across machines; the source data carries no timezone of its own.
#[derive(Debug, Clone)]
pub struct ObservationClock {
    tz: Tz,
}

impl Default for ObservationClock {
    fn default() -> Self {
        Self::utc()
    }
}

impl ObservationClock {
    /// The default UTC policy.
    pub fn utc() -> Self {
        Self { tz: Tz::UTC }
    }

    /// Create a clock for the given IANA timezone name.
    ///
    /// If `tz_name` is not a recognised IANA timezone, falls back to UTC
    /// and logs a warning.
    pub fn new(tz_name: &str) -> Self {
        let tz = tz_name.parse::<Tz>().unwrap_or_else(|_| {
            warn!(
                "ObservationClock: unrecognised timezone \"{}\", falling back to UTC",
                tz_name
            );
            Tz::UTC
        });
        Self { tz }
    }

    /// Validate that `tz_name` is a recognised IANA timezone identifier.
    pub fn validate_timezone(tz_name: &str) -> bool {
        tz_name.parse::<Tz>().is_ok()
    }

    /// Unix timestamp (seconds) of midnight on `date` in the configured zone.
    ///
    /// If midnight does not exist in the zone on that date (DST gap), the
    /// earliest valid interpretation is used; as a last resort the naive
    /// midnight is read as UTC.
    pub fn epoch_for(&self, date: NaiveDate) -> i64 {
        let midnight = date.and_time(NaiveTime::MIN);
        match self.tz.from_local_datetime(&midnight) {
            LocalResult::Single(dt) => dt.timestamp(),
            LocalResult::Ambiguous(earliest, _) => earliest.timestamp(),
            LocalResult::None => midnight.and_utc().timestamp(),
        }
    }

    /// Expose the configured timezone.
    pub fn tz(&self) -> Tz {
        self.tz
    }
}
