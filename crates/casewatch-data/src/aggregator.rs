//! Aggregation over one epoch's case-count tables.
//!
//! The [`Aggregator`] captures the six tables from a [`DataSource`] at
//! construction, derives the observation date (`dt`) and its Unix timestamp
//! (`ts`) once, and answers every query as a pure read over the captured
//! tables. Instances are immutable after construction and safe to share
//! across readers.

use std::collections::{BTreeSet, HashMap};

use casewatch_core::error::{CaseWatchError, Result};
use casewatch_core::models::{
    Category, RegionStatus, SnapshotRow, SnapshotSet, TimeSeriesSet, TimeSeriesTable,
};
use casewatch_core::time_utils::{parse_observation_date, ObservationClock};
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use tracing::debug;

use crate::source::DataSource;

// ── RegionTable ───────────────────────────────────────────────────────────────

/// Region → status mapping that keeps its sort order when serialized.
///
/// `serde_json` maps re-order keys alphabetically, which would destroy the
/// ascending-by-confirmed ordering, so this type serializes its entries as
/// a JSON object by hand.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegionTable {
    entries: Vec<(String, RegionStatus)>,
}

impl RegionTable {
    fn from_entries(entries: Vec<(String, RegionStatus)>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &RegionStatus)> {
        self.entries.iter().map(|(name, status)| (name.as_str(), status))
    }

    /// Status for one region, if present.
    pub fn get(&self, region: &str) -> Option<&RegionStatus> {
        self.entries
            .iter()
            .find(|(name, _)| name == region)
            .map(|(_, status)| status)
    }
}

impl Serialize for RegionTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (region, status) in &self.entries {
            map.serialize_entry(region, status)?;
        }
        map.end()
    }
}

// ── Result types ──────────────────────────────────────────────────────────────

/// Per-region current status, sorted ascending by confirmed count.
///
/// Two serialized shapes exist, chosen by the `as_list` flag of
/// [`Aggregator::current_status`].
#[derive(Debug, Clone, PartialEq)]
pub enum CurrentStatus {
    /// Region names at the top level: `{France: {..}, Italy: {..}, dt, ts}`.
    Keyed {
        regions: RegionTable,
        dt: String,
        ts: i64,
    },
    /// The same mapping nested under a single `countries` key, with no
    /// array wrapper around it.
    Listed {
        countries: RegionTable,
        dt: String,
        ts: i64,
    },
}

impl CurrentStatus {
    /// The sorted region mapping, regardless of shape.
    pub fn regions(&self) -> &RegionTable {
        match self {
            CurrentStatus::Keyed { regions, .. } => regions,
            CurrentStatus::Listed { countries, .. } => countries,
        }
    }

    pub fn dt(&self) -> &str {
        match self {
            CurrentStatus::Keyed { dt, .. } | CurrentStatus::Listed { dt, .. } => dt,
        }
    }

    pub fn ts(&self) -> i64 {
        match self {
            CurrentStatus::Keyed { ts, .. } | CurrentStatus::Listed { ts, .. } => *ts,
        }
    }
}

impl Serialize for CurrentStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            CurrentStatus::Keyed { regions, dt, ts } => {
                let mut map = serializer.serialize_map(Some(regions.len() + 2))?;
                for (region, status) in regions.iter() {
                    map.serialize_entry(region, status)?;
                }
                map.serialize_entry("dt", dt)?;
                map.serialize_entry("ts", ts)?;
                map.end()
            }
            CurrentStatus::Listed { countries, dt, ts } => {
                let mut map = serializer.serialize_map(Some(3))?;
                map.serialize_entry("countries", countries)?;
                map.serialize_entry("dt", dt)?;
                map.serialize_entry("ts", ts)?;
                map.end()
            }
        }
    }
}

/// A single category's global sum, keyed by the category label:
/// `{confirmed: 18, dt, ts}`.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryTotal {
    pub category: Category,
    pub total: u64,
    pub dt: String,
    pub ts: i64,
}

impl Serialize for CategoryTotal {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(3))?;
        map.serialize_entry(self.category.as_str(), &self.total)?;
        map.serialize_entry("dt", &self.dt)?;
        map.serialize_entry("ts", &self.ts)?;
        map.end()
    }
}

/// Global sums of all three categories.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Totals {
    pub confirmed: u64,
    pub deaths: u64,
    pub recovered: u64,
    pub dt: String,
    pub ts: i64,
}

/// Lexicographically sorted, de-duplicated region names.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AffectedCountries {
    pub countries: Vec<String>,
    pub dt: String,
    pub ts: i64,
}

/// The three time-series tables, passed through unchanged.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeriesReport {
    pub confirmed: TimeSeriesTable,
    pub deaths: TimeSeriesTable,
    pub recovered: TimeSeriesTable,
    pub dt: String,
    pub ts: i64,
}

// ── Aggregator ────────────────────────────────────────────────────────────────

/// Read-only query surface over one epoch's captured tables.
#[derive(Debug)]
pub struct Aggregator {
    snapshot: SnapshotSet,
    time_series: TimeSeriesSet,
    /// Raw observation-date string from the first confirmed row.
    dt: String,
    /// Unix timestamp of `dt` under the construction-time clock policy.
    ts: i64,
}

impl Aggregator {
    /// Construct from a source under the default UTC timestamp policy.
    pub fn from_source<S: DataSource + ?Sized>(source: &S) -> Result<Self> {
        Self::with_clock(source, &ObservationClock::utc())
    }

    /// Construct from a source with an explicit timestamp policy.
    ///
    /// Pulls both table sets from the source, then derives `dt` from the
    /// first row of the confirmed snapshot and `ts` from `clock`. Fails
    /// with [`CaseWatchError::EmptySource`] when the confirmed table has no
    /// rows and [`CaseWatchError::DateFormat`] when its date is malformed.
    /// Deaths and recovered tables may be empty; they aggregate as zero.
    pub fn with_clock<S: DataSource + ?Sized>(
        source: &S,
        clock: &ObservationClock,
    ) -> Result<Self> {
        let snapshot = source.snapshot()?;
        let time_series = source.time_series()?;

        let first = snapshot
            .confirmed
            .rows
            .first()
            .ok_or(CaseWatchError::EmptySource(Category::Confirmed))?;
        let dt = first.observation_date.clone();
        let ts = clock.epoch_for(parse_observation_date(&dt)?);

        debug!(
            dt = %dt,
            ts,
            confirmed_rows = snapshot.confirmed.len(),
            deaths_rows = snapshot.deaths.len(),
            recovered_rows = snapshot.recovered.len(),
            "aggregator constructed"
        );

        Ok(Self {
            snapshot,
            time_series,
            dt,
            ts,
        })
    }

    /// Raw observation-date string, e.g. `"3/1/20"`.
    pub fn dt(&self) -> &str {
        &self.dt
    }

    /// Unix timestamp (seconds) of the observation date.
    pub fn ts(&self) -> i64 {
        self.ts
    }

    // ── Queries ───────────────────────────────────────────────────────────

    /// Per-region totals for the latest reporting date.
    ///
    /// The region template is built from the confirmed table in encounter
    /// order; all three snapshot tables are then folded in, summing
    /// duplicate rows per region. Rows whose region never appears in the
    /// confirmed table are skipped: the confirmed table is the
    /// authoritative region list in the source data contract. The result
    /// is stably sorted ascending by confirmed count, so ties keep
    /// confirmed-table encounter order.
    pub fn current_status(&self, as_list: bool) -> Result<CurrentStatus> {
        let mut entries: Vec<(String, RegionStatus)> = Vec::new();
        let mut slots: HashMap<&str, usize> = HashMap::new();
        for row in &self.snapshot.confirmed.rows {
            if !slots.contains_key(row.region.as_str()) {
                slots.insert(row.region.as_str(), entries.len());
                entries.push((row.region.clone(), RegionStatus::default()));
            }
        }

        for category in Category::ALL {
            for row in &self.snapshot.table(category).rows {
                let Some(&slot) = slots.get(row.region.as_str()) else {
                    debug!(
                        region = %row.region,
                        category = %category,
                        "skipping row for region outside the confirmed set"
                    );
                    continue;
                };
                entries[slot].1.add(category, coerce_count(row)?);
            }
        }

        entries.sort_by_key(|(_, status)| status.confirmed);
        let regions = RegionTable::from_entries(entries);

        Ok(if as_list {
            CurrentStatus::Listed {
                countries: regions,
                dt: self.dt.clone(),
                ts: self.ts,
            }
        } else {
            CurrentStatus::Keyed {
                regions,
                dt: self.dt.clone(),
                ts: self.ts,
            }
        })
    }

    /// Global confirmed-case sum.
    pub fn confirmed_cases(&self) -> Result<CategoryTotal> {
        self.category_total(Category::Confirmed)
    }

    /// Global death sum.
    pub fn deaths(&self) -> Result<CategoryTotal> {
        self.category_total(Category::Deaths)
    }

    /// Global recovered sum.
    pub fn recovered(&self) -> Result<CategoryTotal> {
        self.category_total(Category::Recovered)
    }

    /// Global sums of all three categories, each computed independently
    /// from its snapshot table.
    pub fn totals(&self) -> Result<Totals> {
        Ok(Totals {
            confirmed: self.category_sum(Category::Confirmed)?,
            deaths: self.category_sum(Category::Deaths)?,
            recovered: self.category_sum(Category::Recovered)?,
            dt: self.dt.clone(),
            ts: self.ts,
        })
    }

    /// Distinct region names from the confirmed snapshot, sorted
    /// lexicographically.
    pub fn affected_countries(&self) -> AffectedCountries {
        let countries: BTreeSet<&str> = self
            .snapshot
            .confirmed
            .rows
            .iter()
            .map(|row| row.region.as_str())
            .collect();
        AffectedCountries {
            countries: countries.into_iter().map(str::to_string).collect(),
            dt: self.dt.clone(),
            ts: self.ts,
        }
    }

    /// The three time-series tables, cloned through unchanged.
    pub fn time_series(&self) -> TimeSeriesReport {
        TimeSeriesReport {
            confirmed: self.time_series.confirmed.clone(),
            deaths: self.time_series.deaths.clone(),
            recovered: self.time_series.recovered.clone(),
            dt: self.dt.clone(),
            ts: self.ts,
        }
    }

    // ── Private ───────────────────────────────────────────────────────────

    fn category_total(&self, category: Category) -> Result<CategoryTotal> {
        Ok(CategoryTotal {
            category,
            total: self.category_sum(category)?,
            dt: self.dt.clone(),
            ts: self.ts,
        })
    }

    /// Sum every row of one category's snapshot table.
    fn category_sum(&self, category: Category) -> Result<u64> {
        self.snapshot
            .table(category)
            .rows
            .iter()
            .try_fold(0u64, |acc, row| Ok(acc + coerce_count(row)?))
    }
}

/// Coerce a row's raw count, attaching the region to the failure.
fn coerce_count(row: &SnapshotRow) -> Result<u64> {
    row.count
        .to_count()
        .ok_or_else(|| CaseWatchError::InvalidCount {
            region: row.region.clone(),
            value: row.count.to_string(),
        })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
