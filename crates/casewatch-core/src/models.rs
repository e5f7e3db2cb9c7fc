use std::fmt;

use serde::{Deserialize, Serialize};

/// The three case categories tracked by the source data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Confirmed,
    Deaths,
    Recovered,
}

impl Category {
    /// All categories, in the order they appear in every derived view.
    pub const ALL: [Category; 3] = [Category::Confirmed, Category::Deaths, Category::Recovered];

    /// Lowercase label used as a JSON key.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Confirmed => "confirmed",
            Category::Deaths => "deaths",
            Category::Recovered => "recovered",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A case count exactly as it appears in the source data.
///
/// Source tables are loosely typed: the same column can carry integers,
/// floats, or numeric strings. The raw value is kept at the boundary and
/// coerced via [`RawCount::to_count`] only when an aggregation needs it, so
/// a bad value fails the specific query instead of being silently zeroed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawCount {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl RawCount {
    /// Coerce to a non-negative integer count.
    ///
    /// Finite non-negative floats truncate toward zero; strings must parse
    /// as a plain non-negative integer after trimming. Everything else
    /// (negatives, NaN/inf, decimal or non-numeric text) is `None`.
    pub fn to_count(&self) -> Option<u64> {
        match self {
            RawCount::Integer(n) if *n >= 0 => Some(*n as u64),
            RawCount::Float(f) if f.is_finite() && *f >= 0.0 => Some(*f as u64),
            RawCount::Text(s) => s.trim().parse::<u64>().ok(),
            _ => None,
        }
    }
}

impl fmt::Display for RawCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawCount::Integer(n) => write!(f, "{}", n),
            RawCount::Float(x) => write!(f, "{}", x),
            RawCount::Text(s) => f.write_str(s),
        }
    }
}

/// One region-level observation from a latest-date snapshot table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotRow {
    /// Country/territory label as reported by the source. Not unique: a
    /// region may appear once per sub-national entry.
    pub region: String,
    /// Raw case count; coerced to an integer during aggregation.
    pub count: RawCount,
    /// Reporting date in `M/D/YY` form, shared by every row of the table.
    pub observation_date: String,
}

/// All rows of one category's snapshot, in source order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SnapshotTable {
    pub rows: Vec<SnapshotRow>,
}

impl SnapshotTable {
    pub fn new(rows: Vec<SnapshotRow>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A category's full historical table.
///
/// Opaque to the aggregation layer: the content is carried as raw JSON and
/// passed through to callers unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimeSeriesTable(pub serde_json::Value);

/// The three snapshot tables captured for one data epoch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapshotSet {
    pub confirmed: SnapshotTable,
    pub deaths: SnapshotTable,
    pub recovered: SnapshotTable,
}

impl SnapshotSet {
    /// The snapshot table for `category`.
    pub fn table(&self, category: Category) -> &SnapshotTable {
        match category {
            Category::Confirmed => &self.confirmed,
            Category::Deaths => &self.deaths,
            Category::Recovered => &self.recovered,
        }
    }
}

/// The three time-series tables captured for one data epoch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesSet {
    pub confirmed: TimeSeriesTable,
    pub deaths: TimeSeriesTable,
    pub recovered: TimeSeriesTable,
}

/// Per-region case totals across the three categories.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionStatus {
    pub confirmed: u64,
    pub deaths: u64,
    pub recovered: u64,
}

impl RegionStatus {
    /// Add `count` to the field for `category`.
    pub fn add(&mut self, category: Category, count: u64) {
        match category {
            Category::Confirmed => self.confirmed += count,
            Category::Deaths => self.deaths += count,
            Category::Recovered => self.recovered += count,
        }
    }
}
