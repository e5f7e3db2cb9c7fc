//! Data-source abstraction for one epoch's tables.
//!
//! The aggregation layer never fetches or parses anything itself; a
//! [`DataSource`] hands it the six finished tables. Tests and embedders use
//! [`StaticSource`]; the CLI uses [`crate::reader::FsSource`].

use casewatch_core::error::Result;
use casewatch_core::models::{SnapshotSet, TimeSeriesSet};

/// Supplies the snapshot and time-series tables for one data epoch.
///
/// Both calls are synchronous and are made exactly once per
/// [`crate::aggregator::Aggregator`] construction.
pub trait DataSource {
    /// The three latest-date snapshot tables.
    fn snapshot(&self) -> Result<SnapshotSet>;

    /// The three full historical tables.
    fn time_series(&self) -> Result<TimeSeriesSet>;
}

/// In-memory source backed by pre-built tables.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    snapshot: SnapshotSet,
    time_series: TimeSeriesSet,
}

impl StaticSource {
    pub fn new(snapshot: SnapshotSet, time_series: TimeSeriesSet) -> Self {
        Self {
            snapshot,
            time_series,
        }
    }
}

impl DataSource for StaticSource {
    fn snapshot(&self) -> Result<SnapshotSet> {
        Ok(self.snapshot.clone())
    }

    fn time_series(&self) -> Result<TimeSeriesSet> {
        Ok(self.time_series.clone())
    }
}
