//! Filesystem-backed table loading for CaseWatch.
//!
//! Reads the six JSON table documents from a data directory and exposes
//! them through the [`DataSource`] trait. The layout is fixed:
//!
//! ```text
//! <root>/snapshot/confirmed.json      <root>/time_series/confirmed.json
//! <root>/snapshot/deaths.json         <root>/time_series/deaths.json
//! <root>/snapshot/recovered.json      <root>/time_series/recovered.json
//! ```
//!
//! Snapshot files are JSON arrays of rows; time-series files are arbitrary
//! JSON carried through opaquely. Producing these files (remote fetch,
//! CSV parsing) is out of scope and belongs to whatever writes the
//! directory.

use std::path::{Path, PathBuf};

use casewatch_core::error::{CaseWatchError, Result};
use casewatch_core::models::{Category, SnapshotSet, SnapshotTable, TimeSeriesSet, TimeSeriesTable};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::source::DataSource;

const SNAPSHOT_DIR: &str = "snapshot";
const TIME_SERIES_DIR: &str = "time_series";

/// Reads one epoch's tables from JSON files under a data directory.
#[derive(Debug, Clone)]
pub struct FsSource {
    root: PathBuf,
}

impl FsSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Path of the table file for `category` under `subdir`.
    fn table_path(&self, subdir: &str, category: Category) -> PathBuf {
        self.root
            .join(subdir)
            .join(format!("{}.json", category.as_str()))
    }

    fn read_snapshot_table(&self, category: Category) -> Result<SnapshotTable> {
        let path = self.table_path(SNAPSHOT_DIR, category);
        let table: SnapshotTable = read_json(&path)?;
        debug!(
            category = %category,
            rows = table.len(),
            path = %path.display(),
            "loaded snapshot table"
        );
        Ok(table)
    }

    fn read_time_series_table(&self, category: Category) -> Result<TimeSeriesTable> {
        let path = self.table_path(TIME_SERIES_DIR, category);
        let table: TimeSeriesTable = read_json(&path)?;
        debug!(
            category = %category,
            path = %path.display(),
            "loaded time-series table"
        );
        Ok(table)
    }
}

impl DataSource for FsSource {
    fn snapshot(&self) -> Result<SnapshotSet> {
        Ok(SnapshotSet {
            confirmed: self.read_snapshot_table(Category::Confirmed)?,
            deaths: self.read_snapshot_table(Category::Deaths)?,
            recovered: self.read_snapshot_table(Category::Recovered)?,
        })
    }

    fn time_series(&self) -> Result<TimeSeriesSet> {
        Ok(TimeSeriesSet {
            confirmed: self.read_time_series_table(Category::Confirmed)?,
            deaths: self.read_time_series_table(Category::Deaths)?,
            recovered: self.read_time_series_table(Category::Recovered)?,
        })
    }
}

/// Read and deserialize one JSON document.
fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = std::fs::read(path).map_err(|source| CaseWatchError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use casewatch_core::models::RawCount;
    use tempfile::TempDir;

    fn write_table(root: &Path, subdir: &str, category: &str, content: &str) {
        let dir = root.join(subdir);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(format!("{}.json", category)), content).unwrap();
    }

    fn write_full_layout(root: &Path) {
        write_table(
            root,
            SNAPSHOT_DIR,
            "confirmed",
            r#"[{"region": "Italy", "count": 10, "observation_date": "3/1/20"}]"#,
        );
        write_table(root, SNAPSHOT_DIR, "deaths", "[]");
        write_table(root, SNAPSHOT_DIR, "recovered", "[]");
        write_table(
            root,
            TIME_SERIES_DIR,
            "confirmed",
            r#"[{"region": "Italy", "2/29/20": 8, "3/1/20": 10}]"#,
        );
        write_table(root, TIME_SERIES_DIR, "deaths", "[]");
        write_table(root, TIME_SERIES_DIR, "recovered", "[]");
    }

    #[test]
    fn test_fs_source_loads_snapshot_tables() {
        let tmp = TempDir::new().unwrap();
        write_full_layout(tmp.path());

        let source = FsSource::new(tmp.path());
        let snapshot = source.snapshot().unwrap();

        assert_eq!(snapshot.confirmed.len(), 1);
        assert_eq!(snapshot.confirmed.rows[0].region, "Italy");
        assert_eq!(snapshot.confirmed.rows[0].count, RawCount::Integer(10));
        assert!(snapshot.deaths.is_empty());
        assert!(snapshot.recovered.is_empty());
    }

    #[test]
    fn test_fs_source_loads_time_series_opaquely() {
        let tmp = TempDir::new().unwrap();
        write_full_layout(tmp.path());

        let source = FsSource::new(tmp.path());
        let series = source.time_series().unwrap();

        let expected = serde_json::json!([{"region": "Italy", "2/29/20": 8, "3/1/20": 10}]);
        assert_eq!(series.confirmed.0, expected);
    }

    #[test]
    fn test_fs_source_missing_file_is_file_read_error() {
        let tmp = TempDir::new().unwrap();

        let source = FsSource::new(tmp.path());
        let err = source.snapshot().unwrap_err();

        assert!(matches!(err, CaseWatchError::FileRead { .. }));
        assert!(err.to_string().contains("confirmed.json"));
    }

    #[test]
    fn test_fs_source_malformed_json_is_parse_error() {
        let tmp = TempDir::new().unwrap();
        write_full_layout(tmp.path());
        write_table(tmp.path(), SNAPSHOT_DIR, "deaths", "{not json");

        let source = FsSource::new(tmp.path());
        let err = source.snapshot().unwrap_err();

        assert!(matches!(err, CaseWatchError::JsonParse(_)));
    }

    #[test]
    fn test_fs_source_string_and_float_counts() {
        let tmp = TempDir::new().unwrap();
        write_full_layout(tmp.path());
        write_table(
            tmp.path(),
            SNAPSHOT_DIR,
            "recovered",
            r#"[
                {"region": "Italy", "count": "7", "observation_date": "3/1/20"},
                {"region": "France", "count": 2.0, "observation_date": "3/1/20"}
            ]"#,
        );

        let source = FsSource::new(tmp.path());
        let snapshot = source.snapshot().unwrap();

        assert_eq!(
            snapshot.recovered.rows[0].count,
            RawCount::Text("7".to_string())
        );
        assert_eq!(snapshot.recovered.rows[1].count, RawCount::Float(2.0));
    }
}
