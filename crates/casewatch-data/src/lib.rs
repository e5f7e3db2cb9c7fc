//! Data and aggregation layer for CaseWatch.
//!
//! Consumes tabular case-count data from a [`source::DataSource`] and
//! derives the API-ready summaries: global totals, per-region current
//! status, affected-region list, and raw time series.

pub mod aggregator;
pub mod reader;
pub mod source;

pub use casewatch_core as core;
