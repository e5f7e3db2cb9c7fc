//! Runtime layer for CaseWatch.
//!
//! Owns the refresh cadence: a data epoch is one fetch cycle, and the
//! aggregator built for it stays valid until the cadence elapses.

pub mod data_manager;

pub use casewatch_core as core;
pub use casewatch_data as data;
