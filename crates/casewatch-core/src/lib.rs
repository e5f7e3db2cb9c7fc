//! Core domain types for CaseWatch.
//!
//! Typed models for snapshot and time-series case-count tables, the shared
//! error type, and observation-date handling shared by the other crates.

pub mod error;
pub mod models;
pub mod time_utils;
