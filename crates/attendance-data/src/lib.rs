//! Data ingestion layer for the attendance tracker.
//!
//! Responsible for discovering and reading session exports, parsing their
//! headers and rows, loading the exclusion table, folding everything into a
//! roster and writing the tabular report.

pub mod aggregator;
pub mod analysis;
pub mod exclusion;
pub mod header;
pub mod reader;
pub mod report;
pub mod row_parser;

pub use attendance_core as core;
