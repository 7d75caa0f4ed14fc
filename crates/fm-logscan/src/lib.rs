//! fm-logscan: latest-value extraction from append-only solver logs.
//!
//! A [`LogScanner`] is a single-pass reducer over log lines. Each metric keeps
//! a last-write-wins accumulator, so the reported value is the one from the
//! last matching line. The y+ metrics follow a two-line protocol modelled by
//! [`YPlusState`].

pub mod patterns;
pub mod scanner;

pub use scanner::{LogMetric, LogScanner, YPlusState, scan_file, scan_snapshot, scan_text};

