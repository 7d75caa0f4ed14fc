//! Whitespace-delimited probe files.
//!
//! ```text
//! # Time        areaAverage(total(p))
//! 0.01          100000
//! 0.02          100500
//! ```
//!
//! Column 1 is time, column 2 the value; further columns are ignored.

use std::path::Path;

use fm_core::{Real, Snapshot, complete_lines, parse_real};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::SeriesResult;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScalarSample {
    pub time: Real,
    pub value: Real,
}

/// How "latest" and "at or before" pick among rows.
///
/// Probe files are normally written in increasing time, in which case both
/// modes agree. They differ when rows are out of order (e.g. a restarted run
/// appending earlier times).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleSelection {
    /// Last qualifying row in file order. No sorting is done.
    #[default]
    FileOrder,
    /// Qualifying row with the greatest time; ties go to the later row.
    GreatestTime,
}

/// Samples of one probe, in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeSeries {
    probe: String,
    samples: Vec<ScalarSample>,
}

impl TimeSeries {
    pub fn new(probe: impl Into<String>, samples: Vec<ScalarSample>) -> Self {
        Self {
            probe: probe.into(),
            samples,
        }
    }

    /// Parse the complete lines of `text`. Comment rows (`#`), rows with
    /// fewer than two fields and rows whose first two fields are not finite
    /// numbers are skipped.
    pub fn parse(probe: impl Into<String>, text: &str) -> Self {
        let probe = probe.into();
        let mut samples = Vec::new();
        let mut skipped = 0usize;

        for line in complete_lines(text) {
            let trimmed = line.trim_start();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            match parse_row(trimmed) {
                Some(sample) => samples.push(sample),
                None => skipped += 1,
            }
        }

        if skipped > 0 {
            trace!(probe = %probe, skipped, "skipped malformed rows");
        }
        Self { probe, samples }
    }

    pub fn from_snapshot(probe: impl Into<String>, snapshot: &Snapshot) -> Self {
        Self::parse(probe, snapshot.text())
    }

    pub fn read(probe: impl Into<String>, path: &Path) -> SeriesResult<Self> {
        let snapshot = Snapshot::read(path)?;
        Ok(Self::from_snapshot(probe, &snapshot))
    }

    pub fn probe(&self) -> &str {
        &self.probe
    }

    pub fn samples(&self) -> &[ScalarSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Time of the last valid row in file order.
    pub fn latest_time(&self) -> Option<Real> {
        self.latest_sample(SampleSelection::FileOrder).map(|s| s.time)
    }

    /// Value of the last valid row in file order.
    pub fn latest_value(&self) -> Option<Real> {
        self.latest_sample(SampleSelection::FileOrder).map(|s| s.value)
    }

    /// Value of the last row (file order) with `time <= cutoff`.
    ///
    /// Rows are not sorted first: with out-of-order rows this is the last
    /// qualifying row written, not necessarily the one nearest the cutoff.
    pub fn value_at_or_before(&self, cutoff: Real) -> Option<Real> {
        self.sample_at_or_before(cutoff, SampleSelection::FileOrder)
            .map(|s| s.value)
    }

    pub fn latest_sample(&self, selection: SampleSelection) -> Option<ScalarSample> {
        select(self.samples.iter().copied(), selection)
    }

    pub fn sample_at_or_before(
        &self,
        cutoff: Real,
        selection: SampleSelection,
    ) -> Option<ScalarSample> {
        select(
            self.samples.iter().copied().filter(|s| s.time <= cutoff),
            selection,
        )
    }
}

fn parse_row(line: &str) -> Option<ScalarSample> {
    let mut fields = line.split_whitespace();
    let time = parse_real(fields.next()?)?;
    let value = parse_real(fields.next()?)?;
    Some(ScalarSample { time, value })
}

fn select(
    samples: impl Iterator<Item = ScalarSample>,
    selection: SampleSelection,
) -> Option<ScalarSample> {
    match selection {
        SampleSelection::FileOrder => samples.last(),
        SampleSelection::GreatestTime => samples.fold(None, |best, s| match best {
            Some(b) if b.time > s.time => Some(b),
            _ => Some(s),
        }),
    }
}
