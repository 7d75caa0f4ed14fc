//! Alignment of independently flushed probe series.
//!
//! Two probes may be written at different solver steps, so each series'
//! own latest row can belong to a different physical instant. Both are
//! sampled at `t_common = min(latest(A), latest(B))`, the last instant
//! available in both.

use fm_core::{MetricValue, Real};
use tracing::debug;

use crate::{SampleSelection, SeriesError, SeriesResult, TimeSeries};

/// Values of two probes sampled at a common instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlignedPair {
    pub t_common: Real,
    pub a: Real,
    pub b: Real,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TimeAligner {
    selection: SampleSelection,
}

impl TimeAligner {
    pub fn new(selection: SampleSelection) -> Self {
        Self { selection }
    }

    pub fn align(&self, a: &TimeSeries, b: &TimeSeries) -> SeriesResult<AlignedPair> {
        let t_a = self.latest_time(a)?;
        let t_b = self.latest_time(b)?;
        let t_common = t_a.min(t_b);

        let pair = AlignedPair {
            t_common,
            a: self.value_at(a, t_common)?,
            b: self.value_at(b, t_common)?,
        };
        debug!(
            probe_a = a.probe(),
            probe_b = b.probe(),
            t_a,
            t_b,
            t_common,
            "aligned probe pair"
        );
        Ok(pair)
    }

    /// Aligned values as metric results; any failure makes both unavailable.
    pub fn align_values(&self, a: &TimeSeries, b: &TimeSeries) -> (MetricValue, MetricValue) {
        match self.align(a, b) {
            Ok(pair) => (MetricValue::finite(pair.a), MetricValue::finite(pair.b)),
            Err(_) => (MetricValue::NotAvailable, MetricValue::NotAvailable),
        }
    }

    fn latest_time(&self, series: &TimeSeries) -> SeriesResult<Real> {
        series
            .latest_sample(self.selection)
            .map(|s| s.time)
            .ok_or_else(|| SeriesError::NoSamples {
                probe: series.probe().to_string(),
            })
    }

    fn value_at(&self, series: &TimeSeries, cutoff: Real) -> SeriesResult<Real> {
        series
            .sample_at_or_before(cutoff, self.selection)
            .map(|s| s.value)
            .ok_or_else(|| SeriesError::NothingAtOrBefore {
                probe: series.probe().to_string(),
                cutoff,
            })
    }
}
