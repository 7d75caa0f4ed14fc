//! fm-series: probe time series and time alignment.
//!
//! Contains:
//! - series (TimeSeries parsing and the latest / at-or-before queries)
//! - align (TimeAligner for paired probes)

pub mod align;
pub mod series;

pub use align::{AlignedPair, TimeAligner};
pub use series::{SampleSelection, ScalarSample, TimeSeries};

pub type SeriesResult<T> = Result<T, SeriesError>;

#[derive(thiserror::Error, Debug)]
pub enum SeriesError {
    #[error("Probe '{probe}' has no valid samples")]
    NoSamples { probe: String },

    #[error("Probe '{probe}' has no sample at or before t = {cutoff}")]
    NothingAtOrBefore { probe: String, cutoff: f64 },

    #[error(transparent)]
    Core(#[from] fm_core::CoreError),
}
