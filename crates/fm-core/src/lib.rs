//! fm-core: shared foundation for metric extraction.
//!
//! Contains:
//! - numeric (Real + float token grammar)
//! - value (MetricValue: a finite reading or the NotAvailable sentinel)
//! - snapshot (point-in-time reads of append-only text artifacts)
//! - error (shared error types)

pub mod error;
pub mod numeric;
pub mod snapshot;
pub mod value;

pub use error::{CoreError, CoreResult};
pub use numeric::*;
pub use snapshot::{Snapshot, complete_lines};
pub use value::MetricValue;
