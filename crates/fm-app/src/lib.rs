//! Metric extraction service for simulation cases.
//!
//! Resolves a metric name through the [`MetricRegistry`], reads the solver
//! log or probe files of a case, delegates mesh-integrated metrics to a
//! [`FieldMetricProvider`], and always produces a [`MetricValue`].

pub mod config;
pub mod derived;
pub mod error;
pub mod extract_service;
pub mod field;
pub mod registry;

// Re-export key types for convenience
pub use config::{CASE_CONFIG_FILE, CaseLayout, LATEST_VERSION, PostProcessorConfig};
pub use derived::{DerivedRule, pressure_drop, pressure_loss_coefficient};
pub use error::{AppError, AppResult};
pub use extract_service::{ExtractOptions, Extractor, extract_metric};
pub use field::{ExternalPostProcessor, FieldMetricProvider};
pub use fm_core::MetricValue;
pub use registry::{FIELD_METRICS, MetricDef, MetricRegistry, MetricSource, Probe};
