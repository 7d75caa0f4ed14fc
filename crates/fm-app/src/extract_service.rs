//! Metric extraction for one case.
//!
//! This is the boundary where every failure becomes `NotAvailable`: the
//! caller always gets a printable value, and each failure is logged with the
//! reason.

use std::path::{Path, PathBuf};

use fm_core::{MetricValue, Real};
use fm_series::{TimeAligner, TimeSeries};
use tracing::{debug, warn};

use crate::config::CaseLayout;
use crate::error::{AppError, AppResult};
use crate::field::{ExternalPostProcessor, FieldMetricProvider};
use crate::registry::{MetricRegistry, MetricSource, Probe};

/// Options supplied by the dispatcher.
#[derive(Debug, Clone, Default)]
pub struct ExtractOptions {
    /// Explicit configuration file; otherwise the case-local file or defaults.
    pub config: Option<PathBuf>,
    /// Evaluation time forwarded to the field post-processor.
    pub time: Option<Real>,
}

pub struct Extractor {
    case_dir: PathBuf,
    layout: CaseLayout,
    registry: MetricRegistry,
    field: Box<dyn FieldMetricProvider>,
}

impl Extractor {
    pub fn new(
        case_dir: impl Into<PathBuf>,
        layout: CaseLayout,
        field: Box<dyn FieldMetricProvider>,
    ) -> Self {
        Self {
            case_dir: case_dir.into(),
            layout,
            registry: MetricRegistry::standard(),
            field,
        }
    }

    /// Resolve the case layout and wire up the configured post-processor.
    pub fn for_case(case_dir: &Path, options: &ExtractOptions) -> AppResult<Self> {
        let layout = CaseLayout::resolve(case_dir, options.config.as_deref())?;
        let field =
            ExternalPostProcessor::from_config(&layout.post_processor).with_time(options.time);
        Ok(Self::new(case_dir, layout, Box::new(field)))
    }

    /// Extract `metric_name`, reporting any failure as `NotAvailable`.
    pub fn extract(&self, metric_name: &str) -> MetricValue {
        match self.try_extract(metric_name) {
            Ok(value) if value.is_available() => {
                debug!(metric = metric_name, %value, "metric extracted");
                value
            }
            Ok(value) => {
                debug!(metric = metric_name, "inputs held no usable value");
                value
            }
            Err(err) => {
                warn!(
                    metric = metric_name,
                    case = %self.case_dir.display(),
                    error = %err,
                    "metric unavailable"
                );
                MetricValue::NotAvailable
            }
        }
    }

    /// Like [`Extractor::extract`], but exposes why a metric is unavailable.
    ///
    /// `Ok(NotAvailable)` means the inputs were readable but held no usable
    /// value (no matching log line, zero inlet pressure, failed collaborator).
    pub fn try_extract(&self, metric_name: &str) -> AppResult<MetricValue> {
        let def = self
            .registry
            .resolve(metric_name)
            .ok_or_else(|| AppError::UnknownMetric(metric_name.to_string()))?;

        if !self.case_dir.is_dir() {
            return Err(AppError::CaseNotFound(self.case_dir.clone()));
        }

        match def.source {
            MetricSource::Log(metric) => {
                let path = self.layout.log_path(&self.case_dir);
                Ok(fm_logscan::scan_file(&path, metric)?)
            }
            MetricSource::Probe(probe) => {
                let series = self.read_probe(probe)?;
                let latest = series.latest_sample(self.layout.selection);
                Ok(MetricValue::from(latest.map(|s| s.value)))
            }
            MetricSource::ProbePair(rule) => {
                let inlet = self.read_probe(Probe::Inlet)?;
                let outlet = self.read_probe(Probe::Outlet)?;
                let pair = TimeAligner::new(self.layout.selection).align(&inlet, &outlet)?;
                Ok(rule.apply(&pair))
            }
            MetricSource::Field => Ok(self.field.compute(&self.case_dir, def.name)),
        }
    }

    fn read_probe(&self, probe: Probe) -> AppResult<TimeSeries> {
        let path = match probe {
            Probe::Inlet => self.layout.inlet_path(&self.case_dir),
            Probe::Outlet => self.layout.outlet_path(&self.case_dir),
        };
        Ok(TimeSeries::read(probe.to_string(), &path)?)
    }
}

/// Resolve configuration for `case_dir` and extract one metric.
///
/// Never fails: configuration problems are reported like any other missing
/// input.
pub fn extract_metric(case_dir: &Path, metric_name: &str, options: &ExtractOptions) -> MetricValue {
    if MetricRegistry::standard().resolve(metric_name).is_none() {
        warn!(metric = metric_name, "unknown metric");
        return MetricValue::NotAvailable;
    }
    match Extractor::for_case(case_dir, options) {
        Ok(extractor) => extractor.extract(metric_name),
        Err(err) => {
            warn!(
                metric = metric_name,
                case = %case_dir.display(),
                error = %err,
                "case configuration unusable"
            );
            MetricValue::NotAvailable
        }
    }
}
