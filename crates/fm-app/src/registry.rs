//! Metric name resolution.
//!
//! Each registered metric names its data source and extraction rule. Every
//! source falls back the same way: anything that cannot be computed is
//! `NotAvailable`.

use std::collections::BTreeMap;
use std::fmt;

use fm_logscan::LogMetric;

use crate::derived::DerivedRule;

/// One of the paired total-pressure probes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Probe {
    Inlet,
    Outlet,
}

impl fmt::Display for Probe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Inlet => "inlet",
            Self::Outlet => "outlet",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricSource {
    /// Latest value of a solver log field.
    Log(LogMetric),
    /// Value at the latest recorded time of one probe.
    Probe(Probe),
    /// Rule applied to the time-aligned inlet/outlet pair.
    ProbePair(DerivedRule),
    /// Volume/surface integral delegated to the field post-processor.
    Field,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricDef {
    pub name: &'static str,
    pub source: MetricSource,
    pub description: &'static str,
}

/// Field metrics computed by the external post-processor.
pub const FIELD_METRICS: [(&str, &str); 4] = [
    (
        "combustion_efficiency",
        "Fuel conversion, 1 - CH4_outlet / CH4_inlet (area-averaged at the outlet)",
    ),
    (
        "ch4_domain_average",
        "Volume-averaged CH4 mass fraction over the domain",
    ),
    (
        "pattern_factor",
        "Temperature pattern factor (T_max - T_avg) / (T_avg - T_inlet)",
    ),
    (
        "temperature_rise",
        "Temperature rise efficiency (T_avg - T_inlet) / (T_max - T_inlet)",
    ),
];

#[derive(Debug, Clone)]
pub struct MetricRegistry {
    defs: BTreeMap<&'static str, MetricDef>,
}

impl Default for MetricRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl MetricRegistry {
    pub fn empty() -> Self {
        Self {
            defs: BTreeMap::new(),
        }
    }

    /// All log, probe, derived and field metrics.
    pub fn standard() -> Self {
        let mut registry = Self::empty();

        for metric in LogMetric::ALL {
            let description = match metric {
                LogMetric::ContinuityErrorLocal => "Latest time-step continuity error, sum local",
                LogMetric::ContinuityErrorGlobal => "Latest time-step continuity error, |global|",
                LogMetric::ContinuityErrorCumulative => {
                    "Latest time-step continuity error, |cumulative|"
                }
                LogMetric::YPlusMax => "Latest maximum wall y+",
                LogMetric::YPlusAvg => "Latest average wall y+",
            };
            registry.register(MetricDef {
                name: metric.name(),
                source: MetricSource::Log(metric),
                description,
            });
        }

        registry.register(MetricDef {
            name: "inlet_pressure",
            source: MetricSource::Probe(Probe::Inlet),
            description: "Inlet total pressure at its latest recorded time",
        });
        registry.register(MetricDef {
            name: "outlet_pressure",
            source: MetricSource::Probe(Probe::Outlet),
            description: "Outlet total pressure at its latest recorded time",
        });

        registry.register(MetricDef {
            name: DerivedRule::PressureDrop.name(),
            source: MetricSource::ProbePair(DerivedRule::PressureDrop),
            description: "Total pressure drop p_inlet - p_outlet at the common probe time",
        });
        registry.register(MetricDef {
            name: DerivedRule::PressureLossCoefficient.name(),
            source: MetricSource::ProbePair(DerivedRule::PressureLossCoefficient),
            description: "(p_inlet - p_outlet) / p_inlet at the common probe time",
        });

        for (name, description) in FIELD_METRICS {
            registry.register(MetricDef {
                name,
                source: MetricSource::Field,
                description,
            });
        }

        registry
    }

    /// Add or replace a definition, returning the one it replaced.
    pub fn register(&mut self, def: MetricDef) -> Option<MetricDef> {
        self.defs.insert(def.name, def)
    }

    pub fn resolve(&self, name: &str) -> Option<&MetricDef> {
        self.defs.get(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> {
        self.defs.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MetricDef> {
        self.defs.values()
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }
}
