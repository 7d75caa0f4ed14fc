//! Quantities derived from the aligned inlet/outlet pressure pair.

use std::fmt;

use fm_core::{MetricValue, Real};
use fm_series::AlignedPair;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DerivedRule {
    /// `p_inlet - p_outlet`
    PressureDrop,
    /// `(p_inlet - p_outlet) / p_inlet`
    PressureLossCoefficient,
}

impl DerivedRule {
    pub fn name(self) -> &'static str {
        match self {
            Self::PressureDrop => "pressure_drop",
            Self::PressureLossCoefficient => "pressure_loss_coefficient",
        }
    }

    pub fn apply(self, pair: &AlignedPair) -> MetricValue {
        match self {
            Self::PressureDrop => pressure_drop(pair.a, pair.b),
            Self::PressureLossCoefficient => pressure_loss_coefficient(pair.a, pair.b),
        }
    }
}

impl fmt::Display for DerivedRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub fn pressure_drop(p_inlet: Real, p_outlet: Real) -> MetricValue {
    MetricValue::finite(p_inlet - p_outlet)
}

/// Zero inlet pressure is a degenerate operating point, not an infinite loss.
pub fn pressure_loss_coefficient(p_inlet: Real, p_outlet: Real) -> MetricValue {
    if p_inlet == 0.0 {
        return MetricValue::NotAvailable;
    }
    MetricValue::finite((p_inlet - p_outlet) / p_inlet)
}
