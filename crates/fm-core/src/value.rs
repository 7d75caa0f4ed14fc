//! Metric results as seen by the optimisation loop.

use std::fmt;

use crate::Real;

/// Either a finite reading or the uniform "could not be computed" sentinel.
///
/// Missing files, malformed lines, degenerate arithmetic and collaborator
/// failures all collapse to [`MetricValue::NotAvailable`], printed as `nan`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum MetricValue {
    Value(Real),
    #[default]
    NotAvailable,
}

impl MetricValue {
    /// Wrap `v`, mapping non-finite values to `NotAvailable`.
    pub fn finite(v: Real) -> Self {
        if v.is_finite() {
            Self::Value(v)
        } else {
            Self::NotAvailable
        }
    }

    pub fn value(self) -> Option<Real> {
        match self {
            Self::Value(v) => Some(v),
            Self::NotAvailable => None,
        }
    }

    pub fn is_available(self) -> bool {
        matches!(self, Self::Value(_))
    }
}

impl From<Option<Real>> for MetricValue {
    fn from(v: Option<Real>) -> Self {
        v.map_or(Self::NotAvailable, Self::finite)
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::NotAvailable => f.write_str("nan"),
            Self::Value(v) => {
                let mag = v.abs();
                if mag == 0.0 || (1e-4..1e16).contains(&mag) {
                    write!(f, "{v}")
                } else {
                    write!(f, "{v:e}")
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_available_prints_nan() {
        assert_eq!(MetricValue::NotAvailable.to_string(), "nan");
        assert_eq!(MetricValue::default(), MetricValue::NotAvailable);
    }

    #[test]
    fn zero_is_a_value() {
        let v = MetricValue::from(Some(0.0));
        assert!(v.is_available());
        assert_eq!(v.to_string(), "0");
    }

    #[test]
    fn non_finite_collapses_to_sentinel() {
        assert_eq!(MetricValue::finite(Real::NAN), MetricValue::NotAvailable);
        assert_eq!(MetricValue::finite(Real::INFINITY), MetricValue::NotAvailable);
        assert_eq!(MetricValue::from(Some(Real::NEG_INFINITY)), MetricValue::NotAvailable);
    }

    #[test]
    fn display_round_trips_through_parse() {
        for v in [1300.0, -0.25, 6.275e-9, 12.5, 3.0e20, 1.0e-4] {
            let printed = MetricValue::Value(v).to_string();
            assert_eq!(printed.parse::<Real>().unwrap(), v, "printed {printed}");
        }
        assert_eq!(MetricValue::Value(6.275e-9).to_string(), "6.275e-9");
        assert_eq!(MetricValue::Value(1300.0).to_string(), "1300");
    }
}
