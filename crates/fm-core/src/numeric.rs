/// Floating point type used throughout system
pub type Real = f64;

/// Regex fragment matching a signed float with optional decimal point and exponent.
///
/// Matches `12`, `-6.275e-09`, `.5`, `+3.`, `1E+3`. Does not match `nan` or `inf`.
pub const FLOAT_PATTERN: &str = r"[-+]?(?:\d+\.?\d*|\.\d+)(?:[eE][-+]?\d+)?";

/// Parse a numeric token, rejecting anything that is not a finite float.
///
/// `str::parse` accepts `inf` and `NaN` spellings; solvers print those for
/// diverged runs and they must not be mistaken for readings.
pub fn parse_real(token: &str) -> Option<Real> {
    token
        .trim()
        .parse::<Real>()
        .ok()
        .filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_real_accepts_scientific_notation() {
        assert_eq!(parse_real("-6.275e-09"), Some(-6.275e-9));
        assert_eq!(parse_real(" 100500 "), Some(100500.0));
        assert_eq!(parse_real("1E+3"), Some(1000.0));
        assert_eq!(parse_real("0"), Some(0.0));
    }

    #[test]
    fn parse_real_rejects_non_finite_and_garbage() {
        assert_eq!(parse_real("nan"), None);
        assert_eq!(parse_real("inf"), None);
        assert_eq!(parse_real("-Infinity"), None);
        assert_eq!(parse_real("1e400"), None);
        assert_eq!(parse_real("12.5.3"), None);
        assert_eq!(parse_real(""), None);
    }
}
