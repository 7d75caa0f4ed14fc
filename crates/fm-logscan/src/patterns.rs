//! Line patterns recognised in solver logs.
//!
//! Continuity summary, as printed once per pressure corrector:
//!
//! ```text
//! time step continuity errors : sum local = 1.3e-09, global = -6.275e-09, cumulative = 2.1e-08
//! ```
//!
//! y+ block, a header followed (possibly after unrelated lines) by the values:
//!
//! ```text
//! yPlus wall:
//!     writing field yPlus
//!     min: 0.41 max: 12.5 average: 3.2
//! ```

use std::sync::LazyLock;

use fm_core::{FLOAT_PATTERN, Real, parse_real};
use regex::Regex;

fn build(template: &str) -> Regex {
    let pattern = template.replace("{float}", FLOAT_PATTERN);
    Regex::new(&pattern).expect("log pattern must compile")
}

pub static CONTINUITY_MARKER: LazyLock<Regex> =
    LazyLock::new(|| build(r"time step continuity errors"));

pub static SUM_LOCAL: LazyLock<Regex> = LazyLock::new(|| build(r"sum local\s*=\s*({float})"));

pub static GLOBAL: LazyLock<Regex> = LazyLock::new(|| build(r"\bglobal\s*=\s*({float})"));

pub static CUMULATIVE: LazyLock<Regex> =
    LazyLock::new(|| build(r"\bcumulative\s*=\s*({float})"));

/// Header of a y+ block; group 1 is the block (patch or function object) name.
pub static YPLUS_HEADER: LazyLock<Regex> = LazyLock::new(|| build(r"^\s*yPlus\b\s*([^\s:]*)"));

pub static YPLUS_MAX: LazyLock<Regex> = LazyLock::new(|| build(r"\bmax\s*[:=]\s*({float})"));

pub static YPLUS_AVERAGE: LazyLock<Regex> =
    LazyLock::new(|| build(r"\baverage\s*[:=]\s*({float})"));

/// Number captured by group 1 of `re` in `line`, if the whole capture parses.
pub fn capture_real(re: &Regex, line: &str) -> Option<Real> {
    let caps = re.captures(line)?;
    parse_real(caps.get(1)?.as_str())
}
