//! Single-pass log reducer.

use std::fmt;
use std::path::Path;

use fm_core::{CoreResult, MetricValue, Real, Snapshot, complete_lines};
use regex::Regex;
use tracing::trace;

use crate::patterns::{
    CONTINUITY_MARKER, CUMULATIVE, GLOBAL, SUM_LOCAL, YPLUS_AVERAGE, YPLUS_HEADER, YPLUS_MAX,
    capture_real,
};

/// Scalar fields that can be read from the solver log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogMetric {
    ContinuityErrorLocal,
    ContinuityErrorGlobal,
    ContinuityErrorCumulative,
    YPlusMax,
    YPlusAvg,
}

impl LogMetric {
    pub const ALL: [LogMetric; 5] = [
        LogMetric::ContinuityErrorLocal,
        LogMetric::ContinuityErrorGlobal,
        LogMetric::ContinuityErrorCumulative,
        LogMetric::YPlusMax,
        LogMetric::YPlusAvg,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::ContinuityErrorLocal => "continuity_error_local",
            Self::ContinuityErrorGlobal => "continuity_error_global",
            Self::ContinuityErrorCumulative => "continuity_error_cumulative",
            Self::YPlusMax => "yplus_max",
            Self::YPlusAvg => "yplus_avg",
        }
    }

    /// Global and cumulative errors are reported as magnitudes.
    pub fn is_absolute(self) -> bool {
        matches!(
            self,
            Self::ContinuityErrorGlobal | Self::ContinuityErrorCumulative
        )
    }

    fn value_pattern(self) -> &'static Regex {
        match self {
            Self::ContinuityErrorLocal => &*SUM_LOCAL,
            Self::ContinuityErrorGlobal => &*GLOBAL,
            Self::ContinuityErrorCumulative => &*CUMULATIVE,
            Self::YPlusMax => &*YPLUS_MAX,
            Self::YPlusAvg => &*YPLUS_AVERAGE,
        }
    }

    fn is_yplus(self) -> bool {
        matches!(self, Self::YPlusMax | Self::YPlusAvg)
    }
}

impl fmt::Display for LogMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Position within the y+ header/value protocol.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum YPlusState {
    #[default]
    Idle,
    /// A header was seen; the next matching value line commits.
    Armed { block: String },
}

/// Reducer over log lines for one metric.
///
/// `latest` is `None` until a line commits a value; a committed zero is a
/// reading like any other.
#[derive(Debug, Clone)]
pub struct LogScanner {
    metric: LogMetric,
    state: YPlusState,
    latest: Option<Real>,
    commits: usize,
}

impl LogScanner {
    pub fn new(metric: LogMetric) -> Self {
        Self {
            metric,
            state: YPlusState::Idle,
            latest: None,
            commits: 0,
        }
    }

    pub fn metric(&self) -> LogMetric {
        self.metric
    }

    pub fn state(&self) -> &YPlusState {
        &self.state
    }

    pub fn latest(&self) -> Option<Real> {
        self.latest
    }

    /// Number of lines that committed a value so far.
    pub fn commits(&self) -> usize {
        self.commits
    }

    pub fn feed(&mut self, line: &str) {
        if self.metric.is_yplus() {
            self.feed_yplus(line);
        } else {
            self.feed_continuity(line);
        }
    }

    pub fn feed_all<'a>(&mut self, lines: impl IntoIterator<Item = &'a str>) {
        for line in lines {
            self.feed(line);
        }
    }

    pub fn finish(self) -> MetricValue {
        MetricValue::from(self.latest)
    }

    fn feed_continuity(&mut self, line: &str) {
        if !CONTINUITY_MARKER.is_match(line) {
            return;
        }
        if let Some(v) = capture_real(self.metric.value_pattern(), line) {
            let v = if self.metric.is_absolute() { v.abs() } else { v };
            self.commit(v);
        }
    }

    fn feed_yplus(&mut self, line: &str) {
        if let Some(caps) = YPLUS_HEADER.captures(line) {
            let block = caps.get(1).map_or("", |m| m.as_str()).to_string();
            self.state = YPlusState::Armed { block };
            return;
        }

        if let YPlusState::Armed { block } = &self.state
            && let Some(v) = capture_real(self.metric.value_pattern(), line)
        {
            trace!(metric = %self.metric, block = %block, value = v, "y+ value committed");
            self.state = YPlusState::Idle;
            self.commit(v);
        }
    }

    fn commit(&mut self, v: Real) {
        self.latest = Some(v);
        self.commits += 1;
    }
}

/// Scan the complete lines of `text`.
pub fn scan_text(text: &str, metric: LogMetric) -> MetricValue {
    let mut scanner = LogScanner::new(metric);
    scanner.feed_all(complete_lines(text));
    scanner.finish()
}

pub fn scan_snapshot(snapshot: &Snapshot, metric: LogMetric) -> MetricValue {
    let mut scanner = LogScanner::new(metric);
    scanner.feed_all(snapshot.lines());
    trace!(
        metric = %metric,
        commits = scanner.commits(),
        partial_tail = snapshot.has_partial_tail(),
        "log scan finished"
    );
    scanner.finish()
}

/// Read `path` once and scan it. A missing or unreadable log is an error so
/// the caller can report why the metric is unavailable.
pub fn scan_file(path: &Path, metric: LogMetric) -> CoreResult<MetricValue> {
    let snapshot = Snapshot::read(path)?;
    Ok(scan_snapshot(&snapshot, metric))
}
