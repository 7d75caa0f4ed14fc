//! Field metrics delegated to an external post-processor.
//!
//! Volume and surface integrals over the mesh live outside this crate. The
//! post-processor is launched with the case directory and metric name and is
//! expected to print one number on stdout and exit 0. Its output is untrusted:
//! a non-zero exit, no output, a non-numeric last line or a hang past the
//! timeout all yield `NotAvailable`.

use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use fm_core::{MetricValue, Real, parse_real};
use tracing::{debug, warn};

use crate::config::{MAX_TIMEOUT_S, PostProcessorConfig};
use crate::error::{AppError, AppResult};

const POLL_INTERVAL: Duration = Duration::from_millis(20);
const STDERR_TAIL_LINES: usize = 5;

/// Capability to compute mesh-integrated metrics for a case.
pub trait FieldMetricProvider {
    fn compute(&self, case_dir: &Path, metric_name: &str) -> MetricValue;
}

impl<F> FieldMetricProvider for F
where
    F: Fn(&Path, &str) -> MetricValue,
{
    fn compute(&self, case_dir: &Path, metric_name: &str) -> MetricValue {
        self(case_dir, metric_name)
    }
}

/// Runs `<program> <args..> <case_dir> <metric_name> [--time=T]`.
#[derive(Debug, Clone)]
pub struct ExternalPostProcessor {
    program: String,
    args: Vec<String>,
    timeout: Duration,
    time: Option<Real>,
}

impl ExternalPostProcessor {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout: PostProcessorConfig::default().timeout(),
            time: None,
        }
    }

    pub fn from_config(config: &PostProcessorConfig) -> Self {
        let mut parts = config.command.iter().cloned();
        let mut processor = Self::new(parts.next().unwrap_or_default());
        processor.args = parts.collect();
        processor.timeout = config.timeout();
        processor
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Evaluate at the stored time nearest `time` instead of the latest one.
    /// Non-finite times are dropped.
    pub fn with_time(mut self, time: Option<Real>) -> Self {
        self.time = time.filter(|t| t.is_finite());
        self
    }

    /// Launch the post-processor and parse its result.
    pub fn run(&self, case_dir: &Path, metric_name: &str) -> AppResult<Real> {
        let mut command = Command::new(&self.program);
        command.args(&self.args).arg(case_dir).arg(metric_name);
        if let Some(time) = self.time {
            command.arg(format!("--time={time}"));
        }
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        debug!(program = %self.program, metric = metric_name, "starting post-processor");
        let mut child = command
            .spawn()
            .map_err(|source| AppError::PostProcessorSpawn {
                program: self.program.clone(),
                source,
            })?;

        let deadline = deadline_after(self.timeout);

        // Drain both pipes concurrently so a chatty child cannot block on a full pipe.
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let Some(status) = wait_until(&mut child, deadline)? else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(AppError::PostProcessorTimeout(self.timeout));
        };

        // A grandchild may inherit the pipes and outlive the child.
        let stdout = collect(&stdout, deadline, self.timeout)?;
        let stderr = collect(&stderr, deadline, self.timeout)?;

        if !status.success() {
            return Err(AppError::PostProcessorFailed {
                status: status.to_string(),
                stderr: tail(&stderr, STDERR_TAIL_LINES),
            });
        }
        if !stderr.trim().is_empty() {
            debug!(stderr = %tail(&stderr, STDERR_TAIL_LINES), "post-processor diagnostics");
        }
        parse_output(&stdout)
    }
}

impl FieldMetricProvider for ExternalPostProcessor {
    fn compute(&self, case_dir: &Path, metric_name: &str) -> MetricValue {
        match self.run(case_dir, metric_name) {
            Ok(value) => MetricValue::finite(value),
            Err(err) => {
                warn!(
                    program = %self.program,
                    metric = metric_name,
                    case = %case_dir.display(),
                    error = %err,
                    "field metric unavailable"
                );
                MetricValue::NotAvailable
            }
        }
    }
}

/// The value is the last non-empty stdout line; earlier lines are banners.
pub fn parse_output(stdout: &str) -> AppResult<Real> {
    let line = stdout
        .lines()
        .rev()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .ok_or(AppError::PostProcessorEmpty)?;
    parse_real(line).ok_or_else(|| AppError::PostProcessorOutput {
        line: line.to_string(),
    })
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        let _ = tx.send(String::from_utf8_lossy(&buf).into_owned());
    });
    rx
}

/// `now + timeout`, clamped to the longest configurable timeout.
fn deadline_after(timeout: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(timeout)
        .or_else(|| now.checked_add(Duration::from_secs_f64(MAX_TIMEOUT_S)))
        .unwrap_or(now)
}

fn wait_until(child: &mut Child, deadline: Instant) -> AppResult<Option<ExitStatus>> {
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

fn collect(rx: &Receiver<String>, deadline: Instant, timeout: Duration) -> AppResult<String> {
    let remaining = deadline.saturating_duration_since(Instant::now());
    match rx.recv_timeout(remaining) {
        Ok(text) => Ok(text),
        Err(RecvTimeoutError::Timeout) => Err(AppError::PostProcessorTimeout(timeout)),
        Err(RecvTimeoutError::Disconnected) => Ok(String::new()),
    }
}

fn tail(text: &str, lines: usize) -> String {
    let all: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    all[all.len().saturating_sub(lines)..].join(" | ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_output_takes_last_line() {
        assert_eq!(parse_output("0.9731\n").unwrap(), 0.9731);
        assert_eq!(
            parse_output("ParaView 5.12 starting\n\n  1.25e-3  \n\n").unwrap(),
            1.25e-3
        );
    }

    #[test]
    fn parse_output_rejects_empty_and_garbage() {
        assert!(matches!(parse_output(""), Err(AppError::PostProcessorEmpty)));
        assert!(matches!(parse_output("  \n\n"), Err(AppError::PostProcessorEmpty)));
        assert!(matches!(
            parse_output("Error computing metric: boom\n"),
            Err(AppError::PostProcessorOutput { .. })
        ));
        assert!(matches!(
            parse_output("nan\n"),
            Err(AppError::PostProcessorOutput { .. })
        ));
    }

    #[test]
    fn deadline_is_clamped() {
        let now = Instant::now();
        let deadline = deadline_after(Duration::MAX);
        assert!(deadline >= now);
        assert!(deadline <= Instant::now() + Duration::from_secs_f64(MAX_TIMEOUT_S));
    }

    #[test]
    fn tail_keeps_last_lines() {
        assert_eq!(tail("a\nb\n\nc\nd\n", 2), "c | d");
        assert_eq!(tail("", 3), "");
    }

    #[test]
    fn closures_are_providers() {
        let provider = |_: &Path, name: &str| {
            if name == "pattern_factor" {
                MetricValue::Value(0.42)
            } else {
                MetricValue::NotAvailable
            }
        };
        assert_eq!(
            provider.compute(Path::new("case"), "pattern_factor"),
            MetricValue::Value(0.42)
        );
    }

    #[test]
    fn missing_program_is_not_available() {
        let processor = ExternalPostProcessor::new("definitely-not-a-real-post-processor-binary");
        let err = processor.run(Path::new("."), "pattern_factor").unwrap_err();
        assert!(matches!(err, AppError::PostProcessorSpawn { .. }));
        assert_eq!(
            processor.compute(Path::new("."), "pattern_factor"),
            MetricValue::NotAvailable
        );
    }

    #[cfg(unix)]
    mod unix {
        use super::*;

        fn shell(script: &str) -> ExternalPostProcessor {
            // `sh -c script argv0 case metric`: the case dir and metric land in $1 and $2.
            ExternalPostProcessor::new("sh")
                .arg("-c")
                .arg(script)
                .arg("post")
        }

        #[test]
        fn successful_run_yields_value() {
            let value = shell("echo 'loading case' >&2; echo 0.93")
                .compute(Path::new("/tmp"), "combustion_efficiency");
            assert_eq!(value, MetricValue::Value(0.93));
        }

        #[test]
        fn receives_case_dir_metric_and_time() {
            let processor = shell(
                r#"[ "$1" = /tmp ] && [ "$2" = pattern_factor ] && [ "$3" = --time=0.5 ] && echo 1"#,
            )
            .with_time(Some(0.5));
            assert_eq!(processor.run(Path::new("/tmp"), "pattern_factor").unwrap(), 1.0);
        }

        #[test]
        fn non_zero_exit_is_not_available() {
            let processor = shell("echo 0.5; echo 'Traceback' >&2; exit 1");
            let err = processor.run(Path::new("/tmp"), "temperature_rise").unwrap_err();
            match err {
                AppError::PostProcessorFailed { stderr, .. } => assert_eq!(stderr, "Traceback"),
                other => panic!("unexpected error: {other}"),
            }
            assert_eq!(
                processor.compute(Path::new("/tmp"), "temperature_rise"),
                MetricValue::NotAvailable
            );
        }

        #[test]
        fn empty_output_is_not_available() {
            let processor = shell("true");
            assert!(matches!(
                processor.run(Path::new("/tmp"), "ch4_domain_average"),
                Err(AppError::PostProcessorEmpty)
            ));
        }

        #[test]
        fn hung_processor_is_killed() {
            let processor = shell("exec sleep 10").with_timeout(Duration::from_millis(200));
            let start = Instant::now();
            let err = processor.run(Path::new("/tmp"), "pattern_factor").unwrap_err();
            assert!(matches!(err, AppError::PostProcessorTimeout(_)));
            assert!(start.elapsed() < Duration::from_secs(5));
        }

        #[test]
        fn hung_grandchild_is_bounded() {
            // The shell exits at once; the background sleep keeps stdout open.
            let processor = shell("sleep 6 & echo 1.5").with_timeout(Duration::from_millis(500));
            let start = Instant::now();
            let err = processor.run(Path::new("/tmp"), "pattern_factor").unwrap_err();
            assert!(matches!(err, AppError::PostProcessorTimeout(_)));
            assert!(start.elapsed() < Duration::from_secs(4));
            assert_eq!(
                processor.compute(Path::new("/tmp"), "pattern_factor"),
                MetricValue::NotAvailable
            );
        }

        #[test]
        fn huge_timeout_does_not_overflow() {
            let value = shell("echo 2.5")
                .with_timeout(Duration::MAX)
                .compute(Path::new("/tmp"), "pattern_factor");
            assert_eq!(value, MetricValue::Value(2.5));
        }

        #[test]
        fn non_finite_time_is_not_forwarded() {
            let processor = shell(r#"[ -z "$3" ] && echo 4"#).with_time(Some(Real::NAN));
            assert_eq!(processor.run(Path::new("/tmp"), "pattern_factor").unwrap(), 4.0);
        }
    }
}
