use clap::Parser;
use clap::error::ErrorKind;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use fm_app::{ExtractOptions, MetricRegistry, MetricValue, extract_metric};
use fm_core::{Real, parse_real};

/// Prints exactly one line: the metric value or `nan`. The exit status is 0
/// whenever that line could be written, including for usage errors.
#[derive(Parser)]
#[command(name = "extract-metric")]
#[command(about = "Extract one scalar metric from a simulation case", long_about = None)]
struct Cli {
    /// Simulation case directory
    #[arg(required_unless_present = "list")]
    case_dir: Option<PathBuf>,
    /// Metric name (see --list)
    #[arg(required_unless_present = "list")]
    metric_name: Option<String>,
    /// Case layout file (default: <case_dir>/extract-metric.yaml, if present)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Evaluate field metrics at the stored time nearest this value
    #[arg(long, value_parser = parse_time)]
    time: Option<Real>,
    /// List registered metrics and exit
    #[arg(long)]
    list: bool,
}

fn main() -> io::Result<()> {
    // Diagnostics go to stderr; stdout carries only the value.
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            return err.print();
        }
        Err(err) => {
            let _ = err.print();
            return emit(MetricValue::NotAvailable);
        }
    };

    if cli.list {
        return cmd_list();
    }

    let (Some(case_dir), Some(metric_name)) = (cli.case_dir, cli.metric_name) else {
        return emit(MetricValue::NotAvailable);
    };

    let options = ExtractOptions {
        config: cli.config,
        time: cli.time,
    };
    emit(extract_metric(&case_dir, &metric_name, &options))
}

fn parse_time(arg: &str) -> Result<Real, String> {
    parse_real(arg).ok_or_else(|| format!("`{arg}` is not a finite time"))
}

fn emit(value: MetricValue) -> io::Result<()> {
    let mut out = io::stdout().lock();
    writeln!(out, "{value}")?;
    out.flush()
}

fn cmd_list() -> io::Result<()> {
    let registry = MetricRegistry::standard();
    let mut out = io::stdout().lock();
    for def in registry.iter() {
        writeln!(out, "{:<28} {}", def.name, def.description)?;
    }
    out.flush()
}
