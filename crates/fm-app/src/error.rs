//! Error types for the fm-app service layer.
//!
//! These never reach the optimisation loop: [`crate::Extractor`] logs them
//! and reports `nan`.

use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Failed to read configuration file: {}", .path.display())]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse configuration file {}: {source}", .path.display())]
    ConfigParse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("Configuration validation failed: {0}")]
    Validation(String),

    #[error("Unsupported configuration version: {version}")]
    UnsupportedVersion { version: u32 },

    #[error("Case directory not found: {}", .0.display())]
    CaseNotFound(PathBuf),

    #[error("Unknown metric: {0}")]
    UnknownMetric(String),

    #[error("Failed to start post-processor '{program}': {source}")]
    PostProcessorSpawn {
        program: String,
        source: std::io::Error,
    },

    #[error("Post-processor exited with {status}: {stderr}")]
    PostProcessorFailed { status: String, stderr: String },

    #[error("Post-processor produced no output")]
    PostProcessorEmpty,

    #[error("Post-processor output is not a finite number: {line:?}")]
    PostProcessorOutput { line: String },

    #[error("Post-processor timed out after {0:?}")]
    PostProcessorTimeout(Duration),

    #[error("Log error: {0}")]
    Log(#[from] fm_core::CoreError),

    #[error("Series error: {0}")]
    Series(#[from] fm_series::SeriesError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for fm-app operations.
pub type AppResult<T> = Result<T, AppError>;
