//! Case layout configuration.
//!
//! Where the solver log and probe files live inside a case, how probe rows
//! are selected, and how the field post-processor is launched. Every field
//! has a default so a case without a configuration file works as-is.

use std::path::{Path, PathBuf};
use std::time::Duration;

use fm_series::SampleSelection;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

pub const LATEST_VERSION: u32 = 1;

/// Upper bound on `post_processor.timeout_s` (one week).
pub const MAX_TIMEOUT_S: f64 = 7.0 * 24.0 * 3600.0;

/// File looked up inside the case directory when no explicit path is given.
pub const CASE_CONFIG_FILE: &str = "extract-metric.yaml";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct CaseLayout {
    pub version: u32,
    /// Solver log, relative to the case directory.
    pub log_file: PathBuf,
    /// Inlet total-pressure probe file.
    pub inlet_probe: PathBuf,
    /// Outlet total-pressure probe file.
    pub outlet_probe: PathBuf,
    pub selection: SampleSelection,
    pub post_processor: PostProcessorConfig,
}

impl Default for CaseLayout {
    fn default() -> Self {
        Self {
            version: LATEST_VERSION,
            log_file: PathBuf::from("log.reactingFoam"),
            inlet_probe: PathBuf::from("postProcessing/inletTotalPressure/0/surfaceFieldValue.dat"),
            outlet_probe: PathBuf::from(
                "postProcessing/outletTotalPressure/0/surfaceFieldValue.dat",
            ),
            selection: SampleSelection::FileOrder,
            post_processor: PostProcessorConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct PostProcessorConfig {
    /// Program followed by its leading arguments; the case directory and
    /// metric name are appended.
    pub command: Vec<String>,
    pub timeout_s: f64,
}

impl Default for PostProcessorConfig {
    fn default() -> Self {
        Self {
            command: vec!["pvpython".to_string(), "scripts/compute_metric.py".to_string()],
            timeout_s: 900.0,
        }
    }
}

impl PostProcessorConfig {
    /// Falls back to the default when `timeout_s` is not a usable duration.
    pub fn timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.timeout_s)
            .unwrap_or_else(|_| Duration::from_secs_f64(Self::default().timeout_s))
    }
}

impl CaseLayout {
    pub fn log_path(&self, case_dir: &Path) -> PathBuf {
        case_dir.join(&self.log_file)
    }

    pub fn inlet_path(&self, case_dir: &Path) -> PathBuf {
        case_dir.join(&self.inlet_probe)
    }

    pub fn outlet_path(&self, case_dir: &Path) -> PathBuf {
        case_dir.join(&self.outlet_probe)
    }

    pub fn from_yaml_str(content: &str, origin: &Path) -> AppResult<Self> {
        let layout: CaseLayout =
            serde_yaml::from_str(content).map_err(|source| AppError::ConfigParse {
                path: origin.to_path_buf(),
                source,
            })?;
        layout.validate()?;
        Ok(layout)
    }

    pub fn load(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| AppError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&content, path)
    }

    /// Explicit file if given, else `<case_dir>/extract-metric.yaml` if it
    /// exists, else defaults.
    pub fn resolve(case_dir: &Path, explicit: Option<&Path>) -> AppResult<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let local = case_dir.join(CASE_CONFIG_FILE);
        if local.is_file() {
            Self::load(&local)
        } else {
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.version > LATEST_VERSION {
            return Err(AppError::UnsupportedVersion {
                version: self.version,
            });
        }
        for (field, path) in [
            ("log_file", &self.log_file),
            ("inlet_probe", &self.inlet_probe),
            ("outlet_probe", &self.outlet_probe),
        ] {
            if path.as_os_str().is_empty() {
                return Err(AppError::Validation(format!("{field} must not be empty")));
            }
        }
        match self.post_processor.command.first() {
            Some(program) if !program.trim().is_empty() => {}
            _ => {
                return Err(AppError::Validation(
                    "post_processor.command must name a program".to_string(),
                ));
            }
        }
        let timeout = self.post_processor.timeout_s;
        if !(timeout.is_finite() && timeout > 0.0 && timeout <= MAX_TIMEOUT_S) {
            return Err(AppError::Validation(format!(
                "post_processor.timeout_s must be in (0, {MAX_TIMEOUT_S}], got {timeout}"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        CaseLayout::default().validate().unwrap();
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let yaml = "log_file: log.simpleFoam\nselection: greatest_time\n";
        let layout = CaseLayout::from_yaml_str(yaml, Path::new("inline")).unwrap();
        assert_eq!(layout.log_file, PathBuf::from("log.simpleFoam"));
        assert_eq!(layout.selection, SampleSelection::GreatestTime);
        assert_eq!(layout.inlet_probe, CaseLayout::default().inlet_probe);
        assert_eq!(layout.post_processor, PostProcessorConfig::default());
    }

    #[test]
    fn post_processor_section_parses() {
        let yaml = "post_processor:\n  command: [python3, tools/field.py]\n  timeout_s: 30\n";
        let layout = CaseLayout::from_yaml_str(yaml, Path::new("inline")).unwrap();
        assert_eq!(layout.post_processor.command, vec!["python3", "tools/field.py"]);
        assert_eq!(layout.post_processor.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = CaseLayout::from_yaml_str("log: x\n", Path::new("inline")).unwrap_err();
        assert!(matches!(err, AppError::ConfigParse { .. }));
    }

    #[test]
    fn empty_command_is_rejected() {
        let yaml = "post_processor:\n  command: []\n";
        let err = CaseLayout::from_yaml_str(yaml, Path::new("inline")).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn huge_timeout_is_rejected() {
        let yaml = "post_processor:\n  timeout_s: 1.0e19\n";
        let err = CaseLayout::from_yaml_str(yaml, Path::new("inline")).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn future_version_is_rejected() {
        let err = CaseLayout::from_yaml_str("version: 7\n", Path::new("inline")).unwrap_err();
        assert!(matches!(err, AppError::UnsupportedVersion { version: 7 }));
    }

    #[test]
    fn resolve_prefers_case_local_file() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            CaseLayout::resolve(dir.path(), None).unwrap(),
            CaseLayout::default()
        );

        std::fs::write(dir.path().join(CASE_CONFIG_FILE), "log_file: log.custom\n").unwrap();
        let layout = CaseLayout::resolve(dir.path(), None).unwrap();
        assert_eq!(layout.log_path(dir.path()), dir.path().join("log.custom"));
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let absent = dir.path().join("absent.yaml");
        let err = CaseLayout::resolve(dir.path(), Some(absent.as_path())).unwrap_err();
        assert!(matches!(err, AppError::ConfigRead { .. }));
    }
}
