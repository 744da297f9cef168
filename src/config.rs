//! Configuration file support for pkglens.
//!
//! Settings come from command-line flags, an optional TOML file and built-in
//! defaults. CLI flags take precedence over config file values.

use crate::analyzer::{AnalyzerSettings, DEFAULT_OUTPUT_ROOT};
use crate::error::{PkglensError, Result};
use crate::insights::InsightThresholds;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration file names searched for, in order.
const DEFAULT_CONFIG_FILES: &[&str] = &["pkglens.toml", ".pkglens.toml"];

/// A pkglens configuration file.
///
/// Precedence:
/// 1. CLI arguments (highest priority)
/// 2. Config file values
/// 3. Default values (lowest priority)
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PkglensConfig {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub probes: ProbesConfig,

    /// Insight rule thresholds.
    #[serde(default)]
    pub insights: InsightThresholds,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct GeneralConfig {
    /// Output root; reports land in `<output_dir>/<package>/`.
    pub output_dir: Option<PathBuf>,
}

/// Which external commands the probes may run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ProbesConfig {
    pub run_build: bool,
    pub run_pack: bool,
    pub query_registry: bool,
}

impl Default for ProbesConfig {
    fn default() -> Self {
        Self {
            run_build: true,
            run_pack: true,
            query_registry: true,
        }
    }
}

/// Loads configuration from a specific file.
///
/// Returns `Ok(None)` if the file doesn't exist and an error if it exists
/// but cannot be parsed.
pub fn load_config_from_path(path: &Path) -> Result<Option<PkglensConfig>> {
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path)
        .map_err(|e| PkglensError::io_error_with_source("read config file", path.to_path_buf(), e))?;

    let config: PkglensConfig = toml::from_str(&content).map_err(|e| PkglensError::ConfigError {
        message: format!("Failed to parse configuration: {}", e.message()),
        path: Some(path.to_path_buf()),
        source: Some(Box::new(e)),
    })?;

    Ok(Some(config))
}

/// Looks for a default config file in `package_dir`, then in the current
/// directory.
pub fn discover_config(package_dir: &Path) -> Result<Option<(PathBuf, PkglensConfig)>> {
    let mut search_dirs = vec![package_dir.to_path_buf()];
    if let Ok(cwd) = std::env::current_dir() {
        if cwd != package_dir {
            search_dirs.push(cwd);
        }
    }

    for dir in search_dirs {
        for config_name in DEFAULT_CONFIG_FILES {
            let config_path = dir.join(config_name);
            if let Some(config) = load_config_from_path(&config_path)? {
                tracing::debug!(path = %config_path.display(), "loaded configuration");
                return Ok(Some((config_path, config)));
            }
        }
    }

    Ok(None)
}

/// Loads the explicit config file if one was given, otherwise discovers one.
///
/// # Errors
///
/// An explicit path that does not exist is a [`PkglensError::ConfigError`].
pub fn load_config(
    config_path: Option<&Path>,
    package_dir: &Path,
) -> Result<Option<(PathBuf, PkglensConfig)>> {
    match config_path {
        Some(path) => match load_config_from_path(path)? {
            Some(config) => Ok(Some((path.to_path_buf(), config))),
            None => Err(PkglensError::config_error_with_path(
                "Configuration file not found",
                path.to_path_buf(),
            )),
        },
        None => discover_config(package_dir),
    }
}

/// Merges CLI flags with config file values into analyzer settings.
///
/// A `--skip-*` or `--offline` flag always wins; without it the config file
/// decides, and without a config file everything runs.
pub fn resolve_settings(cli: &crate::cli::Cli, config: Option<&PkglensConfig>) -> AnalyzerSettings {
    let defaults = PkglensConfig::default();
    let config = config.unwrap_or(&defaults);

    let output_root = cli
        .output_dir
        .clone()
        .or_else(|| config.general.output_dir.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_ROOT));

    AnalyzerSettings {
        package_path: cli.package_path.clone(),
        output_root,
        run_build: !cli.skip_build && config.probes.run_build,
        run_pack: !cli.skip_pack && config.probes.run_pack,
        query_registry: !cli.offline && config.probes.query_registry,
        thresholds: config.insights.clone(),
    }
}
