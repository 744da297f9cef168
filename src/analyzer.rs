//! Analysis Aggregator
//!
//! [`PackageAnalyzer`] runs every probe against one package, assembles the
//! [`Snapshot`], records it in the history store, derives insights and
//! writes the reports.
//!
//! Output layout under the output root:
//!
//! ```text
//! <output root>/<package>/
//!     <package>-analysis.md
//!     <package>-analysis.html
//!     <package>-analysis.json
//!     history/analysis-<timestamp>.json
//!     pack-analysis/<tarball>.tgz
//! ```

use crate::build_probe::BuildProbe;
use crate::compiler_config_probe::CompilerConfigProbe;
use crate::dependency_probe::{DependencyProbe, DependencySizeProbe};
use crate::dist_probe::DistProbe;
use crate::error::{PkglensError, Result};
use crate::history::{previous_snapshot, with_current, ComparisonDelta, HistoryStore};
use crate::insights::{derive_insights_with, Insight, InsightThresholds};
use crate::manifest_probe::ManifestProbe;
use crate::pack_probe::PackProbe;
use crate::probe::{run_probe, ProbeContext};
use crate::reporting::{write_reports, ReportContext, ReportPaths};
use crate::section::Section;
use crate::shell::CommandRunner;
use crate::snapshot::Snapshot;
use crate::version_probe::VersionProbe;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

/// Default output root, relative to the working directory.
pub const DEFAULT_OUTPUT_ROOT: &str = "package-analysis";

/// What to analyze and how.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzerSettings {
    pub package_path: PathBuf,
    pub output_root: PathBuf,
    /// Run `npm run clean` and `npm run build`.
    pub run_build: bool,
    /// Run `npm pack`.
    pub run_pack: bool,
    /// Query `npm view` for the publish history.
    pub query_registry: bool,
    pub thresholds: InsightThresholds,
}

impl AnalyzerSettings {
    pub fn new(package_path: impl Into<PathBuf>) -> Self {
        Self {
            package_path: package_path.into(),
            output_root: PathBuf::from(DEFAULT_OUTPUT_ROOT),
            run_build: true,
            run_pack: true,
            query_registry: true,
            thresholds: InsightThresholds::default(),
        }
    }
}

/// Where one package's outputs go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    pub output_dir: PathBuf,
    pub history_dir: PathBuf,
    pub pack_dir: PathBuf,
}

impl OutputLayout {
    pub fn new(output_root: &Path, package_name: &str) -> Self {
        let output_dir = output_root.join(package_name);
        Self {
            history_dir: output_dir.join("history"),
            pack_dir: output_dir.join("pack-analysis"),
            output_dir,
        }
    }
}

/// Result of a complete run.
#[derive(Debug)]
pub struct RunSummary {
    pub snapshot: Snapshot,
    pub insights: Vec<Insight>,
    pub comparison: Option<ComparisonDelta>,
    /// Number of snapshots in the series the reports were rendered from.
    pub history_len: usize,
    /// The new history record, unless saving it failed.
    pub history_record: Option<PathBuf>,
    pub reports: ReportPaths,
}

/// Analyzes one package.
#[derive(Debug)]
pub struct PackageAnalyzer<R: CommandRunner> {
    settings: AnalyzerSettings,
    runner: R,
    package_dir: PathBuf,
    package_name: String,
    layout: OutputLayout,
}

impl<R: CommandRunner> PackageAnalyzer<R> {
    /// Validates the package path and prepares the output layout.
    ///
    /// # Errors
    ///
    /// Returns [`PkglensError::InvalidInput`] if the package path is not a
    /// directory.
    pub fn new(settings: AnalyzerSettings, runner: R) -> Result<Self> {
        if !settings.package_path.is_dir() {
            return Err(PkglensError::invalid_input_with_arg(
                format!(
                    "Package path '{}' does not exist or is not a directory",
                    settings.package_path.display()
                ),
                "PACKAGE_PATH",
            ));
        }
        let package_dir = settings.package_path.canonicalize().map_err(|e| {
            PkglensError::io_error_with_source("resolve package path", settings.package_path.clone(), e)
        })?;
        let package_name = package_dir
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "package".to_string());
        let layout = OutputLayout::new(&settings.output_root, &package_name);

        tracing::info!(
            package = %package_name,
            output = %layout.output_dir.display(),
            "analyzing package"
        );

        Ok(Self {
            settings,
            runner,
            package_dir,
            package_name,
            layout,
        })
    }

    pub fn package_name(&self) -> &str {
        &self.package_name
    }

    pub fn package_dir(&self) -> &Path {
        &self.package_dir
    }

    pub fn layout(&self) -> &OutputLayout {
        &self.layout
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Runs every probe and assembles a snapshot stamped with the current time.
    pub fn analyze(&self) -> Snapshot {
        self.analyze_at(Utc::now())
    }

    /// Runs every probe in order and assembles a snapshot stamped `timestamp`.
    pub fn analyze_at(&self, timestamp: DateTime<Utc>) -> Snapshot {
        let ctx = ProbeContext::new(&self.package_dir, &self.runner);
        let settings = &self.settings;

        let manifest = run_probe(&ManifestProbe::new(), &ctx);
        let version = run_probe(&VersionProbe::new(settings.query_registry), &ctx);
        let compiler_config = run_probe(&CompilerConfigProbe::new(), &ctx);
        let build = if settings.run_build {
            run_probe(&BuildProbe::new(), &ctx)
        } else {
            tracing::info!("build skipped");
            Section::Absent
        };
        let dist = run_probe(&DistProbe::new(), &ctx);
        let dependencies = run_probe(&DependencyProbe::new(), &ctx);
        let dependency_sizes = run_probe(&DependencySizeProbe::new(), &ctx);
        let pack = if settings.run_pack {
            run_probe(&PackProbe::new(self.layout.pack_dir.clone()), &ctx)
        } else {
            tracing::info!("package size analysis skipped");
            Section::Absent
        };

        Snapshot {
            package_name: self.package_name.clone(),
            package_path: self.package_dir.clone(),
            timestamp,
            manifest,
            version,
            compiler_config,
            build,
            dist,
            dependencies,
            dependency_sizes,
            pack,
        }
    }

    /// Analyzes the package, records the snapshot and writes the reports.
    ///
    /// # Errors
    ///
    /// Fails only when a report cannot be written. A history record that
    /// cannot be saved is logged and the run continues.
    pub fn run(&self) -> Result<RunSummary> {
        self.run_at(Utc::now())
    }

    pub fn run_at(&self, timestamp: DateTime<Utc>) -> Result<RunSummary> {
        let snapshot = self.analyze_at(timestamp);

        let store = HistoryStore::new(&self.layout.history_dir);
        let history_record = match store.append(&snapshot) {
            Ok(path) => Some(path),
            Err(e) => {
                tracing::warn!(error = %e, "could not save analysis to history");
                None
            }
        };

        let history = with_current(store.load_all(), &snapshot);

        let previous = previous_snapshot(&history, &snapshot);
        let comparison = previous.map(|previous| ComparisonDelta::between(&snapshot, previous));
        let insights = derive_insights_with(&snapshot, previous, &self.settings.thresholds);
        tracing::info!(insights = insights.len(), history = history.len(), "derived insights");

        let ctx = ReportContext::new(&snapshot, &history, &insights)
            .with_comparison(comparison.as_ref())
            .generated_at(Utc::now());
        let reports = write_reports(&self.layout.output_dir, &ctx)?;
        let history_len = history.len();

        Ok(RunSummary {
            snapshot,
            insights,
            comparison,
            history_len,
            history_record,
            reports,
        })
    }
}
