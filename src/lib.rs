//! # pkglens - TypeScript/npm package inspection
//!
//! pkglens is a CLI tool and library that inspects a TypeScript/npm package
//! directory, records what it finds in a local history, derives insights and
//! renders reports. It looks at:
//!
//! - **Manifest**: entry points, type declarations, scripts
//! - **Versions**: modification times, git history and npm publish history
//! - **Compiler configuration**: the `tsconfig*.json` in use
//! - **Build**: how long `npm run build` takes and what it produces
//! - **Dependencies**: declared counts, tooling and installed sizes
//! - **Published size**: what `npm pack` would ship
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line argument parsing
//! - [`config`] - Configuration file loading and merging with CLI flags
//! - [`error`] - Centralized error types for the crate
//! - [`shell`] - External command execution behind the [`CommandRunner`] trait
//! - [`probe`] - The [`Probe`] trait and per-section failure isolation
//! - [`snapshot`] - The aggregate analysis record
//! - [`analyzer`] - Runs the probes and drives a complete analysis
//! - [`history`] - Snapshot persistence and comparison with the previous run
//! - [`insights`] - Rule-based insight derivation
//! - [`reporting`] - Markdown, HTML and JSON report output
//! - [`cli_report`] - Table output for the terminal
//!
//! ## Usage as a Library
//!
//! ```rust,no_run
//! use pkglens_core::{AnalyzerSettings, PackageAnalyzer, SystemRunner};
//!
//! # fn main() -> pkglens_core::Result<()> {
//! let settings = AnalyzerSettings {
//!     run_pack: false,
//!     ..AnalyzerSettings::new("./my-library")
//! };
//! let summary = PackageAnalyzer::new(settings, SystemRunner)?.run()?;
//! for insight in &summary.insights {
//!     println!("[{}] {}", insight.severity, insight.message);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! All functions that can fail return [`Result<T>`], a type alias for
//! `std::result::Result<T, PkglensError>`. Probe failures do not abort an
//! analysis; they are recorded as [`Section::Errored`].

pub mod analyzer;
pub mod build_probe;
pub mod cli;
pub mod cli_report;
pub mod compiler_config_probe;
pub mod config;
pub mod dependency_probe;
pub mod dist_probe;
pub mod error;
pub mod file_utils;
pub mod format_utils;
pub mod git_utils;
pub mod history;
pub mod html_report;
pub mod html_utils;
pub mod insights;
pub mod json_report;
pub mod manifest_probe;
pub mod markdown_report;
pub mod pack_probe;
pub mod probe;
pub mod reporting;
pub mod section;
pub mod shell;
pub mod snapshot;
pub mod version_probe;

// Public API exports
pub use crate::analyzer::{AnalyzerSettings, OutputLayout, PackageAnalyzer, RunSummary};
pub use crate::cli::Cli;
pub use crate::history::{previous_snapshot, ComparisonDelta, HistoryStore};
pub use crate::insights::{classify, derive_insights, derive_insights_with, Insight, InsightThresholds, Severity};
pub use crate::probe::{run_probe, Probe, ProbeContext};
pub use crate::section::Section;
pub use crate::shell::{CommandOutput, CommandRunner, CommandSpec, SystemRunner};
pub use crate::snapshot::Snapshot;

// Config exports
pub use crate::config::{load_config, load_config_from_path, resolve_settings, PkglensConfig};

// Report exports
pub use crate::reporting::{write_reports, ReportContext, ReportPaths};
pub use crate::cli_report::{render_insight_table, render_summary_line};

// Error exports
pub use crate::error::{PkglensError as Error, Result};
