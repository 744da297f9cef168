//! Probe Trait
//!
//! This module defines the [`Probe`] trait, the common interface of every
//! single-purpose reader that feeds one section of a
//! [`Snapshot`](crate::snapshot::Snapshot).
//!
//! # Overview
//!
//! - Each probe has a name for identification in logs and error messages
//! - Each probe reads one input source (a file, a directory or an external command)
//! - A probe reports "not found" with `Ok(None)` and failures with `Err`
//!
//! The [`run_probe`] function is the only place where a probe's outcome is
//! turned into a [`Section`], which keeps failures isolated per section.
//!
//! # Implementing a Probe
//!
//! ```rust,no_run
//! use pkglens_core::error::Result;
//! use pkglens_core::probe::{Probe, ProbeContext};
//!
//! struct ReadmeProbe;
//!
//! impl Probe for ReadmeProbe {
//!     type Data = usize;
//!
//!     fn name() -> &'static str {
//!         "readme"
//!     }
//!
//!     fn description() -> &'static str {
//!         "Measures the length of README.md"
//!     }
//!
//!     fn probe(&self, ctx: &ProbeContext<'_>) -> Result<Option<usize>> {
//!         let path = ctx.package_dir.join("README.md");
//!         if !path.exists() {
//!             return Ok(None);
//!         }
//!         Ok(Some(std::fs::read_to_string(path)?.len()))
//!     }
//! }
//! ```

use crate::error::Result;
use crate::section::Section;
use crate::shell::CommandRunner;
use serde::Serialize;
use std::fmt::Debug;
use std::path::Path;

/// Everything a probe may read from.
pub struct ProbeContext<'a> {
    /// Absolute path of the package root.
    pub package_dir: &'a Path,
    /// Executes external commands.
    pub runner: &'a dyn CommandRunner,
}

impl<'a> ProbeContext<'a> {
    pub fn new(package_dir: &'a Path, runner: &'a dyn CommandRunner) -> Self {
        Self {
            package_dir,
            runner,
        }
    }
}

/// Common trait for all probes.
pub trait Probe: Sized {
    /// The section data this probe produces.
    type Data: Debug + Serialize;

    /// Returns the name of this probe, a unique snake_case string.
    fn name() -> &'static str;

    /// Returns a human-readable description of this probe.
    fn description() -> &'static str;

    /// Reads the probe's input source.
    ///
    /// # Errors
    ///
    /// Returns a [`PkglensError`](crate::error::PkglensError) if the input
    /// exists but cannot be read, parsed, or produced by its external command.
    /// A missing input is `Ok(None)`, not an error.
    fn probe(&self, ctx: &ProbeContext<'_>) -> Result<Option<Self::Data>>;
}

/// Runs `probe` and records its outcome as a [`Section`].
///
/// Missing inputs are logged as warnings and failures as errors; neither
/// stops the caller.
pub fn run_probe<P: Probe>(probe: &P, ctx: &ProbeContext<'_>) -> Section<P::Data> {
    tracing::info!(probe = P::name(), "{}", P::description());
    let section = Section::from_result(probe.probe(ctx));
    match &section {
        Section::Present(data) => tracing::debug!(probe = P::name(), ?data, "probe finished"),
        Section::Absent => tracing::warn!(probe = P::name(), "input not found, section skipped"),
        Section::Errored(message) => {
            tracing::error!(probe = P::name(), error = %message, "probe failed")
        }
    }
    section
}

/// Helper macro for creating errors with probe context.
///
/// # Examples
///
/// ```rust
/// # use pkglens_core::probe_error;
/// let error = probe_error!("dist", "Failed to read {}", "dist/index.js");
/// assert!(error.to_string().contains("dist/index.js"));
/// ```
#[macro_export]
macro_rules! probe_error {
    ($probe_name:expr, $msg:expr) => {
        $crate::error::PkglensError::analysis_error($probe_name, $msg)
    };
    ($probe_name:expr, $fmt:expr, $($arg:tt)*) => {
        $crate::error::PkglensError::analysis_error($probe_name, format!($fmt, $($arg)*))
    };
}
