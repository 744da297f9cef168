//! Pack probe: measures the tarball `npm pack` would publish.

use crate::error::{PkglensError, Result};
use crate::file_utils;
use crate::format_utils::format_bytes;
use crate::probe::{Probe, ProbeContext};
use crate::probe_error;
use crate::shell::CommandSpec;
use crate::snapshot::{PackSummary, PackedFile};
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

/// Number of files listed in a [`PackSummary`].
pub const MAX_LARGEST_FILES: usize = 10;

/// One entry of `npm pack --dry-run --json`.
#[derive(Debug, Deserialize)]
struct DryRunPackage {
    #[serde(default)]
    files: Vec<DryRunFile>,
}

#[derive(Debug, Deserialize)]
struct DryRunFile {
    path: String,
    #[serde(default)]
    size: u64,
}

/// Parses the file listing printed by `npm pack --dry-run --json`.
pub fn parse_dry_run_listing(json: &str) -> Result<Vec<PackedFile>> {
    let packages: Vec<DryRunPackage> = serde_json::from_str(json.trim()).map_err(|e| {
        PkglensError::parse_error(format!("npm pack --dry-run output is not valid JSON: {}", e))
    })?;
    Ok(packages
        .into_iter()
        .flat_map(|package| package.files)
        .map(|file| PackedFile {
            path: file.path,
            size: file.size,
        })
        .collect())
}

/// Packs the package into `pack_dir` and reads back the tarball size.
#[derive(Debug)]
pub struct PackProbe {
    /// Where the tarball is written, usually `<output>/pack-analysis`.
    pub pack_dir: PathBuf,
}

impl PackProbe {
    pub fn new(pack_dir: PathBuf) -> Self {
        Self { pack_dir }
    }
}

impl Probe for PackProbe {
    type Data = PackSummary;

    fn name() -> &'static str {
        "pack"
    }

    fn description() -> &'static str {
        "Analyzing package size"
    }

    #[tracing::instrument(level = "debug", skip(self, ctx), fields(package = %ctx.package_dir.display()), err)]
    fn probe(&self, ctx: &ProbeContext<'_>) -> Result<Option<PackSummary>> {
        fs::create_dir_all(&self.pack_dir).map_err(|e| {
            PkglensError::io_error_with_source("create pack directory", self.pack_dir.clone(), e)
        })?;

        let pack = CommandSpec::npm(ctx.package_dir, ["pack", "--pack-destination"])
            .args([self.pack_dir.to_string_lossy().into_owned()]);
        let output = ctx.runner.run_checked(&pack)?;

        let Some(tarball_name) = output
            .stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .last()
            .map(str::to_string)
        else {
            return Err(probe_error!(Self::name(), "npm pack did not report a tarball name"));
        };

        let tarball_path = self.pack_dir.join(&tarball_name);
        if !tarball_path.is_file() {
            return Err(probe_error!(
                Self::name(),
                "tarball {} not found after npm pack",
                tarball_path.display()
            ));
        }
        let packed_size = file_utils::file_size(&tarball_path)?;

        let dry_run = CommandSpec::npm(ctx.package_dir, ["pack", "--dry-run", "--json"]);
        let listing = ctx.runner.run_checked(&dry_run)?;
        let mut files = parse_dry_run_listing(&listing.stdout)?;

        let unpacked_size: u64 = files.iter().map(|f| f.size).sum();
        let compression_ratio = if unpacked_size > 0 {
            packed_size as f64 / unpacked_size as f64
        } else {
            0.0
        };
        files.sort_by(|a, b| b.size.cmp(&a.size).then_with(|| a.path.cmp(&b.path)));
        files.truncate(MAX_LARGEST_FILES);

        tracing::info!(
            packed = %format_bytes(packed_size),
            unpacked = %format_bytes(unpacked_size),
            ratio = %format!("{:.1}%", compression_ratio * 100.0),
            "package size analysis complete"
        );

        Ok(Some(PackSummary {
            packed_size,
            unpacked_size,
            compression_ratio,
            tarball_name,
            tarball_path,
            largest_files: files,
        }))
    }
}
