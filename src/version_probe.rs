//! Version probe: current version, modification times, git and registry history.

use crate::error::{PkglensError, Result};
use crate::file_utils;
use crate::git_utils;
use crate::manifest_probe::{manifest_path, read_manifest};
use crate::probe::{Probe, ProbeContext};
use crate::section::Section;
use crate::shell::CommandSpec;
use crate::snapshot::{FileStamp, GitSummary, PublishedVersion, RegistryHistory, VersionSummary};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::path::Path;

type SourceScan = fn(&Path) -> Result<(Option<FileStamp>, Option<FileStamp>)>;

/// Collects version and provenance information for the package.
#[derive(Debug)]
pub struct VersionProbe {
    /// Ask the npm registry for the publish history.
    pub query_registry: bool,
    scan_sources: SourceScan,
}

impl Default for VersionProbe {
    fn default() -> Self {
        Self::new(true)
    }
}

impl VersionProbe {
    pub fn new(query_registry: bool) -> Self {
        Self {
            query_registry,
            scan_sources: file_utils::newest_and_oldest_sources,
        }
    }

    /// Newest and oldest source files. A failed scan leaves both unset.
    fn source_stamps(&self, ctx: &ProbeContext<'_>) -> (Option<FileStamp>, Option<FileStamp>) {
        match (self.scan_sources)(ctx.package_dir) {
            Ok(stamps) => stamps,
            Err(e) => {
                tracing::warn!(error = %e, "could not scan source modification times");
                (None, None)
            }
        }
    }

    fn git_section(&self, ctx: &ProbeContext<'_>) -> Section<GitSummary> {
        if !ctx.package_dir.join(".git").is_dir() {
            tracing::debug!("no .git directory, skipping git history");
            return Section::Absent;
        }
        match git_utils::git_summary(ctx.package_dir) {
            Ok(summary) => Section::Present(summary),
            Err(e) => {
                tracing::warn!(error = %e, "could not read git information");
                Section::Errored(e.to_string())
            }
        }
    }

    fn registry_section(&self, ctx: &ProbeContext<'_>, name: Option<&str>) -> Section<RegistryHistory> {
        if !self.query_registry {
            return Section::Absent;
        }
        let Some(name) = name else {
            tracing::debug!("manifest has no name, skipping registry history");
            return Section::Absent;
        };
        Section::from_result(fetch_registry_history(ctx, name))
    }
}

/// Runs `npm view <name> time --json`.
///
/// An unsuccessful exit means the package is not published and yields
/// `Ok(None)`.
fn fetch_registry_history(ctx: &ProbeContext<'_>, name: &str) -> Result<Option<RegistryHistory>> {
    let spec = CommandSpec::npm(ctx.package_dir, ["view", name, "time", "--json"]);
    let output = ctx.runner.run(&spec)?;
    if !output.success {
        tracing::debug!(package = name, status = ?output.status, "package not found in registry");
        return Ok(None);
    }
    parse_registry_times(&output.stdout).map(Some)
}

fn parse_date(value: &Value) -> Option<DateTime<Utc>> {
    value
        .as_str()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|d| d.with_timezone(&Utc))
}

/// Parses the output of `npm view <name> time --json`.
///
/// Entries with unparsable dates are skipped; versions are sorted newest first.
pub fn parse_registry_times(json: &str) -> Result<RegistryHistory> {
    let value: Value = serde_json::from_str(json.trim())
        .map_err(|e| PkglensError::parse_error(format!("npm view output is not valid JSON: {}", e)))?;
    let Some(times) = value.as_object() else {
        return Err(PkglensError::parse_error(
            "npm view output is not a JSON object",
        ));
    };

    let mut versions: Vec<PublishedVersion> = times
        .iter()
        .filter(|(key, _)| key.as_str() != "created" && key.as_str() != "modified")
        .filter_map(|(version, date)| {
            parse_date(date).map(|date| PublishedVersion {
                version: version.clone(),
                date,
            })
        })
        .collect();
    versions.sort_by(|a, b| b.date.cmp(&a.date));

    Ok(RegistryHistory {
        created: times.get("created").and_then(parse_date),
        modified: times.get("modified").and_then(parse_date),
        version_count: versions.len(),
        versions,
    })
}

impl Probe for VersionProbe {
    type Data = VersionSummary;

    fn name() -> &'static str {
        "version"
    }

    fn description() -> &'static str {
        "Analyzing version history and modification times"
    }

    #[tracing::instrument(level = "debug", skip(self, ctx), fields(package = %ctx.package_dir.display()), err)]
    fn probe(&self, ctx: &ProbeContext<'_>) -> Result<Option<VersionSummary>> {
        let Some(manifest) = read_manifest(ctx.package_dir)? else {
            return Ok(None);
        };

        let current_version = manifest
            .get("version")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string();
        let manifest_modified = file_utils::modified_time(&manifest_path(ctx.package_dir)).ok();
        let (newest_file, oldest_file) = self.source_stamps(ctx);

        let name = manifest.get("name").and_then(Value::as_str);
        Ok(Some(VersionSummary {
            current_version,
            manifest_modified,
            newest_file,
            oldest_file,
            git: self.git_section(ctx),
            registry: self.registry_section(ctx, name),
        }))
    }
}
