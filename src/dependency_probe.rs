//! Dependency probes: declared dependencies and installed `node_modules` sizes.

use crate::error::{PkglensError, Result};
use crate::file_utils;
use crate::manifest_probe::{dependency_counts, read_manifest};
use crate::probe::{Probe, ProbeContext};
use crate::snapshot::{DependencySizeSummary, DependencySummary, InstalledPackage, Tooling};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

pub const BUILD_TOOLS: &[&str] = &[
    "typescript",
    "rollup",
    "webpack",
    "esbuild",
    "babel",
    "tsc",
    "vite",
    "parcel",
    "gulp",
    "grunt",
];

pub const TESTING_TOOLS: &[&str] = &[
    "jest",
    "mocha",
    "chai",
    "jasmine",
    "vitest",
    "karma",
    "ava",
    "tap",
    "cypress",
    "playwright",
];

pub const LINTING_TOOLS: &[&str] = &["eslint", "tslint", "prettier", "stylelint"];

/// Number of installed packages listed in a [`DependencySizeSummary`].
pub const MAX_LARGEST_DEPENDENCIES: usize = 20;

fn detect_tools(dev_dependencies: Option<&serde_json::Map<String, Value>>, known: &[&str]) -> Vec<String> {
    let Some(dev_dependencies) = dev_dependencies else {
        return Vec::new();
    };
    known
        .iter()
        .filter(|tool| dev_dependencies.contains_key(**tool))
        .map(|tool| tool.to_string())
        .collect()
}

/// Counts declared dependencies and detects build, test and lint tooling.
#[derive(Debug, Default)]
pub struct DependencyProbe;

impl DependencyProbe {
    pub fn new() -> Self {
        DependencyProbe
    }

    pub fn summarize(&self, manifest: &Value) -> DependencySummary {
        let dev = manifest.get("devDependencies").and_then(Value::as_object);
        DependencySummary {
            counts: dependency_counts(manifest),
            tooling: Tooling {
                build_tools: detect_tools(dev, BUILD_TOOLS),
                testing_tools: detect_tools(dev, TESTING_TOOLS),
                linting_tools: detect_tools(dev, LINTING_TOOLS),
            },
        }
    }
}

impl Probe for DependencyProbe {
    type Data = DependencySummary;

    fn name() -> &'static str {
        "dependencies"
    }

    fn description() -> &'static str {
        "Analyzing dependencies"
    }

    #[tracing::instrument(level = "debug", skip(self, ctx), fields(package = %ctx.package_dir.display()), err)]
    fn probe(&self, ctx: &ProbeContext<'_>) -> Result<Option<DependencySummary>> {
        Ok(read_manifest(ctx.package_dir)?.map(|manifest| self.summarize(&manifest)))
    }
}

/// Measures the packages installed under `node_modules`.
#[derive(Debug, Default)]
pub struct DependencySizeProbe;

impl DependencySizeProbe {
    pub fn new() -> Self {
        DependencySizeProbe
    }

    /// Lists the top-level installed packages as `(name, directory)` pairs,
    /// expanding `@scope` directories.
    pub fn installed_packages(&self, node_modules: &Path) -> Result<Vec<(String, PathBuf)>> {
        let mut packages = Vec::new();
        for (name, path) in list_dir(node_modules)? {
            if name.starts_with('.') || !path.is_dir() {
                continue;
            }
            if name.starts_with('@') {
                for (scoped, scoped_path) in list_dir(&path)? {
                    if scoped_path.is_dir() {
                        packages.push((format!("{}/{}", name, scoped), scoped_path));
                    }
                }
            } else {
                packages.push((name, path));
            }
        }
        Ok(packages)
    }
}

fn list_dir(dir: &Path) -> Result<Vec<(String, PathBuf)>> {
    let entries = fs::read_dir(dir)
        .map_err(|e| PkglensError::io_error_with_source("read directory", dir.to_path_buf(), e))?;
    let mut listed = Vec::new();
    for entry in entries {
        let entry = entry?;
        listed.push((entry.file_name().to_string_lossy().into_owned(), entry.path()));
    }
    listed.sort();
    Ok(listed)
}

fn installed_version(package_dir: &Path) -> String {
    read_manifest(package_dir)
        .ok()
        .flatten()
        .and_then(|manifest| manifest.get("version").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| "unknown".to_string())
}

impl Probe for DependencySizeProbe {
    type Data = DependencySizeSummary;

    fn name() -> &'static str {
        "dependency_sizes"
    }

    fn description() -> &'static str {
        "Analyzing dependency sizes"
    }

    #[tracing::instrument(level = "debug", skip(self, ctx), fields(package = %ctx.package_dir.display()), err)]
    fn probe(&self, ctx: &ProbeContext<'_>) -> Result<Option<DependencySizeSummary>> {
        let node_modules = ctx.package_dir.join("node_modules");
        if !node_modules.is_dir() {
            return Ok(None);
        }

        let mut installed = Vec::new();
        for (name, path) in self.installed_packages(&node_modules)? {
            let size = file_utils::directory_size(&path)?;
            installed.push(InstalledPackage {
                name,
                version: installed_version(&path),
                size,
            });
        }
        installed.sort_by(|a, b| b.size.cmp(&a.size).then_with(|| a.name.cmp(&b.name)));

        let total_size = installed.iter().map(|p| p.size).sum();
        let installed_count = installed.len();
        let direct_count = match read_manifest(ctx.package_dir) {
            Ok(Some(manifest)) => dependency_counts(&manifest).dependencies,
            Ok(None) => 0,
            Err(e) => {
                tracing::debug!(error = %e, "could not read manifest for direct dependency count");
                0
            }
        };
        installed.truncate(MAX_LARGEST_DEPENDENCIES);

        tracing::debug!(installed_count, total_size, "measured node_modules");

        Ok(Some(DependencySizeSummary {
            total_size,
            largest: installed,
            installed_count,
            direct_count,
            transitive_count: installed_count.saturating_sub(direct_count),
        }))
    }
}
