//! The Snapshot data model.
//!
//! A [`Snapshot`] captures one analysis run of a package. It is built once by
//! the [`PackageAnalyzer`](crate::analyzer::PackageAnalyzer), then only read:
//! persisted by the history store, fed to the insight rules and rendered.

use crate::section::Section;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One analysis result for a package at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Name of the analyzed directory, used to name reports.
    pub package_name: String,
    /// Absolute path of the analyzed package.
    pub package_path: PathBuf,
    /// When the analysis ran.
    pub timestamp: DateTime<Utc>,
    pub manifest: Section<ManifestSummary>,
    pub version: Section<VersionSummary>,
    pub compiler_config: Section<CompilerConfigSummary>,
    pub build: Section<BuildSummary>,
    pub dist: Section<DistSummary>,
    pub dependencies: Section<DependencySummary>,
    pub dependency_sizes: Section<DependencySizeSummary>,
    pub pack: Section<PackSummary>,
}

impl Snapshot {
    /// Creates a snapshot in which every section is absent.
    ///
    /// Useful as a starting point in tests and for packages where every probe
    /// was skipped.
    pub fn empty(
        package_name: impl Into<String>,
        package_path: PathBuf,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            package_name: package_name.into(),
            package_path,
            timestamp,
            manifest: Section::Absent,
            version: Section::Absent,
            compiler_config: Section::Absent,
            build: Section::Absent,
            dist: Section::Absent,
            dependencies: Section::Absent,
            dependency_sizes: Section::Absent,
            pack: Section::Absent,
        }
    }

    /// The package name declared in the manifest, falling back to the directory name.
    pub fn display_name(&self) -> &str {
        self.manifest
            .present()
            .and_then(|m| m.name.as_deref())
            .unwrap_or(&self.package_name)
    }

    /// Build duration in milliseconds, if the build ran and succeeded.
    pub fn build_duration_ms(&self) -> Option<u64> {
        self.build.present().map(|b| b.duration_ms)
    }

    /// Total size of the distribution directory in bytes.
    pub fn dist_total_size(&self) -> Option<u64> {
        self.dist.present().map(|d| d.size_stats.total_size)
    }

    /// Number of runtime dependencies declared in the manifest.
    pub fn runtime_dependency_count(&self) -> Option<usize> {
        self.dependencies
            .present()
            .map(|d| d.counts.dependencies)
    }
}

/// Summary of `package.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManifestSummary {
    pub name: Option<String>,
    pub version: Option<String>,
    pub description: Option<String>,
    /// Author formatted as `name <email> (url)`.
    pub author: Option<String>,
    pub license: Option<String>,
    pub main: Option<String>,
    pub module: Option<String>,
    /// The `types` field, or `typings` when `types` is missing.
    pub types: Option<String>,
    pub has_esm: bool,
    pub has_cjs: bool,
    pub has_types: bool,
    pub scripts: ScriptFlags,
    pub dependency_counts: DependencyCounts,
    /// `publishConfig.sourcemap` is `true`.
    pub has_source_maps: bool,
    /// Raw `sideEffects` value.
    pub side_effects: Option<serde_json::Value>,
    pub has_exports: bool,
    pub files: Vec<String>,
}

/// Which lifecycle scripts the manifest declares.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptFlags {
    pub has_build: bool,
    pub has_test: bool,
    /// `lint` or `eslint`.
    pub has_lint: bool,
    pub has_prettier: bool,
    pub has_prepublish: bool,
    pub has_prepack: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyCounts {
    pub dependencies: usize,
    pub dev_dependencies: usize,
    pub peer_dependencies: usize,
    /// `@types/*` packages among the dev dependencies.
    pub type_definitions: usize,
    pub total: usize,
}

/// Version and provenance information.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionSummary {
    pub current_version: String,
    pub manifest_modified: Option<DateTime<Utc>>,
    pub newest_file: Option<FileStamp>,
    pub oldest_file: Option<FileStamp>,
    pub git: Section<GitSummary>,
    pub registry: Section<RegistryHistory>,
}

/// A source file and its modification time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileStamp {
    /// Path relative to the package root.
    pub path: String,
    pub modified: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitSummary {
    pub last_commit_date: Option<DateTime<Utc>>,
    pub commit_count: usize,
    /// The ten most recent tags, highest version first.
    pub tags: Vec<String>,
    pub tag_count: usize,
    pub current_branch: Option<String>,
    pub contributors_count: usize,
}

/// Publish history reported by the npm registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryHistory {
    pub created: Option<DateTime<Utc>>,
    pub modified: Option<DateTime<Utc>>,
    /// Published versions, newest first.
    pub versions: Vec<PublishedVersion>,
    pub version_count: usize,
}

impl RegistryHistory {
    /// The most recently published version.
    pub fn latest(&self) -> Option<&PublishedVersion> {
        self.versions.first()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishedVersion {
    pub version: String,
    pub date: DateTime<Utc>,
}

/// Summary of the TypeScript compiler configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompilerConfigSummary {
    /// File the configuration was read from, e.g. `tsconfig.json`.
    pub config_file: String,
    pub target: Option<String>,
    pub module: Option<String>,
    pub declaration: Option<bool>,
    pub declaration_map: Option<bool>,
    pub source_map: Option<bool>,
    pub strict: Option<bool>,
    pub es_module_interop: Option<bool>,
    pub skip_lib_check: Option<bool>,
    pub force_consistent_casing_in_file_names: Option<bool>,
    pub out_dir: Option<String>,
    pub root_dir: Option<String>,
    pub composite: Option<bool>,
    pub ts_build_info_file: Option<String>,
    pub incremental: Option<bool>,
    pub jsx: Option<String>,
    pub jsx_factory: Option<String>,
    pub jsx_fragment_factory: Option<String>,
    pub lib: Vec<String>,
    pub types: Vec<String>,
    /// Number of `paths` mappings.
    pub path_mappings: Option<usize>,
    pub base_url: Option<String>,
    pub resolve_json_module: Option<bool>,
    pub module_resolution: Option<String>,
    pub extends: Option<String>,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    /// Number of project references.
    pub references: Option<usize>,
}

/// A successful build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildSummary {
    pub duration_ms: u64,
    pub duration_formatted: String,
    /// Whether `npm run clean` succeeded before the build.
    pub cleaned: bool,
}

/// Summary of the distribution output directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistSummary {
    /// Directory name relative to the package, e.g. `dist`.
    pub directory: String,
    pub file_stats: DistFileStats,
    pub size_stats: DistSizeStats,
    pub module_info: ModuleInfo,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistFileStats {
    pub js_files: usize,
    pub dts_files: usize,
    pub map_files: usize,
    pub dts_map_files: usize,
    pub json_files: usize,
    pub css_files: usize,
    pub other_files: usize,
    pub total_files: usize,
}

/// Sizes in bytes. `other_size` covers everything that is not JavaScript,
/// a declaration file or one of their maps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistSizeStats {
    pub js_size: u64,
    pub dts_size: u64,
    pub map_size: u64,
    pub dts_map_size: u64,
    pub other_size: u64,
    pub total_size: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleInfo {
    pub esm_modules: usize,
    pub cjs_modules: usize,
    pub source_map_references: usize,
    pub has_both_module_types: bool,
}

/// Declared dependencies and the tooling detected among them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencySummary {
    pub counts: DependencyCounts,
    pub tooling: Tooling,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tooling {
    pub build_tools: Vec<String>,
    pub testing_tools: Vec<String>,
    pub linting_tools: Vec<String>,
}

/// Installed size of `node_modules`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencySizeSummary {
    pub total_size: u64,
    /// The largest installed packages, biggest first.
    pub largest: Vec<InstalledPackage>,
    pub installed_count: usize,
    pub direct_count: usize,
    pub transitive_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledPackage {
    pub name: String,
    pub version: String,
    pub size: u64,
}

/// Size of the published tarball.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackSummary {
    pub packed_size: u64,
    pub unpacked_size: u64,
    /// `packed_size / unpacked_size`, 0 when nothing was listed.
    pub compression_ratio: f64,
    pub tarball_name: String,
    pub tarball_path: PathBuf,
    /// The largest packed files, biggest first.
    pub largest_files: Vec<PackedFile>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackedFile {
    pub path: String,
    pub size: u64,
}
