//! Insight Engine
//!
//! Turns a [`Snapshot`] into human-readable recommendations. Every rule is a
//! plain record in the static [`RULES`] slice carrying its own [`Severity`];
//! rules are evaluated in declaration order and the output keeps that order.
//!
//! # Rule groups
//!
//! Rules are grouped and ordered as follows:
//!
//! 1. Manifest
//! 2. Compiler configuration
//! 3. Distribution output
//! 4. Version and history
//! 5. Dependencies
//! 6. Dependency sizes
//! 7. Published size
//!
//! A rule only looks at present sections; absent or errored sections never
//! produce insights. When no rule fires, a single positive insight is
//! returned, so the result is never empty.
//!
//! # Severity keywords
//!
//! [`classify`] infers a severity from message text. Built-in messages are
//! worded so that `classify(message)` agrees with the rule's declared
//! severity, which keeps externally supplied text (and older reports)
//! classifiable the same way.

use crate::format_utils::{bytes_to_mib, format_bytes, format_duration};
use crate::snapshot::{ManifestSummary, Snapshot};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Message emitted when no rule fires.
pub const NO_ISSUES_MESSAGE: &str = "Package follows best practices for TypeScript libraries. Great job!";

const DAY_SECONDS: f64 = 60.0 * 60.0 * 24.0;
const MONTH_SECONDS: f64 = DAY_SECONDS * 30.0;

/// How urgent or encouraging an insight is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Medium,
    High,
    Positive,
}

impl Severity {
    pub const ALL: [Severity; 4] = [Severity::High, Severity::Medium, Severity::Info, Severity::Positive];

    pub const fn label(self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Positive => "positive",
        }
    }

    /// CSS class used by the HTML report.
    pub const fn css_class(self) -> &'static str {
        match self {
            Severity::Info => "severity-info",
            Severity::Medium => "severity-medium",
            Severity::High => "severity-high",
            Severity::Positive => "severity-positive",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A derived recommendation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insight {
    pub message: String,
    pub severity: Severity,
}

impl Insight {
    pub fn new(message: impl Into<String>, severity: Severity) -> Self {
        Self {
            message: message.into(),
            severity,
        }
    }
}

/// Limits the rules compare against. Loaded from the `[insights]` table of
/// the configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InsightThresholds {
    /// Distribution size above which a medium insight is raised.
    pub dist_size_bytes: u64,
    /// Source map to JavaScript size ratio.
    pub sourcemap_ratio: f64,
    /// Months without a manifest change before the package counts as stale.
    pub stale_months: f64,
    /// Runtime dependency count.
    pub dependency_count: usize,
    pub frequent_versions_per_month: f64,
    pub infrequent_versions_per_month: f64,
    pub node_modules_high_bytes: u64,
    pub node_modules_medium_bytes: u64,
    /// Transitive packages per direct dependency.
    pub transitive_multiplier: f64,
    /// Share of `node_modules` taken by the largest package, in percent.
    pub largest_dependency_share: f64,
    pub packed_size_bytes: u64,
    pub compression_ratio: f64,
    /// Build time increase over the previous run, in percent.
    pub build_time_regression_pct: f64,
    /// Distribution size growth over the previous run, in percent.
    pub dist_growth_pct: f64,
}

const MIB: u64 = 1024 * 1024;

impl Default for InsightThresholds {
    fn default() -> Self {
        Self {
            dist_size_bytes: MIB,
            sourcemap_ratio: 2.0,
            stale_months: 12.0,
            dependency_count: 20,
            frequent_versions_per_month: 3.0,
            infrequent_versions_per_month: 0.1,
            node_modules_high_bytes: 100 * MIB,
            node_modules_medium_bytes: 50 * MIB,
            transitive_multiplier: 5.0,
            largest_dependency_share: 25.0,
            packed_size_bytes: MIB,
            compression_ratio: 0.9,
            build_time_regression_pct: 25.0,
            dist_growth_pct: 10.0,
        }
    }
}

/// What a rule is evaluated against.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    pub snapshot: &'a Snapshot,
    /// The snapshot of the previous run, if any.
    pub previous: Option<&'a Snapshot>,
    pub thresholds: &'a InsightThresholds,
}

impl<'a> RuleContext<'a> {
    fn manifest(&self) -> Option<&'a ManifestSummary> {
        self.snapshot.manifest.present()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RuleGroup {
    Manifest,
    CompilerConfig,
    Distribution,
    Version,
    Dependencies,
    DependencySizes,
    PublishedSize,
}

/// One heuristic check.
pub struct InsightRule {
    pub name: &'static str,
    pub group: RuleGroup,
    pub severity: Severity,
    /// Returns the message when the rule fires.
    pub evaluate: fn(&RuleContext<'_>) -> Option<String>,
}

impl fmt::Debug for InsightRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InsightRule")
            .field("name", &self.name)
            .field("group", &self.group)
            .field("severity", &self.severity)
            .finish()
    }
}

macro_rules! rule {
    ($name:ident, $group:ident, $severity:ident) => {
        InsightRule {
            name: stringify!($name),
            group: RuleGroup::$group,
            severity: Severity::$severity,
            evaluate: $name,
        }
    };
}

/// Every built-in rule, in evaluation order.
pub static RULES: &[InsightRule] = &[
    rule!(missing_types_field, Manifest, Medium),
    rule!(missing_build_script, Manifest, Medium),
    rule!(missing_test_script, Manifest, Medium),
    rule!(dual_module_entry_points, Manifest, Positive),
    rule!(commonjs_only_entry_point, Manifest, Medium),
    rule!(missing_exports_field, Manifest, Medium),
    rule!(legacy_compiler_target, CompilerConfig, Medium),
    rule!(strict_mode_disabled, CompilerConfig, Medium),
    rule!(declaration_map_disabled, CompilerConfig, Medium),
    rule!(es_module_interop_disabled, CompilerConfig, Medium),
    rule!(large_distribution, Distribution, Medium),
    rule!(mixed_module_syntax, Distribution, Medium),
    rule!(oversized_source_maps, Distribution, Medium),
    rule!(missing_declaration_maps, Distribution, Medium),
    rule!(stale_package, Version, High),
    rule!(unpublished_version, Version, Info),
    rule!(frequent_releases, Version, Positive),
    rule!(infrequent_releases, Version, Medium),
    rule!(build_time_regression, Version, Medium),
    rule!(distribution_growth, Version, Medium),
    rule!(too_many_dependencies, Dependencies, Medium),
    rule!(no_testing_tools, Dependencies, Medium),
    rule!(no_linting_tools, Dependencies, Medium),
    rule!(huge_node_modules, DependencySizes, High),
    rule!(large_node_modules, DependencySizes, Medium),
    rule!(many_transitive_dependencies, DependencySizes, Medium),
    rule!(dominant_dependency, DependencySizes, Medium),
    rule!(large_published_package, PublishedSize, Medium),
    rule!(high_compression_ratio, PublishedSize, High),
    rule!(non_essential_published_files, PublishedSize, Medium),
];

/// Derives insights with default thresholds and no history.
pub fn derive_insights(snapshot: &Snapshot) -> Vec<Insight> {
    derive_insights_with(snapshot, None, &InsightThresholds::default())
}

/// Evaluates every rule against `snapshot`, comparing with `previous` where
/// a rule needs history. Never returns an empty vector.
pub fn derive_insights_with(
    snapshot: &Snapshot,
    previous: Option<&Snapshot>,
    thresholds: &InsightThresholds,
) -> Vec<Insight> {
    let ctx = RuleContext {
        snapshot,
        previous,
        thresholds,
    };

    let mut insights: Vec<Insight> = RULES
        .iter()
        .filter_map(|rule| {
            (rule.evaluate)(&ctx).map(|message| {
                tracing::debug!(rule = rule.name, severity = %rule.severity, "insight rule fired");
                Insight::new(message, rule.severity)
            })
        })
        .collect();

    if insights.is_empty() {
        insights.push(Insight::new(NO_ISSUES_MESSAGE, Severity::Positive));
    }
    insights
}

const HIGH_KEYWORDS: &[&str] = &[
    "extremely large",
    "high compression ratio",
    "hasn't been updated in",
    "significantly larger",
];
const MEDIUM_KEYWORDS: &[&str] = &["consider", "large", "no test", "no lint"];
const POSITIVE_KEYWORDS: &[&str] = &["excellent", "great job", "active maintenance"];

/// Infers a severity from message text by case-insensitive keyword match.
///
/// Double-quoted spans hold values taken from the package (names, versions,
/// compiler targets) and are not matched.
///
/// ```
/// use pkglens_core::insights::{classify, Severity};
///
/// assert_eq!(classify("Extremely large node_modules size"), Severity::High);
/// assert_eq!(classify("Consider enabling strict mode"), Severity::Medium);
/// assert_eq!(classify("Great job!"), Severity::Positive);
/// assert_eq!(classify("Version 1.2.3 is published"), Severity::Info);
/// assert_eq!(classify("Version \"2.0.0-large\" is published"), Severity::Info);
/// ```
#[must_use]
pub fn classify(text: &str) -> Severity {
    let text = unquoted(text).to_lowercase();
    let matches = |keywords: &[&str]| keywords.iter().any(|k| text.contains(k));
    if matches(HIGH_KEYWORDS) {
        Severity::High
    } else if matches(MEDIUM_KEYWORDS) {
        Severity::Medium
    } else if matches(POSITIVE_KEYWORDS) {
        Severity::Positive
    } else {
        Severity::Info
    }
}

/// `text` with every double-quoted span removed; an unterminated quote runs to the end.
fn unquoted(text: &str) -> String {
    text.split('"').step_by(2).collect::<Vec<_>>().join(" ")
}

fn months_between(from: chrono::DateTime<chrono::Utc>, to: chrono::DateTime<chrono::Utc>) -> f64 {
    to.signed_duration_since(from).num_seconds() as f64 / MONTH_SECONDS
}

fn percent_change(previous: u64, current: u64) -> Option<f64> {
    if previous == 0 {
        return None;
    }
    Some((current as f64 - previous as f64) / previous as f64 * 100.0)
}

// Manifest

fn missing_types_field(ctx: &RuleContext<'_>) -> Option<String> {
    let manifest = ctx.manifest()?;
    let dist = ctx.snapshot.dist.present()?;
    (!manifest.has_types && dist.file_stats.dts_files > 0).then(|| {
        "Consider adding a 'types' or 'typings' field in package.json to help TypeScript users find your type definitions.".to_string()
    })
}

fn missing_build_script(ctx: &RuleContext<'_>) -> Option<String> {
    (!ctx.manifest()?.scripts.has_build)
        .then(|| "Consider adding a 'build' script in package.json for easier builds.".to_string())
}

fn missing_test_script(ctx: &RuleContext<'_>) -> Option<String> {
    (!ctx.manifest()?.scripts.has_test).then(|| {
        "No test script detected. Consider adding tests for better code quality.".to_string()
    })
}

fn dual_module_entry_points(ctx: &RuleContext<'_>) -> Option<String> {
    let manifest = ctx.manifest()?;
    (manifest.has_esm && manifest.has_cjs).then(|| {
        "Package provides both ESM and CommonJS entry points, which is excellent for compatibility.".to_string()
    })
}

fn commonjs_only_entry_point(ctx: &RuleContext<'_>) -> Option<String> {
    let manifest = ctx.manifest()?;
    (!manifest.has_esm && manifest.has_cjs).then(|| {
        "Consider adding an ESM entry point (via 'module' field) for modern bundlers and environments.".to_string()
    })
}

fn missing_exports_field(ctx: &RuleContext<'_>) -> Option<String> {
    let manifest = ctx.manifest()?;
    (!manifest.has_exports && (manifest.has_esm || manifest.has_cjs)).then(|| {
        "Consider adding an 'exports' field in package.json for better control over entry points in modern Node.js.".to_string()
    })
}

// Compiler configuration

fn legacy_compiler_target(ctx: &RuleContext<'_>) -> Option<String> {
    let target = ctx.snapshot.compiler_config.present()?.target.as_deref()?;
    matches!(target.to_lowercase().as_str(), "es3" | "es5").then(|| {
        format!(
            "Consider targeting a more modern JavaScript version like ES2018 or higher instead of \"{}\" for better performance and smaller bundles.",
            target
        )
    })
}

fn strict_mode_disabled(ctx: &RuleContext<'_>) -> Option<String> {
    let config = ctx.snapshot.compiler_config.present()?;
    (config.strict != Some(true)).then(|| {
        "Consider enabling 'strict' mode in TypeScript for stronger type-checking and better type safety.".to_string()
    })
}

fn declaration_map_disabled(ctx: &RuleContext<'_>) -> Option<String> {
    let config = ctx.snapshot.compiler_config.present()?;
    (config.declaration == Some(true) && config.declaration_map != Some(true)).then(|| {
        "Consider enabling 'declarationMap' to improve developer experience when using your library.".to_string()
    })
}

fn es_module_interop_disabled(ctx: &RuleContext<'_>) -> Option<String> {
    let config = ctx.snapshot.compiler_config.present()?;
    (config.es_module_interop != Some(true)).then(|| {
        "Consider enabling 'esModuleInterop' for better interoperability with CommonJS modules.".to_string()
    })
}

// Distribution output

fn large_distribution(ctx: &RuleContext<'_>) -> Option<String> {
    let total = ctx.snapshot.dist.present()?.size_stats.total_size;
    (total > ctx.thresholds.dist_size_bytes).then(|| {
        format!(
            "Distribution size is {:.2}MB, which is relatively large. Consider code-splitting or removing unused dependencies.",
            bytes_to_mib(total)
        )
    })
}

fn mixed_module_syntax(ctx: &RuleContext<'_>) -> Option<String> {
    ctx.snapshot
        .dist
        .present()?
        .module_info
        .has_both_module_types
        .then(|| {
            "Some files contain both ESM and CommonJS module syntax. Consider standardizing to one module format per file.".to_string()
        })
}

fn oversized_source_maps(ctx: &RuleContext<'_>) -> Option<String> {
    let sizes = ctx.snapshot.dist.present()?.size_stats;
    if sizes.js_size == 0 || sizes.map_size == 0 {
        return None;
    }
    let ratio = sizes.map_size as f64 / sizes.js_size as f64;
    (ratio > ctx.thresholds.sourcemap_ratio).then(|| {
        format!(
            "Source maps are {:.1}x the size of your code. Consider using 'cheap-module-source-map' or similar options for development.",
            ratio
        )
    })
}

fn missing_declaration_maps(ctx: &RuleContext<'_>) -> Option<String> {
    let files = ctx.snapshot.dist.present()?.file_stats;
    (files.dts_files > 0 && files.dts_map_files == 0).then(|| {
        "No declaration source maps found. Consider adding them to improve IDE navigation to source code when using your package.".to_string()
    })
}

// Version and history

fn stale_package(ctx: &RuleContext<'_>) -> Option<String> {
    let modified = ctx.snapshot.version.present()?.manifest_modified?;
    let months = months_between(modified, ctx.snapshot.timestamp);
    (months > ctx.thresholds.stale_months).then(|| {
        format!(
            "Package hasn't been updated in {} months. Consider reviewing for outdated dependencies or deprecation.",
            months.floor()
        )
    })
}

fn unpublished_version(ctx: &RuleContext<'_>) -> Option<String> {
    let version = ctx.snapshot.version.present()?;
    let latest = version.registry.present()?.latest()?;
    (latest.version != version.current_version).then(|| {
        format!(
            "Current version \"{}\" differs from latest published version \"{}\". The package may have unpublished changes.",
            version.current_version, latest.version
        )
    })
}

/// Versions per month over the registry lifetime, and that lifetime in months.
fn release_cadence(ctx: &RuleContext<'_>) -> Option<(f64, f64)> {
    let registry = ctx.snapshot.version.present()?.registry.present()?;
    if registry.version_count == 0 {
        return None;
    }
    let lifetime = months_between(registry.created?, registry.modified?);
    Some((registry.version_count as f64 / lifetime.max(1.0), lifetime))
}

fn frequent_releases(ctx: &RuleContext<'_>) -> Option<String> {
    let (per_month, _) = release_cadence(ctx)?;
    (per_month > ctx.thresholds.frequent_versions_per_month).then(|| {
        format!(
            "Package is frequently updated ({:.1} versions/month), indicating active maintenance.",
            per_month
        )
    })
}

fn infrequent_releases(ctx: &RuleContext<'_>) -> Option<String> {
    let (per_month, lifetime) = release_cadence(ctx)?;
    (per_month < ctx.thresholds.infrequent_versions_per_month && lifetime > ctx.thresholds.stale_months)
        .then(|| {
            format!(
                "Package has infrequent updates ({:.2} versions/month), suggesting limited maintenance. Consider publishing releases more regularly.",
                per_month
            )
        })
}

fn build_time_regression(ctx: &RuleContext<'_>) -> Option<String> {
    let previous = ctx.previous?.build_duration_ms()?;
    let current = ctx.snapshot.build_duration_ms()?;
    let change = percent_change(previous, current)?;
    (change > ctx.thresholds.build_time_regression_pct).then(|| {
        format!(
            "Build time increased by {:.1}% since the previous analysis ({} to {}). Consider profiling the build.",
            change,
            format_duration(previous),
            format_duration(current)
        )
    })
}

fn distribution_growth(ctx: &RuleContext<'_>) -> Option<String> {
    let previous = ctx.previous?.dist_total_size()?;
    let current = ctx.snapshot.dist_total_size()?;
    let change = percent_change(previous, current)?;
    (change > ctx.thresholds.dist_growth_pct).then(|| {
        format!(
            "Distribution size grew by {:.1}% since the previous analysis ({} to {}). Consider checking for newly bundled dependencies.",
            change,
            format_bytes(previous),
            format_bytes(current)
        )
    })
}

// Dependencies

fn too_many_dependencies(ctx: &RuleContext<'_>) -> Option<String> {
    let count = ctx.snapshot.dependencies.present()?.counts.dependencies;
    (count > ctx.thresholds.dependency_count).then(|| {
        format!(
            "Package has {} dependencies. Consider reducing dependencies to improve install time and reduce security risks.",
            count
        )
    })
}

fn no_testing_tools(ctx: &RuleContext<'_>) -> Option<String> {
    let tooling = &ctx.snapshot.dependencies.present()?.tooling;
    tooling.testing_tools.is_empty().then(|| {
        "No testing libraries detected. Consider adding tests with Jest, Mocha, or Vitest.".to_string()
    })
}

fn no_linting_tools(ctx: &RuleContext<'_>) -> Option<String> {
    let tooling = &ctx.snapshot.dependencies.present()?.tooling;
    tooling.linting_tools.is_empty().then(|| {
        "No linting tools detected. Consider using ESLint and Prettier for code quality.".to_string()
    })
}

// Dependency sizes

fn installed_total(ctx: &RuleContext<'_>) -> Option<u64> {
    let total = ctx.snapshot.dependency_sizes.present()?.total_size;
    (total > 0).then_some(total)
}

fn huge_node_modules(ctx: &RuleContext<'_>) -> Option<String> {
    let total = installed_total(ctx)?;
    (total > ctx.thresholds.node_modules_high_bytes).then(|| {
        format!(
            "Extremely large node_modules size ({:.2}MB). Consider using fewer dependencies or switching to lighter alternatives.",
            bytes_to_mib(total)
        )
    })
}

fn large_node_modules(ctx: &RuleContext<'_>) -> Option<String> {
    let total = installed_total(ctx)?;
    let thresholds = ctx.thresholds;
    (total > thresholds.node_modules_medium_bytes && total <= thresholds.node_modules_high_bytes).then(|| {
        format!(
            "Large node_modules size ({:.2}MB). Review the 'Largest Dependencies' section to identify potential reductions.",
            bytes_to_mib(total)
        )
    })
}

fn many_transitive_dependencies(ctx: &RuleContext<'_>) -> Option<String> {
    installed_total(ctx)?;
    let sizes = ctx.snapshot.dependency_sizes.present()?;
    let limit = sizes.direct_count as f64 * ctx.thresholds.transitive_multiplier;
    (sizes.direct_count > 0 && sizes.transitive_count as f64 > limit).then(|| {
        format!(
            "High number of transitive dependencies ({}). Consider dependencies with fewer sub-dependencies to reduce complexity.",
            sizes.transitive_count
        )
    })
}

fn dominant_dependency(ctx: &RuleContext<'_>) -> Option<String> {
    let total = installed_total(ctx)?;
    let largest = ctx.snapshot.dependency_sizes.present()?.largest.first()?;
    let share = largest.size as f64 / total as f64 * 100.0;
    (share > ctx.thresholds.largest_dependency_share).then(|| {
        format!(
            "Dependency \"{}\" accounts for {:.1}% of total node_modules size. Consider if this dependency is essential or could be replaced.",
            largest.name, share
        )
    })
}

// Published size

fn large_published_package(ctx: &RuleContext<'_>) -> Option<String> {
    let packed = ctx.snapshot.pack.present()?.packed_size;
    (packed > ctx.thresholds.packed_size_bytes).then(|| {
        format!(
            "Published package size is {:.2}MB, which is relatively large. Consider reviewing the 'Largest Files' section and excluding unnecessary files using the 'files' field in package.json.",
            bytes_to_mib(packed)
        )
    })
}

fn high_compression_ratio(ctx: &RuleContext<'_>) -> Option<String> {
    let ratio = ctx.snapshot.pack.present()?.compression_ratio;
    (ratio > ctx.thresholds.compression_ratio).then(|| {
        format!(
            "Package has a high compression ratio ({:.1}%), indicating it may contain already compressed assets or binary files. Consider optimizing these assets before packaging.",
            ratio * 100.0
        )
    })
}

const NON_ESSENTIAL_MARKERS: &[&str] = &["test", "docs", "example", ".git"];

fn non_essential_published_files(ctx: &RuleContext<'_>) -> Option<String> {
    let pack = ctx.snapshot.pack.present()?;
    pack.largest_files
        .iter()
        .any(|file| NON_ESSENTIAL_MARKERS.iter().any(|m| file.path.contains(m)))
        .then(|| {
            "Package contains test, documentation, or example files that might not be needed in production. Consider using the 'files' field in package.json to include only necessary files.".to_string()
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::section::Section;
    use crate::snapshot::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use std::collections::HashSet;
    use std::path::PathBuf;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
    }

    fn empty() -> Snapshot {
        Snapshot::empty("widget", PathBuf::from("/pkg/widget"), now())
    }

    fn messages(insights: &[Insight]) -> Vec<&str> {
        insights.iter().map(|i| i.message.as_str()).collect()
    }

    fn with_build(mut snapshot: Snapshot, ms: u64) -> Snapshot {
        snapshot.build = Section::Present(BuildSummary {
            duration_ms: ms,
            duration_formatted: format_duration(ms),
            cleaned: true,
        });
        snapshot
    }

    fn with_dist_size(mut snapshot: Snapshot, total: u64) -> Snapshot {
        snapshot.dist = Section::Present(DistSummary {
            directory: "dist".to_string(),
            size_stats: DistSizeStats {
                js_size: total,
                total_size: total,
                ..Default::default()
            },
            ..Default::default()
        });
        snapshot
    }

    /// A package that trips as many warnings as possible.
    fn troubled() -> (Snapshot, Snapshot) {
        let mut s = with_build(empty(), 6000);
        s.manifest = Section::Present(ManifestSummary {
            name: Some("widget".to_string()),
            main: Some("index.js".to_string()),
            has_cjs: true,
            ..Default::default()
        });
        s.compiler_config = Section::Present(CompilerConfigSummary {
            config_file: "tsconfig.json".to_string(),
            target: Some("ES5".to_string()),
            declaration: Some(true),
            ..Default::default()
        });
        s.dist = Section::Present(DistSummary {
            directory: "dist".to_string(),
            file_stats: DistFileStats {
                js_files: 4,
                dts_files: 4,
                map_files: 4,
                total_files: 12,
                ..Default::default()
            },
            size_stats: DistSizeStats {
                js_size: 2 * MIB,
                map_size: 5 * MIB,
                total_size: 7 * MIB,
                ..Default::default()
            },
            module_info: ModuleInfo {
                esm_modules: 2,
                cjs_modules: 2,
                source_map_references: 4,
                has_both_module_types: true,
            },
        });
        s.version = Section::Present(VersionSummary {
            current_version: "1.0.0".to_string(),
            manifest_modified: Some(now() - Duration::days(30 * 20)),
            newest_file: None,
            oldest_file: None,
            git: Section::Absent,
            registry: Section::Present(RegistryHistory {
                created: Some(now() - Duration::days(30 * 36)),
                modified: Some(now() - Duration::days(30 * 12)),
                versions: vec![
                    PublishedVersion {
                        version: "2.0.0".to_string(),
                        date: now() - Duration::days(30 * 12),
                    },
                    PublishedVersion {
                        version: "1.0.0".to_string(),
                        date: now() - Duration::days(30 * 36),
                    },
                ],
                version_count: 2,
            }),
        });
        s.dependencies = Section::Present(DependencySummary {
            counts: DependencyCounts {
                dependencies: 25,
                total: 25,
                ..Default::default()
            },
            tooling: Tooling::default(),
        });
        s.dependency_sizes = Section::Present(DependencySizeSummary {
            total_size: 120 * MIB,
            largest: vec![InstalledPackage {
                name: "heavy".to_string(),
                version: "1.0.0".to_string(),
                size: 40 * MIB,
            }],
            installed_count: 40,
            direct_count: 2,
            transitive_count: 38,
        });
        s.pack = Section::Present(PackSummary {
            packed_size: 2 * MIB,
            unpacked_size: 2 * MIB + 1,
            compression_ratio: 0.95,
            tarball_name: "widget-1.0.0.tgz".to_string(),
            tarball_path: PathBuf::from("/out/pack-analysis/widget-1.0.0.tgz"),
            largest_files: vec![PackedFile {
                path: "test/fixtures/big.bin".to_string(),
                size: MIB,
            }],
        });

        let mut previous = with_build(empty(), 4000);
        previous.timestamp = now() - Duration::days(1);
        let previous = with_dist_size(previous, 5 * MIB);
        (s, previous)
    }

    /// A package with the positive and the milder variants.
    fn healthy() -> Snapshot {
        let mut s = empty();
        s.manifest = Section::Present(ManifestSummary {
            main: Some("index.js".to_string()),
            module: Some("index.mjs".to_string()),
            has_cjs: true,
            has_esm: true,
            has_exports: true,
            ..Default::default()
        });
        s.version = Section::Present(VersionSummary {
            current_version: "4.0.0".to_string(),
            manifest_modified: Some(now()),
            newest_file: None,
            oldest_file: None,
            git: Section::Absent,
            registry: Section::Present(RegistryHistory {
                created: Some(now() - Duration::days(30 * 10)),
                modified: Some(now()),
                versions: vec![PublishedVersion {
                    version: "4.0.0".to_string(),
                    date: now(),
                }],
                version_count: 40,
            }),
        });
        s.dependency_sizes = Section::Present(DependencySizeSummary {
            total_size: 60 * MIB,
            largest: vec![InstalledPackage {
                name: "small".to_string(),
                version: "1.0.0".to_string(),
                size: MIB,
            }],
            installed_count: 5,
            direct_count: 5,
            transitive_count: 0,
        });
        s
    }

    #[test]
    fn test_empty_snapshot_yields_single_positive_insight() {
        let insights = derive_insights(&empty());
        assert_eq!(insights, vec![Insight::new(NO_ISSUES_MESSAGE, Severity::Positive)]);
    }

    #[test]
    fn test_every_rule_message_classifies_as_its_severity() {
        let (troubled, previous) = troubled();
        let healthy = healthy();
        let thresholds = InsightThresholds::default();
        let contexts = [
            RuleContext {
                snapshot: &troubled,
                previous: Some(&previous),
                thresholds: &thresholds,
            },
            RuleContext {
                snapshot: &healthy,
                previous: None,
                thresholds: &thresholds,
            },
        ];

        let mut fired = HashSet::new();
        for ctx in &contexts {
            for rule in RULES {
                if let Some(message) = (rule.evaluate)(ctx) {
                    assert_eq!(
                        classify(&message),
                        rule.severity,
                        "rule {} produced '{}'",
                        rule.name,
                        message
                    );
                    fired.insert(rule.name);
                }
            }
        }

        let never_fired: Vec<&str> = RULES
            .iter()
            .map(|r| r.name)
            .filter(|name| !fired.contains(name))
            .collect();
        assert!(never_fired.is_empty(), "rules never exercised: {:?}", never_fired);
        assert_eq!(classify(NO_ISSUES_MESSAGE), Severity::Positive);
    }

    #[test]
    fn test_rules_are_declared_in_group_order() {
        assert!(RULES.windows(2).all(|pair| pair[0].group <= pair[1].group));
        let names: HashSet<&str> = RULES.iter().map(|r| r.name).collect();
        assert_eq!(names.len(), RULES.len(), "rule names must be unique");
    }

    #[test]
    fn test_output_follows_rule_order_not_severity() {
        let (troubled, previous) = troubled();
        let insights = derive_insights_with(&troubled, Some(&previous), &InsightThresholds::default());
        let first_high = insights.iter().position(|i| i.severity == Severity::High).unwrap();
        assert!(first_high > 0, "manifest rules come before the stale-package rule");
        assert!(insights[0].message.contains("'types' or 'typings'"));
        assert!(insights[1].message.contains("'build' script"));
        assert!(insights.last().unwrap().message.contains("test, documentation"));
    }

    #[test]
    fn test_manifest_without_scripts() {
        let mut s = empty();
        s.manifest = Section::Present(ManifestSummary::default());
        let insights = derive_insights(&s);
        let texts = messages(&insights);
        assert!(texts.iter().any(|m| m.contains("'build' script")));
        assert!(texts.iter().any(|m| m.starts_with("No test script")));
        assert!(insights.iter().all(|i| i.severity == Severity::Medium));
        assert!(!texts.iter().any(|m| m.contains("Distribution size")));
    }

    #[test]
    fn test_legacy_target_is_case_insensitive() {
        for target in ["es5", "ES5", "Es3"] {
            let mut s = empty();
            s.compiler_config = Section::Present(CompilerConfigSummary {
                target: Some(target.to_string()),
                strict: Some(true),
                es_module_interop: Some(true),
                ..Default::default()
            });
            let insights = derive_insights(&s);
            assert_eq!(insights.len(), 1, "target {}", target);
            assert!(insights[0].message.contains(target));
        }
    }

    #[test]
    fn test_distribution_size_threshold_is_exclusive() {
        let at_limit = derive_insights(&with_dist_size(empty(), MIB));
        assert!(!messages(&at_limit).iter().any(|m| m.contains("Distribution size")));

        let over = derive_insights(&with_dist_size(empty(), MIB + MIB / 2));
        assert!(messages(&over).contains(
            &"Distribution size is 1.50MB, which is relatively large. Consider code-splitting or removing unused dependencies."
        ));
    }

    #[test]
    fn test_node_modules_thresholds() {
        let (troubled, _) = troubled();
        let texts: Vec<String> = derive_insights(&troubled).into_iter().map(|i| i.message).collect();
        assert!(texts.iter().any(|m| m.starts_with("Extremely large node_modules size (120.00MB)")));
        assert!(!texts.iter().any(|m| m.starts_with("Large node_modules")));
        assert!(texts.iter().any(|m| m.contains("\"heavy\" accounts for 33.3%")));

        let healthy = derive_insights(&healthy());
        assert!(healthy.iter().any(|i| i.message.starts_with("Large node_modules size (60.00MB)")));
    }

    #[test]
    fn test_history_rules_need_previous_snapshot() {
        let (troubled, previous) = troubled();
        let without = derive_insights(&troubled);
        assert!(!without.iter().any(|i| i.message.starts_with("Build time increased")));

        let with = derive_insights_with(&troubled, Some(&previous), &InsightThresholds::default());
        assert!(with.iter().any(|i| i.message.starts_with("Build time increased by 50.0%")));
        assert!(with.iter().any(|i| i.message.starts_with("Distribution size grew by 40.0%")));
    }

    #[test]
    fn test_thresholds_are_configurable() {
        let thresholds = InsightThresholds {
            dist_size_bytes: 10 * MIB,
            ..Default::default()
        };
        let s = with_dist_size(empty(), 2 * MIB);
        let insights = derive_insights_with(&s, None, &thresholds);
        assert_eq!(insights[0].message, NO_ISSUES_MESSAGE);
    }

    #[test]
    fn test_stale_package_uses_snapshot_timestamp() {
        let (troubled, _) = troubled();
        let insights = derive_insights(&troubled);
        let stale = insights
            .iter()
            .find(|i| i.severity == Severity::High && i.message.contains("hasn't been updated"))
            .unwrap();
        assert!(stale.message.contains("in 20 months"));
    }

    #[test]
    fn test_absent_and_errored_sections_produce_nothing() {
        let mut s = empty();
        s.dist = Section::Errored("permission denied".to_string());
        s.dependency_sizes = Section::Errored("boom".to_string());
        assert_eq!(derive_insights(&s)[0].message, NO_ISSUES_MESSAGE);
    }

    #[test]
    fn test_classify_keyword_precedence() {
        assert_eq!(classify("This is extremely large and you should consider it"), Severity::High);
        assert_eq!(classify("Large bundle"), Severity::Medium);
        assert_eq!(classify("NO LINTING tools"), Severity::Medium);
        assert_eq!(classify("Excellent work"), Severity::Positive);
        assert_eq!(classify("Source maps are significantly larger than code"), Severity::High);
        assert_eq!(classify(""), Severity::Info);
    }

    #[test]
    fn test_classify_skips_quoted_values() {
        assert_eq!(classify("Dependency \"large-lib\" is installed"), Severity::Info);
        assert_eq!(classify("\"excellent\" consider"), Severity::Medium);
        assert_eq!(classify("Target \"extremely large"), Severity::Info);
    }

    #[test]
    fn test_interpolated_values_do_not_change_severity() {
        let mut s = empty();
        s.version = Section::Present(VersionSummary {
            current_version: "2.0.0-large-refactor.1".to_string(),
            manifest_modified: Some(now()),
            newest_file: None,
            oldest_file: None,
            git: Section::Absent,
            registry: Section::Present(RegistryHistory {
                created: Some(now() - Duration::days(30 * 10)),
                modified: Some(now()),
                versions: vec![PublishedVersion {
                    version: "1.9.0-excellent".to_string(),
                    date: now(),
                }],
                version_count: 5,
            }),
        });
        s.dependency_sizes = Section::Present(DependencySizeSummary {
            total_size: 30 * MIB,
            largest: vec![InstalledPackage {
                name: "extremely-large-lib".to_string(),
                version: "1.0.0".to_string(),
                size: 20 * MIB,
            }],
            installed_count: 3,
            direct_count: 3,
            transitive_count: 0,
        });

        let insights = derive_insights(&s);
        let unpublished = insights
            .iter()
            .find(|i| i.message.starts_with("Current version \"2.0.0-large-refactor.1\""))
            .unwrap();
        assert_eq!(unpublished.severity, Severity::Info);
        assert_eq!(classify(&unpublished.message), Severity::Info);

        let dominant = insights
            .iter()
            .find(|i| i.message.contains("\"extremely-large-lib\" accounts for"))
            .unwrap();
        assert_eq!(dominant.severity, Severity::Medium);
        assert_eq!(classify(&dominant.message), Severity::Medium);
    }

    #[test]
    fn test_severity_serializes_lowercase() {
        let json = serde_json::to_string(&Insight::new("x", Severity::Positive)).unwrap();
        assert_eq!(json, r#"{"message":"x","severity":"positive"}"#);
        assert_eq!(Severity::High.css_class(), "severity-high");
    }

    #[test]
    fn test_thresholds_reject_unknown_keys() {
        let err = toml::from_str::<InsightThresholds>("dist_size = 5").unwrap_err();
        assert!(err.to_string().contains("dist_size"));

        let parsed: InsightThresholds = toml::from_str("stale_months = 6.0").unwrap();
        assert_eq!(parsed.stale_months, 6.0);
        assert_eq!(parsed.dependency_count, 20);
    }
}
