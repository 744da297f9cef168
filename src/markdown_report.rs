//! Markdown report renderer.

use crate::format_utils::{format_bytes, format_date, format_duration, relative_time};
use crate::history::ComparisonDelta;
use crate::reporting::ReportContext;
use crate::section::Section;
use crate::snapshot::{
    CompilerConfigSummary, DependencySizeSummary, DependencySummary, DistSummary, GitSummary,
    PackSummary, RegistryHistory, Snapshot, VersionSummary,
};

const RECENT_VERSIONS: usize = 5;
const LARGEST_DEPENDENCIES: usize = 10;

fn yes_no(flag: Option<bool>) -> &'static str {
    if flag == Some(true) {
        "Yes"
    } else {
        "No"
    }
}

fn or_na(value: Option<&str>) -> &str {
    value.filter(|v| !v.is_empty()).unwrap_or("N/A")
}

fn join_or(items: &[String], fallback: &str) -> String {
    if items.is_empty() {
        fallback.to_string()
    } else {
        items.join(", ")
    }
}

fn signed_with(value: i64, render: impl Fn(u64) -> String) -> String {
    let sign = if value > 0 {
        "+"
    } else if value < 0 {
        "-"
    } else {
        ""
    };
    format!("{}{}", sign, render(value.unsigned_abs()))
}

/// Writes the placeholder line for a section that is not present.
fn placeholder<T>(out: &mut String, section: &Section<T>, what: &str) {
    match section.error() {
        Some(error) => out.push_str(&format!("- {} could not be analyzed: {}\n", what, error)),
        None => out.push_str(&format!("- {} not found\n", what)),
    }
}

/// Renders the Markdown report.
pub fn render_markdown(ctx: &ReportContext<'_>) -> String {
    let snapshot = ctx.snapshot;
    let mut out = String::new();

    out.push_str(&format!("# TypeScript Package Analysis: {}\n\n", snapshot.package_name));
    out.push_str(&format!("Generated on: {}\n\n", format_date(ctx.generated_at)));

    package_summary(&mut out, snapshot);
    version_info(&mut out, snapshot);
    build_info(&mut out, snapshot);
    distribution(&mut out, &snapshot.dist);
    compiler_config(&mut out, &snapshot.compiler_config);
    dependencies(&mut out, &snapshot.dependencies);
    dependency_sizes(&mut out, &snapshot.dependency_sizes);
    package_size(&mut out, &snapshot.pack);
    performance(&mut out, snapshot);
    comparison(&mut out, ctx.comparison, ctx.history.len());

    out.push_str("## Insights and Recommendations\n\n");
    if ctx.insights.is_empty() {
        out.push_str("No insights available.\n");
    }
    for insight in ctx.insights {
        out.push_str(&format!("- **[{}]** {}\n", insight.severity, insight.message));
    }
    out
}

fn package_summary(out: &mut String, snapshot: &Snapshot) {
    out.push_str("## Package Summary\n\n");
    match &snapshot.manifest {
        Section::Present(manifest) => {
            out.push_str(&format!("- **Name**: {}\n", snapshot.display_name()));
            out.push_str(&format!("- **Version**: {}\n", or_na(manifest.version.as_deref())));
            out.push_str(&format!(
                "- **Description**: {}\n",
                or_na(manifest.description.as_deref())
            ));
            out.push_str(&format!("- **Author**: {}\n", or_na(manifest.author.as_deref())));
            out.push_str(&format!("- **License**: {}\n", or_na(manifest.license.as_deref())));
            out.push_str(&format!(
                "- **Entry points**: main {}, module {}, types {}\n",
                or_na(manifest.main.as_deref()),
                or_na(manifest.module.as_deref()),
                or_na(manifest.types.as_deref())
            ));
        }
        other => placeholder(out, other, "package.json"),
    }
    out.push('\n');
}

fn version_info(out: &mut String, snapshot: &Snapshot) {
    out.push_str("## Version & Modification Information\n\n");
    let version = match &snapshot.version {
        Section::Present(version) => version,
        other => {
            placeholder(out, other, "Version information");
            out.push('\n');
            return;
        }
    };

    out.push_str(&format!("- **Current Version**: {}\n", version.current_version));
    match version.manifest_modified {
        Some(modified) => out.push_str(&format!(
            "- **Package.json Last Modified**: {} ({})\n",
            format_date(modified),
            relative_time(modified, snapshot.timestamp)
        )),
        None => out.push_str("- **Package.json Last Modified**: N/A\n"),
    }
    file_stamp_line(out, "Newest File", version, true);
    file_stamp_line(out, "Oldest File", version, false);
    out.push('\n');

    out.push_str("### Git Information\n\n");
    match &version.git {
        Section::Present(git) => git_lines(out, git),
        other => placeholder(out, other, "Git repository"),
    }
    out.push('\n');

    out.push_str("### npm Version History\n\n");
    match &version.registry {
        Section::Present(registry) => registry_lines(out, registry),
        other => placeholder(out, other, "Published version history"),
    }
    out.push('\n');
}

fn file_stamp_line(out: &mut String, label: &str, version: &VersionSummary, newest: bool) {
    let stamp = if newest {
        &version.newest_file
    } else {
        &version.oldest_file
    };
    match stamp {
        Some(stamp) => out.push_str(&format!(
            "- **{}**: {} ({})\n",
            label,
            stamp.path,
            format_date(stamp.modified)
        )),
        None => out.push_str(&format!("- **{}**: N/A\n", label)),
    }
}

fn git_lines(out: &mut String, git: &GitSummary) {
    let last_commit = git.last_commit_date.map(format_date);
    out.push_str(&format!("- **Last Commit**: {}\n", or_na(last_commit.as_deref())));
    out.push_str(&format!("- **Current Branch**: {}\n", or_na(git.current_branch.as_deref())));
    out.push_str(&format!("- **Commit Count**: {}\n", git.commit_count));
    out.push_str(&format!("- **Contributors**: {}\n", git.contributors_count));
    out.push_str(&format!(
        "- **Tags**: {} ({})\n",
        git.tag_count,
        join_or(&git.tags, "N/A")
    ));
}

fn registry_lines(out: &mut String, registry: &RegistryHistory) {
    let created = registry.created.map(format_date);
    let modified = registry.modified.map(format_date);
    out.push_str(&format!("- **Initially Published**: {}\n", or_na(created.as_deref())));
    out.push_str(&format!("- **Last Published**: {}\n", or_na(modified.as_deref())));
    out.push_str(&format!("- **Version Count**: {}\n", registry.version_count));
    out.push_str("- **Recent Versions**:\n");
    if registry.versions.is_empty() {
        out.push_str("  - No version history available\n");
    }
    for published in registry.versions.iter().take(RECENT_VERSIONS) {
        out.push_str(&format!("  - {}: {}\n", published.version, format_date(published.date)));
    }
}

fn build_info(out: &mut String, snapshot: &Snapshot) {
    out.push_str("## Build Information\n\n");
    match &snapshot.build {
        Section::Present(build) => {
            out.push_str(&format!("- **Build Time**: {}\n", build.duration_formatted));
            out.push_str(&format!(
                "- **Clean Step**: {}\n",
                if build.cleaned { "Ran" } else { "Skipped or failed" }
            ));
        }
        Section::Errored(error) => out.push_str(&format!("- **Build Failed**: {}\n", error)),
        Section::Absent => out.push_str("- Build was skipped\n"),
    }
    let has_script = snapshot.manifest.present().map(|m| m.scripts.has_build);
    out.push_str(&format!(
        "- **Build Script**: {}\n\n",
        if has_script == Some(true) { "Present" } else { "Not found" }
    ));
}

fn distribution(out: &mut String, section: &Section<DistSummary>) {
    out.push_str("## Distribution Files\n\n");
    let Section::Present(dist) = section else {
        placeholder(out, section, "Distribution directory");
        out.push('\n');
        return;
    };
    let (files, sizes, modules) = (dist.file_stats, dist.size_stats, dist.module_info);

    out.push_str(&format!("- **Distribution Directory**: {}\n", dist.directory));
    out.push_str(&format!("- **Total Files**: {}\n", files.total_files));
    out.push_str(&format!("- **Total Size**: {}\n\n", format_bytes(sizes.total_size)));

    out.push_str("### File Breakdown\n\n");
    out.push_str("| Kind | Files | Size |\n|------|------:|-----:|\n");
    let rows = [
        ("JavaScript", files.js_files, Some(sizes.js_size)),
        ("Declarations (.d.ts)", files.dts_files, Some(sizes.dts_size)),
        ("Source maps", files.map_files, Some(sizes.map_size)),
        ("Declaration maps", files.dts_map_files, Some(sizes.dts_map_size)),
        ("JSON", files.json_files, None),
        ("CSS", files.css_files, None),
        ("Other", files.other_files, None),
    ];
    for (kind, count, size) in rows {
        let size = size.map(format_bytes).unwrap_or_else(|| "-".to_string());
        out.push_str(&format!("| {} | {} | {} |\n", kind, count, size));
    }
    out.push_str(&format!(
        "\nJSON, CSS and other files together take {}.\n\n",
        format_bytes(sizes.other_size)
    ));

    out.push_str("### Module Information\n\n");
    out.push_str(&format!("- ESM Modules: {}\n", modules.esm_modules));
    out.push_str(&format!("- CommonJS Modules: {}\n", modules.cjs_modules));
    out.push_str(&format!("- Source Map References: {}\n\n", modules.source_map_references));
}

fn compiler_config(out: &mut String, section: &Section<CompilerConfigSummary>) {
    out.push_str("## TypeScript Configuration\n\n");
    let Section::Present(config) = section else {
        placeholder(out, section, "TypeScript configuration");
        out.push('\n');
        return;
    };
    let not_specified = |v: &Option<String>| v.clone().unwrap_or_else(|| "Not specified".to_string());

    out.push_str(&format!("- **Config File**: {}\n", config.config_file));
    out.push_str(&format!("- **Target**: {}\n", not_specified(&config.target)));
    out.push_str(&format!("- **Module**: {}\n", not_specified(&config.module)));
    out.push_str(&format!(
        "- **Module Resolution**: {}\n",
        not_specified(&config.module_resolution)
    ));
    out.push_str(&format!("- **Declaration**: {}\n", yes_no(config.declaration)));
    out.push_str(&format!("- **Declaration Maps**: {}\n", yes_no(config.declaration_map)));
    out.push_str(&format!("- **Source Maps**: {}\n", yes_no(config.source_map)));
    out.push_str(&format!("- **Strict Mode**: {}\n", yes_no(config.strict)));
    out.push_str(&format!("- **esModuleInterop**: {}\n", yes_no(config.es_module_interop)));
    out.push_str(&format!(
        "- **JSX Support**: {}\n",
        if config.jsx.is_some() { "Yes" } else { "No" }
    ));
    out.push_str(&format!(
        "- **Paths Mappings**: {}\n",
        config.path_mappings.map_or("None".to_string(), |n| n.to_string())
    ));
    out.push_str(&format!(
        "- **References**: {}\n",
        config.references.map_or("None".to_string(), |n| n.to_string())
    ));
    out.push_str(&format!("- **Incremental Builds**: {}\n", yes_no(config.incremental)));
    if let Some(extends) = &config.extends {
        out.push_str(&format!("- **Extends**: {}\n", extends));
    }
    out.push('\n');
}

fn dependencies(out: &mut String, section: &Section<DependencySummary>) {
    out.push_str("## Dependencies\n\n");
    let Section::Present(deps) = section else {
        placeholder(out, section, "Dependency information");
        out.push('\n');
        return;
    };
    out.push_str(&format!("- **Runtime Dependencies**: {}\n", deps.counts.dependencies));
    out.push_str(&format!("- **Development Dependencies**: {}\n", deps.counts.dev_dependencies));
    out.push_str(&format!("- **Peer Dependencies**: {}\n", deps.counts.peer_dependencies));
    out.push_str(&format!("- **Type Definitions**: {}\n\n", deps.counts.type_definitions));

    out.push_str("### Tooling\n\n");
    out.push_str(&format!(
        "- **Build Tools**: {}\n",
        join_or(&deps.tooling.build_tools, "None detected")
    ));
    out.push_str(&format!(
        "- **Testing Tools**: {}\n",
        join_or(&deps.tooling.testing_tools, "None detected")
    ));
    out.push_str(&format!(
        "- **Linting Tools**: {}\n\n",
        join_or(&deps.tooling.linting_tools, "None detected")
    ));
}

fn dependency_sizes(out: &mut String, section: &Section<DependencySizeSummary>) {
    out.push_str("## Dependency Size Analysis\n\n");
    let Section::Present(sizes) = section else {
        placeholder(out, section, "node_modules");
        out.push('\n');
        return;
    };
    out.push_str(&format!(
        "- **Total node_modules Size**: {}\n",
        format_bytes(sizes.total_size)
    ));
    out.push_str(&format!("- **Direct Dependencies**: {}\n", sizes.direct_count));
    out.push_str(&format!("- **Transitive Dependencies**: {}\n", sizes.transitive_count));
    out.push_str(&format!(
        "- **Total Installed Dependencies**: {}\n\n",
        sizes.installed_count
    ));

    out.push_str("### Largest Dependencies\n\n");
    if sizes.largest.is_empty() {
        out.push_str("- No dependency size information available\n");
    }
    for dep in sizes.largest.iter().take(LARGEST_DEPENDENCIES) {
        out.push_str(&format!("- {} ({}): {}\n", dep.name, dep.version, format_bytes(dep.size)));
    }
    out.push('\n');
}

fn package_size(out: &mut String, section: &Section<PackSummary>) {
    out.push_str("## Package Size Analysis\n\n");
    let Section::Present(pack) = section else {
        placeholder(out, section, "Packed tarball");
        out.push('\n');
        return;
    };
    out.push_str(&format!(
        "- **Packed Size (npm tarball)**: {}\n",
        format_bytes(pack.packed_size)
    ));
    out.push_str(&format!("- **Unpacked Size**: {}\n", format_bytes(pack.unpacked_size)));
    out.push_str(&format!(
        "- **Compression Ratio**: {:.1}%\n",
        pack.compression_ratio * 100.0
    ));
    out.push_str(&format!("- **Tarball Location**: {}\n\n", pack.tarball_path.display()));

    out.push_str("### Largest Files in Package\n\n");
    if pack.largest_files.is_empty() {
        out.push_str("- No file size information available\n");
    }
    for file in &pack.largest_files {
        out.push_str(&format!("- {}: {}\n", file.path, format_bytes(file.size)));
    }
    out.push('\n');
}

fn performance(out: &mut String, snapshot: &Snapshot) {
    out.push_str("## Performance Metrics\n\n");
    let dist = snapshot.dist.present();
    let bytes = |f: fn(&DistSummary) -> u64| dist.map_or("N/A".to_string(), |d| format_bytes(f(d)));

    out.push_str(&format!(
        "- Total Distribution Size: {}\n",
        bytes(|d| d.size_stats.total_size)
    ));
    out.push_str(&format!("- Type Definitions Size: {}\n", bytes(|d| d.size_stats.dts_size)));
    out.push_str(&format!(
        "- Source Maps Size: {}\n",
        bytes(|d| d.size_stats.map_size + d.size_stats.dts_map_size)
    ));
    let ratio = dist
        .filter(|d| d.file_stats.dts_files > 0 && d.size_stats.dts_size > 0)
        .map(|d| format!("{:.2}:1", d.size_stats.js_size as f64 / d.size_stats.dts_size as f64));
    out.push_str(&format!(
        "- JavaScript to TypeScript Ratio: {}\n",
        or_na(ratio.as_deref())
    ));
    let build = snapshot.build.present().map(|b| b.duration_formatted.as_str());
    out.push_str(&format!("- Build Time: {}\n\n", or_na(build)));
}

fn comparison(out: &mut String, delta: Option<&ComparisonDelta>, runs: usize) {
    out.push_str("## Comparison with Previous Analysis\n\n");
    let Some(delta) = delta else {
        out.push_str("- No previous analysis to compare with\n\n");
        return;
    };
    out.push_str(&format!("- **Recorded Analyses**: {}\n", runs));
    let describe = |value: Option<i64>, render: fn(u64) -> String| {
        value.map_or("N/A".to_string(), |v| signed_with(v, render))
    };
    out.push_str(&format!(
        "- **Build Time Change**: {}\n",
        describe(delta.build_time_change_ms, format_duration)
    ));
    out.push_str(&format!(
        "- **Distribution Size Change**: {}\n",
        describe(delta.dist_size_change, format_bytes)
    ));
    out.push_str(&format!(
        "- **Dependency Count Change**: {}\n\n",
        describe(delta.dependency_count_change, |n| n.to_string())
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::insights::{Insight, Severity};
    use crate::snapshot::{BuildSummary, ManifestSummary, ScriptFlags};
    use chrono::{TimeZone, Utc};
    use std::path::PathBuf;

    fn snapshot() -> Snapshot {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        Snapshot::empty("widget", PathBuf::from("/pkg/widget"), ts)
    }

    #[test]
    fn test_absent_sections_render_placeholders() {
        let s = snapshot();
        let md = render_markdown(&ReportContext::new(&s, &[], &[]));
        assert!(md.starts_with("# TypeScript Package Analysis: widget\n"));
        assert!(md.contains("- package.json not found"));
        assert!(md.contains("- Distribution directory not found"));
        assert!(md.contains("- Build was skipped"));
        assert!(md.contains("- Total Distribution Size: N/A"));
        assert!(md.contains("No previous analysis to compare with"));
        assert!(md.contains("No insights available."));
    }

    #[test]
    fn test_errored_section_shows_error_text() {
        let mut s = snapshot();
        s.build = Section::Errored("Command 'npm run build' failed".to_string());
        s.pack = Section::Errored("tarball missing".to_string());
        let md = render_markdown(&ReportContext::new(&s, &[], &[]));
        assert!(md.contains("- **Build Failed**: Command 'npm run build' failed"));
        assert!(md.contains("- Packed tarball could not be analyzed: tarball missing"));
    }

    #[test]
    fn test_present_sections_and_insights() {
        let mut s = snapshot();
        s.manifest = Section::Present(ManifestSummary {
            name: Some("@acme/widget".to_string()),
            version: Some("1.2.3".to_string()),
            scripts: ScriptFlags {
                has_build: true,
                ..Default::default()
            },
            ..Default::default()
        });
        s.build = Section::Present(BuildSummary {
            duration_ms: 4200,
            duration_formatted: "4.20s".to_string(),
            cleaned: true,
        });
        let insights = vec![Insight::new("Consider adding tests.", Severity::Medium)];
        let md = render_markdown(&ReportContext::new(&s, &[], &insights));

        assert!(md.contains("- **Name**: @acme/widget"));
        assert!(md.contains("- **Version**: 1.2.3"));
        assert!(md.contains("- **Build Time**: 4.20s"));
        assert!(md.contains("- **Build Script**: Present"));
        assert!(md.contains("- **[medium]** Consider adding tests."));
    }

    #[test]
    fn test_comparison_section_signs_changes() {
        let s = snapshot();
        let delta = ComparisonDelta {
            build_time_change_ms: Some(2000),
            dist_size_change: Some(-1024),
            dependency_count_change: Some(0),
        };
        let history = vec![s.clone(), s.clone()];
        let md = render_markdown(&ReportContext::new(&s, &history, &[]).with_comparison(Some(&delta)));
        assert!(md.contains("- **Build Time Change**: +2.00s"));
        assert!(md.contains("- **Distribution Size Change**: -1 KB"));
        assert!(md.contains("- **Dependency Count Change**: 0"));
        assert!(md.contains("- **Recorded Analyses**: 2"));
    }
}
