//! HTML report renderer.
//!
//! Produces a single page of stat cards and tables. Donut charts of the
//! distribution breakdown are always drawn when the distribution section is
//! present; line charts of build time, distribution size and dependency count
//! are added once the history holds more than one snapshot. Chart data is
//! embedded inline as JSON on `window`.

use crate::error::Result;
use crate::format_utils::{bytes_to_mib, format_bytes, format_date, format_duration};
use crate::history::ComparisonDelta;
use crate::html_utils::{
    embed_json, get_metric_cell_style, placeholder, render_html_doc, render_metric_explanation_list,
    stat_card, MetricRanges,
};
use crate::reporting::ReportContext;
use crate::section::Section;
use crate::snapshot::{
    CompilerConfigSummary, DependencySizeSummary, DependencySummary, DistSummary, PackSummary,
    Snapshot, VersionSummary,
};
use maud::{html, Markup, PreEscaped};
use serde::Serialize;

const DONUT_COLORS: [&str; 5] = ["#3178c6", "#007acc", "#549bf4", "#8abfff", "#cccccc"];

const CHARTS_JS: &str = r#"
(function() {
    const palette = window.chartPalette || [];
    const donut = (id, labels, values) => {
        const el = document.getElementById(id);
        if (!el) return;
        new Chart(el, {
            type: 'doughnut',
            data: { labels: labels, datasets: [{ data: values, backgroundColor: palette }] },
            options: { plugins: { legend: { position: 'bottom' } } }
        });
    };
    const line = (id, label, values, labels) => {
        const el = document.getElementById(id);
        if (!el) return;
        new Chart(el, {
            type: 'line',
            data: { labels: labels, datasets: [{ label: label, data: values, borderColor: palette[0], tension: 0.2, spanGaps: true }] },
            options: { scales: { y: { beginAtZero: true } } }
        });
    };

    if (window.distData) {
        donut('filesDonutChart', window.distData.labels, window.distData.files);
        donut('sizeDonutChart', window.distData.labels, window.distData.sizes);
    }
    if (window.historicalData) {
        const labels = window.historicalData.map(p => p.label);
        line('buildTimeChart', 'Build time (s)', window.historicalData.map(p => p.build_time_seconds), labels);
        line('distSizeChart', 'Distribution size (MB)', window.historicalData.map(p => p.dist_size_mb), labels);
        line('dependencyCountChart', 'Dependencies', window.historicalData.map(p => p.dependency_count), labels);
    }
})();
"#;

/// One point of the history line charts.
#[derive(Debug, Serialize, PartialEq)]
pub struct HistoryPoint {
    pub label: String,
    pub build_time_seconds: Option<f64>,
    pub dist_size_mb: Option<f64>,
    pub dependency_count: Option<usize>,
}

impl HistoryPoint {
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        Self {
            label: format_date(snapshot.timestamp),
            build_time_seconds: snapshot.build_duration_ms().map(|ms| ms as f64 / 1000.0),
            dist_size_mb: snapshot.dist_total_size().map(bytes_to_mib),
            dependency_count: snapshot.runtime_dependency_count(),
        }
    }
}

#[derive(Debug, Serialize)]
struct DistChartData {
    labels: [&'static str; 5],
    files: [usize; 5],
    sizes: [u64; 5],
}

impl DistChartData {
    fn from_summary(dist: &DistSummary) -> Self {
        let (f, s) = (dist.file_stats, dist.size_stats);
        Self {
            labels: ["JavaScript", "Declarations", "Source maps", "Declaration maps", "Other"],
            files: [
                f.js_files,
                f.dts_files,
                f.map_files,
                f.dts_map_files,
                f.json_files + f.css_files + f.other_files,
            ],
            sizes: [s.js_size, s.dts_size, s.map_size, s.dts_map_size, s.other_size],
        }
    }
}

const METRIC_EXPLANATIONS: &[(&str, &str)] = &[
    (
        "Compression ratio",
        "Packed tarball size divided by the sum of the packed file sizes. Values close to 100% mean the content barely compresses.",
    ),
    (
        "Transitive dependencies",
        "Installed packages under node_modules that the manifest does not declare directly.",
    ),
    (
        "Source maps",
        "Size of .js.map and .d.ts.map files in the distribution directory.",
    ),
];

/// Renders the HTML report.
///
/// # Errors
///
/// Fails only if the chart data cannot be serialized.
pub fn render_html(ctx: &ReportContext<'_>) -> Result<String> {
    let snapshot = ctx.snapshot;
    let title = format!("TypeScript Package Analysis: {}", snapshot.package_name);

    let body = html! {
        p { "Generated on " (format_date(ctx.generated_at)) }
        (summary_cards(snapshot))
        section {
            h2 { "Insights and Recommendations" }
            ul class="insights" {
                @for insight in ctx.insights {
                    li class=(insight.severity.css_class()) {
                        strong { (insight.severity.label()) } " " (insight.message)
                    }
                }
            }
        }
        (version_section(snapshot))
        (distribution_section(&snapshot.dist))
        (compiler_config_section(&snapshot.compiler_config))
        (dependencies_section(&snapshot.dependencies))
        (dependency_sizes_section(&snapshot.dependency_sizes))
        (pack_section(&snapshot.pack))
        (comparison_section(ctx.comparison))
        @if ctx.history.len() > 1 {
            section {
                h2 { "History" }
                div class="chart-row" {
                    div class="chart-box" { canvas id="buildTimeChart" {} }
                    div class="chart-box" { canvas id="distSizeChart" {} }
                    div class="chart-box" { canvas id="dependencyCountChart" {} }
                }
            }
        }
        section { (render_metric_explanation_list(METRIC_EXPLANATIONS)) }
    };

    let mut data = format!("window.chartPalette = {};\n", embed_json(&DONUT_COLORS)?);
    if let Some(dist) = snapshot.dist.present() {
        data.push_str(&format!(
            "window.distData = {};\n",
            embed_json(&DistChartData::from_summary(dist))?
        ));
    }
    if ctx.history.len() > 1 {
        let points: Vec<HistoryPoint> = ctx.history.iter().map(HistoryPoint::from_snapshot).collect();
        data.push_str(&format!("window.historicalData = {};\n", embed_json(&points)?));
    }

    let scripts = html! {
        script { (PreEscaped(data)) }
        script { (PreEscaped(CHARTS_JS)) }
    };
    Ok(render_html_doc(&title, body, scripts))
}

fn summary_cards(snapshot: &Snapshot) -> Markup {
    let version = snapshot
        .version
        .present()
        .map(|v| v.current_version.clone())
        .unwrap_or_else(|| "N/A".to_string());
    let na = || "N/A".to_string();
    html! {
        section {
            h2 { (snapshot.display_name()) }
            div class="stat-grid" {
                (stat_card("Version", version))
                (stat_card("Build time", snapshot.build_duration_ms().map(format_duration).unwrap_or_else(na)))
                (stat_card("Distribution size", snapshot.dist_total_size().map(format_bytes).unwrap_or_else(na)))
                (stat_card("Dependencies", snapshot.runtime_dependency_count().map(|c| c.to_string()).unwrap_or_else(na)))
                (stat_card("Packed size", snapshot.pack.present().map(|p| format_bytes(p.packed_size)).unwrap_or_else(na)))
            }
        }
    }
}

fn version_section(snapshot: &Snapshot) -> Markup {
    html! {
        section {
            h2 { "Version & Modification Information" }
            @match &snapshot.version {
                Section::Present(version) => { (version_details(version)) }
                other => { (placeholder("Version information", other.error())) }
            }
        }
    }
}

fn version_details(version: &VersionSummary) -> Markup {
    html! {
        div class="stat-grid" {
            (stat_card("Current version", &version.current_version))
            (stat_card("package.json modified", version.manifest_modified.map(format_date).unwrap_or_else(|| "N/A".to_string())))
            @if let Some(newest) = &version.newest_file {
                (stat_card("Newest file", &newest.path))
            }
            @if let Some(oldest) = &version.oldest_file {
                (stat_card("Oldest file", &oldest.path))
            }
        }
        h3 { "Git" }
        @match &version.git {
            Section::Present(git) => {
                div class="stat-grid" {
                    (stat_card("Commits", git.commit_count))
                    (stat_card("Contributors", git.contributors_count))
                    (stat_card("Branch", git.current_branch.as_deref().unwrap_or("N/A")))
                    (stat_card("Tags", git.tag_count))
                }
                @if !git.tags.is_empty() {
                    p { "Recent tags: " (git.tags.join(", ")) }
                }
            }
            other => { (placeholder("Git repository", other.error())) }
        }
        h3 { "npm registry" }
        @match &version.registry {
            Section::Present(registry) => {
                div class="stat-grid" {
                    (stat_card("Published versions", registry.version_count))
                    (stat_card("Latest", registry.latest().map(|v| v.version.as_str()).unwrap_or("N/A")))
                    (stat_card("First published", registry.created.map(format_date).unwrap_or_else(|| "N/A".to_string())))
                }
            }
            other => { (placeholder("Published version history", other.error())) }
        }
    }
}

fn distribution_section(section: &Section<DistSummary>) -> Markup {
    html! {
        section {
            h2 { "Distribution Files" }
            @match section {
                Section::Present(dist) => {
                    div class="stat-grid" {
                        (stat_card("Directory", &dist.directory))
                        (stat_card("Total files", dist.file_stats.total_files))
                        (stat_card("Total size", format_bytes(dist.size_stats.total_size)))
                        (stat_card("ESM modules", dist.module_info.esm_modules))
                        (stat_card("CommonJS modules", dist.module_info.cjs_modules))
                        (stat_card("Source map references", dist.module_info.source_map_references))
                    }
                    div class="chart-row" {
                        div class="chart-box" { h3 { "Files by kind" } canvas id="filesDonutChart" {} }
                        div class="chart-box" { h3 { "Size by kind" } canvas id="sizeDonutChart" {} }
                    }
                }
                other => { (placeholder("Distribution directory", other.error())) }
            }
        }
    }
}

fn flag(value: Option<bool>) -> &'static str {
    match value {
        Some(true) => "Yes",
        Some(false) => "No",
        None => "Not specified",
    }
}

fn compiler_config_section(section: &Section<CompilerConfigSummary>) -> Markup {
    html! {
        section {
            h2 { "TypeScript Configuration" }
            @match section {
                Section::Present(config) => {
                    table {
                        caption { (config.config_file) }
                        tbody {
                            tr { th { "Target" } td { (config.target.as_deref().unwrap_or("Not specified")) } }
                            tr { th { "Module" } td { (config.module.as_deref().unwrap_or("Not specified")) } }
                            tr { th { "Strict" } td { (flag(config.strict)) } }
                            tr { th { "Declaration" } td { (flag(config.declaration)) } }
                            tr { th { "Declaration maps" } td { (flag(config.declaration_map)) } }
                            tr { th { "Source maps" } td { (flag(config.source_map)) } }
                            tr { th { "esModuleInterop" } td { (flag(config.es_module_interop)) } }
                            tr { th { "Incremental" } td { (flag(config.incremental)) } }
                        }
                    }
                }
                other => { (placeholder("TypeScript configuration", other.error())) }
            }
        }
    }
}

fn dependencies_section(section: &Section<DependencySummary>) -> Markup {
    let tools = |list: &[String]| {
        if list.is_empty() {
            "None detected".to_string()
        } else {
            list.join(", ")
        }
    };
    html! {
        section {
            h2 { "Dependencies" }
            @match section {
                Section::Present(deps) => {
                    div class="stat-grid" {
                        (stat_card("Runtime", deps.counts.dependencies))
                        (stat_card("Development", deps.counts.dev_dependencies))
                        (stat_card("Peer", deps.counts.peer_dependencies))
                        (stat_card("Type definitions", deps.counts.type_definitions))
                    }
                    ul {
                        li { strong { "Build tools: " } (tools(&deps.tooling.build_tools)) }
                        li { strong { "Testing tools: " } (tools(&deps.tooling.testing_tools)) }
                        li { strong { "Linting tools: " } (tools(&deps.tooling.linting_tools)) }
                    }
                }
                other => { (placeholder("Dependency information", other.error())) }
            }
        }
    }
}

fn dependency_sizes_section(section: &Section<DependencySizeSummary>) -> Markup {
    html! {
        section {
            h2 { "Dependency Size Analysis" }
            @match section {
                Section::Present(sizes) => {
                    div class="stat-grid" {
                        (stat_card("node_modules size", format_bytes(sizes.total_size)))
                        (stat_card("Installed packages", sizes.installed_count))
                        (stat_card("Direct", sizes.direct_count))
                        (stat_card("Transitive", sizes.transitive_count))
                    }
                    (largest_dependencies_table(sizes))
                }
                other => { (placeholder("node_modules", other.error())) }
            }
        }
    }
}

fn largest_dependencies_table(sizes: &DependencySizeSummary) -> Markup {
    let values: Vec<f64> = sizes.largest.iter().map(|d| d.size as f64).collect();
    let ranges = MetricRanges::from_values(&values, false);
    html! {
        table class="sortable-table" {
            caption { "Largest Dependencies" }
            thead {
                tr {
                    th class="sortable-header" data-column-index="0" data-sort-type="string" { "Package" }
                    th class="sortable-header" data-column-index="1" data-sort-type="string" { "Version" }
                    th class="sortable-header" data-column-index="2" data-sort-type="number" { "Size" }
                }
            }
            tbody {
                @for dep in &sizes.largest {
                    tr {
                        td { (dep.name) }
                        td { (dep.version) }
                        @if let Some(ranges) = &ranges {
                            td style=(get_metric_cell_style(dep.size as f64, ranges)) data-value=(dep.size) {
                                (format_bytes(dep.size))
                            }
                        } @else {
                            td data-value=(dep.size) { (format_bytes(dep.size)) }
                        }
                    }
                }
            }
        }
    }
}

fn pack_section(section: &Section<PackSummary>) -> Markup {
    html! {
        section {
            h2 { "Package Size Analysis" }
            @match section {
                Section::Present(pack) => {
                    div class="stat-grid" {
                        (stat_card("Packed size", format_bytes(pack.packed_size)))
                        (stat_card("Unpacked size", format_bytes(pack.unpacked_size)))
                        (stat_card("Compression ratio", format!("{:.1}%", pack.compression_ratio * 100.0)))
                        (stat_card("Tarball", &pack.tarball_name))
                    }
                    table {
                        caption { "Largest Files" }
                        thead { tr { th { "Path" } th { "Size" } } }
                        tbody {
                            @for file in &pack.largest_files {
                                tr { td { (file.path) } td { (format_bytes(file.size)) } }
                            }
                        }
                    }
                }
                other => { (placeholder("Packed tarball", other.error())) }
            }
        }
    }
}

fn comparison_section(delta: Option<&ComparisonDelta>) -> Markup {
    let Some(delta) = delta else {
        return html! {};
    };
    let signed = |value: Option<i64>, render: fn(u64) -> String| match value {
        Some(v) if v < 0 => format!("-{}", render(v.unsigned_abs())),
        Some(v) if v > 0 => format!("+{}", render(v.unsigned_abs())),
        Some(_) => "no change".to_string(),
        None => "N/A".to_string(),
    };
    html! {
        section {
            h2 { "Comparison with Previous Analysis" }
            div class="stat-grid" {
                (stat_card("Build time", signed(delta.build_time_change_ms, format_duration)))
                (stat_card("Distribution size", signed(delta.dist_size_change, format_bytes)))
                (stat_card("Dependencies", signed(delta.dependency_count_change, |n| n.to_string())))
            }
        }
    }
}
