//! Report context and report file output.
//!
//! The renderers in [`markdown_report`](crate::markdown_report),
//! [`html_report`](crate::html_report) and [`json_report`](crate::json_report)
//! are pure functions of a [`ReportContext`]; this module only decides where
//! their output lands.

use crate::error::Result;
use crate::file_utils::write_file_with_dirs;
use crate::history::ComparisonDelta;
use crate::insights::Insight;
use crate::snapshot::Snapshot;
use crate::{html_report, json_report, markdown_report};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

/// Everything a renderer needs.
#[derive(Debug, Clone, Copy)]
pub struct ReportContext<'a> {
    pub snapshot: &'a Snapshot,
    /// The full history series, oldest first, including `snapshot` once it
    /// has been recorded.
    pub history: &'a [Snapshot],
    pub insights: &'a [Insight],
    pub comparison: Option<&'a ComparisonDelta>,
    pub generated_at: DateTime<Utc>,
}

impl<'a> ReportContext<'a> {
    pub fn new(snapshot: &'a Snapshot, history: &'a [Snapshot], insights: &'a [Insight]) -> Self {
        Self {
            snapshot,
            history,
            insights,
            comparison: None,
            generated_at: snapshot.timestamp,
        }
    }

    pub fn with_comparison(mut self, comparison: Option<&'a ComparisonDelta>) -> Self {
        self.comparison = comparison;
        self
    }

    pub fn generated_at(mut self, generated_at: DateTime<Utc>) -> Self {
        self.generated_at = generated_at;
        self
    }
}

/// Paths of the written report files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPaths {
    pub markdown: PathBuf,
    pub html: PathBuf,
    pub json: PathBuf,
}

impl ReportPaths {
    /// `<package>-analysis.{md,html,json}` inside `output_dir`.
    pub fn for_package(output_dir: &Path, package_name: &str) -> Self {
        let file = |ext: &str| output_dir.join(format!("{}-analysis.{}", package_name, ext));
        Self {
            markdown: file("md"),
            html: file("html"),
            json: file("json"),
        }
    }
}

/// Renders all three reports and writes them to `output_dir`.
#[tracing::instrument(level = "debug", skip(ctx), fields(package = %ctx.snapshot.package_name), err)]
pub fn write_reports(output_dir: &Path, ctx: &ReportContext<'_>) -> Result<ReportPaths> {
    let paths = ReportPaths::for_package(output_dir, &ctx.snapshot.package_name);

    write_file_with_dirs(&paths.markdown, &markdown_report::render_markdown(ctx))?;
    tracing::info!(path = %paths.markdown.display(), "markdown report saved");

    write_file_with_dirs(&paths.html, &html_report::render_html(ctx)?)?;
    tracing::info!(path = %paths.html.display(), "HTML report saved");

    write_file_with_dirs(&paths.json, &json_report::render_json(ctx)?)?;
    tracing::info!(path = %paths.json.display(), "JSON report saved");

    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::insights::derive_insights;
    use chrono::TimeZone;
    use tempfile::TempDir;

    #[test]
    fn test_report_paths_are_named_after_package() {
        let paths = ReportPaths::for_package(Path::new("/out/widget"), "widget");
        assert_eq!(paths.markdown, PathBuf::from("/out/widget/widget-analysis.md"));
        assert_eq!(paths.html, PathBuf::from("/out/widget/widget-analysis.html"));
        assert_eq!(paths.json, PathBuf::from("/out/widget/widget-analysis.json"));
    }

    #[test]
    fn test_write_reports_creates_three_files() {
        let out = TempDir::new().unwrap();
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        let snapshot = Snapshot::empty("widget", PathBuf::from("/pkg/widget"), ts);
        let insights = derive_insights(&snapshot);
        let history = vec![snapshot.clone()];
        let ctx = ReportContext::new(&snapshot, &history, &insights);

        let paths = write_reports(&out.path().join("widget"), &ctx).unwrap();
        for path in [&paths.markdown, &paths.html, &paths.json] {
            assert!(path.is_file(), "{} should exist", path.display());
        }
    }
}
