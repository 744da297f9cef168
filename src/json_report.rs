//! JSON report renderer.

use crate::error::Result;
use crate::history::ComparisonDelta;
use crate::insights::Insight;
use crate::reporting::ReportContext;
use crate::snapshot::Snapshot;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Top-level shape of `<package>-analysis.json`.
#[derive(Debug, Serialize)]
pub struct JsonReport<'a> {
    pub package_name: &'a str,
    pub generated_at: DateTime<Utc>,
    pub analysis: &'a Snapshot,
    pub insights: &'a [Insight],
    pub comparison: Option<&'a ComparisonDelta>,
}

impl<'a> JsonReport<'a> {
    pub fn from_context(ctx: &ReportContext<'a>) -> Self {
        Self {
            package_name: &ctx.snapshot.package_name,
            generated_at: ctx.generated_at,
            analysis: ctx.snapshot,
            insights: ctx.insights,
            comparison: ctx.comparison,
        }
    }
}

/// Renders the pretty-printed JSON report.
pub fn render_json(ctx: &ReportContext<'_>) -> Result<String> {
    Ok(serde_json::to_string_pretty(&JsonReport::from_context(ctx))?)
}
