//! Build probe: times `npm run build`.

use crate::error::Result;
use crate::format_utils::format_duration;
use crate::probe::{Probe, ProbeContext};
use crate::shell::CommandSpec;
use crate::snapshot::BuildSummary;
use std::time::Instant;

/// Runs the package's clean and build scripts and measures the build.
#[derive(Debug, Default)]
pub struct BuildProbe;

impl BuildProbe {
    pub fn new() -> Self {
        BuildProbe
    }

    /// `npm run clean`; the script is optional, so failures are only logged.
    fn clean(&self, ctx: &ProbeContext<'_>) -> bool {
        let spec = CommandSpec::npm(ctx.package_dir, ["run", "clean"]);
        match ctx.runner.run(&spec) {
            Ok(output) if output.success => {
                tracing::info!("cleaned previous build artifacts");
                true
            }
            Ok(output) => {
                tracing::debug!(status = ?output.status, "clean script failed or missing");
                false
            }
            Err(e) => {
                tracing::debug!(error = %e, "clean script could not be run");
                false
            }
        }
    }
}

impl Probe for BuildProbe {
    type Data = BuildSummary;

    fn name() -> &'static str {
        "build"
    }

    fn description() -> &'static str {
        "Measuring build time"
    }

    #[tracing::instrument(level = "debug", skip(self, ctx), fields(package = %ctx.package_dir.display()), err)]
    fn probe(&self, ctx: &ProbeContext<'_>) -> Result<Option<BuildSummary>> {
        let cleaned = self.clean(ctx);

        let spec = CommandSpec::npm(ctx.package_dir, ["run", "build"])
            .env("FORCE_COLOR", "1")
            .inherit_stdio();
        let start = Instant::now();
        ctx.runner.run_checked(&spec)?;
        let duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

        let duration_formatted = format_duration(duration_ms);
        tracing::info!(duration = %duration_formatted, "build completed");

        Ok(Some(BuildSummary {
            duration_ms,
            duration_formatted,
            cleaned,
        }))
    }
}
