//! pkglens: inspect a TypeScript/npm package and report on its health.
//!
//! Runs every probe against the package directory, records the result in the
//! package's history, writes Markdown, HTML and JSON reports and prints the
//! insights as a table.
//!
//! USAGE EXAMPLE:
//!   pkglens ./my-library --output-dir reports --skip-pack

use clap::Parser;
use pkglens_core::analyzer::{PackageAnalyzer, RunSummary};
use pkglens_core::cli::Cli;
use pkglens_core::cli_report::{render_insight_table, render_summary_line};
use pkglens_core::config::{load_config, resolve_settings};
use pkglens_core::error::{PkglensError, Result};
use pkglens_core::format_utils::{format_bytes, format_duration};
use pkglens_core::shell::SystemRunner;
use std::process::exit;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    init_tracing(&cli);

    if let Err(e) = run(&cli) {
        report_error(&e);
        exit(1);
    }
    Ok(())
}

/// Logs go to stderr; `RUST_LOG` overrides the verbosity flags.
fn init_tracing(cli: &Cli) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.default_log_filter()));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref(), &cli.package_path)?;
    if let Some((path, _)) = &config {
        tracing::info!(path = %path.display(), "using configuration file");
    }
    let settings = resolve_settings(cli, config.as_ref().map(|(_, config)| config));

    let analyzer = PackageAnalyzer::new(settings, SystemRunner)?;
    let summary = analyzer.run()?;

    if !cli.quiet {
        print_summary(&summary);
    }
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    println!("{}", render_insight_table(&summary.insights));
    println!("{}", render_summary_line(&summary.insights));

    if let Some(delta) = summary.comparison.filter(|delta| !delta.is_empty()) {
        println!();
        println!("Compared with the previous analysis:");
        if let Some(change) = delta.build_time_change_ms {
            println!("  Build time: {}{}", sign(change), format_duration(change.unsigned_abs()));
        }
        if let Some(change) = delta.dist_size_change {
            println!("  Distribution size: {}{}", sign(change), format_bytes(change.unsigned_abs()));
        }
        if let Some(change) = delta.dependency_count_change {
            println!("  Dependencies: {:+}", change);
        }
    }

    println!();
    println!("Reports written:");
    println!("  Markdown: {}", summary.reports.markdown.display());
    println!("  HTML:     {}", summary.reports.html.display());
    println!("  JSON:     {}", summary.reports.json.display());
}

fn sign(change: i64) -> &'static str {
    if change < 0 { "-" } else { "+" }
}

fn report_error(error: &PkglensError) {
    eprintln!("Error: {}", error);
    let suggestions = error.suggestions();
    if !suggestions.is_empty() {
        eprintln!();
        eprintln!("Suggestions:");
        for suggestion in suggestions {
            eprintln!("  - {}", suggestion);
        }
    }
}
