use clap::Parser;
use std::path::PathBuf;

/// CLI arguments for `pkglens`.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "pkglens",
    version,
    about = "Analyze a TypeScript/npm package and report on its build, size, dependencies and configuration"
)]
pub struct Cli {
    /// Path to the package directory (the one containing package.json).
    #[arg(value_name = "PACKAGE_PATH")]
    pub package_path: PathBuf,

    /// Output root; reports are written to `<DIR>/<package name>/`. Defaults to ./package-analysis.
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Configuration file. Defaults to pkglens.toml or .pkglens.toml in the package or current directory.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Do not run `npm run clean` / `npm run build`.
    #[arg(long)]
    pub skip_build: bool,

    /// Do not run `npm pack`.
    #[arg(long)]
    pub skip_pack: bool,

    /// Do not query the npm registry for publish history.
    #[arg(long)]
    pub offline: bool,

    /// Enable debug logging.
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log errors and skip the summary table.
    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    /// Log filter used when `RUST_LOG` is not set.
    pub fn default_log_filter(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else if self.quiet {
            "error"
        } else {
            "info"
        }
    }
}
