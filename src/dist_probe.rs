//! Distribution probe: counts, sizes and module formats of the build output.

use crate::error::{PkglensError, Result};
use crate::file_utils;
use crate::probe::{Probe, ProbeContext};
use crate::snapshot::{DistFileStats, DistSizeStats, DistSummary, ModuleInfo};
use std::fs;
use std::path::Path;

/// Candidate output directories, in lookup order.
pub const DIST_CANDIDATES: &[&str] = &["dist", "build", "lib", "out", "esm", "cjs"];

/// The category a distribution file is counted under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistFileKind {
    DeclarationMap,
    SourceMap,
    Declaration,
    JavaScript,
    Json,
    Css,
    Other,
}

impl DistFileKind {
    /// Categorizes a file by name. Longer suffixes win, so `index.d.ts.map`
    /// is a declaration map and not a source map.
    pub fn from_file_name(name: &str) -> Self {
        if name.ends_with(".d.ts.map") {
            Self::DeclarationMap
        } else if name.ends_with(".js.map") {
            Self::SourceMap
        } else if name.ends_with(".d.ts") {
            Self::Declaration
        } else if name.ends_with(".js") {
            Self::JavaScript
        } else if name.ends_with(".json") {
            Self::Json
        } else if name.ends_with(".css") {
            Self::Css
        } else {
            Self::Other
        }
    }
}

/// Analyzes the first distribution directory found in the package.
#[derive(Debug, Default)]
pub struct DistProbe;

impl DistProbe {
    pub fn new() -> Self {
        DistProbe
    }

    /// Summarizes `dist_dir`, recording `directory` as its display name.
    pub fn summarize(&self, directory: &str, dist_dir: &Path) -> Result<DistSummary> {
        let mut files = DistFileStats::default();
        let mut sizes = DistSizeStats::default();
        let mut modules = ModuleInfo::default();

        for path in file_utils::collect_files(dist_dir)? {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let size = file_utils::file_size(&path)?;
            let kind = DistFileKind::from_file_name(&name);

            files.total_files += 1;
            sizes.total_size += size;
            match kind {
                DistFileKind::DeclarationMap => {
                    files.dts_map_files += 1;
                    sizes.dts_map_size += size;
                }
                DistFileKind::SourceMap => {
                    files.map_files += 1;
                    sizes.map_size += size;
                }
                DistFileKind::Declaration => {
                    files.dts_files += 1;
                    sizes.dts_size += size;
                }
                DistFileKind::JavaScript => {
                    files.js_files += 1;
                    sizes.js_size += size;
                    inspect_module_syntax(&path, &mut modules)?;
                }
                DistFileKind::Json => {
                    files.json_files += 1;
                    sizes.other_size += size;
                }
                DistFileKind::Css => {
                    files.css_files += 1;
                    sizes.other_size += size;
                }
                DistFileKind::Other => {
                    files.other_files += 1;
                    sizes.other_size += size;
                }
            }
        }

        modules.has_both_module_types = modules.esm_modules > 0 && modules.cjs_modules > 0;

        Ok(DistSummary {
            directory: directory.to_string(),
            file_stats: files,
            size_stats: sizes,
            module_info: modules,
        })
    }
}

fn inspect_module_syntax(path: &Path, modules: &mut ModuleInfo) -> Result<()> {
    let bytes = fs::read(path)
        .map_err(|e| PkglensError::io_error_with_source("read file", path.to_path_buf(), e))?;
    let content = String::from_utf8_lossy(&bytes);

    if content.contains("sourceMappingURL") {
        modules.source_map_references += 1;
    }
    if content.contains("export ") || content.contains("import ") {
        modules.esm_modules += 1;
    }
    if content.contains("require(") || content.contains("module.exports") {
        modules.cjs_modules += 1;
    }
    Ok(())
}

impl Probe for DistProbe {
    type Data = DistSummary;

    fn name() -> &'static str {
        "dist"
    }

    fn description() -> &'static str {
        "Analyzing distribution files"
    }

    #[tracing::instrument(level = "debug", skip(self, ctx), fields(package = %ctx.package_dir.display()), err)]
    fn probe(&self, ctx: &ProbeContext<'_>) -> Result<Option<DistSummary>> {
        let Some(directory) = DIST_CANDIDATES
            .iter()
            .find(|name| ctx.package_dir.join(name).is_dir())
        else {
            return Ok(None);
        };
        tracing::debug!(directory, "found distribution directory");
        self.summarize(directory, &ctx.package_dir.join(directory))
            .map(Some)
    }
}
