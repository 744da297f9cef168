use crate::error::{PkglensError, Result};
use crate::snapshot::FileStamp;
use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Directories never considered part of a package's own sources.
pub const IGNORED_DIRS: &[&str] = &[
    "node_modules",
    ".git",
    "dist",
    "build",
    "lib",
    "out",
    "esm",
    "cjs",
    "coverage",
];

/// Extensions counted as package sources when looking for the newest and oldest file.
const SOURCE_EXTENSIONS: &[&str] = &["ts", "tsx", "mts", "cts", "js", "jsx", "mjs", "cjs"];

/// Recursively collect every regular file under `dir`.
///
/// # Returns
/// - `Ok(files)` in walk order.
/// - `Err` if directory traversal fails.
pub fn collect_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry_result in WalkDir::new(dir) {
        let entry = entry_result?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Sum of the sizes of every regular file under `dir`.
pub fn directory_size(dir: &Path) -> Result<u64> {
    let mut total = 0;
    for entry_result in WalkDir::new(dir) {
        let entry = entry_result?;
        if entry.file_type().is_file() {
            total += entry.metadata()?.len();
        }
    }
    Ok(total)
}

/// Size of a single file.
pub fn file_size(path: &Path) -> Result<u64> {
    fs::metadata(path)
        .map(|m| m.len())
        .map_err(|e| PkglensError::io_error_with_source("stat file", path.to_path_buf(), e))
}

/// Modification time of `path` in UTC.
pub fn modified_time(path: &Path) -> Result<DateTime<Utc>> {
    let modified = fs::metadata(path)
        .and_then(|m| m.modified())
        .map_err(|e| PkglensError::io_error_with_source("read modification time", path.to_path_buf(), e))?;
    Ok(DateTime::<Utc>::from(modified))
}

/// Finds the most and least recently modified source files under `root`,
/// skipping [`IGNORED_DIRS`] and hidden directories.
///
/// Paths in the result are relative to `root`.
pub fn newest_and_oldest_sources(root: &Path) -> Result<(Option<FileStamp>, Option<FileStamp>)> {
    let mut newest: Option<FileStamp> = None;
    let mut oldest: Option<FileStamp> = None;

    let walker = WalkDir::new(root).into_iter().filter_entry(|e| {
        if e.depth() == 0 || !e.file_type().is_dir() {
            return true;
        }
        let name = e.file_name().to_string_lossy();
        !name.starts_with('.') && !IGNORED_DIRS.contains(&name.as_ref())
    });

    for entry_result in walker {
        let entry = entry_result?;
        if !entry.file_type().is_file() || !has_source_extension(entry.path()) {
            continue;
        }
        let modified = DateTime::<Utc>::from(entry.metadata()?.modified()?);
        let stamp = FileStamp {
            path: relative_display(entry.path(), root),
            modified,
        };
        if newest.as_ref().is_none_or(|n| stamp.modified > n.modified) {
            newest = Some(stamp.clone());
        }
        if oldest.as_ref().is_none_or(|o| stamp.modified < o.modified) {
            oldest = Some(stamp);
        }
    }

    Ok((newest, oldest))
}

fn has_source_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| SOURCE_EXTENSIONS.contains(&ext))
}

/// `path` relative to `root` with forward slashes, or the full path if it is outside `root`.
pub fn relative_display(path: &Path, root: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.to_string_lossy().replace('\\', "/")
}

/// Writes `content` to `path`, creating parent directories as needed.
pub fn write_file_with_dirs(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            PkglensError::io_error_with_source("create directory", parent.to_path_buf(), e)
        })?;
    }
    fs::write(path, content)
        .map_err(|e| PkglensError::io_error_with_source("write file", path.to_path_buf(), e))
}

/// Reads a UTF-8 file, attaching the path to any error.
pub fn read_to_string(path: &Path) -> Result<String> {
    fs::read_to_string(path)
        .map_err(|e| PkglensError::io_error_with_source("read file", path.to_path_buf(), e))
}
