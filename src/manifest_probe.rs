//! Manifest probe: summarizes `package.json`.

use crate::error::{PkglensError, Result};
use crate::file_utils;
use crate::format_utils::format_author;
use crate::probe::{Probe, ProbeContext};
use crate::snapshot::{DependencyCounts, ManifestSummary, ScriptFlags};
use serde_json::Value;
use std::path::{Path, PathBuf};

pub const MANIFEST_FILE: &str = "package.json";

/// Path of the manifest inside `package_dir`.
pub fn manifest_path(package_dir: &Path) -> PathBuf {
    package_dir.join(MANIFEST_FILE)
}

/// Reads and parses `package.json`, returning `None` if it does not exist.
pub fn read_manifest(package_dir: &Path) -> Result<Option<Value>> {
    let path = manifest_path(package_dir);
    if !path.is_file() {
        return Ok(None);
    }
    let content = file_utils::read_to_string(&path)?;
    let value: Value = serde_json::from_str(&content).map_err(|e| {
        PkglensError::parse_error_with_source(path.clone(), "package.json is not valid JSON", e)
    })?;
    if !value.is_object() {
        return Err(PkglensError::ParseError {
            file: Some(path),
            context: "package.json must contain a JSON object".to_string(),
            source: None,
        });
    }
    Ok(Some(value))
}

/// Counts the declared dependencies of a parsed manifest.
pub fn dependency_counts(manifest: &Value) -> DependencyCounts {
    let dependencies = key_count(manifest, "dependencies");
    let dev_dependencies = key_count(manifest, "devDependencies");
    let peer_dependencies = key_count(manifest, "peerDependencies");
    let type_definitions = manifest
        .get("devDependencies")
        .and_then(Value::as_object)
        .map(|deps| deps.keys().filter(|k| k.starts_with("@types/")).count())
        .unwrap_or(0);

    DependencyCounts {
        dependencies,
        dev_dependencies,
        peer_dependencies,
        type_definitions,
        total: dependencies + dev_dependencies + peer_dependencies,
    }
}

fn key_count(manifest: &Value, field: &str) -> usize {
    manifest
        .get(field)
        .and_then(Value::as_object)
        .map_or(0, |o| o.len())
}

fn string_field(manifest: &Value, field: &str) -> Option<String> {
    manifest
        .get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Summarizes the manifest fields, scripts and dependency counts.
#[derive(Debug, Default)]
pub struct ManifestProbe;

impl ManifestProbe {
    pub fn new() -> Self {
        ManifestProbe
    }

    /// Builds the summary from an already parsed manifest.
    pub fn summarize(&self, manifest: &Value) -> ManifestSummary {
        let scripts = manifest.get("scripts").and_then(Value::as_object);
        let has_script = |name: &str| scripts.is_some_and(|s| s.contains_key(name));

        let main = string_field(manifest, "main");
        let module = string_field(manifest, "module");
        let types = string_field(manifest, "types").or_else(|| string_field(manifest, "typings"));

        ManifestSummary {
            name: string_field(manifest, "name"),
            version: string_field(manifest, "version"),
            description: string_field(manifest, "description"),
            author: manifest.get("author").map(format_author),
            license: string_field(manifest, "license"),
            has_esm: module.is_some(),
            has_cjs: main.is_some(),
            has_types: types.is_some(),
            main,
            module,
            types,
            scripts: ScriptFlags {
                has_build: has_script("build"),
                has_test: has_script("test"),
                has_lint: has_script("lint") || has_script("eslint"),
                has_prettier: has_script("prettier"),
                has_prepublish: has_script("prepublish"),
                has_prepack: has_script("prepack"),
            },
            dependency_counts: dependency_counts(manifest),
            has_source_maps: manifest
                .pointer("/publishConfig/sourcemap")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            side_effects: manifest.get("sideEffects").cloned(),
            has_exports: manifest.get("exports").is_some_and(|e| !e.is_null()),
            files: manifest
                .get("files")
                .and_then(Value::as_array)
                .map(|files| {
                    files
                        .iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
        }
    }
}

impl Probe for ManifestProbe {
    type Data = ManifestSummary;

    fn name() -> &'static str {
        "manifest"
    }

    fn description() -> &'static str {
        "Analyzing package.json"
    }

    #[tracing::instrument(level = "debug", skip(self, ctx), fields(package = %ctx.package_dir.display()), err)]
    fn probe(&self, ctx: &ProbeContext<'_>) -> Result<Option<ManifestSummary>> {
        let Some(manifest) = read_manifest(ctx.package_dir)? else {
            return Ok(None);
        };
        Ok(Some(self.summarize(&manifest)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::SystemRunner;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn probe_dir(dir: &Path) -> Result<Option<ManifestSummary>> {
        ManifestProbe::new().probe(&ProbeContext::new(dir, &SystemRunner))
    }

    #[test]
    fn test_missing_manifest_is_absent() {
        let dir = TempDir::new().unwrap();
        assert!(probe_dir(dir.path()).unwrap().is_none());
    }

    #[test]
    fn test_malformed_manifest_is_parse_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("package.json"), "{ \"name\": ").unwrap();
        let err = probe_dir(dir.path()).unwrap_err();
        assert!(matches!(err, PkglensError::ParseError { .. }));
    }

    #[test]
    fn test_non_object_manifest_is_parse_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("package.json"), "[1, 2]").unwrap();
        assert!(probe_dir(dir.path()).is_err());
    }

    #[test]
    fn test_summarize_full_manifest() {
        let manifest = json!({
            "name": "widget",
            "version": "1.2.3",
            "description": "A widget",
            "author": {"name": "Ada", "email": "ada@example.com"},
            "license": "MIT",
            "main": "dist/index.js",
            "module": "dist/index.mjs",
            "typings": "dist/index.d.ts",
            "exports": {".": "./dist/index.js"},
            "sideEffects": false,
            "files": ["dist"],
            "publishConfig": {"sourcemap": true},
            "scripts": {"build": "tsc", "test": "jest", "eslint": "eslint ."},
            "dependencies": {"a": "1", "b": "2"},
            "devDependencies": {"@types/node": "20", "@types/jest": "29", "jest": "29"},
            "peerDependencies": {"react": "18"}
        });

        let summary = ManifestProbe::new().summarize(&manifest);
        assert_eq!(summary.name.as_deref(), Some("widget"));
        assert_eq!(summary.author.as_deref(), Some("Ada <ada@example.com>"));
        assert_eq!(summary.types.as_deref(), Some("dist/index.d.ts"));
        assert!(summary.has_esm && summary.has_cjs && summary.has_types);
        assert!(summary.has_exports);
        assert!(summary.has_source_maps);
        assert_eq!(summary.side_effects, Some(json!(false)));
        assert_eq!(summary.files, vec!["dist".to_string()]);
        assert!(summary.scripts.has_build && summary.scripts.has_test && summary.scripts.has_lint);
        assert!(!summary.scripts.has_prepack);
        assert_eq!(
            summary.dependency_counts,
            DependencyCounts {
                dependencies: 2,
                dev_dependencies: 3,
                peer_dependencies: 1,
                type_definitions: 2,
                total: 6,
            }
        );
    }

    #[test]
    fn test_summarize_minimal_manifest_without_scripts() {
        let summary = ManifestProbe::new().summarize(&json!({"name": "bare"}));
        assert!(!summary.scripts.has_build);
        assert!(!summary.scripts.has_test);
        assert!(!summary.has_esm && !summary.has_cjs);
        assert_eq!(summary.dependency_counts.total, 0);
        assert!(summary.author.is_none());
    }

    #[test]
    fn test_probe_reads_manifest_from_disk() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("package.json"),
            r#"{"name":"on-disk","main":"index.js"}"#,
        )
        .unwrap();
        let summary = probe_dir(dir.path()).unwrap().unwrap();
        assert_eq!(summary.name.as_deref(), Some("on-disk"));
        assert!(summary.has_cjs);
    }
}
