//! End-to-end analysis scenarios against package directories built in
//! temporary folders, with `npm` replaced by an in-process fake.

use chrono::{TimeZone, Utc};
use pkglens_core::analyzer::{AnalyzerSettings, PackageAnalyzer};
use pkglens_core::error::{PkglensError, Result};
use pkglens_core::history::ComparisonDelta;
use pkglens_core::insights::{derive_insights, derive_insights_with, InsightThresholds, Severity};
use pkglens_core::section::Section;
use pkglens_core::shell::{CommandOutput, CommandRunner, CommandSpec};
use pkglens_core::snapshot::{BuildSummary, Snapshot};
use serde_json::Value;
use std::cell::RefCell;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const MIB: u64 = 1024 * 1024;

/// Answers the npm commands the probes issue and records every call.
#[derive(Debug, Default)]
struct FakeNpm {
    calls: RefCell<Vec<String>>,
}

impl FakeNpm {
    fn ok(stdout: &str) -> Result<CommandOutput> {
        Ok(CommandOutput {
            status: Some(0),
            success: true,
            stdout: stdout.to_string(),
            stderr: String::new(),
        })
    }

    fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

impl CommandRunner for FakeNpm {
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        let line = spec.args.join(" ");
        self.calls.borrow_mut().push(line.clone());
        let args: Vec<&str> = spec.args.iter().map(String::as_str).collect();
        match args.as_slice() {
            ["run", "clean"] | ["run", "build"] => Self::ok(""),
            ["view", _, "time", "--json"] => Self::ok(
                r#"{"created":"2023-01-01T00:00:00.000Z","modified":"2024-01-01T00:00:00.000Z","1.0.0":"2024-01-01T00:00:00.000Z"}"#,
            ),
            ["pack", "--pack-destination", dir] => {
                fs::write(Path::new(dir).join("widget-1.1.0.tgz"), vec![0u8; 2048])?;
                Self::ok("npm notice\nwidget-1.1.0.tgz\n")
            }
            ["pack", "--dry-run", "--json"] => Self::ok(
                r#"[{"files":[{"path":"dist/index.js","size":4096},{"path":"README.md","size":1024}]}]"#,
            ),
            _ => Err(PkglensError::command_error(line, None, "unexpected command")),
        }
    }
}

/// Fails every command; for runs that must not spawn anything.
#[derive(Debug)]
struct NoCommands;

impl CommandRunner for NoCommands {
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        Err(PkglensError::command_error(spec.display(), None, "commands are disabled"))
    }
}

fn package_dir(root: &Path, manifest: &str) -> PathBuf {
    let dir = root.join("widget");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("package.json"), manifest).unwrap();
    dir
}

fn offline(package: &Path, output_root: &Path) -> AnalyzerSettings {
    AnalyzerSettings {
        output_root: output_root.to_path_buf(),
        run_build: false,
        run_pack: false,
        query_registry: false,
        ..AnalyzerSettings::new(package)
    }
}

fn sparse_file(path: &Path, len: u64) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    File::create(path).unwrap().set_len(len).unwrap();
}

#[test]
fn test_bare_manifest_without_scripts() {
    let root = TempDir::new().unwrap();
    let package = package_dir(root.path(), r#"{"name": "widget", "version": "0.1.0"}"#);
    let analyzer = PackageAnalyzer::new(offline(&package, &root.path().join("out")), NoCommands).unwrap();

    let summary = analyzer.run().unwrap();
    let snapshot = &summary.snapshot;

    let manifest = snapshot.manifest.present().expect("manifest is present");
    assert!(!manifest.scripts.has_build);
    assert!(!manifest.scripts.has_test);
    assert!(snapshot.compiler_config.is_absent());
    assert!(snapshot.dist.is_absent());

    let medium: Vec<&str> = summary
        .insights
        .iter()
        .filter(|i| i.severity == Severity::Medium)
        .map(|i| i.message.as_str())
        .collect();
    assert!(medium.iter().any(|m| m.contains("'build' script")), "{:?}", medium);
    assert!(medium.iter().any(|m| m.contains("No test script")), "{:?}", medium);
    assert!(!summary.insights.iter().any(|i| i.message.contains("Distribution size")));
}

#[test]
fn test_oversized_node_modules() {
    let root = TempDir::new().unwrap();
    let package = package_dir(
        root.path(),
        r#"{"name": "widget", "dependencies": {"typescript": "5", "a": "1", "b": "1", "c": "1", "d": "1"}}"#,
    );
    let node_modules = package.join("node_modules");
    sparse_file(&node_modules.join("typescript/lib/typescript.js"), 40 * MIB);
    for name in ["a", "b", "c", "d"] {
        sparse_file(&node_modules.join(name).join("index.js"), 20 * MIB);
    }

    let analyzer = PackageAnalyzer::new(offline(&package, &root.path().join("out")), NoCommands).unwrap();
    let snapshot = analyzer.analyze();

    let sizes = snapshot.dependency_sizes.present().expect("node_modules was measured");
    assert_eq!(sizes.total_size, 120 * MIB);
    assert_eq!(sizes.largest[0].name, "typescript");
    assert_eq!(sizes.direct_count, 5);
    assert_eq!(sizes.transitive_count, 0);

    let insights = derive_insights(&snapshot);
    assert!(insights
        .iter()
        .any(|i| i.severity == Severity::High && i.message.starts_with("Extremely large node_modules size (120.00MB)")));
    assert!(insights.iter().any(|i| i.severity == Severity::Medium
        && i.message.contains("\"typescript\" accounts for 33.3%")));
    assert!(!insights.iter().any(|i| i.message.starts_with("Large node_modules")));
}

#[test]
fn test_build_time_regression_between_runs() {
    let at = |minute| Utc.with_ymd_and_hms(2024, 6, 1, 9, minute, 0).unwrap();
    let with_build = |minute, ms| {
        let mut snapshot = Snapshot::empty("widget", PathBuf::from("/work/widget"), at(minute));
        snapshot.build = Section::Present(BuildSummary {
            duration_ms: ms,
            duration_formatted: String::new(),
            cleaned: false,
        });
        snapshot
    };
    let previous = with_build(0, 4000);
    let current = with_build(5, 6000);

    let delta = ComparisonDelta::between(&current, &previous);
    assert_eq!(delta.build_time_change_ms, Some(2000));

    let insights = derive_insights_with(&current, Some(&previous), &InsightThresholds::default());
    assert!(insights
        .iter()
        .any(|i| i.message.starts_with("Build time increased by 50.0%")));
}

#[test]
fn test_full_run_with_every_probe() {
    let root = TempDir::new().unwrap();
    let package = package_dir(
        root.path(),
        r#"{
            "name": "widget",
            "version": "1.1.0",
            "main": "dist/index.js",
            "types": "dist/index.d.ts",
            "scripts": {"build": "tsc", "test": "vitest"},
            "devDependencies": {"typescript": "5", "vitest": "1", "eslint": "8"}
        }"#,
    );
    fs::write(
        package.join("tsconfig.json"),
        "{\n  // compiler options\n  \"compilerOptions\": {\"target\": \"ES2020\", \"strict\": true,},\n}\n",
    )
    .unwrap();
    fs::create_dir_all(package.join("dist")).unwrap();
    fs::write(package.join("dist/index.js"), "module.exports = {};\n").unwrap();
    fs::write(package.join("dist/index.d.ts"), "export {};\n").unwrap();

    let output_root = root.path().join("out");
    let settings = AnalyzerSettings {
        output_root: output_root.clone(),
        ..AnalyzerSettings::new(&package)
    };
    let analyzer = PackageAnalyzer::new(settings, FakeNpm::default()).unwrap();
    let summary = analyzer.run().unwrap();
    let snapshot = &summary.snapshot;

    assert!(snapshot.build.is_present());
    assert_eq!(snapshot.compiler_config.present().unwrap().target.as_deref(), Some("ES2020"));
    assert_eq!(snapshot.dist.present().unwrap().file_stats.dts_files, 1);
    let registry = snapshot.version.present().unwrap().registry.present().unwrap();
    assert_eq!(registry.latest().unwrap().version, "1.0.0");
    let pack = snapshot.pack.present().unwrap();
    assert_eq!(pack.packed_size, 2048);
    assert_eq!(pack.unpacked_size, 5120);
    assert_eq!(pack.largest_files[0].path, "dist/index.js");

    assert!(summary
        .insights
        .iter()
        .any(|i| i.severity == Severity::Info && i.message.contains("\"1.1.0\" differs from latest published version \"1.0.0\"")));

    let output_dir = output_root.join("widget");
    assert!(output_dir.join("pack-analysis/widget-1.1.0.tgz").is_file());
    assert_eq!(summary.reports.html, output_dir.join("widget-analysis.html"));
    assert!(summary.history_record.unwrap().starts_with(output_dir.join("history")));

    let json: Value = serde_json::from_str(&fs::read_to_string(&summary.reports.json).unwrap()).unwrap();
    assert_eq!(json["analysis"]["pack"]["status"], "present");
    assert_eq!(json["analysis"]["pack"]["data"]["packed_size"], 2048);

    let markdown = fs::read_to_string(&summary.reports.markdown).unwrap();
    assert!(markdown.contains("Package Size Analysis"));

    assert_eq!(snapshot.package_path, package.canonicalize().unwrap());
}

#[test]
fn test_probe_order_of_commands() {
    let root = TempDir::new().unwrap();
    let package = package_dir(root.path(), r#"{"name": "widget", "version": "1.0.0"}"#);
    let settings = AnalyzerSettings {
        output_root: root.path().join("out"),
        ..AnalyzerSettings::new(&package)
    };
    let analyzer = PackageAnalyzer::new(settings, FakeNpm::default()).unwrap();
    analyzer.analyze();

    let calls = analyzer.runner().calls();
    assert_eq!(calls.len(), 5, "{:?}", calls);
    assert_eq!(calls[0], "view widget time --json");
    assert_eq!(calls[1], "run clean");
    assert_eq!(calls[2], "run build");
    assert!(calls[3].starts_with("pack --pack-destination "));
    assert_eq!(calls[4], "pack --dry-run --json");
}

#[test]
fn test_missing_package_directory_is_invalid_input() {
    let root = TempDir::new().unwrap();
    let err = PackageAnalyzer::new(AnalyzerSettings::new(root.path().join("missing")), NoCommands).unwrap_err();
    assert_eq!(err.name(), "InvalidInput");
    assert!(!err.suggestions().is_empty());
}
