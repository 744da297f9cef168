//! Compiler configuration probe: reads the first `tsconfig*.json` it finds.
//!
//! TypeScript configuration files are JSONC: they may contain `//` and
//! `/* */` comments and trailing commas. Both are stripped before the file is
//! handed to `serde_json`.

use crate::error::{PkglensError, Result};
use crate::file_utils;
use crate::probe::{Probe, ProbeContext};
use crate::snapshot::CompilerConfigSummary;
use serde_json::Value;

/// Candidate configuration files, in lookup order.
pub const TSCONFIG_CANDIDATES: &[&str] = &["tsconfig.json", "tsconfig.build.json", "tsconfig.esm.json"];

/// Removes comments and trailing commas from JSONC text.
///
/// String literals are copied untouched, including escaped quotes and
/// comment-like sequences such as `"http://example.com"`.
pub fn strip_json_comments(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    let mut in_string = false;

    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            match c {
                '\\' => {
                    if let Some(escaped) = chars.next() {
                        out.push(escaped);
                    }
                }
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            '/' if chars.peek() == Some(&'/') => {
                for next in chars.by_ref() {
                    if next == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for next in chars.by_ref() {
                    if prev == '*' && next == '/' {
                        break;
                    }
                    if next == '\n' {
                        out.push('\n');
                    }
                    prev = next;
                }
            }
            '}' | ']' => {
                drop_trailing_comma(&mut out);
                out.push(c);
            }
            _ => out.push(c),
        }
    }

    out
}

fn drop_trailing_comma(out: &mut String) {
    let trimmed_len = out.trim_end().len();
    if out[..trimmed_len].ends_with(',') {
        out.remove(trimmed_len - 1);
    }
}

fn str_option(options: &Value, key: &str) -> Option<String> {
    options.get(key).and_then(Value::as_str).map(str::to_string)
}

fn bool_option(options: &Value, key: &str) -> Option<bool> {
    options.get(key).and_then(Value::as_bool)
}

fn string_list(value: &Value, key: &str) -> Vec<String> {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Summarizes the TypeScript compiler options.
#[derive(Debug, Default)]
pub struct CompilerConfigProbe;

impl CompilerConfigProbe {
    pub fn new() -> Self {
        CompilerConfigProbe
    }

    /// Builds the summary from a parsed configuration document.
    pub fn summarize(&self, config_file: &str, config: &Value) -> CompilerConfigSummary {
        let empty = Value::Object(serde_json::Map::new());
        let options = config.get("compilerOptions").unwrap_or(&empty);

        CompilerConfigSummary {
            config_file: config_file.to_string(),
            target: str_option(options, "target"),
            module: str_option(options, "module"),
            declaration: bool_option(options, "declaration"),
            declaration_map: bool_option(options, "declarationMap"),
            source_map: bool_option(options, "sourceMap"),
            strict: bool_option(options, "strict"),
            es_module_interop: bool_option(options, "esModuleInterop"),
            skip_lib_check: bool_option(options, "skipLibCheck"),
            force_consistent_casing_in_file_names: bool_option(
                options,
                "forceConsistentCasingInFileNames",
            ),
            out_dir: str_option(options, "outDir"),
            root_dir: str_option(options, "rootDir"),
            composite: bool_option(options, "composite"),
            ts_build_info_file: str_option(options, "tsBuildInfoFile"),
            incremental: bool_option(options, "incremental"),
            jsx: str_option(options, "jsx"),
            jsx_factory: str_option(options, "jsxFactory"),
            jsx_fragment_factory: str_option(options, "jsxFragmentFactory"),
            lib: string_list(options, "lib"),
            types: string_list(options, "types"),
            path_mappings: options
                .get("paths")
                .and_then(Value::as_object)
                .map(|paths| paths.len()),
            base_url: str_option(options, "baseUrl"),
            resolve_json_module: bool_option(options, "resolveJsonModule"),
            module_resolution: str_option(options, "moduleResolution"),
            extends: str_option(config, "extends"),
            include: string_list(config, "include"),
            exclude: string_list(config, "exclude"),
            references: config
                .get("references")
                .and_then(Value::as_array)
                .map(Vec::len),
        }
    }
}

impl Probe for CompilerConfigProbe {
    type Data = CompilerConfigSummary;

    fn name() -> &'static str {
        "compiler_config"
    }

    fn description() -> &'static str {
        "Analyzing TypeScript configuration"
    }

    #[tracing::instrument(level = "debug", skip(self, ctx), fields(package = %ctx.package_dir.display()), err)]
    fn probe(&self, ctx: &ProbeContext<'_>) -> Result<Option<CompilerConfigSummary>> {
        let Some((file_name, path)) = TSCONFIG_CANDIDATES
            .iter()
            .map(|name| (*name, ctx.package_dir.join(name)))
            .find(|(_, path)| path.is_file())
        else {
            return Ok(None);
        };

        tracing::debug!(config_file = file_name, "found compiler configuration");
        let content = file_utils::read_to_string(&path)?;
        let config: Value = serde_json::from_str(&strip_json_comments(&content)).map_err(|e| {
            PkglensError::parse_error_with_source(
                path.clone(),
                format!("{} is not valid JSON", file_name),
                e,
            )
        })?;

        Ok(Some(self.summarize(file_name, &config)))
    }
}
