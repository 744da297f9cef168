//! External command execution.
//!
//! Probes never call [`std::process::Command`] directly; they describe the
//! command as a [`CommandSpec`] and hand it to a [`CommandRunner`]. The real
//! runner is [`SystemRunner`]; tests substitute scripted runners.

use crate::error::{PkglensError, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::instrument;

/// A command to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    pub envs: Vec<(String, String)>,
    /// Stream output to the terminal instead of capturing it.
    pub inherit_stdio: bool,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>, cwd: &Path) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: cwd.to_path_buf(),
            envs: Vec::new(),
            inherit_stdio: false,
        }
    }

    /// An `npm` invocation in `cwd`.
    pub fn npm<I, S>(cwd: &Path, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(npm_program(), cwd).args(args)
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    pub fn inherit_stdio(mut self) -> Self {
        self.inherit_stdio = true;
        self
    }

    /// The command line as a user would type it, e.g. `npm run build`.
    pub fn display(&self) -> String {
        let program = self.program.trim_end_matches(".cmd");
        if self.args.is_empty() {
            program.to_string()
        } else {
            format!("{} {}", program, self.args.join(" "))
        }
    }
}

/// What a finished command produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code; `None` if the process was terminated by a signal.
    pub status: Option<i32>,
    pub success: bool,
    /// Captured standard output; empty when stdio was inherited.
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// Converts an unsuccessful exit into a [`PkglensError::CommandError`].
    pub fn into_success(self, spec: &CommandSpec) -> Result<Self> {
        if self.success {
            Ok(self)
        } else {
            Err(PkglensError::command_error(
                spec.display(),
                self.status,
                self.stderr,
            ))
        }
    }
}

/// Executes external commands on behalf of probes.
pub trait CommandRunner {
    /// Runs the command to completion.
    ///
    /// # Errors
    ///
    /// Returns [`PkglensError::CommandError`] if the process could not be
    /// spawned. A non-zero exit is reported through [`CommandOutput::success`].
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput>;

    /// Runs the command and fails on a non-zero exit.
    fn run_checked(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        self.run(spec)?.into_success(spec)
    }
}

/// Runs commands with [`std::process::Command`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    #[instrument(level = "debug", skip(self), fields(command = %spec.display()))]
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        let mut command = Command::new(&spec.program);
        command
            .args(&spec.args)
            .current_dir(&spec.cwd)
            .envs(spec.envs.iter().map(|(k, v)| (k.as_str(), v.as_str())));

        if spec.inherit_stdio {
            let status = command
                .stdin(Stdio::null())
                .status()
                .map_err(|e| PkglensError::command_error(spec.display(), None, e.to_string()))?;
            tracing::debug!(status = ?status.code(), "command finished");
            return Ok(CommandOutput {
                status: status.code(),
                success: status.success(),
                stdout: String::new(),
                stderr: String::new(),
            });
        }

        let output = command
            .stdin(Stdio::null())
            .output()
            .map_err(|e| PkglensError::command_error(spec.display(), None, e.to_string()))?;

        tracing::debug!(
            status = ?output.status.code(),
            stdout_bytes = output.stdout.len(),
            stderr_bytes = output.stderr.len(),
            "command finished"
        );

        Ok(CommandOutput {
            status: output.status.code(),
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// The npm executable name for the current platform.
pub fn npm_program() -> &'static str {
    if cfg!(windows) { "npm.cmd" } else { "npm" }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    /// Replays canned outputs keyed by command line and records every call.
    #[derive(Default)]
    pub(crate) struct ScriptedRunner {
        responses: RefCell<Vec<(String, VecDeque<Result<CommandOutput>>)>>,
        pub(crate) calls: RefCell<Vec<CommandSpec>>,
    }

    impl ScriptedRunner {
        pub(crate) fn new() -> Self {
            Self::default()
        }

        /// Queues a successful response for a command line prefix.
        pub(crate) fn respond(self, command_prefix: &str, stdout: &str) -> Self {
            self.push(
                command_prefix,
                Ok(CommandOutput {
                    status: Some(0),
                    success: true,
                    stdout: stdout.to_string(),
                    stderr: String::new(),
                }),
            )
        }

        /// Queues a non-zero exit for a command line prefix.
        pub(crate) fn fail(self, command_prefix: &str, stderr: &str) -> Self {
            self.push(
                command_prefix,
                Ok(CommandOutput {
                    status: Some(1),
                    success: false,
                    stdout: String::new(),
                    stderr: stderr.to_string(),
                }),
            )
        }

        fn push(self, command_prefix: &str, response: Result<CommandOutput>) -> Self {
            {
                let mut responses = self.responses.borrow_mut();
                match responses.iter_mut().find(|(p, _)| p == command_prefix) {
                    Some((_, queue)) => queue.push_back(response),
                    None => responses.push((command_prefix.to_string(), VecDeque::from([response]))),
                }
            }
            self
        }

        pub(crate) fn commands(&self) -> Vec<String> {
            self.calls.borrow().iter().map(CommandSpec::display).collect()
        }
    }

    impl CommandRunner for ScriptedRunner {
        fn run(&self, spec: &CommandSpec) -> Result<CommandOutput> {
            self.calls.borrow_mut().push(spec.clone());
            let line = spec.display();
            let mut responses = self.responses.borrow_mut();
            let entry = responses
                .iter_mut()
                .filter(|(prefix, _)| line.starts_with(prefix.as_str()))
                .max_by_key(|(prefix, _)| prefix.len());
            match entry.and_then(|(_, queue)| queue.pop_front()) {
                Some(response) => response,
                None => Err(PkglensError::command_error(line, None, "command not scripted")),
            }
        }
    }

    #[test]
    fn test_command_spec_display_strips_windows_suffix() {
        let spec = CommandSpec::new("npm.cmd", Path::new("/pkg")).args(["run", "build"]);
        assert_eq!(spec.display(), "npm run build");
    }

    #[test]
    fn test_command_spec_builder_collects_env_and_stdio() {
        let spec = CommandSpec::npm(Path::new("/pkg"), ["run", "build"])
            .env("FORCE_COLOR", "1")
            .inherit_stdio();
        assert_eq!(spec.args, vec!["run".to_string(), "build".to_string()]);
        assert_eq!(spec.envs, vec![("FORCE_COLOR".to_string(), "1".to_string())]);
        assert!(spec.inherit_stdio);
    }

    #[test]
    fn test_into_success_rejects_failed_output() {
        let spec = CommandSpec::new("npm", Path::new("/pkg")).args(["pack"]);
        let failed = CommandOutput {
            status: Some(1),
            success: false,
            stdout: String::new(),
            stderr: "npm ERR! missing script".to_string(),
        };
        let err = failed.into_success(&spec).unwrap_err();
        assert!(matches!(err, PkglensError::CommandError { status: Some(1), .. }));
        assert!(err.to_string().contains("missing script"));
    }

    #[test]
    fn test_system_runner_reports_spawn_failure() {
        let dir = tempfile::tempdir().unwrap();
        let spec = CommandSpec::new("pkglens-definitely-not-a-real-binary", dir.path());
        let err = SystemRunner.run(&spec).unwrap_err();
        assert!(matches!(err, PkglensError::CommandError { status: None, .. }));
    }

    #[test]
    fn test_scripted_runner_prefers_longest_prefix() {
        let runner = ScriptedRunner::new()
            .respond("npm pack", "widget-1.0.0.tgz\n")
            .respond("npm pack --dry-run", "[]");
        let dry = CommandSpec::new("npm", Path::new("/pkg")).args(["pack", "--dry-run", "--json"]);
        assert_eq!(runner.run(&dry).unwrap().stdout, "[]");
        assert_eq!(runner.commands(), vec!["npm pack --dry-run --json".to_string()]);
    }
}
