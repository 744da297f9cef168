//! Error types for pkglens.
//!
//! This module defines the error type shared by every probe, the history store,
//! the configuration loader and the report writers. Each variant corresponds to
//! one failure mode so callers can react programmatically (the aggregator turns
//! probe errors into errored report sections, `main` prints suggestions for
//! fatal ones).

use std::fmt;
use std::io;
use std::path::PathBuf;

/// The main error type for pkglens operations.
#[derive(Debug)]
pub enum PkglensError {
    /// A JSON, JSONC or TOML input could not be parsed.
    ParseError {
        /// The file that failed to parse.
        file: Option<PathBuf>,
        /// Context about what was being parsed.
        context: String,
        /// The underlying error.
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// An external command could not be spawned or exited unsuccessfully.
    CommandError {
        /// The command line that was executed.
        command: String,
        /// The exit code, if the process ran to completion.
        status: Option<i32>,
        /// Captured standard error output, possibly empty.
        stderr: String,
    },

    /// An error occurred during a Git operation.
    GitError {
        /// Context about what Git operation was being performed.
        operation: String,
        /// The repository path, if known.
        repo_path: Option<PathBuf>,
        /// The underlying error.
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// An error occurred during file system operations.
    IoError {
        /// The operation being performed.
        operation: String,
        /// The path involved in the error.
        path: Option<PathBuf>,
        /// The underlying IO error.
        source: Option<io::Error>,
    },

    /// An error occurred while loading or parsing configuration.
    ConfigError {
        /// Description of the configuration issue.
        message: String,
        /// The config file path, if applicable.
        path: Option<PathBuf>,
        /// The underlying error.
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A probe could not produce its section.
    AnalysisError {
        /// The probe that failed.
        probe: String,
        /// Description of what went wrong.
        message: String,
        /// The underlying error.
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// An invalid argument or input.
    InvalidInput {
        /// Description of the invalid input.
        message: String,
        /// The argument or value that was invalid.
        argument: Option<String>,
    },
}

impl PkglensError {
    /// Creates a new `ParseError` with the given context.
    ///
    /// # Examples
    /// ```
    /// use pkglens_core::error::PkglensError;
    ///
    /// let err = PkglensError::parse_error("Failed to parse package.json");
    /// assert_eq!(err.name(), "ParseError");
    /// ```
    pub fn parse_error(context: impl Into<String>) -> Self {
        Self::ParseError {
            file: None,
            context: context.into(),
            source: None,
        }
    }

    /// Creates a new `ParseError` for a specific file, keeping the underlying error.
    pub fn parse_error_with_source(
        file: PathBuf,
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::ParseError {
            file: Some(file),
            context: context.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a new `CommandError`.
    ///
    /// # Arguments
    /// * `command` - The command line that was executed.
    /// * `status` - The exit code, `None` when the process could not be spawned or was killed.
    /// * `stderr` - Captured standard error output.
    pub fn command_error(
        command: impl Into<String>,
        status: Option<i32>,
        stderr: impl Into<String>,
    ) -> Self {
        Self::CommandError {
            command: command.into(),
            status,
            stderr: stderr.into(),
        }
    }

    /// Creates a new `GitError` with the given operation description.
    pub fn git_error(operation: impl Into<String>) -> Self {
        Self::GitError {
            operation: operation.into(),
            repo_path: None,
            source: None,
        }
    }

    /// Creates a new `GitError` with a repository path and the libgit2 error.
    pub fn git_error_with_repo(
        operation: impl Into<String>,
        repo_path: PathBuf,
        source: git2::Error,
    ) -> Self {
        Self::GitError {
            operation: operation.into(),
            repo_path: Some(repo_path),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a new `IoError` with the given operation description.
    pub fn io_error(operation: impl Into<String>) -> Self {
        Self::IoError {
            operation: operation.into(),
            path: None,
            source: None,
        }
    }

    /// Creates a new `IoError` with a path and underlying error.
    ///
    /// # Arguments
    /// * `operation` - A description of the IO operation being performed.
    /// * `path` - The path involved in the error.
    /// * `source` - The underlying IO error.
    pub fn io_error_with_source(
        operation: impl Into<String>,
        path: PathBuf,
        source: io::Error,
    ) -> Self {
        Self::IoError {
            operation: operation.into(),
            path: Some(path),
            source: Some(source),
        }
    }

    /// Creates a new `ConfigError` with the given message.
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
            path: None,
            source: None,
        }
    }

    /// Creates a new `ConfigError` with a file path.
    pub fn config_error_with_path(message: impl Into<String>, path: PathBuf) -> Self {
        Self::ConfigError {
            message: message.into(),
            path: Some(path),
            source: None,
        }
    }

    /// Creates a new `AnalysisError` for the given probe.
    ///
    /// Prefer the [`probe_error!`](crate::probe_error) macro inside probe implementations.
    pub fn analysis_error(probe: impl Into<String>, message: impl Into<String>) -> Self {
        Self::AnalysisError {
            probe: probe.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new `InvalidInput` error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
            argument: None,
        }
    }

    /// Creates a new `InvalidInput` error with an argument name.
    pub fn invalid_input_with_arg(message: impl Into<String>, argument: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
            argument: Some(argument.into()),
        }
    }

    /// Returns the name of the error variant.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ParseError { .. } => "ParseError",
            Self::CommandError { .. } => "CommandError",
            Self::GitError { .. } => "GitError",
            Self::IoError { .. } => "IoError",
            Self::ConfigError { .. } => "ConfigError",
            Self::AnalysisError { .. } => "AnalysisError",
            Self::InvalidInput { .. } => "InvalidInput",
        }
    }

    /// Returns suggested recovery actions for the error.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::ParseError { file, .. } => {
                let mut s = vec![
                    "Ensure the file contains valid JSON".to_string(),
                    "Check that the file is not truncated or corrupted".to_string(),
                ];
                if file.is_some() {
                    s.push("Validate the file with `npx tsc --showConfig` or a JSON linter".to_string());
                }
                s
            }
            Self::CommandError { command, .. } => {
                let mut s = vec![
                    "Verify npm is installed and on your PATH".to_string(),
                    format!("Try running `{}` manually in the package directory", command),
                ];
                if command.contains("build") {
                    s.push("Use --skip-build to analyze without building".to_string());
                }
                if command.contains("pack") {
                    s.push("Use --skip-pack to skip published size analysis".to_string());
                }
                s
            }
            Self::GitError { .. } => vec![
                "Ensure the path is a valid Git repository".to_string(),
                "Check that the repository has at least one commit".to_string(),
                "Check that you have permissions to access the repository".to_string(),
            ],
            Self::IoError { operation, .. } => {
                let mut s = vec![
                    "Check that the path exists and is accessible".to_string(),
                    "Verify you have the necessary permissions".to_string(),
                ];
                if operation.contains("write") || operation.contains("create") {
                    s.push("Ensure the output directory is writable".to_string());
                }
                s
            }
            Self::ConfigError { .. } => vec![
                "Check the configuration file syntax".to_string(),
                "Ensure the file is valid TOML format".to_string(),
                "Remove keys that are not recognized by pkglens".to_string(),
            ],
            Self::AnalysisError { probe, .. } => vec![
                format!("Ensure the inputs read by the '{}' probe are present", probe),
                "Re-run with --verbose for more detail".to_string(),
            ],
            Self::InvalidInput { .. } => vec![
                "Review the command-line arguments".to_string(),
                "Pass the path of a directory containing a package.json".to_string(),
            ],
        }
    }
}

impl fmt::Display for PkglensError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ParseError { file, context, .. } => {
                if let Some(file) = file {
                    write!(f, "Parse error in '{}': {}", file.display(), context)
                } else {
                    write!(f, "Parse error: {}", context)
                }
            }
            Self::CommandError {
                command,
                status,
                stderr,
            } => {
                match status {
                    Some(code) => write!(f, "Command '{}' exited with status {}", command, code)?,
                    None => write!(f, "Command '{}' could not be run", command)?,
                }
                let detail = stderr.trim();
                if !detail.is_empty() {
                    write!(f, ": {}", detail)?;
                }
                Ok(())
            }
            Self::GitError {
                operation,
                repo_path,
                source,
            } => {
                match repo_path {
                    Some(path) => write!(
                        f,
                        "Git error during '{}' at '{}'",
                        operation,
                        path.display()
                    )?,
                    None => write!(f, "Git error during '{}'", operation)?,
                }
                if let Some(source) = source {
                    write!(f, ": {}", source)?;
                }
                Ok(())
            }
            Self::IoError {
                operation,
                path,
                source,
            } => {
                match path {
                    Some(p) => write!(f, "IO error during '{}' at '{}'", operation, p.display())?,
                    None => write!(f, "IO error during '{}'", operation)?,
                }
                if let Some(source) = source {
                    write!(f, ": {}", source)?;
                }
                Ok(())
            }
            Self::ConfigError { message, path, .. } => {
                if let Some(p) = path {
                    write!(f, "Configuration error in '{}': {}", p.display(), message)
                } else {
                    write!(f, "Configuration error: {}", message)
                }
            }
            Self::AnalysisError { probe, message, .. } => {
                write!(f, "Analysis error in probe '{}': {}", probe, message)
            }
            Self::InvalidInput { message, argument } => {
                if let Some(arg) = argument {
                    write!(f, "Invalid input '{}': {}", arg, message)
                } else {
                    write!(f, "Invalid input: {}", message)
                }
            }
        }
    }
}

impl std::error::Error for PkglensError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ParseError { source, .. } => source.as_ref().map(|s| s.as_ref() as _),
            Self::GitError { source, .. } => source.as_ref().map(|s| s.as_ref() as _),
            Self::IoError { source, .. } => source.as_ref().map(|e| e as _),
            Self::ConfigError { source, .. } => source.as_ref().map(|s| s.as_ref() as _),
            Self::AnalysisError { source, .. } => source.as_ref().map(|s| s.as_ref() as _),
            Self::CommandError { .. } | Self::InvalidInput { .. } => None,
        }
    }
}

// Implement From conversions for common error types

impl From<io::Error> for PkglensError {
    fn from(err: io::Error) -> Self {
        Self::IoError {
            operation: "file operation".to_string(),
            path: None,
            source: Some(err),
        }
    }
}

impl From<toml::de::Error> for PkglensError {
    fn from(err: toml::de::Error) -> Self {
        Self::ConfigError {
            message: format!("Failed to parse TOML: {}", err),
            path: None,
            source: Some(Box::new(err)),
        }
    }
}

impl From<serde_json::Error> for PkglensError {
    fn from(err: serde_json::Error) -> Self {
        Self::ParseError {
            file: None,
            context: format!("Failed to parse/serialize JSON: {}", err),
            source: Some(Box::new(err)),
        }
    }
}

impl From<git2::Error> for PkglensError {
    fn from(err: git2::Error) -> Self {
        Self::GitError {
            operation: "git operation".to_string(),
            repo_path: None,
            source: Some(Box::new(err)),
        }
    }
}

impl From<walkdir::Error> for PkglensError {
    fn from(err: walkdir::Error) -> Self {
        let path = err.path().map(PathBuf::from);
        Self::IoError {
            operation: "directory traversal".to_string(),
            path,
            source: err.into_io_error(),
        }
    }
}

/// A type alias for `Result<T, PkglensError>`.
pub type Result<T> = std::result::Result<T, PkglensError>;
