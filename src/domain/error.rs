use std::io;

use thiserror::Error;

/// Library-wide error type for ci-dispatch operations.
#[derive(Debug, Error)]
pub enum AppError {
    /// Underlying I/O failure.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// Configuration or environment issue.
    #[error("{0}")]
    Configuration(String),

    /// A job references a workflow that is not defined in the catalog.
    #[error("Job '{job}' references undefined workflow '{reference}'")]
    UndefinedWorkflow { job: String, reference: String },

    /// A job matrix cannot be expanded.
    #[error("Invalid matrix for job '{job}': {reason}")]
    Matrix { job: String, reason: String },

    /// A resolved invocation does not satisfy its workflow interface.
    #[error("Invalid invocation of '{workflow}' from job '{job}': {reason}")]
    InvalidInvocation { job: String, workflow: String, reason: String },

    /// Unknown trigger event name.
    #[error("Unsupported trigger event '{0}'")]
    UnsupportedEvent(String),

    /// Dispatcher definition file missing.
    #[error("Dispatcher workflow not found: {0}")]
    WorkflowFileMissing(String),

    /// The run was cancelled before dispatch started.
    #[error("Dispatch cancelled")]
    Cancelled,

    /// Git execution failed.
    #[error("Git error running '{command}': {details}")]
    GitError { command: String, details: String },

    /// External tool execution failed.
    #[error("{tool} failed: {error}")]
    ExternalToolError { tool: String, error: String },

    /// Parse error.
    #[error("Failed to parse {what}: {details}")]
    ParseError { what: String, details: String },

    /// YAML parsing error.
    #[error("YAML parse error: {0}")]
    YamlParseError(#[from] serde_yaml::Error),

    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    TomlParseError(#[from] toml::de::Error),
}

impl AppError {
    pub fn config_error<S: Into<String>>(message: S) -> Self {
        AppError::Configuration(message.into())
    }

    pub fn matrix_error(job: impl Into<String>, reason: impl Into<String>) -> Self {
        AppError::Matrix { job: job.into(), reason: reason.into() }
    }
}
