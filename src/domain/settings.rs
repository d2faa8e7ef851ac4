//! Settings loaded from `ci-dispatch.toml`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use url::Url;

use crate::domain::AppError;

/// Settings file name, looked up at the repository root.
pub const SETTINGS_FILE: &str = "ci-dispatch.toml";

/// Backend that receives invocations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunnerKind {
    #[default]
    Gh,
    Api,
    DryRun,
}

impl RunnerKind {
    pub fn label(self) -> &'static str {
        match self {
            RunnerKind::Gh => "gh",
            RunnerKind::Api => "api",
            RunnerKind::DryRun => "dry-run",
        }
    }
}

impl FromStr for RunnerKind {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "gh" => Ok(RunnerKind::Gh),
            "api" => Ok(RunnerKind::Api),
            "dry-run" => Ok(RunnerKind::DryRun),
            other => Err(AppError::config_error(format!(
                "Unknown runner '{}': expected gh, api or dry-run",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    #[serde(default)]
    pub dispatch: DispatchSettings,
    #[serde(default)]
    pub api: ApiSettings,
}

impl Settings {
    pub fn parse_toml(content: &str) -> Result<Self, AppError> {
        let settings: Settings = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        self.dispatch.validate()?;
        self.api.validate()?;
        Ok(())
    }
}

/// Dispatcher source and execution settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DispatchSettings {
    /// Dispatcher workflow file. Absent means the built-in definition.
    #[serde(default)]
    pub workflow: Option<PathBuf>,
    /// Directory holding the reusable workflows. Absent means the built-in catalog.
    #[serde(default)]
    pub workflows_dir: Option<PathBuf>,
    /// Git ref the reusable workflows run on.
    #[serde(default = "default_ref", rename = "ref")]
    pub git_ref: String,
    #[serde(default)]
    pub runner: RunnerKind,
    /// Maximum number of invocations dispatched at once.
    #[serde(default = "default_max_parallel")]
    pub max_parallel: usize,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            workflow: None,
            workflows_dir: None,
            git_ref: default_ref(),
            runner: RunnerKind::default(),
            max_parallel: default_max_parallel(),
        }
    }
}

impl DispatchSettings {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.git_ref.trim().is_empty() {
            return Err(AppError::config_error("dispatch.ref must not be empty"));
        }
        if self.max_parallel == 0 {
            return Err(AppError::config_error("dispatch.max_parallel must be greater than 0"));
        }
        Ok(())
    }
}

fn default_ref() -> String {
    "main".to_string()
}

fn default_max_parallel() -> usize {
    4
}

/// GitHub REST API settings for the `api` runner.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiSettings {
    #[serde(default = "default_api_url")]
    pub url: Url,
    /// `owner/name` of the repository holding the reusable workflows.
    #[serde(default)]
    pub repository: Option<String>,
    /// Environment variable holding the API token.
    #[serde(default = "default_token_env")]
    pub token_env: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Attempts per invocation, including the first.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            url: default_api_url(),
            repository: None,
            token_env: default_token_env(),
            timeout_secs: default_timeout(),
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

impl ApiSettings {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.timeout_secs == 0 {
            return Err(AppError::config_error("api.timeout_secs must be greater than 0"));
        }
        if self.max_retries == 0 {
            return Err(AppError::config_error("api.max_retries must be greater than 0"));
        }
        if let Some(repository) = &self.repository {
            let valid = repository
                .split_once('/')
                .map(|(owner, name)| !owner.is_empty() && !name.is_empty() && !name.contains('/'))
                .unwrap_or(false);
            if !valid {
                return Err(AppError::config_error(format!(
                    "api.repository '{}' must be in owner/name form",
                    repository
                )));
            }
        }
        Ok(())
    }
}

fn default_api_url() -> Url {
    Url::parse("https://api.github.com").expect("Default API URL must be valid")
}

fn default_token_env() -> String {
    "GITHUB_TOKEN".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    1
}

fn default_retry_delay_ms() -> u64 {
    500
}
