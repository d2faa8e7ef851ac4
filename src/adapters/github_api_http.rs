//! GitHub REST API workflow dispatch using reqwest.

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION, USER_AGENT};
use serde::Serialize;
use url::Url;

use crate::domain::{ApiSettings, AppError, Invocation};
use crate::ports::WorkflowRunner;

const GITHUB_API_VERSION: &str = "X-GitHub-Api-Version";
const MAX_RETRY_DELAY_MS: u64 = 30_000;

/// HTTP client for `POST /repos/{owner}/{repo}/actions/workflows/{file}/dispatches`.
#[derive(Clone)]
pub struct HttpWorkflowRunner {
    token: String,
    api_url: Url,
    repository: String,
    max_retries: u32,
    retry_delay_ms: u64,
    client: Client,
}

impl std::fmt::Debug for HttpWorkflowRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpWorkflowRunner")
            .field("api_url", &self.api_url)
            .field("repository", &self.repository)
            .field("max_retries", &self.max_retries)
            .field("retry_delay_ms", &self.retry_delay_ms)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

impl HttpWorkflowRunner {
    pub fn new(token: String, config: &ApiSettings) -> Result<Self, AppError> {
        let repository = config.repository.clone().ok_or_else(|| {
            AppError::config_error("api.repository must be set to use the api runner")
        })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            token,
            api_url: config.url.clone(),
            repository,
            max_retries: config.max_retries,
            retry_delay_ms: config.retry_delay_ms,
            client,
        })
    }

    /// Read the token from the variable named by `config.token_env`.
    pub fn from_env(config: &ApiSettings) -> Result<Self, AppError> {
        let token = std::env::var(&config.token_env).map_err(|_| {
            AppError::Configuration(format!("{} environment variable not set", config.token_env))
        })?;

        Self::new(token, config)
    }

    fn endpoint(&self, file_name: &str) -> Result<Url, AppError> {
        let path = format!("repos/{}/actions/workflows/{}/dispatches", self.repository, file_name);
        let mut base = self.api_url.clone();
        if !base.path().ends_with('/') {
            base.set_path(&format!("{}/", base.path()));
        }
        base.join(&path)
            .map_err(|e| AppError::Configuration(format!("Invalid dispatch URL: {}", e)))
    }
}

#[derive(Debug, Serialize)]
struct DispatchRequest<'a> {
    #[serde(rename = "ref")]
    git_ref: &'a str,
    inputs: &'a BTreeMap<String, String>,
}

impl WorkflowRunner for HttpWorkflowRunner {
    fn name(&self) -> &'static str {
        "api"
    }

    fn dispatch(&self, invocation: &Invocation, git_ref: &str) -> Result<(), AppError> {
        let url = self.endpoint(invocation.workflow.file_name())?;
        let request = DispatchRequest { git_ref, inputs: &invocation.inputs };

        let mut last_error = None;
        let max_attempts = self.max_retries.max(1);

        for attempt in 0..max_attempts {
            if attempt > 0 {
                std::thread::sleep(self.backoff(attempt));
                tracing::info!(
                    invocation = %invocation.display_name(),
                    attempt = attempt + 1,
                    max_attempts,
                    "retrying dispatch"
                );
            }

            match self.send_request(url.clone(), &request) {
                Ok(()) => return Ok(()),
                Err(e) => {
                    if Self::is_retryable(&e) {
                        last_error = Some(e);
                        continue;
                    }
                    return Err(e);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| AppError::Configuration("Request failed after all retries".into())))
    }
}

impl HttpWorkflowRunner {
    /// Delay before retry number `retry`: base, base*2, base*4, ... capped.
    fn backoff(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(16);
        let max_delay_ms = MAX_RETRY_DELAY_MS.max(self.retry_delay_ms);
        let delay_ms = self.retry_delay_ms.saturating_mul(1_u64 << exponent).min(max_delay_ms);
        Duration::from_millis(delay_ms)
    }

    fn send_request(&self, url: Url, request: &DispatchRequest<'_>) -> Result<(), AppError> {
        let response = self
            .client
            .post(url)
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
            .header(ACCEPT, "application/vnd.github+json")
            .header(USER_AGENT, concat!("ci-dispatch/", env!("CARGO_PKG_VERSION")))
            .header(GITHUB_API_VERSION, "2022-11-28")
            .json(request)
            .send()
            .map_err(|e| api_error(format!("HTTP request failed: {}", e)))?;

        let status = response.status();

        if status.is_success() {
            Ok(())
        } else if status.as_u16() == 429 {
            Err(api_error("Rate limited (429)".to_string()))
        } else if status.is_server_error() {
            Err(api_error(format!("Server error ({})", status.as_u16())))
        } else {
            let error_text = response.text().unwrap_or_else(|_| "Unknown error".to_string());
            Err(api_error(format!("API error ({}): {}", status.as_u16(), error_text.trim())))
        }
    }

    fn is_retryable(error: &AppError) -> bool {
        match error {
            AppError::ExternalToolError { error, .. } => {
                error.contains("429") || error.contains("Server error") || error.contains("timed out")
            }
            _ => false,
        }
    }
}

fn api_error(error: String) -> AppError {
    AppError::ExternalToolError { tool: "GitHub API".into(), error }
}
