//! Trigger events that may start a dispatcher run.

use serde::Serialize;
use std::fmt;

use crate::domain::AppError;

/// Event kind, independent of its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    ManualCall,
    Push,
    PullRequest,
}

impl EventKind {
    pub fn label(&self) -> &'static str {
        match self {
            EventKind::ManualCall => "manual_call",
            EventKind::Push => "push",
            EventKind::PullRequest => "pull_request",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A trigger event with the changed paths used for filtering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TriggerEvent {
    ManualCall,
    Push { branch: String, changed_paths: Vec<String> },
    PullRequest { target_branch: String, changed_paths: Vec<String> },
}

impl TriggerEvent {
    pub fn manual() -> Self {
        TriggerEvent::ManualCall
    }

    pub fn push<I, S>(branch: impl Into<String>, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        TriggerEvent::Push { branch: branch.into(), changed_paths: normalize_paths(paths) }
    }

    pub fn pull_request<I, S>(target_branch: impl Into<String>, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        TriggerEvent::PullRequest {
            target_branch: target_branch.into(),
            changed_paths: normalize_paths(paths),
        }
    }

    pub fn kind(&self) -> EventKind {
        match self {
            TriggerEvent::ManualCall => EventKind::ManualCall,
            TriggerEvent::Push { .. } => EventKind::Push,
            TriggerEvent::PullRequest { .. } => EventKind::PullRequest,
        }
    }

    /// Branch the event is filtered on: the pushed branch or the PR base.
    pub fn branch(&self) -> Option<&str> {
        match self {
            TriggerEvent::ManualCall => None,
            TriggerEvent::Push { branch, .. } => Some(branch),
            TriggerEvent::PullRequest { target_branch, .. } => Some(target_branch),
        }
    }

    pub fn changed_paths(&self) -> &[String] {
        match self {
            TriggerEvent::ManualCall => &[],
            TriggerEvent::Push { changed_paths, .. }
            | TriggerEvent::PullRequest { changed_paths, .. } => changed_paths,
        }
    }

    /// Replace the changed path set, keeping kind and branch.
    pub fn with_changed_paths<I, S>(self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        match self {
            TriggerEvent::ManualCall => TriggerEvent::ManualCall,
            TriggerEvent::Push { branch, .. } => TriggerEvent::push(branch, paths),
            TriggerEvent::PullRequest { target_branch, .. } => {
                TriggerEvent::pull_request(target_branch, paths)
            }
        }
    }

    /// Build an event from the GitHub Actions runtime environment.
    ///
    /// `lookup` resolves variable names; changed paths are attached separately
    /// since Actions does not expose them as variables.
    pub fn from_github_env<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let event_name = lookup("GITHUB_EVENT_NAME").ok_or_else(|| {
            AppError::config_error("GITHUB_EVENT_NAME is not set; not running inside GitHub Actions?")
        })?;

        match event_name.as_str() {
            "workflow_dispatch" | "workflow_call" => Ok(TriggerEvent::ManualCall),
            "push" => {
                let branch = non_empty(lookup("GITHUB_REF_NAME")).ok_or_else(|| {
                    AppError::config_error("GITHUB_REF_NAME is required for push events")
                })?;
                Ok(TriggerEvent::Push { branch, changed_paths: Vec::new() })
            }
            "pull_request" | "pull_request_target" => {
                let target_branch = non_empty(lookup("GITHUB_BASE_REF")).ok_or_else(|| {
                    AppError::config_error("GITHUB_BASE_REF is required for pull request events")
                })?;
                Ok(TriggerEvent::PullRequest { target_branch, changed_paths: Vec::new() })
            }
            other => Err(AppError::UnsupportedEvent(other.to_string())),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Normalize to forward slashes without a leading `./`, dropping blanks.
pub fn normalize_paths<I, S>(paths: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    paths
        .into_iter()
        .filter_map(|p| {
            let normalized = p.as_ref().trim().replace('\\', "/");
            let normalized = normalized.trim_start_matches("./").to_string();
            if normalized.is_empty() { None } else { Some(normalized) }
        })
        .collect()
}
