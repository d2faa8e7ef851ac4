use std::process::Command;

use crate::domain::{AppError, Invocation};
use crate::ports::WorkflowRunner;

/// Dispatches through `gh workflow run`.
#[derive(Debug, Clone, Default)]
pub struct GitHubCommandAdapter {
    repository: Option<String>,
}

impl GitHubCommandAdapter {
    pub fn new(repository: Option<String>) -> Self {
        Self { repository }
    }

    fn build_args(&self, invocation: &Invocation, git_ref: &str) -> Vec<String> {
        let mut args = vec![
            "workflow".to_string(),
            "run".to_string(),
            invocation.workflow.file_name().to_string(),
            "--ref".to_string(),
            git_ref.to_string(),
        ];
        if let Some(repository) = &self.repository {
            args.push("--repo".to_string());
            args.push(repository.clone());
        }
        for (key, val) in &invocation.inputs {
            args.push("-f".to_string());
            args.push(format!("{}={}", key, val));
        }
        args
    }
}

impl WorkflowRunner for GitHubCommandAdapter {
    fn name(&self) -> &'static str {
        "gh"
    }

    fn dispatch(&self, invocation: &Invocation, git_ref: &str) -> Result<(), AppError> {
        let args = self.build_args(invocation, git_ref);

        let output = Command::new("gh").args(&args).output().map_err(|e| {
            AppError::ExternalToolError {
                tool: "gh".into(),
                error: format!("Failed to execute gh CLI: {}", e),
            }
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AppError::ExternalToolError {
                tool: "gh".into(),
                error: format!("Failed to dispatch workflow via gh CLI. Stderr:\n{}", stderr.trim()),
            });
        }

        Ok(())
    }
}
