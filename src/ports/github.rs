use crate::domain::{AppError, Invocation};

/// Backend that starts reusable workflow runs.
///
/// Implementations are shared across dispatch worker threads.
pub trait WorkflowRunner: Send + Sync {
    /// Short backend name for logs and reports.
    fn name(&self) -> &'static str;

    /// Start one run of `invocation.workflow` on `git_ref` with the resolved inputs.
    fn dispatch(&self, invocation: &Invocation, git_ref: &str) -> Result<(), AppError>;
}
