use crate::domain::{AppError, WorkflowInterface, WorkflowReference};

/// Lookup of reusable workflows by reference.
pub trait WorkflowCatalog {
    /// Declared interface of `reference`.
    ///
    /// Returns `AppError::UndefinedWorkflow` when the catalog has no such workflow.
    fn interface(&self, job: &str, reference: &WorkflowReference)
    -> Result<WorkflowInterface, AppError>;

    /// Human-readable origin, e.g. a directory path.
    fn describe(&self) -> String;
}
