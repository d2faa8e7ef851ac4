use std::collections::BTreeMap;

use crate::domain::{AppError, WorkflowInterface, WorkflowReference};
use crate::ports::WorkflowCatalog;

#[derive(Default)]
pub struct MemoryWorkflowCatalog {
    workflows: BTreeMap<String, WorkflowInterface>,
}

impl MemoryWorkflowCatalog {
    /// Workflows requiring `plugin`, `os` and `python-version`.
    pub fn standard<'a>(files: impl IntoIterator<Item = &'a str>) -> Self {
        let workflows = files
            .into_iter()
            .map(|file| {
                (file.to_string(), WorkflowInterface::required(["plugin", "os", "python-version"]))
            })
            .collect();
        Self { workflows }
    }
}

impl WorkflowCatalog for MemoryWorkflowCatalog {
    fn interface(
        &self,
        job: &str,
        reference: &WorkflowReference,
    ) -> Result<WorkflowInterface, AppError> {
        self.workflows.get(reference.file_name()).cloned().ok_or_else(|| {
            AppError::UndefinedWorkflow { job: job.to_string(), reference: reference.uses() }
        })
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
