use std::fs;
use std::path::PathBuf;

use crate::domain::{AppError, WorkflowInterface, WorkflowReference};
use crate::ports::WorkflowCatalog;

/// Catalog backed by a repository's workflows directory.
#[derive(Debug, Clone)]
pub struct FilesystemWorkflowCatalog {
    dir: PathBuf,
}

impl FilesystemWorkflowCatalog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl WorkflowCatalog for FilesystemWorkflowCatalog {
    fn interface(
        &self,
        job: &str,
        reference: &WorkflowReference,
    ) -> Result<WorkflowInterface, AppError> {
        let path = self.dir.join(reference.file_name());
        if !path.is_file() {
            return Err(AppError::UndefinedWorkflow {
                job: job.to_string(),
                reference: reference.uses(),
            });
        }
        let content = fs::read_to_string(&path)?;
        WorkflowInterface::parse_yaml(reference.file_name(), &content)
    }

    fn describe(&self) -> String {
        self.dir.display().to_string()
    }
}
