mod git;
mod github;
mod workflow_catalog;

pub use git::GitPort;
pub use github::WorkflowRunner;
pub use workflow_catalog::WorkflowCatalog;
