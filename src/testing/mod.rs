mod fake_git;
mod fake_runner;
mod memory_catalog;

pub use fake_git::FakeGit;
pub use fake_runner::FakeWorkflowRunner;
pub use memory_catalog::MemoryWorkflowCatalog;
