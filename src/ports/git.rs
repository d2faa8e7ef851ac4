use crate::domain::AppError;

pub trait GitPort {
    /// Paths changed between two revisions, old and new side of every delta.
    fn changed_paths(&self, base: &str, head: &str) -> Result<Vec<String>, AppError>;

    /// Get the current branch name.
    fn get_current_branch(&self) -> Result<String, AppError>;
}
