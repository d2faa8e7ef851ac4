use std::sync::Mutex;

use crate::domain::AppError;
use crate::ports::GitPort;

pub struct FakeGit {
    pub branch: String,
    pub changed: Vec<String>,
    pub(crate) diffed: Mutex<Vec<(String, String)>>,
}

impl Default for FakeGit {
    fn default() -> Self {
        Self { branch: "main".to_string(), changed: Vec::new(), diffed: Mutex::new(Vec::new()) }
    }
}

impl FakeGit {
    /// `(base, head)` pairs passed to `changed_paths`.
    pub fn diffed(&self) -> Vec<(String, String)> {
        self.diffed.lock().unwrap().clone()
    }
}

impl GitPort for FakeGit {
    fn changed_paths(&self, base: &str, head: &str) -> Result<Vec<String>, AppError> {
        self.diffed.lock().unwrap().push((base.to_string(), head.to_string()));
        Ok(self.changed.clone())
    }

    fn get_current_branch(&self) -> Result<String, AppError> {
        Ok(self.branch.clone())
    }
}
