use crate::domain::AppError;
use crate::ports::GitPort;
use git2::{Delta, DiffOptions, Oid, Repository};
use std::collections::BTreeSet;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct GitCommandAdapter {
    root: PathBuf,
}

impl GitCommandAdapter {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn repo(&self) -> Result<Repository, AppError> {
        Repository::discover(&self.root).map_err(|e| AppError::GitError {
            command: "git2::Repository::discover".to_string(),
            details: e.to_string(),
        })
    }

    fn resolve_commit(repo: &Repository, rev: &str) -> Result<Oid, AppError> {
        let object = repo.revparse_single(rev).map_err(|e| AppError::GitError {
            command: format!("git2::Repository::revparse_single({})", rev),
            details: e.to_string(),
        })?;
        let commit = object.peel_to_commit().map_err(|e| AppError::GitError {
            command: format!("git2::Object::peel_to_commit({})", rev),
            details: e.to_string(),
        })?;
        Ok(commit.id())
    }
}

impl GitPort for GitCommandAdapter {
    /// Diffs from the merge base of `base` and `head`, like a pull request view.
    fn changed_paths(&self, base: &str, head: &str) -> Result<Vec<String>, AppError> {
        let repo = self.repo()?;
        let base_oid = Self::resolve_commit(&repo, base)?;
        let head_oid = Self::resolve_commit(&repo, head)?;
        let from_oid = repo.merge_base(base_oid, head_oid).unwrap_or(base_oid);

        let from_tree =
            repo.find_commit(from_oid).and_then(|c| c.tree()).map_err(|e| AppError::GitError {
                command: "git2::Repository::find_commit/tree".to_string(),
                details: e.to_string(),
            })?;
        let to_tree =
            repo.find_commit(head_oid).and_then(|c| c.tree()).map_err(|e| AppError::GitError {
                command: "git2::Repository::find_commit/tree".to_string(),
                details: e.to_string(),
            })?;

        let mut opts = DiffOptions::new();
        opts.include_typechange(true);

        let mut diff = repo
            .diff_tree_to_tree(Some(&from_tree), Some(&to_tree), Some(&mut opts))
            .map_err(|e| AppError::GitError {
                command: "git2::Repository::diff_tree_to_tree".to_string(),
                details: e.to_string(),
            })?;
        diff.find_similar(None).map_err(|e| AppError::GitError {
            command: "git2::Diff::find_similar".to_string(),
            details: e.to_string(),
        })?;

        let mut paths = BTreeSet::new();
        for delta in diff.deltas() {
            if delta.status() == Delta::Unmodified {
                continue;
            }
            for file in [delta.old_file(), delta.new_file()] {
                if let Some(path) = file.path() {
                    paths.insert(path.to_string_lossy().replace('\\', "/"));
                }
            }
        }

        Ok(paths.into_iter().collect())
    }

    fn get_current_branch(&self) -> Result<String, AppError> {
        let repo = self.repo()?;

        match repo.head() {
            Ok(head) => {
                let shorthand = head.shorthand().ok_or_else(|| AppError::GitError {
                    command: "git2::Reference::shorthand".to_string(),
                    details: "HEAD has no shorthand".to_string(),
                })?;
                Ok(shorthand.to_string())
            }
            Err(e) if e.code() == git2::ErrorCode::UnbornBranch => {
                let head_ref = repo.find_reference("HEAD").map_err(|e| AppError::GitError {
                    command: "git2::Repository::find_reference(HEAD)".to_string(),
                    details: e.to_string(),
                })?;

                if let Some(target) = head_ref.symbolic_target() {
                    Ok(target.strip_prefix("refs/heads/").unwrap_or(target).to_string())
                } else {
                    Err(AppError::GitError {
                        command: "get_current_branch".to_string(),
                        details: "HEAD is detached and unborn".to_string(),
                    })
                }
            }
            Err(e) => Err(AppError::GitError {
                command: "git2::Repository::head".to_string(),
                details: e.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use git2::Signature;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn commit_all(repo: &Repository, message: &str) -> Oid {
        let mut index = repo.index().unwrap();
        index.add_all(["*"], git2::IndexAddOption::DEFAULT, None).unwrap();
        index.update_all(["*"], None).unwrap();
        index.write().unwrap();
        let tree_id = index.write_tree().unwrap();
        let tree = repo.find_tree(tree_id).unwrap();
        let sig = Signature::now("Test", "test@example.com").unwrap();
        let parents = match repo.head() {
            Ok(head) => vec![head.peel_to_commit().unwrap()],
            Err(_) => Vec::new(),
        };
        let parent_refs: Vec<&git2::Commit> = parents.iter().collect();
        repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parent_refs).unwrap()
    }

    fn write(root: &Path, path: &str, content: &str) {
        let full = root.join(path);
        fs::create_dir_all(full.parent().unwrap()).unwrap();
        fs::write(full, content).unwrap();
    }

    #[test]
    fn lists_changed_paths_between_commits() {
        let dir = TempDir::new().unwrap();
        let repo = Repository::init(dir.path()).unwrap();

        write(dir.path(), "kedro-airflow/setup.py", "v1");
        write(dir.path(), "kedro-datasets/setup.py", "v1");
        let base = commit_all(&repo, "initial");

        write(dir.path(), "kedro-datasets/setup.py", "v2");
        write(dir.path(), "kedro-docker/Dockerfile", "FROM python");
        let head = commit_all(&repo, "change");

        let git = GitCommandAdapter::new(dir.path().to_path_buf());
        let paths = git.changed_paths(&base.to_string(), &head.to_string()).unwrap();
        assert_eq!(paths, vec!["kedro-datasets/setup.py", "kedro-docker/Dockerfile"]);
    }

    #[test]
    fn unknown_revision_is_git_error() {
        let dir = TempDir::new().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        write(dir.path(), "README.md", "x");
        commit_all(&repo, "initial");

        let git = GitCommandAdapter::new(dir.path().to_path_buf());
        let err = git.changed_paths("does-not-exist", "HEAD").unwrap_err();
        assert!(matches!(err, AppError::GitError { .. }));
    }
}
