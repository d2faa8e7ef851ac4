//! Build a trigger event from command-line options.

use crate::domain::{AppError, TriggerEvent};
use crate::ports::GitPort;

/// Where the event kind comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TriggerSource {
    #[default]
    Manual,
    Push,
    PullRequest,
    /// `GITHUB_EVENT_NAME` and friends.
    GithubEnv,
}

#[derive(Debug, Clone, Default)]
pub struct TriggerOptions {
    pub source: TriggerSource,
    /// Pushed branch, or the pull request target.
    pub branch: Option<String>,
    pub changed: Vec<String>,
    /// Base revision for a git diff adding to `changed`.
    pub base: Option<String>,
    pub head: Option<String>,
}

/// Resolve `options` into an event. Git is only consulted when needed.
pub fn resolve<G, F>(options: &TriggerOptions, git: &G, lookup: F) -> Result<TriggerEvent, AppError>
where
    G: GitPort + ?Sized,
    F: Fn(&str) -> Option<String>,
{
    let event = match options.source {
        TriggerSource::Manual => {
            if options.branch.is_some() || !options.changed.is_empty() || options.base.is_some() {
                tracing::warn!("branch and changed paths are ignored for manual calls");
            }
            return Ok(TriggerEvent::manual());
        }
        TriggerSource::Push => {
            let branch = match &options.branch {
                Some(branch) => branch.clone(),
                None => git.get_current_branch()?,
            };
            TriggerEvent::push(branch, Vec::<String>::new())
        }
        TriggerSource::PullRequest => {
            let target = options.branch.clone().ok_or_else(|| {
                AppError::config_error("--branch (the target branch) is required for pull requests")
            })?;
            TriggerEvent::pull_request(target, Vec::<String>::new())
        }
        TriggerSource::GithubEnv => {
            let event = TriggerEvent::from_github_env(&lookup)?;
            match (&options.branch, event) {
                (Some(branch), TriggerEvent::Push { .. }) => {
                    TriggerEvent::push(branch.clone(), Vec::<String>::new())
                }
                (Some(branch), TriggerEvent::PullRequest { .. }) => {
                    TriggerEvent::pull_request(branch.clone(), Vec::<String>::new())
                }
                (_, event) => event,
            }
        }
    };

    if matches!(event, TriggerEvent::ManualCall) {
        return Ok(event);
    }

    let mut changed = options.changed.clone();
    if let Some(base) = &options.base {
        let head = options.head.as_deref().unwrap_or("HEAD");
        let diff = git.changed_paths(base, head)?;
        tracing::debug!(base = %base, head, count = diff.len(), "collected changed paths from git");
        changed.extend(diff);
    }
    if changed.is_empty() {
        tracing::warn!(event = %event.kind(), "no changed paths given; path filters will not suppress");
    }

    Ok(event.with_changed_paths(changed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeGit;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn manual_ignores_paths() {
        let options = TriggerOptions { changed: vec!["a.py".into()], ..TriggerOptions::default() };
        let event = resolve(&options, &FakeGit::default(), no_env).unwrap();
        assert_eq!(event, TriggerEvent::manual());
    }

    #[test]
    fn push_defaults_to_current_branch() {
        let git = FakeGit { branch: "feature".into(), ..FakeGit::default() };
        let options = TriggerOptions {
            source: TriggerSource::Push,
            changed: vec!["./kedro-airflow/setup.py".into()],
            ..TriggerOptions::default()
        };
        let event = resolve(&options, &git, no_env).unwrap();
        assert_eq!(event, TriggerEvent::push("feature", ["kedro-airflow/setup.py"]));
    }

    #[test]
    fn pull_request_requires_branch() {
        let options =
            TriggerOptions { source: TriggerSource::PullRequest, ..TriggerOptions::default() };
        assert!(resolve(&options, &FakeGit::default(), no_env).is_err());
    }

    #[test]
    fn base_adds_git_diff() {
        let git = FakeGit {
            changed: vec!["kedro-datasets/setup.py".into()],
            ..FakeGit::default()
        };
        let options = TriggerOptions {
            source: TriggerSource::PullRequest,
            branch: Some("main".into()),
            changed: vec!["kedro-airflow/README.md".into()],
            base: Some("origin/main".into()),
            head: None,
        };
        let event = resolve(&options, &git, no_env).unwrap();
        assert_eq!(
            event.changed_paths(),
            ["kedro-airflow/README.md".to_string(), "kedro-datasets/setup.py".to_string()]
        );
        assert_eq!(git.diffed(), vec![("origin/main".to_string(), "HEAD".to_string())]);
    }

    #[test]
    fn github_env_push() {
        let lookup = |name: &str| match name {
            "GITHUB_EVENT_NAME" => Some("push".to_string()),
            "GITHUB_REF_NAME" => Some("main".to_string()),
            _ => None,
        };
        let options = TriggerOptions {
            source: TriggerSource::GithubEnv,
            changed: vec!["kedro-docker/Dockerfile".into()],
            ..TriggerOptions::default()
        };
        let event = resolve(&options, &FakeGit::default(), lookup).unwrap();
        assert_eq!(event, TriggerEvent::push("main", ["kedro-docker/Dockerfile"]));
    }

    #[test]
    fn github_env_rejects_unknown_event() {
        let lookup = |name: &str| (name == "GITHUB_EVENT_NAME").then(|| "schedule".to_string());
        let options =
            TriggerOptions { source: TriggerSource::GithubEnv, ..TriggerOptions::default() };
        let err = resolve(&options, &FakeGit::default(), lookup).unwrap_err();
        assert!(matches!(err, AppError::UnsupportedEvent(ref e) if e == "schedule"));
    }
}
