//! Dispatcher definition: trigger rules plus reusable-workflow jobs.
//!
//! Parsed from a GitHub Actions workflow file whose jobs only call reusable
//! workflows (`uses:` + `with:` + optional `strategy.matrix`).

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;
use std::fmt;

use crate::domain::invocation::Invocation;
use crate::domain::matrix::{Matrix, resolve_expressions};
use crate::domain::path_filter::{BranchFilter, PathFilter, PathFilterMode};
use crate::domain::trigger::{EventKind, TriggerEvent};
use crate::domain::workflow::{WorkflowInterface, WorkflowReference, scalar_text};
use crate::domain::AppError;

/// Branch and path filters attached to a push or pull request trigger.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    pub branches: Option<BranchFilter>,
    pub paths: Option<PathFilter>,
}

impl EventFilter {
    fn parse(event: &str, value: &Value) -> Result<Self, AppError> {
        let mapping = match value {
            Value::Null => return Ok(Self::default()),
            Value::Mapping(mapping) => mapping,
            _ => {
                return Err(AppError::config_error(format!(
                    "Trigger '{}' must be a mapping of filters",
                    event
                )));
            }
        };

        let mut filter = Self::default();
        let mut include_paths = None;
        let mut ignore_paths = None;

        for (key, value) in mapping {
            let key = key.as_str().unwrap_or_default();
            match key {
                "branches" => {
                    filter.branches = Some(BranchFilter::new(&string_list(event, key, value)?)?)
                }
                "paths" => include_paths = Some(string_list(event, key, value)?),
                "paths-ignore" => ignore_paths = Some(string_list(event, key, value)?),
                "types" => {
                    tracing::debug!(event, "activity type filter ignored");
                }
                other => {
                    return Err(AppError::config_error(format!(
                        "Unsupported filter '{}' on trigger '{}'",
                        other, event
                    )));
                }
            }
        }

        filter.paths = match (include_paths, ignore_paths) {
            (Some(_), Some(_)) => {
                return Err(AppError::config_error(format!(
                    "Trigger '{}' cannot declare both 'paths' and 'paths-ignore'",
                    event
                )));
            }
            (Some(include), None) => Some(PathFilter::include(&include)?),
            (None, Some(ignore)) => Some(PathFilter::ignore(&ignore)?),
            (None, None) => None,
        };

        Ok(filter)
    }
}

fn string_list(event: &str, key: &str, value: &Value) -> Result<Vec<String>, AppError> {
    let invalid =
        || AppError::config_error(format!("'{}' on trigger '{}' must be a list of strings", key, event));
    match value {
        Value::String(single) => Ok(vec![single.clone()]),
        Value::Sequence(items) => items
            .iter()
            .map(|item| item.as_str().map(str::to_string).ok_or_else(invalid))
            .collect(),
        _ => Err(invalid()),
    }
}

/// The `on:` section.
#[derive(Debug, Clone, Default)]
pub struct TriggerRules {
    pub manual: bool,
    pub push: Option<EventFilter>,
    pub pull_request: Option<EventFilter>,
}

impl TriggerRules {
    fn parse(on: &Value) -> Result<Self, AppError> {
        let mut rules = Self::default();
        match on {
            Value::String(event) => rules.declare(event, &Value::Null)?,
            Value::Sequence(events) => {
                for event in events {
                    let event = event.as_str().ok_or_else(|| {
                        AppError::config_error("Trigger list entries must be strings")
                    })?;
                    rules.declare(event, &Value::Null)?;
                }
            }
            Value::Mapping(events) => {
                for (event, filters) in events {
                    let event = event
                        .as_str()
                        .ok_or_else(|| AppError::config_error("Trigger names must be strings"))?;
                    rules.declare(event, filters)?;
                }
            }
            _ => return Err(AppError::config_error("'on' must be a string, list or mapping")),
        }
        Ok(rules)
    }

    fn declare(&mut self, event: &str, filters: &Value) -> Result<(), AppError> {
        match event {
            "workflow_call" | "workflow_dispatch" => self.manual = true,
            "push" => self.push = Some(EventFilter::parse(event, filters)?),
            "pull_request" | "pull_request_target" => {
                self.pull_request = Some(EventFilter::parse(event, filters)?)
            }
            other => tracing::debug!(event = other, "trigger not handled by the dispatcher"),
        }
        Ok(())
    }

    fn filter_for(&self, kind: EventKind) -> Option<&EventFilter> {
        match kind {
            EventKind::ManualCall => None,
            EventKind::Push => self.push.as_ref(),
            EventKind::PullRequest => self.pull_request.as_ref(),
        }
    }

    pub fn declares(&self, kind: EventKind) -> bool {
        match kind {
            EventKind::ManualCall => self.manual,
            EventKind::Push => self.push.is_some(),
            EventKind::PullRequest => self.pull_request.is_some(),
        }
    }
}

/// Why a trigger event did not start a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SuppressReason {
    EventNotDeclared { event: EventKind },
    BranchFiltered { branch: String },
    PathsIgnored,
    NoPathMatched,
}

impl fmt::Display for SuppressReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SuppressReason::EventNotDeclared { event } => {
                write!(f, "event '{}' is not a declared trigger", event)
            }
            SuppressReason::BranchFiltered { branch } => {
                write!(f, "branch '{}' does not match the branch filter", branch)
            }
            SuppressReason::PathsIgnored => write!(f, "every changed path matches paths-ignore"),
            SuppressReason::NoPathMatched => write!(f, "no changed path matches paths"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerVerdict {
    Accepted,
    Suppressed(SuppressReason),
}

impl TriggerVerdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, TriggerVerdict::Accepted)
    }
}

#[derive(Debug, Deserialize)]
struct RawDefinition {
    #[serde(default)]
    name: Option<String>,
    #[serde(rename = "on")]
    on: Value,
    jobs: Mapping,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct RawJob {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    uses: Option<String>,
    #[serde(default)]
    with: Mapping,
    #[serde(default)]
    strategy: Option<RawStrategy>,
    #[serde(default)]
    needs: Option<Value>,
    #[serde(default)]
    steps: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct RawStrategy {
    #[serde(default)]
    matrix: Option<Mapping>,
}

/// One job: a reusable workflow called once per matrix cell.
#[derive(Debug, Clone)]
pub struct JobSpec {
    pub id: String,
    pub name: Option<String>,
    pub workflow: WorkflowReference,
    pub matrix: Matrix,
    /// `with:` entries in declaration order, possibly holding expressions.
    pub with: Vec<(String, String)>,
}

impl JobSpec {
    fn parse(id: &str, value: Value) -> Result<Self, AppError> {
        let raw: RawJob = serde_yaml::from_value(value).map_err(|e| AppError::ParseError {
            what: format!("job '{}'", id),
            details: e.to_string(),
        })?;

        if raw.steps.is_some() {
            return Err(AppError::config_error(format!(
                "Job '{}' defines steps; only reusable workflow calls can be dispatched",
                id
            )));
        }
        if raw.needs.is_some() {
            return Err(AppError::config_error(format!(
                "Job '{}' declares 'needs'; dispatched jobs must be independent",
                id
            )));
        }

        let uses = raw.uses.ok_or_else(|| {
            AppError::config_error(format!("Job '{}' is missing 'uses'", id))
        })?;
        let workflow = WorkflowReference::parse(id, &uses)?;

        let matrix = match raw.strategy.and_then(|s| s.matrix) {
            Some(mapping) => Matrix::from_yaml(id, &mapping)?,
            None => Matrix::default(),
        };

        let mut with = Vec::new();
        for (key, value) in &raw.with {
            let key = key.as_str().ok_or_else(|| {
                AppError::config_error(format!("Job '{}': 'with' keys must be strings", id))
            })?;
            let value = scalar_text(value).ok_or_else(|| {
                AppError::config_error(format!(
                    "Job '{}': input '{}' must be a string, number or boolean",
                    id, key
                ))
            })?;
            with.push((key.to_string(), value));
        }

        Ok(Self { id: id.to_string(), name: raw.name, workflow, matrix, with })
    }

    /// Expand the matrix and resolve every input for each cell.
    pub fn expand(&self, interface: &WorkflowInterface) -> Result<Vec<Invocation>, AppError> {
        self.matrix.validate(&self.id)?;

        self.matrix
            .expand()
            .into_iter()
            .map(|cell| {
                let inputs = self
                    .with
                    .iter()
                    .map(|(name, template)| {
                        Ok((name.clone(), resolve_expressions(&self.id, template, &cell)?))
                    })
                    .collect::<Result<BTreeMap<_, _>, AppError>>()?;
                Invocation::new(&self.id, &self.workflow, cell, inputs, interface)
            })
            .collect()
    }
}

/// A parsed dispatcher workflow.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    pub name: Option<String>,
    pub triggers: TriggerRules,
    pub jobs: Vec<JobSpec>,
}

impl Dispatcher {
    pub fn parse_yaml(content: &str) -> Result<Self, AppError> {
        let raw: RawDefinition = serde_yaml::from_str(content)?;
        let triggers = TriggerRules::parse(&raw.on)?;

        let mut jobs = Vec::with_capacity(raw.jobs.len());
        for (id, value) in raw.jobs {
            let id = id
                .as_str()
                .ok_or_else(|| AppError::config_error("Job identifiers must be strings"))?
                .to_string();
            jobs.push(JobSpec::parse(&id, value)?);
        }

        if jobs.is_empty() {
            return Err(AppError::config_error("Dispatcher workflow declares no jobs"));
        }

        Ok(Self { name: raw.name, triggers, jobs })
    }

    /// Decide whether `event` starts a run.
    pub fn evaluate(&self, event: &TriggerEvent) -> TriggerVerdict {
        let kind = event.kind();
        if !self.triggers.declares(kind) {
            return TriggerVerdict::Suppressed(SuppressReason::EventNotDeclared { event: kind });
        }

        let Some(filter) = self.triggers.filter_for(kind) else {
            return TriggerVerdict::Accepted;
        };

        if let (Some(branches), Some(branch)) = (&filter.branches, event.branch())
            && !branches.accepts(branch)
        {
            return TriggerVerdict::Suppressed(SuppressReason::BranchFiltered {
                branch: branch.to_string(),
            });
        }

        if let Some(paths) = &filter.paths
            && paths.suppresses(event.changed_paths())
        {
            let reason = match paths.mode() {
                PathFilterMode::Ignore => SuppressReason::PathsIgnored,
                PathFilterMode::Include => SuppressReason::NoPathMatched,
            };
            return TriggerVerdict::Suppressed(reason);
        }

        TriggerVerdict::Accepted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEFINITION: &str = r#"
name: Run checks on kedro-airflow

on:
  workflow_call:
  push:
    branches:
      - main
    paths-ignore:
      - "kedro-datasets/**"
      - "kedro-docker/**"
      - "kedro-telemetry/**"
  pull_request:
    branches:
      - main
    paths-ignore:
      - "kedro-datasets/**"
      - "kedro-docker/**"
      - "kedro-telemetry/**"

jobs:
  unit-tests:
    strategy:
      matrix:
        os: [ ubuntu-latest, windows-latest ]
        python-version: [ "3.9", "3.10", "3.11", "3.12" ]
    uses: ./.github/workflows/unit-tests.yml
    with:
      plugin: kedro-airflow
      os: ${{ matrix.os }}
      python-version: ${{ matrix.python-version }}

  lint:
    uses: ./.github/workflows/lint.yml
    with:
      plugin: kedro-airflow
      os: ubuntu-latest
      python-version: "3.11"
"#;

    fn dispatcher() -> Dispatcher {
        Dispatcher::parse_yaml(DEFINITION).unwrap()
    }

    #[test]
    fn parses_jobs_in_declaration_order() {
        let dispatcher = dispatcher();
        let ids: Vec<&str> = dispatcher.jobs.iter().map(|j| j.id.as_str()).collect();
        assert_eq!(ids, vec!["unit-tests", "lint"]);
        assert_eq!(dispatcher.jobs[0].workflow.file_name(), "unit-tests.yml");
        assert_eq!(dispatcher.jobs[0].matrix.dimensions.len(), 2);
        assert!(dispatcher.triggers.manual);
    }

    #[test]
    fn manual_call_is_never_filtered() {
        assert_eq!(dispatcher().evaluate(&TriggerEvent::manual()), TriggerVerdict::Accepted);
    }

    #[test]
    fn push_to_other_branch_is_suppressed() {
        let verdict =
            dispatcher().evaluate(&TriggerEvent::push("develop", ["kedro-airflow/a.py"]));
        assert_eq!(
            verdict,
            TriggerVerdict::Suppressed(SuppressReason::BranchFiltered { branch: "develop".into() })
        );
    }

    #[test]
    fn ignored_paths_suppress_pull_request() {
        let verdict =
            dispatcher().evaluate(&TriggerEvent::pull_request("main", ["kedro-docker/Dockerfile"]));
        assert_eq!(verdict, TriggerVerdict::Suppressed(SuppressReason::PathsIgnored));
    }

    #[test]
    fn mixed_paths_are_accepted() {
        let verdict = dispatcher().evaluate(&TriggerEvent::push(
            "main",
            ["kedro-airflow/foo.py", "kedro-datasets/bar.py"],
        ));
        assert!(verdict.is_accepted());
    }

    #[test]
    fn undeclared_event_is_suppressed() {
        let dispatcher = Dispatcher::parse_yaml(
            "on: workflow_dispatch\njobs:\n  lint:\n    uses: ./.github/workflows/lint.yml\n",
        )
        .unwrap();
        let verdict = dispatcher.evaluate(&TriggerEvent::push("main", ["a.py"]));
        assert_eq!(
            verdict,
            TriggerVerdict::Suppressed(SuppressReason::EventNotDeclared { event: EventKind::Push })
        );
    }

    #[test]
    fn expands_matrix_inputs() {
        let dispatcher = dispatcher();
        let interface = WorkflowInterface::required(["plugin", "os", "python-version"]);
        let invocations = dispatcher.jobs[0].expand(&interface).unwrap();
        assert_eq!(invocations.len(), 8);
        assert_eq!(invocations[0].input("os"), Some("ubuntu-latest"));
        assert_eq!(invocations[0].input("python-version"), Some("3.9"));
        assert_eq!(invocations[7].input("os"), Some("windows-latest"));
        assert_eq!(invocations[7].input("python-version"), Some("3.12"));
        assert!(invocations.iter().all(|i| i.input("plugin") == Some("kedro-airflow")));
    }

    #[test]
    fn rejects_both_path_filters() {
        let yaml = r#"
on:
  push:
    paths: ["a/**"]
    paths-ignore: ["b/**"]
jobs:
  lint:
    uses: ./.github/workflows/lint.yml
"#;
        let err = Dispatcher::parse_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("both 'paths' and 'paths-ignore'"));
    }

    #[test]
    fn rejects_step_jobs_and_needs() {
        let steps = "on: push\njobs:\n  build:\n    runs-on: ubuntu-latest\n    steps: []\n";
        assert!(Dispatcher::parse_yaml(steps).unwrap_err().to_string().contains("steps"));

        let needs = r#"
on: push
jobs:
  a:
    uses: ./.github/workflows/a.yml
  b:
    needs: a
    uses: ./.github/workflows/b.yml
"#;
        assert!(Dispatcher::parse_yaml(needs).unwrap_err().to_string().contains("needs"));
    }

    #[test]
    fn empty_matrix_dimension_fails_at_load() {
        let yaml = r#"
on: push
jobs:
  unit-tests:
    strategy:
      matrix:
        os: []
    uses: ./.github/workflows/unit-tests.yml
"#;
        let err = Dispatcher::parse_yaml(yaml).unwrap_err();
        assert!(matches!(err, AppError::Matrix { .. }));
    }

    #[test]
    fn include_filter_without_match_is_suppressed() {
        let yaml = r#"
on:
  push:
    paths: ["kedro-airflow/**"]
jobs:
  lint:
    uses: ./.github/workflows/lint.yml
"#;
        let dispatcher = Dispatcher::parse_yaml(yaml).unwrap();
        let verdict = dispatcher.evaluate(&TriggerEvent::push("main", ["README.md"]));
        assert_eq!(verdict, TriggerVerdict::Suppressed(SuppressReason::NoPathMatched));
    }
}
