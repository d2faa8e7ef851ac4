//! Reusable workflow references and their declared input interfaces.

use serde::Serialize;
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::fmt;

use crate::domain::AppError;

const LOCAL_WORKFLOWS_PREFIX: &str = ".github/workflows/";

/// A `uses:` reference to a reusable workflow in the same repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct WorkflowReference {
    file_name: String,
}

impl WorkflowReference {
    /// Parse `./.github/workflows/<file>` (or a bare `<file>`).
    ///
    /// Cross-repository references (`owner/repo/...@ref`) are rejected.
    pub fn parse(job: &str, uses: &str) -> Result<Self, AppError> {
        let trimmed = uses.trim();
        if trimmed.contains('@') {
            return Err(AppError::config_error(format!(
                "Job '{}': remote workflow reference '{}' is not supported",
                job, trimmed
            )));
        }

        let local = trimmed.trim_start_matches("./");
        let file_name = match local.strip_prefix(LOCAL_WORKFLOWS_PREFIX) {
            Some(rest) => rest,
            None if !local.contains('/') => local,
            None => {
                return Err(AppError::config_error(format!(
                    "Job '{}': workflow reference '{}' must point into {}",
                    job, trimmed, LOCAL_WORKFLOWS_PREFIX
                )));
            }
        };

        let is_yaml = file_name.ends_with(".yml") || file_name.ends_with(".yaml");
        if file_name.is_empty() || file_name.contains('/') || !is_yaml {
            return Err(AppError::config_error(format!(
                "Job '{}': invalid workflow reference '{}'",
                job, trimmed
            )));
        }

        Ok(Self { file_name: file_name.to_string() })
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Repository-relative path, as written in a `uses:` line.
    pub fn uses(&self) -> String {
        format!("./{}{}", LOCAL_WORKFLOWS_PREFIX, self.file_name)
    }
}

impl fmt::Display for WorkflowReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.file_name)
    }
}

/// One input declared under `on.workflow_call.inputs`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InputSpec {
    pub required: bool,
    pub default: Option<String>,
}

/// The inputs a reusable workflow accepts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WorkflowInterface {
    pub inputs: BTreeMap<String, InputSpec>,
}

impl WorkflowInterface {
    /// Interface requiring every named input.
    pub fn required<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let inputs = names
            .into_iter()
            .map(|name| (name.into(), InputSpec { required: true, default: None }))
            .collect();
        Self { inputs }
    }

    /// Parse the interface of a reusable workflow file.
    ///
    /// Fails when the file does not declare a `workflow_call` trigger.
    pub fn parse_yaml(file_name: &str, content: &str) -> Result<Self, AppError> {
        let document: Value = serde_yaml::from_str(content)?;
        let on = document.get("on").ok_or_else(|| {
            AppError::config_error(format!("Workflow '{}' has no 'on' section", file_name))
        })?;

        let declares_call = match on {
            Value::String(event) => event == "workflow_call",
            Value::Sequence(events) => events.iter().any(|e| e.as_str() == Some("workflow_call")),
            Value::Mapping(map) => map.contains_key("workflow_call"),
            _ => false,
        };
        if !declares_call {
            return Err(AppError::config_error(format!(
                "Workflow '{}' is not reusable (missing 'workflow_call' trigger)",
                file_name
            )));
        }

        let mut inputs = BTreeMap::new();
        let declared = on.get("workflow_call").and_then(|call| call.get("inputs"));
        if let Some(Value::Mapping(declared)) = declared {
            for (name, spec) in declared {
                let name = name.as_str().ok_or_else(|| {
                    AppError::config_error(format!(
                        "Workflow '{}' declares a non-string input name",
                        file_name
                    ))
                })?;
                let required = spec.get("required").and_then(Value::as_bool).unwrap_or(false);
                let default = spec.get("default").and_then(scalar_text);
                inputs.insert(name.to_string(), InputSpec { required, default });
            }
        }

        Ok(Self { inputs })
    }

    pub fn input_names(&self) -> impl Iterator<Item = &str> {
        self.inputs.keys().map(String::as_str)
    }
}

/// Text of a YAML scalar; `None` for null, sequences and mappings.
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
