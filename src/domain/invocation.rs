use serde::Serialize;
use std::collections::BTreeMap;

use crate::domain::matrix::MatrixCell;
use crate::domain::workflow::{WorkflowInterface, WorkflowReference};
use crate::domain::AppError;

/// A single call of a reusable workflow with fully resolved inputs.
///
/// Created once per matrix cell and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Invocation {
    pub job: String,
    pub workflow: WorkflowReference,
    pub cell: MatrixCell,
    pub inputs: BTreeMap<String, String>,
}

impl Invocation {
    /// Build an invocation, filling declared defaults and checking the interface.
    pub fn new(
        job: &str,
        workflow: &WorkflowReference,
        cell: MatrixCell,
        mut inputs: BTreeMap<String, String>,
        interface: &WorkflowInterface,
    ) -> Result<Self, AppError> {
        for (name, spec) in &interface.inputs {
            if let Some(default) = &spec.default
                && !inputs.contains_key(name)
            {
                inputs.insert(name.clone(), default.clone());
            }
        }

        let invocation = Self { job: job.to_string(), workflow: workflow.clone(), cell, inputs };
        invocation.validate(interface)?;
        Ok(invocation)
    }

    /// Check the inputs against `interface`: nothing undeclared, every
    /// required input present, no empty value.
    pub fn validate(&self, interface: &WorkflowInterface) -> Result<(), AppError> {
        let invalid = |reason: String| AppError::InvalidInvocation {
            job: self.job.clone(),
            workflow: self.workflow.file_name().to_string(),
            reason,
        };

        if let Some(unknown) =
            self.inputs.keys().find(|name| !interface.inputs.contains_key(*name))
        {
            return Err(invalid(format!("input '{}' is not declared by the workflow", unknown)));
        }

        if let Some((name, _)) = interface
            .inputs
            .iter()
            .find(|(name, spec)| spec.required && !self.inputs.contains_key(*name))
        {
            return Err(invalid(format!("required input '{}' is missing", name)));
        }

        if let Some((name, _)) = self.inputs.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(invalid(format!("input '{}' is empty", name)));
        }

        Ok(())
    }

    pub fn input(&self, name: &str) -> Option<&str> {
        self.inputs.get(name).map(String::as_str)
    }

    /// `job (os=..., python-version=...)` for logs and reports.
    pub fn display_name(&self) -> String {
        if self.cell.is_empty() {
            self.job.clone()
        } else {
            format!("{} ({})", self.job, self.cell.label())
        }
    }
}
