//! Static validation of a dispatcher definition.

use serde::Serialize;

use crate::app::commands::plan;
use crate::domain::{AppError, Dispatcher};
use crate::ports::WorkflowCatalog;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobSummary {
    pub job: String,
    pub workflow: String,
    pub invocations: usize,
}

/// Result of a successful validation.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub dispatcher: Option<String>,
    pub catalog: String,
    pub jobs: Vec<JobSummary>,
}

impl ValidationReport {
    pub fn total(&self) -> usize {
        self.jobs.iter().map(|job| job.invocations).sum()
    }
}

/// Resolve every job and count its invocations without evaluating a trigger.
pub fn execute<C>(dispatcher: &Dispatcher, catalog: &C) -> Result<ValidationReport, AppError>
where
    C: WorkflowCatalog + ?Sized,
{
    let invocations = plan::expand_all(dispatcher, catalog)?;

    let jobs = dispatcher
        .jobs
        .iter()
        .map(|job| JobSummary {
            job: job.id.clone(),
            workflow: job.workflow.uses(),
            invocations: invocations.iter().filter(|i| i.job == job.id).count(),
        })
        .collect();

    Ok(ValidationReport {
        dispatcher: dispatcher.name.clone(),
        catalog: catalog.describe(),
        jobs,
    })
}
