use std::sync::atomic::{AtomicUsize, Ordering};

use crate::app::commands::dispatch::CancellationFlag;
use crate::domain::{AppError, Invocation};
use crate::ports::WorkflowRunner;

/// Runner that fails every invocation of one job, or raises a cancellation
/// flag once a number of calls have gone through.
#[derive(Default)]
pub struct FakeWorkflowRunner {
    failing_job: Option<String>,
    cancel_after: Option<(usize, CancellationFlag)>,
    calls: AtomicUsize,
}

impl FakeWorkflowRunner {
    pub fn failing_job(job: &str) -> Self {
        Self { failing_job: Some(job.to_string()), ..Self::default() }
    }

    pub fn cancelling_after(calls: usize, flag: CancellationFlag) -> Self {
        Self { cancel_after: Some((calls, flag)), ..Self::default() }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl WorkflowRunner for FakeWorkflowRunner {
    fn name(&self) -> &'static str {
        "fake"
    }

    fn dispatch(&self, invocation: &Invocation, _git_ref: &str) -> Result<(), AppError> {
        let calls = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some((limit, flag)) = &self.cancel_after
            && calls >= *limit
        {
            flag.cancel();
        }
        if self.failing_job.as_deref() == Some(invocation.job.as_str()) {
            return Err(AppError::ExternalToolError {
                tool: "fake".to_string(),
                error: format!("{} rejected", invocation.workflow),
            });
        }
        Ok(())
    }
}
