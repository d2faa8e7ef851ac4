//! Turn a dispatcher definition and a trigger event into a dispatch plan.

use crate::domain::{AppError, Dispatcher, DispatchPlan, Invocation, TriggerEvent, TriggerVerdict};
use crate::ports::WorkflowCatalog;

/// Build the plan for `event`.
///
/// Every job is resolved against its workflow interface before the trigger
/// is evaluated, so a broken definition fails even when the event would be
/// suppressed.
pub fn execute<C>(
    dispatcher: &Dispatcher,
    catalog: &C,
    event: &TriggerEvent,
) -> Result<DispatchPlan, AppError>
where
    C: WorkflowCatalog + ?Sized,
{
    let invocations = expand_all(dispatcher, catalog)?;

    let verdict = dispatcher.evaluate(event);
    match &verdict {
        TriggerVerdict::Accepted => {
            tracing::info!(
                event = %event.kind(),
                invocations = invocations.len(),
                "trigger accepted"
            );
        }
        TriggerVerdict::Suppressed(reason) => {
            tracing::info!(event = %event.kind(), %reason, "trigger suppressed");
        }
    }

    Ok(DispatchPlan::new(dispatcher.name.clone(), event.clone(), verdict, invocations))
}

/// Expand every job in declaration order.
pub fn expand_all<C>(dispatcher: &Dispatcher, catalog: &C) -> Result<Vec<Invocation>, AppError>
where
    C: WorkflowCatalog + ?Sized,
{
    let mut invocations = Vec::new();
    for job in &dispatcher.jobs {
        let interface = catalog.interface(&job.id, &job.workflow)?;
        let expanded = job.expand(&interface)?;
        tracing::debug!(job = %job.id, workflow = %job.workflow, count = expanded.len(), "expanded job");
        invocations.extend(expanded);
    }
    Ok(invocations)
}
