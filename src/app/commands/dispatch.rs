//! Hand every invocation of a plan to a workflow runner.
//!
//! Invocations run on a bounded pool of scoped threads. A failing invocation
//! never stops the others; the run status is derived from all outcomes once
//! every invocation has finished.

use std::sync::{Arc, OnceLock};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;

use chrono::{SecondsFormat, Utc};

use crate::domain::{DispatchPlan, Invocation, InvocationOutcome, InvocationReport, RunReport};
use crate::ports::WorkflowRunner;

/// Shared flag that stops not-yet-started invocations.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone)]
pub struct DispatchOptions {
    pub git_ref: String,
    pub max_parallel: usize,
    pub cancel: CancellationFlag,
}

impl DispatchOptions {
    pub fn new(git_ref: impl Into<String>, max_parallel: usize) -> Self {
        Self { git_ref: git_ref.into(), max_parallel, cancel: CancellationFlag::new() }
    }
}

/// Dispatch the plan and collect one report per invocation, in plan order.
pub fn execute<R>(plan: &DispatchPlan, runner: &R, options: &DispatchOptions) -> RunReport
where
    R: WorkflowRunner + ?Sized,
{
    let started_at = timestamp();

    let invocations = if plan.is_suppressed() {
        tracing::info!(reason = ?plan.suppressed, "plan suppressed, nothing to dispatch");
        Vec::new()
    } else {
        run_all(plan, runner, options)
    };

    let status = RunReport::status_for(plan.is_suppressed(), &invocations);
    let report = RunReport {
        schema_version: 1,
        dispatcher: plan.dispatcher.clone(),
        plan_digest: plan.digest.clone(),
        git_ref: options.git_ref.clone(),
        runner: runner.name().to_string(),
        started_at,
        finished_at: timestamp(),
        suppressed: plan.suppressed.clone(),
        invocations,
        status,
    };

    tracing::info!(
        status = report.status.label(),
        dispatched = report.count("dispatched"),
        failed = report.count("failed"),
        cancelled = report.count("cancelled"),
        "dispatch finished"
    );
    report
}

fn run_all<R>(plan: &DispatchPlan, runner: &R, options: &DispatchOptions) -> Vec<InvocationReport>
where
    R: WorkflowRunner + ?Sized,
{
    let total = plan.invocations.len();
    let workers = options.max_parallel.clamp(1, total.max(1));
    let next = AtomicUsize::new(0);
    let slots: Vec<OnceLock<InvocationOutcome>> = (0..total).map(|_| OnceLock::new()).collect();
    let (next, slots) = (&next, &slots);

    thread::scope(|scope| {
        let handles: Vec<_> = (0..workers)
            .map(|_| {
                scope.spawn(move || {
                    loop {
                        let index = next.fetch_add(1, Ordering::SeqCst);
                        let Some(invocation) = plan.invocations.get(index) else {
                            break;
                        };
                        let outcome = if options.cancel.is_cancelled() {
                            InvocationOutcome::Cancelled
                        } else {
                            dispatch_one(runner, invocation, &options.git_ref)
                        };
                        let _ = slots[index].set(outcome);
                    }
                })
            })
            .collect();

        for handle in handles {
            if handle.join().is_err() {
                tracing::error!("dispatch worker panicked");
            }
        }
    });

    plan.invocations
        .iter()
        .zip(slots)
        .map(|(invocation, slot)| InvocationReport {
            invocation: invocation.clone(),
            outcome: slot.get().cloned().unwrap_or_else(|| InvocationOutcome::Failed {
                reason: "worker panicked".to_string(),
            }),
        })
        .collect()
}

fn dispatch_one<R>(runner: &R, invocation: &Invocation, git_ref: &str) -> InvocationOutcome
where
    R: WorkflowRunner + ?Sized,
{
    tracing::debug!(invocation = %invocation.display_name(), runner = runner.name(), "dispatching");
    match runner.dispatch(invocation, git_ref) {
        Ok(()) => {
            tracing::info!(invocation = %invocation.display_name(), "dispatched");
            InvocationOutcome::Dispatched
        }
        Err(err) => {
            tracing::warn!(invocation = %invocation.display_name(), error = %err, "dispatch failed");
            InvocationOutcome::Failed { reason: err.to_string() }
        }
    }
}

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::assets::{EmbeddedWorkflowCatalog, builtin_dispatcher};
    use crate::adapters::dry_run::DryRunRunner;
    use crate::app::commands::plan;
    use crate::domain::{Dispatcher, RunStatus, TriggerEvent};
    use crate::testing::FakeWorkflowRunner;

    fn builtin_plan(event: TriggerEvent) -> DispatchPlan {
        let dispatcher = Dispatcher::parse_yaml(&builtin_dispatcher().unwrap()).unwrap();
        let catalog = EmbeddedWorkflowCatalog::new().unwrap();
        plan::execute(&dispatcher, &catalog, &event).unwrap()
    }

    #[test]
    fn dispatches_every_invocation_once() {
        let plan = builtin_plan(TriggerEvent::manual());
        let runner = DryRunRunner::new();
        let report = execute(&plan, &runner, &DispatchOptions::new("main", 4));

        assert_eq!(report.status, RunStatus::Passed);
        assert_eq!(report.invocations.len(), 14);
        assert_eq!(report.count("dispatched"), 14);

        let recorded = runner.recorded();
        assert_eq!(recorded.len(), 14);
        for (invocation, _) in &recorded {
            let hits = recorded.iter().filter(|(other, _)| other == invocation).count();
            assert_eq!(hits, 1);
        }
        assert!(recorded.iter().all(|(_, git_ref)| git_ref == "main"));
    }

    #[test]
    fn reports_follow_plan_order() {
        let plan = builtin_plan(TriggerEvent::manual());
        let runner = DryRunRunner::new();
        let report = execute(&plan, &runner, &DispatchOptions::new("main", 3));

        let reported: Vec<_> = report.invocations.iter().map(|r| r.invocation.clone()).collect();
        assert_eq!(reported, plan.invocations);
    }

    #[test]
    fn one_failure_does_not_stop_others() {
        let plan = builtin_plan(TriggerEvent::manual());
        let runner = FakeWorkflowRunner::failing_job("lint");
        let report = execute(&plan, &runner, &DispatchOptions::new("main", 2));

        assert_eq!(report.status, RunStatus::Failed);
        assert_eq!(report.count("failed"), 1);
        assert_eq!(report.count("dispatched"), 13);
        assert_eq!(runner.calls(), 14);
        assert!(!report.is_success());
    }

    #[test]
    fn suppressed_plan_dispatches_nothing() {
        let plan = builtin_plan(TriggerEvent::push("main", ["kedro-telemetry/setup.py"]));
        let runner = DryRunRunner::new();
        let report = execute(&plan, &runner, &DispatchOptions::new("main", 4));

        assert_eq!(report.status, RunStatus::Suppressed);
        assert!(report.invocations.is_empty());
        assert!(runner.recorded().is_empty());
        assert!(report.is_success());
    }

    #[test]
    fn cancelled_before_start_marks_everything_cancelled() {
        let plan = builtin_plan(TriggerEvent::manual());
        let runner = DryRunRunner::new();
        let options = DispatchOptions::new("main", 4);
        options.cancel.cancel();

        let report = execute(&plan, &runner, &options);
        assert_eq!(report.count("cancelled"), 14);
        assert_eq!(report.status, RunStatus::Failed);
        assert!(runner.recorded().is_empty());
    }

    #[test]
    fn cancellation_mid_run_keeps_dispatched_invocations() {
        let plan = builtin_plan(TriggerEvent::manual());
        let options = DispatchOptions::new("main", 1);
        let runner = FakeWorkflowRunner::cancelling_after(1, options.cancel.clone());

        let report = execute(&plan, &runner, &options);
        assert_eq!(runner.calls(), 1);
        assert_eq!(report.count("dispatched"), 1);
        assert_eq!(report.count("cancelled"), 13);
        assert_eq!(report.invocations[0].outcome, InvocationOutcome::Dispatched);
        assert!(
            report.invocations[1..].iter().all(|r| r.outcome == InvocationOutcome::Cancelled)
        );
        assert_eq!(report.status, RunStatus::Failed);
    }

    #[test]
    fn single_worker_is_sequential() {
        let plan = builtin_plan(TriggerEvent::manual());
        let runner = DryRunRunner::new();
        execute(&plan, &runner, &DispatchOptions::new("release", 1));

        let order: Vec<_> = runner.recorded().into_iter().map(|(i, _)| i).collect();
        assert_eq!(order, plan.invocations);
    }
}
