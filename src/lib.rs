//! ci-dispatch: plan and dispatch reusable GitHub Actions workflows from a
//! dispatcher definition.

pub mod adapters;
pub mod app;
pub mod domain;
pub mod ports;

#[cfg(test)]
pub(crate) mod testing;

pub use app::api::{
    CancellationFlag, DispatchOverrides, InitOptions, JobSummary, TriggerOptions, TriggerSource,
    ValidationReport, dispatch, dispatch_at, init, init_at, plan, plan_at, render_summary,
    validate, validate_at, write_summary,
};
pub use domain::{
    AppError, DispatchPlan, Dispatcher, Invocation, InvocationOutcome, RunReport, RunStatus,
    RunnerKind, Settings, SuppressReason, TriggerEvent,
};
