//! API Facade for the application.
//!
//! This module exposes high-level functions that glue together context loading
//! and command execution. Each operation has an `_at` variant taking the
//! repository root explicitly.

use std::path::{Path, PathBuf};

use crate::adapters::dry_run::DryRunRunner;
use crate::adapters::git_command::GitCommandAdapter;
use crate::adapters::github_api_http::HttpWorkflowRunner;
use crate::adapters::github_command::GitHubCommandAdapter;
use crate::app::AppContext;
use crate::app::commands::{dispatch, init, plan, summary, trigger, validate};
use crate::app::config;
use crate::ports::WorkflowRunner;

pub use crate::app::commands::dispatch::{CancellationFlag, DispatchOptions};
pub use crate::app::commands::init::InitOptions;
pub use crate::app::commands::trigger::{TriggerOptions, TriggerSource};
pub use crate::app::commands::validate::{JobSummary, ValidationReport};
pub use crate::domain::{AppError, DispatchPlan, RunReport, RunnerKind, Settings};

/// Command-line overrides for `ci-dispatch.toml` values.
#[derive(Debug, Clone, Default)]
pub struct DispatchOverrides {
    pub runner: Option<RunnerKind>,
    pub git_ref: Option<String>,
    pub max_parallel: Option<usize>,
    pub cancel: CancellationFlag,
}

// =============================================================================
// Plan Command API
// =============================================================================

/// Plan the invocations for a trigger in the current directory.
pub fn plan(config: Option<&Path>, trigger: &TriggerOptions) -> Result<DispatchPlan, AppError> {
    plan_at(std::env::current_dir()?, config, trigger)
}

/// Plan the invocations for a trigger in the repository at `root`.
pub fn plan_at(
    root: impl Into<PathBuf>,
    config: Option<&Path>,
    trigger: &TriggerOptions,
) -> Result<DispatchPlan, AppError> {
    let ctx = AppContext::load(root.into(), config)?;
    plan_in(&ctx, trigger)
}

/// Load settings, dispatcher and catalog once for repeated use.
pub fn load_context(config: Option<&Path>) -> Result<AppContext, AppError> {
    AppContext::load(std::env::current_dir()?, config)
}

/// Plan the invocations for a trigger against an already loaded context.
pub fn plan_in(ctx: &AppContext, trigger: &TriggerOptions) -> Result<DispatchPlan, AppError> {
    let git = GitCommandAdapter::new(ctx.root().to_path_buf());
    let event = trigger::resolve(trigger, &git, |name| std::env::var(name).ok())?;
    plan::execute(ctx.dispatcher(), ctx.catalog(), &event)
}

// =============================================================================
// Dispatch Command API
// =============================================================================

/// Apply command-line overrides to loaded settings.
pub fn apply_overrides(
    mut settings: Settings,
    overrides: &DispatchOverrides,
) -> Result<Settings, AppError> {
    if let Some(runner) = overrides.runner {
        settings.dispatch.runner = runner;
    }
    if let Some(git_ref) = &overrides.git_ref {
        settings.dispatch.git_ref = git_ref.clone();
    }
    if let Some(max_parallel) = overrides.max_parallel {
        settings.dispatch.max_parallel = max_parallel;
    }
    settings.validate()?;
    Ok(settings)
}

/// Dispatch a plan from the current directory.
pub fn dispatch(
    config: Option<&Path>,
    plan: &DispatchPlan,
    overrides: &DispatchOverrides,
) -> Result<RunReport, AppError> {
    dispatch_at(std::env::current_dir()?, config, plan, overrides)
}

/// Dispatch a plan with the runner configured for the repository at `root`.
pub fn dispatch_at(
    root: impl Into<PathBuf>,
    config: Option<&Path>,
    plan: &DispatchPlan,
    overrides: &DispatchOverrides,
) -> Result<RunReport, AppError> {
    let settings = apply_overrides(config::load_settings(&root.into(), config)?, overrides)?;
    dispatch_with(&settings, plan, &overrides.cancel)
}

/// Dispatch a plan with already resolved settings.
///
/// Runner failures are recorded per invocation; only configuration problems
/// surface as errors.
pub fn dispatch_with(
    settings: &Settings,
    plan: &DispatchPlan,
    cancel: &CancellationFlag,
) -> Result<RunReport, AppError> {
    let runner = build_runner(settings)?;
    let options = DispatchOptions {
        git_ref: settings.dispatch.git_ref.clone(),
        max_parallel: settings.dispatch.max_parallel,
        cancel: cancel.clone(),
    };
    Ok(dispatch::execute(plan, runner.as_ref(), &options))
}

fn build_runner(settings: &Settings) -> Result<Box<dyn WorkflowRunner>, AppError> {
    tracing::debug!(runner = settings.dispatch.runner.label(), "building workflow runner");
    Ok(match settings.dispatch.runner {
        RunnerKind::Gh => Box::new(GitHubCommandAdapter::new(settings.api.repository.clone())),
        RunnerKind::Api => Box::new(HttpWorkflowRunner::from_env(&settings.api)?),
        RunnerKind::DryRun => Box::new(DryRunRunner::new()),
    })
}

/// Render the report and append it to `path`.
pub fn write_summary(report: &RunReport, path: &Path) -> Result<(), AppError> {
    summary::write(report, path)
}

/// Render the report as Markdown.
pub fn render_summary(report: &RunReport) -> Result<String, AppError> {
    summary::render(report)
}

// =============================================================================
// Validate / Init Command API
// =============================================================================

/// Validate the dispatcher in the current directory.
pub fn validate(config: Option<&Path>) -> Result<ValidationReport, AppError> {
    validate_at(std::env::current_dir()?, config)
}

pub fn validate_at(
    root: impl Into<PathBuf>,
    config: Option<&Path>,
) -> Result<ValidationReport, AppError> {
    let ctx = AppContext::load(root.into(), config)?;
    validate::execute(ctx.dispatcher(), ctx.catalog())
}

/// Write the scaffold into the current directory.
pub fn init(options: &InitOptions) -> Result<Vec<PathBuf>, AppError> {
    init_at(std::env::current_dir()?, options)
}

pub fn init_at(root: impl Into<PathBuf>, options: &InitOptions) -> Result<Vec<PathBuf>, AppError> {
    init::execute(&root.into(), options)
}
