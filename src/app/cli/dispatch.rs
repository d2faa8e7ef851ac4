//! Dispatch command implementation.

use std::io::{ErrorKind, IsTerminal};
use std::path::{Path, PathBuf};

use clap::{Args, ValueEnum};
use dialoguer::{Confirm, Error as DialoguerError};

use crate::app::api::{self, DispatchOverrides, TriggerOptions};
use crate::app::commands::summary::STEP_SUMMARY_ENV;
use crate::domain::{AppError, DispatchPlan, InvocationOutcome, RunReport, RunnerKind};

#[derive(Clone, Copy, ValueEnum)]
pub enum RunnerArg {
    Gh,
    Api,
    DryRun,
}

impl From<RunnerArg> for RunnerKind {
    fn from(value: RunnerArg) -> Self {
        match value {
            RunnerArg::Gh => RunnerKind::Gh,
            RunnerArg::Api => RunnerKind::Api,
            RunnerArg::DryRun => RunnerKind::DryRun,
        }
    }
}

#[derive(Args)]
pub struct DispatchArgs {
    /// Backend that starts the workflow runs
    #[arg(long, value_enum, conflicts_with = "dry_run")]
    runner: Option<RunnerArg>,
    /// Record the plan without calling a runner (same as --runner dry-run)
    #[arg(long)]
    dry_run: bool,
    /// Git ref the reusable workflows run on
    #[arg(long = "ref", value_name = "REF")]
    git_ref: Option<String>,
    /// Maximum number of concurrent dispatches
    #[arg(long, value_name = "N")]
    max_parallel: Option<usize>,
    /// Do not ask for confirmation
    #[arg(short, long)]
    yes: bool,
    /// Append a Markdown summary to this file (defaults to $GITHUB_STEP_SUMMARY)
    #[arg(long, value_name = "PATH")]
    summary: Option<PathBuf>,
    /// Print the run report as JSON
    #[arg(long)]
    json: bool,
}

pub fn run_dispatch(
    config: Option<&Path>,
    trigger: TriggerOptions,
    args: DispatchArgs,
) -> Result<i32, AppError> {
    let runner = if args.dry_run { Some(RunnerKind::DryRun) } else { args.runner.map(Into::into) };
    let overrides = DispatchOverrides {
        runner,
        git_ref: args.git_ref,
        max_parallel: args.max_parallel,
        ..DispatchOverrides::default()
    };

    let ctx = api::load_context(config)?;
    let settings = api::apply_overrides(ctx.settings().clone(), &overrides)?;
    let plan = api::plan_in(&ctx, &trigger)?;

    let needs_confirmation = !args.yes
        && !plan.is_empty()
        && settings.dispatch.runner != RunnerKind::DryRun
        && std::io::stdin().is_terminal();
    if needs_confirmation && !confirm(&plan, settings.dispatch.runner, &settings.dispatch.git_ref)? {
        return Err(AppError::Cancelled);
    }

    let report = api::dispatch_with(&settings, &plan, &overrides.cancel)?;

    if args.json {
        let json = serde_json::to_string_pretty(&report).map_err(|err| {
            AppError::config_error(format!("Failed to serialize run report: {}", err))
        })?;
        println!("{}", json);
    } else {
        print_report(&report);
    }

    let summary_path =
        args.summary.or_else(|| std::env::var_os(STEP_SUMMARY_ENV).map(PathBuf::from));
    if let Some(path) = summary_path {
        api::write_summary(&report, &path)?;
    }

    Ok(if report.is_success() { 0 } else { 1 })
}

fn confirm(plan: &DispatchPlan, runner: RunnerKind, git_ref: &str) -> Result<bool, AppError> {
    let prompt = format!(
        "Dispatch {} invocation(s) on '{}' with the {} runner?",
        plan.len(),
        git_ref,
        runner.label()
    );
    match Confirm::new().with_prompt(prompt).default(false).interact() {
        Ok(answer) => Ok(answer),
        Err(DialoguerError::IO(err)) if err.kind() == ErrorKind::Interrupted => Ok(false),
        Err(err) => Err(AppError::config_error(format!("Failed to read confirmation: {}", err))),
    }
}

fn print_report(report: &RunReport) {
    if let Some(reason) = &report.suppressed {
        println!("⏭️  Suppressed: {}", reason);
        return;
    }

    for entry in &report.invocations {
        match &entry.outcome {
            InvocationOutcome::Dispatched => {
                println!("  ✅ {}", entry.invocation.display_name())
            }
            InvocationOutcome::Failed { reason } => {
                println!("  ❌ {}: {}", entry.invocation.display_name(), reason)
            }
            InvocationOutcome::Cancelled => {
                println!("  ⏹️  {} (cancelled)", entry.invocation.display_name())
            }
        }
    }

    let dispatched = report.count("dispatched");
    let total = report.invocations.len();
    if report.is_success() {
        println!("✅ Dispatched {} of {} invocation(s) via {}", dispatched, total, report.runner);
    } else {
        println!(
            "❌ Dispatched {} of {} invocation(s) via {} ({} failed, {} cancelled)",
            dispatched,
            total,
            report.runner,
            report.count("failed"),
            report.count("cancelled")
        );
    }
}
