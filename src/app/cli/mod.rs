//! CLI Adapter.

mod dispatch;
mod init;
mod plan;
mod validate;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::app::api::{TriggerOptions, TriggerSource};
use crate::app::logging;
use crate::domain::AppError;

#[derive(Parser)]
#[command(name = "ci-dispatch")]
#[command(version)]
#[command(
    about = "Plan and dispatch reusable GitHub Actions workflows from a dispatcher definition",
    long_about = None
)]
struct Cli {
    /// Settings file (defaults to ./ci-dispatch.toml when present)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the invocations a trigger event would dispatch
    #[clap(visible_alias = "p")]
    Plan {
        #[command(flatten)]
        trigger: TriggerArgs,
        /// Output format
        #[arg(long, value_enum, default_value_t = plan::PlanFormat::Table)]
        format: plan::PlanFormat,
    },
    /// Dispatch every invocation of the plan
    #[clap(visible_alias = "d")]
    Dispatch {
        #[command(flatten)]
        trigger: TriggerArgs,
        #[command(flatten)]
        options: dispatch::DispatchArgs,
    },
    /// Check the dispatcher definition against its workflows
    #[clap(visible_alias = "v")]
    Validate,
    /// Write a dispatcher workflow, reusable workflows and settings
    #[clap(visible_alias = "i")]
    Init(init::InitArgs),
}

#[derive(Clone, Copy, ValueEnum)]
enum EventArg {
    Manual,
    Push,
    PullRequest,
    GithubEnv,
}

/// Flags describing the trigger event.
#[derive(Args)]
struct TriggerArgs {
    /// Event kind to simulate
    #[arg(short, long, value_enum, default_value_t = EventArg::Manual)]
    event: EventArg,
    /// Pushed branch, or the pull request target branch
    #[arg(short, long)]
    branch: Option<String>,
    /// Changed path (repeatable)
    #[arg(short, long = "changed", value_name = "PATH")]
    changed: Vec<String>,
    /// Add paths changed since this revision (git diff from the merge base)
    #[arg(long, value_name = "REV")]
    base: Option<String>,
    /// Head revision for --base
    #[arg(long, value_name = "REV", requires = "base")]
    head: Option<String>,
}

impl TriggerArgs {
    fn into_options(self) -> TriggerOptions {
        let source = match self.event {
            EventArg::Manual => TriggerSource::Manual,
            EventArg::Push => TriggerSource::Push,
            EventArg::PullRequest => TriggerSource::PullRequest,
            EventArg::GithubEnv => TriggerSource::GithubEnv,
        };
        TriggerOptions {
            source,
            branch: self.branch,
            changed: self.changed,
            base: self.base,
            head: self.head,
        }
    }
}

/// Entry point for the CLI.
pub fn run() {
    let cli = Cli::parse();
    logging::init_tracing(cli.verbose);

    let config = cli.config.as_deref();
    let result: Result<i32, AppError> = match cli.command {
        Commands::Plan { trigger, format } => {
            plan::run_plan(config, trigger.into_options(), format).map(|_| 0)
        }
        Commands::Dispatch { trigger, options } => {
            dispatch::run_dispatch(config, trigger.into_options(), options)
        }
        Commands::Validate => validate::run_validate(config).map(|_| 0),
        Commands::Init(args) => init::run_init(args).map(|_| 0),
    };

    match result {
        Ok(exit_code) => {
            if exit_code != 0 {
                std::process::exit(exit_code);
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
