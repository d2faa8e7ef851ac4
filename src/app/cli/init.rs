//! Init command implementation.

use clap::Args;

use crate::adapters::assets::{DEFAULT_IGNORED_PATHS, DEFAULT_PLUGIN, ScaffoldParams};
use crate::app::api::InitOptions;
use crate::domain::AppError;

#[derive(Args)]
pub struct InitArgs {
    /// Plugin directory the dispatcher checks
    #[arg(long, default_value = DEFAULT_PLUGIN)]
    plugin: String,
    /// Path glob whose changes alone do not trigger a run (repeatable; replaces the defaults)
    #[arg(long = "ignore-path", value_name = "GLOB")]
    ignore_paths: Vec<String>,
    /// Overwrite existing files
    #[arg(short, long)]
    force: bool,
}

pub fn run_init(args: InitArgs) -> Result<(), AppError> {
    let ignored_paths = if args.ignore_paths.is_empty() {
        DEFAULT_IGNORED_PATHS.iter().map(|p| p.to_string()).collect()
    } else {
        args.ignore_paths
    };
    let options = InitOptions {
        params: ScaffoldParams { plugin: args.plugin, ignored_paths },
        force: args.force,
    };

    let written = crate::app::api::init(&options)?;
    for path in &written {
        println!("  {}", path.display());
    }
    println!("✅ Initialized dispatcher for {} ({} file(s))", options.params.plugin, written.len());
    Ok(())
}
