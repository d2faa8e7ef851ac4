//! Plan command implementation.

use std::path::Path;

use clap::ValueEnum;

use crate::app::api::TriggerOptions;
use crate::domain::{AppError, DispatchPlan};

#[derive(Clone, Copy, ValueEnum)]
pub enum PlanFormat {
    Table,
    Json,
    Yaml,
}

pub fn run_plan(
    config: Option<&Path>,
    trigger: TriggerOptions,
    format: PlanFormat,
) -> Result<(), AppError> {
    let plan = crate::app::api::plan(config, &trigger)?;
    match format {
        PlanFormat::Table => print_table(&plan),
        PlanFormat::Json => {
            let json = serde_json::to_string_pretty(&plan).map_err(|err| {
                AppError::config_error(format!("Failed to serialize plan: {}", err))
            })?;
            println!("{}", json);
        }
        PlanFormat::Yaml => print!("{}", serde_yaml::to_string(&plan)?),
    }
    Ok(())
}

fn print_table(plan: &DispatchPlan) {
    if let Some(reason) = &plan.suppressed {
        println!("⏭️  Suppressed: {}", reason);
        return;
    }

    println!("Trigger: {}", plan.trigger.kind());
    for (job, count) in plan.job_counts() {
        println!("  {} ({} invocation(s))", job, count);
        for invocation in plan.invocations.iter().filter(|i| i.job == job) {
            let inputs: Vec<String> =
                invocation.inputs.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
            println!("    • {} {}", invocation.workflow.file_name(), inputs.join(" "));
        }
    }
    println!("✅ {} invocation(s) planned (digest {})", plan.len(), &plan.digest[..12]);
}
