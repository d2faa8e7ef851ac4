//! Validate command implementation.

use std::path::Path;

use crate::domain::AppError;

pub fn run_validate(config: Option<&Path>) -> Result<(), AppError> {
    let report = crate::app::api::validate(config)?;

    let name = report.dispatcher.as_deref().unwrap_or("dispatcher");
    println!("{} (workflows: {})", name, report.catalog);
    for job in &report.jobs {
        println!("  {:<20} {:<40} {}", job.job, job.workflow, job.invocations);
    }
    println!("✅ {} job(s), {} invocation(s)", report.jobs.len(), report.total());
    Ok(())
}
