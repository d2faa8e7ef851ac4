//! Markdown rendering of a run report for GitHub step summaries.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use minijinja::{Environment, context};
use serde::Serialize;

use crate::domain::{AppError, InvocationOutcome, RunReport};

const SUMMARY_TEMPLATE: &str = include_str!("../../assets/templates/summary.md.j2");

/// Environment variable GitHub Actions points at the step summary file.
pub const STEP_SUMMARY_ENV: &str = "GITHUB_STEP_SUMMARY";

#[derive(Debug, Serialize)]
struct Row {
    job: String,
    workflow: String,
    inputs: String,
    outcome: &'static str,
    reason: Option<String>,
}

pub fn render(report: &RunReport) -> Result<String, AppError> {
    let mut env = Environment::new();
    env.set_trim_blocks(true);
    env.add_template("summary.md", SUMMARY_TEMPLATE)
        .map_err(|err| AppError::config_error(format!("Failed to load summary template: {}", err)))?;

    let rows: Vec<Row> = report
        .invocations
        .iter()
        .map(|entry| Row {
            job: escape_cell(&entry.invocation.display_name()),
            workflow: entry.invocation.workflow.file_name().to_string(),
            inputs: escape_cell(
                &entry
                    .invocation
                    .inputs
                    .iter()
                    .map(|(name, value)| format!("{}={}", name, value))
                    .collect::<Vec<_>>()
                    .join(", "),
            ),
            outcome: entry.outcome.label(),
            reason: match &entry.outcome {
                InvocationOutcome::Failed { reason } => Some(escape_cell(reason)),
                _ => None,
            },
        })
        .collect();

    let title = match &report.dispatcher {
        Some(name) => name.clone(),
        None => "ci-dispatch".to_string(),
    };

    env.get_template("summary.md")
        .and_then(|template| {
            template.render(context! {
                title => &title,
                status => report.status.label(),
                git_ref => &report.git_ref,
                runner => &report.runner,
                digest => &report.plan_digest,
                started_at => &report.started_at,
                finished_at => &report.finished_at,
                suppressed => report.suppressed.as_ref().map(|reason| reason.to_string()),
                dispatched => report.count("dispatched"),
                failed => report.count("failed"),
                cancelled => report.count("cancelled"),
                total => report.invocations.len(),
                rows => &rows,
            })
        })
        .map_err(|err| AppError::config_error(format!("Failed to render summary: {}", err)))
}

/// Append the rendered summary to `path`, creating the file if needed.
pub fn write(report: &RunReport, path: &Path) -> Result<(), AppError> {
    let markdown = render(report)?;
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(markdown.as_bytes())?;
    if !markdown.ends_with('\n') {
        file.write_all(b"\n")?;
    }
    tracing::debug!(path = %path.display(), "wrote step summary");
    Ok(())
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}
