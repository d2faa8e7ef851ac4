//! Embedded scaffold: the dispatcher workflow, the reusable workflows it
//! calls, and a default settings file.

use include_dir::{Dir, DirEntry, include_dir};
use minijinja::syntax::SyntaxConfig;
use minijinja::{Environment, UndefinedBehavior, context};
use std::collections::BTreeSet;
use std::path::Path;

use crate::domain::{AppError, WorkflowInterface, WorkflowReference};
use crate::ports::WorkflowCatalog;

static SCAFFOLD_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/assets/scaffold");

/// Plugin the built-in dispatcher checks.
pub const DEFAULT_PLUGIN: &str = "kedro-airflow";

/// Sibling plugin directories whose changes do not concern the default plugin.
pub const DEFAULT_IGNORED_PATHS: [&str; 3] =
    ["kedro-datasets/**", "kedro-docker/**", "kedro-telemetry/**"];

const DISPATCHER_TEMPLATE: &str = ".github/workflows/dispatcher.yml";
const WORKFLOWS_PREFIX: &str = ".github/workflows/";

/// A file to be written relative to the repository root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScaffoldFile {
    pub path: String,
    pub content: String,
}

/// Parameters for rendering the scaffold.
#[derive(Debug, Clone)]
pub struct ScaffoldParams {
    pub plugin: String,
    pub ignored_paths: Vec<String>,
}

impl Default for ScaffoldParams {
    fn default() -> Self {
        Self {
            plugin: DEFAULT_PLUGIN.to_string(),
            ignored_paths: DEFAULT_IGNORED_PATHS.iter().map(|p| p.to_string()).collect(),
        }
    }
}

/// Render every scaffold file. The dispatcher lands at `.github/workflows/<plugin>.yml`.
pub fn load_scaffold(params: &ScaffoldParams) -> Result<Vec<ScaffoldFile>, AppError> {
    let plugin = params.plugin.trim();
    if plugin.is_empty() || plugin.contains('/') || plugin.contains("..") {
        return Err(AppError::config_error(format!(
            "Invalid plugin name '{}': must be a single directory name",
            params.plugin
        )));
    }

    let context = context! {
        plugin => plugin,
        ignored_paths => params.ignored_paths,
    };

    let mut files = Vec::new();
    let mut seen = BTreeSet::new();
    collect_templates(&SCAFFOLD_DIR, SCAFFOLD_DIR.path(), &context, &mut files, &mut seen)?;

    let dispatcher_path = format!("{}{}.yml", WORKFLOWS_PREFIX, plugin);
    if dispatcher_path != DISPATCHER_TEMPLATE && seen.contains(&dispatcher_path) {
        return Err(AppError::config_error(format!(
            "Invalid plugin name '{}': the dispatcher would overwrite the scaffold file {}",
            plugin, dispatcher_path
        )));
    }
    for file in &mut files {
        if file.path == DISPATCHER_TEMPLATE {
            file.path = dispatcher_path.clone();
        }
    }
    files.sort_by(|a, b| a.path.cmp(&b.path));

    if files.is_empty() {
        return Err(AppError::config_error("Embedded scaffold assets are empty"));
    }
    Ok(files)
}

/// The built-in dispatcher definition for the default plugin.
pub fn builtin_dispatcher() -> Result<String, AppError> {
    let files = load_scaffold(&ScaffoldParams::default())?;
    let path = format!("{}{}.yml", WORKFLOWS_PREFIX, DEFAULT_PLUGIN);
    files
        .into_iter()
        .find(|file| file.path == path)
        .map(|file| file.content)
        .ok_or_else(|| AppError::config_error("Embedded dispatcher workflow is missing"))
}

fn collect_templates(
    dir: &Dir,
    base_path: &Path,
    context: &minijinja::Value,
    files: &mut Vec<ScaffoldFile>,
    seen: &mut BTreeSet<String>,
) -> Result<(), AppError> {
    for entry in dir.entries() {
        match entry {
            DirEntry::File(file) => {
                let content = file.contents_utf8().ok_or_else(|| {
                    AppError::config_error(format!(
                        "Scaffold file is not UTF-8: {}",
                        file.path().to_string_lossy()
                    ))
                })?;
                let relative_path = file.path().strip_prefix(base_path).map_err(|_| {
                    AppError::config_error(format!(
                        "Scaffold file has unexpected path: {}",
                        file.path().to_string_lossy()
                    ))
                })?;
                let relative_path = relative_path.to_string_lossy().replace('\\', "/");
                let rendered = render_template(content, context, &relative_path)?;
                if !seen.insert(relative_path.clone()) {
                    return Err(AppError::config_error(format!(
                        "Duplicate scaffold path: {}",
                        relative_path
                    )));
                }

                files.push(ScaffoldFile { path: relative_path, content: rendered });
            }
            DirEntry::Dir(subdir) => {
                collect_templates(subdir, base_path, context, files, seen)?;
            }
        }
    }
    Ok(())
}

/// Scaffold files use `[[[ ]]]`/`[% %]` so that `${{ }}` passes through untouched.
fn render_template(
    content: &str,
    context: &minijinja::Value,
    path: &str,
) -> Result<String, AppError> {
    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Strict);
    env.set_trim_blocks(true);
    env.set_keep_trailing_newline(true);
    let syntax = SyntaxConfig::builder()
        .block_delimiters("[%", "%]")
        .variable_delimiters("[[[", "]]]")
        .comment_delimiters("[#", "#]")
        .build()
        .map_err(|err| {
            AppError::config_error(format!("Failed to configure scaffold template syntax: {}", err))
        })?;
    env.set_syntax(syntax);

    env.add_template(path, content).map_err(|err| {
        AppError::config_error(format!("Failed to load scaffold template {}: {}", path, err))
    })?;
    env.get_template(path)
        .map_err(|err| {
            AppError::config_error(format!("Failed to access scaffold template {}: {}", path, err))
        })?
        .render(context)
        .map_err(|err| {
            AppError::config_error(format!("Failed to render scaffold template {}: {}", path, err))
        })
}

/// Catalog over the reusable workflows shipped in the scaffold.
#[derive(Debug, Clone)]
pub struct EmbeddedWorkflowCatalog {
    files: Vec<ScaffoldFile>,
}

impl EmbeddedWorkflowCatalog {
    pub fn new() -> Result<Self, AppError> {
        Ok(Self { files: load_scaffold(&ScaffoldParams::default())? })
    }
}

impl WorkflowCatalog for EmbeddedWorkflowCatalog {
    fn interface(
        &self,
        job: &str,
        reference: &WorkflowReference,
    ) -> Result<WorkflowInterface, AppError> {
        let path = format!("{}{}", WORKFLOWS_PREFIX, reference.file_name());
        let file = self.files.iter().find(|file| file.path == path).ok_or_else(|| {
            AppError::UndefinedWorkflow { job: job.to_string(), reference: reference.uses() }
        })?;
        WorkflowInterface::parse_yaml(reference.file_name(), &file.content)
    }

    fn describe(&self) -> String {
        "built-in workflows".to_string()
    }
}
