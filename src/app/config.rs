//! Loading of settings, the dispatcher definition and the workflow catalog.

use std::fs;
use std::path::{Path, PathBuf};

use crate::adapters::assets::{EmbeddedWorkflowCatalog, builtin_dispatcher};
use crate::adapters::workflow_catalog_filesystem::FilesystemWorkflowCatalog;
use crate::domain::{AppError, Dispatcher, SETTINGS_FILE, Settings};
use crate::ports::WorkflowCatalog;

/// Load `ci-dispatch.toml`.
///
/// An explicit path must exist; otherwise the file at `root` is optional.
pub fn load_settings(root: &Path, explicit: Option<&Path>) -> Result<Settings, AppError> {
    let path = match explicit {
        Some(path) => {
            let path = resolve(root, path);
            if !path.is_file() {
                return Err(AppError::config_error(format!(
                    "Settings file not found: {}",
                    path.display()
                )));
            }
            path
        }
        None => {
            let path = root.join(SETTINGS_FILE);
            if !path.is_file() {
                tracing::debug!(root = %root.display(), "no settings file, using defaults");
                return Ok(Settings::default());
            }
            path
        }
    };

    tracing::debug!(path = %path.display(), "loading settings");
    let content = fs::read_to_string(&path)?;
    Settings::parse_toml(&content)
}

/// Load the configured dispatcher workflow, or the built-in one.
pub fn load_dispatcher(root: &Path, settings: &Settings) -> Result<Dispatcher, AppError> {
    match &settings.dispatch.workflow {
        Some(workflow) => {
            let path = resolve(root, workflow);
            if !path.is_file() {
                return Err(AppError::WorkflowFileMissing(path.display().to_string()));
            }
            tracing::debug!(path = %path.display(), "loading dispatcher workflow");
            let content = fs::read_to_string(&path)?;
            Dispatcher::parse_yaml(&content)
        }
        None => {
            tracing::debug!("using built-in dispatcher workflow");
            Dispatcher::parse_yaml(&builtin_dispatcher()?)
        }
    }
}

/// Pick the catalog: explicit directory, the dispatcher's own directory, or built-in.
pub fn load_catalog(root: &Path, settings: &Settings) -> Result<Box<dyn WorkflowCatalog>, AppError> {
    let dir = match (&settings.dispatch.workflows_dir, &settings.dispatch.workflow) {
        (Some(dir), _) => Some(resolve(root, dir)),
        (None, Some(workflow)) => resolve(root, workflow).parent().map(Path::to_path_buf),
        (None, None) => None,
    };

    match dir {
        Some(dir) => {
            if !dir.is_dir() {
                return Err(AppError::config_error(format!(
                    "Workflows directory not found: {}",
                    dir.display()
                )));
            }
            Ok(Box::new(FilesystemWorkflowCatalog::new(dir)))
        }
        None => Ok(Box::new(EmbeddedWorkflowCatalog::new()?)),
    }
}

fn resolve(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() { path.to_path_buf() } else { root.join(path) }
}
