//! Write the dispatcher scaffold into a repository.

use std::fs;
use std::path::{Path, PathBuf};

use crate::adapters::assets::{ScaffoldParams, load_scaffold};
use crate::domain::AppError;

#[derive(Debug, Clone, Default)]
pub struct InitOptions {
    pub params: ScaffoldParams,
    /// Overwrite files that already exist.
    pub force: bool,
}

/// Write every scaffold file under `root` and return the written paths.
///
/// Nothing is written when a target exists and `force` is off.
pub fn execute(root: &Path, options: &InitOptions) -> Result<Vec<PathBuf>, AppError> {
    let files = load_scaffold(&options.params)?;

    if !options.force {
        let existing: Vec<&str> = files
            .iter()
            .filter(|file| root.join(&file.path).exists())
            .map(|file| file.path.as_str())
            .collect();
        if !existing.is_empty() {
            return Err(AppError::config_error(format!(
                "Refusing to overwrite existing files (use --force): {}",
                existing.join(", ")
            )));
        }
    }

    let mut written = Vec::with_capacity(files.len());
    for file in files {
        let target = root.join(&file.path);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&target, &file.content)?;
        tracing::debug!(path = %target.display(), "wrote scaffold file");
        written.push(PathBuf::from(file.path));
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::config;
    use crate::app::commands::validate;
    use tempfile::TempDir;

    #[test]
    fn written_scaffold_loads_and_validates() {
        let dir = TempDir::new().unwrap();
        let written = execute(dir.path(), &InitOptions::default()).unwrap();
        assert_eq!(written.len(), 6);
        assert!(dir.path().join(".github/workflows/kedro-airflow.yml").is_file());

        let settings = config::load_settings(dir.path(), None).unwrap();
        let dispatcher = config::load_dispatcher(dir.path(), &settings).unwrap();
        let catalog = config::load_catalog(dir.path(), &settings).unwrap();
        let report = validate::execute(&dispatcher, catalog.as_ref()).unwrap();
        assert_eq!(report.total(), 14);
    }

    #[test]
    fn refuses_to_overwrite_without_force() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("ci-dispatch.toml"), "# mine\n").unwrap();

        let err = execute(dir.path(), &InitOptions::default()).unwrap_err();
        assert!(err.to_string().contains("ci-dispatch.toml"));
        assert!(!dir.path().join(".github").exists());
        assert_eq!(fs::read_to_string(dir.path().join("ci-dispatch.toml")).unwrap(), "# mine\n");

        let options = InitOptions { force: true, ..InitOptions::default() };
        execute(dir.path(), &options).unwrap();
        assert!(
            fs::read_to_string(dir.path().join("ci-dispatch.toml")).unwrap().contains("[dispatch]")
        );
    }
}
