use std::path::{Path, PathBuf};

use crate::app::config;
use crate::domain::{AppError, Dispatcher, Settings};
use crate::ports::WorkflowCatalog;

/// Application context holding the loaded dispatcher and its dependencies.
pub struct AppContext {
    root: PathBuf,
    settings: Settings,
    dispatcher: Dispatcher,
    catalog: Box<dyn WorkflowCatalog>,
}

impl AppContext {
    /// Create a context from already loaded parts.
    pub fn new(
        root: PathBuf,
        settings: Settings,
        dispatcher: Dispatcher,
        catalog: Box<dyn WorkflowCatalog>,
    ) -> Self {
        Self { root, settings, dispatcher, catalog }
    }

    /// Load settings, dispatcher and catalog for the repository at `root`.
    pub fn load(root: PathBuf, settings_path: Option<&Path>) -> Result<Self, AppError> {
        let settings = config::load_settings(&root, settings_path)?;
        let dispatcher = config::load_dispatcher(&root, &settings)?;
        let catalog = config::load_catalog(&root, &settings)?;
        tracing::debug!(
            root = %root.display(),
            jobs = dispatcher.jobs.len(),
            catalog = %catalog.describe(),
            "loaded dispatcher"
        );
        Ok(Self::new(root, settings, dispatcher, catalog))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn catalog(&self) -> &dyn WorkflowCatalog {
        self.catalog.as_ref()
    }
}
