pub mod dispatcher;
pub mod error;
pub mod invocation;
pub mod matrix;
pub mod path_filter;
pub mod plan;
pub mod report;
pub mod settings;
pub mod trigger;
pub mod workflow;

pub use dispatcher::{Dispatcher, JobSpec, SuppressReason, TriggerVerdict};
pub use error::AppError;
pub use invocation::Invocation;
pub use matrix::{Matrix, MatrixCell, MatrixDimension};
pub use path_filter::{BranchFilter, PathFilter};
pub use plan::DispatchPlan;
pub use report::{InvocationOutcome, InvocationReport, RunReport, RunStatus};
pub use settings::{ApiSettings, DispatchSettings, RunnerKind, SETTINGS_FILE, Settings};
pub use trigger::{EventKind, TriggerEvent};
pub use workflow::{InputSpec, WorkflowInterface, WorkflowReference};
