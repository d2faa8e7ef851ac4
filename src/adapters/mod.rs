pub mod assets;
pub mod dry_run;
pub mod git_command;
pub mod github_api_http;
pub mod github_command;
pub mod workflow_catalog_filesystem;
