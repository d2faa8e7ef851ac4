use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;
use tempfile::TempDir;

/// A `gh` stand-in that logs its arguments, one call per line.
///
/// Calls whose arguments mention `FAKE_GH_FAIL` exit non-zero.
pub struct FakeGh {
    pub root: TempDir,
    pub bin_dir: PathBuf,
    pub log_file: PathBuf,
}

impl FakeGh {
    pub fn new() -> Self {
        let root = TempDir::new().expect("Failed to create temp dir for fake gh");
        let bin_dir = root.path().join("bin");
        fs::create_dir_all(&bin_dir).expect("Failed to create bin dir");
        let log_file = root.path().join("gh.log");

        let gh_script_path = bin_dir.join("gh");
        let script_content = format!(
            r#"#!/bin/sh
echo "$@" >> "{}"

if [ -n "$FAKE_GH_FAIL" ]; then
    case "$*" in
        *"$FAKE_GH_FAIL"*)
            echo "HTTP 422: Workflow does not have 'workflow_dispatch' trigger" >&2
            exit 1
            ;;
    esac
fi

exit 0
"#,
            log_file.to_string_lossy()
        );

        fs::write(&gh_script_path, script_content).expect("Failed to write gh script");

        let mut perms =
            fs::metadata(&gh_script_path).expect("Failed to get metadata").permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&gh_script_path, perms).expect("Failed to set permissions");

        Self { root, bin_dir, log_file }
    }

    /// `PATH` with the fake first.
    pub fn path_env(&self) -> String {
        let existing = std::env::var("PATH").unwrap_or_default();
        format!("{}:{}", self.bin_dir.display(), existing)
    }

    pub fn get_log(&self) -> String {
        fs::read_to_string(&self.log_file).unwrap_or_default()
    }

    pub fn calls(&self) -> Vec<String> {
        self.get_log().lines().map(str::to_string).collect()
    }
}
