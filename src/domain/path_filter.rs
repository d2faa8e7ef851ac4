//! Branch and path filters for push and pull request triggers.
//!
//! Glob semantics follow GitHub Actions filters: `*` stays within one path
//! segment, `**` spans segments, and `**` glued to other text (`**.md`,
//! `docs**`) is widened to whole segments. Patterns are applied in order; a
//! `!` pattern excludes what earlier patterns matched and the last matching
//! pattern decides.

use glob::{MatchOptions, Pattern};

use crate::domain::AppError;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

#[derive(Debug, Clone)]
struct GlobRule {
    negated: bool,
    alternatives: Vec<Pattern>,
}

#[derive(Debug, Clone)]
struct GlobSet {
    rules: Vec<GlobRule>,
}

impl GlobSet {
    fn compile(sources: &[String]) -> Result<Self, AppError> {
        let rules =
            sources.iter().map(|source| compile_rule(source)).collect::<Result<Vec<_>, _>>()?;
        if rules.first().is_some_and(|rule| rule.negated) {
            return Err(AppError::config_error(format!(
                "Invalid glob pattern '{}': a negated pattern must follow a positive one",
                sources[0]
            )));
        }
        Ok(Self { rules })
    }

    fn matches(&self, candidate: &str) -> bool {
        let mut matched = false;
        for rule in &self.rules {
            if rule.alternatives.iter().any(|p| p.matches_with(candidate, MATCH_OPTIONS)) {
                matched = !rule.negated;
            }
        }
        matched
    }
}

fn compile_rule(source: &str) -> Result<GlobRule, AppError> {
    let (negated, body) = match source.strip_prefix('!') {
        Some(rest) => (true, rest),
        None => (false, source),
    };
    if body.is_empty() {
        return Err(AppError::config_error(format!(
            "Invalid glob pattern '{}': empty pattern",
            source
        )));
    }

    let alternatives = widen_recursive_wildcards(body)
        .iter()
        .map(|pattern| {
            Pattern::new(pattern).map_err(|e| {
                AppError::config_error(format!("Invalid glob pattern '{}': {}", source, e.msg))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(GlobRule { negated, alternatives })
}

/// Rewrite `**` that shares a segment with other text into the forms the
/// `glob` crate accepts. A trailing `foo**` also yields `foo*` so that files
/// directly named `foo...` still match.
fn widen_recursive_wildcards(pattern: &str) -> Vec<String> {
    let segments: Vec<&str> = pattern.split('/').collect();
    let last = segments.len() - 1;
    let mut widened = Vec::with_capacity(segments.len());
    let mut trailing_prefix = None;

    for (index, segment) in segments.iter().enumerate() {
        if *segment == "**" || !segment.contains("**") || segment.contains("***") {
            widened.push(segment.to_string());
            continue;
        }

        let parts: Vec<&str> = segment.split("**").collect();
        let tail = parts.len() - 1;
        for (position, part) in parts.iter().enumerate() {
            if part.is_empty() {
                if position < tail {
                    widened.push("**".to_string());
                }
                continue;
            }
            let piece = match (position == 0, position == tail) {
                (true, _) => format!("{}*", part),
                (false, true) => format!("*{}", part),
                (false, false) => format!("*{}*", part),
            };
            widened.push(piece);
            if position < tail {
                widened.push("**".to_string());
            }
        }

        if index == last && tail == 1 && parts[tail].is_empty() {
            let mut prefix: Vec<String> = segments[..index].iter().map(|s| s.to_string()).collect();
            prefix.push(format!("{}*", segment.trim_end_matches('*')));
            trailing_prefix = Some(prefix.join("/"));
        }
    }

    let mut patterns = vec![widened.join("/")];
    patterns.extend(trailing_prefix);
    patterns
}

/// Whether a filter lists paths to ignore or paths to require.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathFilterMode {
    Ignore,
    Include,
}

/// A set of path globs applied to the changed files of an event.
#[derive(Debug, Clone)]
pub struct PathFilter {
    mode: PathFilterMode,
    globs: GlobSet,
}

impl PathFilter {
    pub fn ignore(patterns: &[String]) -> Result<Self, AppError> {
        Ok(Self { mode: PathFilterMode::Ignore, globs: GlobSet::compile(patterns)? })
    }

    pub fn include(patterns: &[String]) -> Result<Self, AppError> {
        Ok(Self { mode: PathFilterMode::Include, globs: GlobSet::compile(patterns)? })
    }

    pub fn mode(&self) -> PathFilterMode {
        self.mode
    }

    /// Returns true when the change set must not trigger a run.
    ///
    /// An empty change set is never suppressed.
    pub fn suppresses(&self, changed_paths: &[String]) -> bool {
        if changed_paths.is_empty() {
            return false;
        }
        match self.mode {
            PathFilterMode::Ignore => changed_paths.iter().all(|p| self.globs.matches(p)),
            PathFilterMode::Include => !changed_paths.iter().any(|p| self.globs.matches(p)),
        }
    }
}

/// Branch name globs (`branches:`).
#[derive(Debug, Clone)]
pub struct BranchFilter {
    globs: GlobSet,
}

impl BranchFilter {
    pub fn new(patterns: &[String]) -> Result<Self, AppError> {
        Ok(Self { globs: GlobSet::compile(patterns)? })
    }

    pub fn accepts(&self, branch: &str) -> bool {
        self.globs.matches(branch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn sibling_ignores() -> PathFilter {
        PathFilter::ignore(&strings(&[
            "kedro-datasets/**",
            "kedro-docker/**",
            "kedro-telemetry/**",
        ]))
        .unwrap()
    }

    #[test]
    fn suppresses_when_every_path_is_ignored() {
        let filter = sibling_ignores();
        assert!(filter.suppresses(&strings(&["kedro-datasets/setup.py"])));
        assert!(filter.suppresses(&strings(&[
            "kedro-datasets/kedro_datasets/pandas/csv_dataset.py",
            "kedro-docker/README.md",
        ])));
    }

    #[test]
    fn dispatches_when_any_path_is_not_ignored() {
        let filter = sibling_ignores();
        assert!(!filter.suppresses(&strings(&["kedro-airflow/foo.py", "kedro-datasets/bar.py"])));
        assert!(!filter.suppresses(&strings(&["README.md"])));
    }

    #[test]
    fn prefix_lookalikes_are_not_ignored() {
        let filter = sibling_ignores();
        assert!(!filter.suppresses(&strings(&["kedro-datasets-extra/setup.py"])));
    }

    #[test]
    fn empty_change_set_is_never_suppressed() {
        assert!(!sibling_ignores().suppresses(&[]));
        let include = PathFilter::include(&strings(&["kedro-airflow/**"])).unwrap();
        assert!(!include.suppresses(&[]));
    }

    #[test]
    fn include_mode_requires_a_match() {
        let filter = PathFilter::include(&strings(&["kedro-airflow/**"])).unwrap();
        assert!(filter.suppresses(&strings(&["kedro-docker/Dockerfile"])));
        assert!(!filter.suppresses(&strings(&["kedro-docker/Dockerfile", "kedro-airflow/a.py"])));
    }

    #[test]
    fn single_star_stays_within_segment() {
        let filter = PathFilter::ignore(&strings(&["docs/*"])).unwrap();
        assert!(filter.suppresses(&strings(&["docs/index.md"])));
        assert!(!filter.suppresses(&strings(&["docs/api/index.md"])));
    }

    #[test]
    fn branch_globs() {
        let filter = BranchFilter::new(&strings(&["main", "release/*"])).unwrap();
        assert!(filter.accepts("main"));
        assert!(filter.accepts("release/1.2"));
        assert!(!filter.accepts("feature/main"));
        assert!(!filter.accepts("release/1.2/hotfix"));
    }

    #[test]
    fn invalid_pattern_is_configuration_error() {
        let err = PathFilter::ignore(&strings(&["a/***"])).unwrap_err();
        assert!(matches!(err, AppError::Configuration(_)));
        assert!(err.to_string().contains("a/***"));
    }

    #[test]
    fn recursive_wildcard_glued_to_extension() {
        let filter = PathFilter::ignore(&strings(&["**.md"])).unwrap();
        assert!(filter.suppresses(&strings(&["README.md"])));
        assert!(filter.suppresses(&strings(&["kedro-airflow/docs/index.md", "CHANGELOG.md"])));
        assert!(!filter.suppresses(&strings(&["README.md", "kedro-airflow/setup.py"])));
    }

    #[test]
    fn recursive_wildcard_glued_to_prefix() {
        let filter = PathFilter::ignore(&strings(&["kedro-docker**"])).unwrap();
        assert!(filter.suppresses(&strings(&["kedro-docker/Dockerfile"])));
        assert!(filter.suppresses(&strings(&["kedro-docker-extra/a/b.py"])));
        assert!(filter.suppresses(&strings(&["kedro-docker.txt"])));
        assert!(!filter.suppresses(&strings(&["kedro-airflow/kedro-docker.py"])));
    }

    #[test]
    fn widens_glued_segments() {
        assert_eq!(widen_recursive_wildcards("**.md"), vec!["**/*.md"]);
        assert_eq!(widen_recursive_wildcards("docs/**"), vec!["docs/**"]);
        assert_eq!(widen_recursive_wildcards("foo**"), vec!["foo*/**", "foo*"]);
        assert_eq!(widen_recursive_wildcards("src/a**b"), vec!["src/a*/**/*b"]);
        assert_eq!(widen_recursive_wildcards("a**b**"), vec!["a*/**/*b*/**"]);
    }

    #[test]
    fn negated_pattern_reincludes_paths() {
        let filter =
            PathFilter::ignore(&strings(&["kedro-datasets/**", "!kedro-datasets/setup.py"]))
                .unwrap();
        assert!(filter.suppresses(&strings(&["kedro-datasets/README.md"])));
        assert!(!filter.suppresses(&strings(&["kedro-datasets/setup.py"])));
    }

    #[test]
    fn later_positive_pattern_wins_over_negation() {
        let filter = PathFilter::ignore(&strings(&["docs/**", "!docs/api/**", "docs/api/gen/**"]))
            .unwrap();
        assert!(filter.suppresses(&strings(&["docs/api/gen/x.md"])));
        assert!(!filter.suppresses(&strings(&["docs/api/x.md"])));
    }

    #[test]
    fn negated_branch_pattern() {
        let filter = BranchFilter::new(&strings(&["release/**", "!release/**-alpha"])).unwrap();
        assert!(filter.accepts("release/1.0"));
        assert!(!filter.accepts("release/1.0-alpha"));
    }

    #[test]
    fn leading_negation_is_rejected() {
        let err = PathFilter::ignore(&strings(&["!docs/**"])).unwrap_err();
        assert!(err.to_string().contains("must follow a positive one"));
        assert!(PathFilter::ignore(&strings(&["docs/**", "!"])).is_err());
    }
}
