//! Workspace enumeration with glob exclusions and a size ceiling

use glob::{MatchOptions, Pattern};
use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::error::{EngineResult, RewindError};

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

#[derive(Debug, Clone)]
struct ExcludeRule {
    /// Pattern as configured
    full: Pattern,
    /// `foo/**` also prunes the directory `foo` itself
    dir: Option<Pattern>,
    /// Patterns without a separator match any single path component
    component: bool,
}

/// Glob matcher evaluated against paths relative to the workspace root
#[derive(Debug, Clone, Default)]
pub struct ExclusionMatcher {
    rules: Vec<ExcludeRule>,
}

impl ExclusionMatcher {
    /// Compile a set of glob patterns
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> EngineResult<Self> {
        let mut matcher = Self::default();
        for pattern in patterns {
            matcher.add(pattern.as_ref())?;
        }
        Ok(matcher)
    }

    /// Add one more pattern
    pub fn add(&mut self, pattern: &str) -> EngineResult<()> {
        let trimmed = pattern.trim_start_matches("./").trim_end_matches('/');
        let dir = match trimmed.strip_suffix("/**") {
            Some(prefix) if !prefix.is_empty() => Some(Pattern::new(prefix)?),
            _ => None,
        };
        self.rules.push(ExcludeRule {
            full: Pattern::new(trimmed)?,
            dir,
            component: !trimmed.contains('/'),
        });
        Ok(())
    }

    /// Number of compiled patterns
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    fn component_matches(rule: &ExcludeRule, relative: &Path) -> bool {
        rule.component
            && relative.components().any(|c| match c {
                Component::Normal(name) => name
                    .to_str()
                    .is_some_and(|n| rule.full.matches_with(n, MATCH_OPTIONS)),
                _ => false,
            })
    }

    /// Whether a file at `relative` is excluded
    pub fn is_excluded(&self, relative: &Path) -> bool {
        self.rules.iter().any(|rule| {
            rule.full.matches_path_with(relative, MATCH_OPTIONS)
                || Self::component_matches(rule, relative)
                || relative.ancestors().skip(1).any(|dir| {
                    rule.dir
                        .as_ref()
                        .is_some_and(|p| p.matches_path_with(dir, MATCH_OPTIONS))
                })
        })
    }

    /// Whether the directory at `relative` should be pruned from the walk
    pub fn is_excluded_dir(&self, relative: &Path) -> bool {
        self.rules.iter().any(|rule| {
            rule.full.matches_path_with(relative, MATCH_OPTIONS)
                || Self::component_matches(rule, relative)
                || rule
                    .dir
                    .as_ref()
                    .is_some_and(|p| p.matches_path_with(relative, MATCH_OPTIONS))
        })
    }
}

/// A regular file found by the walker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkEntry {
    /// Absolute path
    pub path: PathBuf,
    /// Path relative to the workspace root
    pub relative: PathBuf,
    pub size: u64,
    /// Unix permission bits
    pub mode: Option<u32>,
}

/// Lazy, depth-first enumeration of the non-excluded, size-bounded files under
/// a root. Symlinks are not followed and not reported.
pub struct WorkspaceWalker {
    root: PathBuf,
    matcher: ExclusionMatcher,
    max_file_size: u64,
    stack: Vec<fs::ReadDir>,
    oversized: usize,
}

impl WorkspaceWalker {
    /// Start a walk. Fails only if `root` itself cannot be enumerated.
    pub fn new(
        root: impl Into<PathBuf>,
        matcher: ExclusionMatcher,
        max_file_size: u64,
    ) -> EngineResult<Self> {
        let root = root.into();
        let entries = fs::read_dir(&root).map_err(|e| {
            RewindError::io_at(format!("Failed to enumerate workspace root: {}", e), &root)
        })?;
        Ok(Self {
            root,
            matcher,
            max_file_size,
            stack: vec![entries],
            oversized: 0,
        })
    }

    /// Files skipped so far for exceeding the size ceiling
    pub fn oversized_count(&self) -> usize {
        self.oversized
    }

    fn mode_of(metadata: &fs::Metadata) -> Option<u32> {
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            Some(metadata.permissions().mode())
        }
        #[cfg(not(unix))]
        {
            let _ = metadata;
            None
        }
    }
}

impl Iterator for WorkspaceWalker {
    type Item = WalkEntry;

    fn next(&mut self) -> Option<WalkEntry> {
        loop {
            let next = self.stack.last_mut()?.next();
            let entry = match next {
                None => {
                    self.stack.pop();
                    continue;
                }
                Some(Err(e)) => {
                    tracing::warn!(error = %e, "Failed to read directory entry, skipping");
                    continue;
                }
                Some(Ok(entry)) => entry,
            };

            let path = entry.path();
            let Ok(relative) = path.strip_prefix(&self.root).map(Path::to_path_buf) else {
                continue;
            };
            let file_type = match entry.file_type() {
                Ok(ft) => ft,
                Err(e) => {
                    tracing::warn!(path = ?path, error = %e, "Failed to stat entry, skipping");
                    continue;
                }
            };

            if file_type.is_symlink() {
                tracing::debug!(path = ?relative, "Skipping symlink");
                continue;
            }

            if file_type.is_dir() {
                if self.matcher.is_excluded_dir(&relative) {
                    tracing::trace!(path = ?relative, "Excluded directory");
                    continue;
                }
                match fs::read_dir(&path) {
                    Ok(children) => self.stack.push(children),
                    Err(e) => {
                        tracing::warn!(path = ?path, error = %e, "Failed to read directory, skipping")
                    }
                }
                continue;
            }

            if !file_type.is_file() || self.matcher.is_excluded(&relative) {
                continue;
            }

            let metadata = match entry.metadata() {
                Ok(m) => m,
                Err(e) => {
                    tracing::warn!(path = ?path, error = %e, "Failed to read metadata, skipping");
                    continue;
                }
            };
            if metadata.len() > self.max_file_size {
                self.oversized += 1;
                tracing::warn!(
                    path = ?relative,
                    size = metadata.len(),
                    max = self.max_file_size,
                    "File exceeds size ceiling, skipping"
                );
                continue;
            }

            return Some(WalkEntry {
                mode: Self::mode_of(&metadata),
                size: metadata.len(),
                path,
                relative,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn walked(root: &Path, patterns: &[&str], max: u64) -> Vec<String> {
        let matcher = ExclusionMatcher::new(patterns).unwrap();
        let mut found: Vec<String> = WorkspaceWalker::new(root, matcher, max)
            .unwrap()
            .map(|e| e.relative.to_string_lossy().replace('\\', "/"))
            .collect();
        found.sort();
        found
    }

    #[test]
    fn test_matcher_directory_glob() {
        let matcher = ExclusionMatcher::new(&["dist/**"]).unwrap();
        assert!(matcher.is_excluded(Path::new("dist/out.js")));
        assert!(matcher.is_excluded(Path::new("dist/nested/deep.js")));
        assert!(matcher.is_excluded_dir(Path::new("dist")));
        assert!(!matcher.is_excluded(Path::new("src/dist.rs")));
        assert!(!matcher.is_excluded_dir(Path::new("src/dist")));
    }

    #[test]
    fn test_matcher_component_names() {
        let matcher = ExclusionMatcher::new(&["node_modules", "*.log"]).unwrap();
        assert!(matcher.is_excluded_dir(Path::new("web/node_modules")));
        assert!(matcher.is_excluded(Path::new("logs/app.log")));
        assert!(!matcher.is_excluded(Path::new("src/main.rs")));
    }

    #[test]
    fn test_matcher_rejects_bad_pattern() {
        assert!(ExclusionMatcher::new(&["a/***"]).is_err());
    }

    #[test]
    fn test_walk_honors_exclusions() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "a.txt", "1");
        write(temp.path(), "src/lib.rs", "pub fn f() {}");
        write(temp.path(), "dist/out.js", "bundle");
        write(temp.path(), ".git/HEAD", "ref: refs/heads/main");

        let files = walked(temp.path(), &["dist/**", ".git"], 1024);
        assert_eq!(files, vec!["a.txt", "src/lib.rs"]);
    }

    #[test]
    fn test_walk_skips_oversized_files() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "small.txt", "ok");
        write(temp.path(), "big.bin", &"x".repeat(64));

        let matcher = ExclusionMatcher::default();
        let mut walker = WorkspaceWalker::new(temp.path(), matcher, 16).unwrap();
        let files: Vec<_> = walker.by_ref().map(|e| e.relative).collect();
        assert_eq!(files, vec![PathBuf::from("small.txt")]);
        assert_eq!(walker.oversized_count(), 1);
    }

    #[test]
    fn test_walk_missing_root_fails() {
        let temp = TempDir::new().unwrap();
        let result = WorkspaceWalker::new(temp.path().join("nope"), ExclusionMatcher::default(), 1);
        assert!(result.is_err());
    }
}
