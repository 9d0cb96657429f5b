//! Snapshot capture
//!
//! One full read pass over the workspace: walk, read, hash. The workspace is
//! never mutated. Per-file read failures are logged and the file is omitted.

use futures::stream::{self, StreamExt};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::git::{GitBackend, capture_git_state};
use super::types::{Checkpoint, CheckpointId, CheckpointMetadata, FileSnapshot, Trigger};
use super::walker::{ExclusionMatcher, WalkEntry, WorkspaceWalker};
use crate::error::{EngineResult, RewindError};

/// Inputs for a single capture
#[derive(Debug, Clone)]
pub struct CaptureOptions {
    pub label: Option<String>,
    pub session_id: String,
    pub trigger: Trigger,
    pub tool_name: Option<String>,
    pub exclude_patterns: Vec<String>,
    pub max_file_size: u64,
    pub capture_git_state: bool,
    pub created_by: String,
    /// Explicit parent; when `None` the engine links to the session's latest
    pub parent_id: Option<CheckpointId>,
}

impl CaptureOptions {
    /// Options with the given trigger and engine defaults for everything else
    pub fn new(session_id: impl Into<String>, trigger: Trigger) -> Self {
        Self {
            label: None,
            session_id: session_id.into(),
            trigger,
            tool_name: None,
            exclude_patterns: super::config::default_exclude_patterns(),
            max_file_size: super::config::DEFAULT_MAX_FILE_SIZE,
            capture_git_state: true,
            created_by: "rewind".to_string(),
            parent_id: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_tool(mut self, tool_name: impl Into<String>) -> Self {
        self.tool_name = Some(tool_name.into());
        self
    }

    pub fn with_exclude_patterns(mut self, patterns: Vec<String>) -> Self {
        self.exclude_patterns = patterns;
        self
    }

    pub fn with_max_file_size(mut self, size: u64) -> Self {
        self.max_file_size = size;
        self
    }

    pub fn with_created_by(mut self, created_by: impl Into<String>) -> Self {
        self.created_by = created_by.into();
        self
    }

    pub fn with_parent(mut self, parent_id: CheckpointId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    pub fn without_git_state(mut self) -> Self {
        self.capture_git_state = false;
        self
    }
}

/// Builds checkpoints from the workspace
pub struct SnapshotCapture {
    root: PathBuf,
    io_concurrency: usize,
    /// Always excluded, whatever the caller passes (the checkpoint store itself)
    forced_excludes: Vec<String>,
    git: Arc<dyn GitBackend>,
}

impl SnapshotCapture {
    pub fn new(root: impl Into<PathBuf>, git: Arc<dyn GitBackend>) -> Self {
        Self {
            root: root.into(),
            io_concurrency: super::config::DEFAULT_IO_CONCURRENCY,
            forced_excludes: Vec::new(),
            git,
        }
    }

    /// Bound the number of concurrent file reads
    pub fn with_io_concurrency(mut self, io_concurrency: usize) -> Self {
        self.io_concurrency = io_concurrency.max(1);
        self
    }

    /// Exclude a pattern on every capture
    pub fn with_forced_exclude(mut self, pattern: impl Into<String>) -> Self {
        self.forced_excludes.push(pattern.into());
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Compile the caller's patterns plus the forced ones
    pub fn matcher(&self, patterns: &[String]) -> EngineResult<ExclusionMatcher> {
        let mut matcher = ExclusionMatcher::new(patterns)?;
        for pattern in &self.forced_excludes {
            matcher.add(pattern)?;
        }
        Ok(matcher)
    }

    /// Build a checkpoint. Not persisted here.
    pub async fn create(&self, options: CaptureOptions) -> EngineResult<Checkpoint> {
        let matcher = self.matcher(&options.exclude_patterns)?;
        let files = self.scan(&matcher, options.max_file_size).await?;

        let mut metadata = CheckpointMetadata::new(options.trigger, options.created_by);
        metadata.tool_name = options.tool_name;

        let mut checkpoint = Checkpoint::new(options.session_id, metadata).with_files(files);
        if let Some(label) = options.label {
            checkpoint = checkpoint.with_label(label);
        }
        if let Some(parent) = options.parent_id {
            checkpoint = checkpoint.with_parent(parent);
        }
        if options.capture_git_state {
            if let Some(state) = capture_git_state(self.git.as_ref(), &self.root).await {
                checkpoint = checkpoint.with_git_state(state);
            }
        }

        tracing::debug!(
            checkpoint_id = %checkpoint.id,
            trigger = %checkpoint.metadata.trigger,
            files = checkpoint.file_count(),
            bytes = checkpoint.total_size(),
            "Captured workspace snapshot"
        );
        Ok(checkpoint)
    }

    /// Walk and read every tracked file, sorted by path.
    ///
    /// Reads fan out across `io_concurrency` tasks; sorting afterwards makes the
    /// result independent of completion order.
    pub async fn scan(
        &self,
        matcher: &ExclusionMatcher,
        max_file_size: u64,
    ) -> EngineResult<Vec<FileSnapshot>> {
        let root = self.root.clone();
        let matcher = matcher.clone();
        let entries: Vec<WalkEntry> = tokio::task::spawn_blocking(move || {
            WorkspaceWalker::new(root, matcher, max_file_size).map(|walker| walker.collect::<Vec<_>>())
        })
        .await??;

        let mut snapshots: Vec<FileSnapshot> = stream::iter(entries)
            .map(|entry| async move {
                let result = read_snapshot(&entry).await;
                (entry.relative, result)
            })
            .buffer_unordered(self.io_concurrency)
            .filter_map(|(relative, result)| async move {
                match result {
                    Ok(snapshot) => Some(snapshot),
                    Err(e) => {
                        tracing::warn!(path = ?relative, error = %e, "Failed to read file, omitting from snapshot");
                        None
                    }
                }
            })
            .collect()
            .await;

        snapshots.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(snapshots)
    }
}

async fn read_snapshot(entry: &WalkEntry) -> EngineResult<FileSnapshot> {
    let content = tokio::fs::read(&entry.path)
        .await
        .map_err(|e| RewindError::io_at(format!("Failed to read file: {}", e), &entry.path))?;
    let snapshot = FileSnapshot::new(&entry.path, content);
    Ok(match entry.mode {
        Some(mode) => snapshot.with_mode(mode),
        None => snapshot,
    })
}

#[cfg(test)]
mod tests {
    use super::super::git::fake::FakeGitBackend;
    use super::*;
    use tempfile::TempDir;

    fn capture_for(temp: &TempDir, git: FakeGitBackend) -> SnapshotCapture {
        SnapshotCapture::new(temp.path(), Arc::new(git)).with_io_concurrency(4)
    }

    fn setup() -> TempDir {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("src")).unwrap();
        std::fs::write(temp.path().join("src/main.rs"), "fn main() {}").unwrap();
        std::fs::write(temp.path().join("README.md"), "# demo").unwrap();
        std::fs::write(temp.path().join("logo.bin"), [0u8, 159, 146, 150]).unwrap();
        temp
    }

    #[tokio::test]
    async fn test_create_captures_every_file_sorted() {
        let temp = setup();
        let capture = capture_for(&temp, FakeGitBackend::default());

        let checkpoint = capture
            .create(CaptureOptions::new("s1", Trigger::Manual).with_label("first"))
            .await
            .unwrap();

        assert_eq!(checkpoint.file_count(), 3);
        assert_eq!(checkpoint.label.as_deref(), Some("first"));
        assert!(!checkpoint.metadata.is_auto);
        assert!(checkpoint.git_state.is_none());
        let paths: Vec<_> = checkpoint.files.iter().map(|f| f.path.clone()).collect();
        let mut sorted = paths.clone();
        sorted.sort();
        assert_eq!(paths, sorted);

        let binary = checkpoint.file(&temp.path().join("logo.bin")).unwrap();
        assert_eq!(binary.content, vec![0u8, 159, 146, 150]);
        assert_eq!(binary.size, 4);
    }

    #[tokio::test]
    async fn test_create_records_git_state_and_tool() {
        let temp = setup();
        let capture = capture_for(&temp, FakeGitBackend::clean_repo("abc123"));

        let checkpoint = capture
            .create(CaptureOptions::new("s1", Trigger::PreTool).with_tool("Write"))
            .await
            .unwrap();

        assert!(checkpoint.metadata.is_auto);
        assert_eq!(checkpoint.metadata.tool_name.as_deref(), Some("Write"));
        assert_eq!(checkpoint.git_state.unwrap().commit_hash, "abc123");
    }

    #[tokio::test]
    async fn test_forced_exclude_applies() {
        let temp = setup();
        std::fs::create_dir_all(temp.path().join(".agent/checkpoints")).unwrap();
        std::fs::write(temp.path().join(".agent/checkpoints/x.json"), "{}").unwrap();
        let capture = capture_for(&temp, FakeGitBackend::default()).with_forced_exclude(".agent/**");

        let checkpoint = capture
            .create(CaptureOptions::new("s1", Trigger::Manual).with_exclude_patterns(vec![]))
            .await
            .unwrap();

        assert!(checkpoint
            .files
            .iter()
            .all(|f| !f.path.starts_with(temp.path().join(".agent"))));
    }

    #[tokio::test]
    async fn test_create_fails_when_root_missing() {
        let temp = TempDir::new().unwrap();
        let capture = SnapshotCapture::new(temp.path().join("missing"), Arc::new(FakeGitBackend::default()));
        let err = capture
            .create(CaptureOptions::new("s1", Trigger::Manual))
            .await
            .unwrap_err();
        assert!(matches!(err, RewindError::Io { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_unreadable_file_is_omitted() {
        use std::os::unix::fs::PermissionsExt;

        let temp = setup();
        let secret = temp.path().join("secret.txt");
        std::fs::write(&secret, "hidden").unwrap();
        std::fs::set_permissions(&secret, std::fs::Permissions::from_mode(0o000)).unwrap();
        if std::fs::read(&secret).is_ok() {
            // running as root; permissions are not enforced
            return;
        }

        let capture = capture_for(&temp, FakeGitBackend::default());
        let checkpoint = capture
            .create(CaptureOptions::new("s1", Trigger::Manual))
            .await
            .unwrap();
        assert_eq!(checkpoint.file_count(), 3);
        assert!(checkpoint.file(&secret).is_none());
    }
}
