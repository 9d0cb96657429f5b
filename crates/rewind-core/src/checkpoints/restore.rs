//! Checkpoint restore operations
//!
//! A restore is planned by diffing the current workspace membership against
//! the target checkpoint's membership, then applied action by action. Actions
//! are never read from the checkpoint itself.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio_util::sync::CancellationToken;

use super::types::{Checkpoint, FileSnapshot};
use crate::error::{EngineResult, RewindError};

/// What a restore does to a single path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RestoreAction {
    /// In the target, missing from the workspace
    Recreate,
    /// In both, content differs
    Overwrite,
    /// In the workspace, not in the target
    Delete,
    /// In both with identical content
    Skip,
}

impl RestoreAction {
    pub fn is_change(self) -> bool {
        !matches!(self, Self::Skip)
    }
}

impl std::fmt::Display for RestoreAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Recreate => write!(f, "recreate"),
            Self::Overwrite => write!(f, "overwrite"),
            Self::Delete => write!(f, "delete"),
            Self::Skip => write!(f, "skip"),
        }
    }
}

/// One path and its action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedAction {
    pub path: PathBuf,
    pub action: RestoreAction,
}

/// Restore state machine. Transitions only move forward:
/// `Planning -> Previewing | Applying -> Completed | PartiallyFailed`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestorePhase {
    Planning,
    Previewing,
    Applying,
    Completed,
    PartiallyFailed,
}

impl std::fmt::Display for RestorePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Planning => write!(f, "planning"),
            Self::Previewing => write!(f, "previewing"),
            Self::Applying => write!(f, "applying"),
            Self::Completed => write!(f, "completed"),
            Self::PartiallyFailed => write!(f, "partially-failed"),
        }
    }
}

/// Every path in the union of target and workspace, classified exactly once
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestorePlan {
    /// Sorted by path
    pub actions: Vec<PlannedAction>,
}

impl RestorePlan {
    /// Classify each path by comparing target and current snapshots
    pub fn compute(target: &[FileSnapshot], current: &[FileSnapshot]) -> Self {
        let mut paths: BTreeMap<&Path, (Option<&str>, Option<&str>)> = BTreeMap::new();
        for file in target {
            paths.entry(file.path.as_path()).or_default().0 = Some(file.hash.as_str());
        }
        for file in current {
            paths.entry(file.path.as_path()).or_default().1 = Some(file.hash.as_str());
        }

        let actions = paths
            .into_iter()
            .filter_map(|(path, hashes)| {
                let action = match hashes {
                    (Some(_), None) => RestoreAction::Recreate,
                    (Some(t), Some(c)) if t == c => RestoreAction::Skip,
                    (Some(_), Some(_)) => RestoreAction::Overwrite,
                    (None, Some(_)) => RestoreAction::Delete,
                    (None, None) => return None,
                };
                Some(PlannedAction {
                    path: path.to_path_buf(),
                    action,
                })
            })
            .collect();

        Self { actions }
    }

    /// Paths that would change, in plan order
    pub fn changed_paths(&self) -> Vec<PathBuf> {
        self.actions
            .iter()
            .filter(|a| a.action.is_change())
            .map(|a| a.path.clone())
            .collect()
    }

    pub fn count(&self, action: RestoreAction) -> usize {
        self.actions.iter().filter(|a| a.action == action).count()
    }

    /// Nothing to do
    pub fn is_noop(&self) -> bool {
        self.actions.iter().all(|a| !a.action.is_change())
    }
}

/// Per-path results of applying a plan
#[derive(Debug, Clone, Default)]
pub struct ApplyOutcome {
    pub restored: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, String)>,
    /// Cancellation stopped the apply early
    pub cancelled: bool,
}

impl ApplyOutcome {
    pub fn phase(&self) -> RestorePhase {
        if self.failed.is_empty() {
            RestorePhase::Completed
        } else {
            RestorePhase::PartiallyFailed
        }
    }
}

/// Apply every non-skip action, continuing past individual failures.
///
/// The token is checked between actions; once it fires, the remaining
/// actions are reported as failed without being attempted.
pub async fn apply(plan: &RestorePlan, target: &Checkpoint, cancel: &CancellationToken) -> ApplyOutcome {
    let mut outcome = ApplyOutcome::default();
    let mut pending = plan.actions.iter().filter(|a| a.action.is_change());

    for planned in pending.by_ref() {
        if cancel.is_cancelled() {
            outcome.cancelled = true;
            outcome
                .failed
                .push((planned.path.clone(), "cancelled before apply".to_string()));
            break;
        }

        match apply_action(planned, target).await {
            Ok(()) => outcome.restored.push(planned.path.clone()),
            Err(e) => {
                tracing::warn!(path = ?planned.path, action = %planned.action, error = %e, "Failed to restore file");
                outcome.failed.push((planned.path.clone(), e.to_string()));
            }
        }
    }

    for planned in pending {
        outcome
            .failed
            .push((planned.path.clone(), "cancelled before apply".to_string()));
    }

    tracing::debug!(
        restored = outcome.restored.len(),
        failed = outcome.failed.len(),
        cancelled = outcome.cancelled,
        "Applied restore plan"
    );
    outcome
}

async fn apply_action(planned: &PlannedAction, target: &Checkpoint) -> EngineResult<()> {
    match planned.action {
        RestoreAction::Recreate | RestoreAction::Overwrite => {
            let snapshot = target.file(&planned.path).ok_or_else(|| {
                RewindError::not_found(format!("No snapshot for {}", planned.path.display()))
            })?;
            write_snapshot(snapshot).await
        }
        RestoreAction::Delete => match fs::remove_file(&planned.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(RewindError::io_at(format!("Failed to delete file: {}", e), &planned.path)),
        },
        RestoreAction::Skip => Ok(()),
    }
}

async fn write_snapshot(snapshot: &FileSnapshot) -> EngineResult<()> {
    let path = &snapshot.path;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| RewindError::io_at(format!("Failed to create directory: {}", e), parent))?;
    }

    fs::write(path, &snapshot.content)
        .await
        .map_err(|e| RewindError::io_at(format!("Failed to write file: {}", e), path))?;

    #[cfg(unix)]
    if let Some(mode) = snapshot.mode {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
            .await
            .map_err(|e| RewindError::io_at(format!("Failed to set permissions: {}", e), path))?;
    }

    tracing::trace!(path = ?path, bytes = snapshot.size, "Restored file");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::types::{CheckpointMetadata, Trigger};
    use super::*;
    use tempfile::TempDir;

    fn snap(path: &Path, content: &str) -> FileSnapshot {
        FileSnapshot::new(path, content.as_bytes().to_vec())
    }

    fn target_with(files: Vec<FileSnapshot>) -> Checkpoint {
        Checkpoint::new("s", CheckpointMetadata::new(Trigger::Manual, "test")).with_files(files)
    }

    #[test]
    fn test_compute_classifies_every_path_once() {
        let root = Path::new("/ws");
        let target = vec![
            snap(&root.join("keep.txt"), "same"),
            snap(&root.join("edit.txt"), "old"),
            snap(&root.join("gone.txt"), "recreate me"),
        ];
        let current = vec![
            snap(&root.join("keep.txt"), "same"),
            snap(&root.join("edit.txt"), "new"),
            snap(&root.join("extra.txt"), "delete me"),
        ];

        let plan = RestorePlan::compute(&target, &current);
        let by_path: BTreeMap<_, _> = plan
            .actions
            .iter()
            .map(|a| (a.path.file_name().unwrap().to_str().unwrap(), a.action))
            .collect();

        assert_eq!(plan.actions.len(), 4);
        assert_eq!(by_path["keep.txt"], RestoreAction::Skip);
        assert_eq!(by_path["edit.txt"], RestoreAction::Overwrite);
        assert_eq!(by_path["gone.txt"], RestoreAction::Recreate);
        assert_eq!(by_path["extra.txt"], RestoreAction::Delete);
        assert_eq!(plan.changed_paths().len(), 3);
        assert!(!plan.is_noop());
    }

    #[test]
    fn test_identical_sets_are_noop() {
        let files = vec![snap(Path::new("/ws/a"), "1"), snap(Path::new("/ws/b"), "2")];
        let plan = RestorePlan::compute(&files, &files);
        assert!(plan.is_noop());
        assert_eq!(plan.count(RestoreAction::Skip), 2);
    }

    #[tokio::test]
    async fn test_apply_reaches_target_state() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        std::fs::write(root.join("edit.txt"), "new").unwrap();
        std::fs::write(root.join("extra.txt"), "x").unwrap();

        let target = target_with(vec![
            snap(&root.join("edit.txt"), "old"),
            snap(&root.join("nested/dir/gone.txt"), "back"),
        ]);
        let current = vec![snap(&root.join("edit.txt"), "new"), snap(&root.join("extra.txt"), "x")];
        let plan = RestorePlan::compute(&target.files, &current);

        let outcome = apply(&plan, &target, &CancellationToken::new()).await;
        assert!(outcome.failed.is_empty());
        assert_eq!(outcome.restored.len(), 3);
        assert_eq!(outcome.phase(), RestorePhase::Completed);
        assert_eq!(std::fs::read_to_string(root.join("edit.txt")).unwrap(), "old");
        assert_eq!(std::fs::read_to_string(root.join("nested/dir/gone.txt")).unwrap(), "back");
        assert!(!root.join("extra.txt").exists());
    }

    #[tokio::test]
    async fn test_apply_continues_after_failure() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        // a regular file where a directory is needed
        std::fs::write(root.join("blocker"), "file").unwrap();

        let target = target_with(vec![
            snap(&root.join("blocker"), "file"),
            snap(&root.join("blocker/child.txt"), "unreachable"),
            snap(&root.join("ok.txt"), "fine"),
        ]);
        let current = vec![snap(&root.join("blocker"), "file")];
        let plan = RestorePlan::compute(&target.files, &current);

        let outcome = apply(&plan, &target, &CancellationToken::new()).await;
        assert_eq!(outcome.phase(), RestorePhase::PartiallyFailed);
        assert!(outcome.restored.contains(&root.join("ok.txt")));
        assert!(outcome.failed.iter().any(|(p, _)| p == &root.join("blocker/child.txt")));
        assert_eq!(std::fs::read_to_string(root.join("ok.txt")).unwrap(), "fine");
    }

    #[tokio::test]
    async fn test_cancelled_apply_reports_every_remaining_path() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        let target = target_with(vec![snap(&root.join("a.txt"), "a"), snap(&root.join("b.txt"), "b")]);
        let plan = RestorePlan::compute(&target.files, &[]);

        let cancel = CancellationToken::new();
        cancel.cancel();
        let outcome = apply(&plan, &target, &cancel).await;

        assert!(outcome.cancelled);
        assert!(outcome.restored.is_empty());
        assert_eq!(outcome.failed.len(), 2);
        assert!(!root.join("a.txt").exists());
    }

    #[tokio::test]
    async fn test_delete_of_missing_file_succeeds() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("already-gone.txt");
        let plan = RestorePlan {
            actions: vec![PlannedAction {
                path: path.clone(),
                action: RestoreAction::Delete,
            }],
        };
        let outcome = apply(&plan, &target_with(vec![]), &CancellationToken::new()).await;
        assert_eq!(outcome.restored, vec![path]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_recreate_restores_mode() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let path = temp.path().join("run.sh");
        let target = target_with(vec![snap(&path, "#!/bin/sh\n").with_mode(0o100755)]);
        let plan = RestorePlan::compute(&target.files, &[]);

        apply(&plan, &target, &CancellationToken::new()).await;
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }
}
