//! Two-way checkpoint comparison and merge
//!
//! `a` is the current lineage and `b` the one being merged in. Paths only in
//! `b` merge automatically; anything that would lose or overwrite content in
//! `a` is reported as a conflict and never resolved here.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::types::{Checkpoint, CheckpointId, FileSnapshot};

/// Why a path could not merge automatically
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConflictKind {
    /// Both sides have the path with different content
    Content,
    /// `a` has the path and `b` does not
    Deletion,
    /// Both sides added the path independently. Requires a common ancestor to
    /// detect, so a two-way compare never reports it.
    Addition,
}

impl std::fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Content => write!(f, "content"),
            Self::Deletion => write!(f, "deletion"),
            Self::Addition => write!(f, "addition"),
        }
    }
}

/// Classification of one path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathStatus {
    Unchanged,
    Added,
    Conflict(ConflictKind),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparedPath {
    pub path: PathBuf,
    pub status: PathStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeConflict {
    pub path: PathBuf,
    /// Content in `a`
    pub current_content: Option<Vec<u8>>,
    /// Content in `b`; `None` when `b` deleted the path
    pub target_content: Option<Vec<u8>>,
    pub kind: ConflictKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MergeStrategy {
    /// No conflicts; the merge was applied automatically
    Auto,
    /// The caller must resolve conflicts before proceeding
    Manual,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeResult {
    pub merged_paths: Vec<PathBuf>,
    pub conflicts: Vec<MergeConflict>,
    pub strategy: MergeStrategy,
    pub success: bool,
    /// Set once a conflict-free merge has been persisted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merged_checkpoint_id: Option<CheckpointId>,
}

fn by_path(files: &[FileSnapshot]) -> BTreeMap<&Path, &FileSnapshot> {
    files.iter().map(|f| (f.path.as_path(), f)).collect()
}

/// Classify every path in `a` or `b`, sorted by path
pub fn compare(a: &Checkpoint, b: &Checkpoint) -> Vec<ComparedPath> {
    let a_files = by_path(&a.files);
    let b_files = by_path(&b.files);

    let in_a = a_files.iter().map(|(path, x)| {
        let status = match b_files.get(path) {
            Some(y) if x.hash == y.hash => PathStatus::Unchanged,
            Some(_) => PathStatus::Conflict(ConflictKind::Content),
            None => PathStatus::Conflict(ConflictKind::Deletion),
        };
        (*path, status)
    });
    let only_in_b = b_files
        .keys()
        .filter(|path| !a_files.contains_key(*path))
        .map(|path| (*path, PathStatus::Added));

    let mut compared: Vec<ComparedPath> = in_a
        .chain(only_in_b)
        .map(|(path, status)| ComparedPath {
            path: path.to_path_buf(),
            status,
        })
        .collect();
    compared.sort_by(|x, y| x.path.cmp(&y.path));
    compared
}

/// Merge `b` into `a`.
///
/// Returns the result and the merged file set: everything in `a` plus the
/// paths `b` added. Conflicting paths keep `a`'s version in the file set.
pub fn merge(a: &Checkpoint, b: &Checkpoint) -> (MergeResult, Vec<FileSnapshot>) {
    let mut merged_paths = Vec::new();
    let mut conflicts = Vec::new();
    let mut files: Vec<FileSnapshot> = a.files.clone();

    for compared in compare(a, b) {
        match compared.status {
            PathStatus::Unchanged => merged_paths.push(compared.path),
            PathStatus::Added => {
                if let Some(snapshot) = b.file(&compared.path) {
                    files.push(snapshot.clone());
                }
                merged_paths.push(compared.path);
            }
            PathStatus::Conflict(kind) => conflicts.push(MergeConflict {
                current_content: a.file(&compared.path).map(|f| f.content.clone()),
                target_content: b.file(&compared.path).map(|f| f.content.clone()),
                path: compared.path,
                kind,
            }),
        }
    }
    files.sort_by(|x, y| x.path.cmp(&y.path));

    let success = conflicts.is_empty();
    let result = MergeResult {
        merged_paths,
        conflicts,
        strategy: if success {
            MergeStrategy::Auto
        } else {
            MergeStrategy::Manual
        },
        success,
        merged_checkpoint_id: None,
    };
    (result, files)
}

#[cfg(test)]
mod tests {
    use super::super::types::{CheckpointMetadata, Trigger};
    use super::*;

    fn checkpoint(files: &[(&str, &str)]) -> Checkpoint {
        Checkpoint::new("s", CheckpointMetadata::new(Trigger::Manual, "test")).with_files(
            files
                .iter()
                .map(|(p, c)| FileSnapshot::new(format!("/ws/{}", p), c.as_bytes().to_vec())),
        )
    }

    #[test]
    fn test_single_content_difference_is_the_only_conflict() {
        let a = checkpoint(&[("x.txt", "one"), ("y.txt", "same"), ("z.txt", "same")]);
        let b = checkpoint(&[("x.txt", "two"), ("y.txt", "same"), ("z.txt", "same")]);

        let (result, _) = merge(&a, &b);
        assert_eq!(result.conflicts.len(), 1);
        assert_eq!(result.conflicts[0].path, PathBuf::from("/ws/x.txt"));
        assert_eq!(result.conflicts[0].kind, ConflictKind::Content);
        assert_eq!(result.conflicts[0].current_content.as_deref(), Some(&b"one"[..]));
        assert_eq!(result.conflicts[0].target_content.as_deref(), Some(&b"two"[..]));
        assert_eq!(result.strategy, MergeStrategy::Manual);
        assert!(!result.success);
        assert_eq!(result.merged_paths.len(), 2);
    }

    #[test]
    fn test_compare_classifies_added_and_deleted() {
        let a = checkpoint(&[("keep", "k"), ("only-a", "a")]);
        let b = checkpoint(&[("keep", "k"), ("only-b", "b")]);

        let statuses: Vec<_> = compare(&a, &b).into_iter().map(|c| c.status).collect();
        assert_eq!(
            statuses,
            vec![
                PathStatus::Unchanged,
                PathStatus::Conflict(ConflictKind::Deletion),
                PathStatus::Added,
            ]
        );
    }

    #[test]
    fn test_conflict_free_merge_is_auto() {
        let a = checkpoint(&[("keep", "k")]);
        let b = checkpoint(&[("keep", "k"), ("new", "n")]);

        let (result, files) = merge(&a, &b);
        assert!(result.success);
        assert_eq!(result.strategy, MergeStrategy::Auto);
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].path, PathBuf::from("/ws/keep"));
        assert_eq!(files[1].content, b"n".to_vec());
    }

    #[test]
    fn test_deletion_conflict_has_no_target_content() {
        let a = checkpoint(&[("doomed", "d")]);
        let b = checkpoint(&[]);

        let (result, files) = merge(&a, &b);
        assert_eq!(result.conflicts[0].kind, ConflictKind::Deletion);
        assert!(result.conflicts[0].target_content.is_none());
        assert_eq!(files.len(), 1);
    }
}
