//! Checkpoint type definitions
//!
//! These are the records the engine persists and returns: checkpoints and
//! their file snapshots, optional git metadata, and the options/results of a
//! rewind.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::path::PathBuf;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering as AtomicOrdering};

use super::restore::{PlannedAction, RestorePhase};

static LAST_MILLIS: AtomicI64 = AtomicI64::new(0);
static SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Unique, creation-ordered identifier: `chk_{unixMillis}_{sequence}`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CheckpointId(pub String);

impl CheckpointId {
    /// Allocate the next checkpoint ID.
    ///
    /// The millisecond component never goes backwards within a process and the
    /// sequence is process-wide, so `(millis, sequence)` is strictly increasing.
    pub fn new() -> Self {
        let now = Utc::now().timestamp_millis();
        let prev = LAST_MILLIS.fetch_max(now, AtomicOrdering::SeqCst);
        let millis = prev.max(now);
        let seq = SEQUENCE.fetch_add(1, AtomicOrdering::SeqCst);
        Self(format!("chk_{}_{}", millis, seq))
    }

    /// Make every ID allocated from now on in this process order after `self`.
    ///
    /// Used when opening an existing store, so a fresh process (or a clock
    /// that stepped backwards) never reuses or undercuts a persisted ID.
    pub fn reserve_after(&self) {
        if let Some((millis, seq)) = self.parts() {
            LAST_MILLIS.fetch_max(millis, AtomicOrdering::SeqCst);
            SEQUENCE.fetch_max(seq.saturating_add(1), AtomicOrdering::SeqCst);
        }
    }

    /// Create from a string
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the ID as a string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn parts(&self) -> Option<(i64, u64)> {
        let rest = self.0.strip_prefix("chk_")?;
        let (millis, seq) = rest.split_once('_')?;
        Some((millis.parse().ok()?, seq.parse().ok()?))
    }

    /// Creation time encoded in the ID
    pub fn timestamp_millis(&self) -> Option<i64> {
        self.parts().map(|(millis, _)| millis)
    }

    /// Monotonic sequence number encoded in the ID
    pub fn sequence(&self) -> Option<u64> {
        self.parts().map(|(_, seq)| seq)
    }
}

impl Default for CheckpointId {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialOrd for CheckpointId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CheckpointId {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.parts(), other.parts()) {
            (Some(a), Some(b)) => a.cmp(&b),
            _ => self.0.cmp(&other.0),
        }
    }
}

impl std::fmt::Display for CheckpointId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Why a checkpoint was taken
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "reason", rename_all = "kebab-case")]
pub enum Trigger {
    /// User-requested checkpoint
    Manual,
    /// Taken immediately before a state-mutating tool call
    PreTool,
    /// Safety net taken immediately before a rewind
    PreRewind,
    /// Taken when a session starts
    SessionStart,
    /// Any other automatic checkpoint
    Auto(String),
}

impl Trigger {
    /// Whether checkpoints with this trigger count as automatic
    pub fn is_auto(&self) -> bool {
        !matches!(self, Self::Manual)
    }
}

impl std::fmt::Display for Trigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Manual => write!(f, "manual"),
            Self::PreTool => write!(f, "pre-tool"),
            Self::PreRewind => write!(f, "pre-rewind"),
            Self::SessionStart => write!(f, "session-start"),
            Self::Auto(reason) => write!(f, "auto({})", reason),
        }
    }
}

/// Provenance of a checkpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckpointMetadata {
    pub is_auto: bool,
    pub trigger: Trigger,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
    pub created_by: String,
}

impl CheckpointMetadata {
    /// Metadata for a trigger, with `is_auto` derived from it
    pub fn new(trigger: Trigger, created_by: impl Into<String>) -> Self {
        Self {
            is_auto: trigger.is_auto(),
            trigger,
            tool_name: None,
            created_by: created_by.into(),
        }
    }
}

/// Git metadata captured alongside the files
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitState {
    /// Current branch; `None` for a detached HEAD
    pub branch: Option<String>,
    pub commit_hash: String,
    pub is_clean: bool,
}

/// A checkpoint: complete membership-and-content record of the workspace
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Checkpoint {
    pub id: CheckpointId,

    pub timestamp: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    pub session_id: String,

    /// File snapshots, sorted by path
    pub files: Vec<FileSnapshot>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_state: Option<GitState>,

    pub metadata: CheckpointMetadata,

    /// Previous checkpoint in the same lineage
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<CheckpointId>,
}

impl Checkpoint {
    /// Create an empty checkpoint; the timestamp is the one encoded in its ID
    pub fn new(session_id: impl Into<String>, metadata: CheckpointMetadata) -> Self {
        let id = CheckpointId::new();
        let timestamp = id
            .timestamp_millis()
            .and_then(|millis| Utc.timestamp_millis_opt(millis).single())
            .unwrap_or_else(Utc::now);
        Self {
            id,
            timestamp,
            label: None,
            session_id: session_id.into(),
            files: Vec::new(),
            git_state: None,
            metadata,
            parent_id: None,
        }
    }

    /// Set checkpoint label
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Replace the file set; snapshots are kept sorted by path
    pub fn with_files(mut self, files: impl IntoIterator<Item = FileSnapshot>) -> Self {
        self.files = files.into_iter().collect();
        self.files.sort_by(|a, b| a.path.cmp(&b.path));
        self
    }

    /// Set git state
    pub fn with_git_state(mut self, git_state: GitState) -> Self {
        self.git_state = Some(git_state);
        self
    }

    /// Set parent checkpoint
    pub fn with_parent(mut self, parent_id: CheckpointId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    /// Get file count
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Total captured bytes
    pub fn total_size(&self) -> u64 {
        self.files.iter().map(|f| f.size).sum()
    }

    /// Look up a snapshot by absolute path
    pub fn file(&self, path: &std::path::Path) -> Option<&FileSnapshot> {
        self.files
            .binary_search_by(|f| f.path.as_path().cmp(path))
            .ok()
            .map(|idx| &self.files[idx])
    }
}

/// Captured state of one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileSnapshot {
    /// Absolute path at capture time
    pub path: PathBuf,

    #[serde(with = "content_codec")]
    pub content: Vec<u8>,

    pub size: u64,

    /// Lowercase hex SHA-256 of `content`
    pub hash: String,

    /// Unix permission bits
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<u32>,
}

impl FileSnapshot {
    /// Create a snapshot from raw bytes, computing size and hash
    pub fn new(path: impl Into<PathBuf>, content: Vec<u8>) -> Self {
        let hash = super::hash::content_hash(&content);
        Self {
            path: path.into(),
            size: content.len() as u64,
            content,
            hash,
            mode: None,
        }
    }

    /// Set permissions
    pub fn with_mode(mut self, mode: u32) -> Self {
        self.mode = Some(mode);
        self
    }
}

mod content_codec {
    use base64::Engine as _;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}

/// Lightweight listing entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckpointListItem {
    pub id: CheckpointId,
    pub timestamp: DateTime<Utc>,
    pub label: Option<String>,
    pub file_count: usize,
    pub is_auto: bool,
    pub tool_name: Option<String>,
    pub session_id: String,
    pub trigger: Trigger,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<CheckpointId>,
}

impl From<&Checkpoint> for CheckpointListItem {
    fn from(checkpoint: &Checkpoint) -> Self {
        Self {
            id: checkpoint.id.clone(),
            timestamp: checkpoint.timestamp,
            label: checkpoint.label.clone(),
            file_count: checkpoint.files.len(),
            is_auto: checkpoint.metadata.is_auto,
            tool_name: checkpoint.metadata.tool_name.clone(),
            session_id: checkpoint.session_id.clone(),
            trigger: checkpoint.metadata.trigger.clone(),
            parent_id: checkpoint.parent_id.clone(),
        }
    }
}

/// Which parts of a checkpoint a rewind restores
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RestoreMode {
    Files,
    SessionState,
    #[default]
    Both,
}

impl RestoreMode {
    pub fn includes_files(self) -> bool {
        matches!(self, Self::Files | Self::Both)
    }

    pub fn includes_session_state(self) -> bool {
        matches!(self, Self::SessionState | Self::Both)
    }
}

/// Options for rewinding to a checkpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewindOptions {
    pub restore_mode: RestoreMode,

    /// Capture a pre-rewind checkpoint first (ignored for dry runs)
    pub create_safety_checkpoint: bool,

    /// Compute the plan only; never touch the filesystem
    pub dry_run: bool,
}

impl Default for RewindOptions {
    fn default() -> Self {
        Self::all()
    }
}

impl RewindOptions {
    /// Restore files and session state, with a safety checkpoint
    pub fn all() -> Self {
        Self {
            restore_mode: RestoreMode::Both,
            create_safety_checkpoint: true,
            dry_run: false,
        }
    }

    /// Restore only files
    pub fn files_only() -> Self {
        Self {
            restore_mode: RestoreMode::Files,
            ..Self::all()
        }
    }

    /// Restore only session state
    pub fn session_state_only() -> Self {
        Self {
            restore_mode: RestoreMode::SessionState,
            ..Self::all()
        }
    }

    /// Create dry run options
    pub fn dry_run() -> Self {
        Self {
            dry_run: true,
            ..Self::all()
        }
    }

    /// Build from the CLI flag set; `files_only` wins if both scope flags are set
    pub fn from_flags(
        dry_run: bool,
        no_safety_checkpoint: bool,
        files_only: bool,
        session_state_only: bool,
    ) -> Self {
        let restore_mode = match (files_only, session_state_only) {
            (true, _) => RestoreMode::Files,
            (false, true) => RestoreMode::SessionState,
            (false, false) => RestoreMode::Both,
        };
        Self {
            restore_mode,
            create_safety_checkpoint: !no_safety_checkpoint,
            dry_run,
        }
    }

    /// Disable the safety checkpoint
    pub fn without_safety_checkpoint(mut self) -> Self {
        self.create_safety_checkpoint = false;
        self
    }

    /// Turn these options into a dry run
    pub fn as_dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }
}

/// What happened to the session-state part of a rewind
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStateOutcome {
    /// The restore mode excluded session state
    NotRequested,
    /// Dry run: the collaborator would have been invoked
    Planned,
    /// The collaborator restored the session state
    Restored,
    /// No collaborator is attached to the engine
    NoRestorer,
    /// The collaborator reported an error
    Failed(String),
}

/// Result of a rewind
#[derive(Debug, Clone)]
pub struct RewindResult {
    pub checkpoint_id: CheckpointId,

    /// Paths changed (or, for a dry run, that would change)
    pub restored_paths: Vec<PathBuf>,

    /// Paths that could not be restored, with the reason
    pub failed_paths: Vec<(PathBuf, String)>,

    /// One entry per attempted git operation, or its error
    pub git_operations: Option<Vec<String>>,

    /// Full computed plan, including skipped paths
    pub actions: Vec<PlannedAction>,

    pub session_state: SessionStateOutcome,

    pub safety_checkpoint_id: Option<CheckpointId>,

    /// Terminal phase of the restore state machine
    pub phase: RestorePhase,

    pub dry_run: bool,

    /// `failed_paths.is_empty()`
    pub success: bool,
}

impl RewindResult {
    /// Get count of restored files
    pub fn restored_count(&self) -> usize {
        self.restored_paths.len()
    }

    /// Get count of failed files
    pub fn failed_count(&self) -> usize {
        self.failed_paths.len()
    }
}
