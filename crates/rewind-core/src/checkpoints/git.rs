//! Best-effort git integration
//!
//! Git is reached through the small [`GitBackend`] capability so the engine can
//! be exercised without a git binary. Every failure here degrades: capture
//! omits the git state, restore records the failed operation and moves on.

use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use tokio::process::Command;

use super::types::GitState;
use crate::error::{EngineResult, RewindError};

/// Default timeout for a single git invocation
pub const DEFAULT_GIT_TIMEOUT_SECS: u64 = 30;

/// Process-spawning capability used for all git access
#[async_trait]
pub trait GitBackend: Send + Sync {
    /// Whether `root` is (the top of) a git working tree
    async fn is_repository(&self, root: &Path) -> bool;

    /// Run `git <args>` in `root`, returning trimmed stdout
    async fn run(&self, root: &Path, args: &[&str]) -> EngineResult<String>;
}

/// Runs the system `git` binary with a per-invocation timeout
#[derive(Debug, Clone)]
pub struct CommandGitBackend {
    timeout: Duration,
}

impl CommandGitBackend {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for CommandGitBackend {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_GIT_TIMEOUT_SECS))
    }
}

#[async_trait]
impl GitBackend for CommandGitBackend {
    async fn is_repository(&self, root: &Path) -> bool {
        tokio::fs::metadata(root.join(".git")).await.is_ok()
    }

    async fn run(&self, root: &Path, args: &[&str]) -> EngineResult<String> {
        let command = format!("git {}", args.join(" "));
        let future = Command::new("git")
            .args(args)
            .current_dir(root)
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(self.timeout, future).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => return Err(RewindError::git_command(command, e.to_string())),
            Err(_) => {
                return Err(RewindError::git_command(
                    command,
                    format!("timed out after {}s", self.timeout.as_secs()),
                ));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(RewindError::git_command(
                command,
                format!("{}: {}", output.status, stderr),
            ));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

/// Read branch, HEAD commit and cleanliness. Any failure yields `None`.
pub async fn capture_git_state(git: &dyn GitBackend, root: &Path) -> Option<GitState> {
    if !git.is_repository(root).await {
        tracing::debug!(root = ?root, "No git repository, skipping git state");
        return None;
    }

    let result: EngineResult<GitState> = async {
        let commit_hash = git.run(root, &["rev-parse", "HEAD"]).await?;
        let branch = git.run(root, &["rev-parse", "--abbrev-ref", "HEAD"]).await?;
        let status = git.run(root, &["status", "--porcelain"]).await?;
        Ok(GitState {
            branch: (branch != "HEAD" && !branch.is_empty()).then_some(branch),
            commit_hash,
            is_clean: status.is_empty(),
        })
    }
    .await;

    match result {
        Ok(state) => Some(state),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to capture git state, continuing without it");
            None
        }
    }
}

/// Whether HEAD already matches `target`
pub async fn matches_head(git: &dyn GitBackend, root: &Path, target: &GitState) -> bool {
    match capture_git_state(git, root).await {
        Some(current) => current.commit_hash == target.commit_hash && current.branch == target.branch,
        None => false,
    }
}

/// Check out the target branch and hard-reset it to the target commit.
///
/// The returned list holds one line per step, either what ran or the error it
/// produced. When the branch checkout fails the reset is recorded as skipped,
/// since it would move whatever branch HEAD is on.
pub async fn restore_git_state(git: &dyn GitBackend, root: &Path, target: &GitState) -> Vec<String> {
    let mut operations = Vec::new();

    if !git.is_repository(root).await {
        let err = RewindError::git_unavailable(format!("{} is not a git repository", root.display()));
        operations.push(format!("error: {}", err));
        return operations;
    }

    if let Some(branch) = &target.branch {
        let checkout = git.run(root, &["checkout", "-f", branch.as_str()]).await;
        let checked_out = checkout.is_ok();
        operations.push(record(checkout, || format!("checkout {}", branch)));
        if !checked_out {
            tracing::warn!(branch = %branch, "Skipping hard reset, branch checkout failed");
            operations.push(format!("error: reset skipped, checkout of {} failed", branch));
            return operations;
        }
    }

    operations.push(record(
        git.run(root, &["reset", "--hard", target.commit_hash.as_str()]).await,
        || format!("reset --hard {}", target.commit_hash),
    ));

    operations
}

fn record(result: EngineResult<String>, describe: impl FnOnce() -> String) -> String {
    match result {
        Ok(_) => describe(),
        Err(e) => {
            tracing::warn!(error = %e, "Git restore operation failed");
            format!("error: {}", e)
        }
    }
}


#[cfg(test)]
mod tests {
    use super::fake::FakeGitBackend;
    use super::*;

    #[tokio::test]
    async fn test_capture_clean_repo() {
        let git = FakeGitBackend::clean_repo("abc123");
        let state = capture_git_state(&git, Path::new("/ws")).await.unwrap();
        assert_eq!(state.commit_hash, "abc123");
        assert_eq!(state.branch.as_deref(), Some("main"));
        assert!(state.is_clean);
    }

    #[tokio::test]
    async fn test_capture_dirty_detached() {
        let git = FakeGitBackend::clean_repo("abc123");
        git.respond("rev-parse --abbrev-ref HEAD", Ok("HEAD".to_string()));
        git.respond("status --porcelain", Ok(" M a.txt".to_string()));
        let state = capture_git_state(&git, Path::new("/ws")).await.unwrap();
        assert_eq!(state.branch, None);
        assert!(!state.is_clean);
    }

    #[tokio::test]
    async fn test_capture_degrades_on_failure() {
        let git = FakeGitBackend::clean_repo("abc123");
        git.respond(
            "rev-parse HEAD",
            Err(RewindError::git_command("git rev-parse HEAD", "timed out after 30s")),
        );
        assert!(capture_git_state(&git, Path::new("/ws")).await.is_none());

        let no_repo = FakeGitBackend::default();
        assert!(capture_git_state(&no_repo, Path::new("/ws")).await.is_none());
    }

    fn target_on_main() -> GitState {
        GitState {
            branch: Some("main".to_string()),
            commit_hash: "def456".to_string(),
            is_clean: true,
        }
    }

    #[tokio::test]
    async fn test_restore_checks_out_then_resets() {
        let git = FakeGitBackend::clean_repo("abc123");
        let ops = restore_git_state(&git, Path::new("/ws"), &target_on_main()).await;
        assert_eq!(ops, vec!["checkout main", "reset --hard def456"]);
        assert_eq!(git.calls(), vec!["checkout -f main", "reset --hard def456"]);
    }

    #[tokio::test]
    async fn test_failed_checkout_skips_reset() {
        let git = FakeGitBackend::clean_repo("abc123");
        git.respond(
            "checkout -f main",
            Err(RewindError::git_command(
                "git checkout -f main",
                "exit status: 1: pathspec 'main' did not match",
            )),
        );

        let ops = restore_git_state(&git, Path::new("/ws"), &target_on_main()).await;
        assert_eq!(ops.len(), 2);
        assert!(ops[0].starts_with("error:"));
        assert_eq!(ops[1], "error: reset skipped, checkout of main failed");
        assert!(!git.calls().iter().any(|c| c.starts_with("reset")));
    }

    #[tokio::test]
    async fn test_detached_target_only_resets() {
        let git = FakeGitBackend::clean_repo("abc123");
        let target = GitState {
            branch: None,
            ..target_on_main()
        };
        let ops = restore_git_state(&git, Path::new("/ws"), &target).await;
        assert_eq!(ops, vec!["reset --hard def456"]);
    }

    #[tokio::test]
    async fn test_command_failure_message_has_single_status_prefix() {
        let temp = tempfile::TempDir::new().unwrap();
        let git = CommandGitBackend::default();
        let Err(err) = git.run(temp.path(), &["rev-parse", "HEAD"]).await else {
            return;
        };
        let message = err.to_string();
        if message.contains("exit status") {
            assert_eq!(message.matches("exit status").count(), 1, "{message}");
        }
    }

    #[tokio::test]
    async fn test_command_backend_reports_missing_repo() {
        let temp = tempfile::TempDir::new().unwrap();
        let git = CommandGitBackend::default();
        assert!(!git.is_repository(temp.path()).await);
    }
}
