//! Integration tests for the `rewind` binary.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn write_file(path: &Path, content: &str) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;
    Ok(())
}

fn rewind_cmd(workspace: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_rewind"));
    cmd.env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .env_remove("REWIND_MAX_CHECKPOINTS")
        .arg("--workspace")
        .arg(workspace);
    cmd
}

fn stored_ids(workspace: &Path) -> Vec<String> {
    let mut ids: Vec<String> = fs::read_dir(workspace.join(".agent/checkpoints"))
        .map(|entries| {
            entries
                .flatten()
                .filter_map(|e| e.file_name().to_str()?.strip_suffix(".json").map(str::to_string))
                .collect()
        })
        .unwrap_or_default();
    ids.sort();
    ids
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_create_list_and_rewind() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = TempDir::new()?;
    write_file(&tmp.path().join("src/main.rs"), "fn main() {}\n")?;

    let output = rewind_cmd(tmp.path())
        .args(["create", "--label", "baseline"])
        .output()?;
    assert!(
        output.status.success(),
        "create failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let ids = stored_ids(tmp.path());
    assert_eq!(ids.len(), 1);
    let id = &ids[0];

    let output = rewind_cmd(tmp.path()).arg("list").output()?;
    assert!(output.status.success());
    let listed = stdout(&output);
    assert!(listed.contains(id.as_str()));
    assert!(listed.contains("baseline"));

    write_file(&tmp.path().join("src/main.rs"), "fn main() { panic!() }\n")?;
    write_file(&tmp.path().join("scratch.txt"), "junk")?;

    // preview leaves the workspace alone
    let output = rewind_cmd(tmp.path())
        .args(["rewind", id.as_str(), "--dry-run"])
        .output()?;
    assert!(output.status.success());
    let preview = stdout(&output);
    assert!(preview.contains("overwrite"));
    assert!(preview.contains("delete"));
    assert!(tmp.path().join("scratch.txt").exists());

    // unique prefix is enough
    let prefix = &id[..id.len() - 1];
    let output = rewind_cmd(tmp.path())
        .args(["rewind", prefix, "--files-only"])
        .output()?;
    assert!(
        output.status.success(),
        "rewind failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert_eq!(fs::read_to_string(tmp.path().join("src/main.rs"))?, "fn main() {}\n");
    assert!(!tmp.path().join("scratch.txt").exists());

    // the safety checkpoint was persisted next to the original
    assert_eq!(stored_ids(tmp.path()).len(), 2);
    Ok(())
}

#[test]
fn test_unknown_checkpoint_exits_with_error() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = TempDir::new()?;
    write_file(&tmp.path().join("a.txt"), "a")?;

    let output = rewind_cmd(tmp.path())
        .args(["rewind", "chk_does_not_exist"])
        .output()?;
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).to_lowercase().contains("not found"));
    Ok(())
}

#[test]
fn test_merge_with_conflict_exits_one() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = TempDir::new()?;
    write_file(&tmp.path().join("shared.txt"), "first")?;
    assert!(rewind_cmd(tmp.path()).arg("create").output()?.status.success());

    write_file(&tmp.path().join("shared.txt"), "second")?;
    assert!(rewind_cmd(tmp.path()).arg("create").output()?.status.success());

    let ids = stored_ids(tmp.path());
    assert_eq!(ids.len(), 2);
    let output = rewind_cmd(tmp.path())
        .args(["merge", ids[0].as_str(), ids[1].as_str()])
        .output()?;
    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).contains("shared.txt"));
    Ok(())
}

#[test]
fn test_config_file_limits_history() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = TempDir::new()?;
    write_file(&tmp.path().join("a.txt"), "a")?;
    write_file(
        &tmp.path().join(".agent/rewind.toml"),
        "max_checkpoints = 1\ncapture_git_state = false\n",
    )?;

    for _ in 0..3 {
        assert!(rewind_cmd(tmp.path()).arg("create").output()?.status.success());
    }
    assert_eq!(stored_ids(tmp.path()).len(), 1);
    Ok(())
}
