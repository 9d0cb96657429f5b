//! Tests for checkpoint types

use super::types::*;
use std::path::Path;

#[test]
fn test_checkpoint_id_format_and_order() {
    let first = CheckpointId::new();
    let second = CheckpointId::new();

    assert!(first.as_str().starts_with("chk_"));
    assert!(first.timestamp_millis().is_some());
    assert!(first < second);
    assert!(second.sequence().unwrap() > first.sequence().unwrap());

    let raw = CheckpointId::from_string("test-id");
    assert_eq!(raw.as_str(), "test-id");
    assert_eq!(raw.timestamp_millis(), None);
}

#[test]
fn test_ids_strictly_increase_in_a_burst() {
    let ids: Vec<_> = (0..200).map(|_| CheckpointId::new()).collect();
    assert!(ids.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn test_reserve_after_orders_new_ids_past_stored_one() {
    // an ID from a later clock reading with a large sequence, as another
    // process might have written it
    let now = chrono::Utc::now().timestamp_millis();
    let stored = CheckpointId::from_string(format!("chk_{}_{}", now + 5, 1_000_000));
    stored.reserve_after();

    let next = CheckpointId::new();
    assert!(next > stored);
    assert!(next.timestamp_millis().unwrap() >= now + 5);
    assert!(next.sequence().unwrap() > 1_000_000);

    // IDs without the chk_ layout are ignored
    CheckpointId::from_string("test-id").reserve_after();
    assert!(CheckpointId::new() > next);
}

#[test]
fn test_checkpoint_timestamp_matches_id() {
    let checkpoint = Checkpoint::new("s", CheckpointMetadata::new(Trigger::Manual, "test"));
    assert_eq!(
        Some(checkpoint.timestamp.timestamp_millis()),
        checkpoint.id.timestamp_millis()
    );
}

#[test]
fn test_checkpoint_with_files_sorts_and_looks_up() {
    let checkpoint = Checkpoint::new("s", CheckpointMetadata::new(Trigger::Manual, "test"))
        .with_label("My Checkpoint")
        .with_files(vec![
            FileSnapshot::new("/ws/z.txt", b"zz".to_vec()),
            FileSnapshot::new("/ws/a.txt", b"a".to_vec()),
        ]);

    assert_eq!(checkpoint.label.as_deref(), Some("My Checkpoint"));
    assert_eq!(checkpoint.file_count(), 2);
    assert_eq!(checkpoint.total_size(), 3);
    assert_eq!(checkpoint.files[0].path, Path::new("/ws/a.txt"));
    assert_eq!(checkpoint.file(Path::new("/ws/z.txt")).unwrap().size, 2);
    assert!(checkpoint.file(Path::new("/ws/missing")).is_none());
}

#[test]
fn test_trigger_is_auto_and_display() {
    assert!(!Trigger::Manual.is_auto());
    assert!(Trigger::PreTool.is_auto());
    assert!(Trigger::PreRewind.is_auto());
    assert_eq!(Trigger::PreTool.to_string(), "pre-tool");
    assert_eq!(Trigger::SessionStart.to_string(), "session-start");
    assert_eq!(Trigger::Auto("merge".into()).to_string(), "auto(merge)");

    let metadata = CheckpointMetadata::new(Trigger::PreRewind, "rewind");
    assert!(metadata.is_auto);
}

#[test]
fn test_trigger_serialization() {
    let json = serde_json::to_string(&Trigger::Auto("idle".into())).unwrap();
    assert_eq!(json, r#"{"kind":"auto","reason":"idle"}"#);
    let json = serde_json::to_string(&Trigger::PreTool).unwrap();
    assert_eq!(json, r#"{"kind":"pre-tool"}"#);

    let parsed: Trigger = serde_json::from_str(r#"{"kind":"session-start"}"#).unwrap();
    assert_eq!(parsed, Trigger::SessionStart);
}

#[test]
fn test_file_snapshot_content_is_base64() {
    let snapshot = FileSnapshot::new("/ws/bin", vec![0, 1, 2, 255]);
    let json = serde_json::to_value(&snapshot).unwrap();
    assert_eq!(json["content"], "AAEC/w==");
    assert_eq!(json["size"], 4);

    let back: FileSnapshot = serde_json::from_value(json).unwrap();
    assert_eq!(back, snapshot);
}

#[test]
fn test_rewind_options() {
    let opts = RewindOptions::all();
    assert_eq!(opts.restore_mode, RestoreMode::Both);
    assert!(opts.create_safety_checkpoint);
    assert!(!opts.dry_run);

    let opts = RewindOptions::files_only();
    assert!(opts.restore_mode.includes_files());
    assert!(!opts.restore_mode.includes_session_state());

    let opts = RewindOptions::from_flags(true, true, false, true);
    assert!(opts.dry_run);
    assert!(!opts.create_safety_checkpoint);
    assert_eq!(opts.restore_mode, RestoreMode::SessionState);

    let opts = RewindOptions::from_flags(false, false, true, true);
    assert_eq!(opts.restore_mode, RestoreMode::Files);
}
