//! Exercises the hard-link/rename rotation sequence against real files.

use std::fs::OpenOptions;
use std::os::fd::AsRawFd;
use std::os::unix::fs::OpenOptionsExt;

use srt_logger::lock::FileLock;
use srt_logger::rotation::{rotate, RotationGate};
use srt_logger::severity::Severity;
use srt_logger::state::LoggerState;

fn open(path: &std::path::Path) -> std::fs::File {
    OpenOptions::new()
        .create(true)
        .append(true)
        .mode(0o600)
        .open(path)
        .unwrap()
}

#[test]
fn rotation_preserves_old_content_under_previous_name() {
    let dir = temp_dir::TempDir::new().unwrap();
    let mut state = LoggerState::new(
        dir.path().to_path_buf(),
        "app.log".to_string(),
        Severity::Info,
        false,
        1,
    );

    let path = state.path();
    {
        let mut f = open(&path);
        use std::io::Write;
        writeln!(f, "hello world").unwrap();
    }

    let file = open(&path);
    let mut lock = FileLock::acquire_shared(file.as_raw_fd()).unwrap();

    let result = rotate(&mut state, &mut lock, &file).unwrap();
    assert!(result.is_some(), "rotation should succeed");

    let previous_contents = std::fs::read_to_string(state.previous_path()).unwrap();
    assert_eq!(previous_contents, "hello world\n");

    let new_contents = std::fs::read_to_string(state.path()).unwrap();
    assert!(new_contents.is_empty());
}

#[test]
fn failed_rotation_permanently_disables_further_attempts() {
    let dir = temp_dir::TempDir::new().unwrap();
    let mut state = LoggerState::new(
        dir.path().to_path_buf(),
        "app.log".to_string(),
        Severity::Info,
        false,
        1,
    );
    let path = state.path();
    let file = open(&path);
    let mut lock = FileLock::acquire_shared(file.as_raw_fd()).unwrap();

    // Pre-create the staging file so create_new fails inside rotate().
    std::fs::write(state.new_path(), b"stale").unwrap();

    let result = rotate(&mut state, &mut lock, &file).unwrap();
    assert!(result.is_none());
    assert_eq!(state.max_bytes, 0);
}

#[test]
fn gate_tracks_bytes_across_writes() {
    let mut gate = RotationGate::new(0);
    for _ in 0..10 {
        gate.record_write(50);
    }
    assert!(gate.should_rotate(400));
    assert!(!gate.should_rotate(500));
}
