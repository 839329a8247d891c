//! Log file rotation (spec §4.3): hard-link current to `.previous`, create a
//! fresh file, rename it into place. Grounded on the rotation bookkeeping
//! shape of the teacher's `writers/file_log_writer/state.rs` (`RollState`
//! tracks a running size and decides when to roll), generalized to the
//! spec's own hard-link-then-rename sequence rather than flexi_logger's
//! "close and reopen a fresh numbered/timestamped path" scheme.

use std::fs::{File, OpenOptions};
use std::os::fd::AsRawFd;
use std::os::unix::fs::OpenOptionsExt;

use crate::diagnostics::{self, ErrorCode};
use crate::lock::FileLock;
use crate::state::{FileIdentity, LoggerState};

/// Tracks accumulated bytes written to the current file and decides when a
/// rotation should be attempted.
#[derive(Debug)]
pub struct RotationGate {
    current_size: u64,
}

impl RotationGate {
    #[must_use]
    pub fn new(current_size: u64) -> Self {
        RotationGate { current_size }
    }

    pub fn record_write(&mut self, n: u64) {
        self.current_size = self.current_size.saturating_add(n);
    }

    #[must_use]
    pub fn should_rotate(&self, max_bytes: u64) -> bool {
        max_bytes != 0 && self.current_size > max_bytes
    }

    pub fn reset(&mut self) {
        self.current_size = 0;
    }
}

/// Performs one rotation: spec §4.3 steps 1-8.
///
/// On success, returns the new `File` (already locked shared) along with
/// its lock, which the caller must adopt in place of `lock` — a shared lock
/// must be held on whichever file is current, and the old `lock` still
/// tracks the now-renamed-away file's fd. On failure, `state.max_bytes` is
/// permanently set to `0` so no further rotation is attempted, and the
/// caller keeps using `old_file`/`lock` unchanged.
pub fn rotate(
    state: &mut LoggerState,
    lock: &mut FileLock,
    old_file: &File,
) -> std::io::Result<Option<(File, FileLock)>> {
    if let Err(e) = lock.upgrade_exclusive() {
        diagnostics::warn_err(ErrorCode::Rotate, "could not upgrade lock for rotation", &e);
        state.max_bytes = 0;
        return Ok(None);
    }

    let _ = old_file;
    match try_rotate(state) {
        Ok((new_file, new_lock)) => {
            let _ = lock.downgrade_shared();
            Ok(Some((new_file, new_lock)))
        }
        Err(e) => {
            diagnostics::warn_err(ErrorCode::Rotate, "log rotation failed, disabling rotation", &e);
            let _ = std::fs::remove_file(state.new_path());
            let _ = lock.downgrade_shared();
            state.max_bytes = 0;
            Ok(None)
        }
    }
}

fn try_rotate(state: &LoggerState) -> std::io::Result<(File, FileLock)> {
    let current = state.path();
    let previous = state.previous_path();
    let staging = state.new_path();

    let _ = std::fs::remove_file(&previous);
    std::fs::hard_link(&current, &previous)?;

    let new_file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .mode(0o600)
        .open(&staging)?;

    let mut new_lock = FileLock::acquire_shared(new_file.as_raw_fd())?;
    new_lock.upgrade_exclusive()?;
    let identity = FileIdentity::of(&staging)?;
    let _ = identity;

    std::fs::rename(&staging, &current)?;
    new_lock.downgrade_shared()?;

    Ok((new_file, new_lock))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn gate_fires_once_past_threshold() {
        let mut gate = RotationGate::new(0);
        gate.record_write(100);
        assert!(!gate.should_rotate(200));
        gate.record_write(150);
        assert!(gate.should_rotate(200));
    }

    #[test]
    fn gate_disabled_at_zero() {
        let mut gate = RotationGate::new(0);
        gate.record_write(u64::MAX / 2);
        assert!(!gate.should_rotate(0));
    }
}
