//! Named-pipe rendezvous helper for callers that want to hand the logger a
//! path instead of an inherited fd (spec §4.6 "named pipe" variant).

use std::path::PathBuf;

use nix::sys::stat::Mode;
use nix::unistd::mkfifo;

use crate::diagnostics::{self, ErrorCode};

/// Picks a runtime directory the way most XDG-aware tools do:
/// `$XDG_RUNTIME_DIR`, then `$TMPDIR`, then `/tmp`.
#[must_use]
pub fn runtime_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("XDG_RUNTIME_DIR") {
        if !dir.is_empty() {
            return PathBuf::from(dir);
        }
    }
    if let Ok(dir) = std::env::var("TMPDIR") {
        if !dir.is_empty() {
            return PathBuf::from(dir);
        }
    }
    PathBuf::from("/tmp")
}

/// Creates a named pipe at `path` with mode 0600, if one doesn't already
/// exist. Pre-existing FIFOs are left alone (a previous logger instance may
/// still own them).
pub fn ensure_fifo(path: &std::path::Path) -> std::io::Result<()> {
    match mkfifo(path, Mode::from_bits_truncate(0o600)) {
        Ok(()) => Ok(()),
        Err(nix::errno::Errno::EEXIST) => Ok(()),
        Err(e) => {
            let io_err = std::io::Error::from(e);
            diagnostics::warn_err(ErrorCode::Fifo, "could not create named pipe", &io_err);
            Err(io_err)
        }
    }
}
