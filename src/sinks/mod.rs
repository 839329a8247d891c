//! The sink set (spec §4.5): file, journal, terminal, stderr-fallback.
//!
//! Each sink is independent: a write failure on one sink is reported via
//! [`crate::diagnostics`] and does not stop the others, mirroring the
//! teacher's multi-writer `primary_writer.rs` fan-out.
//!
//! File and journal are complete-line sinks: they only ever see a full,
//! newline-terminated line via [`SinkSet::dispatch_complete`]. Terminal (and
//! stderr, when it is the only configured sink) are partial-line sinks:
//! they also receive bytes eagerly, before a newline arrives, via
//! [`SinkSet::dispatch_partial`] (spec §4.4).

mod file;
mod journal;
mod terminal;

pub use file::FileSink;
pub use journal::JournalSink;
pub use terminal::TerminalSink;

use std::io::Write;
use std::os::fd::{FromRawFd, RawFd};

use crate::diagnostics::{self, ErrorCode};
use crate::severity::Severity;
use crate::timestamp::LineTimestamp;

/// One complete logical line, ready to be handed to every configured sink.
pub struct LineEvent<'a> {
    pub severity: Severity,
    /// Full line body, newline stripped.
    pub text: &'a [u8],
    /// Leading bytes of `text` already sent to partial-line sinks via
    /// [`SinkSet::dispatch_partial`]; those sinks only need the remainder
    /// plus the line terminator.
    pub already_flushed: usize,
    pub timestamp: LineTimestamp,
}

/// The set of sinks a running logger writes to. `None` means that sink is
/// not configured; sinks are tried in a fixed order (file, journal,
/// terminal) with stderr as the last-resort fallback (spec §4.5, §4.2).
pub struct SinkSet {
    pub file: Option<FileSink>,
    pub journal: Option<JournalSink>,
    pub terminal: Option<TerminalSink>,
    pub stderr_fd: RawFd,
    pub use_stderr_fallback: bool,
    /// Set when no file/journal/terminal sink is configured at all, so
    /// stderr is the sole output and should receive partial-line flushes
    /// too, rather than only the complete-line, failure-triggered fallback.
    pub stderr_is_primary: bool,
}

impl SinkSet {
    /// Eagerly flushes `fragment` (bytes of a not-yet-terminated line) to
    /// every partial-line sink (spec §4.4).
    pub fn dispatch_partial(&mut self, severity: Severity, fragment: &[u8]) {
        if fragment.is_empty() {
            return;
        }
        if let Some(terminal) = &mut self.terminal {
            if let Err(e) = terminal.write_partial(severity, fragment) {
                diagnostics::warn_err(ErrorCode::Terminal, "partial write to terminal failed", &e);
            }
        }
        if self.stderr_is_primary && self.use_stderr_fallback {
            let mut f = unsafe { std::fs::File::from_raw_fd(self.stderr_fd) };
            let result = f.write_all(fragment);
            std::mem::forget(f);
            if let Err(e) = result {
                diagnostics::warn_err(ErrorCode::Stderr, "partial write to stderr fallback failed", &e);
            }
        }
    }

    /// Dispatches one complete, newline-terminated line to every configured
    /// sink (spec §4.4/§4.5). Terminal only writes the unflushed remainder
    /// of `event.text` (the rest already went out via `dispatch_partial`).
    pub fn dispatch_complete(&mut self, event: &LineEvent<'_>) {
        let mut any_attempted = false;
        let mut any_succeeded = false;

        if let Some(file) = &mut self.file {
            any_attempted = true;
            match file.write_complete(event) {
                Ok(()) => any_succeeded = true,
                Err(e) => diagnostics::warn_err(ErrorCode::File, "write to log file failed", &e),
            }
        }
        if let Some(journal) = &mut self.journal {
            any_attempted = true;
            match journal.write_complete(event) {
                Ok(()) => any_succeeded = true,
                Err(e) => diagnostics::warn_err(ErrorCode::Journal, "write to journal failed", &e),
            }
        }
        if let Some(terminal) = &mut self.terminal {
            any_attempted = true;
            match terminal.write_complete(event) {
                Ok(()) => any_succeeded = true,
                Err(e) => {
                    diagnostics::warn_err(ErrorCode::Terminal, "write to terminal failed", &e);
                }
            }
        }

        if self.use_stderr_fallback && (!any_attempted || !any_succeeded) {
            self.write_stderr(event);
        }
    }

    fn write_stderr(&self, event: &LineEvent<'_>) {
        let tail = &event.text[event.already_flushed.min(event.text.len())..];
        let mut f = unsafe { std::fs::File::from_raw_fd(self.stderr_fd) };
        let result = f.write_all(tail).and_then(|()| f.write_all(b"\n"));
        std::mem::forget(f); // do not close the process's stderr fd
        if let Err(e) = result {
            diagnostics::warn_err(ErrorCode::Stderr, "write to stderr fallback failed", &e);
        }
    }
}
