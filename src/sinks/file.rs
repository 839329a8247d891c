//! File sink: writes timestamped lines, checks the on-disk file identity on
//! every write to notice external rotation/deletion, and triggers rotation
//! when the configured threshold is crossed (spec §4.5).

use std::fs::File;
use std::io::Write;
use std::os::fd::AsRawFd;

use crate::lock::FileLock;
use crate::rotation::{self, RotationGate};
use crate::severity::Severity;
use crate::state::{FileIdentity, LoggerState};

use super::LineEvent;

#[derive(Debug)]
pub struct FileSink {
    file: File,
    lock: FileLock,
    gate: RotationGate,
    ceiling: Severity,
    timestamps: bool,
}

impl FileSink {
    pub fn new(file: File, lock: FileLock, current_size: u64, ceiling: Severity, timestamps: bool) -> Self {
        FileSink {
            file,
            lock,
            gate: RotationGate::new(current_size),
            ceiling,
            timestamps,
        }
    }

    pub fn write_complete(&mut self, event: &LineEvent<'_>) -> std::io::Result<()> {
        if !event.severity.passes_ceiling(self.ceiling) {
            return Ok(());
        }
        let mut n = 0u64;
        if self.timestamps {
            let prefix = event.timestamp.file_prefix();
            self.file.write_all(prefix.as_bytes())?;
            n += prefix.len() as u64;
        }
        self.file.write_all(event.text)?;
        n += event.text.len() as u64;
        self.file.write_all(b"\n")?;
        n += 1;
        self.file.flush()?;

        self.gate.record_write(n);
        Ok(())
    }

    /// Checks whether rotation is due and, if so, performs it, swapping in
    /// the freshly rotated file and its lock. Called by the pipeline after
    /// each dispatched line (spec §4.3: rotation is checked "after writing a
    /// complete line to the file").
    pub fn maybe_rotate(&mut self, state: &mut LoggerState) {
        if !self.gate.should_rotate(state.max_bytes) {
            return;
        }
        match rotation::rotate(state, &mut self.lock, &self.file) {
            Ok(Some((new_file, new_lock))) => {
                if let Ok(identity) = FileIdentity::of(&state.path()) {
                    state.file_identity = Some(identity);
                }
                self.file = new_file;
                self.lock = new_lock;
                self.gate.reset();
            }
            Ok(None) => {
                // rotation() already disabled further attempts and warned.
            }
            Err(_) => {
                state.max_bytes = 0;
            }
        }
    }

    #[must_use]
    pub fn raw_fd(&self) -> std::os::fd::RawFd {
        self.file.as_raw_fd()
    }
}
