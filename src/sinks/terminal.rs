//! Terminal sink: writes plain or `nu-ansi-term`-colorized lines to a
//! pre-opened fd (spec §4.5). Grounded on the teacher's `formats::style()` /
//! `Palette` pattern (`formats.rs`), generalized from `log::Level` to this
//! crate's own [`Severity`].
//!
//! A partial-line sink (spec §4.4): fragments are written eagerly via
//! [`TerminalSink::write_partial`], and the line is finished off by
//! [`TerminalSink::write_complete`], which only writes whatever tail of the
//! line hasn't already gone out.

use std::io::Write;
use std::os::fd::{FromRawFd, RawFd};

use nu_ansi_term::{Color, Style};

use crate::severity::Severity;

use super::LineEvent;

pub struct TerminalSink {
    fd: RawFd,
    use_colors: bool,
    ceiling: Severity,
}

impl TerminalSink {
    #[must_use]
    pub fn new(fd: RawFd, use_colors: bool, ceiling: Severity) -> Self {
        TerminalSink { fd, use_colors, ceiling }
    }

    #[must_use]
    pub fn raw_fd(&self) -> RawFd {
        self.fd
    }

    /// Writes a fragment of a not-yet-terminated line, no newline appended.
    pub fn write_partial(&mut self, severity: Severity, fragment: &[u8]) -> std::io::Result<()> {
        if !severity.passes_ceiling(self.ceiling) {
            return Ok(());
        }
        self.write_raw(severity, fragment, false)
    }

    /// Finishes a line: writes whatever of `event.text` hasn't already been
    /// sent via `write_partial`, then a trailing newline.
    pub fn write_complete(&mut self, event: &LineEvent<'_>) -> std::io::Result<()> {
        if !event.severity.passes_ceiling(self.ceiling) {
            return Ok(());
        }
        let tail = &event.text[event.already_flushed.min(event.text.len())..];
        self.write_raw(event.severity, tail, true)
    }

    fn write_raw(&mut self, severity: Severity, bytes: &[u8], newline: bool) -> std::io::Result<()> {
        let mut f = unsafe { std::fs::File::from_raw_fd(self.fd) };
        let text = String::from_utf8_lossy(bytes);
        let result = if self.use_colors {
            let painted = style(severity).paint(text.into_owned());
            if newline {
                writeln!(f, "{painted}")
            } else {
                write!(f, "{painted}")
            }
        } else if newline {
            writeln!(f, "{text}")
        } else {
            write!(f, "{text}")
        };
        std::mem::forget(f);
        result
    }
}

fn style(severity: Severity) -> Style {
    match severity {
        Severity::Emergency | Severity::Alert | Severity::Critical | Severity::Error => {
            Style::new().bold().fg(Color::Red)
        }
        Severity::Warning => Style::new().bold().fg(Color::Magenta),
        Severity::Notice => Style::new().bold(),
        Severity::Info => Style::default(),
        Severity::Debug => Style::new().dimmed(),
    }
}
