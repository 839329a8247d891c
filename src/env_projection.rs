//! Environment variables projected into the wrapped process (spec §4.7), so
//! a child that itself understands the severity-prefix protocol can detect
//! it is already running under this logger.
//!
//! Unlike the rest of [`crate::config`], this depends on which sinks ended
//! up active, not just on the requested configuration — so it can only run
//! after [`crate::setup::setup`] has resolved the [`crate::sinks::SinkSet`].

use std::ffi::OsString;
use std::os::fd::{BorrowedFd, RawFd};

use crate::config::LoggerConfig;
use crate::sinks::SinkSet;

/// One `(name, value)` pair to set in the wrapped process's environment.
pub type EnvVar = (&'static str, OsString);

#[must_use]
pub fn project(config: &LoggerConfig, sinks: &SinkSet) -> Vec<EnvVar> {
    let mut vars = Vec::new();

    if let Some(terminal) = &sinks.terminal {
        if let Some(path) = terminal_path(terminal.raw_fd()) {
            vars.push(("SRT_LOG_TERMINAL", OsString::from(path)));
        }
    }

    if sinks.journal.is_some() {
        let journal_is_sole_sink = sinks.file.is_none() && sinks.terminal.is_none();
        if journal_is_sole_sink {
            vars.push(("SRT_LOG_TO_JOURNAL", OsString::from("1")));
        } else {
            vars.push(("SRT_LOG_TO_JOURNAL", OsString::from("0")));
            vars.push(("SRT_LOGGER_USE_JOURNAL", OsString::from("1")));
        }
    }

    vars.push((
        "SRT_LOG_LEVEL_PREFIX",
        OsString::from(if config.parse_level_prefix { "1" } else { "0" }),
    ));

    vars
}

/// Resolves the tty device path backing `fd` via `ttyname`, skipping it if
/// the path contains a newline (spec §4.7: it has to be safe to pass along
/// as a single environment-variable line).
fn terminal_path(fd: RawFd) -> Option<String> {
    let borrowed = unsafe { BorrowedFd::borrow_raw(fd) };
    let path = nix::unistd::ttyname(borrowed).ok()?;
    let path = path.to_str()?.to_string();
    if path.contains('\n') {
        return None;
    }
    Some(path)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::sinks::{JournalSink, TerminalSink};
    use crate::severity::Severity;

    fn empty_sinks() -> SinkSet {
        SinkSet {
            file: None,
            journal: None,
            terminal: None,
            stderr_fd: -1,
            use_stderr_fallback: false,
            stderr_is_primary: false,
        }
    }

    #[test]
    fn no_sinks_only_projects_level_prefix() {
        let config = LoggerConfig::builder().parse_level_prefix(true).build();
        let vars = project(&config, &empty_sinks());
        let names: Vec<_> = vars.iter().map(|(name, _)| *name).collect();
        assert_eq!(names, vec!["SRT_LOG_LEVEL_PREFIX"]);
    }

    #[test]
    fn journal_as_sole_sink_sets_to_journal_one() {
        let config = LoggerConfig::builder().build();
        let mut sinks = empty_sinks();
        sinks.journal = Some(JournalSink::new(-1, Severity::Info));
        let vars = project(&config, &sinks);
        assert!(vars
            .iter()
            .any(|(name, value)| *name == "SRT_LOG_TO_JOURNAL" && value == "1"));
        assert!(!vars.iter().any(|(name, _)| *name == "SRT_LOGGER_USE_JOURNAL"));
    }

    #[test]
    fn journal_alongside_terminal_sets_to_journal_zero_and_use_journal() {
        let config = LoggerConfig::builder().build();
        let mut sinks = empty_sinks();
        sinks.journal = Some(JournalSink::new(-1, Severity::Info));
        sinks.terminal = Some(TerminalSink::new(-1, false, Severity::Info));
        let vars = project(&config, &sinks);
        assert!(vars
            .iter()
            .any(|(name, value)| *name == "SRT_LOG_TO_JOURNAL" && value == "0"));
        assert!(vars
            .iter()
            .any(|(name, value)| *name == "SRT_LOGGER_USE_JOURNAL" && value == "1"));
    }
}
