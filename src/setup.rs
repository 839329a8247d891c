//! Logger setup (spec §4.2): resolves identifier/filename, decides which
//! sinks are active, opens the log file, writes the opening banner, and
//! builds the initial [`LoggerState`]/[`SinkSet`] pair.

use std::fs::OpenOptions;
use std::io::Write;
use std::os::fd::AsRawFd;
use std::os::unix::fs::OpenOptionsExt;
use std::path::PathBuf;

use nix::unistd::isatty;

use crate::config::LoggerConfig;
use crate::diagnostics::{self, ErrorCode};
use crate::error::{LoggerError, Result};
use crate::lock::FileLock;
use crate::parameters;
use crate::sinks::{FileSink, JournalSink, SinkSet, TerminalSink};
use crate::state::{FileIdentity, LoggerState};
use crate::timestamp;

pub struct SetupOutcome {
    pub state: LoggerState,
    pub sinks: SinkSet,
}

/// Runs the full setup sequence and returns the state/sinks pair the
/// pipeline will drive. Errors here are fatal: no sink has been committed
/// to, so the caller should report and exit rather than run partially
/// configured.
pub fn setup(config: &LoggerConfig) -> Result<SetupOutcome> {
    let identifier = resolve_identifier(config);
    let filename = resolve_filename(config, &identifier)?;
    let log_dir = resolve_log_dir(config)?;

    let max_bytes = resolve_max_bytes(config)?;

    let mut state = LoggerState::new(
        log_dir,
        filename,
        config.default_line_level,
        config.parse_level_prefix,
        max_bytes,
    );

    let file_sink = if config.use_file {
        Some(open_file_sink(config, &mut state, &identifier)?)
    } else {
        None
    };

    let journal_sink = if config.use_journal {
        config
            .journal_fd
            .map(|fd| JournalSink::new(fd, config.journal_level))
    } else {
        None
    };

    let use_colors = resolve_use_terminal_colors();
    let terminal_sink = resolve_terminal_sink(config, use_colors);
    state.use_terminal_colors = use_colors;

    if file_sink.is_none() && journal_sink.is_none() && terminal_sink.is_none() {
        diagnostics::warn_msg(
            ErrorCode::File,
            "no sinks configured; falling back to stderr only",
        );
        state.use_stderr = true;
    }

    let sinks = SinkSet {
        file: file_sink,
        journal: journal_sink,
        terminal: terminal_sink,
        stderr_fd: config.original_stderr,
        use_stderr_fallback: true,
        stderr_is_primary: state.use_stderr,
    };

    announce_sinks(&sinks);

    Ok(SetupOutcome { state, sinks })
}

fn resolve_identifier(config: &LoggerConfig) -> String {
    config
        .identifier
        .clone()
        .or_else(|| config.argv0.clone())
        .unwrap_or_else(|| "srt-logger".to_string())
}

fn resolve_filename(config: &LoggerConfig, identifier: &str) -> Result<String> {
    let filename = config
        .filename
        .clone()
        .unwrap_or_else(|| format!("{identifier}.txt"));
    validate_filename(&filename)?;
    Ok(filename)
}

/// Spec §4.2 step 1: `filename` must not contain `/`, must not begin with
/// `.`, and must be no longer than `i32::MAX` bytes.
fn validate_filename(filename: &str) -> Result<()> {
    if filename.contains('/') {
        return Err(LoggerError::BadArgument(format!(
            "filename {filename:?} must not contain '/'"
        )));
    }
    if filename.starts_with('.') {
        return Err(LoggerError::BadArgument(format!(
            "filename {filename:?} must not begin with '.'"
        )));
    }
    if filename.len() > i32::MAX as usize {
        return Err(LoggerError::BadArgument(
            "filename is excessively long".to_string(),
        ));
    }
    Ok(())
}

fn resolve_log_dir(config: &LoggerConfig) -> Result<PathBuf> {
    if let Some(dir) = &config.log_dir {
        return ensure_dir_exists(dir.clone());
    }
    if let Ok(dir) = std::env::var("SRT_LOG_DIR") {
        if !dir.is_empty() {
            return ensure_dir_exists(PathBuf::from(dir));
        }
    }
    if let Ok(dir) = std::env::var("STEAM_CLIENT_LOG_FOLDER") {
        if !dir.is_empty() {
            return ensure_dir_exists(PathBuf::from(dir));
        }
    }
    if let Ok(home) = std::env::var("HOME") {
        if !home.is_empty() {
            return ensure_dir_exists(PathBuf::from(home).join(".steam/steam/logs"));
        }
    }
    Err(LoggerError::NoLogDirectory(PathBuf::from(".")))
}

fn ensure_dir_exists(dir: PathBuf) -> Result<PathBuf> {
    if dir.is_dir() {
        Ok(dir)
    } else {
        Err(LoggerError::NoLogDirectory(dir))
    }
}

fn resolve_max_bytes(config: &LoggerConfig) -> Result<u64> {
    if let Ok(raw) = std::env::var("SRT_LOG_ROTATION") {
        return parameters::parse_byte_size(&raw);
    }
    Ok(config.max_bytes)
}

fn open_file_sink(
    config: &LoggerConfig,
    state: &mut LoggerState,
    identifier: &str,
) -> Result<FileSink> {
    let path = state.path();
    let file = if let Some(fd) = config.file_fd {
        unsafe { std::fs::File::from_raw_fd_checked(fd) }
    } else {
        OpenOptions::new()
            .create(true)
            .append(true)
            .mode(0o600)
            .open(&path)
            .map_err(|e| LoggerError::fs("open", path.clone(), e))?
    };

    let identity = FileIdentity::of(&path).map_err(|e| LoggerError::fs("stat", path.clone(), e))?;
    state.file_identity = Some(identity);

    let lock = FileLock::acquire_shared(file.as_raw_fd())
        .map_err(|e| LoggerError::LockRefused { path: path.clone(), source: e })?;

    if config.timestamps {
        let mut f = &file;
        let _ = f.write_all(timestamp::opened_banner(identifier).as_bytes());
    }

    Ok(FileSink::new(file, lock, identity.size, config.file_level, config.timestamps))
}

fn resolve_use_terminal_colors() -> bool {
    std::env::var_os("NO_COLOR").is_none()
}

/// Spec §4.2 step 5: an explicit `terminal_fd` wins outright; otherwise
/// `SRT_LOG_TERMINAL` is read as a tty device path to open (an empty value
/// disables the terminal sink entirely); with no env override, fall back to
/// the original stderr if it is a tty.
fn resolve_terminal_sink(config: &LoggerConfig, use_colors: bool) -> Option<TerminalSink> {
    if let Some(fd) = config.terminal_fd {
        return Some(TerminalSink::new(fd, use_colors, config.terminal_level));
    }
    if config.no_auto_terminal {
        return None;
    }

    match std::env::var("SRT_LOG_TERMINAL") {
        Ok(path) if path.is_empty() => None,
        Ok(path) => open_terminal_device(&path, use_colors, config.terminal_level),
        Err(_) => {
            let fd = config.original_stderr;
            let borrowed = unsafe { std::os::fd::BorrowedFd::borrow_raw(fd) };
            if isatty(borrowed).unwrap_or(false) {
                Some(TerminalSink::new(fd, use_colors, config.terminal_level))
            } else {
                None
            }
        }
    }
}

fn open_terminal_device(
    path: &str,
    use_colors: bool,
    ceiling: crate::severity::Severity,
) -> Option<TerminalSink> {
    let file = OpenOptions::new().write(true).open(path).ok()?;
    let fd = file.as_raw_fd();
    std::mem::forget(file); // the sink owns this fd for the process lifetime
    Some(TerminalSink::new(fd, use_colors, ceiling))
}

fn announce_sinks(sinks: &SinkSet) {
    let mut parts = Vec::new();
    if sinks.file.is_some() {
        parts.push("file");
    }
    if sinks.journal.is_some() {
        parts.push("journal");
    }
    if sinks.terminal.is_some() {
        parts.push("terminal");
    }
    if parts.is_empty() {
        parts.push("stderr");
    }
    diagnostics::warn_msg(ErrorCode::File, &format!("active sinks: {}", parts.join(", ")));
}

/// Helper trait object so `open_file_sink` can treat an inherited fd and a
/// freshly opened path uniformly.
trait FromRawFdChecked {
    unsafe fn from_raw_fd_checked(fd: std::os::fd::RawFd) -> std::fs::File;
}

impl FromRawFdChecked for std::fs::File {
    unsafe fn from_raw_fd_checked(fd: std::os::fd::RawFd) -> std::fs::File {
        use std::os::fd::FromRawFd;
        std::fs::File::from_raw_fd(fd)
    }
}
