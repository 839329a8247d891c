//! `LoggerConfig`: the immutable configuration produced by the CLI (or by a
//! library caller) and consumed once by [`crate::setup::setup`] (spec §3).

use std::os::fd::RawFd;
use std::path::PathBuf;

use crate::severity::Severity;

/// Default rotation threshold when neither `--rotate` nor `SRT_LOG_ROTATION`
/// is given.
pub const DEFAULT_MAX_BYTES: u64 = 8 * 1024 * 1024;

/// Immutable logger configuration (spec §3 `LoggerConfig`).
#[derive(Debug, Clone)]
pub struct LoggerConfig {
    pub argv0: Option<String>,
    pub identifier: Option<String>,
    pub filename: Option<String>,
    pub log_dir: Option<PathBuf>,

    pub max_bytes: u64,

    pub default_line_level: Severity,
    pub file_level: Severity,
    pub journal_level: Severity,
    pub terminal_level: Severity,

    pub background: bool,
    pub sh_syntax: bool,
    pub parse_level_prefix: bool,
    pub timestamps: bool,
    pub use_file: bool,
    pub use_journal: bool,
    pub use_terminal: bool,
    pub no_auto_terminal: bool,
    pub exec_fallback: bool,

    pub file_fd: Option<RawFd>,
    pub journal_fd: Option<RawFd>,
    pub terminal_fd: Option<RawFd>,
    pub original_stderr: RawFd,
}

impl LoggerConfig {
    #[must_use]
    pub fn builder() -> LoggerConfigBuilder {
        LoggerConfigBuilder::default()
    }
}

/// Builder for [`LoggerConfig`], mirroring the teacher's `Logger`
/// builder-of-immutable-value shape (see `logger.rs`).
#[derive(Debug, Clone)]
pub struct LoggerConfigBuilder {
    argv0: Option<String>,
    identifier: Option<String>,
    filename: Option<String>,
    log_dir: Option<PathBuf>,
    max_bytes: Option<u64>,
    default_line_level: Severity,
    file_level: Severity,
    journal_level: Severity,
    terminal_level: Severity,
    background: bool,
    sh_syntax: bool,
    parse_level_prefix: bool,
    timestamps: bool,
    use_journal: bool,
    no_auto_terminal: bool,
    exec_fallback: bool,
    file_fd: Option<RawFd>,
    journal_fd: Option<RawFd>,
    terminal_fd: Option<RawFd>,
    original_stderr: RawFd,
}

impl Default for LoggerConfigBuilder {
    fn default() -> Self {
        LoggerConfigBuilder {
            argv0: None,
            identifier: None,
            filename: None,
            log_dir: None,
            max_bytes: None,
            default_line_level: Severity::Info,
            file_level: Severity::Debug,
            journal_level: Severity::Debug,
            terminal_level: Severity::Info,
            background: false,
            sh_syntax: false,
            parse_level_prefix: false,
            timestamps: true,
            use_journal: false,
            no_auto_terminal: false,
            exec_fallback: false,
            file_fd: None,
            journal_fd: None,
            terminal_fd: None,
            original_stderr: 2,
        }
    }
}

macro_rules! setter {
    ($name:ident: $ty:ty) => {
        #[must_use]
        pub fn $name(mut self, value: $ty) -> Self {
            self.$name = value;
            self
        }
    };
}

impl LoggerConfigBuilder {
    #[must_use]
    pub fn argv0(mut self, value: impl Into<String>) -> Self {
        self.argv0 = Some(value.into());
        self
    }
    #[must_use]
    pub fn identifier(mut self, value: impl Into<String>) -> Self {
        self.identifier = Some(value.into());
        self
    }
    #[must_use]
    pub fn filename(mut self, value: impl Into<String>) -> Self {
        self.filename = Some(value.into());
        self
    }
    #[must_use]
    pub fn log_dir(mut self, value: impl Into<PathBuf>) -> Self {
        self.log_dir = Some(value.into());
        self
    }
    #[must_use]
    pub fn max_bytes(mut self, value: u64) -> Self {
        self.max_bytes = Some(value);
        self
    }

    setter!(default_line_level: Severity);
    setter!(file_level: Severity);
    setter!(journal_level: Severity);
    setter!(terminal_level: Severity);
    setter!(background: bool);
    setter!(sh_syntax: bool);
    setter!(parse_level_prefix: bool);
    setter!(timestamps: bool);
    setter!(use_journal: bool);
    setter!(no_auto_terminal: bool);
    setter!(exec_fallback: bool);

    #[must_use]
    pub fn file_fd(mut self, fd: RawFd) -> Self {
        self.file_fd = Some(fd);
        self
    }
    #[must_use]
    pub fn journal_fd(mut self, fd: RawFd) -> Self {
        self.journal_fd = Some(fd);
        self
    }
    #[must_use]
    pub fn terminal_fd(mut self, fd: RawFd) -> Self {
        self.terminal_fd = Some(fd);
        self
    }
    #[must_use]
    pub fn original_stderr(mut self, fd: RawFd) -> Self {
        self.original_stderr = fd;
        self
    }

    #[must_use]
    pub fn build(self) -> LoggerConfig {
        LoggerConfig {
            argv0: self.argv0,
            identifier: self.identifier,
            filename: self.filename,
            log_dir: self.log_dir,
            max_bytes: self.max_bytes.unwrap_or(DEFAULT_MAX_BYTES),
            default_line_level: self.default_line_level,
            file_level: self.file_level,
            journal_level: self.journal_level,
            terminal_level: self.terminal_level,
            background: self.background,
            sh_syntax: self.sh_syntax,
            parse_level_prefix: self.parse_level_prefix,
            timestamps: self.timestamps,
            // `use_file`/`use_terminal` are decided during setup, not here;
            // the caller only states explicit overrides via *_fd/--use-journal.
            use_file: true,
            use_journal: self.use_journal,
            use_terminal: !self.no_auto_terminal,
            no_auto_terminal: self.no_auto_terminal,
            exec_fallback: self.exec_fallback,
            file_fd: self.file_fd,
            journal_fd: self.journal_fd,
            terminal_fd: self.terminal_fd,
            original_stderr: self.original_stderr,
        }
    }
}
