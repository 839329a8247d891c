//! Non-fatal diagnostics: per-sink write failures are reported here and the
//! pipeline continues, per the "no sink disablement except rotation" policy.

use std::io::Write;
use std::sync::OnceLock;

/// Which component produced a non-fatal diagnostic, mirrored in the printed
/// message so operators can grep for it.
#[derive(Debug, Clone, Copy)]
pub enum ErrorCode {
    File,
    Journal,
    Terminal,
    Stderr,
    Rotate,
    Lock,
    Reopen,
    Spawn,
    Fifo,
}

impl ErrorCode {
    fn as_str(self) -> &'static str {
        match self {
            ErrorCode::File => "file",
            ErrorCode::Journal => "journal",
            ErrorCode::Terminal => "terminal",
            ErrorCode::Stderr => "stderr",
            ErrorCode::Rotate => "rotate",
            ErrorCode::Lock => "lock",
            ErrorCode::Reopen => "reopen",
            ErrorCode::Spawn => "spawn",
            ErrorCode::Fifo => "fifo",
        }
    }
}

static PROGRAM_NAME: OnceLock<String> = OnceLock::new();

/// Sets the program-name prefix used on every diagnostic line. Called once
/// from `main`; defaults to `"srt-logger"` if never called.
pub fn set_program_name(name: impl Into<String>) {
    let _ = PROGRAM_NAME.set(name.into());
}

fn program_name() -> &'static str {
    PROGRAM_NAME.get_or_init(|| "srt-logger".to_string())
}

/// Writes a single-line, program-name-prefixed warning to the original
/// stderr, the way the spec requires for user-visible messages, before
/// continuing to the other sinks.
pub fn warn_err(code: ErrorCode, msg: &str, err: &dyn std::error::Error) {
    emit(&format!(
        "{}: warning: [{}] {msg}: {err}",
        program_name(),
        code.as_str()
    ));
}

/// As [`warn_err`], without an underlying `std::error::Error`.
pub fn warn_msg(code: ErrorCode, msg: &str) {
    emit(&format!(
        "{}: warning: [{}] {msg}",
        program_name(),
        code.as_str()
    ));
}

/// Fatal setup failure, reported before any sink is committed.
pub fn fatal(err: &dyn std::error::Error) {
    emit(&format!("{}: error: {err}", program_name()));
}

fn emit(line: &str) {
    let mut stderr = std::io::stderr();
    let _ = writeln!(stderr, "{line}");
}
