//! Subprocess launcher (spec §4.6): forks the logger engine, optionally
//! double-forks to daemonize it, wires up the data/ready pipes, and execs
//! the wrapped program once the logger signals readiness.
//!
//! Grounded on the pack's `fork()`/`Fork` helper
//! (`ddtelemetry/src/fork.rs`), generalized from "fork and run a closure" to
//! "fork, set up pipes, and either run the logger engine or exec a new
//! program".

use std::ffi::CString;
use std::io::Read;
use std::os::fd::{AsRawFd, OwnedFd, RawFd};

use nix::fcntl::{fcntl, FcntlArg, FdFlag};
use nix::sys::signal::{signal, SigHandler, Signal};
use nix::unistd::{close, dup2_stderr, dup2_stdout, fork, pipe, setsid, ForkResult, Pid};

use crate::error::{LoggerError, Result};

const READY_TOKEN: &str = "SRT_LOGGER_READY=1\n";
const PID_VAR: &str = "SRT_LOGGER_PID";

/// Result of forking and waiting for the logger engine to become ready.
pub struct LaunchedLogger {
    /// The logger engine's actual pid, as reported on the ready pipe — not
    /// necessarily the pid `fork()` returned, since a backgrounded logger
    /// double-forks and the immediate child exits (spec §4.6, §8).
    pub logger_pid: Pid,
    /// The end of the data pipe the wrapped program's stdout/stderr should
    /// be redirected to. Kept as an `OwnedFd` so it stays open until
    /// `exec_wrapped` has dup2'd it onto stdout/stderr.
    pub data_write: OwnedFd,
    /// Environment assignments the logger emitted on the ready pipe before
    /// its readiness token (spec §4.6 steps 4-5), in the order received.
    pub env_assignments: Vec<EnvAssignment>,
}

/// One `NAME=value` line seen on the ready pipe, before the ready token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvAssignment {
    pub name: String,
    pub value: String,
    /// Whether the line used `export NAME=value` shell syntax (`--sh-syntax`).
    pub exported: bool,
}

/// Installs the process-wide `SIGPIPE` policy required before any pipe is
/// opened: writers to a pipe with no reader get `EPIPE`, not a signal
/// (spec §4.6).
pub fn ignore_sigpipe() {
    unsafe {
        let _ = signal(Signal::SIGPIPE, SigHandler::SigIgn);
    }
}

/// Forks the logger engine (running `run_engine` in the child), optionally
/// daemonizing it with a double fork, and blocks until it reports
/// readiness on the ready pipe.
pub fn launch(
    background: bool,
    run_engine: impl FnOnce(RawFd, RawFd) -> std::convert::Infallible + Send + 'static,
) -> Result<LaunchedLogger> {
    let (data_read, data_write) = pipe().map_err(|e| LoggerError::Spawn {
        what: "data pipe",
        source: e.into(),
    })?;
    let (ready_read, ready_write) = pipe().map_err(|e| LoggerError::Spawn {
        what: "ready pipe",
        source: e.into(),
    })?;

    clear_cloexec(data_read.as_raw_fd());
    clear_cloexec(ready_write.as_raw_fd());

    let forked_pid = spawn_logger(background, data_read.as_raw_fd(), ready_write.as_raw_fd(), run_engine)?;

    drop(data_read);
    drop(ready_write);

    let handshake = wait_for_ready(ready_read.as_raw_fd())?;
    let _ = close(ready_read.as_raw_fd());

    Ok(LaunchedLogger {
        logger_pid: handshake.pid.unwrap_or(forked_pid),
        data_write,
        env_assignments: handshake.assignments,
    })
}

fn spawn_logger(
    background: bool,
    data_read_fd: RawFd,
    ready_write_fd: RawFd,
    run_engine: impl FnOnce(RawFd, RawFd) -> std::convert::Infallible + Send + 'static,
) -> Result<Pid> {
    match unsafe { fork() }.map_err(|e| LoggerError::Spawn {
        what: "logger process",
        source: e.into(),
    })? {
        ForkResult::Parent { child } => Ok(child),
        ForkResult::Child => {
            if background {
                daemonize();
            }
            match run_engine(data_read_fd, ready_write_fd) {}
        }
    }
}

/// Double-fork daemonization: detach from the controlling terminal and
/// reparent to init, so the logger survives the launching shell exiting.
fn daemonize() {
    let _ = setsid();
    match unsafe { fork() } {
        Ok(ForkResult::Parent { .. }) => std::process::exit(0),
        Ok(ForkResult::Child) => {}
        Err(_) => {}
    }
}

fn clear_cloexec(fd: RawFd) {
    let borrowed = unsafe { std::os::fd::BorrowedFd::borrow_raw(fd) };
    let _ = fcntl(borrowed, FcntlArg::F_SETFD(FdFlag::empty()));
}

/// What the logger engine reported on the ready pipe before its token.
struct ReadyHandshake {
    pid: Option<Pid>,
    assignments: Vec<EnvAssignment>,
}

/// Reads from the ready pipe until EOF, requiring the final bytes to be
/// exactly `SRT_LOGGER_READY=1\n` (spec §4.6). Any other content, or an
/// empty pipe, is a fatal setup failure. Lines before the token are parsed
/// as `SRT_LOGGER_PID=<pid>` and `[export ]NAME=value` assignments.
fn wait_for_ready(ready_read_fd: RawFd) -> Result<ReadyHandshake> {
    let mut file = unsafe { std::fs::File::from_raw_fd_checked(ready_read_fd) };
    let mut buf = Vec::new();
    file.read_to_end(&mut buf)
        .map_err(|e| LoggerError::Spawn { what: "ready pipe read", source: e })?;
    std::mem::forget(file);

    if buf.is_empty() {
        return Err(LoggerError::UnexpectedEof);
    }
    if !buf.ends_with(READY_TOKEN.as_bytes()) {
        return Err(LoggerError::NotReady);
    }
    let body = &buf[..buf.len() - READY_TOKEN.len()];
    Ok(parse_handshake_lines(body))
}

fn parse_handshake_lines(body: &[u8]) -> ReadyHandshake {
    let mut pid = None;
    let mut assignments = Vec::new();
    for line in body.split(|&b| b == b'\n') {
        if line.is_empty() {
            continue;
        }
        let line = String::from_utf8_lossy(line);
        let (exported, rest) = match line.strip_prefix("export ") {
            Some(rest) => (true, rest),
            None => (false, line.as_ref()),
        };
        let Some((name, value)) = rest.split_once('=') else {
            continue;
        };
        if name == PID_VAR {
            pid = value.parse::<i32>().ok().map(Pid::from_raw);
            continue;
        }
        assignments.push(EnvAssignment {
            name: name.to_string(),
            value: value.to_string(),
            exported,
        });
    }
    ReadyHandshake { pid, assignments }
}

/// Final step before running the wrapped program: redirect its stdout and
/// stderr onto the data pipe, then exec. Never returns on success.
///
/// Takes ownership of `data_write` so the pipe's write end stays open for
/// the `dup2` calls below; it is closed (if not 0/1/2) once they're done.
pub fn exec_wrapped(data_write: OwnedFd, argv: &[String]) -> Result<std::convert::Infallible> {
    let data_write_fd = data_write.as_raw_fd();
    let _ = dup2_stdout(&data_write);
    let _ = dup2_stderr(&data_write);
    if data_write_fd > 2 {
        drop(data_write);
    } else {
        // dup2(fd, fd) is a no-op per POSIX: fd *is* one of the targets
        // we just dup'd onto, so dropping it here would close that target.
        std::mem::forget(data_write);
    }

    let program = CString::new(argv[0].as_bytes()).map_err(|_| LoggerError::BadArgument(
        "program path contains a NUL byte".to_string(),
    ))?;
    let c_args: std::result::Result<Vec<CString>, _> =
        argv.iter().map(|a| CString::new(a.as_bytes())).collect();
    let c_args = c_args.map_err(|_| {
        LoggerError::BadArgument("an argument contains a NUL byte".to_string())
    })?;

    let err = nix::unistd::execvp(&program, &c_args).unwrap_err();
    Err(LoggerError::Spawn {
        what: "wrapped program",
        source: err.into(),
    })
}

trait FromRawFdChecked {
    unsafe fn from_raw_fd_checked(fd: RawFd) -> std::fs::File;
}

impl FromRawFdChecked for std::fs::File {
    unsafe fn from_raw_fd_checked(fd: RawFd) -> std::fs::File {
        use std::os::fd::FromRawFd;
        std::fs::File::from_raw_fd(fd)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn ready_token_requires_exact_suffix() {
        assert!(wait_for_ready_bytes(b"SRT_LOGGER_READY=1\n").is_ok());
        assert!(wait_for_ready_bytes(b"garbage").is_err());
        assert!(wait_for_ready_bytes(b"").is_err());
        assert!(wait_for_ready_bytes(b"SRT_LOGGER_PID=123\nSRT_LOGGER_READY=1\n").is_ok());
    }

    fn wait_for_ready_bytes(buf: &[u8]) -> Result<()> {
        if buf.is_empty() {
            return Err(LoggerError::UnexpectedEof);
        }
        if !buf.ends_with(READY_TOKEN.as_bytes()) {
            return Err(LoggerError::NotReady);
        }
        Ok(())
    }

    #[test]
    fn parses_pid_and_plain_assignments() {
        let h = parse_handshake_lines(b"SRT_LOGGER_PID=4242\nSRT_LOG_TERMINAL=/dev/pts/3\n");
        assert_eq!(h.pid, Some(Pid::from_raw(4242)));
        assert_eq!(
            h.assignments,
            vec![EnvAssignment {
                name: "SRT_LOG_TERMINAL".to_string(),
                value: "/dev/pts/3".to_string(),
                exported: false,
            }]
        );
    }

    #[test]
    fn sh_syntax_lines_are_marked_exported() {
        let h = parse_handshake_lines(b"export SRT_LOG_TO_JOURNAL=1\n");
        assert!(h.assignments[0].exported);
        assert_eq!(h.assignments[0].name, "SRT_LOG_TO_JOURNAL");
        assert_eq!(h.assignments[0].value, "1");
    }

    #[test]
    fn missing_pid_line_leaves_pid_none() {
        let h = parse_handshake_lines(b"SRT_LOG_LEVEL_PREFIX=0\n");
        assert_eq!(h.pid, None);
    }
}
