//! The streaming dispatch loop (spec §4.4): reads from the wrapped process's
//! stdout/stderr pipe, splits it into lines, decides each line's severity,
//! and hands lines to the sink set — eagerly for partial-line sinks
//! (terminal, stderr), only on a complete line for file/journal.

use std::io::Read;

use crate::prefix::{self, PrefixOutcome};
use crate::severity::Severity;
use crate::sinks::{LineEvent, SinkSet};
use crate::state::{LoggerState, BUFFER_CAPACITY, LINE_MAX};
use crate::timestamp::LineTimestamp;

/// Drives the pipeline to completion: reads from `input` until EOF,
/// dispatching every complete line (and, at EOF, any trailing partial line)
/// to `sinks`.
pub fn run(
    input: &mut impl Read,
    state: &mut LoggerState,
    sinks: &mut SinkSet,
    rotate_after_file_write: impl Fn(&mut LoggerState, &mut SinkSet),
) -> std::io::Result<()> {
    loop {
        let free = BUFFER_CAPACITY - state.filled;
        if free == 0 {
            synthesize_overflow_break(state, sinks, &rotate_after_file_write);
            continue;
        }
        let n = input.read(&mut state.buffer[state.filled..state.filled + free])?;
        if n == 0 {
            break;
        }
        state.filled += n;
        drain_complete_lines(state, sinks, &rotate_after_file_write);
        flush_partial(state, sinks);
    }

    if state.filled > 0 {
        dispatch_line(state, sinks, state.filled, &rotate_after_file_write);
        state.filled = 0;
        state.already_processed_partial_line = 0;
        reset_line_tracking(state, false);
    }
    Ok(())
}

/// Pulls every complete (`\n`-terminated) line out of the front of the
/// buffer and dispatches it, then compacts the remainder to the front.
fn drain_complete_lines(
    state: &mut LoggerState,
    sinks: &mut SinkSet,
    rotate_after_file_write: &impl Fn(&mut LoggerState, &mut SinkSet),
) {
    loop {
        let search_from = state.already_processed_partial_line;
        let haystack = &state.buffer[search_from..state.filled];
        let Some(rel_nl) = haystack.iter().position(|&b| b == b'\n') else {
            state.already_processed_partial_line = state.filled;
            break;
        };
        let line_end = search_from + rel_nl + 1; // include the newline
        dispatch_line(state, sinks, line_end, rotate_after_file_write);
        compact(state, line_end, false);
    }
}

/// `LINE_MAX` bytes have accumulated with no newline in sight: synthesize a
/// newline at the end of the buffer, dispatch the line as-is, and keep
/// reading (spec §4.4 overflow handling). The bytes that follow are a
/// continuation of the same logical (overlong) line, so prefix parsing is
/// not re-attempted on them.
fn synthesize_overflow_break(
    state: &mut LoggerState,
    sinks: &mut SinkSet,
    rotate_after_file_write: &impl Fn(&mut LoggerState, &mut SinkSet),
) {
    let end = state.filled.min(LINE_MAX);
    state.buffer[end] = b'\n';
    dispatch_line(state, sinks, end + 1, rotate_after_file_write);
    compact(state, end + 1, true);
}

/// After draining every complete line, flush whatever unterminated tail
/// remains to the partial-line sinks, provided its severity prefix (if any)
/// can already be decided. Called once per read, so interactive terminals
/// see output before a newline arrives.
fn flush_partial(state: &mut LoggerState, sinks: &mut SinkSet) {
    if state.filled == 0 {
        return;
    }
    if state.current_line_severity.is_none() {
        match decide_prefix(state, 0, state.filled) {
            Some(decision) => apply_prefix_decision(state, decision),
            None => return,
        };
    }
    let severity = state.current_line_severity.expect("decided above");
    let prefix_len = state.current_line_prefix_len;
    if state.filled <= prefix_len {
        return;
    }
    let available = state.filled - prefix_len;
    if available <= state.partial_flushed {
        return;
    }
    let start = prefix_len + state.partial_flushed;
    let fragment = &state.buffer[start..state.filled];
    sinks.dispatch_partial(severity, fragment);
    state.partial_flushed = available;
}

fn dispatch_line(
    state: &mut LoggerState,
    sinks: &mut SinkSet,
    end: usize,
    rotate_after_file_write: &impl Fn(&mut LoggerState, &mut SinkSet),
) {
    if state.current_line_severity.is_none() {
        let decision = decide_prefix(state, 0, end).unwrap_or(PrefixDecision {
            consumed: 0,
            severity: state.default_line_level,
            disable_parsing: None,
        });
        apply_prefix_decision(state, decision);
    }
    let severity = state.current_line_severity.expect("decided above");
    let prefix_len = state.current_line_prefix_len;
    let already_flushed = state.partial_flushed;

    let text = strip_trailing_newline(&state.buffer[prefix_len..end]);
    let event = LineEvent {
        severity,
        text,
        already_flushed,
        timestamp: LineTimestamp::now(),
    };
    sinks.dispatch_complete(&event);
    rotate_after_file_write(state, sinks);
}

struct PrefixDecision {
    consumed: usize,
    severity: Severity,
    /// `Some(new_default)` if this was a stream-wide directive that
    /// disables further prefix parsing.
    disable_parsing: Option<Severity>,
}

/// Attempts to decide the severity prefix of `state.buffer[start..end]`
/// without mutating `state`. Returns `None` if more bytes are needed.
fn decide_prefix(state: &LoggerState, start: usize, end: usize) -> Option<PrefixDecision> {
    if !state.parse_level_prefix {
        return Some(PrefixDecision {
            consumed: 0,
            severity: state.default_line_level,
            disable_parsing: None,
        });
    }
    let line = &state.buffer[start..end];
    match prefix::parse_prefix(line) {
        PrefixOutcome::Found { consumed, severity } => Some(PrefixDecision {
            consumed,
            severity,
            disable_parsing: None,
        }),
        PrefixOutcome::Directive { consumed, severity } => Some(PrefixDecision {
            consumed,
            severity,
            disable_parsing: Some(severity),
        }),
        PrefixOutcome::None => Some(PrefixDecision {
            consumed: 0,
            severity: state.default_line_level,
            disable_parsing: None,
        }),
        PrefixOutcome::NeedMoreData => None,
    }
}

fn apply_prefix_decision(state: &mut LoggerState, decision: PrefixDecision) -> Severity {
    if let Some(new_default) = decision.disable_parsing {
        state.parse_level_prefix = false;
        state.default_line_level = new_default;
    }
    state.current_line_severity = Some(decision.severity);
    state.current_line_prefix_len = decision.consumed;
    decision.severity
}

fn strip_trailing_newline(line: &[u8]) -> &[u8] {
    line.strip_suffix(b"\n").unwrap_or(line)
}

/// Removes the first `consumed` bytes of the buffer, shifting the rest
/// (including any still-unterminated partial line) down to index 0, and
/// resets per-line tracking for the line that now starts at index 0.
fn compact(state: &mut LoggerState, consumed: usize, continuation: bool) {
    let remaining = state.filled - consumed;
    state.buffer.copy_within(consumed..state.filled, 0);
    state.filled = remaining;
    state.already_processed_partial_line = 0;
    reset_line_tracking(state, continuation);
}

fn reset_line_tracking(state: &mut LoggerState, continuation: bool) {
    state.partial_flushed = 0;
    state.current_line_prefix_len = 0;
    state.current_line_severity = if continuation {
        Some(state.default_line_level)
    } else {
        None
    };
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::sinks::SinkSet;
    use std::io::Cursor;

    fn fresh_state() -> LoggerState {
        LoggerState::new(
            std::path::PathBuf::from("/tmp"),
            "test.log".to_string(),
            Severity::Info,
            true,
            0,
        )
    }

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

    fn decide(state: &mut LoggerState, line: &[u8]) -> (usize, Severity) {
        state.buffer[..line.len()].copy_from_slice(line);
        state.filled = line.len();
        let decision = decide_prefix(state, 0, line.len()).expect("decidable");
        let sev = apply_prefix_decision(state, decision);
        (state.current_line_prefix_len, sev)
    }

    #[test]
    fn decides_severity_from_prefix_and_strips_it() {
        let mut state = fresh_state();
        let (prefix_len, sev) = decide(&mut state, b"<3>boom\n");
        assert_eq!(sev, Severity::Error);
        assert_eq!(&state.buffer[prefix_len..state.filled], b"boom\n");
    }

    #[test]
    fn directive_disables_further_parsing() {
        let mut state = fresh_state();
        let (prefix_len, sev) = decide(&mut state, b"<remaining-lines-assume-level=4>\n");
        assert_eq!(sev, Severity::Warning);
        assert_eq!(prefix_len, state.filled);
        assert!(!state.parse_level_prefix);
        assert_eq!(state.default_line_level, Severity::Warning);
    }

    #[test]
    fn no_prefix_falls_back_to_default_level() {
        let mut state = fresh_state();
        let (prefix_len, sev) = decide(&mut state, b"plain line\n");
        assert_eq!(sev, Severity::Info);
        assert_eq!(&state.buffer[prefix_len..state.filled], b"plain line\n");
    }

    #[test]
    fn run_drains_multiple_lines_without_panicking() {
        let mut state = fresh_state();
        let mut sinks = empty_sinks();
        let mut input = Cursor::new(b"one\ntwo\nthree".to_vec());
        run(&mut input, &mut state, &mut sinks, |_, _| {}).unwrap();
        assert_eq!(state.filled, 0);
    }

    #[test]
    fn partial_line_is_flushed_to_terminal_before_newline_arrives() {
        use crate::sinks::TerminalSink;
        use nix::unistd::pipe;
        use std::io::Read as _;
        use std::os::fd::{AsRawFd, FromRawFd, IntoRawFd};

        let mut state = fresh_state();
        let (term_read, term_write) = pipe().unwrap();
        let mut sinks = SinkSet {
            file: None,
            journal: None,
            terminal: Some(TerminalSink::new(term_write.as_raw_fd(), false, Severity::Debug)),
            stderr_fd: -1,
            use_stderr_fallback: false,
            stderr_is_primary: false,
        };

        state.buffer[..5].copy_from_slice(b"hello");
        state.filled = 5;
        drain_complete_lines(&mut state, &mut sinks, &|_, _| {});
        flush_partial(&mut state, &mut sinks);

        drop(sinks);
        drop(term_write);

        let mut out = Vec::new();
        let mut reader = unsafe { std::fs::File::from_raw_fd(term_read.into_raw_fd()) };
        reader.read_to_end(&mut out).unwrap();
        assert_eq!(out, b"hello");
    }
}
