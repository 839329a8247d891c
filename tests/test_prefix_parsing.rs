//! Exercises the severity-prefix grammar end to end through the pipeline,
//! without any real sinks attached.

use srt_logger::pipeline;
use srt_logger::severity::Severity;
use srt_logger::sinks::SinkSet;
use srt_logger::state::LoggerState;

fn state_with_prefix_parsing() -> LoggerState {
    LoggerState::new(
        std::env::temp_dir(),
        "wrapped.log".to_string(),
        Severity::Info,
        true,
        0,
    )
}

fn no_sinks() -> SinkSet {
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
fn stream_with_mixed_prefixes_runs_to_completion() {
    let mut state = state_with_prefix_parsing();
    let mut sinks = no_sinks();
    let mut input = std::io::Cursor::new(
        b"<3>disk full\n<6>starting up\nno prefix here\n".to_vec(),
    );
    pipeline::run(&mut input, &mut state, &mut sinks, |_, _| {}).unwrap();
    assert_eq!(state.filled, 0);
}

#[test]
fn directive_disables_prefix_parsing_for_remainder_of_stream() {
    let mut state = state_with_prefix_parsing();
    let mut sinks = no_sinks();
    let mut input = std::io::Cursor::new(
        b"<remaining-lines-assume-level=1>\n<3>looks like a prefix but is not\n".to_vec(),
    );
    pipeline::run(&mut input, &mut state, &mut sinks, |_, _| {}).unwrap();
    assert!(!state.parse_level_prefix);
    assert_eq!(state.default_line_level, Severity::Alert);
}
