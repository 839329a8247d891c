//! Level-prefix parser: strips `<N>` and `<remaining-lines-assume-level=N>`
//! directives from line starts (spec §4.1).

use crate::severity::Severity;

const DIRECTIVE_LITERAL: &[u8] = b"remaining-lines-assume-level=";

/// Outcome of attempting to decide a line's severity prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefixOutcome {
    /// No prefix at the start of the buffer; use the current default
    /// severity, consume nothing.
    None,
    /// The buffer ends before the prefix (or lack thereof) could be
    /// decided; ask for more bytes before consuming anything.
    NeedMoreData,
    /// A simple `<N>` prefix was found; `consumed` bytes (including both
    /// angle brackets) should be dropped from the line.
    Found { consumed: usize, severity: Severity },
    /// A once-per-stream `<remaining-lines-assume-level=N>\n` directive was
    /// found; `consumed` bytes (including the trailing `\n`) should be
    /// dropped, and further prefix parsing must be disabled.
    Directive { consumed: usize, severity: Severity },
}

/// Attempts to decide the severity prefix at the start of `buf`.
///
/// `buf` is the as-yet-unparsed start of a logical line (it may or may not
/// yet contain the full line). Never consumes bytes on `None`/`NeedMoreData`.
#[must_use]
pub fn parse_prefix(buf: &[u8]) -> PrefixOutcome {
    if buf.is_empty() {
        return PrefixOutcome::NeedMoreData;
    }
    if buf[0] != b'<' {
        return PrefixOutcome::None;
    }

    // Try the directive form first: `<remaining-lines-assume-level=N>\n`.
    match try_directive(buf) {
        Outcome::Decided(o) => return o,
        Outcome::Undecided => return PrefixOutcome::NeedMoreData,
        Outcome::NotThisForm => {}
    }

    // Fall back to the simple `<N>` form.
    try_simple(buf)
}

enum Outcome {
    Decided(PrefixOutcome),
    Undecided,
    NotThisForm,
}

fn try_directive(buf: &[u8]) -> Outcome {
    let lit_len = DIRECTIVE_LITERAL.len();
    // buf[0] is '<'; the literal starts at buf[1].
    let avail = buf.len().saturating_sub(1);
    let compare_len = avail.min(lit_len);
    if buf[1..1 + compare_len] != DIRECTIVE_LITERAL[..compare_len] {
        return Outcome::NotThisForm;
    }
    if compare_len < lit_len {
        // Matches so far but buffer is too short to tell.
        return Outcome::Undecided;
    }

    let digit_pos = 1 + lit_len;
    let Some(&digit) = buf.get(digit_pos) else {
        return Outcome::Undecided;
    };
    if !digit.is_ascii_digit() {
        return Outcome::Decided(PrefixOutcome::None);
    }
    let Some(severity) = Severity::from_digit(digit - b'0') else {
        return Outcome::Decided(PrefixOutcome::None);
    };

    let close_pos = digit_pos + 1;
    let Some(&close) = buf.get(close_pos) else {
        return Outcome::Undecided;
    };
    if close != b'>' {
        return Outcome::Decided(PrefixOutcome::None);
    }

    let nl_pos = close_pos + 1;
    let Some(&nl) = buf.get(nl_pos) else {
        return Outcome::Undecided;
    };
    if nl != b'\n' {
        return Outcome::Decided(PrefixOutcome::None);
    }

    Outcome::Decided(PrefixOutcome::Directive {
        consumed: nl_pos + 1,
        severity,
    })
}

fn try_simple(buf: &[u8]) -> PrefixOutcome {
    // buf[0] == '<'
    let Some(&digit) = buf.get(1) else {
        return PrefixOutcome::NeedMoreData;
    };
    if !digit.is_ascii_digit() {
        return PrefixOutcome::None;
    }
    let Some(severity) = Severity::from_digit(digit - b'0') else {
        return PrefixOutcome::None;
    };
    let Some(&close) = buf.get(2) else {
        return PrefixOutcome::NeedMoreData;
    };
    if close != b'>' {
        return PrefixOutcome::None;
    }
    PrefixOutcome::Found {
        consumed: 3,
        severity,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn no_leading_angle_bracket_is_no_prefix() {
        assert_eq!(parse_prefix(b"hello\n"), PrefixOutcome::None);
    }

    #[test]
    fn empty_buffer_needs_more_data() {
        assert_eq!(parse_prefix(b""), PrefixOutcome::NeedMoreData);
    }

    #[test]
    fn simple_prefix_every_digit() {
        for d in 0u8..=7 {
            let line = format!("<{d}>hello\n");
            let sev = Severity::from_digit(d).unwrap();
            assert_eq!(
                parse_prefix(line.as_bytes()),
                PrefixOutcome::Found {
                    consumed: 3,
                    severity: sev
                }
            );
        }
    }

    #[test]
    fn out_of_range_digit_is_no_prefix() {
        assert_eq!(parse_prefix(b"<8>hello\n"), PrefixOutcome::None);
    }

    #[test]
    fn missing_closing_bracket_is_no_prefix() {
        assert_eq!(parse_prefix(b"<3xhello\n"), PrefixOutcome::None);
    }

    #[test]
    fn truncated_simple_prefix_needs_more_data() {
        assert_eq!(parse_prefix(b"<"), PrefixOutcome::NeedMoreData);
        assert_eq!(parse_prefix(b"<3"), PrefixOutcome::NeedMoreData);
    }

    #[test]
    fn directive_is_recognised() {
        let line = b"<remaining-lines-assume-level=4>\nA\n";
        assert_eq!(
            parse_prefix(line),
            PrefixOutcome::Directive {
                consumed: "<remaining-lines-assume-level=4>\n".len(),
                severity: Severity::Warning,
            }
        );
    }

    #[test]
    fn directive_without_trailing_newline_is_no_prefix() {
        assert_eq!(
            parse_prefix(b"<remaining-lines-assume-level=4>X"),
            PrefixOutcome::None
        );
    }

    #[test]
    fn truncated_directive_needs_more_data() {
        assert_eq!(
            parse_prefix(b"<remaining-lines-assume-lev"),
            PrefixOutcome::NeedMoreData
        );
        assert_eq!(
            parse_prefix(b"<remaining-lines-assume-level="),
            PrefixOutcome::NeedMoreData
        );
        assert_eq!(
            parse_prefix(b"<remaining-lines-assume-level=4"),
            PrefixOutcome::NeedMoreData
        );
        assert_eq!(
            parse_prefix(b"<remaining-lines-assume-level=4>"),
            PrefixOutcome::NeedMoreData
        );
    }

    #[test]
    fn prefix_like_but_different_literal_falls_back_to_simple() {
        // starts like the directive but diverges -> not the directive form,
        // and not a valid simple prefix either (second byte isn't a digit).
        assert_eq!(parse_prefix(b"<remainder>\n"), PrefixOutcome::None);
    }
}
