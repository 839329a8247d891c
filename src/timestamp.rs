//! Timestamp formatting for the file sink and the opening banner (spec §4.5, §6).
//!
//! Mirrors the teacher's `DeferredNow` idea (compute once, reuse for every
//! sink that wants it) but keeps to `chrono::Local`, matching this crate's
//! dependency choice.

use chrono::Local;

/// A timestamp captured once for a logical line, reused across whichever
/// sinks want to print it.
#[derive(Debug, Clone, Copy)]
pub struct LineTimestamp(chrono::DateTime<Local>);

impl LineTimestamp {
    #[must_use]
    pub fn now() -> Self {
        LineTimestamp(Local::now())
    }

    /// `[YYYY-MM-DD HH:MM:SS] ` as required for file-sink lines.
    #[must_use]
    pub fn file_prefix(&self) -> String {
        format!("[{}] ", self.0.format("%Y-%m-%d %H:%M:%S"))
    }
}

/// The "Log opened" banner text, including the local time zone abbreviation,
/// written as the very first line of a freshly opened log file.
#[must_use]
pub fn opened_banner(identifier: &str) -> String {
    let now = Local::now();
    format!(
        "[{}] Log opened {} (UTC offset {})\n",
        now.format("%Y-%m-%d %H:%M:%S"),
        identifier,
        now.format("%:z"),
    )
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn file_prefix_has_expected_shape() {
        let ts = LineTimestamp::now();
        let p = ts.file_prefix();
        assert!(p.starts_with('['));
        assert!(p.ends_with("] "));
        assert_eq!(p.len(), "[YYYY-MM-DD HH:MM:SS] ".len());
    }

    #[test]
    fn banner_mentions_identifier() {
        let b = opened_banner("my-prog");
        assert!(b.contains("Log opened my-prog"));
        assert!(b.ends_with('\n'));
    }
}
