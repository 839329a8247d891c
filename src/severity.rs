//! The severity dictionary: numeric levels 0..7 and their case-insensitive aliases.

use std::fmt;
use std::str::FromStr;

/// A log line severity, ordered from most to least severe.
///
/// The discriminant is the numeric severity used on the wire (`<N>` prefixes,
/// journal priorities): lower numbers are more severe. `Severity` derives
/// `Ord` from declaration order, so `Severity::Error < Severity::Warning`
/// holds, matching the "severity at least as severe as ceiling" gating rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Severity {
    Emergency = 0,
    Alert = 1,
    Critical = 2,
    Error = 3,
    Warning = 4,
    Notice = 5,
    Info = 6,
    Debug = 7,
}

impl Severity {
    pub const MIN: Severity = Severity::Emergency;
    pub const MAX: Severity = Severity::Debug;

    /// Numeric value in 0..=7, as used in `<N>` prefixes and journal priorities.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Looks up the severity for a raw digit in `[0, 7]`.
    #[must_use]
    pub const fn from_digit(d: u8) -> Option<Severity> {
        Some(match d {
            0 => Severity::Emergency,
            1 => Severity::Alert,
            2 => Severity::Critical,
            3 => Severity::Error,
            4 => Severity::Warning,
            5 => Severity::Notice,
            6 => Severity::Info,
            7 => Severity::Debug,
            _ => return None,
        })
    }

    /// The canonical (lowercase) name, e.g. `"warning"`.
    #[must_use]
    pub const fn canonical_name(self) -> &'static str {
        match self {
            Severity::Emergency => "emergency",
            Severity::Alert => "alert",
            Severity::Critical => "critical",
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Notice => "notice",
            Severity::Info => "info",
            Severity::Debug => "debug",
        }
    }

    /// Whether a line at `self` should reach a sink whose ceiling is `ceiling`.
    ///
    /// Lines at least as severe as the ceiling pass; since lower numbers are
    /// more severe, this is `self <= ceiling`.
    #[must_use]
    pub fn passes_ceiling(self, ceiling: Severity) -> bool {
        self <= ceiling
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical_name())
    }
}

/// Error returned when a severity name or digit cannot be parsed.
#[derive(Debug, Clone, thiserror::Error)]
#[error("not a valid severity: {0:?}")]
pub struct ParseSeverityError(pub String);

impl FromStr for Severity {
    type Err = ParseSeverityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        if let Ok(d) = lower.parse::<u8>() {
            if let Some(sev) = Severity::from_digit(d) {
                return Ok(sev);
            }
        }
        let sev = match lower.as_str() {
            "emerg" | "emergency" => Severity::Emergency,
            "alert" | "a" => Severity::Alert,
            "crit" | "critical" | "c" => Severity::Critical,
            "err" | "error" | "e" => Severity::Error,
            "warn" | "warning" | "w" => Severity::Warning,
            "notice" | "n" => Severity::Notice,
            "info" | "i" => Severity::Info,
            "debug" | "d" => Severity::Debug,
            _ => return Err(ParseSeverityError(s.to_string())),
        };
        Ok(sev)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn ordering_matches_spec() {
        assert!(Severity::Emergency < Severity::Alert);
        assert!(Severity::Error < Severity::Warning);
        assert!(Severity::Warning < Severity::Debug);
    }

    #[test]
    fn aliases_are_case_insensitive() {
        for (alias, expected) in [
            ("ERR", Severity::Error),
            ("Warning", Severity::Warning),
            ("w", Severity::Warning),
            ("e", Severity::Error),
            ("6", Severity::Info),
            ("0", Severity::Emergency),
        ] {
            assert_eq!(alias.parse::<Severity>().unwrap(), expected);
        }
    }

    #[test]
    fn out_of_range_digit_is_rejected() {
        assert!("8".parse::<Severity>().is_err());
        assert!("bogus".parse::<Severity>().is_err());
    }

    #[test]
    fn gating_is_least_severe_allowed() {
        let ceiling = Severity::Warning;
        assert!(Severity::Error.passes_ceiling(ceiling));
        assert!(Severity::Warning.passes_ceiling(ceiling));
        assert!(!Severity::Info.passes_ceiling(ceiling));
    }
}
