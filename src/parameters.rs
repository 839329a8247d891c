//! Small self-contained parameter parsers used by the CLI surface (spec §6).

use crate::error::LoggerError;

/// Parses the `--rotate`/`SRT_LOG_ROTATION` grammar: `BYTES[K|KiB|M|MiB|...]`.
///
/// Decimal suffixes (`K`, `M`, `G`, `T`) are powers of 1000; binary suffixes
/// (`KiB`, `MiB`, `GiB`, `TiB`) are powers of 1024. A bare number is bytes.
/// `0` (with or without a suffix) disables rotation.
pub fn parse_byte_size(input: &str) -> Result<u64, LoggerError> {
    let s = input.trim();
    if s.is_empty() {
        return Err(LoggerError::BadArgument(
            "empty rotation size".to_string(),
        ));
    }

    let split_at = s
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(s.len());
    let (digits, suffix) = s.split_at(split_at);
    if digits.is_empty() {
        return Err(LoggerError::BadArgument(format!(
            "rotation size {input:?} has no leading digits"
        )));
    }
    let value: u64 = digits.parse().map_err(|_| {
        LoggerError::BadArgument(format!("rotation size {input:?} is not a number"))
    })?;

    let multiplier: u64 = match suffix.trim() {
        "" | "B" => 1,
        "K" => 1_000,
        "KiB" => 1024,
        "M" => 1_000_000,
        "MiB" => 1024 * 1024,
        "G" => 1_000_000_000,
        "GiB" => 1024 * 1024 * 1024,
        "T" => 1_000_000_000_000,
        "TiB" => 1024 * 1024 * 1024 * 1024,
        other => {
            return Err(LoggerError::BadArgument(format!(
                "unknown size suffix {other:?} in {input:?}"
            )))
        }
    };

    value
        .checked_mul(multiplier)
        .ok_or_else(|| LoggerError::BadArgument(format!("rotation size {input:?} overflows")))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn plain_number_is_bytes() {
        assert_eq!(parse_byte_size("1024").unwrap(), 1024);
    }

    #[test]
    fn decimal_and_binary_suffixes() {
        assert_eq!(parse_byte_size("8M").unwrap(), 8_000_000);
        assert_eq!(parse_byte_size("8MiB").unwrap(), 8 * 1024 * 1024);
        assert_eq!(parse_byte_size("1K").unwrap(), 1_000);
        assert_eq!(parse_byte_size("1KiB").unwrap(), 1024);
    }

    #[test]
    fn zero_disables_rotation() {
        assert_eq!(parse_byte_size("0").unwrap(), 0);
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_byte_size("").is_err());
        assert!(parse_byte_size("abc").is_err());
        assert!(parse_byte_size("10Foo").is_err());
    }
}
