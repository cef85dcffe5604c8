//! Selection commands read from the input stream.

use chrono::{DateTime, Utc};
use scrobble_common::parse_timestamp;

/// One line of input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Select `[start, end]`.
    Select {
        /// Requested start.
        start: DateTime<Utc>,
        /// Requested end.
        end: DateTime<Utc>,
    },
    /// Restore the default window.
    Reset,
}

/// Parse a command line.
///
/// Blank lines and `#` comments yield `Ok(None)`. Timestamps accept the
/// same formats as the record loader.
pub fn parse_command(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    if line.eq_ignore_ascii_case("reset") {
        return Ok(Some(Command::Reset));
    }

    let mut parts = line.split_whitespace();
    let (Some(start), Some(end), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(format!("expected 'START END' or 'reset', got '{line}'"));
    };
    let start = parse_timestamp(start).ok_or_else(|| format!("bad start '{start}'"))?;
    let end = parse_timestamp(end).ok_or_else(|| format!("bad end '{end}'"))?;
    Ok(Some(Command::Select { start, end }))
}
