use std::fmt;

use chrono::{
    format::{Item, StrftimeItems},
    NaiveTime, Timelike,
};

use crate::{CaptionError, Result};

/// Default stamp layout, `00:01:02,345`.
pub const DEFAULT_PATTERN: &str = "HH:MM:SS,mmm";

/// A compiled timestamp layout.
///
/// Patterns are written either in the short notation used by subtitle tools
/// (`HH:MM:SS,mmm`, where a run of three, six or nine `m` selects milli-,
/// micro- or nanosecond digits) or, when they contain a `%`, as a raw chrono
/// strftime string such as `%H:%M:%S%.3f`.
///
/// A bare `%f` in a strftime pattern reads the fractional part of the second
/// (`,5` is half a second, as with C and Python `strptime`), not chrono's
/// integer nanoseconds. It has to close the pattern and follow a separator.
#[derive(Clone, PartialEq, Eq)]
pub struct TimestampPattern {
    source: String,
    strftime: String,
    trailing_fraction: bool,
}

impl TimestampPattern {
    pub fn new(pattern: &str) -> Result<Self> {
        let (strftime, trailing_fraction) = if pattern.contains('%') {
            split_trailing_fraction(pattern)?
        } else {
            (translate_notation(pattern)?, false)
        };

        if strftime.is_empty() {
            return Err(CaptionError::Pattern("pattern is empty".to_string()));
        }
        if StrftimeItems::new(&strftime).any(|item| matches!(item, Item::Error)) {
            return Err(CaptionError::Pattern(format!(
                "`{pattern}` is not a valid strftime pattern"
            )));
        }

        Ok(Self {
            source: pattern.to_string(),
            strftime,
            trailing_fraction,
        })
    }

    /// The pattern as it was written by the user.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// The chrono format string the pattern compiles to.
    pub fn strftime(&self) -> &str {
        &self.strftime
    }

    /// Parses a stamp into seconds since 00:00:00.000, at microsecond
    /// resolution. Returns `None` when the stamp does not match.
    pub fn parse_seconds(&self, stamp: &str) -> Option<f64> {
        let (stamp, fraction_nanos) = if self.trailing_fraction {
            split_fraction_digits(stamp)?
        } else {
            (stamp, 0)
        };

        let time = NaiveTime::parse_from_str(stamp, &self.strftime).ok()?;
        let nanos = time.nanosecond() + fraction_nanos;
        let micros =
            u64::from(time.num_seconds_from_midnight()) * 1_000_000 + u64::from(nanos / 1_000);
        Some(micros as f64 / 1_000_000.0)
    }
}

impl Default for TimestampPattern {
    fn default() -> Self {
        Self {
            source: DEFAULT_PATTERN.to_string(),
            strftime: "%H:%M:%S,%3f".to_string(),
            trailing_fraction: false,
        }
    }
}

impl fmt::Debug for TimestampPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TimestampPattern").field(&self.source).finish()
    }
}

impl fmt::Display for TimestampPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Strips a closing bare `%f` off a strftime pattern. Any other bare `%f` is
/// rejected, since chrono would read it as whole nanoseconds.
fn split_trailing_fraction(pattern: &str) -> Result<(String, bool)> {
    let mut bare = Vec::new();
    let mut chars = pattern.char_indices();
    while let Some((index, ch)) = chars.next() {
        if ch != '%' {
            continue;
        }
        if let Some((_, 'f')) = chars.next() {
            bare.push(index);
        }
    }

    match bare.as_slice() {
        [] => Ok((pattern.to_string(), false)),
        [index] if *index + 2 == pattern.len() => {
            let prefix = &pattern[..*index];
            match prefix.chars().last() {
                Some(separator) if !separator.is_ascii_alphanumeric() && separator != '%' => {
                    Ok((prefix.to_string(), true))
                }
                _ => Err(CaptionError::Pattern(format!(
                    "`%f` in `{pattern}` must follow a separator such as `,` or `.`"
                ))),
            }
        }
        _ => Err(CaptionError::Pattern(format!(
            "`%f` is only supported at the end of `{pattern}`"
        ))),
    }
}

/// Splits the one to nine trailing digits off `stamp` and returns them as
/// nanoseconds.
fn split_fraction_digits(stamp: &str) -> Option<(&str, u32)> {
    let head = stamp.trim_end_matches(|ch: char| ch.is_ascii_digit());
    let digits = &stamp[head.len()..];
    if digits.is_empty() || digits.len() > 9 {
        return None;
    }

    let value: u32 = digits.parse().ok()?;
    Some((head, value * 10u32.pow(9 - digits.len() as u32)))
}

fn translate_notation(pattern: &str) -> Result<String> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::with_capacity(pattern.len() + 4);
    let mut index = 0;

    while index < chars.len() {
        let ch = chars[index];
        let run = chars[index..].iter().take_while(|c| **c == ch).count();

        let token = match (ch, run) {
            ('H', 2) => "%H",
            ('M', 2) => "%M",
            ('S', 2) => "%S",
            ('m', 3) => "%3f",
            ('m', 6) => "%6f",
            ('m', 9) => "%9f",
            ('H' | 'M' | 'S' | 'm', _) => {
                return Err(CaptionError::Pattern(format!(
                    "unsupported token `{}` in `{pattern}`",
                    ch.to_string().repeat(run)
                )))
            }
            _ => {
                out.push(ch);
                index += 1;
                continue;
            }
        };

        out.push_str(token);
        index += run;
    }

    Ok(out)
}
