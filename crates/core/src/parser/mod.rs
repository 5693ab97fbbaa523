//! Track text parsing.
//!
//! A track is a sequence of blank-line separated blocks:
//!
//! ```text
//! 1
//! 00:00:01,000 --> 00:00:04,000
//! First line
//! second line
//! ```
//!
//! Blocks are returned in file order. The first malformed block aborts the
//! whole parse so a broken track never shows up with cues silently missing.

mod pattern;

use serde::{Deserialize, Serialize};

use crate::error::{ParseError, ParseErrorKind};

pub use pattern::{TimestampPattern, DEFAULT_PATTERN};

const BYTE_ORDER_MARK: char = '\u{feff}';
const SEPARATOR: &str = "-->";

/// One timed subtitle cue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Caption {
    /// Id as declared in the track; neither unique nor used for ordering.
    pub id: i64,
    /// Seconds since 00:00:00.000.
    pub start: f64,
    pub end: f64,
    pub text: String,
}

impl Caption {
    pub fn new(id: i64, start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            id,
            start,
            end,
            text: text.into(),
        }
    }

    /// Time on screen. Zero for inverted ranges.
    pub fn duration(&self) -> f64 {
        (self.end - self.start).max(0.0)
    }

    /// Whether the caption is visible at `seconds`. Both boundary instants
    /// are excluded.
    pub fn is_active_at(&self, seconds: f64) -> bool {
        self.start < seconds && seconds < self.end
    }
}

enum Block<'a> {
    Idle,
    Id {
        id: i64,
        at: usize,
        content: &'a str,
    },
    Text(Caption),
}

/// Parses raw track text into captions using `pattern` for the timestamps.
pub fn parse(text: &str, pattern: &TimestampPattern) -> Result<Vec<Caption>, ParseError> {
    let text = text.strip_prefix(BYTE_ORDER_MARK).unwrap_or(text);
    let mut captions = Vec::new();
    let mut block = Block::Idle;

    for (index, raw) in text.lines().enumerate() {
        let line_no = index + 1;
        let line = raw.trim();

        block = match block {
            Block::Idle if line.is_empty() => Block::Idle,
            Block::Idle => Block::Id {
                id: line
                    .parse::<i64>()
                    .map_err(|_| ParseError::new(line_no, raw, ParseErrorKind::InvalidId))?,
                at: line_no,
                content: raw,
            },
            Block::Id { at, content, .. } if line.is_empty() => {
                return Err(ParseError::new(at, content, ParseErrorKind::Truncated));
            }
            Block::Id { id, .. } => {
                let (start, end) = parse_timing(line, raw, line_no, pattern)?;
                Block::Text(Caption::new(id, start, end, String::new()))
            }
            Block::Text(caption) if line.is_empty() => {
                captions.push(caption);
                Block::Idle
            }
            Block::Text(mut caption) => {
                if !caption.text.is_empty() {
                    caption.text.push('\n');
                }
                caption.text.push_str(line);
                Block::Text(caption)
            }
        };
    }

    match block {
        Block::Idle => {}
        Block::Id { at, content, .. } => {
            return Err(ParseError::new(at, content, ParseErrorKind::Truncated));
        }
        Block::Text(caption) => captions.push(caption),
    }

    Ok(captions)
}

fn parse_timing(
    line: &str,
    raw: &str,
    line_no: usize,
    pattern: &TimestampPattern,
) -> Result<(f64, f64), ParseError> {
    let (start, end) = line
        .split_once(SEPARATOR)
        .ok_or_else(|| ParseError::new(line_no, raw, ParseErrorKind::MissingSeparator))?;

    let stamp = |side: &str| {
        pattern
            .parse_seconds(side.trim())
            .ok_or_else(|| ParseError::new(line_no, raw, ParseErrorKind::InvalidTimestamp))
    };
    let start = stamp(start)?;
    let end = stamp(end)?;

    if start >= end {
        return Err(ParseError::new(line_no, raw, ParseErrorKind::InvertedRange));
    }
    Ok((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_default(text: &str) -> Result<Vec<Caption>, ParseError> {
        parse(text, &TimestampPattern::default())
    }

    #[test]
    fn parses_blocks_in_file_order() {
        let text = "1\n00:00:00,000 --> 00:00:02,000\nHi\n\n2\n00:00:03,000 --> 00:00:05,000\nBye\n\n";
        let captions = parse_default(text).unwrap();

        assert_eq!(
            captions,
            vec![
                Caption::new(1, 0.0, 2.0, "Hi"),
                Caption::new(2, 3.0, 5.0, "Bye"),
            ]
        );
    }

    #[test]
    fn joins_stripped_text_lines() {
        let text = "7\n00:00:01,500 --> 00:00:02,250\n  first line  \n\tsecond line\n";
        let captions = parse_default(text).unwrap();

        assert_eq!(captions.len(), 1);
        assert_eq!(captions[0].id, 7);
        assert_eq!(captions[0].start, 1.5);
        assert_eq!(captions[0].end, 2.25);
        assert_eq!(captions[0].text, "first line\nsecond line");
    }

    #[test]
    fn flushes_last_block_without_trailing_blank_line() {
        let text = "1\n00:00:00,000 --> 00:00:01,000\nA\n\n2\n00:00:01,000 --> 00:00:02,000\nB";
        let captions = parse_default(text).unwrap();

        assert_eq!(captions.len(), 2);
        assert_eq!(captions[1].text, "B");
    }

    #[test]
    fn strips_leading_byte_order_mark() {
        let text = "\u{feff}12\n00:00:00,000 --> 00:00:01,000\nA\n";
        let captions = parse_default(text).unwrap();
        assert_eq!(captions[0].id, 12);
    }

    #[test]
    fn accepts_crlf_and_extra_blank_lines() {
        let text = "\r\n1\r\n00:00:00,000 --> 00:00:01,000\r\nA\r\n\r\n\r\n2\r\n00:00:02,000 --> 00:00:03,000\r\nB\r\n";
        let captions = parse_default(text).unwrap();

        assert_eq!(captions.len(), 2);
        assert_eq!(captions[0].text, "A");
        assert_eq!(captions[1].text, "B");
    }

    #[test]
    fn keeps_out_of_order_and_duplicate_ids() {
        let text = "5\n00:00:04,000 --> 00:00:05,000\nlate\n\n5\n00:00:01,000 --> 00:00:02,000\nearly\n";
        let captions = parse_default(text).unwrap();

        assert_eq!(captions[0].text, "late");
        assert_eq!(captions[1].text, "early");
        assert!(captions.iter().all(|c| c.id == 5));
    }

    #[test]
    fn block_without_text_has_empty_caption() {
        let captions = parse_default("1\n00:00:00,000 --> 00:00:01,000\n\n").unwrap();
        assert_eq!(captions[0].text, "");
    }

    #[test]
    fn empty_input_has_no_captions() {
        assert!(parse_default("").unwrap().is_empty());
        assert!(parse_default("\n\n  \n").unwrap().is_empty());
    }

    #[test]
    fn honours_alternate_pattern() {
        let pattern = TimestampPattern::new("HH:MM:SS.mmm").unwrap();
        let captions = parse("1\n00:00:01.000 --> 00:00:03.500\nDot\n", &pattern).unwrap();
        assert_eq!(captions[0].end, 3.5);
    }

    #[test]
    fn accepted_captions_always_start_before_they_end() {
        let mut text = String::new();
        for i in 0..50u32 {
            let start = i * 1_250;
            let end = start + 700 + (i % 7) * 300;
            text.push_str(&format!(
                "{}\n{} --> {}\nline {i}\n\n",
                i + 1,
                stamp(start),
                stamp(end)
            ));
        }

        let captions = parse_default(&text).unwrap();
        assert_eq!(captions.len(), 50);
        for (i, caption) in captions.iter().enumerate() {
            assert!(caption.start < caption.end);
            assert_eq!(caption.text, format!("line {i}"));
        }
    }

    fn stamp(millis: u32) -> String {
        format!(
            "{:02}:{:02}:{:02},{:03}",
            millis / 3_600_000,
            millis / 60_000 % 60,
            millis / 1_000 % 60,
            millis % 1_000
        )
    }

    #[test]
    fn non_integer_id_reports_its_line() {
        let text = "1\n00:00:00,000 --> 00:00:01,000\nA\n\nabc\n00:00:02,000 --> 00:00:03,000\nB\n";
        let err = parse_default(text).unwrap_err();

        assert_eq!(err.line, 5);
        assert_eq!(err.content, "abc");
        assert_eq!(err.reason, ParseErrorKind::InvalidId);
    }

    #[test]
    fn missing_arrow_is_rejected() {
        let err = parse_default("1\n00:00:00,000 00:00:01,000\nA\n").unwrap_err();

        assert_eq!(err.line, 2);
        assert_eq!(err.reason, ParseErrorKind::MissingSeparator);
    }

    #[test]
    fn block_without_timestamp_line_is_rejected() {
        let err = parse_default("1\nJust some text\n").unwrap_err();

        assert_eq!(err.line, 2);
        assert_eq!(err.content, "Just some text");
        assert_eq!(err.reason, ParseErrorKind::MissingSeparator);
    }

    #[test]
    fn malformed_timestamp_is_rejected() {
        let err = parse_default("1\n00:00:00.000 --> 00:00:01,000\nA\n").unwrap_err();

        assert_eq!(err.line, 2);
        assert_eq!(err.content, "00:00:00.000 --> 00:00:01,000");
        assert_eq!(err.reason, ParseErrorKind::InvalidTimestamp);
    }

    #[test]
    fn inverted_range_is_rejected() {
        let err = parse_default("1\n00:00:02,000 --> 00:00:01,000\nA\n").unwrap_err();
        assert_eq!(err.reason, ParseErrorKind::InvertedRange);

        let err = parse_default("1\n00:00:01,000 --> 00:00:01,000\nA\n").unwrap_err();
        assert_eq!(err.reason, ParseErrorKind::InvertedRange);
    }

    #[test]
    fn truncated_block_points_at_its_id() {
        let err = parse_default("1\n00:00:00,000 --> 00:00:01,000\nA\n\n2\n").unwrap_err();
        assert_eq!(err.line, 5);
        assert_eq!(err.reason, ParseErrorKind::Truncated);

        let err = parse_default("1\n\n00:00:00,000 --> 00:00:01,000\n").unwrap_err();
        assert_eq!(err.line, 1);
        assert_eq!(err.reason, ParseErrorKind::Truncated);
    }

    #[test]
    fn caption_activity_excludes_boundaries() {
        let caption = Caption::new(1, 1.0, 2.0, "x");

        assert!(!caption.is_active_at(1.0));
        assert!(caption.is_active_at(1.5));
        assert!(!caption.is_active_at(2.0));
        assert_eq!(caption.duration(), 1.0);
        assert_eq!(Caption::new(1, 2.0, 1.0, "x").duration(), 0.0);
    }
}
