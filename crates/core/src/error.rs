use std::fmt;

/// Result alias that carries the custom [`CaptionError`] type.
pub type Result<T> = std::result::Result<T, CaptionError>;

/// Common error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum CaptionError {
    /// The subtitle text did not follow the track grammar.
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// A timestamp pattern could not be compiled.
    #[error("invalid timestamp pattern: {0}")]
    Pattern(String),
    /// Configuration could not be decoded.
    #[error("invalid configuration: {0}")]
    Config(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// Free-form message for the application layer.
    #[error("{0}")]
    Message(String),
}

impl CaptionError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }

    /// Returns the parse failure, if that is what this error carries.
    pub fn as_parse(&self) -> Option<&ParseError> {
        match self {
            Self::Parse(err) => Some(err),
            _ => None,
        }
    }
}

impl From<&str> for CaptionError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for CaptionError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}

impl From<serde_json::Error> for CaptionError {
    fn from(value: serde_json::Error) -> Self {
        Self::Config(value.to_string())
    }
}

/// A malformed line in a subtitle track. `line` is 1-based and `content` is
/// the line exactly as it appeared in the input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("line {line}: {reason} (`{content}`)")]
pub struct ParseError {
    pub line: usize,
    pub content: String,
    pub reason: ParseErrorKind,
}

impl ParseError {
    pub(crate) fn new(line: usize, content: &str, reason: ParseErrorKind) -> Self {
        Self {
            line,
            content: content.to_string(),
            reason,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// The first line of a block is not an integer.
    InvalidId,
    /// The line after the id has no `-->` separator.
    MissingSeparator,
    /// One side of the separator does not match the timestamp pattern.
    InvalidTimestamp,
    /// The end timestamp does not come after the start timestamp.
    InvertedRange,
    /// The block stops right after its id line.
    Truncated,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::InvalidId => "caption id is not an integer",
            Self::MissingSeparator => "expected a `start --> end` timestamp line",
            Self::InvalidTimestamp => "timestamp does not match the pattern",
            Self::InvertedRange => "caption ends before it starts",
            Self::Truncated => "caption block ends before its timestamp line",
        };
        f.write_str(reason)
    }
}
