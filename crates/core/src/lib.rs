//! Subtitle track engine.
//!
//! The crate turns SubRip-style track text into [`Caption`] records, answers
//! "which captions are visible at this position" for a playback clock, and
//! keeps a list of host-owned render handles in step with that answer while
//! reusing handles slot by slot. Rendering itself (fonts, layout, styling)
//! belongs to the host; the core only calls [`CaptionHandle::set_text`] and a
//! [`HandleFactory`].

pub mod config;
pub mod error;
pub mod parser;
pub mod render;
pub mod timeline;
pub mod track;

pub use config::{AppConfig, CaptionStyle, HorizontalAlign, TrackConfig};
pub use error::{CaptionError, ParseError, ParseErrorKind, Result};
pub use parser::{parse, Caption, TimestampPattern, DEFAULT_PATTERN};
pub use render::{
    reconcile, CaptionHandle, CaptionOverlay, DisplayUpdate, HandleFactory, HandleRecycler,
    Reconciled,
};
pub use timeline::{active_captions, PlaybackClock, Selector};
pub use track::{load_source, SourceChange, Track};
