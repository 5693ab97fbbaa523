use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use crate::{
    config::TrackConfig,
    parser::{self, Caption, TimestampPattern},
    timeline::Selector,
    Result,
};

/// Outcome of pointing a [`Track`] at a new source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceChange {
    /// The source was read and parsed.
    Loaded { captions: usize },
    /// Nothing exists at the path; the track is now empty.
    Missing,
}

/// A parsed subtitle track plus the playback position it is being queried at.
///
/// The caption list is only ever replaced wholesale, never edited in place.
#[derive(Debug, Default)]
pub struct Track {
    source: Option<PathBuf>,
    pattern: TimestampPattern,
    captions: Vec<Caption>,
    position: f64,
    selector: Selector,
    active: Vec<usize>,
}

impl Track {
    pub fn new(pattern: TimestampPattern) -> Self {
        Self {
            pattern,
            ..Self::default()
        }
    }

    pub fn with_config(config: &TrackConfig) -> Result<Self> {
        Ok(Self::new(TimestampPattern::new(&config.timestamp_pattern)?))
    }

    /// Loads the track at `path`.
    ///
    /// A missing file leaves the track empty and is reported as
    /// [`SourceChange::Missing`]. A file that fails to parse also leaves the
    /// track empty, so nothing from the previous source stays visible, and the
    /// parse error is returned. Callers that would rather keep the old
    /// captions should use [`load_source`] and [`Track::set_captions`].
    pub fn set_source(&mut self, path: impl AsRef<Path>) -> Result<SourceChange> {
        let path = path.as_ref();
        self.source = Some(path.to_path_buf());

        match load_source(path, &self.pattern) {
            Ok(Some(captions)) => {
                let count = captions.len();
                self.set_captions(captions);
                Ok(SourceChange::Loaded { captions: count })
            }
            Ok(None) => {
                tracing::warn!(path = %path.display(), "subtitle source not found");
                self.set_captions(Vec::new());
                Ok(SourceChange::Missing)
            }
            Err(err) => {
                tracing::error!(path = %path.display(), %err, "failed to load subtitle source");
                self.set_captions(Vec::new());
                Err(err)
            }
        }
    }

    /// Replaces every caption at once and rewinds to position zero.
    pub fn set_captions(&mut self, captions: Vec<Caption>) {
        self.selector = Selector::new(&captions);
        self.captions = captions;
        self.position = 0.0;
        self.active.clear();
    }

    /// Moves the playback position and returns the captions visible there.
    pub fn set_position(&mut self, seconds: f64) -> impl Iterator<Item = &Caption> + '_ {
        self.seek(seconds);
        self.active()
    }

    /// Moves the playback position and returns the indices of the captions
    /// visible there.
    pub fn seek(&mut self, seconds: f64) -> &[usize] {
        self.position = seconds;
        self.selector.select_into(&self.captions, seconds, &mut self.active);
        &self.active
    }

    /// Captions visible at the current position, in track order.
    pub fn active(&self) -> impl Iterator<Item = &Caption> + '_ {
        self.active.iter().map(|&index| &self.captions[index])
    }

    pub fn active_indices(&self) -> &[usize] {
        &self.active
    }

    pub fn captions(&self) -> &[Caption] {
        &self.captions
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn pattern(&self) -> &TimestampPattern {
        &self.pattern
    }
}

/// Reads and parses the track at `path`. `Ok(None)` means the file does not
/// exist.
pub fn load_source(path: &Path, pattern: &TimestampPattern) -> Result<Option<Vec<Caption>>> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err.into()),
    };

    let captions = parser::parse(&text, pattern)?;
    tracing::debug!(
        path = %path.display(),
        captions = captions.len(),
        pattern = %pattern,
        "parsed subtitle track"
    );
    Ok(Some(captions))
}
