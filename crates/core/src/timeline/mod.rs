use crate::Caption;

/// Position holder driven by the host player.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct PlaybackClock {
    pub time_seconds: f64,
}

impl PlaybackClock {
    pub fn reset(&mut self) {
        self.time_seconds = 0.0;
    }

    pub fn advance(&mut self, delta: f64) {
        self.seek(self.time_seconds + delta);
    }

    pub fn seek(&mut self, seconds: f64) {
        self.time_seconds = seconds.max(0.0);
    }
}

/// Indices of the captions visible at `seconds`, in track order.
///
/// Plain linear scan; [`Selector`] gives the same answer incrementally.
pub fn active_captions(captions: &[Caption], seconds: f64) -> Vec<usize> {
    captions
        .iter()
        .enumerate()
        .filter(|(_, caption)| caption.is_active_at(seconds))
        .map(|(index, _)| index)
        .collect()
}

/// Incremental active-set lookup for a fixed caption list.
///
/// For tracks whose start times never decrease, forward playback only looks
/// at the captions between two watermarks: everything before `low` ended at
/// or before the last query and everything from `high` on starts at or after
/// it. A backward seek rebuilds the watermarks with a binary search. Tracks
/// with unordered start times are scanned in full on every query.
///
/// Create a new selector (or call [`Selector::reset`]) whenever the caption
/// list it is used with changes.
#[derive(Debug, Default, Clone)]
pub struct Selector {
    monotonic: bool,
    len: usize,
    low: usize,
    high: usize,
    last: Option<f64>,
}

impl Selector {
    pub fn new(captions: &[Caption]) -> Self {
        Self {
            monotonic: captions.windows(2).all(|pair| pair[0].start <= pair[1].start),
            len: captions.len(),
            ..Self::default()
        }
    }

    /// Whether the fast forward-only path is available for this track.
    pub fn is_monotonic(&self) -> bool {
        self.monotonic
    }

    /// Forgets the cursor; the next query starts from scratch.
    pub fn reset(&mut self) {
        self.low = 0;
        self.high = 0;
        self.last = None;
    }

    pub fn select(&mut self, captions: &[Caption], seconds: f64) -> Vec<usize> {
        let mut active = Vec::new();
        self.select_into(captions, seconds, &mut active);
        active
    }

    /// Writes the indices active at `seconds` into `active`, replacing its
    /// contents. Non-finite positions select nothing and leave the cursor
    /// where it was.
    pub fn select_into(&mut self, captions: &[Caption], seconds: f64, active: &mut Vec<usize>) {
        active.clear();
        if !seconds.is_finite() {
            return;
        }
        if captions.len() != self.len {
            *self = Self::new(captions);
        }

        if !self.monotonic {
            active.extend(
                captions
                    .iter()
                    .enumerate()
                    .filter(|(_, caption)| caption.is_active_at(seconds))
                    .map(|(index, _)| index),
            );
            self.last = Some(seconds);
            return;
        }

        match self.last {
            Some(last) if seconds >= last => {}
            _ => self.rewind(captions, seconds),
        }

        while self.high < captions.len() && captions[self.high].start < seconds {
            self.high += 1;
        }
        while self.low < self.high && captions[self.low].end <= seconds {
            self.low += 1;
        }

        // Everything in the window already started; only the end decides.
        active.extend((self.low..self.high).filter(|&index| seconds < captions[index].end));
        self.last = Some(seconds);
    }

    fn rewind(&mut self, captions: &[Caption], seconds: f64) {
        self.low = 0;
        self.high = captions.partition_point(|caption| caption.start < seconds);
    }
}
