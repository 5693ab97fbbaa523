use std::{fmt, path::Path};

use crate::{
    track::{SourceChange, Track},
    Result,
};

/// A visual element owned by the host that shows one caption. The engine only
/// ever replaces its text.
pub trait CaptionHandle {
    fn set_text(&mut self, text: &str);
}

/// Creates handles for display slots that have none yet.
pub trait HandleFactory {
    type Handle: CaptionHandle;

    fn new_handle(&mut self, text: &str) -> Self::Handle;
}

impl<H, F> HandleFactory for F
where
    H: CaptionHandle,
    F: FnMut(&str) -> H,
{
    type Handle = H;

    fn new_handle(&mut self, text: &str) -> H {
        self(text)
    }
}

/// Result of matching a new set of caption texts against the handles that
/// were on screen.
#[derive(Debug)]
pub struct Reconciled<H> {
    /// Handles to show, slot by slot.
    pub displayed: Vec<H>,
    /// Handles no longer needed. They are returned, not dropped, so the owner
    /// decides how to tear them down.
    pub released: Vec<H>,
    /// False when `displayed` holds exactly the previous handles in the same
    /// order, in which case nothing needs to be re-attached.
    pub changed: bool,
}

/// Assigns `texts` to display slots by position.
///
/// Slot `i` keeps the handle it had and just gets new text, whatever caption
/// that handle showed before. Extra slots get fresh handles from `factory` and
/// surplus handles come back in [`Reconciled::released`].
pub fn reconcile<'a, F, I>(
    previous: Vec<F::Handle>,
    texts: I,
    factory: &mut F,
) -> Reconciled<F::Handle>
where
    F: HandleFactory,
    I: IntoIterator<Item = &'a str>,
{
    let before = previous.len();
    let mut previous = previous.into_iter();
    let mut displayed = Vec::with_capacity(before);

    for text in texts {
        let handle = match previous.next() {
            Some(mut handle) => {
                handle.set_text(text);
                handle
            }
            None => factory.new_handle(text),
        };
        displayed.push(handle);
    }

    let released: Vec<_> = previous.collect();
    // Reuse is positional, so the list only differs when it grew or shrank.
    let changed = displayed.len() != before;

    Reconciled {
        displayed,
        released,
        changed,
    }
}

/// What the host has to do after a display update.
#[derive(Debug)]
pub struct DisplayUpdate<H> {
    pub changed: bool,
    pub released: Vec<H>,
}

impl<H> DisplayUpdate<H> {
    pub fn unchanged() -> Self {
        Self {
            changed: false,
            released: Vec::new(),
        }
    }
}

/// Owns the handles currently on screen and the factory that makes new ones.
///
/// Handles released by an update belong to the caller. Passing them back
/// through [`HandleRecycler::recycle`] once they are detached lets later
/// updates reuse them instead of asking the factory again.
pub struct HandleRecycler<F: HandleFactory> {
    factory: F,
    displayed: Vec<F::Handle>,
    spare: Vec<F::Handle>,
}

impl<F: HandleFactory> HandleRecycler<F> {
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            displayed: Vec::new(),
            spare: Vec::new(),
        }
    }

    /// Shows `texts`, reusing the handles already on screen where possible.
    pub fn update<'a, I>(&mut self, texts: I) -> DisplayUpdate<F::Handle>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let previous = std::mem::take(&mut self.displayed);
        let mut source = Pooled {
            spare: &mut self.spare,
            factory: &mut self.factory,
        };
        let reconciled = reconcile(previous, texts, &mut source);
        self.displayed = reconciled.displayed;

        DisplayUpdate {
            changed: reconciled.changed,
            released: reconciled.released,
        }
    }

    /// Handles in display order.
    pub fn displayed(&self) -> &[F::Handle] {
        &self.displayed
    }

    /// Takes every handle off screen and hands them back.
    pub fn clear(&mut self) -> Vec<F::Handle> {
        std::mem::take(&mut self.displayed)
    }

    /// Returns detached handles for reuse by later updates.
    pub fn recycle(&mut self, handles: impl IntoIterator<Item = F::Handle>) {
        self.spare.extend(handles);
    }

    /// Number of handles waiting in the spare pool.
    pub fn spare(&self) -> usize {
        self.spare.len()
    }
}

/// Factory adapter that drains the spare pool before allocating.
struct Pooled<'a, F: HandleFactory> {
    spare: &'a mut Vec<F::Handle>,
    factory: &'a mut F,
}

impl<F: HandleFactory> HandleFactory for Pooled<'_, F> {
    type Handle = F::Handle;

    fn new_handle(&mut self, text: &str) -> F::Handle {
        match self.spare.pop() {
            Some(mut handle) => {
                handle.set_text(text);
                handle
            }
            None => self.factory.new_handle(text),
        }
    }
}

impl<F: HandleFactory> fmt::Debug for HandleRecycler<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandleRecycler")
            .field("displayed", &self.displayed.len())
            .field("spare", &self.spare.len())
            .finish()
    }
}

/// A [`Track`] wired to a [`HandleRecycler`]: the piece a player embeds to
/// keep caption handles in sync with its position.
pub struct CaptionOverlay<F: HandleFactory> {
    track: Track,
    recycler: HandleRecycler<F>,
    shown: Vec<usize>,
    stale: bool,
}

impl<F: HandleFactory> CaptionOverlay<F> {
    pub fn new(track: Track, factory: F) -> Self {
        Self {
            track,
            recycler: HandleRecycler::new(factory),
            shown: Vec::new(),
            stale: true,
        }
    }

    /// Loads a new track. The display catches up on the next
    /// [`CaptionOverlay::set_position`] or [`CaptionOverlay::refresh`].
    pub fn set_source(&mut self, path: impl AsRef<Path>) -> Result<SourceChange> {
        self.stale = true;
        self.track.set_source(path)
    }

    /// Moves to `seconds` and updates the handles. When the same captions are
    /// active as on the previous call no handle is touched.
    pub fn set_position(&mut self, seconds: f64) -> DisplayUpdate<F::Handle> {
        let active = self.track.seek(seconds);
        if !self.stale && active == self.shown.as_slice() {
            return DisplayUpdate::unchanged();
        }
        self.stale = false;
        self.shown.clear();
        self.shown.extend_from_slice(active);

        let captions = self.track.captions();
        self.recycler
            .update(self.shown.iter().map(|&index| captions[index].text.as_str()))
    }

    /// Re-applies the current position.
    pub fn refresh(&mut self) -> DisplayUpdate<F::Handle> {
        self.stale = true;
        self.set_position(self.track.position())
    }

    pub fn displayed(&self) -> &[F::Handle] {
        self.recycler.displayed()
    }

    /// See [`HandleRecycler::recycle`].
    pub fn recycle(&mut self, handles: impl IntoIterator<Item = F::Handle>) {
        self.recycler.recycle(handles);
    }

    pub fn track(&self) -> &Track {
        &self.track
    }
}

impl<F: HandleFactory> fmt::Debug for CaptionOverlay<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaptionOverlay")
            .field("track", &self.track)
            .field("recycler", &self.recycler)
            .field("shown", &self.shown)
            .finish()
    }
}
