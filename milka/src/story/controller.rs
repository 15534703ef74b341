//! Story playback controller
//!
//! Pure state machine behind the story viewer. It never touches a clock:
//! the schedule lives in [`super::timer`] and feeds ticks back in, tagged
//! with the session token returned by [`PlaybackController::activate`].
//! Any tick or finish carrying an older token is stale and ignored.

use tracing::{debug, trace};

use crate::domain::{StoryGroup, StoryItem};

/// Token identifying one activation of the controller
pub type SessionToken = u64;

/// Float slack when snapping indices and fills to segment boundaries
const SNAP_EPSILON: f64 = 1e-9;

/// Observable playback state
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaybackState {
    pub active_group: Option<StoryGroup>,
    /// Always within [0, 100]
    pub progress_percent: f64,
}

/// What a tick did to the controller
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// Progress moved forward, playback continues
    Advanced { progress_percent: f64 },
    /// Last item reached; the schedule should stop and the viewer close after the finish delay
    Completed,
    /// Token did not match the live session, nothing changed
    Stale,
}

/// Drives progress through a story group one tick at a time
#[derive(Debug, Default)]
pub struct PlaybackController {
    state: PlaybackState,
    /// Ticks applied in the current session
    counter: usize,
    /// Bumped on every activate and dismiss
    session: SessionToken,
    /// Completed and waiting for the delayed dismiss
    finishing: bool,
}

impl PlaybackController {
    pub fn new() -> Self {
        debug!("PlaybackController::new: called");
        Self::default()
    }

    /// Start playing `group`
    ///
    /// Returns the new session token, or `None` for a group without items,
    /// in which case nothing changes.
    pub fn activate(&mut self, group: StoryGroup) -> Option<SessionToken> {
        debug!(group_id = group.id, items = group.len(), "PlaybackController::activate: called");
        if !group.is_playable() {
            debug!("PlaybackController::activate: empty group, ignoring");
            return None;
        }

        self.session += 1;
        self.counter = 0;
        self.finishing = false;
        self.state = PlaybackState {
            active_group: Some(group),
            progress_percent: 0.0,
        };
        debug!(session = self.session, "PlaybackController::activate: started session");
        Some(self.session)
    }

    /// Advance one item for the session identified by `token`
    pub fn tick(&mut self, token: SessionToken) -> TickOutcome {
        trace!(token, session = self.session, "PlaybackController::tick: called");
        if token != self.session || self.finishing {
            debug!(token, session = self.session, "PlaybackController::tick: stale tick");
            return TickOutcome::Stale;
        }
        let Some(item_count) = self.item_count() else {
            debug!("PlaybackController::tick: no active group");
            return TickOutcome::Stale;
        };

        self.counter += 1;
        if self.counter >= item_count {
            self.state.progress_percent = 100.0;
            self.finishing = true;
            debug!(session = self.session, "PlaybackController::tick: playback completed");
            return TickOutcome::Completed;
        }

        let progress = self.counter as f64 * (100.0 / item_count as f64);
        self.state.progress_percent = progress.clamp(0.0, 100.0);
        debug!(
            counter = self.counter,
            progress = self.state.progress_percent,
            "PlaybackController::tick: advanced"
        );
        TickOutcome::Advanced {
            progress_percent: self.state.progress_percent,
        }
    }

    /// Apply the delayed dismiss that follows completion
    ///
    /// Returns true if the viewer was closed.
    pub fn finish(&mut self, token: SessionToken) -> bool {
        debug!(token, session = self.session, "PlaybackController::finish: called");
        if token != self.session || !self.finishing {
            debug!("PlaybackController::finish: stale finish");
            return false;
        }
        self.clear();
        true
    }

    /// Close the viewer. Safe to call at any time.
    pub fn dismiss(&mut self) {
        debug!(session = self.session, "PlaybackController::dismiss: called");
        self.session += 1;
        self.clear();
    }

    fn clear(&mut self) {
        self.state = PlaybackState::default();
        self.counter = 0;
        self.finishing = false;
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn active_group(&self) -> Option<&StoryGroup> {
        self.state.active_group.as_ref()
    }

    pub fn progress_percent(&self) -> f64 {
        self.state.progress_percent
    }

    pub fn is_active(&self) -> bool {
        self.state.active_group.is_some()
    }

    /// Completed and waiting for the delayed dismiss
    pub fn is_finishing(&self) -> bool {
        self.finishing
    }

    /// Token of the live session (or of the last one, once dismissed)
    pub fn session(&self) -> SessionToken {
        self.session
    }

    fn item_count(&self) -> Option<usize> {
        self.state.active_group.as_ref().map(StoryGroup::len).filter(|n| *n > 0)
    }

    /// Index of the item on screen, derived from progress
    ///
    /// Clamped to the last item so that 100% still resolves to a valid index.
    pub fn current_item_index(&self) -> Option<usize> {
        let item_count = self.item_count()?;
        let step = 100.0 / item_count as f64;
        let index = (self.state.progress_percent / step + SNAP_EPSILON).floor().max(0.0) as usize;
        Some(index.min(item_count - 1))
    }

    pub fn current_item(&self) -> Option<&StoryItem> {
        let index = self.current_item_index()?;
        self.active_group()?.items.get(index)
    }

    /// Fill fraction in [0, 1] of progress segment `index`
    ///
    /// Segments before the current one are full, later ones are empty, and
    /// the current one ramps linearly.
    pub fn segment_fill(&self, index: usize) -> f64 {
        match self.item_count() {
            Some(item_count) => segment_fill(self.state.progress_percent, index, item_count),
            None => 0.0,
        }
    }

    /// Fill fractions for every segment of the active group
    pub fn segment_fills(&self) -> Vec<f64> {
        let item_count = self.item_count().unwrap_or(0);
        (0..item_count).map(|i| self.segment_fill(i)).collect()
    }
}

/// Fill fraction of segment `index` out of `item_count` at `progress_percent`
pub fn segment_fill(progress_percent: f64, index: usize, item_count: usize) -> f64 {
    if item_count == 0 {
        return 0.0;
    }
    let n = item_count as f64;
    let raw = (progress_percent - index as f64 * (100.0 / n)) * n / 100.0;
    if raw <= SNAP_EPSILON {
        0.0
    } else if raw >= 1.0 - SNAP_EPSILON {
        1.0
    } else {
        raw
    }
}
