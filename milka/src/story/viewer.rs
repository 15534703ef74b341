//! Story viewer: controller plus its schedule

use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info};

use super::controller::{PlaybackController, TickOutcome};
use super::timer::{MIN_TICK_PERIOD, PlaybackSignal, PlaybackTimer};
use crate::config::PlaybackConfig;
use crate::domain::StoryGroup;

/// What handling a signal did to the viewer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerEvent {
    /// Stale signal, nothing changed
    Ignored,
    /// Progress advanced to the next item
    Advanced,
    /// Last item reached, viewer closes after the finish delay
    Finishing,
    /// Viewer closed
    Closed,
}

/// The single story viewer of a screen
#[derive(Debug)]
pub struct StoryViewer {
    controller: PlaybackController,
    timer: PlaybackTimer,
    signals: mpsc::UnboundedReceiver<PlaybackSignal>,
    tick_period: Duration,
    finish_delay: Duration,
}

impl Default for StoryViewer {
    fn default() -> Self {
        Self::from_config(&PlaybackConfig::default())
    }
}

impl StoryViewer {
    pub fn new(tick_period: Duration, finish_delay: Duration) -> Self {
        debug!(?tick_period, ?finish_delay, "StoryViewer::new: called");
        let (timer, signals) = PlaybackTimer::channel();
        Self {
            controller: PlaybackController::new(),
            timer,
            signals,
            tick_period: tick_period.max(MIN_TICK_PERIOD),
            finish_delay,
        }
    }

    pub fn from_config(config: &PlaybackConfig) -> Self {
        Self::new(config.tick_period(), config.finish_delay())
    }

    /// Open `group`; returns false (and changes nothing) for an empty group
    pub fn open(&mut self, group: StoryGroup) -> bool {
        debug!(group_id = group.id, "StoryViewer::open: called");
        let owner = group.owner_name.clone();
        match self.controller.activate(group) {
            Some(token) => {
                info!("Playing stories of {} (session {})", owner, token);
                self.timer.start(token, self.tick_period);
                true
            }
            None => {
                debug!("StoryViewer::open: group not playable");
                false
            }
        }
    }

    /// Apply a signal from the schedule
    pub fn handle(&mut self, signal: PlaybackSignal) -> ViewerEvent {
        debug!(?signal, "StoryViewer::handle: called");
        match signal {
            PlaybackSignal::Tick(token) => match self.controller.tick(token) {
                TickOutcome::Advanced { .. } => ViewerEvent::Advanced,
                TickOutcome::Completed => {
                    self.timer.finish_after(token, self.finish_delay);
                    ViewerEvent::Finishing
                }
                TickOutcome::Stale => ViewerEvent::Ignored,
            },
            PlaybackSignal::Finish(token) => {
                if self.controller.finish(token) {
                    self.timer.cancel();
                    info!("Story playback finished (session {})", token);
                    ViewerEvent::Closed
                } else {
                    ViewerEvent::Ignored
                }
            }
        }
    }

    /// Close the viewer now
    pub fn close(&mut self) {
        debug!("StoryViewer::close: called");
        self.timer.cancel();
        self.controller.dismiss();
    }

    /// Wait for the next schedule signal
    pub async fn next_signal(&mut self) -> Option<PlaybackSignal> {
        self.signals.recv().await
    }

    /// Next signal if one is already queued
    pub fn try_signal(&mut self) -> Option<PlaybackSignal> {
        self.signals.try_recv().ok()
    }

    pub fn controller(&self) -> &PlaybackController {
        &self.controller
    }

    pub fn is_open(&self) -> bool {
        self.controller.is_active()
    }

    pub fn is_ticking(&self) -> bool {
        self.timer.is_running()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::StoryItem;
    use tokio::time::{self, Instant};

    fn group_ab() -> StoryGroup {
        StoryGroup::new(
            2,
            "Anna",
            "👩",
            "Today, 14:23",
            vec![StoryItem::new(1, "a.jpg", "14:23"), StoryItem::new(2, "b.jpg", "15:10")],
        )
    }

    fn viewer() -> StoryViewer {
        StoryViewer::new(Duration::from_millis(3000), Duration::from_millis(300))
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_tick_period_still_plays() {
        let mut viewer = StoryViewer::new(Duration::ZERO, Duration::ZERO);
        assert!(viewer.open(group_ab()));

        let mut events = Vec::new();
        while viewer.is_open() {
            let signal = viewer.next_signal().await.unwrap();
            match viewer.handle(signal) {
                ViewerEvent::Ignored => {}
                event => events.push(event),
            }
        }
        assert_eq!(events, vec![ViewerEvent::Advanced, ViewerEvent::Finishing, ViewerEvent::Closed]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_two_item_playback_end_to_end() {
        let mut viewer = viewer();
        let started = Instant::now();
        assert!(viewer.open(group_ab()));

        let signal = viewer.next_signal().await.unwrap();
        assert_eq!(viewer.handle(signal), ViewerEvent::Advanced);
        assert_eq!(viewer.controller().progress_percent(), 50.0);

        let signal = viewer.next_signal().await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(6000));
        assert_eq!(viewer.handle(signal), ViewerEvent::Finishing);
        assert_eq!(viewer.controller().progress_percent(), 100.0);
        assert_eq!(viewer.controller().current_item_index(), Some(1));
        assert!(viewer.is_open());

        let signal = viewer.next_signal().await.unwrap();
        assert!(matches!(signal, PlaybackSignal::Finish(_)));
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(6300) && elapsed < Duration::from_millis(9000));
        assert_eq!(viewer.handle(signal), ViewerEvent::Closed);
        assert!(!viewer.is_open());
        assert!(!viewer.is_ticking());
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_group_starts_nothing() {
        let mut viewer = viewer();
        let empty = StoryGroup::new(1, "My status", "👤", "Tap to add", vec![]);
        assert!(!viewer.open(empty));
        assert!(!viewer.is_open());
        assert!(!viewer.is_ticking());

        time::sleep(Duration::from_secs(10)).await;
        assert!(viewer.try_signal().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_discards_queued_tick() {
        let mut viewer = viewer();
        viewer.open(group_ab());

        // Let a tick land in the channel, then dismiss before handling it
        time::sleep(Duration::from_millis(3100)).await;
        viewer.close();
        let queued = viewer.try_signal().expect("tick should be queued");

        assert_eq!(viewer.handle(queued), ViewerEvent::Ignored);
        assert!(!viewer.is_open());
        assert_eq!(viewer.controller().progress_percent(), 0.0);

        time::sleep(Duration::from_secs(30)).await;
        assert!(viewer.try_signal().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_during_finish_delay() {
        let mut viewer = viewer();
        viewer.open(StoryGroup::new(3, "Maxim", "👨", "Today", vec![StoryItem::new(1, "m.jpg", "12:45")]));

        let signal = viewer.next_signal().await.unwrap();
        assert_eq!(viewer.handle(signal), ViewerEvent::Finishing);
        viewer.close();

        time::sleep(Duration::from_secs(1)).await;
        assert!(viewer.try_signal().is_none());
        assert!(!viewer.is_open());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reopen_ignores_old_session() {
        let mut viewer = viewer();
        viewer.open(group_ab());
        let old_token = viewer.controller().session();
        viewer.open(group_ab());

        assert_eq!(viewer.handle(PlaybackSignal::Tick(old_token)), ViewerEvent::Ignored);
        assert_eq!(viewer.controller().progress_percent(), 0.0);

        let signal = viewer.next_signal().await.unwrap();
        assert_ne!(signal.token(), old_token);
        assert_eq!(viewer.handle(signal), ViewerEvent::Advanced);
    }
}
