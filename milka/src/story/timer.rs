//! Playback schedule on the tokio runtime
//!
//! The timer never mutates playback state itself. It posts token-tagged
//! signals to a channel drained by the UI loop, so the controller keeps a
//! single writer. At most one schedule is live at a time.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::debug;

use super::controller::SessionToken;

/// Shortest tick period a schedule accepts; `interval` rejects zero
pub const MIN_TICK_PERIOD: Duration = Duration::from_millis(1);

/// Signal emitted by the playback schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackSignal {
    /// Advance one item
    Tick(SessionToken),
    /// Close the viewer after completion
    Finish(SessionToken),
}

impl PlaybackSignal {
    pub fn token(&self) -> SessionToken {
        match self {
            Self::Tick(t) | Self::Finish(t) => *t,
        }
    }
}

/// Owns the single live schedule task
#[derive(Debug)]
pub struct PlaybackTimer {
    tx: mpsc::UnboundedSender<PlaybackSignal>,
    task: Option<JoinHandle<()>>,
}

impl PlaybackTimer {
    pub fn new(tx: mpsc::UnboundedSender<PlaybackSignal>) -> Self {
        debug!("PlaybackTimer::new: called");
        Self { tx, task: None }
    }

    /// Create a timer together with the receiving end of its signals
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<PlaybackSignal>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    /// Emit `Tick(token)` every `period`, first one a full period from now
    ///
    /// Replaces any live schedule. Must be called from within a tokio runtime.
    pub fn start(&mut self, token: SessionToken, period: Duration) {
        debug!(token, ?period, "PlaybackTimer::start: called");
        self.cancel();
        let period = period.max(MIN_TICK_PERIOD);

        let tx = self.tx.clone();
        self.task = Some(tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if tx.send(PlaybackSignal::Tick(token)).is_err() {
                    debug!(token, "PlaybackTimer: receiver dropped, stopping ticks");
                    break;
                }
            }
        }));
    }

    /// Stop ticking and emit a single `Finish(token)` after `delay`
    pub fn finish_after(&mut self, token: SessionToken, delay: Duration) {
        debug!(token, ?delay, "PlaybackTimer::finish_after: called");
        self.cancel();

        let tx = self.tx.clone();
        self.task = Some(tokio::spawn(async move {
            time::sleep(delay).await;
            let _ = tx.send(PlaybackSignal::Finish(token));
        }));
    }

    /// Abort the live schedule, if any
    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            debug!("PlaybackTimer::cancel: aborting live schedule");
            task.abort();
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }
}

impl Drop for PlaybackTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_zero_period_is_clamped() {
        let (mut timer, mut rx) = PlaybackTimer::channel();
        timer.start(4, Duration::ZERO);
        assert_eq!(rx.recv().await, Some(PlaybackSignal::Tick(4)));
        assert_eq!(rx.recv().await, Some(PlaybackSignal::Tick(4)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_arrive_every_period() {
        let (mut timer, mut rx) = PlaybackTimer::channel();
        let started = Instant::now();
        timer.start(7, Duration::from_millis(3000));

        assert_eq!(rx.recv().await, Some(PlaybackSignal::Tick(7)));
        assert!(started.elapsed() >= Duration::from_millis(3000));
        assert_eq!(rx.recv().await, Some(PlaybackSignal::Tick(7)));
        assert!(started.elapsed() >= Duration::from_millis(6000));
        assert!(timer.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_ticks() {
        let (mut timer, mut rx) = PlaybackTimer::channel();
        timer.start(1, Duration::from_millis(100));
        timer.cancel();
        assert!(!timer.is_running());

        time::sleep(Duration::from_secs(5)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_replaces_schedule() {
        let (mut timer, mut rx) = PlaybackTimer::channel();
        timer.start(1, Duration::from_millis(100));
        timer.start(2, Duration::from_millis(100));

        assert_eq!(rx.recv().await, Some(PlaybackSignal::Tick(2)));
        time::sleep(Duration::from_millis(50)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_finish_after_delay() {
        let (mut timer, mut rx) = PlaybackTimer::channel();
        timer.start(3, Duration::from_millis(3000));
        let started = Instant::now();
        timer.finish_after(3, Duration::from_millis(300));

        assert_eq!(rx.recv().await, Some(PlaybackSignal::Finish(3)));
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(300) && elapsed < Duration::from_millis(3000));

        time::sleep(Duration::from_secs(10)).await;
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_signal_token() {
        assert_eq!(PlaybackSignal::Tick(4).token(), 4);
        assert_eq!(PlaybackSignal::Finish(9).token(), 9);
    }
}
