//! Story (status) playback
//!
//! - [`controller`] - pure playback state machine
//! - [`timer`] - repeating tick and delayed finish on tokio
//! - [`viewer`] - the two wired together for the UI

pub mod controller;
pub mod timer;
pub mod viewer;

pub use controller::{PlaybackController, PlaybackState, SessionToken, TickOutcome, segment_fill};
pub use timer::{MIN_TICK_PERIOD, PlaybackSignal, PlaybackTimer};
pub use viewer::{StoryViewer, ViewerEvent};
