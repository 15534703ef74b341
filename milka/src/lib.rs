//! Milka - terminal messenger with auto-playing statuses
//!
//! Chats, statuses, channels, calls and contacts in a terminal UI, working
//! either from local data or against a small JSON REST backend.
//!
//! # Modules
//!
//! - [`story`] - status playback: controller, timer and viewer
//! - [`domain`] - stories and the list-screen directories
//! - [`api`] - backend client (auth, chats, messages)
//! - [`session`] - signed-in session persisted on disk
//! - [`tui`] - ratatui front end
//! - [`config`] - configuration types and loading
//! - [`cli`] - command-line interface

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod session;
pub mod story;
pub mod tui;

// Re-export commonly used types
pub use api::{ApiError, HttpMessengerApi, MessengerApi};
pub use config::{BackendConfig, Config, DataConfig, PlaybackConfig};
pub use domain::{Call, CallKind, Channel, Chat, Contact, Directory, StoryGroup, StoryItem};
pub use session::{Session, SessionStore};
pub use story::{PlaybackController, PlaybackSignal, PlaybackState, PlaybackTimer, StoryViewer, TickOutcome, ViewerEvent};
