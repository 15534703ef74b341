//! Domain types for Milka
//!
//! Stories (statuses), the read-only directories behind the list screens,
//! and the built-in sample data.

mod directory;
mod sample;
mod story;

pub use directory::{Call, CallKind, Channel, Chat, Contact, Directory};
pub use story::{StoryGroup, StoryItem};
