//! Read-only directories rendered by the list screens

use std::fs;
use std::path::Path;

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::story::StoryGroup;

/// A conversation in the chat list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chat {
    pub id: u64,
    pub name: String,
    pub avatar: String,
    #[serde(default)]
    pub last_message: String,
    /// Time of the last message, formatted for display
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub unread: u32,
}

impl Chat {
    /// Case-insensitive match against name and last message
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }
        self.name.to_lowercase().contains(&query) || self.last_message.to_lowercase().contains(&query)
    }
}

/// A broadcast channel the user follows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub id: u64,
    pub name: String,
    pub avatar: String,
    /// Subscriber count, formatted ("12.5K")
    pub subscribers: String,
    pub last_post: String,
}

/// Direction of a call log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallKind {
    Incoming,
    Outgoing,
    Missed,
}

impl CallKind {
    pub fn icon(&self) -> &'static str {
        match self {
            Self::Incoming => "↙",
            Self::Outgoing => "↗",
            Self::Missed => "✗",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Incoming => "incoming",
            Self::Outgoing => "outgoing",
            Self::Missed => "missed",
        }
    }
}

/// A call log entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Call {
    pub id: u64,
    pub name: String,
    pub avatar: String,
    pub kind: CallKind,
    pub time: String,
    /// Missed calls have no duration
    #[serde(default)]
    pub duration: Option<String>,
}

/// An address book entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub id: u64,
    pub name: String,
    pub avatar: String,
    pub phone: String,
    #[serde(default)]
    pub online: bool,
}

/// Everything the list screens display
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Directory {
    pub statuses: Vec<StoryGroup>,
    pub chats: Vec<Chat>,
    pub channels: Vec<Channel>,
    pub calls: Vec<Call>,
    pub contacts: Vec<Contact>,
}

impl Directory {
    /// Load a directory from a YAML file; missing sections are empty
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        debug!(path = %path.as_ref().display(), "Directory::load: called");
        let content = fs::read_to_string(&path).context("Failed to read directory file")?;
        let directory: Self = serde_yaml::from_str(&content).context("Failed to parse directory file")?;
        info!(
            statuses = directory.statuses.len(),
            chats = directory.chats.len(),
            "Loaded directory from: {}",
            path.as_ref().display()
        );
        Ok(directory)
    }

    /// Load from `path` when given, otherwise the built-in sample data
    pub fn load_or_sample(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => {
                debug!("Directory::load_or_sample: no file, using sample data");
                Ok(Self::sample())
            }
        }
    }

    /// Chats matching a search query, in list order
    pub fn search_chats(&self, query: &str) -> Vec<&Chat> {
        debug!(%query, "Directory::search_chats: called");
        self.chats.iter().filter(|c| c.matches(query)).collect()
    }

    pub fn status(&self, id: u64) -> Option<&StoryGroup> {
        self.statuses.iter().find(|s| s.id == id)
    }

    pub fn total_unread(&self) -> u32 {
        self.chats.iter().map(|c| c.unread).sum()
    }
}
