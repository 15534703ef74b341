//! Signed-in session kept on disk
//!
//! One JSON file holding the user and token returned by the auth function.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::api::{AuthResponse, User};
use crate::config::DataConfig;

/// The signed-in identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user: User,
    pub token: String,
    pub signed_in_at: DateTime<Utc>,
}

impl Session {
    pub fn from_auth(response: &AuthResponse) -> Self {
        Self {
            user: response.user.clone(),
            token: response.session_token.clone(),
            signed_in_at: Utc::now(),
        }
    }
}

/// Reads and writes the session file
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `~/.local/share/milka/session.json` on Linux
    pub fn default_path() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("milka")
            .join("session.json")
    }

    pub fn from_config(config: &DataConfig) -> Self {
        Self::new(config.session_file.clone().unwrap_or_else(Self::default_path))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the saved session; `None` when nobody is signed in
    pub fn load(&self) -> Result<Option<Session>> {
        debug!(path = %self.path.display(), "SessionStore::load: called");
        if !self.path.exists() {
            debug!("SessionStore::load: no session file");
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path).context("Failed to read session file")?;
        let session: Session = serde_json::from_str(&content).context("Failed to parse session file")?;
        debug!(user_id = session.user.id, "SessionStore::load: loaded session");
        Ok(Some(session))
    }

    /// Save the session, replacing any previous one
    pub fn save(&self, session: &Session) -> Result<()> {
        debug!(path = %self.path.display(), user_id = session.user.id, "SessionStore::save: called");
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).context("Failed to create session directory")?;
        }
        let content = serde_json::to_string_pretty(session).context("Failed to serialize session")?;

        // Sibling temp file, then rename into place
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, content).context("Failed to write session file")?;
        fs::rename(&tmp, &self.path).context("Failed to move session file into place")?;

        info!("Saved session for {} ({})", session.user.name, session.user.phone);
        Ok(())
    }

    /// Remove the session; returns false if there was none
    pub fn clear(&self) -> Result<bool> {
        debug!(path = %self.path.display(), "SessionStore::clear: called");
        if !self.path.exists() {
            return Ok(false);
        }
        fs::remove_file(&self.path).context("Failed to remove session file")?;
        info!("Cleared session");
        Ok(true)
    }
}
