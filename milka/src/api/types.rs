//! Wire types for the messenger backend
//!
//! Field names follow the backend's JSON (snake_case); request bodies for
//! the auth function are tagged by an `action` field.

use chrono::{DateTime, Datelike, Local, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::ApiError;
use crate::domain::Chat;

/// Avatar used when registration does not provide one
pub const DEFAULT_USER_AVATAR: &str = "👤";

/// Avatar used for new group chats
pub const DEFAULT_GROUP_AVATAR: &str = "👥";

/// A registered user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub phone: String,
    pub name: String,
    #[serde(default)]
    pub avatar: String,
}

/// Body posted to the auth function
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum AuthRequest {
    Register { phone: String, name: String, avatar: String },
    Login { phone: String },
}

impl AuthRequest {
    /// Build a registration request, trimming and checking required fields
    pub fn register(phone: &str, name: &str, avatar: Option<&str>) -> Result<Self, ApiError> {
        let phone = phone.trim();
        let name = name.trim();
        if phone.is_empty() || name.is_empty() {
            return Err(ApiError::Validation("Phone and name are required".to_string()));
        }
        let avatar = avatar.map(str::trim).filter(|a| !a.is_empty()).unwrap_or(DEFAULT_USER_AVATAR);
        Ok(Self::Register {
            phone: phone.to_string(),
            name: name.to_string(),
            avatar: avatar.to_string(),
        })
    }

    /// Build a login request
    pub fn login(phone: &str) -> Result<Self, ApiError> {
        let phone = phone.trim();
        if phone.is_empty() {
            return Err(ApiError::Validation("Phone is required".to_string()));
        }
        Ok(Self::Login {
            phone: phone.to_string(),
        })
    }
}

/// Successful register/login response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResponse {
    #[serde(default)]
    pub message: String,
    pub user: User,
    pub session_token: String,
    /// True when registration created a new account (HTTP 201)
    #[serde(skip)]
    pub created: bool,
}

/// Kind of conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatKind {
    #[default]
    Private,
    Group,
    #[serde(other)]
    Other,
}

/// One row of the chat list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatSummary {
    pub id: u64,
    #[serde(rename = "type", default)]
    pub kind: ChatKind,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    /// Other member's name for private chats
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub display_avatar: Option<String>,
    #[serde(default)]
    pub last_message: Option<String>,
    #[serde(default)]
    pub last_message_time: Option<String>,
    #[serde(default)]
    pub unread_count: u32,
}

impl ChatSummary {
    /// Convert to the list-screen shape, formatting times relative to `now`
    pub fn to_chat(&self, now: NaiveDateTime) -> Chat {
        let name = self
            .display_name
            .clone()
            .or_else(|| self.name.clone())
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| format!("Chat #{}", self.id));
        let avatar = self
            .display_avatar
            .clone()
            .or_else(|| self.avatar.clone())
            .filter(|a| !a.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_GROUP_AVATAR.to_string());
        let time = self
            .last_message_time
            .as_deref()
            .and_then(parse_timestamp)
            .map(|ts| format_time_label(ts, now))
            .unwrap_or_default();

        Chat {
            id: self.id,
            name,
            avatar,
            last_message: self.last_message.clone().unwrap_or_default(),
            time,
            unread: self.unread_count,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatListResponse {
    #[serde(default)]
    pub chats: Vec<ChatSummary>,
}

/// Body posted to create a chat
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateChatRequest {
    #[serde(rename = "type")]
    pub kind: ChatKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub other_user_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub avatar: String,
}

impl CreateChatRequest {
    /// Private chat with another user (returns the existing one if present)
    pub fn private(other_user_id: u64) -> Self {
        Self {
            kind: ChatKind::Private,
            other_user_id: Some(other_user_id),
            name: None,
            avatar: DEFAULT_GROUP_AVATAR.to_string(),
        }
    }

    /// Named group chat with just the creator in it
    pub fn group(name: &str, avatar: Option<&str>) -> Self {
        Self {
            kind: ChatKind::Group,
            other_user_id: None,
            name: Some(name.trim().to_string()),
            avatar: avatar.unwrap_or(DEFAULT_GROUP_AVATAR).to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreateChatResponse {
    pub chat_id: u64,
    #[serde(default)]
    pub message: String,
}

/// A message in a conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: u64,
    pub content: String,
    #[serde(rename = "type", default = "default_message_type")]
    pub kind: String,
    pub sender_id: u64,
    #[serde(default)]
    pub is_read: bool,
    pub created_at: String,
    #[serde(default)]
    pub sender_name: Option<String>,
    #[serde(default)]
    pub sender_avatar: Option<String>,
}

fn default_message_type() -> String {
    "text".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageListResponse {
    #[serde(default)]
    pub messages: Vec<Message>,
}

/// Body posted to send a message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SendMessageRequest {
    pub chat_id: u64,
    pub content: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl SendMessageRequest {
    /// Text message; blank content is rejected
    pub fn text(chat_id: u64, content: &str) -> Result<Self, ApiError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(ApiError::Validation("chat_id and content are required".to_string()));
        }
        Ok(Self {
            chat_id,
            content: content.to_string(),
            kind: default_message_type(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SendMessageResponse {
    #[serde(default)]
    pub message: String,
    pub id: u64,
    pub created_at: String,
}

/// Parse a backend timestamp
///
/// The backend renders datetimes with Python's `str()`, so both
/// `2024-05-01 14:23:11.123456` and RFC 3339 forms show up.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Local).naive_local());
    }
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Some(dt.with_timezone(&Local).naive_local());
    }
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}

/// Chat-list style label: time today, "Yesterday", weekday this week, date otherwise
pub fn format_time_label(ts: NaiveDateTime, now: NaiveDateTime) -> String {
    let days = (now.date() - ts.date()).num_days();
    match days {
        d if d <= 0 => ts.format("%H:%M").to_string(),
        1 => "Yesterday".to_string(),
        2..=6 => ts.weekday().to_string(),
        _ if ts.year() == now.year() => ts.format("%d.%m").to_string(),
        _ => ts.format("%d.%m.%y").to_string(),
    }
}
