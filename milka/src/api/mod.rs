//! Messenger backend client
//!
//! The remote variant registers users, lists chats and sends/receives
//! messages through a small JSON REST backend.

mod client;
mod error;
mod http;
mod types;

#[cfg(test)]
pub use client::mock;
pub use client::MessengerApi;
pub use error::ApiError;
pub use http::{HttpMessengerApi, parse_response};
pub use types::{
    AuthRequest, AuthResponse, ChatKind, ChatListResponse, ChatSummary, CreateChatRequest, CreateChatResponse,
    DEFAULT_GROUP_AVATAR, DEFAULT_USER_AVATAR, Message, MessageListResponse, SendMessageRequest, SendMessageResponse,
    User, format_time_label, parse_timestamp,
};
