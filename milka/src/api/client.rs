//! MessengerApi trait definition

use async_trait::async_trait;

use super::{
    ApiError, AuthRequest, AuthResponse, ChatSummary, CreateChatRequest, CreateChatResponse, Message,
    SendMessageRequest, SendMessageResponse,
};

/// Client side of the messenger backend
///
/// Chats and messages are scoped to the signed-in user, identified by id.
#[async_trait]
pub trait MessengerApi: Send + Sync {
    /// Register (or re-register) a phone number
    async fn register(&self, request: AuthRequest) -> Result<AuthResponse, ApiError>;

    /// Sign in an existing phone number
    async fn login(&self, request: AuthRequest) -> Result<AuthResponse, ApiError>;

    /// Chats the user belongs to, most recent activity first
    async fn list_chats(&self, user_id: u64) -> Result<Vec<ChatSummary>, ApiError>;

    /// Create a chat, or get the existing private chat with the same member
    async fn create_chat(&self, user_id: u64, request: CreateChatRequest) -> Result<CreateChatResponse, ApiError>;

    /// Messages of a chat, oldest first; the backend marks them read
    async fn list_messages(&self, user_id: u64, chat_id: u64) -> Result<Vec<Message>, ApiError>;

    /// Send a message as `user_id`
    async fn send_message(&self, user_id: u64, request: SendMessageRequest) -> Result<SendMessageResponse, ApiError>;
}
