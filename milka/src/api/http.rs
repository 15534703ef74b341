//! reqwest implementation of MessengerApi
//!
//! Talks to the three backend functions (auth, chats, messages). Chat and
//! message calls identify the user with the `X-User-Id` header; the session
//! token, when known, rides along as `X-Session-Token`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::{
    ApiError, AuthRequest, AuthResponse, ChatListResponse, ChatSummary, CreateChatRequest, CreateChatResponse,
    Message, MessageListResponse, MessengerApi, SendMessageRequest, SendMessageResponse,
};
use crate::config::{BackendConfig, Endpoints};

/// Maximum number of retries for transient errors on read calls
const MAX_RETRIES: u32 = 2;

/// Initial backoff delay for retries
const INITIAL_BACKOFF_MS: u64 = 500;

const USER_ID_HEADER: &str = "X-User-Id";
const SESSION_TOKEN_HEADER: &str = "X-Session-Token";

/// HTTP client for the messenger backend
pub struct HttpMessengerApi {
    endpoints: Endpoints,
    http: Client,
    session_token: Option<String>,
}

impl HttpMessengerApi {
    pub fn new(endpoints: Endpoints, timeout: Duration) -> Result<Self, ApiError> {
        debug!(?endpoints, ?timeout, "HttpMessengerApi::new: called");
        let http = Client::builder().timeout(timeout).build().map_err(ApiError::Network)?;
        Ok(Self {
            endpoints,
            http,
            session_token: None,
        })
    }

    /// Create a client from configuration; fails when the backend is not configured
    pub fn from_config(config: &BackendConfig) -> Result<Self, ApiError> {
        let endpoints = config.endpoints().ok_or(ApiError::NotConfigured)?;
        Self::new(endpoints, config.timeout())
    }

    pub fn with_session_token(mut self, token: impl Into<String>) -> Self {
        self.session_token = Some(token.into());
        self
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    fn authed(&self, builder: RequestBuilder, user_id: u64) -> RequestBuilder {
        let builder = builder.header(USER_ID_HEADER, user_id.to_string());
        match &self.session_token {
            Some(token) => builder.header(SESSION_TOKEN_HEADER, token),
            None => builder,
        }
    }

    async fn send<T: DeserializeOwned>(builder: RequestBuilder) -> Result<(StatusCode, T), ApiError> {
        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;
        debug!(status = status.as_u16(), body_len = body.len(), "HttpMessengerApi::send: response");
        let parsed = parse_response(status.as_u16(), &body)?;
        Ok((status, parsed))
    }

    /// Run an idempotent request, retrying transient failures with backoff
    async fn with_retry<T, F>(&self, what: &str, make: F) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        F: Fn() -> RequestBuilder,
    {
        let mut attempt = 0;
        loop {
            match Self::send::<T>(make()).await {
                Ok((_, value)) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < MAX_RETRIES => {
                    let backoff = Duration::from_millis(INITIAL_BACKOFF_MS * 2u64.pow(attempt));
                    warn!("{} failed ({}), retrying in {:?}", what, e, backoff);
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Decode a backend response body, mapping non-success statuses to errors
pub fn parse_response<T: DeserializeOwned>(status: u16, body: &str) -> Result<T, ApiError> {
    if !(200..300).contains(&status) {
        return Err(ApiError::from_status(status, body));
    }
    serde_json::from_str(body).map_err(|e| {
        let preview: String = body.chars().take(200).collect();
        ApiError::InvalidResponse(format!("{} in body: {}", e, preview))
    })
}

#[async_trait]
impl MessengerApi for HttpMessengerApi {
    async fn register(&self, request: AuthRequest) -> Result<AuthResponse, ApiError> {
        debug!("HttpMessengerApi::register: called");
        let builder = self.http.post(&self.endpoints.auth).json(&request);
        let (status, mut response): (StatusCode, AuthResponse) = Self::send(builder).await?;
        response.created = status == StatusCode::CREATED;
        Ok(response)
    }

    async fn login(&self, request: AuthRequest) -> Result<AuthResponse, ApiError> {
        debug!("HttpMessengerApi::login: called");
        let builder = self.http.post(&self.endpoints.auth).json(&request);
        let (_, response) = Self::send(builder).await?;
        Ok(response)
    }

    async fn list_chats(&self, user_id: u64) -> Result<Vec<ChatSummary>, ApiError> {
        debug!(user_id, "HttpMessengerApi::list_chats: called");
        let response: ChatListResponse = self
            .with_retry("list chats", || self.authed(self.http.get(&self.endpoints.chats), user_id))
            .await?;
        debug!(count = response.chats.len(), "HttpMessengerApi::list_chats: received");
        Ok(response.chats)
    }

    async fn create_chat(&self, user_id: u64, request: CreateChatRequest) -> Result<CreateChatResponse, ApiError> {
        debug!(user_id, ?request, "HttpMessengerApi::create_chat: called");
        let builder = self.authed(self.http.post(&self.endpoints.chats), user_id).json(&request);
        let (_, response) = Self::send(builder).await?;
        Ok(response)
    }

    async fn list_messages(&self, user_id: u64, chat_id: u64) -> Result<Vec<Message>, ApiError> {
        debug!(user_id, chat_id, "HttpMessengerApi::list_messages: called");
        let chat_id = chat_id.to_string();
        let response: MessageListResponse = self
            .with_retry("list messages", || {
                self.authed(self.http.get(&self.endpoints.messages), user_id)
                    .query(&[("chat_id", chat_id.as_str())])
            })
            .await?;
        Ok(response.messages)
    }

    async fn send_message(&self, user_id: u64, request: SendMessageRequest) -> Result<SendMessageResponse, ApiError> {
        debug!(user_id, chat_id = request.chat_id, "HttpMessengerApi::send_message: called");
        let builder = self.authed(self.http.post(&self.endpoints.messages), user_id).json(&request);
        let (_, response) = Self::send(builder).await?;
        Ok(response)
    }
}
