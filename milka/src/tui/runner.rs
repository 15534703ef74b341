//! TUI Runner - main loop that owns the terminal
//!
//! The TuiRunner is responsible for:
//! - Dispatching key events to App
//! - Feeding story playback signals back into the viewer
//! - Running backend requests in background tasks and applying their results

use std::sync::Arc;
use std::time::{Duration, Instant};

use eyre::Result;
use tokio::sync::mpsc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::api::{ApiError, ChatSummary, Message, MessengerApi, SendMessageRequest, SendMessageResponse};

use super::Tui;
use super::app::App;
use super::events::{Event, EventHandler};
use super::state::{AppState, PendingRequest};
use super::views;

/// How often the chat list is refreshed while signed in
const CHAT_REFRESH_INTERVAL: Duration = Duration::from_secs(15);

/// Redraw rate when idle
const TICK_RATE: Duration = Duration::from_millis(100);

/// Completed backend request
#[derive(Debug)]
pub enum ApiResult {
    Chats(Result<Vec<ChatSummary>, ApiError>),
    Messages {
        chat_id: u64,
        result: Result<Vec<Message>, ApiError>,
    },
    Sent {
        chat_id: u64,
        local_id: Uuid,
        result: Result<SendMessageResponse, ApiError>,
    },
}

/// Spawns one task per backend request and reports back over a channel
#[derive(Clone)]
pub struct RequestDispatcher {
    api: Arc<dyn MessengerApi>,
    tx: mpsc::UnboundedSender<ApiResult>,
}

impl RequestDispatcher {
    pub fn new(api: Arc<dyn MessengerApi>) -> (Self, mpsc::UnboundedReceiver<ApiResult>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { api, tx }, rx)
    }

    pub fn dispatch(&self, user_id: u64, request: PendingRequest) {
        debug!(user_id, ?request, "RequestDispatcher::dispatch: called");
        let api = Arc::clone(&self.api);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = match request {
                PendingRequest::RefreshChats => ApiResult::Chats(api.list_chats(user_id).await),
                PendingRequest::LoadMessages { chat_id } => ApiResult::Messages {
                    chat_id,
                    result: api.list_messages(user_id, chat_id).await,
                },
                PendingRequest::SendMessage {
                    chat_id,
                    local_id,
                    content,
                } => {
                    let result = match SendMessageRequest::text(chat_id, &content) {
                        Ok(request) => api.send_message(user_id, request).await,
                        Err(e) => Err(e),
                    };
                    ApiResult::Sent {
                        chat_id,
                        local_id,
                        result,
                    }
                }
            };
            if tx.send(result).is_err() {
                debug!("RequestDispatcher: receiver dropped");
            }
        });
    }
}

/// Fold a finished request into the state
pub fn apply_result(state: &mut AppState, result: ApiResult) {
    debug!("apply_result: called");
    match result {
        ApiResult::Chats(Ok(summaries)) => {
            let now = chrono::Local::now().naive_local();
            state.set_chats(summaries.iter().map(|s| s.to_chat(now)).collect());
        }
        ApiResult::Chats(Err(e)) => state.backend_failed(format!("Failed to load chats: {}", e)),
        ApiResult::Messages {
            chat_id,
            result: Ok(messages),
        } => state.set_messages(chat_id, &messages),
        ApiResult::Messages { chat_id, result: Err(e) } => {
            if let Some(conv) = state.conversation.as_mut().filter(|c| c.chat_id == chat_id) {
                conv.loading = false;
            }
            state.backend_failed(format!("Failed to load messages: {}", e));
        }
        ApiResult::Sent {
            chat_id,
            local_id,
            result: Ok(response),
        } => state.confirm_sent(chat_id, local_id, &response),
        ApiResult::Sent {
            chat_id,
            local_id,
            result: Err(e),
        } => state.fail_sent(chat_id, local_id, &e.to_string()),
    }
}

/// TUI Runner that manages the terminal and event loop
pub struct TuiRunner {
    app: App,
    terminal: Tui,
    event_handler: EventHandler,
    dispatcher: Option<RequestDispatcher>,
    results: mpsc::UnboundedReceiver<ApiResult>,
    last_refresh: Instant,
}

impl TuiRunner {
    /// Runner over `state`; backend requests go to `api` when given
    pub fn new(terminal: Tui, state: AppState, api: Option<Arc<dyn MessengerApi>>) -> Self {
        let (dispatcher, results) = match api {
            Some(api) => {
                let (dispatcher, rx) = RequestDispatcher::new(api);
                (Some(dispatcher), rx)
            }
            None => (None, mpsc::unbounded_channel().1),
        };
        Self {
            app: App::with_state(state),
            terminal,
            event_handler: EventHandler::new(TICK_RATE),
            dispatcher,
            results,
            last_refresh: Instant::now(),
        }
    }

    /// Run the TUI main loop
    pub async fn run(&mut self) -> Result<()> {
        info!("TUI started");
        loop {
            self.dispatch_pending();
            self.terminal.draw(|frame| views::render(self.app.state(), frame))?;

            tokio::select! {
                event = self.event_handler.next() => match event? {
                    Event::Tick => self.handle_tick(),
                    Event::Key(key) => {
                        if self.app.handle_key(key) {
                            break;
                        }
                    }
                    Event::Resize(width, height) => {
                        debug!(width, height, "TuiRunner: resize");
                    }
                },
                Some(signal) = self.app.state_mut().viewer.next_signal() => {
                    let event = self.app.state_mut().handle_playback(signal);
                    debug!(?event, "TuiRunner: playback signal handled");
                }
                Some(result) = self.results.recv() => {
                    apply_result(self.app.state_mut(), result);
                }
            }

            if self.app.state().should_quit {
                break;
            }
        }
        info!("TUI stopped");
        Ok(())
    }

    fn handle_tick(&mut self) {
        if self.app.state().is_remote() && self.last_refresh.elapsed() >= CHAT_REFRESH_INTERVAL {
            self.app.state_mut().request(PendingRequest::RefreshChats);
            self.last_refresh = Instant::now();
        }
    }

    /// Hand queued requests to the dispatcher
    fn dispatch_pending(&mut self) {
        let requests = self.app.state_mut().take_requests();
        if requests.is_empty() {
            return;
        }
        let (Some(dispatcher), Some(user_id)) = (&self.dispatcher, self.app.state().user_id()) else {
            debug!(count = requests.len(), "TuiRunner: no backend, dropping requests");
            return;
        };
        for request in requests {
            dispatcher.dispatch(user_id, request);
        }
    }
}
