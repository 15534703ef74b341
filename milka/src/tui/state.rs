//! TUI application state
//!
//! Pure data structures for the TUI. No rendering logic here.

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::api::{Message, SendMessageResponse};
use crate::domain::{Chat, Directory, StoryGroup};
use crate::session::Session;
use crate::story::{PlaybackSignal, StoryViewer, ViewerEvent};

/// Bottom navigation tabs, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Chats,
    Statuses,
    Channels,
    Calls,
    Contacts,
}

impl Tab {
    pub const ALL: [Tab; 5] = [Tab::Chats, Tab::Statuses, Tab::Channels, Tab::Calls, Tab::Contacts];

    pub fn next(self) -> Self {
        debug!(?self, "Tab::next: called");
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        debug!(?self, "Tab::prev: called");
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    pub fn index(self) -> usize {
        match self {
            Self::Chats => 0,
            Self::Statuses => 1,
            Self::Channels => 2,
            Self::Calls => 3,
            Self::Contacts => 4,
        }
    }

    /// Tab for a 1-based number key
    pub fn from_digit(c: char) -> Option<Self> {
        let n = c.to_digit(10)? as usize;
        n.checked_sub(1).and_then(|i| Self::ALL.get(i).copied())
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Chats => "Chats",
            Self::Statuses => "Statuses",
            Self::Channels => "Channels",
            Self::Calls => "Calls",
            Self::Contacts => "Contacts",
        }
    }
}

/// Which screen is displayed
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum View {
    /// The tabbed lists
    #[default]
    Tabs,
    /// A single chat's messages
    Conversation { chat_id: u64, title: String },
}

/// Interaction mode (modal)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum InteractionMode {
    /// Normal navigation mode
    #[default]
    Normal,
    /// Typing into the chat search box (/ key)
    Filter,
    /// Typing a message in a conversation
    Compose,
    /// Help overlay
    Help,
}

/// Backend connection indicator for the header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Connection {
    /// No backend, sample or file data
    #[default]
    Local,
    /// Waiting for the first response
    Connecting,
    /// Last request succeeded
    Online,
    /// Last request failed
    Offline,
}

/// Delivery state of a message typed in this session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Pending,
    Sent,
    Failed,
}

/// One message line in a conversation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationMessage {
    /// Client-side id; server messages get a fresh one on load
    pub local_id: Uuid,
    pub server_id: Option<u64>,
    pub sender_name: String,
    pub content: String,
    pub time: String,
    pub outgoing: bool,
    pub delivery: Delivery,
}

impl ConversationMessage {
    fn from_server(message: &Message, my_user_id: Option<u64>) -> Self {
        let outgoing = my_user_id == Some(message.sender_id);
        let time = crate::api::parse_timestamp(&message.created_at)
            .map(|ts| ts.format("%H:%M").to_string())
            .unwrap_or_default();
        Self {
            local_id: Uuid::now_v7(),
            server_id: Some(message.id),
            sender_name: message
                .sender_name
                .clone()
                .unwrap_or_else(|| format!("User #{}", message.sender_id)),
            content: message.content.clone(),
            time,
            outgoing,
            delivery: Delivery::Sent,
        }
    }

    fn outgoing(sender_name: &str, content: &str) -> Self {
        Self {
            local_id: Uuid::now_v7(),
            server_id: None,
            sender_name: sender_name.to_string(),
            content: content.to_string(),
            time: chrono::Local::now().format("%H:%M").to_string(),
            outgoing: true,
            delivery: Delivery::Pending,
        }
    }
}

/// An open chat
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    pub chat_id: u64,
    pub messages: Vec<ConversationMessage>,
    pub loading: bool,
    /// Lines scrolled up from the bottom
    pub scroll: usize,
    /// Composer buffer
    pub input: String,
}

/// Work for the runner to do against the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingRequest {
    RefreshChats,
    LoadMessages { chat_id: u64 },
    SendMessage { chat_id: u64, local_id: Uuid, content: String },
}

/// Selection state for list views
#[derive(Debug, Clone, Default)]
pub struct SelectionState {
    pub selected_index: usize,
}

impl SelectionState {
    pub fn select_next(&mut self, max_items: usize) {
        if max_items > 0 && self.selected_index < max_items - 1 {
            self.selected_index += 1;
        }
    }

    pub fn select_prev(&mut self) {
        if self.selected_index > 0 {
            self.selected_index -= 1;
        }
    }

    pub fn select_first(&mut self) {
        self.selected_index = 0;
    }

    pub fn select_last(&mut self, max_items: usize) {
        if max_items > 0 {
            self.selected_index = max_items - 1;
        }
    }

    /// Ensure selection is within bounds
    pub fn clamp(&mut self, max_items: usize) {
        if max_items == 0 {
            self.selected_index = 0;
        } else if self.selected_index >= max_items {
            self.selected_index = max_items - 1;
        }
    }
}

/// Main TUI application state
#[derive(Debug)]
pub struct AppState {
    pub current_tab: Tab,
    pub current_view: View,
    pub interaction_mode: InteractionMode,
    /// Chat search text
    pub filter_text: String,
    pub should_quit: bool,
    /// Last error message, cleared on the next key press
    pub error_message: Option<String>,

    // === Data ===
    pub directory: Directory,
    pub session: Option<Session>,
    pub connection: Connection,

    // === Selection state per tab ===
    pub selections: [SelectionState; 5],

    // === Overlays and nested views ===
    pub viewer: StoryViewer,
    pub conversation: Option<Conversation>,

    // === Pending backend work ===
    pub pending_requests: Vec<PendingRequest>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    /// Local state with the sample directory
    pub fn new() -> Self {
        Self::with_directory(Directory::sample(), StoryViewer::default())
    }

    pub fn with_directory(directory: Directory, viewer: StoryViewer) -> Self {
        debug!("AppState::with_directory: called");
        Self {
            current_tab: Tab::default(),
            current_view: View::default(),
            interaction_mode: InteractionMode::default(),
            filter_text: String::new(),
            should_quit: false,
            error_message: None,
            directory,
            session: None,
            connection: Connection::Local,
            selections: Default::default(),
            viewer,
            conversation: None,
            pending_requests: Vec::new(),
        }
    }

    /// Attach a signed-in session; chats come from the backend from now on
    pub fn sign_in(&mut self, session: Session) {
        info!("TUI signed in as {}", session.user.name);
        self.session = Some(session);
        self.connection = Connection::Connecting;
        self.request(PendingRequest::RefreshChats);
    }

    pub fn is_remote(&self) -> bool {
        self.session.is_some()
    }

    pub fn user_id(&self) -> Option<u64> {
        self.session.as_ref().map(|s| s.user.id)
    }

    pub fn request(&mut self, request: PendingRequest) {
        debug!(?request, "AppState::request: called");
        if !self.pending_requests.contains(&request) {
            self.pending_requests.push(request);
        }
    }

    pub fn take_requests(&mut self) -> Vec<PendingRequest> {
        std::mem::take(&mut self.pending_requests)
    }

    pub fn set_error(&mut self, msg: impl Into<String>) {
        let msg = msg.into();
        warn!("TUI error: {}", msg);
        self.error_message = Some(msg);
    }

    pub fn clear_error(&mut self) {
        self.error_message = None;
    }

    // === Tabs and selection ===

    pub fn switch_tab(&mut self, tab: Tab) {
        debug!(?tab, "AppState::switch_tab: called");
        self.current_tab = tab;
        if tab != Tab::Chats && self.interaction_mode == InteractionMode::Filter {
            self.interaction_mode = InteractionMode::Normal;
        }
    }

    /// Chats after applying the search box
    pub fn filtered_chats(&self) -> Vec<&Chat> {
        self.directory.search_chats(&self.filter_text)
    }

    /// Number of rows in the current tab
    pub fn current_item_count(&self) -> usize {
        match self.current_tab {
            Tab::Chats => self.filtered_chats().len(),
            Tab::Statuses => self.directory.statuses.len(),
            Tab::Channels => self.directory.channels.len(),
            Tab::Calls => self.directory.calls.len(),
            Tab::Contacts => self.directory.contacts.len(),
        }
    }

    pub fn selection(&self, tab: Tab) -> &SelectionState {
        &self.selections[tab.index()]
    }

    pub fn current_selection_mut(&mut self) -> &mut SelectionState {
        &mut self.selections[self.current_tab.index()]
    }

    pub fn selected_index(&self) -> usize {
        self.selection(self.current_tab).selected_index
    }

    pub fn clamp_selection(&mut self) {
        let max = self.current_item_count();
        self.current_selection_mut().clamp(max);
    }

    pub fn push_filter_char(&mut self, c: char) {
        self.filter_text.push(c);
        self.clamp_selection();
    }

    pub fn pop_filter_char(&mut self) {
        self.filter_text.pop();
        self.clamp_selection();
    }

    pub fn clear_filter(&mut self) {
        self.filter_text.clear();
        self.clamp_selection();
    }

    pub fn selected_chat(&self) -> Option<&Chat> {
        self.filtered_chats()
            .get(self.selection(Tab::Chats).selected_index)
            .copied()
    }

    pub fn selected_status(&self) -> Option<&StoryGroup> {
        self.directory
            .statuses
            .get(self.selection(Tab::Statuses).selected_index)
    }

    // === Story viewer ===

    /// Open the highlighted status; empty groups are inert
    pub fn open_selected_status(&mut self) -> bool {
        let Some(group) = self.selected_status().cloned() else {
            debug!("AppState::open_selected_status: nothing selected");
            return false;
        };
        self.viewer.open(group)
    }

    pub fn close_viewer(&mut self) {
        self.viewer.close();
    }

    pub fn handle_playback(&mut self, signal: PlaybackSignal) -> ViewerEvent {
        self.viewer.handle(signal)
    }

    // === Remote chats ===

    /// Replace the chat list with fresh backend data
    pub fn set_chats(&mut self, chats: Vec<Chat>) {
        debug!(count = chats.len(), "AppState::set_chats: called");
        self.directory.chats = chats;
        self.connection = Connection::Online;
        let max = self.filtered_chats().len();
        self.selections[Tab::Chats.index()].clamp(max);
    }

    pub fn backend_failed(&mut self, msg: impl Into<String>) {
        self.connection = Connection::Offline;
        self.set_error(msg);
    }

    /// Open the highlighted chat in remote mode
    pub fn open_selected_chat(&mut self) -> bool {
        if !self.is_remote() {
            self.set_error("Sign in to open conversations (milka login --phone ...)");
            return false;
        }
        let Some(chat) = self.selected_chat().cloned() else {
            return false;
        };
        info!("Opening chat {} ({})", chat.name, chat.id);
        self.current_view = View::Conversation {
            chat_id: chat.id,
            title: chat.name.clone(),
        };
        self.conversation = Some(Conversation {
            chat_id: chat.id,
            loading: true,
            ..Default::default()
        });
        if let Some(entry) = self.directory.chats.iter_mut().find(|c| c.id == chat.id) {
            entry.unread = 0;
        }
        self.request(PendingRequest::LoadMessages { chat_id: chat.id });
        true
    }

    pub fn close_conversation(&mut self) {
        debug!("AppState::close_conversation: called");
        self.current_view = View::Tabs;
        self.conversation = None;
        self.interaction_mode = InteractionMode::Normal;
    }

    /// Install loaded messages, keeping local messages the server has not confirmed
    pub fn set_messages(&mut self, chat_id: u64, messages: &[Message]) {
        let my_id = self.user_id();
        let Some(conv) = self.conversation.as_mut().filter(|c| c.chat_id == chat_id) else {
            debug!(chat_id, "AppState::set_messages: conversation no longer open");
            return;
        };
        // Local messages the snapshot does not know about yet survive the reload
        let local_only: Vec<_> = conv
            .messages
            .drain(..)
            .filter(|m| match m.server_id {
                Some(id) => m.outgoing && !messages.iter().any(|s| s.id == id),
                None => true,
            })
            .collect();
        conv.messages = messages
            .iter()
            .map(|m| ConversationMessage::from_server(m, my_id))
            .collect();
        conv.messages.extend(local_only);
        conv.loading = false;
        self.connection = Connection::Online;
    }

    /// Append the composed message optimistically and queue the send
    pub fn submit_compose(&mut self) -> bool {
        let sender = self
            .session
            .as_ref()
            .map(|s| s.user.name.clone())
            .unwrap_or_else(|| "me".to_string());
        let Some(conv) = self.conversation.as_mut() else {
            return false;
        };
        let content = conv.input.trim().to_string();
        if content.is_empty() {
            debug!("AppState::submit_compose: empty input");
            return false;
        }
        conv.input.clear();
        conv.scroll = 0;

        let message = ConversationMessage::outgoing(&sender, &content);
        let local_id = message.local_id;
        let chat_id = conv.chat_id;
        conv.messages.push(message);

        if let Some(chat) = self.directory.chats.iter_mut().find(|c| c.id == chat_id) {
            chat.last_message = content.clone();
            chat.time = chrono::Local::now().format("%H:%M").to_string();
        }
        self.request(PendingRequest::SendMessage {
            chat_id,
            local_id,
            content,
        });
        true
    }

    fn message_mut(&mut self, chat_id: u64, local_id: Uuid) -> Option<&mut ConversationMessage> {
        self.conversation
            .as_mut()
            .filter(|c| c.chat_id == chat_id)?
            .messages
            .iter_mut()
            .find(|m| m.local_id == local_id)
    }

    pub fn confirm_sent(&mut self, chat_id: u64, local_id: Uuid, response: &SendMessageResponse) {
        debug!(chat_id, %local_id, server_id = response.id, "AppState::confirm_sent: called");
        self.connection = Connection::Online;
        if let Some(conv) = self.conversation.as_mut().filter(|c| c.chat_id == chat_id) {
            if conv.messages.iter().any(|m| m.server_id == Some(response.id)) {
                debug!(server_id = response.id, "AppState::confirm_sent: already loaded, dropping local copy");
                conv.messages.retain(|m| m.local_id != local_id);
                return;
            }
        }
        if let Some(msg) = self.message_mut(chat_id, local_id) {
            msg.server_id = Some(response.id);
            msg.delivery = Delivery::Sent;
            if let Some(ts) = crate::api::parse_timestamp(&response.created_at) {
                msg.time = ts.format("%H:%M").to_string();
            }
        }
    }

    pub fn fail_sent(&mut self, chat_id: u64, local_id: Uuid, error: &str) {
        if let Some(msg) = self.message_mut(chat_id, local_id) {
            msg.delivery = Delivery::Failed;
        }
        self.backend_failed(format!("Message not sent: {}", error));
    }
}
