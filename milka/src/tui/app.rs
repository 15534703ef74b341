//! TUI application - event handling and state management
//!
//! The App struct owns the AppState and handles all keyboard events.
//! It does not do any rendering - that's delegated to the views module.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::debug;

use super::state::{AppState, InteractionMode, PendingRequest, Tab, View};

/// TUI application
#[derive(Debug)]
pub struct App {
    /// Application state
    state: AppState,
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl App {
    /// Create a new application instance with the sample directory
    pub fn new() -> Self {
        Self { state: AppState::new() }
    }

    pub fn with_state(state: AppState) -> Self {
        Self { state }
    }

    /// Get reference to state
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Get mutable reference to state
    pub fn state_mut(&mut self) -> &mut AppState {
        &mut self.state
    }

    /// Handle a key event
    ///
    /// Returns true if the application should exit.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        debug!(?key, "App::handle_key: called");
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return true;
        }

        // Clear any transient error message on key press
        self.state.clear_error();

        // The story overlay swallows everything while it is open
        if self.state.viewer.is_open() {
            self.handle_viewer_key(key);
            return false;
        }

        match &self.state.interaction_mode {
            InteractionMode::Normal => self.handle_normal_key(key),
            InteractionMode::Filter => self.handle_filter_key(key),
            InteractionMode::Compose => self.handle_compose_key(key),
            InteractionMode::Help => self.handle_help_key(key),
        }
        self.state.should_quit
    }

    fn handle_viewer_key(&mut self, key: KeyEvent) {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('x')) {
            self.state.close_viewer();
        }
    }

    /// Handle key in normal mode
    fn handle_normal_key(&mut self, key: KeyEvent) {
        if matches!(self.state.current_view, View::Conversation { .. }) {
            self.handle_conversation_key(key);
            return;
        }

        match key.code {
            // === Quit ===
            KeyCode::Char('q') => {
                self.state.should_quit = true;
            }

            // === Help ===
            KeyCode::Char('?') | KeyCode::F(1) => {
                self.state.interaction_mode = InteractionMode::Help;
            }

            // === Tabs ===
            KeyCode::Tab | KeyCode::Right | KeyCode::Char('l') => {
                let tab = self.state.current_tab.next();
                self.state.switch_tab(tab);
            }
            KeyCode::BackTab | KeyCode::Left | KeyCode::Char('h') => {
                let tab = self.state.current_tab.prev();
                self.state.switch_tab(tab);
            }
            KeyCode::Char(c @ '1'..='5') => {
                if let Some(tab) = Tab::from_digit(c) {
                    self.state.switch_tab(tab);
                }
            }

            // === Navigation ===
            KeyCode::Up | KeyCode::Char('k') => {
                self.state.current_selection_mut().select_prev();
            }
            KeyCode::Down | KeyCode::Char('j') => {
                let max = self.state.current_item_count();
                self.state.current_selection_mut().select_next(max);
            }
            KeyCode::Char('g') => {
                self.state.current_selection_mut().select_first();
            }
            KeyCode::Char('G') => {
                let max = self.state.current_item_count();
                self.state.current_selection_mut().select_last(max);
            }

            // === Search (chats only) ===
            KeyCode::Char('/') if self.state.current_tab == Tab::Chats => {
                self.state.interaction_mode = InteractionMode::Filter;
            }

            // === Open / back ===
            KeyCode::Enter => self.handle_open(),
            KeyCode::Esc => {
                if !self.state.filter_text.is_empty() {
                    self.state.clear_filter();
                }
            }

            // === Refresh ===
            KeyCode::Char('r') if self.state.is_remote() => {
                self.state.request(PendingRequest::RefreshChats);
            }

            _ => {}
        }
    }

    fn handle_open(&mut self) {
        match self.state.current_tab {
            Tab::Statuses => {
                self.state.open_selected_status();
            }
            Tab::Chats => {
                self.state.open_selected_chat();
            }
            _ => {}
        }
    }

    fn handle_conversation_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => self.state.close_conversation(),
            KeyCode::Char('i') | KeyCode::Enter => {
                self.state.interaction_mode = InteractionMode::Compose;
            }
            KeyCode::Up | KeyCode::Char('k') => {
                if let Some(conv) = self.state.conversation.as_mut() {
                    conv.scroll = (conv.scroll + 1).min(conv.messages.len().saturating_sub(1));
                }
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if let Some(conv) = self.state.conversation.as_mut() {
                    conv.scroll = conv.scroll.saturating_sub(1);
                }
            }
            KeyCode::Char('r') => {
                if let Some(chat_id) = self.state.conversation.as_ref().map(|c| c.chat_id) {
                    self.state.request(PendingRequest::LoadMessages { chat_id });
                }
            }
            KeyCode::Char('?') => {
                self.state.interaction_mode = InteractionMode::Help;
            }
            _ => {}
        }
    }

    /// Handle key in filter mode
    fn handle_filter_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.state.clear_filter();
                self.state.interaction_mode = InteractionMode::Normal;
            }
            KeyCode::Enter | KeyCode::Down => {
                self.state.interaction_mode = InteractionMode::Normal;
            }
            KeyCode::Backspace => {
                self.state.pop_filter_char();
            }
            KeyCode::Char(c) => {
                self.state.push_filter_char(c);
            }
            _ => {}
        }
    }

    /// Handle key while typing a message
    fn handle_compose_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.state.interaction_mode = InteractionMode::Normal;
            }
            KeyCode::Enter => {
                self.state.submit_compose();
            }
            KeyCode::Backspace => {
                if let Some(conv) = self.state.conversation.as_mut() {
                    conv.input.pop();
                }
            }
            KeyCode::Char(c) => {
                if let Some(conv) = self.state.conversation.as_mut() {
                    conv.input.push(c);
                }
            }
            _ => {}
        }
    }

    /// Handle key in help mode
    fn handle_help_key(&mut self, key: KeyEvent) {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q') | KeyCode::F(1)) {
            self.state.interaction_mode = InteractionMode::Normal;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::User;
    use crate::session::Session;
    use crate::tui::state::Delivery;
    use chrono::Utc;

    fn press(app: &mut App, code: KeyCode) -> bool {
        app.handle_key(KeyEvent::from(code))
    }

    fn type_str(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    fn signed_in_app() -> App {
        let mut app = App::new();
        app.state_mut().sign_in(Session {
            user: User {
                id: 1,
                phone: "+1".to_string(),
                name: "Me".to_string(),
                avatar: "👤".to_string(),
            },
            token: "t".to_string(),
            signed_in_at: Utc::now(),
        });
        app.state_mut().take_requests();
        app
    }

    #[test]
    fn test_app_new() {
        let app = App::new();
        assert_eq!(app.state().current_tab, Tab::Chats);
        assert_eq!(app.state().current_view, View::Tabs);
        assert!(matches!(app.state().interaction_mode, InteractionMode::Normal));
    }

    #[test]
    fn test_app_quit_keys() {
        let mut app = App::new();
        assert!(app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)));

        let mut app = App::new();
        assert!(press(&mut app, KeyCode::Char('q')));
    }

    #[test]
    fn test_app_help_toggle() {
        let mut app = App::new();
        press(&mut app, KeyCode::Char('?'));
        assert!(matches!(app.state().interaction_mode, InteractionMode::Help));
        press(&mut app, KeyCode::Char('?'));
        assert!(matches!(app.state().interaction_mode, InteractionMode::Normal));
    }

    #[test]
    fn test_tab_navigation() {
        let mut app = App::new();
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.state().current_tab, Tab::Statuses);
        press(&mut app, KeyCode::BackTab);
        press(&mut app, KeyCode::BackTab);
        assert_eq!(app.state().current_tab, Tab::Contacts);
        press(&mut app, KeyCode::Char('4'));
        assert_eq!(app.state().current_tab, Tab::Calls);
    }

    #[test]
    fn test_list_navigation() {
        let mut app = App::new();
        press(&mut app, KeyCode::Char('j'));
        press(&mut app, KeyCode::Char('j'));
        assert_eq!(app.state().selected_index(), 2);
        press(&mut app, KeyCode::Char('G'));
        assert_eq!(app.state().selected_index(), 3);
        press(&mut app, KeyCode::Char('j'));
        assert_eq!(app.state().selected_index(), 3);
        press(&mut app, KeyCode::Char('g'));
        assert_eq!(app.state().selected_index(), 0);
    }

    #[test]
    fn test_filter_mode() {
        let mut app = App::new();
        press(&mut app, KeyCode::Char('/'));
        assert!(matches!(app.state().interaction_mode, InteractionMode::Filter));

        type_str(&mut app, "mom");
        assert_eq!(app.state().filter_text, "mom");
        assert_eq!(app.state().filtered_chats().len(), 1);

        // q is text while filtering
        press(&mut app, KeyCode::Char('q'));
        assert!(!app.state().should_quit);
        press(&mut app, KeyCode::Backspace);

        press(&mut app, KeyCode::Enter);
        assert!(matches!(app.state().interaction_mode, InteractionMode::Normal));
        assert_eq!(app.state().filter_text, "mom");

        press(&mut app, KeyCode::Esc);
        assert_eq!(app.state().filter_text, "");
    }

    #[test]
    fn test_filter_only_on_chats() {
        let mut app = App::new();
        press(&mut app, KeyCode::Char('3'));
        press(&mut app, KeyCode::Char('/'));
        assert!(matches!(app.state().interaction_mode, InteractionMode::Normal));
    }

    #[tokio::test]
    async fn test_viewer_swallows_keys() {
        let mut app = App::new();
        press(&mut app, KeyCode::Char('2'));
        press(&mut app, KeyCode::Char('j'));
        press(&mut app, KeyCode::Enter);
        assert!(app.state().viewer.is_open());

        // Navigation is ignored while the overlay is up
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.state().current_tab, Tab::Statuses);
        assert!(!press(&mut app, KeyCode::Char('j')));

        press(&mut app, KeyCode::Esc);
        assert!(!app.state().viewer.is_open());
        assert_eq!(app.state().viewer.controller().progress_percent(), 0.0);
    }

    #[tokio::test]
    async fn test_enter_on_empty_status_is_inert() {
        let mut app = App::new();
        press(&mut app, KeyCode::Char('2'));
        press(&mut app, KeyCode::Enter);
        assert!(!app.state().viewer.is_open());
        assert!(app.state().error_message.is_none());
    }

    #[test]
    fn test_conversation_compose_and_send() {
        let mut app = signed_in_app();
        press(&mut app, KeyCode::Char('j'));
        press(&mut app, KeyCode::Enter);
        assert_eq!(
            app.state().current_view,
            View::Conversation {
                chat_id: 2,
                title: "Work group".to_string()
            }
        );
        assert_eq!(app.state_mut().take_requests(), vec![PendingRequest::LoadMessages { chat_id: 2 }]);

        press(&mut app, KeyCode::Char('i'));
        assert!(matches!(app.state().interaction_mode, InteractionMode::Compose));
        type_str(&mut app, "on my way");
        press(&mut app, KeyCode::Enter);

        let conv = app.state().conversation.as_ref().unwrap();
        assert_eq!(conv.messages.len(), 1);
        assert_eq!(conv.messages[0].delivery, Delivery::Pending);
        assert!(matches!(
            app.state_mut().take_requests().as_slice(),
            [PendingRequest::SendMessage { chat_id: 2, .. }]
        ));

        press(&mut app, KeyCode::Esc);
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.state().current_view, View::Tabs);
        assert!(app.state().conversation.is_none());
    }

    #[test]
    fn test_refresh_only_when_remote() {
        let mut app = App::new();
        press(&mut app, KeyCode::Char('r'));
        assert!(app.state_mut().take_requests().is_empty());

        let mut app = signed_in_app();
        press(&mut app, KeyCode::Char('r'));
        assert_eq!(app.state_mut().take_requests(), vec![PendingRequest::RefreshChats]);
    }
}
