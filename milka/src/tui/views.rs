//! TUI views and rendering
//!
//! All rendering logic is contained here. The views module draws the UI
//! from AppState but never modifies it.

use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Margin, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, LineGauge, List, ListItem, ListState, Paragraph, Wrap};
use tracing::trace;

use super::state::{AppState, Connection, ConversationMessage, Delivery, InteractionMode, Tab, View};
use crate::domain::CallKind;

mod colors {
    use ratatui::style::Color;

    pub const HEADER: Color = Color::Rgb(0, 255, 255); // Cyan
    pub const KEYBIND: Color = Color::Rgb(0, 255, 255); // Cyan
    pub const ACCENT: Color = Color::Rgb(0, 255, 127); // Spring green
    pub const UNREAD: Color = Color::Rgb(0, 255, 127);
    pub const MISSED: Color = Color::Rgb(220, 20, 60); // Crimson
    pub const PENDING: Color = Color::Rgb(255, 215, 0); // Gold
    pub const SELECTED_BG: Color = Color::Rgb(40, 40, 40);
    pub const DIM: Color = Color::DarkGray;
}

/// Main render function
pub fn render(state: &AppState, frame: &mut Frame) {
    trace!(?state.current_view, "render: called");
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Main content
            Constraint::Length(3), // Footer
        ])
        .split(frame.area());

    render_header(state, frame, chunks[0]);

    match &state.current_view {
        View::Tabs => match state.current_tab {
            Tab::Chats => render_chats(state, frame, chunks[1]),
            Tab::Statuses => render_statuses(state, frame, chunks[1]),
            Tab::Channels => render_channels(state, frame, chunks[1]),
            Tab::Calls => render_calls(state, frame, chunks[1]),
            Tab::Contacts => render_contacts(state, frame, chunks[1]),
        },
        View::Conversation { title, .. } => render_conversation(state, title, frame, chunks[1]),
    }

    render_footer(state, frame, chunks[2]);

    // Overlays
    if state.viewer.is_open() {
        render_story_overlay(state, frame, frame.area());
    } else if state.interaction_mode == InteractionMode::Help {
        render_help_overlay(frame, frame.area());
    }
}

/// Header with connection indicator and tab strip
fn render_header(state: &AppState, frame: &mut Frame, area: Rect) {
    trace!("render_header: called");
    let (indicator_color, who) = match (state.connection, &state.session) {
        (Connection::Local, _) => (colors::DIM, "local".to_string()),
        (Connection::Connecting, Some(s)) => (colors::PENDING, s.user.name.clone()),
        (Connection::Online, Some(s)) => (Color::Green, s.user.name.clone()),
        (Connection::Offline, Some(s)) => (colors::MISSED, s.user.name.clone()),
        (_, None) => (colors::DIM, "signed out".to_string()),
    };

    let mut spans = vec![
        Span::raw(" "),
        Span::styled("●", Style::default().fg(indicator_color)),
        Span::styled(" Milka", Style::default().fg(colors::HEADER).add_modifier(Modifier::BOLD)),
        Span::raw(" │ "),
    ];

    for (i, tab) in Tab::ALL.iter().enumerate() {
        let mut label = format!("{} {}", i + 1, tab.title());
        if *tab == Tab::Chats {
            let unread = state.directory.total_unread();
            if unread > 0 {
                label.push_str(&format!(" ({})", unread));
            }
        }
        let style = if *tab == state.current_tab {
            Style::default().fg(colors::ACCENT).add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(colors::DIM)
        };
        spans.push(Span::styled(label, style));
        spans.push(Span::raw("  "));
    }

    let block = Block::default().borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let right = Line::from(Span::styled(format!("{} ", who), Style::default().fg(colors::DIM)));
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(0), Constraint::Length(right.width() as u16)])
        .split(inner);
    frame.render_widget(Paragraph::new(Line::from(spans)), chunks[0]);
    frame.render_widget(Paragraph::new(right), chunks[1]);
}

/// Render a selectable list with the standard highlight
fn render_list(state: &AppState, items: Vec<ListItem>, title: String, frame: &mut Frame, area: Rect) {
    let mut list_state = ListState::default().with_selected(Some(state.selected_index()));
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(Style::default().bg(colors::SELECTED_BG).add_modifier(Modifier::BOLD))
        .highlight_symbol("▌");
    frame.render_stateful_widget(list, area, &mut list_state);
}

fn render_chats(state: &AppState, frame: &mut Frame, area: Rect) {
    trace!("render_chats: called");
    let chats = state.filtered_chats();
    let title = if state.filter_text.is_empty() {
        format!(" Chats [{}] ", chats.len())
    } else {
        format!(" Chats [{}] /{} ", chats.len(), state.filter_text)
    };

    if chats.is_empty() {
        frame.render_widget(Block::default().borders(Borders::ALL).title(title), area);
        let message = if state.filter_text.is_empty() {
            "No chats yet"
        } else {
            "No chats match the search"
        };
        render_empty_message(frame, area, message);
        return;
    }

    let items = chats
        .iter()
        .map(|chat| {
            let mut top = vec![
                Span::raw(format!("{} ", chat.avatar)),
                Span::styled(chat.name.clone(), Style::default().add_modifier(Modifier::BOLD)),
                Span::styled(format!("  {}", chat.time), Style::default().fg(colors::DIM)),
            ];
            if chat.unread > 0 {
                top.push(Span::styled(
                    format!("  ● {}", chat.unread),
                    Style::default().fg(colors::UNREAD).add_modifier(Modifier::BOLD),
                ));
            }
            ListItem::new(vec![
                Line::from(top),
                Line::from(Span::styled(
                    format!("   {}", chat.last_message),
                    Style::default().fg(colors::DIM),
                )),
            ])
        })
        .collect();
    render_list(state, items, title, frame, area);
}

fn render_statuses(state: &AppState, frame: &mut Frame, area: Rect) {
    trace!("render_statuses: called");
    let items = state
        .directory
        .statuses
        .iter()
        .map(|group| {
            let ring = if group.is_playable() {
                Span::styled("◉ ", Style::default().fg(colors::ACCENT))
            } else {
                Span::styled("○ ", Style::default().fg(colors::DIM))
            };
            let count = if group.is_playable() {
                format!("  {} update(s)", group.len())
            } else {
                String::new()
            };
            ListItem::new(vec![
                Line::from(vec![
                    ring,
                    Span::raw(format!("{} ", group.owner_avatar)),
                    Span::styled(group.owner_name.clone(), Style::default().add_modifier(Modifier::BOLD)),
                    Span::styled(count, Style::default().fg(colors::DIM)),
                ]),
                Line::from(Span::styled(
                    format!("   {}", group.last_updated),
                    Style::default().fg(colors::DIM),
                )),
            ])
        })
        .collect();
    let title = format!(" Statuses [{}] ", state.directory.statuses.len());
    render_list(state, items, title, frame, area);
}

fn render_channels(state: &AppState, frame: &mut Frame, area: Rect) {
    trace!("render_channels: called");
    let items = state
        .directory
        .channels
        .iter()
        .map(|channel| {
            ListItem::new(vec![
                Line::from(vec![
                    Span::raw(format!("{} ", channel.avatar)),
                    Span::styled(channel.name.clone(), Style::default().add_modifier(Modifier::BOLD)),
                ]),
                Line::from(Span::styled(
                    format!("   {} subscribers · {}", channel.subscribers, channel.last_post),
                    Style::default().fg(colors::DIM),
                )),
            ])
        })
        .collect();
    let title = format!(" Channels [{}] ", state.directory.channels.len());
    render_list(state, items, title, frame, area);
}

fn render_calls(state: &AppState, frame: &mut Frame, area: Rect) {
    trace!("render_calls: called");
    let items = state
        .directory
        .calls
        .iter()
        .map(|call| {
            let kind_color = match call.kind {
                CallKind::Missed => colors::MISSED,
                _ => colors::ACCENT,
            };
            let mut detail = format!("   {} · {}", call.kind.label(), call.time);
            if let Some(duration) = &call.duration {
                detail.push_str(&format!(" · {}", duration));
            }
            ListItem::new(vec![
                Line::from(vec![
                    Span::raw(format!("{} ", call.avatar)),
                    Span::styled(call.name.clone(), Style::default().add_modifier(Modifier::BOLD)),
                    Span::styled(format!("  {}", call.kind.icon()), Style::default().fg(kind_color)),
                ]),
                Line::from(Span::styled(detail, Style::default().fg(colors::DIM))),
            ])
        })
        .collect();
    let title = format!(" Calls [{}] ", state.directory.calls.len());
    render_list(state, items, title, frame, area);
}

fn render_contacts(state: &AppState, frame: &mut Frame, area: Rect) {
    trace!("render_contacts: called");
    let items = state
        .directory
        .contacts
        .iter()
        .map(|contact| {
            let presence = if contact.online {
                Span::styled("  online", Style::default().fg(colors::ACCENT))
            } else {
                Span::raw("")
            };
            ListItem::new(vec![
                Line::from(vec![
                    Span::raw(format!("{} ", contact.avatar)),
                    Span::styled(contact.name.clone(), Style::default().add_modifier(Modifier::BOLD)),
                    presence,
                ]),
                Line::from(Span::styled(
                    format!("   {}", contact.phone),
                    Style::default().fg(colors::DIM),
                )),
            ])
        })
        .collect();
    let title = format!(" Contacts [{}] ", state.directory.contacts.len());
    render_list(state, items, title, frame, area);
}

fn message_line(message: &ConversationMessage) -> Line<'static> {
    let (marker, marker_color) = match (message.outgoing, message.delivery) {
        (false, _) => ("", colors::DIM),
        (true, Delivery::Pending) => (" …", colors::PENDING),
        (true, Delivery::Sent) => (" ✓", colors::ACCENT),
        (true, Delivery::Failed) => (" ✗ not sent", colors::MISSED),
    };
    let name_color = if message.outgoing { colors::ACCENT } else { colors::HEADER };
    Line::from(vec![
        Span::styled(format!("[{}] ", message.time), Style::default().fg(colors::DIM)),
        Span::styled(
            format!("{}: ", message.sender_name),
            Style::default().fg(name_color).add_modifier(Modifier::BOLD),
        ),
        Span::raw(message.content.clone()),
        Span::styled(marker, Style::default().fg(marker_color)),
    ])
}

fn render_conversation(state: &AppState, title: &str, frame: &mut Frame, area: Rect) {
    trace!(%title, "render_conversation: called");
    let composing = state.interaction_mode == InteractionMode::Compose;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(if composing { 3 } else { 0 })])
        .split(area);

    let block = Block::default().borders(Borders::ALL).title(format!(" {} ", title));
    let Some(conv) = &state.conversation else {
        frame.render_widget(block, chunks[0]);
        return;
    };

    if conv.messages.is_empty() {
        frame.render_widget(block, chunks[0]);
        let message = if conv.loading { "Loading messages..." } else { "No messages yet" };
        render_empty_message(frame, chunks[0], message);
    } else {
        // Newest at the bottom, scrolled up by `scroll` messages
        let visible = chunks[0].height.saturating_sub(2) as usize;
        let end = conv.messages.len().saturating_sub(conv.scroll);
        let start = end.saturating_sub(visible);
        let lines: Vec<Line> = conv.messages[start..end].iter().map(message_line).collect();
        frame.render_widget(Paragraph::new(lines).block(block), chunks[0]);
    }

    if composing {
        let input = Paragraph::new(Line::from(vec![
            Span::raw(conv.input.clone()),
            Span::styled("_", Style::default().add_modifier(Modifier::SLOW_BLINK)),
        ]))
        .block(Block::default().borders(Borders::ALL).title(" Message "));
        frame.render_widget(input, chunks[1]);
    }
}

/// Full-screen story viewer with one progress segment per item
fn render_story_overlay(state: &AppState, frame: &mut Frame, area: Rect) {
    trace!("render_story_overlay: called");
    let controller = state.viewer.controller();
    let Some(group) = controller.active_group() else {
        return;
    };

    let popup_area = centered_rect(70, 80, area);
    frame.render_widget(Clear, popup_area);
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Status (Esc to close) ")
        .style(Style::default().bg(Color::Black));
    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Segments
            Constraint::Length(2), // Owner
            Constraint::Min(0),    // Item
        ])
        .split(inner.inner(Margin {
            horizontal: 1,
            vertical: 0,
        }));

    let fills = controller.segment_fills();
    let segments = Layout::horizontal(vec![Constraint::Ratio(1, fills.len().max(1) as u32); fills.len()])
        .spacing(1)
        .split(rows[0]);
    for (fill, segment) in fills.iter().zip(segments.iter()) {
        let gauge = LineGauge::default()
            .filled_style(Style::default().fg(Color::White))
            .unfilled_style(Style::default().fg(colors::DIM))
            .ratio(*fill)
            .label("");
        frame.render_widget(gauge, *segment);
    }

    let item = controller.current_item();
    let posted = item.map(|i| i.posted_at.clone()).unwrap_or_default();
    let owner = Paragraph::new(Line::from(vec![
        Span::raw(format!("{} ", group.owner_avatar)),
        Span::styled(group.owner_name.clone(), Style::default().add_modifier(Modifier::BOLD)),
        Span::styled(format!("  {}", posted), Style::default().fg(colors::DIM)),
    ]));
    frame.render_widget(owner, rows[1]);

    let position = controller
        .current_item_index()
        .map(|i| format!("{} / {}", i + 1, group.len()))
        .unwrap_or_default();
    let body = vec![
        Line::from(""),
        Line::from(Span::styled("🖼", Style::default().add_modifier(Modifier::BOLD))),
        Line::from(""),
        Line::from(item.map(|i| i.image.clone()).unwrap_or_default()),
        Line::from(""),
        Line::from(Span::styled(position, Style::default().fg(colors::DIM))),
    ];
    frame.render_widget(
        Paragraph::new(body).alignment(Alignment::Center).wrap(Wrap { trim: true }),
        rows[2],
    );
}

fn render_footer(state: &AppState, frame: &mut Frame, area: Rect) {
    trace!(?state.interaction_mode, "render_footer: called");
    let content = if state.interaction_mode == InteractionMode::Filter {
        Line::from(vec![
            Span::styled("/", Style::default().fg(colors::KEYBIND)),
            Span::raw(state.filter_text.clone()),
            Span::styled("_", Style::default().add_modifier(Modifier::SLOW_BLINK)),
            Span::styled("  (Enter to keep, Esc to clear)", Style::default().fg(colors::DIM)),
        ])
    } else if let Some(error) = &state.error_message {
        Line::from(Span::styled(format!(" {}", error), Style::default().fg(colors::MISSED)))
    } else {
        let keybinds: Vec<(&str, &str)> = if state.viewer.is_open() {
            vec![("[Esc]", "Close")]
        } else {
            match (&state.current_view, &state.interaction_mode) {
                (View::Conversation { .. }, InteractionMode::Compose) => {
                    vec![("[Enter]", "Send"), ("[Esc]", "Stop typing")]
                }
                (View::Conversation { .. }, _) => {
                    vec![("[i]", "Write"), ("[j/k]", "Scroll"), ("[r]", "Reload"), ("[Esc]", "Back")]
                }
                (View::Tabs, _) => match state.current_tab {
                    Tab::Chats => vec![("[Enter]", "Open"), ("[/]", "Search"), ("[r]", "Refresh")],
                    Tab::Statuses => vec![("[Enter]", "View")],
                    _ => vec![("[j/k]", "Move")],
                },
            }
        };

        let mut spans = vec![Span::raw(" ")];
        for (key, action) in keybinds {
            spans.push(Span::styled(
                key,
                Style::default().fg(colors::KEYBIND).add_modifier(Modifier::BOLD),
            ));
            spans.push(Span::raw(format!(" {} ", action)));
        }
        spans.push(Span::styled(
            "[Tab]",
            Style::default().fg(colors::KEYBIND).add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::raw(" Tabs "));
        spans.push(Span::styled("[?]", Style::default().fg(colors::KEYBIND).add_modifier(Modifier::BOLD)));
        spans.push(Span::raw(" Help "));
        spans.push(Span::styled("[q]", Style::default().fg(colors::KEYBIND).add_modifier(Modifier::BOLD)));
        spans.push(Span::raw(" Quit"));
        Line::from(spans)
    };

    let footer = Paragraph::new(content).block(Block::default().borders(Borders::ALL));
    frame.render_widget(footer, area);
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    trace!("render_help_overlay: called");
    let popup_area = centered_rect(60, 70, area);
    frame.render_widget(Clear, popup_area);

    let section = |title: &'static str| {
        Line::from(Span::styled(title, Style::default().add_modifier(Modifier::BOLD)))
    };
    let help_text = vec![
        Line::from(Span::styled(
            "Keyboard Shortcuts",
            Style::default()
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
                .fg(colors::HEADER),
        )),
        Line::from(""),
        section("Global"),
        key_line("Tab/→", "Next tab"),
        key_line("S-Tab/←", "Previous tab"),
        key_line("1-5", "Jump to tab"),
        key_line("?", "Toggle help"),
        key_line("q", "Quit"),
        Line::from(""),
        section("Lists"),
        key_line("j/↓", "Move down"),
        key_line("k/↑", "Move up"),
        key_line("g/G", "Top / bottom"),
        key_line("Enter", "Open chat or play status"),
        key_line("/", "Search chats"),
        key_line("r", "Refresh chats (signed in)"),
        Line::from(""),
        section("Conversation"),
        key_line("i", "Write a message"),
        key_line("Enter", "Send"),
        key_line("Esc", "Back"),
        Line::from(""),
        section("Status viewer"),
        key_line("Esc", "Close"),
    ];

    let help = Paragraph::new(help_text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Help (? to close) ")
                .style(Style::default().bg(Color::Black)),
        )
        .wrap(Wrap { trim: true });

    frame.render_widget(help, popup_area);
}

/// Helper to create a key binding line
fn key_line<'a>(key: &'a str, desc: &'a str) -> Line<'a> {
    Line::from(vec![
        Span::raw("  "),
        Span::styled(format!("{:<12}", key), Style::default().fg(colors::KEYBIND)),
        Span::raw(desc),
    ])
}

fn render_empty_message(frame: &mut Frame, area: Rect, message: &str) {
    let inner = area.inner(Margin {
        horizontal: 2,
        vertical: 2,
    });
    let empty = Paragraph::new(message.to_string())
        .style(Style::default().fg(colors::DIM))
        .alignment(Alignment::Center);
    frame.render_widget(empty, inner);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn draw(state: &AppState) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|frame| render(state, frame)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_chats_tab_renders_sample() {
        let screen = draw(&AppState::new());
        assert!(screen.contains("Milka"));
        assert!(screen.contains("Anna Petrova"));
        assert!(screen.contains("Chats (7)"));
        assert!(screen.contains("local"));
    }

    #[test]
    fn test_empty_search_message() {
        let mut state = AppState::new();
        state.filter_text = "zzz".to_string();
        assert!(draw(&state).contains("No chats match the search"));
    }

    #[test]
    fn test_calls_tab() {
        let mut state = AppState::new();
        state.switch_tab(Tab::Calls);
        assert!(draw(&state).contains("Calls [3]"));
    }

    #[tokio::test]
    async fn test_story_overlay_renders() {
        let mut state = AppState::new();
        state.switch_tab(Tab::Statuses);
        state.current_selection_mut().select_next(5);
        assert!(state.open_selected_status());

        let screen = draw(&state);
        assert!(screen.contains("Esc to close"));
        assert!(screen.contains("1 / 2"));
    }
}
