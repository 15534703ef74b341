//! Milka - terminal messenger
//!
//! CLI entry point: the TUI by default, plus scriptable subcommands.

use std::fs;
use std::io::Write;
use std::sync::Arc;

use clap::{CommandFactory, FromArgMatches};
use colored::*;
use eyre::{Context, Result, eyre};
use tracing::{debug, info};

use milka::api::{
    AuthRequest, CreateChatRequest, HttpMessengerApi, MessengerApi, SendMessageRequest, format_time_label,
    parse_timestamp,
};
use milka::cli::{Cli, Command, OutputFormat, generate_after_help, get_log_path};
use milka::config::Config;
use milka::domain::{Chat, Directory, StoryGroup};
use milka::session::{Session, SessionStore};
use milka::story::{StoryViewer, ViewerEvent};
use milka::tui::{self, AppState};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Logging isn't initialized yet, so nothing here can be traced
    let log_path = get_log_path();
    if let Some(log_dir) = log_path.parent() {
        fs::create_dir_all(log_dir).context("Failed to create log directory")?;
    }

    // Priority: CLI --log-level > config file > INFO
    let level = match cli_log_level.or(config_log_level).map(str::to_uppercase).as_deref() {
        Some("TRACE") => tracing::Level::TRACE,
        Some("DEBUG") => tracing::Level::DEBUG,
        Some("INFO") | None => tracing::Level::INFO,
        Some("WARN") | Some("WARNING") => tracing::Level::WARN,
        Some("ERROR") => tracing::Level::ERROR,
        Some(other) => {
            eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", other);
            tracing::Level::INFO
        }
    };

    let log_file = fs::File::create(&log_path).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cmd = Cli::command().after_help(generate_after_help());
    let cli = Cli::from_arg_matches(&cmd.get_matches())?;

    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    let store = SessionStore::from_config(&config.data);

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        None => cmd_tui(&config, &store).await,
        Some(Command::Statuses { format }) => cmd_statuses(&config, format),
        Some(Command::Play { group_id }) => cmd_play(&config, group_id).await,
        Some(Command::Register { phone, name, avatar }) => {
            let request = AuthRequest::register(&phone, &name, avatar.as_deref())?;
            cmd_auth(&config, &store, request).await
        }
        Some(Command::Login { phone }) => cmd_auth(&config, &store, AuthRequest::login(&phone)?).await,
        Some(Command::Logout) => cmd_logout(&store),
        Some(Command::Whoami) => cmd_whoami(&store),
        Some(Command::Chats { search, format }) => cmd_chats(&config, &store, search.as_deref(), format).await,
        Some(Command::Messages { chat_id, format }) => cmd_messages(&config, &store, chat_id, format).await,
        Some(Command::Send { chat_id, content }) => cmd_send(&config, &store, chat_id, &content).await,
        Some(Command::NewChat { with, name, avatar }) => {
            let request = match (with, name) {
                (Some(user_id), _) => CreateChatRequest::private(user_id),
                (None, Some(name)) => CreateChatRequest::group(&name, avatar.as_deref()),
                (None, None) => return Err(eyre!("Either --with or --name is required")),
            };
            cmd_new_chat(&config, &store, request).await
        }
    }
}

fn load_directory(config: &Config) -> Result<Directory> {
    Directory::load_or_sample(config.data.directory_file.as_deref())
}

/// Backend client, with the session token when signed in
fn backend(config: &Config, session: Option<&Session>) -> Result<HttpMessengerApi> {
    let api = HttpMessengerApi::from_config(&config.backend)
        .context("Backend unavailable (set backend.base-url in milka.yml)")?;
    Ok(match session {
        Some(s) => api.with_session_token(s.token.clone()),
        None => api,
    })
}

fn require_session(store: &SessionStore) -> Result<Session> {
    store
        .load()?
        .ok_or_else(|| eyre!("Not signed in. Run `milka login --phone <PHONE>` first"))
}

async fn cmd_tui(config: &Config, store: &SessionStore) -> Result<()> {
    debug!("cmd_tui: called");
    let directory = load_directory(config)?;
    let mut state = AppState::with_directory(directory, StoryViewer::from_config(&config.playback));

    let mut api: Option<Arc<dyn MessengerApi>> = None;
    if config.backend.is_configured() {
        if let Some(session) = store.load()? {
            api = Some(Arc::new(backend(config, Some(&session))?));
            state.sign_in(session);
        }
    }

    tui::run(state, api).await
}

fn cmd_statuses(config: &Config, format: OutputFormat) -> Result<()> {
    let directory = load_directory(config)?;
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&directory.statuses)?);
        return Ok(());
    }

    for group in &directory.statuses {
        let updates = if group.is_playable() {
            format!("{} update(s)", group.len()).green()
        } else {
            "nothing posted".dimmed()
        };
        println!(
            "{:>3}  {} {:<16} {:<20} {}",
            group.id.to_string().cyan(),
            group.owner_avatar,
            group.owner_name.bold(),
            group.last_updated.dimmed(),
            updates
        );
    }
    Ok(())
}

fn progress_bar(viewer: &StoryViewer, width: usize) -> String {
    let fills = viewer.controller().segment_fills();
    let per = (width / fills.len().max(1)).max(1);
    fills
        .iter()
        .map(|fill| {
            let filled = (fill * per as f64).round() as usize;
            format!("{}{}", "━".repeat(filled), "─".repeat(per - filled.min(per)))
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn print_frame(group: &StoryGroup, viewer: &StoryViewer) {
    let controller = viewer.controller();
    let index = controller.current_item_index().unwrap_or(0);
    let image = controller.current_item().map(|i| i.image.as_str()).unwrap_or("");
    println!(
        "{}  {:>5.1}%  {}/{}  {}",
        progress_bar(viewer, 40),
        controller.progress_percent(),
        index + 1,
        group.len(),
        image.dimmed()
    );
}

async fn cmd_play(config: &Config, group_id: u64) -> Result<()> {
    debug!(group_id, "cmd_play: called");
    let directory = load_directory(config)?;
    let group = directory
        .status(group_id)
        .cloned()
        .ok_or_else(|| eyre!("No status group with id {}", group_id))?;

    let mut viewer = StoryViewer::from_config(&config.playback);
    if !viewer.open(group.clone()) {
        println!("{} has not posted anything", group.owner_name);
        return Ok(());
    }

    println!("{} {}", group.owner_avatar, group.owner_name.bold());
    print_frame(&group, &viewer);
    while let Some(signal) = viewer.next_signal().await {
        match viewer.handle(signal) {
            ViewerEvent::Advanced | ViewerEvent::Finishing => print_frame(&group, &viewer),
            ViewerEvent::Closed => break,
            ViewerEvent::Ignored => {}
        }
        std::io::stdout().flush()?;
    }
    println!("{} done", "✓".green());
    Ok(())
}

async fn cmd_auth(config: &Config, store: &SessionStore, request: AuthRequest) -> Result<()> {
    let api = backend(config, None)?;
    let response = match request {
        AuthRequest::Register { .. } => api.register(request).await?,
        AuthRequest::Login { .. } => api.login(request).await?,
    };
    let session = Session::from_auth(&response);
    store.save(&session)?;

    let verb = if response.created { "Registered" } else { "Signed in" };
    println!(
        "{} {} as {} {} (id {})",
        "✓".green(),
        verb,
        session.user.avatar,
        session.user.name.bold(),
        session.user.id.to_string().cyan()
    );
    Ok(())
}

fn cmd_logout(store: &SessionStore) -> Result<()> {
    if store.clear()? {
        println!("{} Signed out", "✓".green());
    } else {
        println!("Not signed in");
    }
    Ok(())
}

fn cmd_whoami(store: &SessionStore) -> Result<()> {
    match store.load()? {
        Some(session) => println!(
            "{} {} ({}) id {} since {}",
            session.user.avatar,
            session.user.name.bold(),
            session.user.phone,
            session.user.id.to_string().cyan(),
            session.signed_in_at.format("%Y-%m-%d %H:%M").to_string().dimmed()
        ),
        None => println!("Not signed in"),
    }
    Ok(())
}

fn print_chats(chats: &[&Chat], format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(chats)?);
        return Ok(());
    }
    if chats.is_empty() {
        println!("No chats");
    }
    for chat in chats {
        let unread = if chat.unread > 0 {
            format!("({})", chat.unread).green().bold()
        } else {
            "".normal()
        };
        println!(
            "{:>4}  {} {:<20} {:>9} {}  {}",
            chat.id.to_string().cyan(),
            chat.avatar,
            chat.name.bold(),
            chat.time.dimmed(),
            unread,
            chat.last_message
        );
    }
    Ok(())
}

async fn cmd_chats(config: &Config, store: &SessionStore, search: Option<&str>, format: OutputFormat) -> Result<()> {
    let query = search.unwrap_or("");
    let session = if config.backend.is_configured() { store.load()? } else { None };

    let Some(session) = session else {
        let directory = load_directory(config)?;
        return print_chats(&directory.search_chats(query), format);
    };

    let api = backend(config, Some(&session))?;
    let now = chrono::Local::now().naive_local();
    let chats: Vec<Chat> = api
        .list_chats(session.user.id)
        .await?
        .iter()
        .map(|summary| summary.to_chat(now))
        .collect();
    let matching: Vec<&Chat> = chats.iter().filter(|c| c.matches(query)).collect();
    print_chats(&matching, format)
}

async fn cmd_messages(config: &Config, store: &SessionStore, chat_id: u64, format: OutputFormat) -> Result<()> {
    let session = require_session(store)?;
    let api = backend(config, Some(&session))?;
    let messages = api.list_messages(session.user.id, chat_id).await?;

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&messages)?);
        return Ok(());
    }
    if messages.is_empty() {
        println!("No messages yet");
    }
    let now = chrono::Local::now().naive_local();
    for message in &messages {
        let time = parse_timestamp(&message.created_at)
            .map(|ts| format_time_label(ts, now))
            .unwrap_or_default();
        let sender = if message.sender_id == session.user.id {
            "me".green().bold()
        } else {
            message
                .sender_name
                .clone()
                .unwrap_or_else(|| format!("User #{}", message.sender_id))
                .cyan()
                .bold()
        };
        println!("{:>9}  {}: {}", time.dimmed(), sender, message.content);
    }
    Ok(())
}

async fn cmd_send(config: &Config, store: &SessionStore, chat_id: u64, content: &str) -> Result<()> {
    let session = require_session(store)?;
    let request = SendMessageRequest::text(chat_id, content)?;
    let api = backend(config, Some(&session))?;
    let response = api.send_message(session.user.id, request).await?;
    println!("{} Sent (message {})", "✓".green(), response.id.to_string().cyan());
    Ok(())
}

async fn cmd_new_chat(config: &Config, store: &SessionStore, request: CreateChatRequest) -> Result<()> {
    let session = require_session(store)?;
    let api = backend(config, Some(&session))?;
    let response = api.create_chat(session.user.id, request).await?;
    println!(
        "{} {} (chat {})",
        "✓".green(),
        response.message,
        response.chat_id.to_string().cyan()
    );
    Ok(())
}
