//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

/// Milka - terminal messenger with auto-playing statuses
#[derive(Parser)]
#[command(
    name = "milka",
    about = "Terminal messenger: chats, statuses, channels, calls and contacts",
    version
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute; the TUI starts when omitted
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// List status groups
    Statuses {
        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Play a status group in the terminal, printing each frame
    Play {
        /// Status group id (see `milka statuses`)
        group_id: u64,
    },

    /// Register a phone number with the backend
    Register {
        #[arg(short, long)]
        phone: String,

        #[arg(short, long)]
        name: String,

        /// Emoji avatar
        #[arg(short, long)]
        avatar: Option<String>,
    },

    /// Sign in with a registered phone number
    Login {
        #[arg(short, long)]
        phone: String,
    },

    /// Forget the saved session
    Logout,

    /// Show the signed-in user
    Whoami,

    /// List chats (backend when signed in, otherwise local data)
    Chats {
        /// Only chats whose name or last message contains this text
        #[arg(short, long)]
        search: Option<String>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Show the messages of a chat
    Messages {
        chat_id: u64,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Send a text message
    Send {
        chat_id: u64,

        /// Message text
        content: String,
    },

    /// Create a private chat or a group
    NewChat {
        /// Other user's id, for a private chat
        #[arg(short = 'w', long = "with", value_name = "USER_ID", conflicts_with = "name")]
        with: Option<u64>,

        /// Group name, for a group chat
        #[arg(short, long, required_unless_present = "with")]
        name: Option<String>,

        /// Group avatar
        #[arg(short, long, requires = "name")]
        avatar: Option<String>,
    },
}

/// Get the log file path
pub fn get_log_path() -> PathBuf {
    debug!("get_log_path: called");
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("milka")
        .join("logs")
        .join("milka.log")
}

/// Generate the after_help text
pub fn generate_after_help() -> String {
    debug!("generate_after_help: called");
    let mut help = String::new();
    help.push_str("Run without a command to open the terminal UI.\n\n");
    help.push_str(&format!("Logs are written to: {}\n", get_log_path().display()));
    help
}

/// Output format for list commands
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        debug!(%s, "OutputFormat::from_str: called");
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown format: {}. Use text or json", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_no_command() {
        let cli = Cli::parse_from(["milka"]);
        assert!(cli.command.is_none());
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_cli_parse_global_flags() {
        let cli = Cli::parse_from(["milka", "statuses", "-l", "debug", "--config", "/tmp/m.yml"]);
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/m.yml")));
        assert!(matches!(
            cli.command,
            Some(Command::Statuses {
                format: OutputFormat::Text
            })
        ));
    }

    #[test]
    fn test_cli_parse_play() {
        let cli = Cli::parse_from(["milka", "play", "2"]);
        assert!(matches!(cli.command, Some(Command::Play { group_id: 2 })));
    }

    #[test]
    fn test_cli_parse_register() {
        let cli = Cli::parse_from(["milka", "register", "--phone", "+7900", "--name", "Anna", "-a", "👩"]);
        match cli.command {
            Some(Command::Register { phone, name, avatar }) => {
                assert_eq!(phone, "+7900");
                assert_eq!(name, "Anna");
                assert_eq!(avatar.as_deref(), Some("👩"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_cli_parse_send() {
        let cli = Cli::parse_from(["milka", "send", "5", "hello there"]);
        match cli.command {
            Some(Command::Send { chat_id, content }) => {
                assert_eq!(chat_id, 5);
                assert_eq!(content, "hello there");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_cli_parse_chats_json() {
        let cli = Cli::parse_from(["milka", "chats", "--search", "work", "--format", "json"]);
        assert!(matches!(
            cli.command,
            Some(Command::Chats {
                search: Some(_),
                format: OutputFormat::Json
            })
        ));
    }

    #[test]
    fn test_cli_new_chat_requires_target() {
        assert!(Cli::try_parse_from(["milka", "new-chat"]).is_err());
        assert!(Cli::try_parse_from(["milka", "new-chat", "--with", "3", "--name", "x"]).is_err());

        let cli = Cli::parse_from(["milka", "new-chat", "--with", "3"]);
        assert!(matches!(
            cli.command,
            Some(Command::NewChat {
                with: Some(3),
                name: None,
                avatar: None
            })
        ));

        let cli = Cli::parse_from(["milka", "new-chat", "--name", "Team"]);
        assert!(matches!(cli.command, Some(Command::NewChat { name: Some(_), .. })));
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("plain".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert!("yaml".parse::<OutputFormat>().is_err());
    }
}
