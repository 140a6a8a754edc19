use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Sprout Todo - command line sync client
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Base URL of the Sprout todo service
    #[arg(
        long,
        env = "SPROUT_API_URL",
        default_value = "https://miniappsprouttodoapi.ru"
    )]
    pub api_url: String,

    /// Path to the session store database
    #[arg(long, env = "SPROUT_SESSION_FILE")]
    pub session_file: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "warn")]
    pub log_level: String,

    /// HTTP connect timeout in seconds
    #[arg(long, env = "HTTP_CONNECT_TIMEOUT", default_value = "10")]
    pub connect_timeout: u64,

    /// HTTP request timeout in seconds
    #[arg(long, env = "HTTP_REQUEST_TIMEOUT", default_value = "30")]
    pub request_timeout: u64,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Log in and load the task list
    Login {
        /// Identity to log in as
        identity: String,

        /// Secret; prompted for interactively when omitted
        #[arg(long)]
        secret: Option<String>,
    },

    /// Register a new identity (does not log in)
    Register {
        /// Identity to register
        identity: String,

        /// Secret; prompted for (with confirmation) when omitted
        #[arg(long)]
        secret: Option<String>,
    },

    /// Clear the stored session
    Logout,

    /// Show the task list
    List,

    /// Add a task
    Add {
        /// Task name
        name: String,
    },

    /// Mark a task as done
    Done {
        /// Task id
        id: String,
    },

    /// Mark a task as active again
    Undone {
        /// Task id
        id: String,
    },

    /// Delete a task
    Rm {
        /// Task id
        id: String,

        /// Skip the confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

#[derive(Clone, Debug)]
pub struct Config {
    // Remote service
    pub api_url: String,

    // Session persistence
    pub session_file: PathBuf,

    // HTTP client
    pub http_connect_timeout: u64,
    pub http_request_timeout: u64,

    // Logging
    pub log_level: String,
}

impl Config {
    /// Build configuration from parsed arguments with priority CLI > ENV > defaults
    pub fn from_args(args: &CliArgs) -> Result<Self> {
        let session_file = match &args.session_file {
            Some(path) => expand_tilde(path),
            None => default_session_file()
                .context("Could not determine a data directory for the session store")?,
        };

        Ok(Config {
            api_url: args.api_url.trim_end_matches('/').to_string(),
            session_file,
            http_connect_timeout: args.connect_timeout,
            http_request_timeout: args.request_timeout,
            log_level: args.log_level.clone(),
        })
    }
}

/// Default session store location under the platform data directory
fn default_session_file() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join("sprout-todo").join("session.sqlite3"))
}

/// Expand tilde (~) in file paths to user's home directory
fn expand_tilde(path: &str) -> PathBuf {
    if path.starts_with("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(&path[2..]);
        }
    }
    PathBuf::from(path)
}
