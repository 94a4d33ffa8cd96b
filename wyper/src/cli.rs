use std::{fmt, path::PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use log::LevelFilter;

use crate::store::Theme;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Backend API root, e.g. http://localhost:7894/api
    #[arg(long, env = "WYPER_API_URL")]
    pub api_url: Option<String>,

    /// Directory for the local fallback store
    #[arg(long, env = "WYPER_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Chat poll interval in milliseconds
    #[arg(long, env = "WYPER_POLL_INTERVAL_MS")]
    pub poll_interval_ms: Option<u64>,

    /// Backend request timeout in seconds
    #[arg(long, env = "WYPER_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,

    /// Placeholder image service for local cover paths
    #[arg(long, env = "WYPER_IMAGE_BASE")]
    pub image_base: Option<String>,

    /// Log verbosity
    #[arg(short, long, value_name = "LEVEL", default_value_t = LogLevel::Info, global = true)]
    pub log_level: LogLevel,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// List posts, newest first
    Posts,
    /// Read a post
    Show {
        slug: String,
    },
    /// Write or edit a post in $EDITOR, then publish it
    Edit {
        /// Existing post to edit instead of the current draft
        slug: Option<String>,

        /// Only save the draft
        #[arg(long)]
        no_publish: bool,
    },
    /// Publish a Markdown document with front matter
    Publish {
        path: PathBuf,

        /// Slug to publish under, overriding the front matter
        #[arg(long)]
        slug: Option<String>,
    },
    /// Open the chat and follow new messages
    Chat,
    /// Send one chat message
    Say {
        message: String,
    },
    /// Show or change the theme
    Theme {
        theme: Option<Theme>,
    },
    /// Unlock authoring for this data directory
    Login,
    /// Lock authoring again
    Logout,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Off,
}

impl From<LogLevel> for LevelFilter {
    fn from(log_level: LogLevel) -> Self {
        match log_level {
            LogLevel::Trace => LevelFilter::Trace,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Off => LevelFilter::Off,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
            LogLevel::Off => write!(f, "off"),
        }
    }
}
