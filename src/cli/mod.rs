//! Command-line interface for friend-tracker.
//!
//! Commands:
//! - `sync`: run the full pipeline (default when no command is given)
//! - `history`: print recent activity-log entries
//! - `show`: print the stored snapshot
//! - `config`: inspect or initialise the configuration file
//! - `completions`: generate shell completions

mod commands;

pub use commands::*;

use std::io;
use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};

use crate::config::Config;
use crate::error::{Result, TrackerError};

/// Track unfriends and new friends on a Roblox account.
#[derive(Debug, Parser)]
#[command(name = "friend-tracker")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to run (default: sync).
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to custom configuration file.
    #[arg(long, global = true, env = "FRIEND_TRACKER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory for snapshots and activity logs.
    #[arg(short = 'd', long, global = true, env = "FRIEND_TRACKER_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// File holding the session cookie.
    #[arg(long, global = true, env = "FRIEND_TRACKER_COOKIE_FILE")]
    pub cookie_file: Option<PathBuf>,

    /// Never prompt for a cookie; fail if none is stored.
    #[arg(long, global = true, env = "FRIEND_TRACKER_NO_PROMPT")]
    pub no_prompt: bool,

    /// Output as JSON.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress the activity report and summary.
    #[arg(short = 'q', long, global = true)]
    pub quiet: bool,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long, global = true, default_value = "info", env = "FRIEND_TRACKER_LOG_LEVEL")]
    pub log_level: LogLevel,

    /// Log format (text, json, compact, pretty).
    #[arg(long, global = true, default_value = "text", env = "FRIEND_TRACKER_LOG_FORMAT")]
    pub log_format: LogFormat,

    /// Log output file (default: stderr).
    #[arg(long, global = true, env = "FRIEND_TRACKER_LOG_FILE")]
    pub log_file: Option<PathBuf>,
}

/// Log level options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogLevel {
    /// Only errors.
    Error,
    /// Errors and warnings.
    Warn,
    /// Errors, warnings, and progress messages.
    #[default]
    Info,
    /// All of the above plus debug messages.
    Debug,
    /// All messages including trace-level details.
    Trace,
}

impl LogLevel {
    /// Convert to tracing filter level.
    #[must_use]
    pub fn to_filter_string(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

/// Log format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    /// Human-readable text format.
    #[default]
    Text,
    /// Structured JSON format for machine consumption.
    Json,
    /// Compact single-line format.
    Compact,
    /// Pretty format with full details.
    Pretty,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Fetch the friend list, report changes and save a new snapshot.
    #[command(alias = "run")]
    Sync,

    /// Show recent entries from an account's activity log.
    #[command(alias = "log")]
    History(HistoryArgs),

    /// Show the stored snapshot for an account.
    Show(ShowArgs),

    /// View and initialise configuration.
    #[command(alias = "cfg")]
    Config(ConfigArgs),

    /// Generate shell completions.
    Completions(CompletionsArgs),
}

/// Arguments for the history command.
#[derive(Debug, Clone, clap::Args)]
pub struct HistoryArgs {
    /// Account name whose log to read (default: the only stored account).
    #[arg(short = 'a', long)]
    pub account: Option<String>,

    /// Number of most recent lines to show.
    #[arg(short = 'n', long, default_value = "20")]
    pub limit: usize,
}

/// Arguments for the show command.
#[derive(Debug, Clone, clap::Args)]
pub struct ShowArgs {
    /// Account name whose snapshot to read (default: the only stored account).
    #[arg(short = 'a', long)]
    pub account: Option<String>,
}

/// Arguments for the config command.
#[derive(Debug, Parser)]
pub struct ConfigArgs {
    /// Config action to perform.
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Config subcommand actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Show the effective configuration.
    Show,

    /// Show configuration file path.
    Path,

    /// Write a configuration file with defaults.
    Init {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

/// Arguments for the completions command.
#[derive(Debug, Clone, clap::Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for.
    #[arg(value_enum)]
    pub shell: CompletionShell,
}

/// Supported shells for completion generation.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CompletionShell {
    /// Bash shell.
    Bash,
    /// Zsh shell.
    Zsh,
    /// Fish shell.
    Fish,
    /// PowerShell.
    Powershell,
    /// Elvish shell.
    Elvish,
}

impl From<CompletionShell> for Shell {
    fn from(shell: CompletionShell) -> Self {
        match shell {
            CompletionShell::Bash => Shell::Bash,
            CompletionShell::Zsh => Shell::Zsh,
            CompletionShell::Fish => Shell::Fish,
            CompletionShell::Powershell => Shell::PowerShell,
            CompletionShell::Elvish => Shell::Elvish,
        }
    }
}

/// Generate shell completions and print to stdout.
pub fn generate_completions(shell: CompletionShell) {
    let mut cmd = Cli::command();
    let shell: Shell = shell.into();
    generate(shell, &mut cmd, "friend-tracker", &mut io::stdout());
}

impl Cli {
    /// Load the configuration file and apply command-line overrides.
    pub fn load_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load_from(path)?,
            None => Config::load()?,
        };
        if let Some(dir) = &self.data_dir {
            config.storage.data_dir = Some(dir.clone());
        }
        if let Some(file) = &self.cookie_file {
            config.storage.cookie_file = Some(file.clone());
        }
        Ok(config)
    }
}

/// Initialize tracing/logging based on CLI options.
fn init_logging(cli: &Cli) {
    use tracing_subscriber::{
        fmt::{self, format::FmtSpan, writer::BoxMakeWriter},
        layer::SubscriberExt,
        util::SubscriberInitExt,
        EnvFilter,
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_level.to_filter_string()));

    let (writer, ansi) = match &cli.log_file {
        Some(path) => match std::fs::OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => (BoxMakeWriter::new(std::sync::Mutex::new(file)), false),
            Err(e) => {
                eprintln!("Warning: Could not open log file {}: {e}", path.display());
                (BoxMakeWriter::new(io::stderr), true)
            }
        },
        None => (BoxMakeWriter::new(io::stderr), true),
    };

    let result = match cli.log_format {
        LogFormat::Json => {
            let layer = fmt::layer()
                .json()
                .with_span_events(FmtSpan::CLOSE)
                .with_file(true)
                .with_line_number(true)
                .with_writer(writer);
            tracing_subscriber::registry()
                .with(filter)
                .with(layer)
                .try_init()
        }
        LogFormat::Compact => {
            let layer = fmt::layer()
                .compact()
                .with_target(false)
                .with_ansi(ansi)
                .with_writer(writer);
            tracing_subscriber::registry()
                .with(filter)
                .with(layer)
                .try_init()
        }
        LogFormat::Pretty => {
            let layer = fmt::layer()
                .pretty()
                .with_file(true)
                .with_line_number(true)
                .with_ansi(ansi)
                .with_writer(writer);
            tracing_subscriber::registry()
                .with(filter)
                .with(layer)
                .try_init()
        }
        LogFormat::Text => {
            let layer = fmt::layer()
                .with_target(false)
                .with_ansi(ansi)
                .with_writer(writer);
            tracing_subscriber::registry()
                .with(filter)
                .with(layer)
                .try_init()
        }
    };

    if let Err(e) = result {
        eprintln!("Warning: Could not initialize logging: {e}");
    }
}

/// Build the single-threaded runtime the network stages run on.
pub(crate) fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| TrackerError::io("Failed to start async runtime", e))
}

/// Run the CLI application.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&cli);

    match &cli.command {
        None | Some(Commands::Sync) => commands::sync::run(&cli),
        Some(Commands::History(args)) => commands::history::run(&cli, args),
        Some(Commands::Show(args)) => commands::show::run(&cli, args),
        Some(Commands::Config(args)) => commands::config::run(&cli, args),
        Some(Commands::Completions(args)) => {
            generate_completions(args.shell);
            Ok(())
        }
    }
}
