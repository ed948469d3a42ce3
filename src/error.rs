//! Error types for friend-tracker.
//!
//! Only three categories stop a run: a missing credential, a rejected
//! credential, and a friend list that could not be paginated to the end.
//! Everything else the pipeline encounters is reported as an outcome value
//! and logged, so these variants mostly surface from setup code and the CLI.

use std::path::PathBuf;

use thiserror::Error;

/// Primary error type for friend-tracker operations.
#[derive(Error, Debug)]
pub enum TrackerError {
    /// No session token was available from storage or the prompt.
    #[error("No session cookie available")]
    CredentialMissing,

    /// The remote identity check rejected the session token.
    #[error("Authentication failed (HTTP {status})")]
    AuthenticationFailed {
        /// HTTP status returned by the identity endpoint.
        status: u16,
    },

    /// A request could not reach the API at all.
    #[error("Connection error: {context}")]
    Connection {
        /// Context describing the request that failed.
        context: String,
        /// Underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// Friend-list pagination stopped before the last page.
    #[error("Friend list unavailable after {fetched} entries: {reason}")]
    FriendListUnavailable {
        /// Number of entries accumulated before pagination stopped.
        fetched: usize,
        /// Why pagination stopped.
        reason: String,
    },

    /// File not found.
    #[error("File not found: {path}")]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// Configuration error.
    #[error("Configuration error: {message}")]
    ConfigError {
        /// Human-readable error message.
        message: String,
    },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Human-readable error message.
        message: String,
    },

    /// Invalid argument.
    #[error("Invalid argument '{name}': {reason}")]
    InvalidArgument {
        /// Name of the invalid argument.
        name: String,
        /// Reason why the argument is invalid.
        reason: String,
    },

    /// I/O error.
    #[error("I/O error: {context}")]
    IoError {
        /// Context describing the operation that failed.
        context: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Serialization error.
    #[error("Serialization error: {context}")]
    SerializationError {
        /// Context describing the operation that failed.
        context: String,
        /// Underlying serde_json error.
        #[source]
        source: serde_json::Error,
    },

    /// Interrupted operation.
    #[error("Operation interrupted")]
    Interrupted,
}

impl TrackerError {
    /// Create a new I/O error with context.
    #[must_use]
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::IoError {
            context: context.into(),
            source,
        }
    }

    /// Create a new connection error with context.
    #[must_use]
    pub fn connection(context: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Connection {
            context: context.into(),
            source,
        }
    }

    /// Create a new serialization error with context.
    #[must_use]
    pub fn serialization(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::SerializationError {
            context: context.into(),
            source,
        }
    }

    /// Get the process exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::CredentialMissing => exit_codes::EXIT_NO_CREDENTIAL,
            Self::AuthenticationFailed { .. } | Self::Connection { .. } => exit_codes::EXIT_AUTH_FAILED,
            Self::FriendListUnavailable { .. } => exit_codes::EXIT_FETCH_FAILED,
            Self::ConfigError { .. } | Self::InvalidConfig { .. } => exit_codes::EXIT_CONFIG_ERROR,
            Self::InvalidArgument { .. } => exit_codes::EXIT_USAGE_ERROR,
            Self::IoError { .. } | Self::FileNotFound { .. } => exit_codes::EXIT_IO_ERROR,
            Self::Interrupted => exit_codes::EXIT_INTERRUPTED,
            Self::SerializationError { .. } => exit_codes::EXIT_GENERAL_ERROR,
        }
    }
}

/// Result type alias for friend-tracker operations.
pub type Result<T> = std::result::Result<T, TrackerError>;

impl From<std::io::Error> for TrackerError {
    fn from(err: std::io::Error) -> Self {
        Self::IoError {
            context: "I/O operation failed".to_string(),
            source: err,
        }
    }
}

impl From<serde_json::Error> for TrackerError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError {
            context: "JSON operation failed".to_string(),
            source: err,
        }
    }
}

/// Exit codes for CLI operations.
pub mod exit_codes {
    /// Operation completed successfully, including degraded runs.
    pub const EXIT_SUCCESS: i32 = 0;
    /// General/unspecified error.
    pub const EXIT_GENERAL_ERROR: i32 = 1;
    /// No session cookie was supplied.
    pub const EXIT_NO_CREDENTIAL: i32 = 2;
    /// The session cookie was rejected or the identity check was unreachable.
    pub const EXIT_AUTH_FAILED: i32 = 3;
    /// The friend list could not be fetched completely.
    pub const EXIT_FETCH_FAILED: i32 = 4;
    /// Invalid configuration.
    pub const EXIT_CONFIG_ERROR: i32 = 5;
    /// Invalid command-line usage (BSD standard).
    pub const EXIT_USAGE_ERROR: i32 = 64;
    /// I/O error (BSD standard).
    pub const EXIT_IO_ERROR: i32 = 74;
    /// Terminated by Ctrl+C (128 + SIGINT).
    pub const EXIT_INTERRUPTED: i32 = 130;
}
