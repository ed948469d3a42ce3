//! friend-tracker: snapshot a Roblox friend list and report what changed.
//!
//! Each run authenticates with a session cookie, paginates the account's
//! friend list, resolves names in batches, diffs the result against the
//! previous snapshot and stores the new one.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use friend_tracker::config::Config;
//! use friend_tracker::credential::{CredentialProvider, NoPrompt};
//! use friend_tracker::pipeline::Tracker;
//!
//! # async fn demo() -> friend_tracker::Result<()> {
//! let config = Config::load()?;
//! let credential = CredentialProvider::new(config.cookie_file()?).obtain(&mut NoPrompt)?;
//! let summary = Tracker::new(config)?.run(&credential).await?;
//! println!("{} friends", summary.friends.len());
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - [`credential`]: session cookie from disk or an interactive prompt
//! - [`client`]: authenticated HTTP client and per-request outcomes
//! - [`fetch`]: cursor pagination of the friend list
//! - [`enrich`]: batched name lookup with local-history fallback
//! - [`analysis`]: change detection, report and activity log
//! - [`store`]: per-account snapshot and CSV export with a corruption guard
//! - [`pipeline`]: the sequential run tying the stages together
//! - [`cli`]: command-line interface
//! - [`config`]: configuration management
//! - [`error`]: error types and exit codes

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod analysis;
pub mod cli;
pub mod client;
pub mod config;
pub mod credential;
pub mod enrich;
pub mod error;
pub mod fetch;
pub mod model;
pub mod pipeline;
pub mod retry;
pub mod store;
pub mod util;

// Re-export commonly used types at the crate root
pub use error::{Result, TrackerError};
pub use model::FriendRecord;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
