//! Show command implementation.
//!
//! Prints the stored snapshot for an account.

use console::style;

use crate::cli::{Cli, ShowArgs};
use crate::error::{Result, TrackerError};
use crate::model::{nameless_fraction, FriendRecord};

use super::{open_store, resolve_account};

/// Run the show command.
pub fn run(cli: &Cli, args: &ShowArgs) -> Result<()> {
    let store = open_store(cli)?;
    let account = resolve_account(&store, args.account.as_deref())?;
    let Some(friends) = store.load(&account)? else {
        return Err(TrackerError::FileNotFound {
            path: store.files(&account).snapshot,
        });
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&friends)?);
        return Ok(());
    }

    for friend in &friends {
        println!("{}", format_row(friend));
    }

    if !cli.quiet {
        println!();
        println!(
            "{} friends, {:.1}% without a name",
            style(friends.len()).bold(),
            nameless_fraction(&friends) * 100.0
        );
    }
    Ok(())
}

fn format_row(friend: &FriendRecord) -> String {
    let badge = if friend.has_verified_badge == Some(true) { " [verified]" } else { "" };
    format!(
        "{:>12}  {} (@{}){badge}",
        friend.id,
        friend.name_or_unknown(),
        friend.display_name_or_dash()
    )
}
