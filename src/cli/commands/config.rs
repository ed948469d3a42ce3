//! Config command implementation.
//!
//! View the effective configuration and create the configuration file.

use std::path::PathBuf;

use crate::cli::{Cli, ConfigAction, ConfigArgs};
use crate::config::{default_config_path, Config};
use crate::error::{Result, TrackerError};

/// Run the config command.
pub fn run(cli: &Cli, args: &ConfigArgs) -> Result<()> {
    match &args.action {
        ConfigAction::Show => show_config(cli),
        ConfigAction::Path => show_config_path(cli),
        ConfigAction::Init { force } => init_config(cli, *force),
    }
}

fn config_path(cli: &Cli) -> Result<PathBuf> {
    match &cli.config {
        Some(path) => Ok(path.clone()),
        None => default_config_path(),
    }
}

/// Show the configuration after file and command-line overrides.
fn show_config(cli: &Cli) -> Result<()> {
    let config = cli.load_config()?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    let rendered = toml::to_string_pretty(&config).map_err(|e| TrackerError::ConfigError {
        message: format!("Failed to render config: {e}"),
    })?;
    print!("{rendered}");

    if !cli.quiet {
        println!();
        println!("# data directory: {}", config.data_dir()?.display());
        println!("# cookie file:    {}", config.cookie_file()?.display());
    }
    Ok(())
}

/// Show configuration file path.
fn show_config_path(cli: &Cli) -> Result<()> {
    let path = config_path(cli)?;
    println!("{}", path.display());
    Ok(())
}

/// Initialize configuration file with defaults.
fn init_config(cli: &Cli, force: bool) -> Result<()> {
    let path = config_path(cli)?;

    if path.exists() && !force {
        println!("Configuration file already exists at: {}", path.display());
        println!("Use 'friend-tracker config init --force' to reset it to defaults.");
        return Ok(());
    }

    Config::default().save_to(&path)?;
    println!("Created configuration file at: {}", path.display());
    Ok(())
}
