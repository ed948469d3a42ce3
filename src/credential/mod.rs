//! Session credential acquisition.
//!
//! The session cookie is read from a local text file first. When the file is
//! missing or empty the provider falls back to a [`CredentialPrompt`], which
//! the CLI backs with a terminal prompt and tests back with scripted answers.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use dialoguer::{theme::ColorfulTheme, Confirm, Password};
use tracing::{error, info, warn};

use crate::error::{Result, TrackerError};
use crate::util::{atomic_write, redact_token};

/// Opaque session token. Its contents are never inspected or logged.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wrap a raw token, trimming whitespace. Empty input yields `None`.
    #[must_use]
    pub fn new(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    /// The raw token, for building request headers.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Credential").field(&redact_token(&self.0)).finish()
    }
}

/// Interactive source of a session token.
pub trait CredentialPrompt {
    /// Ask for a token. `Ok(None)` means the user gave nothing.
    fn ask_token(&mut self) -> Result<Option<String>>;

    /// Ask whether the token should be written to `path` for next time.
    fn confirm_save(&mut self, path: &Path) -> Result<bool>;
}

/// Prompt backed by the controlling terminal.
#[derive(Default)]
pub struct TerminalPrompt {
    theme: ColorfulTheme,
}

impl TerminalPrompt {
    /// Create a terminal prompt with the default theme.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialPrompt for TerminalPrompt {
    fn ask_token(&mut self) -> Result<Option<String>> {
        if !console::Term::stderr().is_term() {
            warn!("No terminal attached; cannot prompt for a session cookie");
            return Ok(None);
        }

        let token = Password::with_theme(&self.theme)
            .with_prompt("Paste .ROBLOSECURITY cookie")
            .allow_empty_password(true)
            .interact()
            .map_err(prompt_error)?;
        Ok(Some(token))
    }

    fn confirm_save(&mut self, path: &Path) -> Result<bool> {
        Confirm::with_theme(&self.theme)
            .with_prompt(format!("Save to '{}'?", path.display()))
            .default(false)
            .interact()
            .map_err(prompt_error)
    }
}

fn prompt_error(err: dialoguer::Error) -> TrackerError {
    let err = io::Error::from(err);
    if err.kind() == io::ErrorKind::Interrupted {
        TrackerError::Interrupted
    } else {
        TrackerError::io("Failed to read from terminal", err)
    }
}

/// Prompt that never supplies a token, for unattended runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPrompt;

impl CredentialPrompt for NoPrompt {
    fn ask_token(&mut self) -> Result<Option<String>> {
        Ok(None)
    }

    fn confirm_save(&mut self, _path: &Path) -> Result<bool> {
        Ok(false)
    }
}

/// Supplies the session credential from storage or a prompt.
#[derive(Debug, Clone)]
pub struct CredentialProvider {
    cookie_file: PathBuf,
}

impl CredentialProvider {
    /// Create a provider reading and writing `cookie_file`.
    pub fn new(cookie_file: impl Into<PathBuf>) -> Self {
        Self {
            cookie_file: cookie_file.into(),
        }
    }

    /// Location of the stored cookie.
    #[must_use]
    pub fn cookie_file(&self) -> &Path {
        &self.cookie_file
    }

    /// Read the stored token, if the file exists and is non-empty.
    pub fn read_stored(&self) -> Option<Credential> {
        if !self.cookie_file.exists() {
            return None;
        }
        match std::fs::read_to_string(&self.cookie_file) {
            Ok(content) => Credential::new(&content),
            Err(e) => {
                error!(path = %self.cookie_file.display(), error = %e, "Failed to read cookie file");
                None
            }
        }
    }

    /// Write the token to the cookie file.
    pub fn store(&self, credential: &Credential) -> Result<()> {
        atomic_write(&self.cookie_file, credential.expose().as_bytes())
    }

    /// Produce a credential, prompting when storage has none.
    ///
    /// Returns [`TrackerError::CredentialMissing`] when the prompt yields
    /// nothing and [`TrackerError::Interrupted`] when the user aborts it.
    pub fn obtain(&self, prompt: &mut dyn CredentialPrompt) -> Result<Credential> {
        if let Some(credential) = self.read_stored() {
            return Ok(credential);
        }

        warn!(path = %self.cookie_file.display(), "Cookie file not found or empty");

        let credential = prompt
            .ask_token()?
            .as_deref()
            .and_then(Credential::new)
            .ok_or(TrackerError::CredentialMissing)?;

        if prompt.confirm_save(&self.cookie_file)? {
            match self.store(&credential) {
                Ok(()) => info!(path = %self.cookie_file.display(), "Saved session cookie"),
                Err(e) => error!(error = %e, "Failed to save session cookie"),
            }
        }

        Ok(credential)
    }
}
