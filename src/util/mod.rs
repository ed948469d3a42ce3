//! Utility functions for common operations.
//!
//! This module provides shared utilities used across the crate:
//! - Atomic file operations so a crash never leaves a half-written snapshot
//! - Account-key sanitising for per-account file names
//! - Session token redaction for log output

use std::borrow::Cow;
use std::io::{self, Write};
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use tempfile::NamedTempFile;

use crate::error::{Result, TrackerError};

/// Atomically write content to a file.
///
/// The content goes to a temporary file in the same directory, which is then
/// renamed over the target. If any step fails, the original file (if it
/// exists) remains unchanged.
///
/// # Example
///
/// ```rust,no_run
/// use friend_tracker::util::atomic_write;
///
/// atomic_write("config.toml", b"key = \"value\"").unwrap();
/// ```
pub fn atomic_write(path: impl AsRef<Path>, content: &[u8]) -> Result<()> {
    atomic_write_with(path, |writer| writer.write_all(content))
}

/// Atomically write content to a file using a writer function.
///
/// This is useful when you need to stream rows through a `Write` trait
/// object rather than building the bytes up front.
pub fn atomic_write_with<F>(path: impl AsRef<Path>, write_fn: F) -> Result<()>
where
    F: FnOnce(&mut dyn Write) -> io::Result<()>,
{
    let path = path.as_ref();

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        Some(_) => Path::new("."),
        None => {
            return Err(TrackerError::IoError {
                context: format!("Cannot determine parent directory for: {}", path.display()),
                source: io::Error::new(io::ErrorKind::InvalidInput, "No parent directory"),
            })
        }
    };

    if !parent.exists() {
        std::fs::create_dir_all(parent).map_err(|e| {
            TrackerError::io(format!("Failed to create directory: {}", parent.display()), e)
        })?;
    }

    // Same directory keeps the rename on one filesystem
    let mut temp_file = NamedTempFile::new_in(parent).map_err(|e| {
        TrackerError::io(
            format!("Failed to create temporary file in: {}", parent.display()),
            e,
        )
    })?;

    write_fn(&mut temp_file).map_err(|e| {
        TrackerError::io(format!("Failed to write content for: {}", path.display()), e)
    })?;

    temp_file.flush().map_err(|e| {
        TrackerError::io(
            format!("Failed to flush temporary file for: {}", path.display()),
            e,
        )
    })?;

    temp_file.persist(path).map_err(|e| {
        TrackerError::io(
            format!("Failed to atomically write file: {}", path.display()),
            e.error,
        )
    })?;

    Ok(())
}

static UNSAFE_KEY_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9_.\-]").expect("static regex"));

/// Turn an account name into a string safe to embed in a file name.
///
/// Characters outside `[A-Za-z0-9_.-]` become `_`, and a key made only of
/// dots is prefixed so it can never name a parent directory.
#[must_use]
pub fn sanitize_account_key(name: &str) -> String {
    let cleaned = UNSAFE_KEY_CHARS.replace_all(name.trim(), "_");
    if cleaned.is_empty() {
        return "_".to_string();
    }
    if cleaned.chars().all(|c| c == '.') {
        return format!("_{cleaned}");
    }
    cleaned.into_owned()
}

/// Mask a session token for display, keeping only a short tail.
#[must_use]
pub fn redact_token(token: &str) -> Cow<'static, str> {
    let count = token.chars().count();
    if count <= 8 {
        return Cow::Borrowed("[REDACTED]");
    }
    let tail: String = token.chars().skip(count - 4).collect();
    Cow::Owned(format!("[REDACTED]...{tail}"))
}
