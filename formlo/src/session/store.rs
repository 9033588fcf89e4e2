//! Session cookie persistence.
//!
//! Sign-in completes in the browser, so the backend-issued cookie
//! reaches the CLI out of band. It is kept in a well-known file under
//! the user's home directory so separate invocations share one
//! session; the `FORMLO_SESSION` environment variable overrides the
//! file when set.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

const SESSION_DIR: &str = ".formlo";
const SESSION_FILE: &str = "session";
const SESSION_ENV: &str = "FORMLO_SESSION";

/// Load the stored session cookie, if any.
pub fn load_cookie() -> Option<String> {
    if let Ok(value) = std::env::var(SESSION_ENV) {
        let value = value.trim().to_string();
        if !value.is_empty() {
            return Some(value);
        }
    }

    let path = session_file().ok()?;
    read_cookie_at(&path)
}

/// Persist the session cookie for later invocations.
pub fn save_cookie(cookie: &str) -> Result<()> {
    let path = session_file()?;
    write_cookie_at(&path, cookie)
}

/// Forget the stored session cookie. Missing file is not an error.
pub fn clear_cookie() -> Result<()> {
    let path = session_file()?;
    remove_cookie_at(&path)
}

fn session_file() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not find home directory")?;
    Ok(home.join(SESSION_DIR).join(SESSION_FILE))
}

fn read_cookie_at(path: &Path) -> Option<String> {
    let content = std::fs::read_to_string(path).ok()?;
    let cookie = content.trim().to_string();
    if cookie.is_empty() {
        None
    } else {
        Some(cookie)
    }
}

fn write_cookie_at(path: &Path, cookie: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(path, cookie.trim())
        .with_context(|| format!("Failed to write {}", path.display()))
}

fn remove_cookie_at(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("Failed to remove {}", path.display())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session");

        write_cookie_at(&path, "session=abc123\n").unwrap();
        assert_eq!(read_cookie_at(&path).as_deref(), Some("session=abc123"));

        remove_cookie_at(&path).unwrap();
        assert_eq!(read_cookie_at(&path), None);
    }

    #[test]
    fn blank_file_reads_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session");
        std::fs::write(&path, "  \n").unwrap();
        assert_eq!(read_cookie_at(&path), None);
    }

    #[test]
    fn removing_missing_file_is_fine() {
        let dir = tempfile::tempdir().unwrap();
        assert!(remove_cookie_at(&dir.path().join("session")).is_ok());
    }

    #[test]
    fn write_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session");
        write_cookie_at(&path, "session=xyz").unwrap();
        assert_eq!(read_cookie_at(&path).as_deref(), Some("session=xyz"));
    }
}
