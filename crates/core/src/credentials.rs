//! Durable bearer credential: in-memory cell plus file-backed store.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::fs;

use anyhow::{Context, Result};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// File name of the persisted credential under the config directory.
pub const CREDENTIAL_FILE: &str = "credential.json";

/// Shared in-memory credential cell.
///
/// Cloned into the HTTP executor and the session manager so both
/// observe the same token. Writes are last-write-wins.
#[derive(Clone, Default)]
pub struct TokenCell {
    inner: Arc<RwLock<Option<String>>>,
}

impl TokenCell {
    /// Empty cell.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current token, if any.
    pub fn get(&self) -> Option<String> {
        self.inner.read().clone()
    }

    /// Install a token.
    pub fn set(&self, token: impl Into<String>) {
        *self.inner.write() = Some(token.into());
    }

    /// Remove the token.
    pub fn clear(&self) {
        *self.inner.write() = None;
    }

    /// Whether a token is currently held.
    pub fn is_present(&self) -> bool {
        self.inner.read().is_some()
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredCredential {
    token: String,
}

/// File-backed store for the bearer token; one JSON file holding a
/// single scalar, surviving process restarts until logout.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    /// Store rooted at the given file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Default location under the user's config directory.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("aventura")
            .join(CREDENTIAL_FILE)
    }

    /// Path this store reads and writes.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted token, returning `None` when absent.
    pub fn load(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read {}", self.path.display()))?;
        let stored: StoredCredential = serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse {}", self.path.display()))?;
        Ok(Some(stored.token))
    }

    /// Persist the token, creating parent directories if needed.
    pub fn persist(&self, token: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let serialized = serde_json::to_string_pretty(&StoredCredential {
            token: token.to_string(),
        })
        .context("failed to serialize credential")?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("failed to write {}", self.path.display()))
    }

    /// Remove the persisted token. Succeeds when the file is missing.
    pub fn clear(&self) -> Result<()> {
        if !self.path.exists() {
            return Ok(());
        }
        fs::remove_file(&self.path)
            .with_context(|| format!("failed to remove {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn credential_round_trip() -> Result<()> {
        let dir = tempdir()?;
        let store = CredentialStore::new(dir.path().join("credential.json"));

        assert_eq!(store.load()?, None);
        store.persist("secret-token")?;
        assert_eq!(store.load()?, Some("secret-token".to_string()));

        store.clear()?;
        assert_eq!(store.load()?, None);
        // clearing twice stays fine
        store.clear()?;
        Ok(())
    }

    #[test]
    fn token_cell_is_shared() {
        let cell = TokenCell::new();
        let other = cell.clone();
        cell.set("abc");
        assert_eq!(other.get(), Some("abc".to_string()));
        other.clear();
        assert!(!cell.is_present());
    }
}
