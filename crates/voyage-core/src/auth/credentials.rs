use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use keyring::Entry;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::config::APP_NAME;

/// Keyring account name the bearer token is stored under
const TOKEN_ACCOUNT: &str = "auth-token";

/// Token file name in cache directory
const TOKEN_FILE: &str = "token.json";

/// Persists the single bearer token outside process memory.
///
/// `set(None)` clears it; clearing an empty store is not an error.
pub trait CredentialStore: Send + Sync {
    fn get(&self) -> Result<Option<String>>;
    fn set(&self, token: Option<&str>) -> Result<()>;
}

/// Token kept in the OS keychain.
pub struct KeyringStore {
    service: String,
}

impl KeyringStore {
    pub fn new() -> Self {
        Self::with_service(APP_NAME)
    }

    pub fn with_service(service: &str) -> Self {
        Self {
            service: service.to_string(),
        }
    }

    fn entry(&self) -> Result<Entry> {
        Entry::new(&self.service, TOKEN_ACCOUNT).context("Failed to create keyring entry")
    }
}

impl Default for KeyringStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialStore for KeyringStore {
    fn get(&self) -> Result<Option<String>> {
        match self.entry()?.get_password() {
            Ok(token) => Ok(Some(token)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e).context("Failed to retrieve token from keychain"),
        }
    }

    fn set(&self, token: Option<&str>) -> Result<()> {
        let entry = self.entry()?;
        match token {
            Some(token) => entry
                .set_password(token)
                .context("Failed to store token in keychain"),
            None => match entry.delete_credential() {
                Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
                Err(e) => Err(e).context("Failed to delete token from keychain"),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredToken {
    token: String,
    saved_at: DateTime<Utc>,
}

/// Token kept as JSON in the cache directory.
pub struct FileStore {
    cache_dir: PathBuf,
}

impl FileStore {
    pub fn new(cache_dir: PathBuf) -> Self {
        Self { cache_dir }
    }

    fn token_path(&self) -> PathBuf {
        self.cache_dir.join(TOKEN_FILE)
    }
}

impl CredentialStore for FileStore {
    fn get(&self) -> Result<Option<String>> {
        let path = self.token_path();
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path).context("Failed to read token file")?;
        let stored: StoredToken =
            serde_json::from_str(&contents).context("Failed to parse token file")?;
        Ok(Some(stored.token))
    }

    fn set(&self, token: Option<&str>) -> Result<()> {
        let path = self.token_path();
        match token {
            Some(token) => {
                std::fs::create_dir_all(&self.cache_dir)
                    .context("Failed to create cache directory")?;
                let stored = StoredToken {
                    token: token.to_string(),
                    saved_at: Utc::now(),
                };
                std::fs::write(&path, serde_json::to_string_pretty(&stored)?)
                    .context("Failed to write token file")?;
            }
            None => {
                if path.exists() {
                    std::fs::remove_file(&path).context("Failed to remove token file")?;
                }
            }
        }
        Ok(())
    }
}

/// Token kept only for the lifetime of the process.
#[derive(Default)]
pub struct MemoryStore {
    token: Mutex<Option<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: &str) -> Self {
        Self {
            token: Mutex::new(Some(token.to_string())),
        }
    }
}

impl CredentialStore for MemoryStore {
    fn get(&self) -> Result<Option<String>> {
        Ok(self.token.lock().clone())
    }

    fn set(&self, token: Option<&str>) -> Result<()> {
        *self.token.lock() = token.map(str::to_string);
        Ok(())
    }
}
