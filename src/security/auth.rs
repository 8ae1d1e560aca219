use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use super::password::{PasswordHash, PasswordHashError, DEFAULT_ROUNDS};

/// Username used when no credentials file is configured
pub const DEFAULT_ADMIN_USER: &str = "admin";
const DEFAULT_ADMIN_PASSWORD: &str = "password123";

#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("failed to read credentials file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("credentials file {path} is not a JSON object of username to hash: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid password hash for user '{user}': {source}")]
    InvalidHash {
        user: String,
        #[source]
        source: PasswordHashError,
    },
}

#[derive(Clone)]
pub struct SecurityConfig {
    /// JSON file mapping username to password hash
    pub credentials_file: Option<PathBuf>,
    /// Password for the fallback admin user when no file is configured
    pub admin_password: String,
    /// PBKDF2 iterations for hashes generated at startup
    pub hash_rounds: u32,
}

impl fmt::Debug for SecurityConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecurityConfig")
            .field("credentials_file", &self.credentials_file)
            .field("admin_password", &"[REDACTED]")
            .field("hash_rounds", &self.hash_rounds)
            .finish()
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            credentials_file: std::env::var("CREDENTIALS_FILE").ok().map(PathBuf::from),
            admin_password: std::env::var("ADMIN_PASSWORD")
                .unwrap_or_else(|_| DEFAULT_ADMIN_PASSWORD.to_string()),
            hash_rounds: std::env::var("PASSWORD_HASH_ROUNDS")
                .ok()
                .and_then(|r| r.parse().ok())
                .unwrap_or(DEFAULT_ROUNDS),
        }
    }
}

/// Source of truth for username/password checks
pub trait CredentialStore: Send + Sync {
    /// True only when `username` exists and `password` matches its hash
    fn verify(&self, username: &str, password: &str) -> bool;
}

/// Read-only in-memory table of salted password hashes
pub struct CredentialTable {
    users: HashMap<String, PasswordHash>,
    // Checked for unknown users so a miss costs the same as a wrong password
    decoy: PasswordHash,
}

impl fmt::Debug for CredentialTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut users: Vec<&String> = self.users.keys().collect();
        users.sort();
        f.debug_struct("CredentialTable").field("users", &users).finish()
    }
}

impl CredentialTable {
    /// Build a table from already encoded hashes
    pub fn from_hashes(entries: HashMap<String, String>) -> Result<Self, CredentialError> {
        let users = entries
            .into_iter()
            .map(|(user, encoded)| match encoded.parse::<PasswordHash>() {
                Ok(hash) => Ok((user, hash)),
                Err(source) => Err(CredentialError::InvalidHash { user, source }),
            })
            .collect::<Result<HashMap<_, _>, _>>()?;
        Ok(Self::from_parsed(users))
    }

    /// Build a single-user table, hashing `password` now
    pub fn with_user(username: &str, password: &str, rounds: u32) -> Self {
        let mut users = HashMap::new();
        users.insert(username.to_string(), PasswordHash::generate(password, rounds));
        Self::from_parsed(users)
    }

    /// Load a JSON object of `username -> hash` from disk
    pub fn from_json_file(path: &Path) -> Result<Self, CredentialError> {
        let text = std::fs::read_to_string(path).map_err(|source| CredentialError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let entries: HashMap<String, String> =
            serde_json::from_str(&text).map_err(|source| CredentialError::Json {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_hashes(entries)
    }

    /// Build the table described by `config`
    pub fn from_config(config: &SecurityConfig) -> Result<Self, CredentialError> {
        match &config.credentials_file {
            Some(path) => {
                let table = Self::from_json_file(path)?;
                info!(path = %path.display(), users = table.len(), "Loaded credentials file");
                Ok(table)
            }
            None => {
                warn!(
                    user = DEFAULT_ADMIN_USER,
                    "No CREDENTIALS_FILE configured, using the built-in admin account"
                );
                Ok(Self::with_user(DEFAULT_ADMIN_USER, &config.admin_password, config.hash_rounds))
            }
        }
    }

    fn from_parsed(users: HashMap<String, PasswordHash>) -> Self {
        let rounds = users.values().map(PasswordHash::rounds).max().unwrap_or(DEFAULT_ROUNDS);
        let decoy = PasswordHash::generate("", rounds);
        Self { users, decoy }
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn contains(&self, username: &str) -> bool {
        self.users.contains_key(username)
    }
}

impl CredentialStore for CredentialTable {
    fn verify(&self, username: &str, password: &str) -> bool {
        match self.users.get(username) {
            Some(hash) => hash.verify(password),
            None => {
                std::hint::black_box(self.decoy.verify(password));
                false
            }
        }
    }
}
