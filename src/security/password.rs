//! Salted password hashes
//!
//! Hashes are stored as `pbkdf2:sha256:<rounds>$<salt>$<hex digest>`, the
//! format Werkzeug's `generate_password_hash` emits, so existing credential
//! tables can be reused unchanged.

use rand::distributions::Alphanumeric;
use rand::Rng;
use sha2::Sha256;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// PBKDF2 iterations used for newly generated hashes
pub const DEFAULT_ROUNDS: u32 = 600_000;

const SALT_LENGTH: usize = 16;
const DIGEST_LENGTH: usize = 32;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PasswordHashError {
    #[error("malformed password hash, expected method$salt$digest")]
    Malformed,

    #[error("unsupported hash method: {0} (only pbkdf2:sha256 hashes are accepted, regenerate with `cifar10-serve hash-password`)")]
    UnsupportedMethod(String),

    #[error("invalid iteration count: {0}")]
    InvalidRounds(String),
}

/// A parsed PBKDF2-HMAC-SHA256 password hash
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordHash {
    rounds: u32,
    salt: String,
    digest: String,
}

impl fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasswordHash")
            .field("rounds", &self.rounds)
            .field("digest", &"[REDACTED]")
            .finish()
    }
}

impl fmt::Display for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pbkdf2:sha256:{}${}${}", self.rounds, self.salt, self.digest)
    }
}

impl FromStr for PasswordHash {
    type Err = PasswordHashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(3, '$');
        let (method, salt, digest) = match (parts.next(), parts.next(), parts.next()) {
            (Some(m), Some(s), Some(d)) if !s.is_empty() && !d.is_empty() => (m, s, d),
            _ => return Err(PasswordHashError::Malformed),
        };

        let mut method_parts = method.split(':');
        if method_parts.next() != Some("pbkdf2") {
            return Err(PasswordHashError::UnsupportedMethod(method.to_string()));
        }
        match method_parts.next() {
            None | Some("") | Some("sha256") => {}
            Some(other) => return Err(PasswordHashError::UnsupportedMethod(format!("pbkdf2:{}", other))),
        }
        let rounds = match method_parts.next() {
            None | Some("") => DEFAULT_ROUNDS,
            Some(r) => r
                .parse::<u32>()
                .ok()
                .filter(|&n| n > 0)
                .ok_or_else(|| PasswordHashError::InvalidRounds(r.to_string()))?,
        };

        Ok(Self {
            rounds,
            salt: salt.to_string(),
            digest: digest.to_ascii_lowercase(),
        })
    }
}

impl PasswordHash {
    /// Hash `password` with a fresh random salt
    pub fn generate(password: &str, rounds: u32) -> Self {
        let rounds = rounds.max(1);
        let salt: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(SALT_LENGTH)
            .map(char::from)
            .collect();
        let digest = derive(password, &salt, rounds);
        Self { rounds, salt, digest }
    }

    /// Check `password` against this hash in constant time
    pub fn verify(&self, password: &str) -> bool {
        constant_time_compare(&derive(password, &self.salt, self.rounds), &self.digest)
    }

    pub fn rounds(&self) -> u32 {
        self.rounds
    }
}

/// Werkzeug-style convenience wrapper returning the encoded hash
pub fn generate_password_hash(password: &str, rounds: u32) -> String {
    PasswordHash::generate(password, rounds).to_string()
}

/// Verify `password` against an encoded hash; malformed hashes never match
pub fn check_password_hash(encoded: &str, password: &str) -> bool {
    encoded
        .parse::<PasswordHash>()
        .map(|hash| hash.verify(password))
        .unwrap_or(false)
}

fn derive(password: &str, salt: &str, rounds: u32) -> String {
    let key = pbkdf2::pbkdf2_hmac_array::<Sha256, DIGEST_LENGTH>(
        password.as_bytes(),
        salt.as_bytes(),
        rounds,
    );
    key.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Constant-time string comparison.
///
/// Always walks the longer input so the expected length does not leak
/// through timing.
pub fn constant_time_compare(a: &str, b: &str) -> bool {
    let a = a.as_bytes();
    let b = b.as_bytes();
    let len = a.len().max(b.len());
    let mut result = (a.len() != b.len()) as u8;

    for i in 0..len {
        let x = a.get(i).copied().unwrap_or(0);
        let y = b.get(i).copied().unwrap_or(0);
        result |= x ^ y;
    }

    result == 0
}
