// Security module - credential storage and password hashing
pub mod auth;
pub mod password;

pub use auth::{CredentialError, CredentialStore, CredentialTable, SecurityConfig, DEFAULT_ADMIN_USER};
pub use password::{check_password_hash, constant_time_compare, generate_password_hash, PasswordHash, PasswordHashError, DEFAULT_ROUNDS};
