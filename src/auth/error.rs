use thiserror::Error;

pub type CryptResult<T> = std::result::Result<T, CryptError>;

/// Password hashing and session token failures.
#[derive(Debug, Error)]
pub enum CryptError {
    #[error("password hash error: {0}")]
    PasswordHash(#[from] argon2::password_hash::Error),
    #[error("session token error: {0}")]
    SessionToken(#[from] jsonwebtoken::errors::Error),
}
