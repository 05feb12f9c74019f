// SPDX-License-Identifier: MIT

//! Application error types.
//!
//! Validation failures are returned to the caller and are recoverable by
//! retry. Remote-service failures carry a message for logging; callers in
//! the wishlist path log and swallow them rather than branching on them.

/// Application error type.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("email is already registered")]
    DuplicateEmail,

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("invalid email address: {0}")]
    InvalidEmail(String),

    #[error("profile limit reached")]
    ProfileLimitReached,

    #[error("no account is signed in")]
    NoOwner,

    #[error("identity provider error: {0}")]
    Identity(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, AppError>;
