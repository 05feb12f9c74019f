// SPDX-License-Identifier: MIT

//! Session and account models.

use serde::{Deserialize, Serialize};

/// A local-mode account credential record.
///
/// `id` is the email and acts as the primary key (case-sensitive).
/// Passwords are stored bcrypt-hashed; records are created on registration
/// and never updated or deleted in-app.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalCredential {
    pub id: String,
    pub password_hash: String,
}

/// Current sign-in state, restored from the local store at startup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub is_logged_in: bool,
    /// Display email
    pub user_email: Option<String>,
    /// Identity-provider subject ID; absent for local-mode accounts
    pub user_id: Option<String>,
}

/// Identity returned by the external identity provider.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// Stable unique subject identifier
    pub subject: String,
    pub email: String,
    pub display_name: String,
}
