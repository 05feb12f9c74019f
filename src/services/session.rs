// SPDX-License-Identifier: MIT

//! Session state: sign-in status, restoration, and local-mode accounts.
//!
//! A session is persisted as three local-store entries (flag, email,
//! subject id) kept consistent as a set; local-mode sessions simply have
//! no subject id. Local-mode accounts live entirely in the local store
//! with bcrypt-hashed passwords.

use std::sync::Arc;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use validator::ValidateEmail;

use crate::db::{keys, KvStore};
use crate::error::{AppError, Result};
use crate::models::{AuthUser, LocalCredential, Session};
use crate::services::google_identity::GoogleIdentity;

/// Session state holder.
pub struct SessionManager {
    store: Arc<dyn KvStore>,
    identity: Arc<GoogleIdentity>,
    session: Session,
}

impl SessionManager {
    /// Restore session state from the local store.
    pub fn new(store: Arc<dyn KvStore>, identity: Arc<GoogleIdentity>) -> Self {
        let session = restore_session(store.as_ref());

        if session.is_logged_in {
            tracing::info!(
                email = session.user_email.as_deref().unwrap_or("<none>"),
                "Restored signed-in session"
            );
        }

        Self {
            store,
            identity,
            session,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn is_logged_in(&self) -> bool {
        self.session.is_logged_in
    }

    pub fn user_email(&self) -> Option<&str> {
        self.session.user_email.as_deref()
    }

    /// Identity-provider subject id, if this is a remote-identity session.
    pub fn user_id(&self) -> Option<&str> {
        self.session.user_id.as_deref()
    }

    /// The per-account namespace key for profiles and wishlists.
    ///
    /// The subject id takes precedence; local-mode sessions fall back to a
    /// key derived from the email.
    pub fn owner_key(&self) -> Option<String> {
        if let Some(uid) = &self.session.user_id {
            return Some(uid.clone());
        }
        self.session.user_email.as_deref().map(local_owner_key)
    }

    /// Mark the session signed-in and persist it.
    ///
    /// A missing subject id (local-mode account) clears any stored one.
    pub fn login(&mut self, user_id: Option<&str>, email: Option<&str>) {
        self.session = Session {
            is_logged_in: true,
            user_email: email.map(str::to_string),
            user_id: user_id.map(str::to_string),
        };

        self.store.set(keys::LOGGED_IN, "true");
        match user_id {
            Some(uid) => self.store.set(keys::USER_ID, uid),
            None => self.store.remove(keys::USER_ID),
        }
        match email {
            Some(email) => self.store.set(keys::CURRENT_USER, email),
            None => self.store.remove(keys::CURRENT_USER),
        }

        tracing::info!(
            email = email.unwrap_or("<none>"),
            remote = user_id.is_some(),
            "Signed in"
        );
    }

    /// Verify a Google ID token and sign its account in.
    pub async fn sign_in_with_google(&mut self, id_token: &str) -> Result<AuthUser> {
        let user = self.identity.verify_id_token(id_token).await?;
        self.login(Some(&user.subject), Some(&user.email));
        Ok(user)
    }

    /// Sign out: best-effort remote invalidation, then local cleanup.
    ///
    /// Remote sign-out failures are swallowed by the identity service and
    /// never block clearing the session entries.
    pub async fn logout(&mut self) {
        self.identity.sign_out().await;

        for key in [
            keys::LOGGED_IN,
            keys::CURRENT_USER,
            keys::USER_ID,
            keys::API_KEY,
        ] {
            self.store.remove(key);
        }

        self.session = Session::default();
        tracing::info!("Signed out");
    }

    // ─── Local-Mode Accounts ─────────────────────────────────────

    /// Register a local-mode account.
    ///
    /// Fails if the email is malformed or already registered
    /// (case-sensitive exact match on the record id).
    pub fn register_local(&self, email: &str, password: &str) -> Result<()> {
        if !email.validate_email() {
            return Err(AppError::InvalidEmail(email.to_string()));
        }

        let mut users = self.load_local_users();
        if users.iter().any(|u| u.id == email) {
            return Err(AppError::DuplicateEmail);
        }

        let password_hash = bcrypt::hash(password, bcrypt::DEFAULT_COST)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("bcrypt hash failed: {}", e)))?;

        users.push(LocalCredential {
            id: email.to_string(),
            password_hash,
        });
        self.save_local_users(&users);

        tracing::info!(email, "Registered local account");
        Ok(())
    }

    /// Sign in to a local-mode account.
    pub fn login_local(&mut self, email: &str, password: &str) -> Result<()> {
        let users = self.load_local_users();
        let user = users
            .iter()
            .find(|u| u.id == email)
            .ok_or(AppError::InvalidCredentials)?;

        let matches = bcrypt::verify(password, &user.password_hash)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("bcrypt verify failed: {}", e)))?;
        if !matches {
            return Err(AppError::InvalidCredentials);
        }

        self.login(None, Some(email));
        Ok(())
    }

    // ─── Movie-Catalog Credential ────────────────────────────────

    /// Store the movie-catalog API credential in its dedicated slot.
    ///
    /// This slot is never written implicitly (in particular, never from a
    /// password) and is cleared on sign-out.
    pub fn set_api_key(&self, api_key: &str) {
        self.store.set(keys::API_KEY, api_key);
    }

    pub fn api_key(&self) -> Option<String> {
        self.store.get(keys::API_KEY)
    }

    fn load_local_users(&self) -> Vec<LocalCredential> {
        let Some(raw) = self.store.get(keys::LOCAL_USERS) else {
            return Vec::new();
        };

        match serde_json::from_str(&raw) {
            Ok(users) => users,
            Err(e) => {
                tracing::warn!(error = %e, "Credential records are corrupt, starting empty");
                Vec::new()
            }
        }
    }

    fn save_local_users(&self, users: &[LocalCredential]) {
        match serde_json::to_string(users) {
            Ok(raw) => self.store.set(keys::LOCAL_USERS, &raw),
            Err(e) => tracing::error!(error = %e, "Failed to serialize credential records"),
        }
    }
}

/// Derived owner key for accounts with no identity-provider subject.
pub fn local_owner_key(email: &str) -> String {
    format!("local_{}", URL_SAFE_NO_PAD.encode(email.as_bytes()))
}

fn restore_session(store: &dyn KvStore) -> Session {
    if store.get(keys::LOGGED_IN).as_deref() == Some("true") {
        Session {
            is_logged_in: true,
            user_email: store.get(keys::CURRENT_USER),
            user_id: store.get(keys::USER_ID),
        }
    } else {
        Session::default()
    }
}
