// SPDX-License-Identifier: MIT

//! Myflix Sync: account, profile, and wishlist state for a movie
//! watchlist application.
//!
//! This crate is the persistence layer between an embedding UI and two
//! managed services: Google sign-in for identity and Firestore for
//! real-time wishlist sync, with a local key-value store backing
//! local-mode accounts and offline data.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;

use std::sync::Arc;

use config::Config;
use db::{FileStore, FirestoreDb, KvStore};
use error::Result;
use models::{AuthUser, MovieSummary, Profile, ProfilePatch};
use services::{GoogleIdentity, ProfileManager, SessionManager, WishlistService};

/// Composition root: the three state managers wired over shared stores.
///
/// Created at app start, dropped at shutdown. Scope propagation is
/// explicit: every operation that can change the owner key or the active
/// profile re-selects the dependent scopes afterwards, which is what the
/// browser original got from reactive re-render.
pub struct App {
    pub config: Config,
    pub session: SessionManager,
    pub profiles: ProfileManager,
    pub wishlist: WishlistService,
}

impl App {
    /// Build the full stack: file-backed local store, Firestore client,
    /// Google identity verifier.
    pub async fn new(config: Config) -> Result<Self> {
        let store: Arc<dyn KvStore> =
            Arc::new(FileStore::open(config.data_dir.join("myflix.json"))?);
        let db = FirestoreDb::new(&config.gcp_project_id).await?;
        let identity = Arc::new(GoogleIdentity::new(&config)?);

        Ok(Self::assemble(config, store, db, identity))
    }

    /// Build against injected parts (tests and embedding hosts).
    pub fn with_parts(
        config: Config,
        store: Arc<dyn KvStore>,
        db: FirestoreDb,
        identity: Arc<GoogleIdentity>,
    ) -> Self {
        Self::assemble(config, store, db, identity)
    }

    fn assemble(
        config: Config,
        store: Arc<dyn KvStore>,
        db: FirestoreDb,
        identity: Arc<GoogleIdentity>,
    ) -> Self {
        let session = SessionManager::new(store.clone(), identity);
        let profiles = ProfileManager::new(store.clone());
        let wishlist = WishlistService::new(db, store);

        let mut app = Self {
            config,
            session,
            profiles,
            wishlist,
        };
        app.refresh();
        app
    }

    /// Recompute the owner key and re-select profile and wishlist scopes.
    pub fn refresh(&mut self) {
        let owner = self.session.owner_key();
        self.profiles.select_owner(owner.as_deref());
        self.wishlist.select_scope(
            self.session.user_id(),
            owner.as_deref(),
            self.profiles.active_profile_id(),
        );
    }

    /// Re-select only the wishlist scope (active-profile changes).
    fn refresh_wishlist(&mut self) {
        let owner = self.session.owner_key();
        self.wishlist.select_scope(
            self.session.user_id(),
            owner.as_deref(),
            self.profiles.active_profile_id(),
        );
    }

    // ─── Session Operations ──────────────────────────────────────

    /// Register a local-mode account; does not sign in.
    pub fn register_local(&self, email: &str, password: &str) -> Result<()> {
        self.session.register_local(email, password)
    }

    /// Sign in to a local-mode account and re-scope.
    pub fn login_local(&mut self, email: &str, password: &str) -> Result<()> {
        self.session.login_local(email, password)?;
        self.refresh();
        Ok(())
    }

    /// Verify a Google ID token, sign its account in, and re-scope.
    pub async fn sign_in_with_google(&mut self, id_token: &str) -> Result<AuthUser> {
        let user = self.session.sign_in_with_google(id_token).await?;
        self.refresh();
        Ok(user)
    }

    /// Sign out and re-scope to the signed-out namespace.
    pub async fn logout(&mut self) {
        self.session.logout().await;
        self.refresh();
    }

    // ─── Profile Operations ──────────────────────────────────────

    pub fn add_profile(&mut self, name: &str, color: &str, icon: &str) -> Result<Profile> {
        self.profiles.add_profile(name, color, icon)
    }

    pub fn update_profile(&mut self, id: &str, patch: &ProfilePatch) {
        self.profiles.update_profile(id, patch);
    }

    /// Delete a profile; the wishlist follows the new active profile.
    pub fn delete_profile(&mut self, id: &str) {
        self.profiles.delete_profile(id);
        self.refresh_wishlist();
    }

    /// Switch the active profile; the wishlist follows.
    pub fn set_active_profile(&mut self, id: &str) {
        self.profiles.set_active_profile(id);
        self.refresh_wishlist();
    }

    // ─── Wishlist Operations ─────────────────────────────────────

    pub async fn toggle_wishlist(&self, movie: &MovieSummary) {
        self.wishlist.toggle(movie).await;
    }

    pub fn is_in_wishlist(&self, id: u64) -> bool {
        self.wishlist.is_in_wishlist(id)
    }
}
