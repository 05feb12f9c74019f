// SPDX-License-Identifier: MIT

//! Dual-mode wishlist state.
//!
//! A wishlist is scoped to one (owner, active profile) pair and backed by
//! exactly one of two strategies: a Firestore subscription when a remote
//! identity and an active profile are both present, or the local store
//! otherwise. The scope is recomputed by the composition root whenever
//! session or profile state changes.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use crate::db::{keys, FirestoreDb, KvStore, WishlistWatch};
use crate::models::{MovieSummary, WishlistDoc};

/// Which persistence strategy is live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WishlistMode {
    Remote,
    Local,
}

/// The storage strategy backing the current scope.
///
/// The two variants share one interface: established on scope selection,
/// mutated through `toggle`, queried through the in-memory snapshot.
enum Backend {
    /// Firestore subscription for (subject, profile).
    Remote {
        subject: String,
        profile_id: String,
        watch: WishlistWatch,
    },
    /// Local-store array under one scope key; `None` (no owner/profile
    /// selected) keeps mutations in memory only.
    Local { key: Option<String> },
}

/// Wishlist snapshot and mode selection.
pub struct WishlistService {
    db: FirestoreDb,
    store: Arc<dyn KvStore>,
    entries: Arc<RwLock<Vec<MovieSummary>>>,
    /// Scope generation; bumped on every scope change to fence off
    /// snapshots from torn-down subscriptions.
    generation: Arc<AtomicU64>,
    backend: Backend,
}

impl WishlistService {
    /// Create an unscoped service (local mode, in-memory only).
    pub fn new(db: FirestoreDb, store: Arc<dyn KvStore>) -> Self {
        Self {
            db,
            store,
            entries: Arc::new(RwLock::new(Vec::new())),
            generation: Arc::new(AtomicU64::new(0)),
            backend: Backend::Local { key: None },
        }
    }

    pub fn mode(&self) -> WishlistMode {
        match self.backend {
            Backend::Remote { .. } => WishlistMode::Remote,
            Backend::Local { .. } => WishlistMode::Local,
        }
    }

    /// Current snapshot (newest first in remote mode).
    pub fn entries(&self) -> Vec<MovieSummary> {
        match self.entries.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Synchronous membership test against the in-memory snapshot.
    pub fn is_in_wishlist(&self, id: u64) -> bool {
        match self.entries.read() {
            Ok(guard) => guard.iter().any(|m| m.id == id),
            Err(poisoned) => poisoned.into_inner().iter().any(|m| m.id == id),
        }
    }

    /// Recompute mode and scope from the current session/profile inputs.
    ///
    /// Remote mode requires both a subject id and an active profile. Any
    /// live subscription is torn down before the new scope is established;
    /// the generation fence guarantees a slow-dying watch can never
    /// publish into the new scope.
    pub fn select_scope(
        &mut self,
        subject: Option<&str>,
        owner_key: Option<&str>,
        profile_id: Option<&str>,
    ) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let previous = std::mem::replace(&mut self.backend, Backend::Local { key: None });
        if let Backend::Remote { watch, .. } = previous {
            watch.stop();
        }

        match (subject, profile_id) {
            (Some(subject), Some(profile_id)) => {
                // The subscription backfills the snapshot; start empty so
                // nothing from the previous scope stays visible.
                self.set_entries(Vec::new());

                let watch = self.spawn_watch(subject, profile_id, generation);
                self.backend = Backend::Remote {
                    subject: subject.to_string(),
                    profile_id: profile_id.to_string(),
                    watch,
                };
                tracing::debug!(subject, profile_id, "Wishlist in remote mode");
            }
            _ => {
                let key = match (owner_key, profile_id) {
                    (Some(owner), Some(profile_id)) => Some(keys::wishlist(owner, profile_id)),
                    _ => None,
                };

                let entries = match key.as_deref() {
                    Some(key) => self.load_local(key),
                    None => Vec::new(),
                };
                self.set_entries(entries);

                tracing::debug!(
                    key = key.as_deref().unwrap_or("<unscoped>"),
                    "Wishlist in local mode"
                );
                self.backend = Backend::Local { key };
            }
        }
    }

    /// Toggle membership for `movie`: absent inserts, present removes.
    ///
    /// Remote writes are fire-and-forget: failures are logged, never
    /// surfaced, never retried, and the subscription applies the outcome.
    /// Local mutations are applied in memory and persisted to the scope
    /// key (when one is selected).
    pub async fn toggle(&self, movie: &MovieSummary) {
        match &self.backend {
            Backend::Remote {
                subject,
                profile_id,
                ..
            } => {
                let result = if self.is_in_wishlist(movie.id) {
                    self.db
                        .delete_wishlist_doc(subject, profile_id, movie.id)
                        .await
                } else {
                    self.db
                        .set_wishlist_doc(subject, profile_id, &WishlistDoc::new(movie.clone()))
                        .await
                };

                if let Err(e) = result {
                    tracing::error!(
                        error = %e,
                        subject = %subject,
                        profile_id = %profile_id,
                        movie_id = movie.id,
                        "Wishlist toggle failed"
                    );
                }
            }
            Backend::Local { key } => {
                let mut entries = self.entries();
                match entries.iter().position(|m| m.id == movie.id) {
                    Some(pos) => {
                        entries.remove(pos);
                    }
                    None => entries.push(movie.clone()),
                }

                if let Some(key) = key {
                    persist_local(self.store.as_ref(), key, &entries);
                }
                self.set_entries(entries);
            }
        }
    }

    fn spawn_watch(&self, subject: &str, profile_id: &str, generation: u64) -> WishlistWatch {
        let entries = self.entries.clone();
        let current = self.generation.clone();

        self.db.watch_wishlist(subject, profile_id, move |snapshot| {
            if current.load(Ordering::SeqCst) != generation {
                return;
            }
            match entries.write() {
                Ok(mut guard) => *guard = snapshot,
                Err(poisoned) => *poisoned.into_inner() = snapshot,
            }
        })
    }

    fn set_entries(&self, entries: Vec<MovieSummary>) {
        match self.entries.write() {
            Ok(mut guard) => *guard = entries,
            Err(poisoned) => *poisoned.into_inner() = entries,
        }
    }

    fn load_local(&self, key: &str) -> Vec<MovieSummary> {
        let Some(raw) = self.store.get(key) else {
            return Vec::new();
        };

        match serde_json::from_str(&raw) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(key, error = %e, "Stored wishlist is corrupt, starting empty");
                Vec::new()
            }
        }
    }
}

fn persist_local(store: &dyn KvStore, key: &str, entries: &[MovieSummary]) {
    match serde_json::to_string(entries) {
        Ok(raw) => store.set(key, &raw),
        Err(e) => tracing::error!(key, error = %e, "Failed to serialize wishlist"),
    }
}
