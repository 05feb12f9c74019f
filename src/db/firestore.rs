// SPDX-License-Identifier: MIT

//! Firestore client wrapper with typed wishlist operations.
//!
//! Wishlist documents are stored per (account, profile) scope at
//! `users/{subject}/profiles/{profile}/wishlist/{movie_id}` and observed
//! through a listen target that delivers full snapshots, newest first, to
//! an `apply` callback.

use std::sync::Arc;

use dashmap::DashMap;
// Wide import on purpose: the fluent/listen API spans many builder and
// support traits. The local `FirestoreDb` wrapper shadows the client type,
// which stays reachable as `firestore::FirestoreDb`.
use firestore::*;
use tokio::sync::oneshot;

use crate::db::collections;
use crate::error::{AppError, Result};
use crate::models::{MovieSummary, WishlistDoc};

/// Listen target id for wishlist subscriptions.
const WISHLIST_TARGET_ID: u32 = 17;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        // ExternalJwtFunctionSource provides a dummy token without needing a
        // custom TokenSource implementation struct.
        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── Wishlist Operations ─────────────────────────────────────

    /// Create or overwrite one wishlist document.
    pub async fn set_wishlist_doc(
        &self,
        owner: &str,
        profile_id: &str,
        doc: &WishlistDoc,
    ) -> Result<()> {
        let client = self.get_client()?;
        let parent_path = client
            .parent_path(collections::USERS, owner)
            .and_then(|p| p.at(collections::PROFILES, profile_id))
            .map_err(|e| AppError::Database(e.to_string()))?;

        let _: () = client
            .fluent()
            .update()
            .in_col(collections::WISHLIST)
            .document_id(doc.id.to_string())
            .parent(&parent_path)
            .object(doc)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Delete one wishlist document.
    pub async fn delete_wishlist_doc(
        &self,
        owner: &str,
        profile_id: &str,
        movie_id: u64,
    ) -> Result<()> {
        let client = self.get_client()?;
        let parent_path = client
            .parent_path(collections::USERS, owner)
            .and_then(|p| p.at(collections::PROFILES, profile_id))
            .map_err(|e| AppError::Database(e.to_string()))?;

        client
            .fluent()
            .delete()
            .from(collections::WISHLIST)
            .parent(&parent_path)
            .document_id(movie_id.to_string())
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Fetch the wishlist for one scope, newest first.
    pub async fn query_wishlist(&self, owner: &str, profile_id: &str) -> Result<Vec<WishlistDoc>> {
        let client = self.get_client()?;
        let parent_path = client
            .parent_path(collections::USERS, owner)
            .and_then(|p| p.at(collections::PROFILES, profile_id))
            .map_err(|e| AppError::Database(e.to_string()))?;

        client
            .fluent()
            .select()
            .from(collections::WISHLIST)
            .parent(&parent_path)
            .order_by([("created_at", FirestoreQueryDirection::Descending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Wishlist Subscription ───────────────────────────────────

    /// Watch one wishlist scope.
    ///
    /// Every change (including the initial backfill) rebuilds the full
    /// snapshot, newest first, and hands it to `apply`. If the watch cannot
    /// be established or dies, the failure is logged and `apply` receives an
    /// empty snapshot; nothing is surfaced to the caller.
    pub fn watch_wishlist(
        &self,
        owner: &str,
        profile_id: &str,
        apply: impl Fn(Vec<MovieSummary>) + Send + Sync + 'static,
    ) -> WishlistWatch {
        let db = self.clone();
        let owner = owner.to_string();
        let profile_id = profile_id.to_string();
        let apply: Arc<dyn Fn(Vec<MovieSummary>) + Send + Sync> = Arc::new(apply);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let handle = tokio::spawn(async move {
            if let Err(e) = db
                .run_wishlist_watch(&owner, &profile_id, apply.clone(), shutdown_rx)
                .await
            {
                tracing::error!(
                    error = %e,
                    owner = %owner,
                    profile_id = %profile_id,
                    "Wishlist watch failed"
                );
                apply(Vec::new());
            }
        });

        WishlistWatch {
            shutdown: Some(shutdown_tx),
            handle,
        }
    }

    async fn run_wishlist_watch(
        &self,
        owner: &str,
        profile_id: &str,
        apply: Arc<dyn Fn(Vec<MovieSummary>) + Send + Sync>,
        shutdown: oneshot::Receiver<()>,
    ) -> Result<()> {
        let client = self.get_client()?;
        let parent_path = client
            .parent_path(collections::USERS, owner)
            .and_then(|p| p.at(collections::PROFILES, profile_id))
            .map_err(|e| AppError::Database(e.to_string()))?;

        let mut listener = client
            .create_listener(FirestoreTempFilesListenStateStorage::new())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        client
            .fluent()
            .select()
            .from(collections::WISHLIST)
            .parent(&parent_path)
            .listen()
            .add_target(FirestoreListenerTarget::new(WISHLIST_TARGET_ID), &mut listener)
            .map_err(|e| AppError::Database(e.to_string()))?;

        // The listener delivers per-document deltas; the scope's document
        // set is kept here and re-published as a full snapshot on every
        // event, so the most recent snapshot always wins.
        let docs: Arc<DashMap<u64, WishlistDoc>> = Arc::new(DashMap::new());

        let handler_docs = docs.clone();
        let handler_apply = apply.clone();
        listener
            .start(move |event| {
                let docs = handler_docs.clone();
                let apply = handler_apply.clone();
                async move {
                    match event {
                        FirestoreListenEvent::DocumentChange(change) => {
                            if let Some(doc) = &change.document {
                                match firestore::FirestoreDb::deserialize_doc_to::<WishlistDoc>(doc)
                                {
                                    Ok(entry) => {
                                        docs.insert(entry.id, entry);
                                        apply(snapshot(&docs));
                                    }
                                    Err(e) => {
                                        tracing::warn!(
                                            error = %e,
                                            "Skipping malformed wishlist document"
                                        );
                                    }
                                }
                            }
                        }
                        FirestoreListenEvent::DocumentDelete(deleted) => {
                            if let Some(id) = movie_id_from_path(&deleted.document) {
                                docs.remove(&id);
                                apply(snapshot(&docs));
                            }
                        }
                        FirestoreListenEvent::DocumentRemove(removed) => {
                            if let Some(id) = movie_id_from_path(&removed.document) {
                                docs.remove(&id);
                                apply(snapshot(&docs));
                            }
                        }
                        _ => {}
                    }
                    Ok(())
                }
            })
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        tracing::debug!(owner, profile_id, "Wishlist watch established");

        // Hold the listener open until the scope is torn down.
        let _ = shutdown.await;

        listener
            .shutdown()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        tracing::debug!(owner, profile_id, "Wishlist watch shut down");
        Ok(())
    }
}

/// Handle to a live wishlist watch.
pub struct WishlistWatch {
    shutdown: Option<oneshot::Sender<()>>,
    handle: tokio::task::JoinHandle<()>,
}

impl WishlistWatch {
    /// Tear the watch down.
    ///
    /// Returns immediately; the listener finishes shutting down in the
    /// background. Callers fence stale snapshot delivery separately, so a
    /// watch that is slow to die can never publish into a changed scope.
    pub fn stop(mut self) {
        let delivered = self
            .shutdown
            .take()
            .map(|tx| tx.send(()).is_ok())
            .unwrap_or(false);

        // Listener task already gone (or never started); nothing to wait for.
        if !delivered {
            self.handle.abort();
        }
    }
}

/// Rebuild the snapshot for one scope, newest first.
fn snapshot(docs: &DashMap<u64, WishlistDoc>) -> Vec<MovieSummary> {
    let mut entries: Vec<WishlistDoc> = docs.iter().map(|e| e.value().clone()).collect();
    entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    entries.into_iter().map(WishlistDoc::into_summary).collect()
}

/// Extract the movie id from a full document resource name.
fn movie_id_from_path(path: &str) -> Option<u64> {
    path.rsplit('/').next()?.parse().ok()
}
