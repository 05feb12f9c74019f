// SPDX-License-Identifier: MIT

use std::sync::Arc;

use myflix_sync::config::Config;
use myflix_sync::db::{FirestoreDb, KvStore, MemoryStore};
use myflix_sync::models::MovieSummary;
use myflix_sync::services::{GoogleIdentity, ProfileManager, SessionManager, WishlistService};

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Initialize test logging once; later calls are no-ops.
#[allow(dead_code)]
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Fresh in-memory local store.
#[allow(dead_code)]
pub fn memory_store() -> Arc<dyn KvStore> {
    Arc::new(MemoryStore::new())
}

/// Identity verifier that never leaves the process (nothing signed in).
#[allow(dead_code)]
pub fn test_identity() -> Arc<GoogleIdentity> {
    Arc::new(GoogleIdentity::new(&Config::default()).expect("identity verifier should build"))
}

/// Session manager over `store` with offline identity.
#[allow(dead_code)]
pub fn session(store: &Arc<dyn KvStore>) -> SessionManager {
    SessionManager::new(store.clone(), test_identity())
}

/// Profile manager over `store`.
#[allow(dead_code)]
pub fn profiles(store: &Arc<dyn KvStore>) -> ProfileManager {
    ProfileManager::new(store.clone())
}

/// Wishlist service over `store` with an offline (mock) Firestore.
#[allow(dead_code)]
pub fn wishlist(store: &Arc<dyn KvStore>) -> WishlistService {
    WishlistService::new(FirestoreDb::new_mock(), store.clone())
}

/// Create a test database connection (emulator).
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Fully wired app over `store`, offline Firestore, offline identity.
#[allow(dead_code)]
pub fn app_over(store: Arc<dyn KvStore>) -> myflix_sync::App {
    myflix_sync::App::with_parts(
        Config::default(),
        store,
        FirestoreDb::new_mock(),
        test_identity(),
    )
}

/// A movie summary with recognizable fields.
#[allow(dead_code)]
pub fn movie(id: u64) -> MovieSummary {
    MovieSummary {
        id,
        title: format!("Movie {id}"),
        poster_path: format!("/poster_{id}.jpg"),
        vote_average: 7.5,
        release_date: "2024-01-15".to_string(),
        overview: "A test movie.".to_string(),
    }
}
