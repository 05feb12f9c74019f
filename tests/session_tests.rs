// SPDX-License-Identifier: MIT

//! Session tests: local-mode accounts, persistence, owner-key derivation.

use myflix_sync::db::keys;
use myflix_sync::error::AppError;

mod common;
use common::{memory_store, session};

#[test]
fn register_then_duplicate_fails() {
    let store = memory_store();
    let auth = session(&store);

    auth.register_local("a@x.com", "k1").expect("first registration succeeds");

    let err = auth.register_local("a@x.com", "k2").unwrap_err();
    assert!(matches!(err, AppError::DuplicateEmail));
}

#[test]
fn register_rejects_malformed_email() {
    let store = memory_store();
    let auth = session(&store);

    let err = auth.register_local("not-an-email", "pw").unwrap_err();
    assert!(matches!(err, AppError::InvalidEmail(_)));
}

#[test]
fn login_local_requires_exact_credentials() {
    let store = memory_store();
    let mut auth = session(&store);

    auth.register_local("a@x.com", "k1").unwrap();

    let err = auth.login_local("a@x.com", "wrong").unwrap_err();
    assert!(matches!(err, AppError::InvalidCredentials));
    assert!(!auth.is_logged_in());

    let err = auth.login_local("b@x.com", "k1").unwrap_err();
    assert!(matches!(err, AppError::InvalidCredentials));

    auth.login_local("a@x.com", "k1").expect("correct credentials sign in");
    assert!(auth.is_logged_in());
    assert_eq!(auth.user_email(), Some("a@x.com"));
    assert_eq!(auth.user_id(), None);
}

#[test]
fn login_persists_session_entries_as_a_set() {
    let store = memory_store();
    let mut auth = session(&store);

    auth.login(Some("uid-123"), Some("a@x.com"));

    assert_eq!(store.get(keys::LOGGED_IN).as_deref(), Some("true"));
    assert_eq!(store.get(keys::CURRENT_USER).as_deref(), Some("a@x.com"));
    assert_eq!(store.get(keys::USER_ID).as_deref(), Some("uid-123"));

    // A local-mode login clears the stored subject id.
    auth.login(None, Some("a@x.com"));
    assert_eq!(store.get(keys::USER_ID), None);
    assert_eq!(store.get(keys::LOGGED_IN).as_deref(), Some("true"));
}

#[test]
fn session_restores_from_store() {
    let store = memory_store();

    {
        let mut auth = session(&store);
        auth.login(Some("uid-123"), Some("a@x.com"));
    }

    let restored = session(&store);
    assert!(restored.is_logged_in());
    assert_eq!(restored.user_email(), Some("a@x.com"));
    assert_eq!(restored.user_id(), Some("uid-123"));

    let fresh = session(&memory_store());
    assert!(!fresh.is_logged_in());
}

#[tokio::test]
async fn logout_clears_all_session_entries() {
    let store = memory_store();
    let mut auth = session(&store);

    auth.login(Some("uid-123"), Some("a@x.com"));
    auth.set_api_key("catalog-key");

    auth.logout().await;

    assert!(!auth.is_logged_in());
    assert_eq!(auth.user_email(), None);
    assert_eq!(auth.user_id(), None);
    for key in [
        keys::LOGGED_IN,
        keys::CURRENT_USER,
        keys::USER_ID,
        keys::API_KEY,
    ] {
        assert_eq!(store.get(key), None, "{key} should be cleared");
    }
}

#[test]
fn owner_key_prefers_subject_id() {
    let store = memory_store();
    let mut auth = session(&store);

    assert_eq!(auth.owner_key(), None);

    auth.login(None, Some("a@x.com"));
    let local_key = auth.owner_key().expect("local sessions have a derived key");
    assert!(local_key.starts_with("local_"));

    auth.login(Some("uid-123"), Some("a@x.com"));
    assert_eq!(auth.owner_key().as_deref(), Some("uid-123"));
}

#[test]
fn api_key_slot_is_never_populated_by_login() {
    let store = memory_store();
    let mut auth = session(&store);

    auth.register_local("a@x.com", "secret-pw").unwrap();
    auth.login_local("a@x.com", "secret-pw").unwrap();

    // The catalog credential slot stays empty until set explicitly, and
    // a password never lands in it.
    assert_eq!(auth.api_key(), None);

    auth.set_api_key("catalog-key");
    assert_eq!(auth.api_key().as_deref(), Some("catalog-key"));
}

#[test]
fn passwords_are_stored_hashed() {
    let store = memory_store();
    let auth = session(&store);

    auth.register_local("a@x.com", "secret-pw").unwrap();

    let raw = store.get(keys::LOCAL_USERS).expect("credentials persisted");
    assert!(!raw.contains("secret-pw"), "password must not be stored in cleartext");
}

#[test]
fn corrupt_credentials_degrade_to_empty() {
    let store = memory_store();
    store.set(keys::LOCAL_USERS, "{not json");

    let mut auth = session(&store);
    let err = auth.login_local("a@x.com", "pw").unwrap_err();
    assert!(matches!(err, AppError::InvalidCredentials));

    // Registration starts a fresh record set over the corrupt value.
    auth.register_local("a@x.com", "pw").unwrap();
    auth.login_local("a@x.com", "pw").unwrap();
}
