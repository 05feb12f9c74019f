// SPDX-License-Identifier: MIT

//! Wishlist tests: toggle semantics, scope isolation, mode selection.

use myflix_sync::db::keys;
use myflix_sync::services::WishlistMode;

mod common;
use common::{memory_store, movie, wishlist};

#[tokio::test]
async fn toggle_inserts_then_removes() {
    let store = memory_store();
    let mut list = wishlist(&store);
    list.select_scope(None, Some("owner-1"), Some("p_default"));

    assert!(!list.is_in_wishlist(5));

    list.toggle(&movie(5)).await;
    assert!(list.is_in_wishlist(5));
    assert_eq!(list.entries().len(), 1);

    // Toggling again restores the original membership.
    list.toggle(&movie(5)).await;
    assert!(!list.is_in_wishlist(5));
    assert!(list.entries().is_empty());
}

#[tokio::test]
async fn local_mode_persists_to_the_scope_key() {
    let store = memory_store();
    let mut list = wishlist(&store);
    list.select_scope(None, Some("owner-1"), Some("p_default"));

    list.toggle(&movie(5)).await;
    list.toggle(&movie(9)).await;

    let raw = store
        .get(&keys::wishlist("owner-1", "p_default"))
        .expect("wishlist persisted under its scope key");
    assert!(raw.contains("\"id\":5") || raw.contains("\"id\": 5"));

    // A fresh service over the same store sees the persisted entries.
    let mut reloaded = wishlist(&store);
    reloaded.select_scope(None, Some("owner-1"), Some("p_default"));
    assert!(reloaded.is_in_wishlist(5));
    assert!(reloaded.is_in_wishlist(9));
}

#[tokio::test]
async fn switching_profile_never_leaks_entries() {
    let store = memory_store();
    let mut list = wishlist(&store);

    list.select_scope(None, Some("owner-1"), Some("p_default"));
    list.toggle(&movie(5)).await;

    list.select_scope(None, Some("owner-1"), Some("p_kids"));
    assert!(!list.is_in_wishlist(5), "new scope starts clean");
    assert!(list.entries().is_empty());

    list.toggle(&movie(7)).await;

    list.select_scope(None, Some("owner-1"), Some("p_default"));
    assert!(list.is_in_wishlist(5));
    assert!(!list.is_in_wishlist(7));
}

#[tokio::test]
async fn switching_owner_never_leaks_entries() {
    let store = memory_store();
    let mut list = wishlist(&store);

    // Both owners use the same (default) profile id; the scope key keeps
    // their wishlists apart anyway.
    list.select_scope(None, Some("owner-1"), Some("p_default"));
    list.toggle(&movie(5)).await;

    list.select_scope(None, Some("owner-2"), Some("p_default"));
    assert!(!list.is_in_wishlist(5));
    assert!(list.entries().is_empty());
}

#[tokio::test]
async fn unscoped_local_mode_stays_in_memory() {
    let store = memory_store();
    let mut list = wishlist(&store);
    list.select_scope(None, None, None);

    list.toggle(&movie(5)).await;
    assert!(list.is_in_wishlist(5));

    // Nothing was persisted: a rescoped service sees nothing.
    let mut reloaded = wishlist(&store);
    reloaded.select_scope(None, Some("owner-1"), Some("p_default"));
    assert!(!reloaded.is_in_wishlist(5));
}

#[tokio::test]
async fn corrupt_stored_wishlist_degrades_to_empty() {
    let store = memory_store();
    store.set(&keys::wishlist("owner-1", "p_default"), "[{broken");

    let mut list = wishlist(&store);
    list.select_scope(None, Some("owner-1"), Some("p_default"));

    assert!(list.entries().is_empty());

    // The scope is writable again after the corrupt value is replaced.
    list.toggle(&movie(5)).await;
    assert!(list.is_in_wishlist(5));
}

#[tokio::test]
async fn remote_mode_requires_subject_and_profile() {
    let store = memory_store();
    let mut list = wishlist(&store);

    list.select_scope(None, Some("owner-1"), Some("p_default"));
    assert_eq!(list.mode(), WishlistMode::Local);

    list.select_scope(Some("uid-1"), Some("uid-1"), None);
    assert_eq!(list.mode(), WishlistMode::Local, "no active profile, no remote mode");

    list.select_scope(Some("uid-1"), Some("uid-1"), Some("p_default"));
    assert_eq!(list.mode(), WishlistMode::Remote);
}

#[tokio::test]
async fn failed_subscription_leaves_an_empty_list() {
    let store = memory_store();
    let mut list = wishlist(&store);

    // Seed a local scope, then switch to remote mode against the offline
    // mock: the watch fails, and the previous scope's entries must not
    // survive the switch.
    list.select_scope(None, Some("owner-1"), Some("p_default"));
    list.toggle(&movie(5)).await;

    list.select_scope(Some("uid-1"), Some("uid-1"), Some("p_default"));
    assert_eq!(list.mode(), WishlistMode::Remote);

    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    assert!(list.entries().is_empty());
    assert!(!list.is_in_wishlist(5));
}

#[tokio::test]
async fn remote_write_failures_are_swallowed() {
    let store = memory_store();
    let mut list = wishlist(&store);
    list.select_scope(Some("uid-1"), Some("uid-1"), Some("p_default"));

    // The offline mock rejects the write; the toggle neither panics nor
    // mutates the snapshot (only the subscription may do that).
    list.toggle(&movie(5)).await;
    assert!(!list.is_in_wishlist(5));
}

#[tokio::test]
async fn switching_back_to_local_reloads_the_scope() {
    let store = memory_store();
    let mut list = wishlist(&store);

    list.select_scope(None, Some("owner-1"), Some("p_default"));
    list.toggle(&movie(5)).await;

    list.select_scope(Some("uid-1"), Some("uid-1"), Some("p_default"));
    list.select_scope(None, Some("owner-1"), Some("p_default"));

    assert_eq!(list.mode(), WishlistMode::Local);
    assert!(list.is_in_wishlist(5));
}
