// SPDX-License-Identifier: MIT

//! File-backed local store tests.

use myflix_sync::db::{FileStore, KvStore};

mod common;

#[test]
fn file_store_roundtrip_and_reopen() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("store.json");

    {
        let store = FileStore::open(&path).expect("open");
        store.set("alpha", "1");
        store.set("beta", "2");
        store.remove("alpha");
    }

    let reopened = FileStore::open(&path).expect("reopen");
    assert_eq!(reopened.get("alpha"), None);
    assert_eq!(reopened.get("beta"), Some("2".to_string()));
}

#[test]
fn file_store_creates_missing_directories() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("nested/deeper/store.json");

    let store = FileStore::open(&path).expect("open creates parents");
    store.set("k", "v");

    assert!(path.exists());
}

#[test]
fn corrupt_store_file_starts_empty() {
    common::init_tracing();

    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("store.json");
    std::fs::write(&path, "{definitely not json").expect("write garbage");

    let store = FileStore::open(&path).expect("corrupt file is not fatal");
    assert_eq!(store.get("k"), None);

    // The store is usable and durable again after the first write.
    store.set("k", "v");
    let reopened = FileStore::open(&path).expect("reopen");
    assert_eq!(reopened.get("k"), Some("v".to_string()));
}

#[test]
fn remove_of_absent_key_is_a_no_op() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("store.json");

    let store = FileStore::open(&path).expect("open");
    store.remove("missing");
    assert_eq!(store.get("missing"), None);
}
