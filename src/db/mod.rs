// SPDX-License-Identifier: MIT

//! Storage layer: synchronous local key-value store and Firestore.

pub mod firestore;
pub mod local;

pub use self::firestore::{FirestoreDb, WishlistWatch};
pub use self::local::{FileStore, KvStore, MemoryStore};

/// Firestore collection names as constants.
///
/// Wishlist documents live at
/// `users/{subject}/profiles/{profile}/wishlist/{movie_id}`.
pub mod collections {
    pub const USERS: &str = "users";
    pub const PROFILES: &str = "profiles";
    pub const WISHLIST: &str = "wishlist";
}

/// Local-store key templates.
///
/// Session entries are fixed keys kept consistent as a set; per-owner and
/// per-scope entries embed the owner key and/or profile id.
pub mod keys {
    /// Session logged-in flag ("true" when signed in)
    pub const LOGGED_IN: &str = "myflix_logged_in";
    /// Display email of the signed-in account
    pub const CURRENT_USER: &str = "myflix_current_user";
    /// Identity-provider subject id; absent for local-mode sessions
    pub const USER_ID: &str = "myflix_uid";
    /// Movie-catalog API credential slot (never a password)
    pub const API_KEY: &str = "myflix_api_key";
    /// Local-mode credential records (JSON array)
    pub const LOCAL_USERS: &str = "myflix_users";

    /// Profile list for one owner (JSON array).
    pub fn profiles(owner: &str) -> String {
        format!("myflix_profiles_{owner}")
    }

    /// Active profile id for one owner.
    pub fn active_profile(owner: &str) -> String {
        format!("myflix_active_profile_{owner}")
    }

    /// Wishlist for one (owner, profile) scope (JSON array).
    pub fn wishlist(owner: &str, profile_id: &str) -> String {
        format!("myflix_wishlist_{owner}_{profile_id}")
    }
}
