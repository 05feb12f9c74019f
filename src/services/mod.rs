// SPDX-License-Identifier: MIT

//! Services module - session, profile, and wishlist state.

pub mod google_identity;
pub mod profile;
pub mod session;
pub mod wishlist;

pub use google_identity::GoogleIdentity;
pub use profile::ProfileManager;
pub use session::SessionManager;
pub use wishlist::{WishlistMode, WishlistService};
