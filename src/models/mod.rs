// SPDX-License-Identifier: MIT

//! Data models for the application.

pub mod movie;
pub mod profile;
pub mod user;

pub use movie::{MovieSummary, WishlistDoc};
pub use profile::{Profile, ProfilePatch, MAX_PROFILES};
pub use user::{AuthUser, LocalCredential, Session};
