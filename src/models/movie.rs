// SPDX-License-Identifier: MIT

//! Movie summary models for wishlist storage.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Reduced movie projection saved to a wishlist.
///
/// The catalog hands us a much richer record; only the fields needed to
/// render a wishlist row are persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MovieSummary {
    /// Catalog movie ID (also used as the wishlist document ID)
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub id: u64,
    pub title: String,
    pub poster_path: String,
    pub vote_average: f64,
    pub release_date: String,
    pub overview: String,
}

/// Wishlist document stored in Firestore.
///
/// The movie fields plus `created_at`, stamped at write time; it is the
/// snapshot sort key (newest first).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WishlistDoc {
    pub id: u64,
    pub title: String,
    pub poster_path: String,
    pub vote_average: f64,
    pub release_date: String,
    pub overview: String,
    /// Creation timestamp (RFC 3339)
    pub created_at: String,
}

impl WishlistDoc {
    /// Wrap a movie summary with a write-time creation timestamp.
    pub fn new(movie: MovieSummary) -> Self {
        Self {
            id: movie.id,
            title: movie.title,
            poster_path: movie.poster_path,
            vote_average: movie.vote_average,
            release_date: movie.release_date,
            overview: movie.overview,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Project the document back to the summary shape the UI consumes.
    pub fn into_summary(self) -> MovieSummary {
        MovieSummary {
            id: self.id,
            title: self.title,
            poster_path: self.poster_path,
            vote_average: self.vote_average,
            release_date: self.release_date,
            overview: self.overview,
        }
    }
}
