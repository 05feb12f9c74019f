// SPDX-License-Identifier: MIT

//! Profile model: named sub-accounts under one owner.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Maximum number of profiles per owner.
pub const MAX_PROFILES: usize = 2;

/// A named profile under one owner key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Profile {
    /// Unique within the owning account
    pub id: String,
    pub name: String,
    /// Accent color (hex)
    pub color: String,
    /// Avatar emoji
    pub icon: String,
}

impl Profile {
    /// The profile materialized for an owner that has none yet.
    pub fn default_profile() -> Self {
        Self {
            id: "p_default".to_string(),
            name: "Default".to_string(),
            color: "#e50914".to_string(),
            icon: "\u{1F600}".to_string(),
        }
    }
}

/// Partial profile update; `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct ProfilePatch {
    pub name: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
}

impl ProfilePatch {
    /// Apply this patch to a profile in place.
    pub fn apply(&self, profile: &mut Profile) {
        if let Some(name) = &self.name {
            profile.name = name.clone();
        }
        if let Some(color) = &self.color {
            profile.color = color.clone();
        }
        if let Some(icon) = &self.icon {
            profile.icon = icon.clone();
        }
    }
}
