// SPDX-License-Identifier: MIT

//! Per-owner profile management.
//!
//! Profiles always live in the local store, keyed by the owner key; the
//! remote/local split only applies to wishlists. An owner that has never
//! seen a profile gets the default one materialized on first access.

use std::sync::Arc;

use crate::db::{keys, KvStore};
use crate::error::{AppError, Result};
use crate::models::{Profile, ProfilePatch, MAX_PROFILES};

/// Profile list and active selection for the current owner.
pub struct ProfileManager {
    store: Arc<dyn KvStore>,
    owner: Option<String>,
    profiles: Vec<Profile>,
    active_id: Option<String>,
}

impl ProfileManager {
    /// Create a manager with no owner selected (no profiles visible).
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self {
            store,
            owner: None,
            profiles: Vec::new(),
            active_id: None,
        }
    }

    /// Switch to `owner` and (re)load its profile namespace.
    ///
    /// An absent, malformed, or empty stored list materializes the default
    /// profile and persists it. The active profile is the previously
    /// stored id when it still exists, else the first profile.
    pub fn select_owner(&mut self, owner: Option<&str>) {
        self.owner = owner.map(str::to_string);

        let Some(owner) = owner else {
            self.profiles = Vec::new();
            self.active_id = None;
            return;
        };

        let mut profiles = self.load_stored_profiles(owner);
        if profiles.is_empty() {
            profiles = vec![Profile::default_profile()];
            tracing::debug!(owner, "Materialized default profile");
        }
        persist_profiles(self.store.as_ref(), owner, &profiles);

        let stored_active = self.store.get(&keys::active_profile(owner));
        let active_id = profiles
            .iter()
            .find(|p| Some(&p.id) == stored_active.as_ref())
            .or_else(|| profiles.first())
            .map(|p| p.id.clone());

        match &active_id {
            Some(id) => self.store.set(&keys::active_profile(owner), id),
            None => self.store.remove(&keys::active_profile(owner)),
        }

        self.profiles = profiles;
        self.active_id = active_id;
    }

    pub fn owner_key(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    pub fn profiles(&self) -> &[Profile] {
        &self.profiles
    }

    pub fn active_profile(&self) -> Option<&Profile> {
        let active_id = self.active_id.as_ref()?;
        self.profiles.iter().find(|p| &p.id == active_id)
    }

    pub fn active_profile_id(&self) -> Option<&str> {
        self.active_profile().map(|p| p.id.as_str())
    }

    /// Whether the per-owner profile limit has been reached.
    pub fn is_limit_reached(&self) -> bool {
        self.profiles.len() >= MAX_PROFILES
    }

    /// Select the active profile among the current list.
    ///
    /// Unknown ids are ignored, keeping the active id valid at all times.
    pub fn set_active_profile(&mut self, id: &str) {
        let Some(owner) = self.owner.clone() else {
            return;
        };
        if !self.profiles.iter().any(|p| p.id == id) {
            return;
        }

        self.active_id = Some(id.to_string());
        self.store.set(&keys::active_profile(&owner), id);
    }

    /// Create a profile.
    ///
    /// Fails when no owner is selected or the profile limit is reached;
    /// state is unchanged on failure.
    pub fn add_profile(&mut self, name: &str, color: &str, icon: &str) -> Result<Profile> {
        let Some(owner) = self.owner.clone() else {
            return Err(AppError::NoOwner);
        };
        if self.is_limit_reached() {
            return Err(AppError::ProfileLimitReached);
        }

        let profile = Profile {
            id: self.fresh_profile_id(),
            name: name.to_string(),
            color: color.to_string(),
            icon: icon.to_string(),
        };

        self.profiles.push(profile.clone());
        persist_profiles(self.store.as_ref(), &owner, &self.profiles);

        tracing::info!(owner = %owner, profile_id = %profile.id, "Added profile");
        Ok(profile)
    }

    /// Patch a profile's fields in place; unknown ids are a no-op.
    pub fn update_profile(&mut self, id: &str, patch: &ProfilePatch) {
        let Some(owner) = self.owner.clone() else {
            return;
        };

        if let Some(profile) = self.profiles.iter_mut().find(|p| p.id == id) {
            patch.apply(profile);
        }
        persist_profiles(self.store.as_ref(), &owner, &self.profiles);
    }

    /// Delete a profile.
    ///
    /// When the active profile is deleted, the first remaining profile
    /// becomes active (or none, when no profiles remain).
    pub fn delete_profile(&mut self, id: &str) {
        let Some(owner) = self.owner.clone() else {
            return;
        };

        self.profiles.retain(|p| p.id != id);
        persist_profiles(self.store.as_ref(), &owner, &self.profiles);

        if self.active_id.as_deref() == Some(id) {
            self.active_id = self.profiles.first().map(|p| p.id.clone());

            match &self.active_id {
                Some(fallback) => self.store.set(&keys::active_profile(&owner), fallback),
                None => self.store.remove(&keys::active_profile(&owner)),
            }
        }

        tracing::info!(owner = %owner, profile_id = id, "Deleted profile");
    }

    /// Time-based profile id, bumped past any collision.
    fn fresh_profile_id(&self) -> String {
        let mut millis = chrono::Utc::now().timestamp_millis();
        loop {
            let id = format!("p_{millis}");
            if !self.profiles.iter().any(|p| p.id == id) {
                return id;
            }
            millis += 1;
        }
    }

    fn load_stored_profiles(&self, owner: &str) -> Vec<Profile> {
        let Some(raw) = self.store.get(&keys::profiles(owner)) else {
            return Vec::new();
        };

        match serde_json::from_str(&raw) {
            Ok(profiles) => profiles,
            Err(e) => {
                tracing::warn!(owner, error = %e, "Stored profiles are corrupt, starting over");
                Vec::new()
            }
        }
    }
}

fn persist_profiles(store: &dyn KvStore, owner: &str, profiles: &[Profile]) {
    match serde_json::to_string(profiles) {
        Ok(raw) => store.set(&keys::profiles(owner), &raw),
        Err(e) => tracing::error!(owner, error = %e, "Failed to serialize profiles"),
    }
}
