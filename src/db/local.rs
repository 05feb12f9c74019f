// SPDX-License-Identifier: MIT

//! Synchronous local key-value store.
//!
//! The browser original kept everything in localStorage; here the same
//! contract is a small trait with an in-memory implementation for tests
//! and a JSON-file-backed one for durable runs. Mutations never fail from
//! the caller's perspective; write problems are logged.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use dashmap::DashMap;

use crate::error::{AppError, Result};

/// Durable per-installation string storage keyed by string.
pub trait KvStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

/// In-memory store for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).map(|e| e.value().clone())
    }

    fn set(&self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.entries.remove(key);
    }
}

/// JSON-file-backed store; the localStorage analog.
///
/// The whole map is rewritten on every mutation. A corrupt or unreadable
/// file degrades to an empty store with a warning, never an error.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: DashMap<String, String>,
}

impl FileStore {
    /// Open (or create) the store file at `path`.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                AppError::Storage(format!("failed to create {}: {}", parent.display(), e))
            })?;
        }

        let entries = DashMap::new();
        match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<BTreeMap<String, String>>(&raw) {
                Ok(map) => {
                    for (k, v) in map {
                        entries.insert(k, v);
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "Local store file is corrupt, starting empty"
                    );
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Local store file is unreadable, starting empty"
                );
            }
        }

        Ok(Self { path, entries })
    }

    fn persist(&self) {
        let map: BTreeMap<String, String> = self
            .entries
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect();

        let raw = match serde_json::to_string_pretty(&map) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize local store");
                return;
            }
        };

        if let Err(e) = fs::write(&self.path, raw) {
            tracing::error!(
                path = %self.path.display(),
                error = %e,
                "Failed to write local store"
            );
        }
    }
}

impl KvStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).map(|e| e.value().clone())
    }

    fn set(&self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
        self.persist();
    }

    fn remove(&self, key: &str) {
        if self.entries.remove(key).is_some() {
            self.persist();
        }
    }
}
