//! Persisted state
//!
//! Everything the client remembers lives in a flat string key-value store:
//! the raw API key, the settings object, the session list, the code files,
//! and the active-session id. [`DiskStore`] keeps one file per key under the
//! platform data directory and writes atomically. The typed helpers below
//! (de)serialize each slice with serde_json; a corrupt slice loads as its
//! default rather than failing startup.

use std::error::Error as StdError;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

use directories::ProjectDirs;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::warn;

use crate::core::config::Settings;
use crate::core::session::ChatSession;
use crate::core::workspace::CodeArtifact;

/// The five persisted keys.
pub mod keys {
    pub const API_KEY: &str = "api-key";
    pub const SETTINGS: &str = "settings";
    pub const SESSIONS: &str = "chat-sessions";
    pub const CODE_FILES: &str = "code-files";
    pub const ACTIVE_SESSION: &str = "active-session";
}

#[derive(Debug)]
pub enum StorageError {
    /// Failed to read a key's backing file.
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to write or replace a key's backing file.
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to serialize a state slice before writing it.
    Serialize { source: serde_json::Error },
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::Read { path, source } => {
                write!(f, "Failed to read state at {}: {}", path.display(), source)
            }
            StorageError::Write { path, source } => {
                write!(f, "Failed to write state at {}: {}", path.display(), source)
            }
            StorageError::Serialize { source } => {
                write!(f, "Failed to serialize state: {}", source)
            }
        }
    }
}

impl StdError for StorageError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            StorageError::Read { source, .. } => Some(source),
            StorageError::Write { source, .. } => Some(source),
            StorageError::Serialize { source } => Some(source),
        }
    }
}

/// The storage collaborator: plain string get/set/remove semantics.
pub trait StringStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// On-disk store: one file per key, written atomically via a temp file in
/// the same directory.
pub struct DiskStore {
    dir: PathBuf,
}

impl DiskStore {
    pub fn open_default() -> Result<Self, StorageError> {
        let proj_dirs = ProjectDirs::from("org", "scrivano", "scrivano")
            .expect("Failed to determine data directory");
        Self::open_at(proj_dirs.data_dir().to_path_buf())
    }

    pub fn open_at(dir: PathBuf) -> Result<Self, StorageError> {
        fs::create_dir_all(&dir).map_err(|source| StorageError::Write {
            path: dir.clone(),
            source,
        })?;
        Ok(Self { dir })
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }
}

impl StringStore for DiskStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.key_path(key);
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Read { path, source }),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.key_path(key);
        let write_err = |source| StorageError::Write {
            path: path.clone(),
            source,
        };

        let mut temp_file = NamedTempFile::new_in(&self.dir).map_err(write_err)?;
        temp_file.write_all(value.as_bytes()).map_err(write_err)?;
        temp_file.as_file_mut().sync_all().map_err(write_err)?;
        temp_file
            .persist(&path)
            .map_err(|err| write_err(err.error))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.key_path(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::Write { path, source }),
        }
    }
}

/// In-memory store for tests and tooling.
#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<std::collections::HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StringStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.values.lock().expect("store lock").get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.values
            .lock()
            .expect("store lock")
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.values.lock().expect("store lock").remove(key);
        Ok(())
    }
}

fn load_json_slice<T: DeserializeOwned + Default>(store: &dyn StringStore, key: &str) -> T {
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return T::default(),
        Err(err) => {
            warn!("ignoring unreadable state slice {key}: {err}");
            return T::default();
        }
    };
    match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(err) => {
            warn!("ignoring corrupt state slice {key}: {err}");
            T::default()
        }
    }
}

fn save_json_slice<T: Serialize>(
    store: &dyn StringStore,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let raw = serde_json::to_string(value).map_err(|source| StorageError::Serialize { source })?;
    store.set(key, &raw)
}

pub fn load_settings(store: &dyn StringStore) -> Settings {
    load_json_slice(store, keys::SETTINGS)
}

pub fn save_settings(store: &dyn StringStore, settings: &Settings) -> Result<(), StorageError> {
    save_json_slice(store, keys::SETTINGS, settings)
}

pub fn load_sessions(store: &dyn StringStore) -> Vec<ChatSession> {
    load_json_slice(store, keys::SESSIONS)
}

pub fn save_sessions(store: &dyn StringStore, sessions: &[ChatSession]) -> Result<(), StorageError> {
    save_json_slice(store, keys::SESSIONS, &sessions)
}

pub fn load_code_files(store: &dyn StringStore) -> Vec<CodeArtifact> {
    load_json_slice(store, keys::CODE_FILES)
}

pub fn save_code_files(store: &dyn StringStore, files: &[CodeArtifact]) -> Result<(), StorageError> {
    save_json_slice(store, keys::CODE_FILES, &files)
}

pub fn load_active_session(store: &dyn StringStore) -> Option<String> {
    store.get(keys::ACTIVE_SESSION).ok().flatten()
}

/// The active-session key is removed, not blanked, when nothing is active.
pub fn save_active_session(
    store: &dyn StringStore,
    active_id: Option<&str>,
) -> Result<(), StorageError> {
    match active_id {
        Some(id) => store.set(keys::ACTIVE_SESSION, id),
        None => store.remove(keys::ACTIVE_SESSION),
    }
}

pub fn load_api_key(store: &dyn StringStore) -> Option<String> {
    store
        .get(keys::API_KEY)
        .ok()
        .flatten()
        .filter(|key| !key.trim().is_empty())
}

pub fn save_api_key(store: &dyn StringStore, api_key: &str) -> Result<(), StorageError> {
    store.set(keys::API_KEY, api_key)
}

pub fn clear_api_key(store: &dyn StringStore) -> Result<(), StorageError> {
    store.remove(keys::API_KEY)
}
