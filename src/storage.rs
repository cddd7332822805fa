//! Persistence port for the application state.
//!
//! Each durable slot is one JSON string under a fixed key. `FileStore` keeps
//! one `<key>.json` per slot in a directory; `MemoryStore` is used by tests
//! and when the directory cannot be created.

use std::{
  collections::HashMap,
  fs,
  io::ErrorKind,
  path::{Path, PathBuf},
  sync::Mutex,
};

use tracing::{debug, instrument};
use uuid::Uuid;

use crate::error::AppError;

pub const KEY_SETUP: &str = "setupData";
pub const KEY_DOCUMENTS: &str = "documents";
pub const KEY_QUESTIONS: &str = "bankSoal";
pub const KEY_ADMIN: &str = "administrasi";

/// Synchronous key/value port. Writes are local and cheap, so no batching.
pub trait StateStore: Send + Sync {
  /// `Ok(None)` when nothing was ever stored under `key`.
  fn load(&self, key: &str) -> Result<Option<String>, AppError>;
  fn save(&self, key: &str, value: &str) -> Result<(), AppError>;
}

pub struct FileStore {
  dir: PathBuf,
}

impl FileStore {
  pub fn open(dir: impl Into<PathBuf>) -> Result<Self, AppError> {
    let dir = dir.into();
    fs::create_dir_all(&dir)
      .map_err(|e| AppError::Persistence(format!("create {}: {e}", dir.display())))?;
    Ok(Self { dir })
  }

  pub fn dir(&self) -> &Path { &self.dir }

  fn path_for(&self, key: &str) -> PathBuf {
    self.dir.join(format!("{key}.json"))
  }
}

impl StateStore for FileStore {
  #[instrument(level = "debug", skip(self))]
  fn load(&self, key: &str) -> Result<Option<String>, AppError> {
    let path = self.path_for(key);
    match fs::read_to_string(&path) {
      Ok(s) => Ok(Some(s)),
      Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
      Err(e) => Err(AppError::Persistence(format!("read {}: {e}", path.display()))),
    }
  }

  /// Write to a sibling temp file, then rename, so a crash never leaves half a slot.
  #[instrument(level = "debug", skip(self, value), fields(bytes = value.len()))]
  fn save(&self, key: &str, value: &str) -> Result<(), AppError> {
    let path = self.path_for(key);
    let tmp = self.dir.join(format!(".{key}.{}.tmp", Uuid::new_v4()));
    fs::write(&tmp, value)
      .map_err(|e| AppError::Persistence(format!("write {}: {e}", tmp.display())))?;
    fs::rename(&tmp, &path).map_err(|e| {
      let _ = fs::remove_file(&tmp);
      AppError::Persistence(format!("rename into {}: {e}", path.display()))
    })?;
    debug!(target: "storage", %key, "Slot written");
    Ok(())
  }
}

#[derive(Default)]
pub struct MemoryStore {
  slots: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
  pub fn new() -> Self { Self::default() }

  /// Pre-seeded store, e.g. to simulate what a previous session left behind.
  #[cfg(test)]
  pub fn with_slots(pairs: &[(&str, &str)]) -> Self {
    let slots = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    Self { slots: Mutex::new(slots) }
  }
}

impl StateStore for MemoryStore {
  fn load(&self, key: &str) -> Result<Option<String>, AppError> {
    let slots = self
      .slots
      .lock()
      .map_err(|_| AppError::Persistence("memory store poisoned".into()))?;
    Ok(slots.get(key).cloned())
  }

  fn save(&self, key: &str, value: &str) -> Result<(), AppError> {
    let mut slots = self
      .slots
      .lock()
      .map_err(|_| AppError::Persistence("memory store poisoned".into()))?;
    slots.insert(key.to_string(), value.to_string());
    Ok(())
  }
}
