// storefront/src/storage.rs

//! Device-local key/value storage: the place the cart and the chosen display
//! currency survive restarts. Only string values are stored; callers encode.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Storage key holding the cart as a JSON array.
pub const CART_STORAGE_KEY: &str = "knitwear_cart";
/// Storage key holding the last chosen display currency code.
pub const CURRENCY_STORAGE_KEY: &str = "knitwear_currency";

#[derive(Debug, Error)]
pub enum StorageError {
  #[error("storage I/O failed: {0}")]
  Io(#[from] std::io::Error),

  #[error("could not encode value: {0}")]
  Encode(#[from] serde_json::Error),

  #[error("invalid storage key '{0}'")]
  InvalidKey(String),
}

pub trait LocalStorage: Send + Sync {
  fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;
  fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;
  fn remove_item(&self, key: &str) -> Result<(), StorageError>;
}

/// In-process storage, fresh per instance.
#[derive(Debug, Default)]
pub struct MemoryStorage {
  items: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
  pub fn new() -> Self {
    Self::default()
  }
}

impl LocalStorage for MemoryStorage {
  fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
    Ok(self.items.read().get(key).cloned())
  }

  fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
    self.items.write().insert(key.to_string(), value.to_string());
    Ok(())
  }

  fn remove_item(&self, key: &str) -> Result<(), StorageError> {
    self.items.write().remove(key);
    Ok(())
  }
}

/// One file per key under a directory. Writes go to a temp file first and
/// are renamed into place, so a crash never leaves a half-written value.
#[derive(Debug, Clone)]
pub struct FileStorage {
  dir: PathBuf,
}

impl FileStorage {
  pub fn open(dir: impl AsRef<Path>) -> Result<Self, StorageError> {
    let dir = dir.as_ref().to_path_buf();
    fs::create_dir_all(&dir)?;
    debug!(dir = %dir.display(), "file storage opened");
    Ok(Self { dir })
  }

  fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
    let valid = !key.is_empty()
      && key
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if !valid {
      return Err(StorageError::InvalidKey(key.to_string()));
    }
    Ok(self.dir.join(format!("{key}.json")))
  }
}

impl LocalStorage for FileStorage {
  fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
    let path = self.path_for(key)?;
    match fs::read_to_string(&path) {
      Ok(contents) => Ok(Some(contents)),
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
      Err(e) => Err(e.into()),
    }
  }

  fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
    let path = self.path_for(key)?;
    let tmp_path = path.with_extension("json.tmp");
    {
      let mut file = fs::File::create(&tmp_path)?;
      file.write_all(value.as_bytes())?;
      file.sync_all()?;
    }
    fs::rename(&tmp_path, &path)?;
    Ok(())
  }

  fn remove_item(&self, key: &str) -> Result<(), StorageError> {
    let path = self.path_for(key)?;
    match fs::remove_file(&path) {
      Ok(()) => Ok(()),
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
      Err(e) => Err(e.into()),
    }
  }
}
