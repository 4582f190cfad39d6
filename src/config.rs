use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError, RwLock};

use serde_json::{Map, Value};
use tempfile::NamedTempFile;

use crate::error::{Error, Result};

/// Key holding the URL of the token refresh endpoint.
pub const TOKEN_ENDPOINT_KEY: &str = "tokenEndpoint";
/// Key holding the current refresh token. Rotated on every exchange.
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";

/// Key-value store the refresher reads its endpoint and refresh token from.
///
/// Implementations do not need to serialize a get followed by a set; callers
/// must not run two refreshes against the same store concurrently.
pub trait ConfigStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// In-memory store.
#[derive(Debug, Default)]
pub struct MemoryConfig {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryConfig {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MemoryConfig {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let values = iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        Self { values: RwLock::new(values) }
    }
}

impl ConfigStore for MemoryConfig {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let values = self.values.read().unwrap_or_else(PoisonError::into_inner);
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self.values.write().unwrap_or_else(PoisonError::into_inner);
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Store backed by a flat JSON object on disk.
///
/// The file is re-read on every access, so edits made by other tools are picked up.
/// A missing file reads as empty.
#[derive(Debug)]
pub struct JsonFileConfig {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Map<String, Value>> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(Error::config(format!("failed to read {}: {e}", self.path.display()))),
        };
        if text.trim().is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_str(&text) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(Error::config(format!("{} is not a JSON object", self.path.display()))),
            Err(e) => Err(Error::config(format!("failed to parse {}: {e}", self.path.display()))),
        }
    }
}

impl ConfigStore for JsonFileConfig {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let map = self.load()?;
        Ok(map.get(key).and_then(Value::as_str).map(str::to_string))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut map = self.load()?;
        map.insert(key.to_string(), Value::String(value.to_string()));
        let dir = match self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => {
                fs::create_dir_all(parent)
                    .map_err(|e| Error::config(format!("failed to create {}: {e}", parent.display())))?;
                parent
            }
            None => Path::new("."),
        };
        let text = serde_json::to_string_pretty(&Value::Object(map))
            .map_err(|e| Error::config(format!("failed to serialize config: {e}")))?;
        let write_err = |e: std::io::Error| Error::config(format!("failed to write {}: {e}", self.path.display()));

        // Replace the file in one step so a crash never leaves it truncated.
        let mut tmp = NamedTempFile::new_in(dir).map_err(write_err)?;
        tmp.write_all(text.as_bytes()).map_err(write_err)?;
        tmp.as_file().sync_all().map_err(write_err)?;
        tmp.persist(&self.path).map_err(|e| write_err(e.error))?;
        Ok(())
    }
}

/// Reads `key`, treating empty values as absent.
pub(crate) fn non_empty(store: &dyn ConfigStore, key: &str) -> Result<Option<String>> {
    Ok(store.get(key)?.filter(|v| !v.is_empty()))
}
