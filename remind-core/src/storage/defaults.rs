//! Key-value defaults storage
//!
//! Persists small JSON values under fixed keys, the way a platform
//! "user defaults" database would. The file backend keeps every key in a
//! single JSON object document and replaces it atomically on each write.

use crate::error::{AppError, Result};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Durable key-value storage used by the note store
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`, if any
    fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Store `value` under `key`, replacing any previous value
    fn set(&self, key: &str, value: Value) -> Result<()>;
}

/// Defaults stored as one JSON document on disk
#[derive(Debug, Clone)]
pub struct FileDefaults {
    path: PathBuf,
}

impl FileDefaults {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_document(&self) -> Result<Map<String, Value>> {
        if !self.path.exists() {
            return Ok(Map::new());
        }

        let content = fs::read_to_string(&self.path)?;
        match serde_json::from_str::<Value>(&content)? {
            Value::Object(map) => Ok(map),
            other => Err(AppError::Storage(format!(
                "Defaults document at {:?} is not an object (found {})",
                self.path,
                json_kind(&other)
            ))),
        }
    }

    /// Load the document for modification. A corrupt document is replaced
    /// rather than blocking every future write.
    fn read_document_for_update(&self) -> Result<Map<String, Value>> {
        match self.read_document() {
            Ok(map) => Ok(map),
            Err(AppError::Io(e)) => Err(AppError::Io(e)),
            Err(e) => {
                tracing::warn!("Discarding unreadable defaults at {:?}: {}", self.path, e);
                Ok(Map::new())
            }
        }
    }

    fn write_document(&self, map: Map<String, Value>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(&Value::Object(map))?;

        // Write to temp file first (atomic write)
        let temp_path = self.path.with_extension("tmp");
        fs::write(&temp_path, content)?;
        fs::rename(&temp_path, &self.path)?;

        Ok(())
    }
}

impl KeyValueStore for FileDefaults {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        let mut map = self.read_document()?;
        Ok(map.remove(key))
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        let mut map = self.read_document_for_update()?;
        map.insert(key.to_string(), value);
        self.write_document(map)?;
        tracing::debug!("Stored defaults key {} in {:?}", key, self.path);
        Ok(())
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// In-process defaults, for hosts without durable storage and for tests
#[derive(Debug, Default)]
pub struct MemoryDefaults {
    values: Mutex<HashMap<String, Value>>,
}

impl MemoryDefaults {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Value>>> {
        self.values
            .lock()
            .map_err(|_| AppError::Storage("Defaults lock poisoned".to_string()))
    }
}

impl KeyValueStore for MemoryDefaults {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        self.lock()?.insert(key.to_string(), value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn create_test_defaults() -> (FileDefaults, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let defaults = FileDefaults::new(temp_dir.path().join("defaults.json"));
        (defaults, temp_dir)
    }

    #[test]
    fn test_missing_file_reads_as_empty() {
        let (defaults, _temp) = create_test_defaults();
        assert_eq!(defaults.get("anything").unwrap(), None);
    }

    #[test]
    fn test_set_get_overwrite() {
        let (defaults, _temp) = create_test_defaults();

        defaults.set("flag", json!(true)).unwrap();
        defaults.set("list", json!([1, 2, 3])).unwrap();

        assert_eq!(defaults.get("flag").unwrap(), Some(json!(true)));
        assert_eq!(defaults.get("list").unwrap(), Some(json!([1, 2, 3])));

        defaults.set("flag", json!(false)).unwrap();
        assert_eq!(defaults.get("flag").unwrap(), Some(json!(false)));
        assert_eq!(defaults.get("list").unwrap(), Some(json!([1, 2, 3])));
    }

    #[test]
    fn test_values_survive_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("defaults.json");

        FileDefaults::new(path.clone())
            .set("greeting", json!("hello"))
            .unwrap();

        let reopened = FileDefaults::new(path);
        assert_eq!(reopened.get("greeting").unwrap(), Some(json!("hello")));
    }

    #[test]
    fn test_corrupt_document_is_an_error_on_read_and_replaced_on_write() {
        let (defaults, _temp) = create_test_defaults();
        fs::write(defaults.path(), "{not json").unwrap();

        assert!(defaults.get("flag").is_err());

        defaults.set("flag", json!(false)).unwrap();
        assert_eq!(defaults.get("flag").unwrap(), Some(json!(false)));
    }

    #[test]
    fn test_non_object_document_is_rejected() {
        let (defaults, _temp) = create_test_defaults();
        fs::write(defaults.path(), "[1, 2]").unwrap();

        let err = defaults.get("flag").unwrap_err();
        assert!(matches!(err, AppError::Storage(_)));
    }

    #[test]
    fn test_memory_defaults() {
        let defaults = MemoryDefaults::new();
        defaults.set("k", json!({"a": 1})).unwrap();
        assert_eq!(defaults.get("k").unwrap(), Some(json!({"a": 1})));
        assert_eq!(defaults.get("missing").unwrap(), None);
    }
}
