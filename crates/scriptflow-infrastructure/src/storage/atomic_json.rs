//! Atomic JSON document files.
//!
//! Each document is written through a temporary sibling file that is synced
//! and renamed over the target. Read-modify-write cycles hold an exclusive
//! fs2 lock on a `.lock` sibling.

use scriptflow_core::error::Result;
use serde_json::{Map, Value};
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write as IoWrite};
use std::path::{Path, PathBuf};

/// A handle to one JSON object document on disk.
pub struct AtomicJsonFile {
    path: PathBuf,
}

impl AtomicJsonFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the document.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(Value))`: the parsed document
    /// - `Ok(None)`: the file doesn't exist or is empty
    /// - `Err`: the file could not be read or is not JSON
    pub fn load(&self) -> Result<Option<Value>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        if content.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&content)?))
    }

    /// Replaces the document atomically.
    pub fn save(&self, value: &Value) -> Result<()> {
        let content = serde_json::to_string_pretty(value)?;
        write_atomic(&self.path, content.as_bytes())
    }

    /// Merges `fields` into the stored object under the file lock.
    ///
    /// Top-level keys of `fields` overwrite, keys only present on disk are
    /// kept. A missing or non-object document starts from an empty object.
    pub fn merge(&self, fields: Map<String, Value>) -> Result<()> {
        let _lock = FileLock::acquire(&self.path)?;

        let mut current = match self.load()? {
            Some(Value::Object(map)) => map,
            _ => Map::new(),
        };
        current.extend(fields);

        self.save(&Value::Object(current))
    }

    /// Deletes the document under the file lock. Missing files are fine.
    pub fn remove(&self) -> Result<()> {
        let _lock = FileLock::acquire(&self.path)?;
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Writes `bytes` to `path` via a synced temporary file and a rename.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }

    let tmp_path = temp_path(path)?;
    let mut tmp_file = File::create(&tmp_path)?;
    tmp_file.write_all(bytes)?;
    tmp_file.sync_all()?;
    drop(tmp_file);

    fs::rename(&tmp_path, path)?;
    Ok(())
}

fn temp_path(path: &Path) -> Result<PathBuf> {
    let file_name = path.file_name().ok_or_else(|| {
        std::io::Error::new(ErrorKind::InvalidInput, "Path has no file name")
    })?;
    let tmp_name = format!(".{}.tmp", file_name.to_string_lossy());
    Ok(path.with_file_name(tmp_name))
}

/// Exclusive lock on `<path>.lock`, released and removed on drop.
struct FileLock {
    #[allow(dead_code)]
    file: File,
    lock_path: PathBuf,
}

impl FileLock {
    fn acquire(path: &Path) -> Result<Self> {
        let lock_path = path.with_extension("lock");
        if let Some(parent) = lock_path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)?;

        #[cfg(unix)]
        {
            use fs2::FileExt;
            file.lock_exclusive().map_err(|e| {
                scriptflow_core::ScriptflowError::io(format!("Failed to acquire lock: {}", e))
            })?;
        }

        Ok(FileLock { file, lock_path })
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.lock_path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn test_load_missing_is_none() {
        let dir = TempDir::new().unwrap();
        let file = AtomicJsonFile::new(dir.path().join("x1.json"));
        assert!(file.load().unwrap().is_none());
    }

    #[test]
    fn test_merge_keeps_fields_absent_from_update() {
        let dir = TempDir::new().unwrap();
        let file = AtomicJsonFile::new(dir.path().join("x1.json"));
        file.save(&json!({"id": "x1", "title": "Old", "legacy": 7})).unwrap();

        file.merge(object(json!({"id": "x1", "title": "New"}))).unwrap();

        assert_eq!(
            file.load().unwrap().unwrap(),
            json!({"id": "x1", "title": "New", "legacy": 7})
        );
        assert!(!dir.path().join(".x1.json.tmp").exists());
        assert!(!dir.path().join("x1.lock").exists());
    }

    #[test]
    fn test_remove_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let file = AtomicJsonFile::new(dir.path().join("nested/x1.json"));
        file.merge(object(json!({"id": "x1"}))).unwrap();
        file.remove().unwrap();
        file.remove().unwrap();
        assert!(file.load().unwrap().is_none());
    }
}
