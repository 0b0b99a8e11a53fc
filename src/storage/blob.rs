//! Key-value blob persistence
//!
//! The registry persists through the [`BlobStore`] seam: string keys, JSON
//! string values. [`FileStore`] keeps one file per key with locking and
//! atomic writes; [`MemoryStore`] backs tests and in-process embedding.

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use fs2::FileExt;

/// Key-value persistence consumed by the registry.
///
/// Implementations must treat `save` as a full replacement of the value
/// under `key` and `load` as returning `None` for keys never saved.
pub trait BlobStore {
    /// Stores `value` under `key`, replacing any previous value
    fn save(&self, key: &str, value: &str) -> Result<()>;

    /// Loads the value under `key`, or `None` if absent
    fn load(&self, key: &str) -> Result<Option<String>>;
}

/// File-backed blob store: one file per key under a directory.
///
/// Writes go to a temp file under an exclusive lock and land via atomic
/// rename; reads take a shared lock.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Creates a store rooted at the given directory
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Returns the directory holding the blobs
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl BlobStore for FileStore {
    fn save(&self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create store directory: {}", self.dir.display()))?;

        let path = self.path_for(key);
        let temp_path = path.with_extension("json.tmp");

        {
            let file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&temp_path)
                .with_context(|| format!("Failed to create temp file: {}", temp_path.display()))?;

            file.lock_exclusive()
                .context("Failed to acquire write lock on store")?;

            let mut writer = &file;
            writer
                .write_all(value.as_bytes())
                .with_context(|| format!("Failed to write blob '{}'", key))?;
            writer.flush().context("Failed to flush blob")?;
        }

        // Atomic rename
        fs::rename(&temp_path, &path).with_context(|| {
            format!(
                "Failed to rename {} to {}",
                temp_path.display(),
                path.display()
            )
        })?;

        Ok(())
    }

    fn load(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }

        let file = File::open(&path)
            .with_context(|| format!("Failed to open blob: {}", path.display()))?;

        file.lock_shared()
            .context("Failed to acquire read lock on store")?;

        let mut contents = String::new();
        let mut reader = &file;
        reader
            .read_to_string(&mut contents)
            .with_context(|| format!("Failed to read blob '{}'", key))?;

        // Lock is released when file is dropped
        Ok(Some(contents))
    }
}

/// In-memory blob store
#[derive(Default)]
pub struct MemoryStore {
    blobs: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

impl BlobStore for MemoryStore {
    fn save(&self, key: &str, value: &str) -> Result<()> {
        let mut blobs = self.blobs.lock().expect("store mutex poisoned");
        blobs.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn load(&self, key: &str) -> Result<Option<String>> {
        let blobs = self.blobs.lock().expect("store mutex poisoned");
        Ok(blobs.get(key).cloned())
    }
}
