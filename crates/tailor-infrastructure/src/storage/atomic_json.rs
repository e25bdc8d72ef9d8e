//! Atomic JSON file operations.
//!
//! Writes go to a sibling temp file, are fsynced, then renamed over the target
//! while an exclusive advisory lock on `<name>.lock` is held. The lock file is
//! left in place: removing it would let a waiting writer lock a stale inode.

use std::fs::{self, File, OpenOptions};
use std::io::Write as IoWrite;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};
use tailor_core::{Result, TailorError};

/// A handle to one JSON document on disk.
pub struct AtomicJsonFile<T> {
    path: PathBuf,
    _phantom: PhantomData<T>,
}

impl<T> AtomicJsonFile<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            _phantom: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Reads and parses the document.
    ///
    /// # Returns
    ///
    /// - `Ok(T)`: successfully loaded
    /// - `Err(TailorError::Io)`: the file could not be read
    /// - `Err(TailorError::Serialization)`: the content is not a valid document
    pub fn load(&self) -> Result<T> {
        let content = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Serializes `data` as pretty JSON and replaces the file atomically.
    pub fn save(&self, data: &T) -> Result<()> {
        self.ensure_parent()?;
        let _lock = FileLock::acquire(&self.path)?;
        self.write_locked(data)
    }

    /// Read-modify-write under one lock.
    ///
    /// `build` receives the current document (`None` when the file does not
    /// exist yet, `Some(Err(..))` when it cannot be read) and returns the
    /// document to write, which is also returned to the caller.
    pub fn save_with<F>(&self, build: F) -> Result<T>
    where
        F: FnOnce(Option<Result<T>>) -> Result<T>,
    {
        self.ensure_parent()?;
        let _lock = FileLock::acquire(&self.path)?;

        let current = self.exists().then(|| self.load());
        let data = build(current)?;
        self.write_locked(&data)?;
        Ok(data)
    }

    fn ensure_parent(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        Ok(())
    }

    fn write_locked(&self, data: &T) -> Result<()> {
        let mut json = serde_json::to_string_pretty(data)?;
        json.push('\n');

        let tmp_path = self.temp_path()?;
        let mut tmp_file = File::create(&tmp_path)?;
        tmp_file.write_all(json.as_bytes())?;
        tmp_file.sync_all()?;
        drop(tmp_file);

        if let Err(e) = fs::rename(&tmp_path, &self.path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e.into());
        }
        Ok(())
    }

    /// Removes the file under the lock.
    pub fn remove(&self) -> Result<()> {
        let _lock = FileLock::acquire(&self.path)?;
        fs::remove_file(&self.path)?;
        Ok(())
    }

    fn temp_path(&self) -> Result<PathBuf> {
        let parent = self
            .path
            .parent()
            .ok_or_else(|| {
                TailorError::internal(format!("{:?} has no parent directory", self.path))
            })?;
        let file_name = self
            .path
            .file_name()
            .ok_or_else(|| TailorError::internal(format!("{:?} has no file name", self.path)))?;

        Ok(parent.join(format!(".{}.tmp", file_name.to_string_lossy())))
    }
}

/// Exclusive advisory lock on `<file>.lock`, released on drop.
struct FileLock {
    file: File,
}

impl FileLock {
    fn acquire(path: &Path) -> Result<Self> {
        let lock_path = path.with_extension("lock");
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)?;

        fs2::FileExt::lock_exclusive(&file).map_err(|e| {
            TailorError::io(format!("Failed to acquire lock {:?}: {}", lock_path, e))
        })?;

        Ok(Self { file })
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        if let Err(e) = fs2::FileExt::unlock(&self.file) {
            tracing::debug!("[Storage] Could not release lock: {}", e);
        }
    }
}
