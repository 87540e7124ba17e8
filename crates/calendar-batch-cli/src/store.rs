//! A [`KeyValueStore`] keeping one JSON file per key in a directory.

use calendar_batch::error::{BatchError, Result};
use calendar_batch::KeyValueStore;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn open(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `dirs::data_dir()/calbatch`, or `./.calbatch` where the platform has none.
    pub fn default_dir() -> PathBuf {
        dirs::data_dir()
            .map(|dir| dir.join("calbatch"))
            .unwrap_or_else(|| PathBuf::from(".calbatch"))
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

fn store_error(action: &str, path: &Path, err: impl std::fmt::Display) -> BatchError {
    BatchError::Store(format!("failed to {} {}: {}", action, path.display(), err))
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.entry_path(key);
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(store_error("read", &path, err)),
        }
    }

    /// Write via a temp file in the same directory and rename, so a crash never
    /// leaves a half-written entry behind.
    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let path = self.entry_path(key);
        fs::create_dir_all(&self.dir).map_err(|e| store_error("create", &self.dir, e))?;

        let mut temp =
            tempfile::NamedTempFile::new_in(&self.dir).map_err(|e| store_error("write", &path, e))?;
        temp.write_all(value.as_bytes())
            .and_then(|_| temp.flush())
            .map_err(|e| store_error("write", &path, e))?;
        temp.persist(&path)
            .map_err(|e| store_error("write", &path, e.error))?;

        tracing::debug!(key, path = %path.display(), "stored entry");
        Ok(())
    }
}
