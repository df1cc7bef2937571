//! File-backed key-value store.
//!
//! Each key maps to `<data_dir>/<key>.json`. Writes go to a sibling
//! `.tmp` file that is flushed and then renamed over the target, so a failed
//! write leaves the previous snapshot intact.

use super::KeyValueStore;
use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Stores one JSON file per key under a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file holding `key`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Ok(Some(content))
    }

    fn put(&mut self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("failed to create {}", self.dir.display()))?;

        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        {
            let mut file =
                File::create(&tmp).with_context(|| format!("failed to create {}", tmp.display()))?;
            file.write_all(value.as_bytes())
                .with_context(|| format!("failed to write {}", tmp.display()))?;
            file.sync_all()
                .with_context(|| format!("failed to sync {}", tmp.display()))?;
        }
        fs::rename(&tmp, &path).with_context(|| {
            format!("failed to move {} to {}", tmp.display(), path.display())
        })?;
        Ok(())
    }
}
