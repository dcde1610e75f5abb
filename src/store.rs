//! Key-value persistence for ledger snapshots.
//!
//! Values are opaque strings. The ledger writes whole collections under fixed
//! keys, so a store only needs get/put. There is no locking: the last writer
//! wins, which is fine for a single interactive user.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::error::StoreError;

pub trait KvStore {
    /// `Ok(None)` when the key has never been written.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn put(&mut self, key: &str, value: String) -> Result<(), StoreError>;

    /// Write several keys as one logical update.
    fn put_many(&mut self, entries: Vec<(&str, String)>) -> Result<(), StoreError> {
        for (key, value) in entries {
            self.put(key, value)?;
        }
        Ok(())
    }
}

/// In-process store, used for dry runs and tests.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn put(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }
}

/// One `<key>.json` file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    fn io_err(key: &str) -> impl FnOnce(std::io::Error) -> StoreError + '_ {
        move |source| StoreError::Io {
            key: key.to_string(),
            source,
        }
    }

    fn backup_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!(".{key}.json.bak"))
    }

    /// Write next to the target. A failed write removes its partial file.
    fn stage(&self, key: &str, value: &str) -> Result<PathBuf, StoreError> {
        fs::create_dir_all(&self.dir).map_err(Self::io_err(key))?;
        let tmp = self.dir.join(format!(".{key}.json.tmp"));
        if let Err(e) = fs::write(&tmp, value) {
            discard(&tmp);
            return Err(Self::io_err(key)(e));
        }
        Ok(tmp)
    }

    /// Move the current value aside, then rename the staged file over it.
    /// Returns the backup path when there was a previous value.
    fn commit(&self, key: &str, tmp: &Path) -> Result<Option<PathBuf>, StoreError> {
        let target = self.path_for(key);
        let backup = match fs::symlink_metadata(&target) {
            Ok(_) => {
                let bak = self.backup_path(key);
                fs::rename(&target, &bak).map_err(Self::io_err(key))?;
                Some(bak)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => return Err(Self::io_err(key)(e)),
        };
        if let Err(e) = fs::rename(tmp, &target) {
            if let Some(bak) = &backup {
                restore(bak, &target);
            }
            return Err(Self::io_err(key)(e));
        }
        Ok(backup)
    }

    /// Put already committed keys back to their previous contents.
    fn rollback(&self, committed: &[(&str, Option<PathBuf>)]) {
        for (key, backup) in committed.iter().rev() {
            let target = self.path_for(key);
            match backup {
                Some(bak) => restore(bak, &target),
                None => discard(&target),
            }
        }
    }
}

fn restore(backup: &Path, target: &Path) {
    if let Err(e) = fs::rename(backup, target) {
        warn!("could not restore {}: {e}", target.display());
    }
}

fn discard(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => warn!("could not remove {}: {e}", path.display()),
    }
}

impl KvStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Self::io_err(key)(e)),
        }
    }

    fn put(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        self.put_many(vec![(key, value)])
    }

    /// Stage every value, then swap them in one by one with the previous
    /// file kept as a backup. Any failure restores the keys already swapped
    /// and removes every staged file, so all keys keep their previous
    /// contents.
    fn put_many(&mut self, entries: Vec<(&str, String)>) -> Result<(), StoreError> {
        let mut staged: Vec<(&str, PathBuf)> = Vec::with_capacity(entries.len());
        for (key, value) in &entries {
            match self.stage(key, value) {
                Ok(tmp) => staged.push((*key, tmp)),
                Err(e) => {
                    staged.iter().for_each(|(_, tmp)| discard(tmp));
                    return Err(e);
                }
            }
        }

        let mut committed: Vec<(&str, Option<PathBuf>)> = Vec::with_capacity(staged.len());
        for (i, (key, tmp)) in staged.iter().enumerate() {
            match self.commit(key, tmp) {
                Ok(backup) => committed.push((*key, backup)),
                Err(e) => {
                    self.rollback(&committed);
                    staged[i..].iter().for_each(|(_, tmp)| discard(tmp));
                    return Err(e);
                }
            }
        }

        for (_, backup) in committed {
            if let Some(bak) = backup {
                discard(&bak);
            }
        }
        Ok(())
    }
}
