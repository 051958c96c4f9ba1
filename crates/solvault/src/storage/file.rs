//! Filesystem-backed storage: one file per key.
//!
//! A key such as `wallet/treasury` maps to `{root}/wallet/treasury.json`.
//! Values are written verbatim (the records the core stores are JSON).
//!
//! ```text
//! {root}/
//! ├── config.json
//! ├── nonce/
//! │   └── {public_key}.json
//! └── wallet/
//!     └── {id}.json
//! ```
//!
//! Writes go to a temporary sibling and are renamed into place, so a reader
//! never sees a partial value. `put_if_absent` hard-links the temporary file
//! into place, which fails atomically when the target already exists.
//! `take` renames the file to a private name before reading it; only one
//! renamer can succeed, so only one caller receives the value.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use super::{Storage, StorageEntry};
use crate::error::{Result, VaultError};

const FILE_EXTENSION: &str = "json";

static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Key-value storage rooted at a directory.
///
/// Safe for concurrent use within one process. Separate processes sharing
/// a root get the same per-key atomicity from the filesystem.
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    /// Create a store rooted at `root`, creating the directory if needed.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a key to its file path, refusing anything that could escape root.
    fn key_path(&self, key: &str) -> Result<PathBuf> {
        let mut path = self.root.clone();
        let segments: Vec<&str> = key.split('/').collect();
        for segment in &segments {
            if segment.is_empty()
                || *segment == "."
                || *segment == ".."
                || segment.contains(['\\', '\0'])
            {
                return Err(VaultError::StorageError(format!("invalid storage key: {key:?}")));
            }
        }
        let (last, dirs) = segments
            .split_last()
            .ok_or_else(|| VaultError::StorageError("empty storage key".into()))?;
        for dir in dirs {
            path.push(dir);
        }
        path.push(format!("{last}.{FILE_EXTENSION}"));
        Ok(path)
    }

    /// A sibling of `path` no other writer in any process will pick.
    fn temp_path(path: &Path) -> PathBuf {
        let n = TMP_COUNTER.fetch_add(1, Ordering::Relaxed);
        path.with_extension(format!("{FILE_EXTENSION}.{}.{n}.tmp", std::process::id()))
    }

    /// Write `data` to a uniquely named sibling of `path` and return its path.
    fn write_temp(path: &Path, data: &[u8]) -> Result<PathBuf> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = Self::temp_path(path);
        std::fs::write(&tmp, data)?;
        Ok(tmp)
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<StorageEntry>> {
        let path = self.key_path(key)?;
        match std::fs::read(&path) {
            Ok(value) => Ok(Some(StorageEntry {
                key: key.to_string(),
                value,
            })),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(VaultError::Io(e)),
        }
    }

    fn put(&self, entry: StorageEntry) -> Result<()> {
        let path = self.key_path(&entry.key)?;
        let tmp = Self::write_temp(&path, &entry.value)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        let path = self.key_path(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(VaultError::Io(e)),
        }
    }

    fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let (dir_part, name_part) = match prefix.rfind('/') {
            Some(idx) => (&prefix[..idx], &prefix[idx + 1..]),
            None => ("", prefix),
        };
        let dir = if dir_part.is_empty() {
            self.root.clone()
        } else {
            // validate the directory portion the same way as a key
            let as_key = self.key_path(dir_part)?;
            as_key.with_extension("")
        };

        let read_dir = match std::fs::read_dir(&dir) {
            Ok(rd) => rd,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(VaultError::Io(e)),
        };

        let mut names = Vec::new();
        for entry in read_dir {
            let entry = entry?;
            let name = entry.file_name();
            let name = name.to_string_lossy();
            let Some(rest) = name.strip_prefix(name_part) else {
                continue;
            };
            if entry.file_type()?.is_dir() {
                names.push(format!("{rest}/"));
            } else if let Some(stem) = rest.strip_suffix(".json") {
                names.push(stem.to_string());
            }
        }
        Ok(names)
    }

    fn put_if_absent(&self, entry: StorageEntry) -> Result<bool> {
        let path = self.key_path(&entry.key)?;
        let tmp = Self::write_temp(&path, &entry.value)?;
        let linked = std::fs::hard_link(&tmp, &path);
        std::fs::remove_file(&tmp)?;
        match linked {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(false),
            Err(e) => Err(VaultError::Io(e)),
        }
    }

    fn take(&self, key: &str) -> Result<Option<StorageEntry>> {
        let path = self.key_path(key)?;
        let claimed = Self::temp_path(&path);
        match std::fs::rename(&path, &claimed) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(VaultError::Io(e)),
        }
        let value = std::fs::read(&claimed);
        std::fs::remove_file(&claimed)?;
        Ok(Some(StorageEntry {
            key: key.to_string(),
            value: value?,
        }))
    }
}
