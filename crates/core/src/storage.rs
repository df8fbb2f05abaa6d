//! Flat-file JSON persistence.
//!
//! Every collection lives in one file holding a JSON array of flat objects. The file is
//! rewritten wholesale after each mutation: the new contents go to a sibling temporary file
//! which is then renamed over the original, so a concurrent reader sees either the old or the
//! new array and never a partial one.
//!
//! There is no journal. If the process dies between the temporary write and the rename, the
//! previous file is left in place and the temporary file is overwritten by the next write.

use crate::constants::TEMP_FILE_SUFFIX;
use crate::{PatientError, PatientResult};
use serde::{de::DeserializeOwned, Serialize};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// Loads a JSON array from `path`.
///
/// A missing file is an empty collection, not an error.
pub fn load_json_array<T: DeserializeOwned>(path: &Path) -> PatientResult<Vec<T>> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!("no collection file at {}, starting empty", path.display());
            return Ok(Vec::new());
        }
        Err(e) => return Err(PatientError::FileRead(e)),
    };

    if contents.trim().is_empty() {
        return Ok(Vec::new());
    }

    serde_json::from_str(&contents).map_err(PatientError::Deserialization)
}

/// Serialises `items` and atomically replaces the file at `path`.
pub fn write_json_array<T: Serialize>(path: &Path, items: &[T]) -> PatientResult<()> {
    let json = serde_json::to_string_pretty(items).map_err(PatientError::Serialization)?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(PatientError::StorageDirCreation)?;
        }
    }

    let tmp_path = temp_path_for(path);
    {
        let mut file = fs::File::create(&tmp_path).map_err(PatientError::FileWrite)?;
        file.write_all(json.as_bytes())
            .map_err(PatientError::FileWrite)?;
        file.sync_all().map_err(PatientError::FileWrite)?;
    }

    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(PatientError::FileReplace(e));
    }

    Ok(())
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(TEMP_FILE_SUFFIX);
    path.with_file_name(name)
}

/// Current time as Unix epoch milliseconds.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// An append-only collection of flat records persisted to one JSON file.
///
/// Items are never deduplicated, edited, or removed. Appends are serialised by the write lock,
/// which is held across the file write; the in-memory list only grows once the write succeeded.
#[derive(Debug)]
pub struct JsonCollection<T> {
    path: PathBuf,
    items: RwLock<Vec<T>>,
}

impl<T> JsonCollection<T>
where
    T: Serialize + DeserializeOwned + Clone,
{
    /// Loads the collection from `path` (missing file means empty).
    pub fn load(path: PathBuf) -> PatientResult<Self> {
        let items = load_json_array(&path)?;
        tracing::info!("loaded {} entries from {}", items.len(), path.display());
        Ok(Self {
            path,
            items: RwLock::new(items),
        })
    }

    /// Appends one item and persists the whole collection.
    pub fn append(&self, item: T) -> PatientResult<T> {
        self.extend(vec![item.clone()])?;
        Ok(item)
    }

    /// Appends several items with a single file rewrite.
    pub fn extend(&self, new_items: Vec<T>) -> PatientResult<()> {
        let mut items = self.items.write().map_err(|_| PatientError::LockPoisoned)?;

        let mut next = items.clone();
        next.extend(new_items);
        write_json_array(&self.path, &next)?;
        *items = next;

        Ok(())
    }

    /// Writes `seed` only if the collection is still empty when the write lock is taken.
    ///
    /// Returns whether the seed was written.
    pub fn seed_if_empty(&self, seed: impl FnOnce() -> Vec<T>) -> PatientResult<bool> {
        let mut items = self.items.write().map_err(|_| PatientError::LockPoisoned)?;
        if !items.is_empty() {
            return Ok(false);
        }

        let next = seed();
        write_json_array(&self.path, &next)?;
        *items = next;

        Ok(true)
    }

    /// Returns a snapshot of all items in append order.
    pub fn all(&self) -> PatientResult<Vec<T>> {
        let items = self.items.read().map_err(|_| PatientError::LockPoisoned)?;
        Ok(items.clone())
    }

    /// Returns the items matching `pred`, in append order.
    pub fn filter(&self, pred: impl Fn(&T) -> bool) -> PatientResult<Vec<T>> {
        let items = self.items.read().map_err(|_| PatientError::LockPoisoned)?;
        Ok(items.iter().filter(|i| pred(i)).cloned().collect())
    }

    pub fn len(&self) -> PatientResult<usize> {
        let items = self.items.read().map_err(|_| PatientError::LockPoisoned)?;
        Ok(items.len())
    }

    pub fn is_empty(&self) -> PatientResult<bool> {
        Ok(self.len()? == 0)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
