//! Flat-file record store: one pretty-printed JSON array per collection kind.
//!
//! A missing file is an empty collection. A file that does not parse is an
//! error, never an empty or partial collection. Each collection has its own
//! lock held across the whole read-modify-write of an append, so concurrent
//! appends to one collection cannot lose each other's records.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::SystemTime;

use serde::de::IgnoredAny;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::data::record::{Kind, Record};

pub const DEFAULT_DATA_DIR: &str = "data";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to write {}: {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },
    #[error("stored collection {} is not valid JSON: {source}", .path.display())]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to encode collection: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Record count and last write time of one collection file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionStatus {
    pub kind: Kind,
    pub file: String,
    pub records: usize,
    pub last_modified: Option<String>,
}

#[derive(Debug)]
pub struct RecordStore {
    data_dir: PathBuf,
    locks: [Mutex<()>; 3],
}

impl RecordStore {
    /// Opens a store rooted at `data_dir`, creating the directory if needed.
    pub fn open(data_dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let data_dir = data_dir.into();
        fs::create_dir_all(&data_dir).map_err(|source| StoreError::Write {
            path: data_dir.clone(),
            source,
        })?;
        Ok(Self {
            data_dir,
            locks: [Mutex::new(()), Mutex::new(()), Mutex::new(())],
        })
    }

    pub fn path_for(&self, kind: Kind) -> PathBuf {
        self.data_dir.join(kind.file_name())
    }

    // The guarded value is `()`, so a poisoned lock carries no broken state.
    fn lock(&self, kind: Kind) -> MutexGuard<'_, ()> {
        self.locks[kind.index()]
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Full ordered collection for `R::KIND`; empty if never written.
    pub fn read_all<R: Record>(&self) -> Result<Vec<R>, StoreError> {
        let _guard = self.lock(R::KIND);
        load(&self.path_for(R::KIND))
    }

    /// Appends `records` after the existing ones and returns the new collection length.
    pub fn append<R: Record>(&self, records: &[R]) -> Result<usize, StoreError> {
        let path = self.path_for(R::KIND);
        let _guard = self.lock(R::KIND);
        let mut existing: Vec<R> = load(&path)?;
        if records.is_empty() {
            return Ok(existing.len());
        }
        existing.extend_from_slice(records);
        write_atomic(&path, &existing)?;
        debug!(
            kind = %R::KIND,
            appended = records.len(),
            total = existing.len(),
            "collection appended"
        );
        Ok(existing.len())
    }

    pub fn clear(&self, kind: Kind) -> Result<(), StoreError> {
        let _guard = self.lock(kind);
        self.write_empty(kind)
    }

    /// Clears every collection as one critical section. Locks are taken in
    /// kind order and all held until the last file is written.
    pub fn clear_all(&self) -> Result<(), StoreError> {
        let _guards = Kind::ALL.map(|kind| self.lock(kind));
        for kind in Kind::ALL {
            self.write_empty(kind)?;
        }
        Ok(())
    }

    fn write_empty(&self, kind: Kind) -> Result<(), StoreError> {
        write_atomic::<serde_json::Value>(&self.path_for(kind), &[])
    }

    pub fn count(&self, kind: Kind) -> Result<usize, StoreError> {
        let _guard = self.lock(kind);
        load::<IgnoredAny>(&self.path_for(kind)).map(|records| records.len())
    }

    pub fn status(&self) -> Result<Vec<CollectionStatus>, StoreError> {
        Kind::ALL
            .into_iter()
            .map(|kind| {
                let records = self.count(kind)?;
                let last_modified = fs::metadata(self.path_for(kind))
                    .and_then(|meta| meta.modified())
                    .ok()
                    .map(to_rfc3339);
                Ok(CollectionStatus {
                    kind,
                    file: kind.file_name().to_string(),
                    records,
                    last_modified,
                })
            })
            .collect()
    }
}

fn to_rfc3339(time: SystemTime) -> String {
    chrono::DateTime::<chrono::Utc>::from(time).to_rfc3339()
}

fn load<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Vec<T>, StoreError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(StoreError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    serde_json::from_str(&raw).map_err(|source| StoreError::Corrupt {
        path: path.to_path_buf(),
        source,
    })
}

/// Writes and syncs a sibling temp file, then renames it over the collection
/// file. The temp file is removed if either step fails.
fn write_atomic<T: Serialize>(path: &Path, records: &[T]) -> Result<(), StoreError> {
    let serialized = serde_json::to_string_pretty(records)?;
    let tmp = path.with_extension("json.tmp");

    let written = fs::File::create(&tmp).and_then(|mut file| {
        file.write_all(serialized.as_bytes())?;
        file.sync_all()
    });
    if let Err(source) = written {
        let _ = fs::remove_file(&tmp);
        return Err(StoreError::Write { path: tmp, source });
    }

    fs::rename(&tmp, path).map_err(|source| {
        let _ = fs::remove_file(&tmp);
        StoreError::Write {
            path: path.to_path_buf(),
            source,
        }
    })
}
