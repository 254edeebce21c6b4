// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! File-backed lease store
//!
//! Lets candidates in separate processes on one host contend for a lease.
//! The record lives at `<dir>/<namespace>/<name>.json`; every operation holds
//! an exclusive lock on a sibling `.lock` file, and writes land through a
//! temp file and rename so readers never see a torn record. The lock file
//! also keeps the highest version ever issued, so versions are never reused
//! when the record file is deleted and created again.

use super::{LeaseStore, StoreError};
use async_trait::async_trait;
use baton_core::{LeaseKey, LeaseRecord, ResourceVersion, VersionedRecord};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// On-disk envelope: the record plus the version counter guarding it
#[derive(Debug, Serialize, Deserialize)]
struct StoredLease {
    version: u64,
    record: LeaseRecord,
}

impl StoredLease {
    fn versioned(self) -> VersionedRecord {
        VersionedRecord::new(self.record, ResourceVersion::new(self.version.to_string()))
    }
}

/// Compare-and-swap register in a JSON file
#[derive(Clone, Debug)]
pub struct FileStore {
    key: LeaseKey,
    path: PathBuf,
    lock_path: PathBuf,
}

impl FileStore {
    /// Open the store for `key` under `dir`, creating directories as needed
    pub fn open(dir: impl AsRef<Path>, key: LeaseKey) -> Result<Self, StoreError> {
        let ns_dir = dir.as_ref().join(&key.namespace);
        fs::create_dir_all(&ns_dir).map_err(io_error)?;
        Ok(Self {
            path: ns_dir.join(format!("{}.json", key.name)),
            lock_path: ns_dir.join(format!("{}.lock", key.name)),
            key,
        })
    }

    /// Path of the record file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run `op` on the record file while holding the exclusive lock
    async fn locked<T, F>(&self, op: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Path, &mut File) -> Result<T, StoreError> + Send + 'static,
    {
        let path = self.path.clone();
        let lock_path = self.lock_path.clone();
        tokio::task::spawn_blocking(move || {
            let mut lock = OpenOptions::new()
                .read(true)
                .create(true)
                .truncate(false)
                .write(true)
                .open(&lock_path)
                .map_err(io_error)?;
            lock.lock_exclusive().map_err(io_error)?;
            let result = op(&path, &mut lock);
            // Dropping the handle releases the lock as well
            let _ = FileExt::unlock(&lock);
            result
        })
        .await
        .map_err(|e| StoreError::Unavailable(format!("store task failed: {}", e)))?
    }
}

fn io_error(e: std::io::Error) -> StoreError {
    StoreError::Unavailable(e.to_string())
}

fn load(path: &Path) -> Result<Option<StoredLease>, StoreError> {
    let json = match fs::read_to_string(path) {
        Ok(json) => json,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(io_error(e)),
    };
    serde_json::from_str(&json)
        .map(Some)
        .map_err(|e| StoreError::Corrupt(e.to_string()))
}

/// Reserve the next version, above both `floor` and anything issued before
fn next_version(lock: &mut File, floor: u64) -> Result<u64, StoreError> {
    let mut text = String::new();
    lock.seek(SeekFrom::Start(0)).map_err(io_error)?;
    lock.read_to_string(&mut text).map_err(io_error)?;
    let issued = text.trim().parse::<u64>().unwrap_or(0);
    let next = issued.max(floor) + 1;

    lock.set_len(0).map_err(io_error)?;
    lock.seek(SeekFrom::Start(0)).map_err(io_error)?;
    write!(lock, "{}", next).map_err(io_error)?;
    lock.sync_data().map_err(io_error)?;
    Ok(next)
}

fn save(path: &Path, stored: &StoredLease) -> Result<(), StoreError> {
    let json = serde_json::to_vec_pretty(stored).map_err(|e| StoreError::Corrupt(e.to_string()))?;
    let tmp = path.with_extension("json.tmp");
    let mut file = File::create(&tmp).map_err(io_error)?;
    file.write_all(&json).map_err(io_error)?;
    file.sync_all().map_err(io_error)?;
    fs::rename(&tmp, path).map_err(io_error)
}

#[async_trait]
impl LeaseStore for FileStore {
    fn key(&self) -> &LeaseKey {
        &self.key
    }

    async fn read(&self) -> Result<Option<VersionedRecord>, StoreError> {
        self.locked(|path, _| Ok(load(path)?.map(StoredLease::versioned)))
            .await
    }

    async fn create_if_absent(&self, record: &LeaseRecord) -> Result<ResourceVersion, StoreError> {
        let record = record.clone();
        self.locked(move |path, lock| {
            if path.exists() {
                return Err(StoreError::Conflict);
            }
            let stored = StoredLease {
                version: next_version(lock, 0)?,
                record,
            };
            save(path, &stored)?;
            Ok(ResourceVersion::new(stored.version.to_string()))
        })
        .await
    }

    async fn update_if_version_matches(
        &self,
        record: &LeaseRecord,
        expected: &ResourceVersion,
    ) -> Result<ResourceVersion, StoreError> {
        let record = record.clone();
        let expected = expected.clone();
        self.locked(move |path, lock| {
            let current = load(path)?.ok_or(StoreError::NotFound)?;
            if current.version.to_string() != expected.as_str() {
                return Err(StoreError::Conflict);
            }
            let stored = StoredLease {
                version: next_version(lock, current.version)?,
                record,
            };
            save(path, &stored)?;
            Ok(ResourceVersion::new(stored.version.to_string()))
        })
        .await
    }
}

#[cfg(test)]
#[path = "file_tests.rs"]
mod tests;
