// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process lease store
//!
//! Clones share one register, so several candidates in one process (or one
//! test) contend on the same record.

use super::{LeaseStore, StoreError};
use async_trait::async_trait;
use baton_core::{LeaseKey, LeaseRecord, ResourceVersion, VersionedRecord};
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct Register {
    current: Option<(LeaseRecord, u64)>,
    last_version: u64,
}

impl Register {
    fn bump(&mut self) -> u64 {
        self.last_version += 1;
        self.last_version
    }
}

/// Compare-and-swap register held in memory
#[derive(Clone, Debug)]
pub struct MemoryStore {
    key: LeaseKey,
    register: Arc<Mutex<Register>>,
}

impl MemoryStore {
    pub fn new(key: LeaseKey) -> Self {
        Self {
            key,
            register: Arc::new(Mutex::new(Register::default())),
        }
    }

    /// Current record, read outside the trait (no failure modes)
    pub fn snapshot(&self) -> Option<VersionedRecord> {
        let register = self.register.lock().unwrap_or_else(|e| e.into_inner());
        register
            .current
            .as_ref()
            .map(|(record, version)| versioned(record, *version))
    }

    /// Overwrite the record unconditionally, as an out-of-band writer would
    pub fn force(&self, record: LeaseRecord) -> ResourceVersion {
        let mut register = self.register.lock().unwrap_or_else(|e| e.into_inner());
        let version = register.bump();
        register.current = Some((record, version));
        ResourceVersion::new(version.to_string())
    }

    /// Delete the record
    pub fn remove(&self) {
        let mut register = self.register.lock().unwrap_or_else(|e| e.into_inner());
        register.current = None;
    }
}

fn versioned(record: &LeaseRecord, version: u64) -> VersionedRecord {
    VersionedRecord::new(record.clone(), ResourceVersion::new(version.to_string()))
}

#[async_trait]
impl LeaseStore for MemoryStore {
    fn key(&self) -> &LeaseKey {
        &self.key
    }

    async fn read(&self) -> Result<Option<VersionedRecord>, StoreError> {
        Ok(self.snapshot())
    }

    async fn create_if_absent(&self, record: &LeaseRecord) -> Result<ResourceVersion, StoreError> {
        let mut register = self.register.lock().unwrap_or_else(|e| e.into_inner());
        if register.current.is_some() {
            return Err(StoreError::Conflict);
        }
        let version = register.bump();
        register.current = Some((record.clone(), version));
        Ok(ResourceVersion::new(version.to_string()))
    }

    async fn update_if_version_matches(
        &self,
        record: &LeaseRecord,
        expected: &ResourceVersion,
    ) -> Result<ResourceVersion, StoreError> {
        let mut register = self.register.lock().unwrap_or_else(|e| e.into_inner());
        let Some((_, current)) = register.current.as_ref() else {
            return Err(StoreError::NotFound);
        };
        if current.to_string() != expected.as_str() {
            return Err(StoreError::Conflict);
        }
        let version = register.bump();
        register.current = Some((record.clone(), version));
        Ok(ResourceVersion::new(version.to_string()))
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
