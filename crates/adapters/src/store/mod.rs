// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lease record stores
//!
//! A store is an opaque compare-and-swap register for one lease record.
//! Any backend offering atomic create and version-guarded update works.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeLeaseStore, StoreCall};

use async_trait::async_trait;
use baton_core::{LeaseKey, LeaseRecord, ResourceVersion, VersionedRecord};
use std::time::Duration;
use thiserror::Error;

/// Errors from store operations
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("store call timed out after {0:?}")]
    Timeout(Duration),
    #[error("version conflict")]
    Conflict,
    #[error("lease record not found")]
    NotFound,
    #[error("corrupt lease record: {0}")]
    Corrupt(String),
}

impl StoreError {
    /// Whether retrying on the next tick may succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            StoreError::Unavailable(_) | StoreError::Timeout(_) | StoreError::Corrupt(_)
        )
    }
}

/// Adapter for the external lease record store
#[async_trait]
pub trait LeaseStore: Clone + Send + Sync + 'static {
    /// The record this store reads and writes
    fn key(&self) -> &LeaseKey;

    /// Current record and its version, or `None` if absent
    async fn read(&self) -> Result<Option<VersionedRecord>, StoreError>;

    /// Create the record; `Conflict` if one already exists
    async fn create_if_absent(&self, record: &LeaseRecord) -> Result<ResourceVersion, StoreError>;

    /// Replace the record if it is still at `expected`; `Conflict` if it has
    /// moved on, `NotFound` if it vanished
    async fn update_if_version_matches(
        &self,
        record: &LeaseRecord,
        expected: &ResourceVersion,
    ) -> Result<ResourceVersion, StoreError>;
}
