// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake lease store for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{LeaseStore, MemoryStore, StoreError};
use async_trait::async_trait;
use baton_core::{HolderId, LeaseKey, LeaseRecord, ResourceVersion, VersionedRecord};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Recorded store call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    Read,
    Create {
        holder: Option<HolderId>,
    },
    Update {
        holder: Option<HolderId>,
        expected: ResourceVersion,
    },
}

#[derive(Debug, Default)]
struct FaultPlan {
    failures: VecDeque<StoreError>,
    write_failures: VecDeque<StoreError>,
    lost_acks: usize,
    partitioned: bool,
    delay: Option<Duration>,
}

/// Memory-backed store with scripted faults and a call log.
///
/// Clones share the register, the faults, and the log.
#[derive(Clone, Debug)]
pub struct FakeLeaseStore {
    inner: MemoryStore,
    faults: Arc<Mutex<FaultPlan>>,
    calls: Arc<Mutex<Vec<StoreCall>>>,
}

impl FakeLeaseStore {
    pub fn new(key: LeaseKey) -> Self {
        Self {
            inner: MemoryStore::new(key),
            faults: Arc::new(Mutex::new(FaultPlan::default())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }

    /// Fail the next `count` calls with `error`
    pub fn fail_next(&self, count: usize, error: StoreError) {
        let mut faults = self.faults.lock().unwrap_or_else(|e| e.into_inner());
        faults.failures.extend((0..count).map(|_| error.clone()));
    }

    /// Fail the next `count` writes with `error`; reads are unaffected
    pub fn fail_next_writes(&self, count: usize, error: StoreError) {
        let mut faults = self.faults.lock().unwrap_or_else(|e| e.into_inner());
        faults.write_failures.extend((0..count).map(|_| error.clone()));
    }

    /// Apply the next `count` writes but report them as timed out
    pub fn lose_next_acks(&self, count: usize) {
        self.faults.lock().unwrap_or_else(|e| e.into_inner()).lost_acks += count;
    }

    /// While partitioned every call fails with `Unavailable`
    pub fn set_partitioned(&self, partitioned: bool) {
        self.faults.lock().unwrap_or_else(|e| e.into_inner()).partitioned = partitioned;
    }

    /// Delay every call by `delay` before it reaches the register
    pub fn set_delay(&self, delay: Option<Duration>) {
        self.faults.lock().unwrap_or_else(|e| e.into_inner()).delay = delay;
    }

    /// Write a record unconditionally, as another holder or an operator would
    pub fn seed(&self, record: LeaseRecord) -> ResourceVersion {
        self.inner.force(record)
    }

    /// Delete the record
    pub fn remove(&self) {
        self.inner.remove();
    }

    /// Current record, bypassing faults and the call log
    pub fn snapshot(&self) -> Option<VersionedRecord> {
        self.inner.snapshot()
    }

    fn record(&self, call: StoreCall) {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(call);
    }

    /// Wait out the configured delay, then consume any scripted failure
    async fn gate(&self, write: bool) -> Result<(), StoreError> {
        let delay = self.faults.lock().unwrap_or_else(|e| e.into_inner()).delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let mut faults = self.faults.lock().unwrap_or_else(|e| e.into_inner());
        if faults.partitioned {
            return Err(StoreError::Unavailable("partitioned".to_string()));
        }
        if let Some(error) = faults.failures.pop_front() {
            return Err(error);
        }
        if write {
            if let Some(error) = faults.write_failures.pop_front() {
                return Err(error);
            }
        }
        Ok(())
    }

    fn ack(&self, result: Result<ResourceVersion, StoreError>) -> Result<ResourceVersion, StoreError> {
        let mut faults = self.faults.lock().unwrap_or_else(|e| e.into_inner());
        if result.is_ok() && faults.lost_acks > 0 {
            faults.lost_acks -= 1;
            return Err(StoreError::Timeout(Duration::ZERO));
        }
        result
    }
}

#[async_trait]
impl LeaseStore for FakeLeaseStore {
    fn key(&self) -> &LeaseKey {
        self.inner.key()
    }

    async fn read(&self) -> Result<Option<VersionedRecord>, StoreError> {
        self.record(StoreCall::Read);
        self.gate(false).await?;
        self.inner.read().await
    }

    async fn create_if_absent(&self, record: &LeaseRecord) -> Result<ResourceVersion, StoreError> {
        self.record(StoreCall::Create {
            holder: record.holder().cloned(),
        });
        self.gate(true).await?;
        let result = self.inner.create_if_absent(record).await;
        self.ack(result)
    }

    async fn update_if_version_matches(
        &self,
        record: &LeaseRecord,
        expected: &ResourceVersion,
    ) -> Result<ResourceVersion, StoreError> {
        self.record(StoreCall::Update {
            holder: record.holder().cloned(),
            expected: expected.clone(),
        });
        self.gate(true).await?;
        let result = self.inner.update_if_version_matches(record, expected).await;
        self.ack(result)
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
