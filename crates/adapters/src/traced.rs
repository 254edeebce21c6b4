// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced store wrapper for consistent observability

use crate::store::{LeaseStore, StoreError};
use async_trait::async_trait;
use baton_core::{LeaseKey, LeaseRecord, ResourceVersion, VersionedRecord};
use tracing::Instrument;

/// Wrapper that adds tracing to any LeaseStore
#[derive(Clone, Debug)]
pub struct TracedLeaseStore<S> {
    inner: S,
}

impl<S> TracedLeaseStore<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

fn log_write(result: &Result<ResourceVersion, StoreError>, elapsed_ms: u64) {
    match result {
        Ok(version) => tracing::debug!(%version, elapsed_ms, "committed"),
        // Losing a race is routine
        Err(e @ (StoreError::Conflict | StoreError::NotFound)) => {
            tracing::debug!(elapsed_ms, error = %e, "rejected")
        }
        Err(e) => tracing::warn!(elapsed_ms, error = %e, "write failed"),
    }
}

#[async_trait]
impl<S: LeaseStore> LeaseStore for TracedLeaseStore<S> {
    fn key(&self) -> &LeaseKey {
        self.inner.key()
    }

    async fn read(&self) -> Result<Option<VersionedRecord>, StoreError> {
        let span = tracing::debug_span!("lease.read", lease = %self.inner.key());
        async {
            let start = std::time::Instant::now();
            let result = self.inner.read().await;
            let elapsed_ms = start.elapsed().as_millis() as u64;

            match &result {
                Ok(Some(current)) => tracing::trace!(
                    version = %current.version,
                    holder = current.record.holder().map(|h| h.as_str()).unwrap_or(""),
                    elapsed_ms,
                    "read"
                ),
                Ok(None) => tracing::trace!(elapsed_ms, "no record"),
                Err(e) => tracing::warn!(elapsed_ms, error = %e, "read failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn create_if_absent(&self, record: &LeaseRecord) -> Result<ResourceVersion, StoreError> {
        let span = tracing::debug_span!(
            "lease.create",
            lease = %self.inner.key(),
            term = record.leader_transitions,
        );
        async {
            let start = std::time::Instant::now();
            let result = self.inner.create_if_absent(record).await;
            log_write(&result, start.elapsed().as_millis() as u64);
            result
        }
        .instrument(span)
        .await
    }

    async fn update_if_version_matches(
        &self,
        record: &LeaseRecord,
        expected: &ResourceVersion,
    ) -> Result<ResourceVersion, StoreError> {
        let span = tracing::debug_span!(
            "lease.update",
            lease = %self.inner.key(),
            %expected,
            term = record.leader_transitions,
        );
        async {
            let start = std::time::Instant::now();
            let result = self.inner.update_if_version_matches(record, expected).await;
            log_write(&result, start.elapsed().as_millis() as u64);
            result
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
