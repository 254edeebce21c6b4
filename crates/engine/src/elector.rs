// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Async driver for one candidate
//!
//! The [`Candidate`] decides, the elector performs: it reads the record,
//! feeds the snapshot to the candidate, and executes the effects that come
//! back. Store calls are the only suspension points and each carries its
//! own timeout. Writes are issued one at a time and every outcome is fed
//! back before anything else happens.

use crate::dispatcher::{CallbackDispatcher, LeaderCallbacks};
use crate::error::ElectionError;
use baton_adapters::{LeaseStore, StoreError};
use baton_core::{
    Candidate, Clock, Effect, ElectionConfig, ElectionState, HolderId, VersionedRecord,
    WriteIntent, WriteKind, WriteOutcome,
};
use std::collections::VecDeque;
use std::time::Duration;

/// Runs a [`Candidate`] against a store
pub struct Elector<S, C, H> {
    candidate: Candidate,
    store: S,
    clock: C,
    dispatcher: CallbackDispatcher<H>,
}

impl<S, C, H> Elector<S, C, H>
where
    S: LeaseStore,
    C: Clock,
    H: LeaderCallbacks,
{
    /// Validate `config` and build an elector; nothing is read yet
    pub fn new(
        config: ElectionConfig,
        store: S,
        clock: C,
        callbacks: H,
    ) -> Result<Self, ElectionError> {
        config.validate()?;
        let dispatcher = CallbackDispatcher::new(config.identity.clone(), callbacks);
        Ok(Self {
            candidate: Candidate::new(config),
            store,
            clock,
            dispatcher,
        })
    }

    pub fn config(&self) -> &ElectionConfig {
        self.candidate.config()
    }

    pub fn identity(&self) -> &HolderId {
        self.candidate.identity()
    }

    pub fn state(&self) -> ElectionState {
        self.candidate.state()
    }

    pub fn is_leader(&self) -> bool {
        self.candidate.is_leader()
    }

    /// Term currently led, if leading
    pub fn term(&self) -> Option<u64> {
        self.candidate.term()
    }

    /// Holder named by the last record this elector saw
    pub fn observed_leader(&self) -> Option<&HolderId> {
        self.candidate
            .observed()
            .and_then(|current| current.record.holder())
    }

    pub fn candidate(&self) -> &Candidate {
        &self.candidate
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn callbacks(&self) -> &H {
        self.dispatcher.callbacks()
    }

    /// How long to wait before the next tick.
    ///
    /// The jittered retry period, cut short so a leader wakes no later than
    /// its renew deadline.
    pub fn next_pause(&self) -> Duration {
        let pause = jittered(self.config().retry_period, self.config().jitter);
        match self.candidate.deadline_remaining(&self.clock) {
            Some(remaining) => pause.min(remaining),
            None => pause,
        }
    }

    /// One pass of the control loop: deadline check, read, decide, write.
    ///
    /// Dropping the returned future mid-call is allowed; an abandoned write
    /// is judged afresh on the next read, and [`Elector::shutdown`] clears a
    /// claim that landed without confirmation.
    pub async fn tick(&mut self) {
        if matches!(
            self.candidate.state(),
            ElectionState::Releasing | ElectionState::Stopped
        ) {
            return;
        }

        let effects = self.candidate.check_deadline(&self.clock);
        self.apply(effects).await;

        let effects = match self.read(self.read_timeout()).await {
            Ok(snapshot) => self.candidate.observe(snapshot, &self.clock),
            Err(e) => {
                tracing::debug!(
                    identity = %self.identity(),
                    error = %e,
                    "read failed, retrying next tick"
                );
                self.candidate.read_failed(&self.clock)
            }
        };
        self.apply(effects).await;
    }

    /// Stop the election.
    ///
    /// A leader stops leading immediately, before any further write. If a
    /// release is owed, the record is re-read and cleared when it still
    /// names this candidate at its own term. The whole sequence is bounded
    /// by `shutdown_timeout`; a failed release is not an error.
    pub async fn shutdown(&mut self) -> Result<(), ElectionError> {
        let effects = self.candidate.cancel();
        self.dispatch_only(effects);

        if self.candidate.state() != ElectionState::Releasing {
            return Ok(());
        }

        let limit = self.config().shutdown_timeout;
        match tokio::time::timeout(limit, self.release()).await {
            Ok(()) => Ok(()),
            Err(_) => {
                tracing::warn!(
                    identity = %self.identity(),
                    timeout_ms = limit.as_millis() as u64,
                    "release did not finish, record will expire"
                );
                self.candidate.abandon();
                Err(ElectionError::ShutdownTimedOut(limit))
            }
        }
    }

    async fn release(&mut self) {
        let latest = match self.read(self.config().store_timeout).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::debug!(error = %e, "release read failed, using last snapshot");
                None
            }
        };
        let effects = self.candidate.release(latest, &self.clock);
        self.apply(effects).await;
    }

    /// Execute effects in order, feeding write outcomes back as they land
    async fn apply(&mut self, effects: Vec<Effect>) {
        let mut queue = VecDeque::from(effects);
        while let Some(effect) = queue.pop_front() {
            match effect {
                Effect::Emit(event) => self.dispatcher.dispatch(event),
                Effect::Write(intent) => {
                    let outcome = self.write(intent).await;
                    queue.extend(self.candidate.write_completed(outcome, &self.clock));
                }
            }
        }
    }

    /// Dispatch events from a transition that issues no writes
    fn dispatch_only(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Emit(event) => self.dispatcher.dispatch(event),
                Effect::Write(intent) => {
                    tracing::warn!(kind = %intent.kind, "unexpected write during cancellation");
                }
            }
        }
    }

    fn read_timeout(&self) -> Duration {
        if self.candidate.is_leader() {
            self.candidate.renew_timeout(&self.clock)
        } else {
            self.config().store_timeout
        }
    }

    async fn read(&self, limit: Duration) -> Result<Option<VersionedRecord>, StoreError> {
        match tokio::time::timeout(limit, self.store.read()).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout(limit)),
        }
    }

    async fn write(&self, intent: WriteIntent) -> WriteOutcome {
        let limit = match intent.kind {
            WriteKind::Renew => self.candidate.renew_timeout(&self.clock),
            WriteKind::Acquire | WriteKind::Release => self.config().store_timeout,
        };
        let call = async {
            match &intent.expected {
                None => self.store.create_if_absent(&intent.record).await,
                Some(expected) => {
                    self.store
                        .update_if_version_matches(&intent.record, expected)
                        .await
                }
            }
        };
        let result = match tokio::time::timeout(limit, call).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout(limit)),
        };

        match result {
            Ok(version) => WriteOutcome::Committed(version),
            Err(StoreError::Conflict) => WriteOutcome::Conflict,
            Err(StoreError::NotFound) => WriteOutcome::NotFound,
            Err(e) => {
                tracing::warn!(
                    identity = %self.identity(),
                    kind = %intent.kind,
                    error = %e,
                    transient = e.is_transient(),
                    "write failed"
                );
                WriteOutcome::Failed
            }
        }
    }
}

/// `base` plus a random extra of up to `factor * base`
pub(crate) fn jittered(base: Duration, factor: f64) -> Duration {
    if factor <= 0.0 {
        return base;
    }
    base + base.mul_f64(factor * rand::random::<f64>())
}

#[cfg(test)]
#[path = "elector_tests.rs"]
mod tests;
