// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Effects and events for election orchestration

use crate::record::{HolderId, LeaseRecord, ResourceVersion};

/// Effects are side effects the candidate state machine requests
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Issue a conditional write; its outcome must be fed back through
    /// `Candidate::write_completed` before the next write is issued
    Write(WriteIntent),
    /// Emit an event for the callback dispatcher
    Emit(ElectionEvent),
}

/// Purpose of a conditional write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteKind {
    Acquire,
    Renew,
    Release,
}

impl std::fmt::Display for WriteKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WriteKind::Acquire => write!(f, "acquire"),
            WriteKind::Renew => write!(f, "renew"),
            WriteKind::Release => write!(f, "release"),
        }
    }
}

/// A conditional write against the lease record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteIntent {
    pub kind: WriteKind,
    pub record: LeaseRecord,
    /// `None` means create-if-absent; otherwise update-if-version-matches
    pub expected: Option<ResourceVersion>,
}

/// What the store said about a write
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Accepted at the given new version
    Committed(ResourceVersion),
    /// Someone else wrote first (or created the record first)
    Conflict,
    /// The record vanished
    NotFound,
    /// Timed out or failed in transport; the write may or may not have landed
    Failed,
}

/// Why a leader stopped leading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepDownReason {
    /// No confirmed renewal within the renew deadline
    DeadlineExceeded,
    /// The record names another holder, vanished, or carries a term this
    /// candidate did not write
    Deposed,
    /// The store rejected a renewal (conflict or record gone)
    RenewalRejected,
    /// External cancellation
    Cancelled,
}

impl std::fmt::Display for StepDownReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StepDownReason::DeadlineExceeded => write!(f, "renew deadline exceeded"),
            StepDownReason::Deposed => write!(f, "deposed"),
            StepDownReason::RenewalRejected => write!(f, "renewal rejected"),
            StepDownReason::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Events emitted by the candidate state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElectionEvent {
    /// This candidate became leader for the given term
    StartedLeading { term: u64 },
    /// This candidate is no longer leader
    StoppedLeading { reason: StepDownReason },
    /// The holder seen in the store; emitted on every observation and
    /// deduplicated downstream
    LeaderObserved { holder: Option<HolderId> },
}

#[cfg(test)]
#[path = "effect_tests.rs"]
mod tests;
