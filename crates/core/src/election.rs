// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Candidate state machine for lease-based leader election
//!
//! The candidate decides; it never performs I/O. Each call takes what the
//! store just reported and returns effects: conditional writes to issue and
//! events to dispatch. The async driver feeds every write outcome back
//! through [`Candidate::write_completed`] before issuing the next write, so
//! writes from one candidate are strictly sequential.
//!
//! Leadership is judged on the candidate's own monotonic clock: a leader
//! leads only while its last *locally confirmed* renewal is younger than
//! `renew_deadline`, whatever the record says.

use crate::clock::Clock;
use crate::config::ElectionConfig;
use crate::effect::{
    Effect, ElectionEvent, StepDownReason, WriteIntent, WriteKind, WriteOutcome,
};
use crate::record::{HolderId, LeaseRecord, ResourceVersion, VersionedRecord};
use std::time::{Duration, Instant};

/// Election state of one candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElectionState {
    /// No opinion yet; nothing read
    Observing,
    /// Another identity holds an unexpired lease, or the last attempt lost
    Follower,
    /// A claim is in flight
    Acquiring,
    /// This identity holds the lease and renews it
    Leader,
    /// Graceful step-down: the clearing write is owed or in flight
    Releasing,
    /// Terminal
    Stopped,
}

impl std::fmt::Display for ElectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ElectionState::Observing => "observing",
            ElectionState::Follower => "follower",
            ElectionState::Acquiring => "acquiring",
            ElectionState::Leader => "leader",
            ElectionState::Releasing => "releasing",
            ElectionState::Stopped => "stopped",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone)]
struct PendingWrite {
    kind: WriteKind,
    record: LeaseRecord,
    issued_at: Instant,
}

/// One candidate's view of the election
#[derive(Debug, Clone)]
pub struct Candidate {
    config: ElectionConfig,
    state: ElectionState,
    /// Last snapshot read from, or committed to, the store
    observed: Option<VersionedRecord>,
    /// When the last confirmed renewal (or acquisition) was issued
    last_renewed: Option<Instant>,
    /// Fencing term this candidate wrote when it acquired
    term: Option<u64>,
    pending: Option<PendingWrite>,
    /// Term of a record bearing our identity that we did not write
    disowned_term: Option<u64>,
    /// Term the release write may clear
    release_term: Option<u64>,
    /// Term of a record naming us that may still stand although we no
    /// longer lead it: a claim without confirmation, or a lease given up
    /// without being deposed. Settled by the next successful read.
    unconfirmed_term: Option<u64>,
    terms_led: u64,
    released: bool,
}

impl Candidate {
    pub fn new(config: ElectionConfig) -> Self {
        Self {
            config,
            state: ElectionState::Observing,
            observed: None,
            last_renewed: None,
            term: None,
            pending: None,
            disowned_term: None,
            release_term: None,
            unconfirmed_term: None,
            terms_led: 0,
            released: false,
        }
    }

    pub fn config(&self) -> &ElectionConfig {
        &self.config
    }

    pub fn identity(&self) -> &HolderId {
        &self.config.identity
    }

    pub fn state(&self) -> ElectionState {
        self.state
    }

    pub fn is_leader(&self) -> bool {
        self.state == ElectionState::Leader
    }

    pub fn is_stopped(&self) -> bool {
        self.state == ElectionState::Stopped
    }

    /// Term currently led, if leading
    pub fn term(&self) -> Option<u64> {
        self.term
    }

    pub fn observed(&self) -> Option<&VersionedRecord> {
        self.observed.as_ref()
    }

    /// Number of distinct leadership terms this candidate has held
    pub fn terms_led(&self) -> u64 {
        self.terms_led
    }

    /// Whether the best-effort release write was accepted
    pub fn released(&self) -> bool {
        self.released
    }

    /// Whether leadership is in a state that owes a release on cancellation
    pub fn owes_release(&self) -> bool {
        self.config.release_on_cancel
            && (matches!(
                self.state,
                ElectionState::Leader | ElectionState::Acquiring | ElectionState::Releasing
            ) || self.unconfirmed_term.is_some())
    }

    /// True when leading and the last confirmed renewal is at least
    /// `renew_deadline` old
    pub fn deadline_exceeded(&self, clock: &impl Clock) -> bool {
        if self.state != ElectionState::Leader {
            return false;
        }
        match self.last_renewed {
            None => true,
            Some(at) => clock.now().saturating_duration_since(at) >= self.config.renew_deadline,
        }
    }

    /// Timeout for the next renewal write: the store timeout, capped by what
    /// remains of the renew deadline
    pub fn renew_timeout(&self, clock: &impl Clock) -> Duration {
        self.deadline_remaining(clock)
            .unwrap_or(Duration::ZERO)
            .min(self.config.store_timeout)
    }

    /// Time left before the renew deadline; `None` unless leading
    pub fn deadline_remaining(&self, clock: &impl Clock) -> Option<Duration> {
        if self.state != ElectionState::Leader {
            return None;
        }
        let at = self.last_renewed?;
        Some(
            self.config
                .renew_deadline
                .saturating_sub(clock.now().saturating_duration_since(at)),
        )
    }

    /// Step down if the renew deadline has passed. Called at the start of
    /// every tick, before anything is read or written.
    pub fn check_deadline(&mut self, clock: &impl Clock) -> Vec<Effect> {
        if self.deadline_exceeded(clock) {
            self.step_down(StepDownReason::DeadlineExceeded)
        } else {
            Vec::new()
        }
    }

    /// A read failed; nothing changes except the deadline check
    pub fn read_failed(&mut self, clock: &impl Clock) -> Vec<Effect> {
        self.check_deadline(clock)
    }

    /// Evaluate a fresh snapshot of the record
    pub fn observe(&mut self, snapshot: Option<VersionedRecord>, clock: &impl Clock) -> Vec<Effect> {
        match self.state {
            ElectionState::Releasing | ElectionState::Stopped => return Vec::new(),
            _ => self.unconfirmed_term = None,
        }
        match self.state {
            ElectionState::Leader => self.observe_as_leader(snapshot, clock),
            ElectionState::Observing | ElectionState::Follower => {
                self.observe_as_candidate(snapshot, clock)
            }
            ElectionState::Acquiring => {
                // The previous claim was abandoned mid-flight; its outcome is
                // unknown, so judge the record afresh.
                self.pending = None;
                self.state = ElectionState::Follower;
                self.observe_as_candidate(snapshot, clock)
            }
            ElectionState::Releasing | ElectionState::Stopped => Vec::new(),
        }
    }

    fn observe_as_leader(
        &mut self,
        snapshot: Option<VersionedRecord>,
        clock: &impl Clock,
    ) -> Vec<Effect> {
        let observed = leader_observed(&snapshot);

        if self.deadline_exceeded(clock) {
            let mut effects = self.step_down(StepDownReason::DeadlineExceeded);
            effects.push(observed);
            self.observed = snapshot;
            return effects;
        }

        match snapshot {
            Some(current)
                if current.record.is_held_by(&self.config.identity)
                    && Some(current.record.leader_transitions) == self.term =>
            {
                let record = current.record.renewed(clock.wall());
                let intent = self.issue(
                    WriteKind::Renew,
                    record,
                    Some(current.version.clone()),
                    clock,
                );
                self.observed = Some(current);
                vec![observed, Effect::Write(intent)]
            }
            other => {
                if let Some(current) = &other {
                    if current.record.is_held_by(&self.config.identity) {
                        self.disowned_term = Some(current.record.leader_transitions);
                    }
                }
                let mut effects = self.step_down(StepDownReason::Deposed);
                effects.push(observed);
                self.observed = other;
                effects
            }
        }
    }

    fn observe_as_candidate(
        &mut self,
        snapshot: Option<VersionedRecord>,
        clock: &impl Clock,
    ) -> Vec<Effect> {
        let observed = leader_observed(&snapshot);
        let now = clock.wall();

        let claimable = match &snapshot {
            None => true,
            Some(current) => {
                let ours = current.record.is_held_by(&self.config.identity)
                    && self.disowned_term != Some(current.record.leader_transitions);
                ours || current.record.is_expired(now)
            }
        };

        if !claimable {
            self.state = ElectionState::Follower;
            self.observed = snapshot;
            return vec![observed];
        }

        let record = LeaseRecord::claim(
            &self.config.identity,
            self.config.lease_duration_seconds(),
            now,
            snapshot.as_ref().map(|v| &v.record),
        );
        let expected = snapshot.as_ref().map(|v| v.version.clone());
        self.state = ElectionState::Acquiring;
        let intent = self.issue(WriteKind::Acquire, record, expected, clock);
        self.observed = snapshot;
        vec![observed, Effect::Write(intent)]
    }

    /// Feed back the outcome of the write most recently issued
    pub fn write_completed(&mut self, outcome: WriteOutcome, clock: &impl Clock) -> Vec<Effect> {
        let Some(pending) = self.pending.take() else {
            return Vec::new();
        };
        match pending.kind {
            WriteKind::Acquire => self.acquire_completed(pending, outcome, clock),
            WriteKind::Renew => self.renew_completed(pending, outcome, clock),
            WriteKind::Release => self.release_completed(pending, outcome),
        }
    }

    fn acquire_completed(
        &mut self,
        pending: PendingWrite,
        outcome: WriteOutcome,
        clock: &impl Clock,
    ) -> Vec<Effect> {
        if self.state != ElectionState::Acquiring {
            return Vec::new();
        }
        match outcome {
            WriteOutcome::Committed(version) => {
                let held_for = clock.now().saturating_duration_since(pending.issued_at);
                if held_for >= self.config.renew_deadline {
                    // Confirmed too late to lead safely; let it expire.
                    tracing::warn!(
                        identity = %self.config.identity,
                        elapsed_ms = held_for.as_millis() as u64,
                        "claim confirmed after renew deadline, not leading"
                    );
                    self.state = ElectionState::Follower;
                    self.unconfirmed_term = Some(pending.record.leader_transitions);
                    self.observed = Some(VersionedRecord::new(pending.record, version));
                    return Vec::new();
                }

                let term = pending.record.leader_transitions;
                self.state = ElectionState::Leader;
                self.term = Some(term);
                self.last_renewed = Some(pending.issued_at);
                self.disowned_term = None;
                self.terms_led += 1;
                self.observed = Some(VersionedRecord::new(pending.record, version));
                tracing::info!(identity = %self.config.identity, term, "acquired lease");
                vec![
                    Effect::Emit(ElectionEvent::StartedLeading { term }),
                    Effect::Emit(ElectionEvent::LeaderObserved {
                        holder: Some(self.config.identity.clone()),
                    }),
                ]
            }
            WriteOutcome::Conflict | WriteOutcome::NotFound => {
                tracing::debug!(identity = %self.config.identity, "lost acquisition race");
                self.state = ElectionState::Follower;
                Vec::new()
            }
            WriteOutcome::Failed => {
                // The claim may still have landed; remember it for release
                self.unconfirmed_term = Some(pending.record.leader_transitions);
                self.state = ElectionState::Follower;
                Vec::new()
            }
        }
    }

    fn renew_completed(
        &mut self,
        pending: PendingWrite,
        outcome: WriteOutcome,
        clock: &impl Clock,
    ) -> Vec<Effect> {
        if self.state != ElectionState::Leader {
            return Vec::new();
        }
        match outcome {
            WriteOutcome::Committed(version) => {
                self.observed = Some(VersionedRecord::new(pending.record, version));
                // A renewal that lands after the deadline does not count.
                if self.deadline_exceeded(clock) {
                    return self.step_down(StepDownReason::DeadlineExceeded);
                }
                self.last_renewed = Some(pending.issued_at);
                Vec::new()
            }
            WriteOutcome::Conflict | WriteOutcome::NotFound => {
                self.step_down(StepDownReason::RenewalRejected)
            }
            WriteOutcome::Failed => self.check_deadline(clock),
        }
    }

    fn release_completed(&mut self, pending: PendingWrite, outcome: WriteOutcome) -> Vec<Effect> {
        self.state = ElectionState::Stopped;
        self.release_term = None;
        match outcome {
            WriteOutcome::Committed(version) => {
                self.released = true;
                self.observed = Some(VersionedRecord::new(pending.record, version));
                tracing::info!(identity = %self.config.identity, "released lease");
                vec![Effect::Emit(ElectionEvent::LeaderObserved { holder: None })]
            }
            other => {
                tracing::debug!(
                    identity = %self.config.identity,
                    outcome = ?other,
                    "release not accepted, record will expire"
                );
                Vec::new()
            }
        }
    }

    /// External cancellation.
    ///
    /// A leader stops leading here, before any further write. If a release is
    /// owed the candidate moves to `Releasing` and [`Candidate::release`] must
    /// follow; otherwise it is `Stopped`.
    pub fn cancel(&mut self) -> Vec<Effect> {
        let mut effects = Vec::new();
        let release_term = match self.state {
            ElectionState::Leader => {
                let term = self.term;
                effects = self.step_down(StepDownReason::Cancelled);
                term
            }
            ElectionState::Acquiring => self
                .pending
                .as_ref()
                .map(|pending| pending.record.leader_transitions),
            ElectionState::Observing | ElectionState::Follower => self.unconfirmed_term.take(),
            ElectionState::Releasing | ElectionState::Stopped => return effects,
        };

        self.pending = None;
        if self.config.release_on_cancel && release_term.is_some() {
            self.state = ElectionState::Releasing;
            self.release_term = release_term;
        } else {
            self.state = ElectionState::Stopped;
        }
        effects
    }

    /// Issue the best-effort clearing write.
    ///
    /// `latest` is a fresh read if one could be made; otherwise the last
    /// observed snapshot is used. The record is only cleared while it still
    /// names this identity at the term this candidate wrote.
    pub fn release(&mut self, latest: Option<VersionedRecord>, clock: &impl Clock) -> Vec<Effect> {
        if self.state != ElectionState::Releasing {
            return Vec::new();
        }
        let target = latest.or_else(|| self.observed.clone());
        match (target, self.release_term) {
            (Some(current), Some(term))
                if current.record.is_held_by(&self.config.identity)
                    && current.record.leader_transitions == term =>
            {
                let intent = self.issue(
                    WriteKind::Release,
                    current.record.released(),
                    Some(current.version),
                    clock,
                );
                vec![Effect::Write(intent)]
            }
            _ => {
                self.state = ElectionState::Stopped;
                self.release_term = None;
                Vec::new()
            }
        }
    }

    /// Give up on any owed release (shutdown timed out)
    pub fn abandon(&mut self) {
        self.pending = None;
        self.release_term = None;
        self.unconfirmed_term = None;
        self.state = ElectionState::Stopped;
    }

    fn issue(
        &mut self,
        kind: WriteKind,
        record: LeaseRecord,
        expected: Option<ResourceVersion>,
        clock: &impl Clock,
    ) -> WriteIntent {
        self.pending = Some(PendingWrite {
            kind,
            record: record.clone(),
            issued_at: clock.now(),
        });
        WriteIntent {
            kind,
            record,
            expected,
        }
    }

    fn step_down(&mut self, reason: StepDownReason) -> Vec<Effect> {
        tracing::warn!(
            identity = %self.config.identity,
            term = ?self.term,
            %reason,
            "stepping down"
        );
        if matches!(
            reason,
            StepDownReason::DeadlineExceeded | StepDownReason::RenewalRejected
        ) {
            // The record may still name us at this term
            self.unconfirmed_term = self.term;
        }
        self.state = ElectionState::Follower;
        self.term = None;
        self.last_renewed = None;
        self.pending = None;
        vec![Effect::Emit(ElectionEvent::StoppedLeading { reason })]
    }
}

fn leader_observed(snapshot: &Option<VersionedRecord>) -> Effect {
    Effect::Emit(ElectionEvent::LeaderObserved {
        holder: snapshot
            .as_ref()
            .and_then(|current| current.record.holder().cloned()),
    })
}

#[cfg(test)]
#[path = "election_tests.rs"]
mod tests;
