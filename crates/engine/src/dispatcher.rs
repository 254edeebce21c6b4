// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Leadership callbacks
//!
//! The candidate emits a small fixed set of events; the dispatcher turns
//! them into user callbacks with exactly-once start/stop pairing and
//! deduplicated leader observations.

use baton_core::{ElectionEvent, HolderId};
use tokio::sync::mpsc;
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

/// Scope of one leadership term.
///
/// Cancelled exactly when the elector stops leading, before
/// [`LeaderCallbacks::on_stopped_leading`] runs. Work started on behalf of
/// the leader should stop when this is cancelled.
#[derive(Clone, Debug)]
pub struct LeadershipContext {
    identity: HolderId,
    term: u64,
    token: CancellationToken,
}

impl LeadershipContext {
    pub fn identity(&self) -> &HolderId {
        &self.identity
    }

    /// Fencing term of this leadership
    pub fn term(&self) -> u64 {
        self.term
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once leadership ends
    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.token.cancelled()
    }

    /// Token tied to this term, for handing to spawned work
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }
}

/// User hooks for leadership transitions.
///
/// Called synchronously from the election loop; long-running work belongs
/// in a task spawned from `on_started_leading`.
pub trait LeaderCallbacks: Send + Sync + 'static {
    fn on_started_leading(&self, ctx: LeadershipContext);

    fn on_stopped_leading(&self);

    /// The holder named by the record changed (`None` once released)
    fn on_new_leader(&self, _leader: Option<&HolderId>) {}
}

/// Leadership transitions as plain values
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeaderEvent {
    StartedLeading { term: u64 },
    StoppedLeading,
    NewLeader(Option<HolderId>),
}

/// Callbacks that forward every transition over a channel
#[derive(Clone, Debug)]
pub struct EventSender {
    tx: mpsc::UnboundedSender<LeaderEvent>,
}

impl EventSender {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<LeaderEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn send(&self, event: LeaderEvent) {
        // Receiver gone means nobody is listening any more
        let _ = self.tx.send(event);
    }
}

impl LeaderCallbacks for EventSender {
    fn on_started_leading(&self, ctx: LeadershipContext) {
        self.send(LeaderEvent::StartedLeading { term: ctx.term() });
    }

    fn on_stopped_leading(&self) {
        self.send(LeaderEvent::StoppedLeading);
    }

    fn on_new_leader(&self, leader: Option<&HolderId>) {
        self.send(LeaderEvent::NewLeader(leader.cloned()));
    }
}

/// Turns election events into callback invocations
pub struct CallbackDispatcher<H> {
    callbacks: H,
    identity: HolderId,
    /// Token of the term being led, if any
    leadership: Option<CancellationToken>,
    /// Last holder reported through `on_new_leader`
    reported_leader: Option<HolderId>,
}

impl<H: LeaderCallbacks> CallbackDispatcher<H> {
    pub fn new(identity: HolderId, callbacks: H) -> Self {
        Self {
            callbacks,
            identity,
            leadership: None,
            reported_leader: None,
        }
    }

    pub fn callbacks(&self) -> &H {
        &self.callbacks
    }

    pub fn is_leading(&self) -> bool {
        self.leadership.is_some()
    }

    /// Holder most recently reported to `on_new_leader`
    pub fn reported_leader(&self) -> Option<&HolderId> {
        self.reported_leader.as_ref()
    }

    pub fn dispatch(&mut self, event: ElectionEvent) {
        match event {
            ElectionEvent::StartedLeading { term } => self.started(term),
            ElectionEvent::StoppedLeading { reason } => {
                tracing::debug!(%reason, "leadership ended");
                self.stopped();
            }
            ElectionEvent::LeaderObserved { holder } => self.observed(holder),
        }
    }

    fn started(&mut self, term: u64) {
        if self.leadership.is_some() {
            tracing::warn!(term, "already leading, ignoring duplicate start");
            return;
        }
        let token = CancellationToken::new();
        self.leadership = Some(token.clone());
        tracing::info!(identity = %self.identity, term, "started leading");
        self.callbacks.on_started_leading(LeadershipContext {
            identity: self.identity.clone(),
            term,
            token,
        });
    }

    fn stopped(&mut self) {
        let Some(token) = self.leadership.take() else {
            return;
        };
        token.cancel();
        tracing::info!(identity = %self.identity, "stopped leading");
        self.callbacks.on_stopped_leading();
    }

    fn observed(&mut self, holder: Option<HolderId>) {
        if self.reported_leader == holder {
            return;
        }
        match &holder {
            Some(leader) => tracing::info!(%leader, "leader changed"),
            None => tracing::info!("lease released, no leader"),
        }
        self.reported_leader = holder;
        self.callbacks.on_new_leader(self.reported_leader.as_ref());
    }
}

impl<H> Drop for CallbackDispatcher<H> {
    fn drop(&mut self) {
        // Leadership work must not outlive the elector
        if let Some(token) = self.leadership.take() {
            token.cancel();
        }
    }
}

#[cfg(test)]
#[path = "dispatcher_tests.rs"]
mod tests;
