// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cancellation-driven run loop

use crate::dispatcher::LeaderCallbacks;
use crate::elector::Elector;
use crate::error::ElectionError;
use baton_adapters::LeaseStore;
use baton_core::{Clock, ElectionConfig, ElectionState};
use tokio_util::sync::CancellationToken;

/// How an election ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub terminal_state: ElectionState,
    /// Distinct leadership terms held during the run
    pub terms_led: u64,
    /// Whether the record was cleared on the way out
    pub released: bool,
}

/// Binds one cancellation token to an elector's loop
#[derive(Clone, Debug)]
pub struct CancellationGate {
    token: CancellationToken,
}

impl CancellationGate {
    pub fn new(token: CancellationToken) -> Self {
        Self { token }
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Tick until cancelled, then shut the elector down.
    ///
    /// Cancellation interrupts an in-flight tick as well as the pause
    /// between ticks. Returns once the shutdown sequence has finished or
    /// given up.
    pub async fn drive<S, C, H>(&self, elector: &mut Elector<S, C, H>) -> RunSummary
    where
        S: LeaseStore,
        C: Clock,
        H: LeaderCallbacks,
    {
        loop {
            tokio::select! {
                biased;
                _ = self.token.cancelled() => break,
                _ = elector.tick() => {}
            }

            let pause = elector.next_pause();
            tokio::select! {
                biased;
                _ = self.token.cancelled() => break,
                _ = tokio::time::sleep(pause) => {}
            }
        }

        tracing::info!(
            identity = %elector.identity(),
            state = %elector.state(),
            "cancelled, shutting down"
        );
        if let Err(e) = elector.shutdown().await {
            tracing::warn!(error = %e, "shutdown incomplete");
        }

        let candidate = elector.candidate();
        RunSummary {
            terminal_state: candidate.state(),
            terms_led: candidate.terms_led(),
            released: candidate.released(),
        }
    }
}

/// Run an election until `cancel` fires.
///
/// The config is validated before anything touches the store. Store
/// failures never end the run; only cancellation does.
pub async fn run<S, C, H>(
    config: ElectionConfig,
    store: S,
    clock: C,
    callbacks: H,
    cancel: CancellationToken,
) -> Result<RunSummary, ElectionError>
where
    S: LeaseStore,
    C: Clock,
    H: LeaderCallbacks,
{
    let mut elector = Elector::new(config, store, clock, callbacks)?;
    tracing::info!(
        identity = %elector.identity(),
        lease = %elector.store().key(),
        "starting election"
    );
    Ok(CancellationGate::new(cancel).drive(&mut elector).await)
}

#[cfg(test)]
#[path = "gate_tests.rs"]
mod tests;
