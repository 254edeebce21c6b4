// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Leadership callbacks that log transitions and run a placeholder workload

use baton_core::HolderId;
use baton_engine::{LeaderCallbacks, LeadershipContext};
use std::time::Duration;
use tracing::{debug, info};

const WORK_INTERVAL: Duration = Duration::from_secs(5);

pub struct LoggingCallbacks {
    identity: HolderId,
}

impl LoggingCallbacks {
    pub fn new(identity: HolderId) -> Self {
        Self { identity }
    }
}

impl LeaderCallbacks for LoggingCallbacks {
    fn on_started_leading(&self, ctx: LeadershipContext) {
        info!(term = ctx.term(), "{} is now the leader", ctx.identity());
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(WORK_INTERVAL);
            loop {
                tokio::select! {
                    _ = ctx.cancelled() => break,
                    _ = interval.tick() => debug!(term = ctx.term(), "leader work tick"),
                }
            }
            debug!(term = ctx.term(), "leader work stopped");
        });
    }

    fn on_stopped_leading(&self) {
        info!("{} lost leadership", self.identity);
    }

    fn on_new_leader(&self, leader: Option<&HolderId>) {
        match leader {
            Some(leader) if *leader == self.identity => {}
            Some(leader) => info!("new leader observed: {}", leader),
            None => info!("lease released, no current leader"),
        }
    }
}
