// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! baton election engine: drives a candidate against a lease store

mod dispatcher;
mod elector;
mod error;
mod gate;

pub use dispatcher::{
    CallbackDispatcher, EventSender, LeaderCallbacks, LeaderEvent, LeadershipContext,
};
pub use elector::Elector;
pub use error::ElectionError;
pub use gate::{run, CancellationGate, RunSummary};
pub use tokio_util::sync::CancellationToken;
