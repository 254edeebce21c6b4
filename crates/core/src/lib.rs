// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! baton-core: pure pieces of lease-based leader election
//!
//! This crate provides:
//! - The lease record data model shared through the store
//! - Election timing configuration and its startup validation
//! - The candidate state machine, which turns store observations into
//!   conditional writes and leadership events without doing any I/O
//! - A clock abstraction so all of the above runs under test time

pub mod clock;
pub mod config;
pub mod effect;
pub mod election;
pub mod record;

pub use clock::{Clock, FakeClock, SystemClock};
pub use config::{ConfigError, ElectionConfig};
pub use effect::{Effect, ElectionEvent, StepDownReason, WriteIntent, WriteKind, WriteOutcome};
pub use election::{Candidate, ElectionState};
pub use record::{HolderId, LeaseKey, LeaseRecord, ResourceVersion, VersionedRecord};
