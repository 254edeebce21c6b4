// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the election engine

use baton_core::ConfigError;
use std::time::Duration;
use thiserror::Error;

/// Errors surfaced to the caller of the election.
///
/// Store failures are not here: they are retried on the next tick and only
/// ever show up as lost leadership.
#[derive(Debug, Error)]
pub enum ElectionError {
    #[error("invalid election config: {0}")]
    Config(#[from] ConfigError),
    #[error("shutdown did not finish within {0:?}")]
    ShutdownTimedOut(Duration),
}
