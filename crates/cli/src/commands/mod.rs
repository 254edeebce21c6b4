// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI command implementations

pub mod run;
pub mod status;

use clap::Args;
use std::path::PathBuf;

/// Which lease record to contend for, and where it lives
#[derive(Args, Debug, Default, Clone)]
pub struct LeaseArgs {
    /// Lease name [default: leader-election-demo]
    #[arg(long)]
    pub lease_name: Option<String>,

    /// Lease namespace [default: default]
    #[arg(long)]
    pub lease_namespace: Option<String>,

    /// Directory holding lease records [default: $XDG_STATE_HOME/baton]
    #[arg(long)]
    pub store_dir: Option<PathBuf>,
}
