// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `baton run` - Join the election and hold leadership until signalled

use super::LeaseArgs;
use crate::callbacks::LoggingCallbacks;
use crate::settings::{Overrides, Settings};
use anyhow::Result;
use baton_adapters::{FileStore, TracedLeaseStore};
use baton_core::SystemClock;
use baton_engine::CancellationToken;
use clap::Args;
use std::path::PathBuf;
use std::time::Duration;
use tokio::signal::unix::{signal, SignalKind};
use tracing::info;

#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub lease: LeaseArgs,

    /// Candidate identity [env: POD_NAME]
    #[arg(long)]
    pub identity: Option<String>,

    /// TOML settings file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// How long the record stays valid after a renewal (whole seconds)
    #[arg(long, value_parser = humantime::parse_duration)]
    pub lease_duration: Option<Duration>,

    /// How long a leader keeps leading without a confirmed renewal
    #[arg(long, value_parser = humantime::parse_duration)]
    pub renew_deadline: Option<Duration>,

    /// Base cadence of acquire and renew attempts
    #[arg(long, value_parser = humantime::parse_duration)]
    pub retry_period: Option<Duration>,

    /// Leave the lease to expire on shutdown instead of releasing it
    #[arg(long)]
    pub no_release_on_cancel: bool,
}

impl RunArgs {
    fn overrides(&self) -> Overrides {
        Overrides {
            identity: self.identity.clone(),
            lease_duration: self.lease_duration,
            renew_deadline: self.renew_deadline,
            retry_period: self.retry_period,
            no_release_on_cancel: self.no_release_on_cancel,
        }
    }
}

pub async fn run(args: RunArgs) -> Result<()> {
    let settings = match &args.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    let config = settings.election_config(&args.overrides(), std::env::var("POD_NAME").ok())?;
    let key = settings.lease_key(&args.lease);
    let store = TracedLeaseStore::new(FileStore::open(settings.store_dir(&args.lease), key)?);

    // Handlers go in before the election starts so an early signal still releases
    let cancel = CancellationToken::new();
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    let watcher = cancel.clone();
    tokio::spawn(async move {
        tokio::select! {
            _ = sigterm.recv() => info!("received SIGTERM, shutting down"),
            _ = sigint.recv() => info!("received SIGINT, shutting down"),
            _ = watcher.cancelled() => {}
        }
        watcher.cancel();
    });

    let callbacks = LoggingCallbacks::new(config.identity.clone());
    let summary = baton_engine::run(config, store, SystemClock, callbacks, cancel).await?;
    info!(
        terms_led = summary.terms_led,
        released = summary.released,
        "election stopped"
    );
    Ok(())
}
