// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Settings file and flag resolution
//!
//! Precedence, highest first: command-line flags, the `POD_NAME`
//! environment variable (identity only), the TOML config file, defaults.

use crate::commands::LeaseArgs;
use crate::error::BatonError;
use baton_core::{ElectionConfig, LeaseKey};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_LEASE_NAME: &str = "leader-election-demo";
pub const DEFAULT_NAMESPACE: &str = "default";

/// Contents of a `--config` file; every field is optional
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub lease_name: Option<String>,
    pub lease_namespace: Option<String>,
    pub identity: Option<String>,
    pub store_dir: Option<PathBuf>,
    #[serde(with = "humantime_serde")]
    pub lease_duration: Option<Duration>,
    #[serde(with = "humantime_serde")]
    pub renew_deadline: Option<Duration>,
    #[serde(with = "humantime_serde")]
    pub retry_period: Option<Duration>,
    #[serde(with = "humantime_serde")]
    pub store_timeout: Option<Duration>,
    #[serde(with = "humantime_serde")]
    pub shutdown_timeout: Option<Duration>,
    pub release_on_cancel: Option<bool>,
    pub jitter: Option<f64>,
}

/// Election values given as flags
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub identity: Option<String>,
    pub lease_duration: Option<Duration>,
    pub renew_deadline: Option<Duration>,
    pub retry_period: Option<Duration>,
    pub no_release_on_cancel: bool,
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self, BatonError> {
        let text =
            std::fs::read_to_string(path).map_err(|e| BatonError::unreadable_config(path, e))?;
        Self::parse(&text).map_err(|e| BatonError::unreadable_config(path, e))
    }

    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    pub fn lease_key(&self, args: &LeaseArgs) -> LeaseKey {
        let namespace = args
            .lease_namespace
            .clone()
            .or_else(|| self.lease_namespace.clone())
            .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string());
        let name = args
            .lease_name
            .clone()
            .or_else(|| self.lease_name.clone())
            .unwrap_or_else(|| DEFAULT_LEASE_NAME.to_string());
        LeaseKey::new(namespace, name)
    }

    /// Directory for `FileStore`, defaulting to `$XDG_STATE_HOME/baton`
    pub fn store_dir(&self, args: &LeaseArgs) -> PathBuf {
        args.store_dir
            .clone()
            .or_else(|| self.store_dir.clone())
            .unwrap_or_else(default_store_dir)
    }

    /// Build and validate the election config
    pub fn election_config(
        &self,
        overrides: &Overrides,
        pod_name: Option<String>,
    ) -> Result<ElectionConfig, BatonError> {
        let identity = non_blank(overrides.identity.clone())
            .or_else(|| non_blank(pod_name))
            .or_else(|| non_blank(self.identity.clone()))
            .ok_or_else(BatonError::missing_identity)?;

        let mut config = ElectionConfig::new(identity);
        if let Some(period) = overrides.retry_period.or(self.retry_period) {
            config = config.with_retry_period(period);
        }
        if let Some(duration) = overrides.lease_duration.or(self.lease_duration) {
            config = config.with_lease_duration(duration);
        }
        if let Some(deadline) = overrides.renew_deadline.or(self.renew_deadline) {
            config = config.with_renew_deadline(deadline);
        }
        if let Some(timeout) = self.store_timeout {
            config = config.with_store_timeout(timeout);
        }
        if let Some(timeout) = self.shutdown_timeout {
            config = config.with_shutdown_timeout(timeout);
        }
        if let Some(jitter) = self.jitter {
            config = config.with_jitter(jitter);
        }
        let release = !overrides.no_release_on_cancel && self.release_on_cancel.unwrap_or(true);
        config = config.with_release_on_cancel(release);

        config.validate().map_err(BatonError::invalid_config)?;
        Ok(config)
    }
}

/// Blank identities count as unset
fn non_blank(id: Option<String>) -> Option<String> {
    id.filter(|id| !id.trim().is_empty())
}

fn default_store_dir() -> PathBuf {
    dirs::state_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("baton")
}

#[cfg(test)]
#[path = "settings_tests.rs"]
mod tests;
