// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Election timing configuration

use crate::record::HolderId;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Configuration rejected at startup
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    #[error("identity must not be empty")]
    EmptyIdentity,
    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),
    #[error("retry period ({retry_period:?}) must be shorter than renew deadline ({renew_deadline:?})")]
    RetryNotBeforeDeadline {
        retry_period: Duration,
        renew_deadline: Duration,
    },
    #[error("renew deadline ({renew_deadline:?}) must be shorter than lease duration ({lease_duration:?})")]
    DeadlineNotBeforeLease {
        renew_deadline: Duration,
        lease_duration: Duration,
    },
    #[error("lease duration ({0:?}) must be a whole number of seconds")]
    FractionalLease(Duration),
    #[error("jitter must be in [0, 1), got {0}")]
    Jitter(f64),
}

/// Per-candidate election configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ElectionConfig {
    /// Identity written into the record while leading
    pub identity: HolderId,
    /// How long a record stays valid after its last renewal
    #[serde(with = "humantime_serde")]
    pub lease_duration: Duration,
    /// How long a leader keeps leading without a confirmed renewal
    #[serde(with = "humantime_serde")]
    pub renew_deadline: Duration,
    /// Base cadence of the control loop
    #[serde(with = "humantime_serde")]
    pub retry_period: Duration,
    /// Clear the holder on cancellation instead of letting the record expire
    pub release_on_cancel: bool,
    /// Random extra delay per tick, as a fraction of `retry_period`
    pub jitter: f64,
    /// Timeout for a single store read or acquisition write
    #[serde(with = "humantime_serde")]
    pub store_timeout: Duration,
    /// Upper bound on the shutdown sequence after cancellation
    #[serde(with = "humantime_serde")]
    pub shutdown_timeout: Duration,
}

impl ElectionConfig {
    pub fn new(identity: impl Into<String>) -> Self {
        Self {
            identity: HolderId::new(identity),
            lease_duration: Duration::from_secs(15),
            renew_deadline: Duration::from_secs(10),
            retry_period: Duration::from_secs(2),
            release_on_cancel: true,
            jitter: 0.2,
            store_timeout: Duration::from_secs(2),
            shutdown_timeout: Duration::from_secs(5),
        }
    }

    pub fn with_lease_duration(mut self, duration: Duration) -> Self {
        self.lease_duration = duration;
        self
    }

    pub fn with_renew_deadline(mut self, deadline: Duration) -> Self {
        self.renew_deadline = deadline;
        self
    }

    /// Set the retry period; the store timeout follows it
    pub fn with_retry_period(mut self, period: Duration) -> Self {
        self.retry_period = period;
        self.store_timeout = period;
        self
    }

    pub fn with_release_on_cancel(mut self, release: bool) -> Self {
        self.release_on_cancel = release;
        self
    }

    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Lease duration as written into the record
    pub fn lease_duration_seconds(&self) -> u32 {
        u32::try_from(self.lease_duration.as_secs()).unwrap_or(u32::MAX)
    }

    /// Check the timing invariants the protocol depends on.
    ///
    /// `retry_period < renew_deadline < lease_duration` is required so that a
    /// leader gets at least one retry before its deadline and steps down
    /// before others may consider the record expired.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.identity.as_str().is_empty() {
            return Err(ConfigError::EmptyIdentity);
        }
        for (name, value) in [
            ("lease duration", self.lease_duration),
            ("renew deadline", self.renew_deadline),
            ("retry period", self.retry_period),
            ("store timeout", self.store_timeout),
            ("shutdown timeout", self.shutdown_timeout),
        ] {
            if value.is_zero() {
                return Err(ConfigError::ZeroDuration(name));
            }
        }
        if self.retry_period >= self.renew_deadline {
            return Err(ConfigError::RetryNotBeforeDeadline {
                retry_period: self.retry_period,
                renew_deadline: self.renew_deadline,
            });
        }
        if self.renew_deadline >= self.lease_duration {
            return Err(ConfigError::DeadlineNotBeforeLease {
                renew_deadline: self.renew_deadline,
                lease_duration: self.lease_duration,
            });
        }
        if self.lease_duration.subsec_nanos() != 0 {
            return Err(ConfigError::FractionalLease(self.lease_duration));
        }
        if !(0.0..1.0).contains(&self.jitter) {
            return Err(ConfigError::Jitter(self.jitter));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
