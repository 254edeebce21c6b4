// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[test]
fn defaults_match_conventional_timing() {
    let config = ElectionConfig::new("pod-0");

    assert_eq!(config.lease_duration, Duration::from_secs(15));
    assert_eq!(config.renew_deadline, Duration::from_secs(10));
    assert_eq!(config.retry_period, Duration::from_secs(2));
    assert!(config.release_on_cancel);
    assert_eq!(config.lease_duration_seconds(), 15);
    assert_eq!(config.validate(), Ok(()));
}

#[test]
fn retry_period_drives_store_timeout() {
    let config = ElectionConfig::new("pod-0").with_retry_period(Duration::from_millis(500));
    assert_eq!(config.store_timeout, Duration::from_millis(500));
}

#[test]
fn empty_identity_is_rejected() {
    let config = ElectionConfig::new("");
    assert_eq!(config.validate(), Err(ConfigError::EmptyIdentity));
}

#[parameterized(
    retry_equals_deadline = { 15, 10, 10 },
    retry_after_deadline = { 15, 10, 12 },
    deadline_equals_lease = { 10, 10, 2 },
    deadline_after_lease = { 10, 12, 2 },
)]
fn timing_order_is_enforced(lease: u64, deadline: u64, retry: u64) {
    let config = ElectionConfig::new("pod-0")
        .with_lease_duration(Duration::from_secs(lease))
        .with_renew_deadline(Duration::from_secs(deadline))
        .with_retry_period(Duration::from_secs(retry));

    assert!(matches!(
        config.validate(),
        Err(ConfigError::RetryNotBeforeDeadline { .. } | ConfigError::DeadlineNotBeforeLease { .. })
    ));
}

#[test]
fn zero_duration_is_rejected() {
    let config = ElectionConfig::new("pod-0").with_shutdown_timeout(Duration::ZERO);
    assert_eq!(
        config.validate(),
        Err(ConfigError::ZeroDuration("shutdown timeout"))
    );
}

#[test]
fn fractional_lease_is_rejected() {
    let config = ElectionConfig::new("pod-0").with_lease_duration(Duration::from_millis(15_500));
    assert!(matches!(
        config.validate(),
        Err(ConfigError::FractionalLease(_))
    ));
}

#[parameterized(
    negative = { -0.1 },
    one = { 1.0 },
    nan = { f64::NAN },
)]
fn jitter_out_of_range_is_rejected(jitter: f64) {
    let config = ElectionConfig::new("pod-0").with_jitter(jitter);
    assert!(matches!(config.validate(), Err(ConfigError::Jitter(_))));
}

#[test]
fn config_reads_humantime_durations() {
    let config: ElectionConfig = toml::from_str(
        r#"
        identity = "pod-1"
        lease_duration = "30s"
        renew_deadline = "20s"
        retry_period = "4s"
        release_on_cancel = false
        jitter = 0.1
        store_timeout = "3s"
        shutdown_timeout = "1m"
        "#,
    )
    .unwrap();

    assert_eq!(config.identity, HolderId::new("pod-1"));
    assert_eq!(config.lease_duration, Duration::from_secs(30));
    assert_eq!(config.shutdown_timeout, Duration::from_secs(60));
    assert!(!config.release_on_cancel);
    assert_eq!(config.validate(), Ok(()));
}
