// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lease record data model
//!
//! The record is the only state shared between candidates. It travels through
//! the store as JSON with camelCase field names; an unheld lease encodes its
//! holder as the empty string.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Identity of a candidate (a lease holder once it wins)
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HolderId(pub String);

impl HolderId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for HolderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Namespace/name pair identifying one lease record in a store
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LeaseKey {
    pub namespace: String,
    pub name: String,
}

impl LeaseKey {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl std::fmt::Display for LeaseKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Opaque version token handed out by the store.
///
/// A conditional update must present the version it read; the store rejects
/// it if the record has been written since.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceVersion(pub String);

impl ResourceVersion {
    pub fn new(version: impl Into<String>) -> Self {
        Self(version.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ResourceVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The shared lease record
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaseRecord {
    /// Current (believed) leader; `None` means unheld
    #[serde(default, with = "holder_field")]
    pub holder_identity: Option<HolderId>,
    /// Agreed-upon staleness window
    pub lease_duration_seconds: u32,
    /// When the current holder last went from non-leader to leader
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acquire_time: Option<DateTime<Utc>>,
    /// When the current holder last renewed (including acquisition)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub renew_time: Option<DateTime<Utc>>,
    /// Fencing term: bumped every time the holder changes to a new identity
    #[serde(default)]
    pub leader_transitions: u64,
}

impl LeaseRecord {
    /// Build the record a candidate writes to claim leadership.
    ///
    /// `previous` is the record being replaced, if any. The fencing term is
    /// carried over unchanged when the previous holder was this same identity
    /// (crash-restart) and incremented otherwise.
    pub fn claim(
        identity: &HolderId,
        lease_duration_seconds: u32,
        now: DateTime<Utc>,
        previous: Option<&LeaseRecord>,
    ) -> Self {
        let previous_transitions = previous.map_or(0, |r| r.leader_transitions);
        let same_holder = previous.and_then(LeaseRecord::holder) == Some(identity);
        let leader_transitions = if same_holder {
            previous_transitions
        } else {
            previous_transitions.saturating_add(1)
        };

        Self {
            holder_identity: Some(identity.clone()),
            lease_duration_seconds,
            acquire_time: Some(now),
            renew_time: Some(now),
            leader_transitions,
        }
    }

    /// The same record with `renew_time` refreshed.
    ///
    /// Never moves `renew_time` before `acquire_time`, even if the wall clock
    /// stepped backwards since acquisition.
    pub fn renewed(&self, now: DateTime<Utc>) -> Self {
        let renew_time = match self.acquire_time {
            Some(acquired) if acquired > now => acquired,
            _ => now,
        };
        Self {
            renew_time: Some(renew_time),
            ..self.clone()
        }
    }

    /// The record written on graceful step-down: unheld, term preserved
    pub fn released(&self) -> Self {
        Self {
            holder_identity: None,
            renew_time: None,
            ..self.clone()
        }
    }

    pub fn holder(&self) -> Option<&HolderId> {
        self.holder_identity.as_ref()
    }

    pub fn is_held(&self) -> bool {
        self.holder_identity.is_some()
    }

    pub fn is_held_by(&self, identity: &HolderId) -> bool {
        self.holder() == Some(identity)
    }

    pub fn lease_duration(&self) -> Duration {
        Duration::from_secs(u64::from(self.lease_duration_seconds))
    }

    /// Whether the record is effectively unheld at `now`.
    ///
    /// True when nobody holds it, when it was never renewed, or when more
    /// than `lease_duration_seconds` have passed since `renew_time`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        if !self.is_held() {
            return true;
        }
        match self.renew_time {
            None => true,
            Some(renewed) => {
                now.signed_duration_since(renewed)
                    > TimeDelta::seconds(i64::from(self.lease_duration_seconds))
            }
        }
    }
}

/// A record together with the version the store holds it at
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VersionedRecord {
    pub record: LeaseRecord,
    pub version: ResourceVersion,
}

impl VersionedRecord {
    pub fn new(record: LeaseRecord, version: ResourceVersion) -> Self {
        Self { record, version }
    }
}

/// Wire encoding of the holder: `""` for unheld
mod holder_field {
    use super::HolderId;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(holder: &Option<HolderId>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(holder.as_ref().map_or("", HolderId::as_str))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<HolderId>, D::Error> {
        let raw = Option::<String>::deserialize(d)?;
        Ok(raw.filter(|s| !s.is_empty()).map(HolderId))
    }
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod tests;
