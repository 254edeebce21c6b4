// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `baton status` - Show the current lease record

use super::LeaseArgs;
use crate::settings::Settings;
use anyhow::Result;
use baton_adapters::{FileStore, LeaseStore};
use baton_core::{LeaseKey, VersionedRecord};
use chrono::{DateTime, Utc};
use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct StatusArgs {
    #[command(flatten)]
    pub lease: LeaseArgs,

    /// TOML settings file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Print the record as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn status(args: StatusArgs) -> Result<()> {
    let settings = match &args.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    let key = settings.lease_key(&args.lease);
    let store = FileStore::open(settings.store_dir(&args.lease), key.clone())?;
    let current = store.read().await?;

    if args.json {
        println!("{}", render_json(current.as_ref(), Utc::now())?);
    } else {
        print!("{}", render_text(&key, current.as_ref(), Utc::now()));
    }
    Ok(())
}

fn render_text(key: &LeaseKey, current: Option<&VersionedRecord>, now: DateTime<Utc>) -> String {
    let Some(current) = current else {
        return format!("No lease record for {}\n", key);
    };
    let record = &current.record;
    let stamp = |t: Option<DateTime<Utc>>| t.map_or_else(|| "-".to_string(), |t| t.to_rfc3339());

    let mut out = format!("Lease: {}\n", key);
    out.push_str(&format!(
        "  Holder: {}\n",
        record.holder().map_or("(none)", |h| h.as_str())
    ));
    out.push_str(&format!("  Transitions: {}\n", record.leader_transitions));
    out.push_str(&format!("  Acquired: {}\n", stamp(record.acquire_time)));
    out.push_str(&format!("  Renewed: {}\n", stamp(record.renew_time)));
    out.push_str(&format!("  Duration: {}s\n", record.lease_duration_seconds));
    out.push_str(&format!("  Version: {}\n", current.version));
    out.push_str(&format!("  Expired: {}\n", record.is_expired(now)));
    out
}

fn render_json(current: Option<&VersionedRecord>, now: DateTime<Utc>) -> Result<String> {
    let value = match current {
        None => serde_json::Value::Null,
        Some(current) => serde_json::json!({
            "version": current.version,
            "expired": current.record.is_expired(now),
            "record": current.record,
        }),
    };
    Ok(serde_json::to_string_pretty(&value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use baton_core::{HolderId, LeaseRecord, ResourceVersion};
    use chrono::TimeDelta;

    fn held_at(now: DateTime<Utc>) -> VersionedRecord {
        let record = LeaseRecord::claim(&HolderId::new("pod-a"), 15, now, None);
        VersionedRecord::new(record, ResourceVersion::new("3"))
    }

    #[test]
    fn missing_record_is_reported_by_key() {
        let key = LeaseKey::new("default", "demo");
        assert_eq!(
            render_text(&key, None, Utc::now()),
            "No lease record for default/demo\n"
        );
    }

    #[test]
    fn text_shows_holder_and_expiry() {
        let now = Utc::now();
        let key = LeaseKey::new("default", "demo");
        let current = held_at(now);

        let fresh = render_text(&key, Some(&current), now);
        assert!(fresh.contains("Holder: pod-a"));
        assert!(fresh.contains("Transitions: 1"));
        assert!(fresh.contains("Version: 3"));
        assert!(fresh.contains("Expired: false"));

        let stale = render_text(&key, Some(&current), now + TimeDelta::seconds(16));
        assert!(stale.contains("Expired: true"));
    }

    #[test]
    fn released_record_has_no_holder() {
        let now = Utc::now();
        let mut current = held_at(now);
        current.record = current.record.released();

        let text = render_text(&LeaseKey::new("default", "demo"), Some(&current), now);
        assert!(text.contains("Holder: (none)"));
        assert!(text.contains("Renewed: -"));
    }

    #[test]
    fn json_uses_wire_field_names() {
        let now = Utc::now();
        let json = render_json(Some(&held_at(now)), now).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["version"], "3");
        assert_eq!(value["expired"], false);
        assert_eq!(value["record"]["holderIdentity"], "pod-a");
        assert_eq!(value["record"]["leaderTransitions"], 1);
    }

    #[test]
    fn json_absent_record_is_null() {
        assert_eq!(render_json(None, Utc::now()).unwrap(), "null");
    }
}
