// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `baton run` against a real store directory, stopped by signals

#![cfg(unix)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::thread::sleep;
use std::time::{Duration, Instant};

fn spawn_candidate(store: &Path, identity: &str, extra: &[&str]) -> Child {
    Command::new(env!("CARGO_BIN_EXE_baton"))
        .args(["run", "--lease-name", "signals"])
        .args(["--lease-duration", "2s", "--renew-deadline", "1s"])
        .args(["--retry-period", "200ms"])
        .args(extra)
        .arg("--store-dir")
        .arg(store)
        .env("POD_NAME", identity)
        .env_remove("RUST_LOG")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .expect("failed to spawn baton")
}

fn stored_holder(store: &Path) -> Option<String> {
    let text = std::fs::read_to_string(store.join("default/signals.json")).ok()?;
    let stored: serde_json::Value = serde_json::from_str(&text).ok()?;
    stored["record"]["holderIdentity"]
        .as_str()
        .map(str::to_string)
}

fn wait_for_holder(store: &Path, expected: &str) -> bool {
    let deadline = Instant::now() + Duration::from_secs(10);
    while Instant::now() < deadline {
        if stored_holder(store).as_deref() == Some(expected) {
            return true;
        }
        sleep(Duration::from_millis(50));
    }
    false
}

fn stop(child: &mut Child, signal: Signal) -> std::process::ExitStatus {
    kill(Pid::from_raw(child.id() as i32), signal).expect("failed to signal baton");
    child.wait().expect("failed to wait for baton")
}

#[test]
fn sigterm_releases_the_lease() {
    let temp = tempfile::tempdir().unwrap();
    let mut child = spawn_candidate(temp.path(), "pod-a", &[]);

    assert!(wait_for_holder(temp.path(), "pod-a"), "pod-a never led");

    let status = stop(&mut child, Signal::SIGTERM);
    assert!(status.success(), "baton exited with {:?}", status);
    assert_eq!(stored_holder(temp.path()).as_deref(), Some(""));
}

#[test]
fn sigint_without_release_leaves_the_holder() {
    let temp = tempfile::tempdir().unwrap();
    let mut child = spawn_candidate(temp.path(), "pod-a", &["--no-release-on-cancel"]);

    assert!(wait_for_holder(temp.path(), "pod-a"), "pod-a never led");

    let status = stop(&mut child, Signal::SIGINT);
    assert!(status.success(), "baton exited with {:?}", status);
    assert_eq!(stored_holder(temp.path()).as_deref(), Some("pod-a"));
}

#[test]
fn standby_takes_over_after_release() {
    let temp = tempfile::tempdir().unwrap();
    let mut first = spawn_candidate(temp.path(), "pod-a", &[]);
    assert!(wait_for_holder(temp.path(), "pod-a"), "pod-a never led");

    let mut second = spawn_candidate(temp.path(), "pod-b", &[]);
    sleep(Duration::from_millis(500));
    assert_eq!(stored_holder(temp.path()).as_deref(), Some("pod-a"));

    assert!(stop(&mut first, Signal::SIGTERM).success());
    assert!(wait_for_holder(temp.path(), "pod-b"), "pod-b never took over");

    assert!(stop(&mut second, Signal::SIGTERM).success());
}
