// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Multi-candidate scenarios over a shared store and clock

#![allow(clippy::unwrap_used)]

use baton_adapters::{FakeLeaseStore, FileStore, LeaseStore};
use baton_core::{ElectionConfig, ElectionState, FakeClock, HolderId, LeaseKey};
use baton_engine::{Elector, EventSender, LeaderEvent};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;

type Candidate<S> = (Elector<S, FakeClock, EventSender>, UnboundedReceiver<LeaderEvent>);

fn candidate<S: LeaseStore>(identity: &str, store: &S, clock: &FakeClock) -> Candidate<S> {
    let (sender, rx) = EventSender::channel();
    let config = ElectionConfig::new(identity).with_jitter(0.0);
    let elector = Elector::new(config, store.clone(), clock.clone(), sender).unwrap();
    (elector, rx)
}

fn drain(rx: &mut UnboundedReceiver<LeaderEvent>) -> Vec<LeaderEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

fn key() -> LeaseKey {
    LeaseKey::new("default", "takeover")
}

#[tokio::test]
async fn paused_leader_is_replaced_and_never_leads_again() {
    let store = FakeLeaseStore::new(key());
    let clock = FakeClock::new();
    let (mut a, mut a_events) = candidate("a", &store, &clock);
    let (mut b, mut b_events) = candidate("b", &store, &clock);

    // A acquires over an absent record
    a.tick().await;
    assert!(a.is_leader());
    assert_eq!(store.snapshot().unwrap().record.leader_transitions, 1);
    b.tick().await;
    assert_eq!(b.state(), ElectionState::Follower);

    // A renews three times within the deadline
    for _ in 0..3 {
        clock.advance(Duration::from_secs(2));
        a.tick().await;
        b.tick().await;
        assert!(a.is_leader());
        assert_eq!(b.state(), ElectionState::Follower);
    }

    // A's process is paused past the lease duration; B takes over
    clock.advance(Duration::from_secs(16));
    b.tick().await;
    assert!(b.is_leader());
    let current = store.snapshot().unwrap();
    assert_eq!(current.record.holder(), Some(&HolderId::new("b")));
    assert_eq!(current.record.leader_transitions, 2);

    // A resumes: it steps down before writing anything
    store.clear_calls();
    a.tick().await;
    assert!(!a.is_leader());
    assert_eq!(
        drain(&mut a_events),
        vec![
            LeaderEvent::StartedLeading { term: 1 },
            LeaderEvent::NewLeader(Some(HolderId::new("a"))),
            LeaderEvent::StoppedLeading,
            LeaderEvent::NewLeader(Some(HolderId::new("b"))),
        ]
    );
    assert_eq!(store.calls(), vec![baton_adapters::StoreCall::Read]);

    // ...and stays a follower while B renews
    for _ in 0..5 {
        clock.advance(Duration::from_secs(2));
        b.tick().await;
        a.tick().await;
        assert!(!a.is_leader());
        assert!(b.is_leader());
    }
    assert!(drain(&mut a_events).is_empty());
    assert_eq!(
        drain(&mut b_events),
        vec![
            LeaderEvent::NewLeader(Some(HolderId::new("a"))),
            LeaderEvent::StartedLeading { term: 2 },
            LeaderEvent::NewLeader(Some(HolderId::new("b"))),
        ]
    );
}

#[tokio::test]
async fn released_lease_is_taken_without_waiting_for_expiry() {
    let store = FakeLeaseStore::new(key());
    let clock = FakeClock::new();
    let (mut a, _a_events) = candidate("a", &store, &clock);
    let (mut b, mut b_events) = candidate("b", &store, &clock);
    a.tick().await;
    b.tick().await;

    a.shutdown().await.unwrap();
    clock.advance(Duration::from_secs(2));
    b.tick().await;

    assert!(b.is_leader());
    assert_eq!(store.snapshot().unwrap().record.leader_transitions, 2);
    assert_eq!(
        drain(&mut b_events),
        vec![
            LeaderEvent::NewLeader(Some(HolderId::new("a"))),
            LeaderEvent::NewLeader(None),
            LeaderEvent::StartedLeading { term: 2 },
            LeaderEvent::NewLeader(Some(HolderId::new("b"))),
        ]
    );
}

#[tokio::test]
async fn transitions_never_decrease_across_handoffs() {
    let store = FakeLeaseStore::new(key());
    let clock = FakeClock::new();
    let mut candidates = vec![
        candidate("a", &store, &clock),
        candidate("b", &store, &clock),
        candidate("c", &store, &clock),
    ];
    let mut last = 0;

    for round in 0..12 {
        // Only one candidate is awake each round
        let awake = round % candidates.len();
        candidates[awake].0.tick().await;
        let transitions = store.snapshot().unwrap().record.leader_transitions;
        assert!(transitions >= last, "round {}: {} < {}", round, transitions, last);
        last = transitions;
        clock.advance(Duration::from_secs(16));
    }

    assert!(last >= 3);
}

#[tokio::test]
async fn file_store_elects_one_leader() {
    let dir = tempfile::tempdir().unwrap();
    let clock = FakeClock::new();
    let store_a = FileStore::open(dir.path(), key()).unwrap();
    let store_b = FileStore::open(dir.path(), key()).unwrap();
    let (mut a, _) = candidate("a", &store_a, &clock);
    let (mut b, _) = candidate("b", &store_b, &clock);

    a.tick().await;
    b.tick().await;
    clock.advance(Duration::from_secs(2));
    a.tick().await;
    b.tick().await;

    assert!(a.is_leader());
    assert_eq!(b.state(), ElectionState::Follower);
    assert_eq!(b.observed_leader(), Some(&HolderId::new("a")));

    a.shutdown().await.unwrap();
    let current = store_b.read().await.unwrap().unwrap();
    assert!(!current.record.is_held());
}
