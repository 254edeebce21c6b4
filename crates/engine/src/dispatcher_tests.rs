// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use baton_core::StepDownReason;
use std::sync::{Arc, Mutex};

/// Records calls and checks the context is cancelled before the stop hook
#[derive(Clone, Default)]
struct Recorder {
    calls: Arc<Mutex<Vec<String>>>,
    contexts: Arc<Mutex<Vec<LeadershipContext>>>,
}

impl Recorder {
    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl LeaderCallbacks for Recorder {
    fn on_started_leading(&self, ctx: LeadershipContext) {
        self.calls.lock().unwrap().push(format!("start:{}", ctx.term()));
        self.contexts.lock().unwrap().push(ctx);
    }

    fn on_stopped_leading(&self) {
        let all_cancelled = self
            .contexts
            .lock()
            .unwrap()
            .iter()
            .all(LeadershipContext::is_cancelled);
        self.calls
            .lock()
            .unwrap()
            .push(format!("stop:cancelled={}", all_cancelled));
    }

    fn on_new_leader(&self, leader: Option<&HolderId>) {
        self.calls.lock().unwrap().push(format!(
            "leader:{}",
            leader.map(HolderId::as_str).unwrap_or("-")
        ));
    }
}

fn dispatcher() -> (Recorder, CallbackDispatcher<Recorder>) {
    let recorder = Recorder::default();
    (
        recorder.clone(),
        CallbackDispatcher::new(HolderId::new("a"), recorder),
    )
}

fn observed(holder: Option<&str>) -> ElectionEvent {
    ElectionEvent::LeaderObserved {
        holder: holder.map(HolderId::new),
    }
}

fn stopped() -> ElectionEvent {
    ElectionEvent::StoppedLeading {
        reason: StepDownReason::DeadlineExceeded,
    }
}

#[test]
fn start_then_stop_fires_each_once() {
    let (recorder, mut dispatcher) = dispatcher();

    dispatcher.dispatch(ElectionEvent::StartedLeading { term: 3 });
    assert!(dispatcher.is_leading());
    dispatcher.dispatch(stopped());

    assert!(!dispatcher.is_leading());
    assert_eq!(recorder.calls(), vec!["start:3", "stop:cancelled=true"]);
}

#[test]
fn duplicate_start_is_ignored() {
    let (recorder, mut dispatcher) = dispatcher();

    dispatcher.dispatch(ElectionEvent::StartedLeading { term: 1 });
    dispatcher.dispatch(ElectionEvent::StartedLeading { term: 1 });

    assert_eq!(recorder.calls(), vec!["start:1"]);
}

#[test]
fn stop_without_start_is_ignored() {
    let (recorder, mut dispatcher) = dispatcher();

    dispatcher.dispatch(stopped());

    assert!(recorder.calls().is_empty());
}

#[test]
fn each_term_gets_a_fresh_context() {
    let (recorder, mut dispatcher) = dispatcher();

    dispatcher.dispatch(ElectionEvent::StartedLeading { term: 1 });
    dispatcher.dispatch(stopped());
    dispatcher.dispatch(ElectionEvent::StartedLeading { term: 2 });

    let contexts = recorder.contexts.lock().unwrap().clone();
    assert_eq!(contexts.len(), 2);
    assert!(contexts[0].is_cancelled());
    assert!(!contexts[1].is_cancelled());
    assert_eq!(contexts[1].identity(), &HolderId::new("a"));
}

#[test]
fn repeated_observations_report_once() {
    let (recorder, mut dispatcher) = dispatcher();

    dispatcher.dispatch(observed(Some("b")));
    dispatcher.dispatch(observed(Some("b")));
    dispatcher.dispatch(observed(Some("b")));

    assert_eq!(recorder.calls(), vec!["leader:b"]);
    assert_eq!(dispatcher.reported_leader(), Some(&HolderId::new("b")));
}

#[test]
fn initial_empty_observation_is_not_a_change() {
    let (recorder, mut dispatcher) = dispatcher();

    dispatcher.dispatch(observed(None));

    assert!(recorder.calls().is_empty());
}

#[test]
fn reports_empty_to_self_and_self_to_empty() {
    let (recorder, mut dispatcher) = dispatcher();

    dispatcher.dispatch(observed(Some("b")));
    dispatcher.dispatch(observed(Some("a")));
    dispatcher.dispatch(observed(Some("a")));
    dispatcher.dispatch(observed(None));
    dispatcher.dispatch(observed(None));
    dispatcher.dispatch(observed(Some("a")));

    assert_eq!(
        recorder.calls(),
        vec!["leader:b", "leader:a", "leader:-", "leader:a"]
    );
}

#[test]
fn dropping_the_dispatcher_cancels_leadership() {
    let (recorder, mut dispatcher) = dispatcher();
    dispatcher.dispatch(ElectionEvent::StartedLeading { term: 1 });

    drop(dispatcher);

    assert!(recorder.contexts.lock().unwrap()[0].is_cancelled());
}

#[tokio::test]
async fn event_sender_forwards_transitions() {
    let (sender, mut rx) = EventSender::channel();
    let mut dispatcher = CallbackDispatcher::new(HolderId::new("a"), sender);

    dispatcher.dispatch(ElectionEvent::StartedLeading { term: 7 });
    dispatcher.dispatch(observed(Some("a")));
    dispatcher.dispatch(stopped());

    assert_eq!(rx.recv().await, Some(LeaderEvent::StartedLeading { term: 7 }));
    assert_eq!(
        rx.recv().await,
        Some(LeaderEvent::NewLeader(Some(HolderId::new("a"))))
    );
    assert_eq!(rx.recv().await, Some(LeaderEvent::StoppedLeading));
}

#[tokio::test]
async fn context_cancelled_future_resolves_on_stop() {
    let (recorder, mut dispatcher) = dispatcher();
    dispatcher.dispatch(ElectionEvent::StartedLeading { term: 1 });
    let ctx = recorder.contexts.lock().unwrap()[0].clone();

    let waiter = tokio::spawn(async move { ctx.cancelled().await });
    dispatcher.dispatch(stopped());

    waiter.await.unwrap();
}
