// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Remote reconciliation specs
//!
//! Progress fetched from the remote source is merged last-writer-wins and
//! replayed into the timer one step at a time.

use crate::prelude::*;
use crate::prelude::assert_eq;
use std::collections::BTreeMap;

fn remote(step: u32, modified_at_ms: u64) -> RemoteProgress {
    RemoteProgress {
        actual_step: step,
        completed_steps: (1..step).map(|id| (id, modified_at_ms)).collect::<BTreeMap<_, _>>(),
        modified_at_ms,
    }
}

#[tokio::test]
async fn job_already_under_way_is_caught_up_on_open() {
    let depot = Depot::empty();
    let stops = vec!["a".to_string(), "b".to_string(), "c".to_string()];
    depot.source.add_job(RemoteJob::new("job-1", stops).progress(remote(7, T0 + 1)));
    let engine = depot.engine();

    let handle = open(&engine, "job-1").await;

    let session = handle.lock().await;
    assert_eq!(session.current_step(), 7);
    assert_eq!(session.progress_state().actual_step, 7);
    assert_eq!(session.timer_state().intervals.len(), 7);
    assert!(!session.progress_state().is_dirty);
    // Entering the billing step through catch-up still requests payment
    assert_eq!(depot.payments(), vec![(PaymentStage::BillingStep, 2.5)]);

    let stored = depot.progress().load(&JobId::new("job-1")).await.unwrap();
    assert_eq!(stored.actual_step, 7);
    assert_eq!(stored.last_synced_at_ms, Some(T0));
}

#[tokio::test]
async fn remote_behind_the_timer_never_rewinds_it() {
    let depot = Depot::empty();
    depot.job("job-1", 2);
    let engine = depot.engine();
    let handle = open(&engine, "job-1").await;
    let mut session = handle.lock().await;
    session.start_timer().await.unwrap();
    depot.minutes(5);
    session.next_step().await.unwrap();
    depot.minutes(5);
    session.next_step().await.unwrap();
    depot.minutes(5);

    let outcome = session.absorb_remote(&remote(2, T0 + 15 * MIN)).await.unwrap();

    assert_eq!(outcome, Transition::Applied(SyncOutcome::Replaced));
    assert_eq!(session.progress_state().actual_step, 2);
    assert_eq!(session.current_step(), 3);
}

#[tokio::test]
async fn newer_local_edits_survive_an_older_remote() {
    let depot = Depot::empty();
    depot.job("job-1", 2);
    let engine = depot.engine();
    let handle = open(&engine, "job-1").await;
    let mut session = handle.lock().await;
    depot.minutes(10);
    session.start_timer().await.unwrap();

    let outcome = session.absorb_remote(&remote(4, T0 + 5 * MIN)).await.unwrap();

    assert_eq!(outcome, Transition::Applied(SyncOutcome::KeptLocal));
    assert_eq!(session.progress_state().actual_step, 1);
    assert!(session.progress_state().is_dirty);
    assert_eq!(session.current_step(), 1);
}

#[tokio::test]
async fn newer_remote_replaces_dirty_local_state() {
    let depot = Depot::empty();
    depot.job("job-1", 2);
    let engine = depot.engine();
    let handle = open(&engine, "job-1").await;
    let mut session = handle.lock().await;
    session.start_timer().await.unwrap();
    depot.minutes(10);

    let outcome = session.absorb_remote(&remote(4, T0 + 5 * MIN)).await.unwrap();

    assert_eq!(outcome, Transition::Applied(SyncOutcome::Replaced));
    assert_eq!(session.progress_state().actual_step, 4);
    assert_eq!(session.progress_state().last_modified_at_ms, T0 + 5 * MIN);
    assert!(!session.progress_state().is_dirty);
    assert_eq!(session.current_step(), 4);
}

#[tokio::test]
async fn remote_step_past_the_catalog_is_rejected() {
    let depot = Depot::empty();
    depot.job("job-1", 1);
    let engine = depot.engine();
    let handle = open(&engine, "job-1").await;
    let mut session = handle.lock().await;

    let outcome = session.absorb_remote(&remote(9, T0 + MIN)).await.unwrap();

    assert_eq!(outcome, Transition::Rejected(TransitionError::OutOfRange { step: 9, total: 4 }));
    assert_eq!(session.progress_state().actual_step, 0);
    assert_eq!(session.phase(), TimerPhase::NotStarted);
}
