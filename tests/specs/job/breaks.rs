// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Break specs
//!
//! Breaks stop the billable clock but never the wall clock.

use crate::prelude::*;
use crate::prelude::assert_eq;

#[tokio::test]
async fn break_time_is_excluded_from_billable_time() {
    let depot = Depot::empty();
    depot.job("job-1", 2);
    let engine = depot.engine();
    let handle = open(&engine, "job-1").await;
    let mut session = handle.lock().await;

    session.start_timer().await.unwrap();
    depot.minutes(30);
    session.start_break().await.unwrap();
    depot.minutes(45);
    session.stop_break().await.unwrap();
    depot.minutes(30);

    let view = session.view();
    assert_eq!(view.total_elapsed, "01:45");
    assert_eq!(view.billable_elapsed, "01:00");
    assert_eq!(view.total_elapsed_ms - view.billable_elapsed_ms, 45 * MIN);
    assert!(!view.is_on_break);
}

#[tokio::test]
async fn steps_cannot_change_during_a_break() {
    let depot = Depot::empty();
    depot.job("job-1", 2);
    let engine = depot.engine();
    let handle = open(&engine, "job-1").await;
    let mut session = handle.lock().await;
    session.start_timer().await.unwrap();
    session.start_break().await.unwrap();

    let moved = session.next_step().await.unwrap();
    let again = session.start_break().await.unwrap();

    assert_eq!(moved, Transition::Rejected(TransitionError::OnBreak));
    assert_eq!(again, Transition::Rejected(TransitionError::AlreadyOnBreak));
    assert_eq!(session.current_step(), 1);
    assert_eq!(session.phase(), TimerPhase::OnBreak);
}

#[tokio::test]
async fn stop_break_without_a_break_is_rejected() {
    let depot = Depot::empty();
    depot.job("job-1", 1);
    let engine = depot.engine();
    let handle = open(&engine, "job-1").await;
    let mut session = handle.lock().await;

    let before_start = session.start_break().await.unwrap();
    session.start_timer().await.unwrap();
    let not_on_break = session.stop_break().await.unwrap();

    assert_eq!(before_start, Transition::Rejected(TransitionError::NotStarted));
    assert_eq!(not_on_break, Transition::Rejected(TransitionError::NotOnBreak));
}

#[tokio::test]
async fn stopping_during_a_break_closes_it_first() {
    let depot = Depot::empty();
    depot.job("job-1", 2);
    let engine = depot.engine();
    let handle = open(&engine, "job-1").await;
    let mut session = handle.lock().await;
    session.start_timer().await.unwrap();
    depot.minutes(150);
    session.start_break().await.unwrap();
    depot.minutes(60);

    let stopped = session.stop_timer().await.unwrap();

    let Transition::Applied(invoice) = stopped else {
        panic!("expected invoice, got {stopped:?}");
    };
    // 150 minutes worked + 30 call-out = 3h00
    assert_eq!(invoice.billable_hours, 3.0);
    let state = session.timer_state();
    assert_eq!(state.break_intervals.len(), 1);
    assert!(state.break_intervals.iter().all(|b| b.end_ms.is_some()));
    assert!(state.intervals.iter().all(|i| i.ended_at_ms.is_some()));
    assert_eq!(state.total_elapsed_ms, 210 * MIN);
}
