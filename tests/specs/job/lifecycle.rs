// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job lifecycle specs
//!
//! Drive a job from the depot to completion and check the billed figures.

use crate::prelude::*;
use crate::prelude::assert_eq;

#[tokio::test]
async fn three_stop_job_bills_at_last_departure_and_on_completion() {
    let depot = Depot::empty();
    depot.job("job-1", 3);
    let engine = depot.engine();
    let handle = open(&engine, "job-1").await;

    {
        let session = handle.lock().await;
        assert_eq!(session.total_steps(), 8);
        assert_eq!(session.steps()[6].name, "Depart stop 3");
        assert!(session.steps()[6].is_billing_trigger);
        assert!(session.steps()[7].is_terminal);
    }

    handle.lock().await.next_step().await.unwrap();
    walk(&depot, &handle, 6, 20).await;
    assert_eq!(depot.payments(), vec![(PaymentStage::BillingStep, 2.5)]);

    depot.minutes(20);
    let done = handle.lock().await.next_step().await.unwrap();

    let Transition::Applied(Advanced::Completed(invoice)) = done else {
        panic!("expected completion, got {done:?}");
    };
    assert_eq!(invoice.billable_hours, 3.0);
    assert_eq!(invoice.total, 300.0);
    assert_eq!(invoice.currency, "USD");
    assert_eq!(
        depot.payments(),
        vec![(PaymentStage::BillingStep, 2.5), (PaymentStage::Completion, 3.0)]
    );

    let session = handle.lock().await;
    assert_eq!(session.phase(), TimerPhase::Terminal);
    assert!(session.progress_state().is_completed);
    assert_eq!(session.view().total_elapsed, "02:20");
}

#[tokio::test]
async fn short_job_is_billed_the_minimum_plus_call_out() {
    let depot = Depot::empty();
    depot.job("job-1", 1);
    let engine = depot.engine();
    let handle = open(&engine, "job-1").await;

    handle.lock().await.start_timer().await.unwrap();
    walk(&depot, &handle, 2, 15).await;
    depot.minutes(15);
    let invoice = handle.lock().await.stop_timer().await.unwrap();

    let Transition::Applied(invoice) = invoice else {
        panic!("expected invoice, got {invoice:?}");
    };
    assert_eq!(invoice.raw_hours, 0.75);
    assert_eq!(invoice.billable_hours, 2.5);
    assert_eq!(invoice.total, 250.0);
}

#[tokio::test]
async fn two_hours_thirty_seven_rounds_down_to_three() {
    let depot = Depot::empty();
    depot.job("job-1", 1);
    let engine = depot.engine();
    let handle = open(&engine, "job-1").await;

    handle.lock().await.start_timer().await.unwrap();
    for minutes in [52, 52, 53] {
        depot.minutes(minutes);
        handle.lock().await.next_step().await.unwrap();
    }

    let session = handle.lock().await;
    assert_eq!(session.phase(), TimerPhase::Terminal);
    assert_eq!(session.invoice().billable_hours, 3.0);
}

#[tokio::test]
async fn completed_job_rejects_further_steps_and_pays_once() {
    let depot = Depot::empty();
    depot.job("job-1", 1);
    let engine = depot.engine();
    let handle = open(&engine, "job-1").await;
    let fired = Arc::new(std::sync::atomic::AtomicUsize::new(0));
    let counter = Arc::clone(&fired);
    handle.lock().await.on_complete(move |_| {
        counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
    });

    handle.lock().await.start_timer().await.unwrap();
    walk(&depot, &handle, 3, 30).await;
    let again = handle.lock().await.next_step().await.unwrap();
    let stopped = handle.lock().await.stop_timer().await.unwrap();

    assert_eq!(again, Transition::Rejected(TransitionError::AlreadyTerminal));
    assert_eq!(stopped, Transition::Rejected(TransitionError::AlreadyTerminal));
    assert_eq!(fired.load(std::sync::atomic::Ordering::SeqCst), 1);
    assert_eq!(depot.payments.requests().len(), 2);
}

#[tokio::test]
async fn operator_reset_starts_the_job_over() {
    let depot = Depot::empty();
    depot.job("job-1", 2);
    let engine = depot.engine();
    let handle = open(&engine, "job-1").await;
    handle.lock().await.start_timer().await.unwrap();
    walk(&depot, &handle, 2, 10).await;

    handle.lock().await.reset().await.unwrap();

    let session = handle.lock().await;
    assert_eq!(session.phase(), TimerPhase::NotStarted);
    assert_eq!(session.current_step(), 0);
    assert!(session.timer_state().intervals.is_empty());
    assert!(!session.progress_state().is_completed);
    drop(session);

    let stored = depot.timers().load(&JobId::new("job-1")).await.unwrap();
    assert_eq!(stored.current_step, 0);
}
