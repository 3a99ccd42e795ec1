// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Restart specs
//!
//! A job survives the app being killed and reopened over the same directory.

use crate::prelude::*;
use crate::prelude::assert_eq;
use haul_core::test_support::{progress_for, timer_at_step, FIXTURE_EPOCH_MS};

#[tokio::test]
async fn reopened_job_resumes_where_it_stopped() {
    let depot = Depot::empty();
    depot.job("job-1", 2);
    {
        let engine = depot.engine();
        let handle = open(&engine, "job-1").await;
        handle.lock().await.start_timer().await.unwrap();
        walk(&depot, &handle, 2, 10).await;
    }
    depot.minutes(10);

    let engine = depot.engine();
    let handle = open(&engine, "job-1").await;

    let session = handle.lock().await;
    assert_eq!(depot.source.calls().len(), 1);
    assert_eq!(session.current_step(), 3);
    assert_eq!(session.progress_state().actual_step, 3);
    assert!(session.is_running());
    // Elapsed time is derived from the stored start, so downtime counts
    assert_eq!(session.total_elapsed_ms(), 30 * MIN);
}

#[tokio::test]
async fn records_are_camel_case_json_with_an_index_per_prefix() {
    let depot = Depot::empty();
    depot.job("job-1", 1);
    let engine = depot.engine();
    open(&engine, "job-1").await.lock().await.start_timer().await.unwrap();

    let timer: serde_json::Value =
        serde_json::from_str(&depot.read("job_state_job-1.json")).unwrap();
    let progress: serde_json::Value =
        serde_json::from_str(&depot.read("job_progress_job-1.json")).unwrap();

    assert_eq!(timer["jobId"], "job-1");
    assert_eq!(timer["currentStep"], 1);
    assert_eq!(timer["isRunning"], true);
    assert_eq!(progress["actualStep"], 1);
    assert_eq!(progress["totalSteps"], 4);
    assert_eq!(depot.read("job_state_index"), r#"["job-1"]"#);
    assert_eq!(depot.read("job_progress_index"), r#"["job-1"]"#);
    assert!(!depot.exists("job_state_job-1.json.tmp"));
}

#[tokio::test]
async fn corrupt_timer_record_is_rebuilt_from_progress() {
    let depot = Depot::empty();
    depot.job("job-1", 2);
    {
        let engine = depot.engine();
        let handle = open(&engine, "job-1").await;
        handle.lock().await.start_timer().await.unwrap();
        walk(&depot, &handle, 2, 10).await;
    }
    depot.file("job_state_job-1.json", "{ not json");

    let engine = depot.engine();
    let handle = open(&engine, "job-1").await;

    let session = handle.lock().await;
    assert_eq!(session.current_step(), 3);
    assert_eq!(session.progress_state().actual_step, 3);
    assert!(depot.payments.requests().is_empty());
}

#[tokio::test]
async fn crash_between_writes_is_realigned_to_the_timer() {
    let depot = Depot::empty();
    let id = JobId::new("job-1");
    let mut progress = progress_for("job-1", 2);
    progress.set_step(3, FIXTURE_EPOCH_MS).unwrap();
    depot.timers().save(&id, &timer_at_step("job-1", 6, 4)).await.unwrap();
    depot.progress().save(&id, &progress).await.unwrap();

    let engine = depot.engine();
    let handle = open(&engine, "job-1").await;

    let session = handle.lock().await;
    assert_eq!(session.current_step(), 4);
    assert_eq!(session.progress_state().actual_step, 4);
    assert!(depot.source.calls().is_empty());
    let stored = depot.progress().load(&id).await.unwrap();
    assert_eq!(stored.actual_step, 4);
}

#[tokio::test]
async fn completed_job_is_not_billed_again_after_restart() {
    let depot = Depot::empty();
    depot.job("job-1", 1);
    {
        let engine = depot.engine();
        let handle = open(&engine, "job-1").await;
        handle.lock().await.start_timer().await.unwrap();
        walk(&depot, &handle, 3, 40).await;
    }
    assert_eq!(depot.payments.requests().len(), 2);

    let engine = depot.engine();
    let handle = open(&engine, "job-1").await;
    let mut session = handle.lock().await;

    assert_eq!(session.phase(), TimerPhase::Terminal);
    assert!(session.progress_state().is_completed);
    assert_eq!(
        session.next_step().await.unwrap(),
        Transition::Rejected(TransitionError::AlreadyTerminal)
    );
    assert_eq!(session.invoice().billable_hours, 2.5);
    assert_eq!(depot.payments.requests().len(), 2);
}
