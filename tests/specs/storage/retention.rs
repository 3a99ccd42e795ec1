// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Retention specs
//!
//! Old jobs are purged from disk; recent ones are left alone.

use crate::prelude::*;
use crate::prelude::assert_eq;

async fn started(depot: &Depot, engine: &Engine<FakeClock>, id: &str) {
    depot.job(id, 1);
    open(engine, id).await.lock().await.start_timer().await.unwrap();
}

#[tokio::test]
async fn purge_removes_stale_records_from_disk() {
    let depot = Depot::empty();
    let engine = depot.engine();
    started(&depot, &engine, "old").await;
    depot.minutes(31 * DAY_MINUTES);
    started(&depot, &engine, "recent").await;

    let removed = engine.purge_expired().await.unwrap();

    assert_eq!(removed, 2);
    assert!(!depot.exists("job_state_old.json"));
    assert!(!depot.exists("job_progress_old.json"));
    assert!(depot.exists("job_state_recent.json"));
    assert_eq!(engine.known_jobs().await.unwrap(), vec![JobId::new("recent")]);
    assert_eq!(depot.read("job_state_index"), r#"["recent"]"#);
}

#[tokio::test]
async fn purge_survives_a_corrupt_record() {
    let depot = Depot::empty();
    let engine = depot.engine();
    started(&depot, &engine, "job-1").await;
    depot.file("job_progress_job-1.json", "garbage");
    depot.minutes(31 * DAY_MINUTES);

    let removed = engine.purge_older_than(30).await.unwrap();

    assert_eq!(removed, 1);
    assert!(!depot.exists("job_state_job-1.json"));
}

#[tokio::test]
async fn delete_job_removes_both_records() {
    let depot = Depot::empty();
    let engine = depot.engine();
    started(&depot, &engine, "job-1").await;
    started(&depot, &engine, "job-2").await;

    engine.delete_job(&JobId::new("job-1")).await.unwrap();

    assert!(!depot.exists("job_state_job-1.json"));
    assert!(!depot.exists("job_progress_job-1.json"));
    assert_eq!(engine.known_jobs().await.unwrap(), vec![JobId::new("job-2")]);
}

#[tokio::test]
async fn missing_index_is_rebuilt_from_the_directory() {
    let depot = Depot::empty();
    let engine = depot.engine();
    started(&depot, &engine, "job-b").await;
    started(&depot, &engine, "job-a").await;
    std::fs::remove_file(depot.path().join("job_state_index")).unwrap();
    depot.file("job_progress_index", "not an index");

    let ids = depot.engine().known_jobs().await.unwrap();

    assert_eq!(ids, vec![JobId::new("job-a"), JobId::new("job-b")]);
}
