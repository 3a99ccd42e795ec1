// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ticker specs
//!
//! The display ticker follows the session without writing anything.

use crate::prelude::*;
use crate::prelude::assert_eq;
use haul_engine::spawn_ticker;
use tokio_util::sync::CancellationToken;

#[tokio::test(start_paused = true)]
async fn ticker_follows_the_clock_without_writing() {
    let depot = Depot::empty();
    depot.job("job-1", 2);
    let engine = depot.engine();
    let handle = open(&engine, "job-1").await;
    handle.lock().await.start_timer().await.unwrap();
    depot.minutes(12);
    handle.lock().await.next_step().await.unwrap();
    let cancel = CancellationToken::new();

    let (mut rx, task) =
        spawn_ticker(Arc::clone(&handle), engine.config().tick_interval(), cancel.clone()).await;

    {
        let view = rx.borrow_and_update();
        assert_eq!(view.current_step, 2);
        assert_eq!(view.step_name.as_deref(), Some("Arrive at stop 1"));
        assert_eq!(view.total_elapsed, "00:12");
    }

    depot.minutes(3);
    rx.changed().await.unwrap();
    assert_eq!(rx.borrow().total_elapsed, "00:15");

    cancel.cancel();
    task.await.unwrap();
    let stored = depot.timers().load(&JobId::new("job-1")).await.unwrap();
    assert_eq!(stored.updated_at_ms, T0 + 12 * MIN);
}
