// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Display ticker.
//!
//! Elapsed figures are always derived from the clock, so the ticker only
//! recomputes a [`SessionView`] on an interval and publishes it. It never
//! writes to storage.

use crate::engine::SessionHandle;
use crate::session::SessionView;
use haul_core::Clock;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Publish a fresh view of `handle` every `period` until `cancel` fires or
/// every receiver is dropped.
///
/// Subscribers are only woken when the view actually changed.
pub async fn spawn_ticker<C: Clock>(
    handle: SessionHandle<C>,
    period: Duration,
    cancel: CancellationToken,
) -> (watch::Receiver<SessionView>, JoinHandle<()>) {
    let initial = handle.lock().await.view();
    let job_id = initial.job_id.clone();
    let (tx, rx) = watch::channel(initial);

    let task = tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tracing::debug!(%job_id, period_ms = period.as_millis() as u64, "ticker started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::debug!(%job_id, "ticker cancelled");
                    break;
                }
                _ = tx.closed() => {
                    tracing::debug!(%job_id, "ticker has no subscribers");
                    break;
                }
                _ = ticker.tick() => {
                    let view = handle.lock().await.view();
                    tx.send_if_modified(|current| {
                        if *current == view {
                            return false;
                        }
                        *current = view;
                        true
                    });
                }
            }
        }
    });

    (rx, task)
}

#[cfg(test)]
#[path = "ticker_tests.rs"]
mod tests;
