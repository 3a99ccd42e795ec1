// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for the engine's unit tests.

use async_trait::async_trait;
use haul_core::{FakeClock, JobId};
use haul_storage::{MemoryStore, Retained, StateStore, StoreError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

pub const T0: u64 = 1_700_000_000_000;
pub const MIN: u64 = 60_000;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn clock() -> FakeClock {
    FakeClock::at(T0)
}

pub fn advance(clock: &FakeClock, minutes: u64) {
    clock.advance(std::time::Duration::from_millis(minutes * MIN));
}

/// Memory-backed store whose saves can be made to fail.
pub struct FlakyStore<S> {
    inner: MemoryStore<S, FakeClock>,
    failing: AtomicBool,
    saves: AtomicUsize,
}

impl<S> FlakyStore<S> {
    pub fn new(clock: &FakeClock) -> Arc<Self> {
        Arc::new(Self {
            inner: MemoryStore::with_clock(clock.clone()),
            failing: AtomicBool::new(false),
            saves: AtomicUsize::new(0),
        })
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Successful saves so far
    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<S> StateStore<S> for FlakyStore<S>
where
    S: Serialize + DeserializeOwned + Retained + Send + Sync + 'static,
{
    async fn load(&self, job_id: &JobId) -> Option<S> {
        self.inner.load(job_id).await
    }

    async fn save(&self, job_id: &JobId, state: &S) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Io(std::io::Error::other("disk full")));
        }
        self.inner.save(job_id, state).await?;
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn delete(&self, job_id: &JobId) -> Result<(), StoreError> {
        self.inner.delete(job_id).await
    }

    async fn list_ids(&self) -> Result<Vec<JobId>, StoreError> {
        self.inner.list_ids().await
    }

    async fn purge_older_than(&self, days: u32) -> Result<usize, StoreError> {
        self.inner.purge_older_than(days).await
    }
}
