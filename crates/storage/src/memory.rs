// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process store for embedders without a writable directory, and for tests.
//!
//! Records are kept serialized so a load never aliases the caller's value
//! and corrupt data can be injected with [`MemoryStore::put_raw`].

use crate::store::{is_expired, validate_job_id, Retained, StateStore, StoreError};
use async_trait::async_trait;
use haul_core::{Clock, JobId, SystemClock};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::marker::PhantomData;

pub struct MemoryStore<S, C: Clock = SystemClock> {
    records: Mutex<BTreeMap<JobId, String>>,
    clock: C,
    _record: PhantomData<fn() -> S>,
}

impl<S> MemoryStore<S, SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl<S> Default for MemoryStore<S, SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, C: Clock> MemoryStore<S, C> {
    pub fn with_clock(clock: C) -> Self {
        Self { records: Mutex::new(BTreeMap::new()), clock, _record: PhantomData }
    }

    /// Store `raw` verbatim under `job_id`.
    pub fn put_raw(&self, job_id: &JobId, raw: impl Into<String>) {
        self.records.lock().insert(job_id.clone(), raw.into());
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

#[async_trait]
impl<S, C> StateStore<S> for MemoryStore<S, C>
where
    S: Serialize + DeserializeOwned + Retained + Send + Sync + 'static,
    C: Clock,
{
    async fn load(&self, job_id: &JobId) -> Option<S> {
        let raw = self.records.lock().get(job_id).cloned()?;
        match serde_json::from_str(&raw) {
            Ok(state) => Some(state),
            Err(e) => {
                tracing::warn!(%job_id, error = %e, "skipping corrupt record");
                None
            }
        }
    }

    async fn save(&self, job_id: &JobId, state: &S) -> Result<(), StoreError> {
        validate_job_id(job_id)?;
        let raw = serde_json::to_string(state)?;
        self.records.lock().insert(job_id.clone(), raw);
        Ok(())
    }

    async fn delete(&self, job_id: &JobId) -> Result<(), StoreError> {
        self.records.lock().remove(job_id);
        Ok(())
    }

    async fn list_ids(&self) -> Result<Vec<JobId>, StoreError> {
        Ok(self.records.lock().keys().cloned().collect())
    }

    async fn purge_older_than(&self, days: u32) -> Result<usize, StoreError> {
        let now_ms = self.clock.epoch_ms();
        let mut records = self.records.lock();
        let before = records.len();
        records.retain(|job_id, raw| match serde_json::from_str::<S>(raw) {
            Ok(state) => !is_expired(state.last_modified_ms(), now_ms, days),
            Err(e) => {
                tracing::warn!(%job_id, error = %e, "keeping unreadable record during purge");
                true
            }
        });
        Ok(before - records.len())
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
