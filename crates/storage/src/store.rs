// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Store contract shared by every backend.

use async_trait::async_trait;
use haul_core::{JobId, JobProgressState, JobTimerState};
use thiserror::Error;

/// Key prefix of timer records.
pub const STATE_KEY_PREFIX: &str = "job_state_";
/// Key prefix of progress records.
pub const PROGRESS_KEY_PREFIX: &str = "job_progress_";

pub const MS_PER_DAY: u64 = 24 * 60 * 60 * 1000;

/// Errors from store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid job id {0:?}")]
    InvalidKey(String),
}

/// A record that can be aged out.
pub trait Retained {
    fn job_id(&self) -> &JobId;
    /// Epoch ms of the last mutation
    fn last_modified_ms(&self) -> u64;
}

impl Retained for JobTimerState {
    fn job_id(&self) -> &JobId {
        &self.job_id
    }

    fn last_modified_ms(&self) -> u64 {
        self.updated_at_ms
    }
}

impl Retained for JobProgressState {
    fn job_id(&self) -> &JobId {
        &self.job_id
    }

    fn last_modified_ms(&self) -> u64 {
        self.last_modified_at_ms
    }
}

/// Durable key-value storage of one record type, scoped by job id.
///
/// `load` never fails: missing and unreadable records both come back as
/// `None`, the latter with a warning. `save` writes the full snapshot so a
/// concurrent `load` sees either the previous or the new record.
#[async_trait]
pub trait StateStore<S>: Send + Sync
where
    S: Send + Sync + 'static,
{
    async fn load(&self, job_id: &JobId) -> Option<S>;

    async fn save(&self, job_id: &JobId, state: &S) -> Result<(), StoreError>;

    /// Removing an unknown id is not an error.
    async fn delete(&self, job_id: &JobId) -> Result<(), StoreError>;

    async fn list_ids(&self) -> Result<Vec<JobId>, StoreError>;

    /// Delete records not modified within the last `days` days.
    ///
    /// Returns the number of records removed. Unreadable records are kept.
    async fn purge_older_than(&self, days: u32) -> Result<usize, StoreError>;
}

/// `<prefix><job id>`
pub fn record_key(prefix: &str, job_id: &JobId) -> String {
    format!("{prefix}{job_id}")
}

/// Job ids end up in file names: reject anything that could escape the
/// store directory or collide with housekeeping files.
pub fn validate_job_id(job_id: &JobId) -> Result<(), StoreError> {
    let id = job_id.as_str();
    let bad = id.is_empty()
        || id.starts_with('.')
        || id.chars().any(|c| matches!(c, '/' | '\\' | '\0') || c.is_control());
    if bad {
        return Err(StoreError::InvalidKey(id.to_string()));
    }
    Ok(())
}

/// Age cutoff check shared by the backends.
pub(crate) fn is_expired(last_modified_ms: u64, now_ms: u64, days: u32) -> bool {
    now_ms.saturating_sub(last_modified_ms) > u64::from(days) * MS_PER_DAY
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
