// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Directory-backed store.
//!
//! Layout under the store directory:
//!
//! ```text
//! <prefix><job id>.json    one record per job
//! <prefix>index            JSON array of known job ids
//! ```
//!
//! Records and the index are written to a `.tmp` sibling and renamed into
//! place, so readers never see a partial file.

use crate::store::{is_expired, record_key, validate_job_id, Retained, StateStore, StoreError};
use async_trait::async_trait;
use haul_core::{Clock, JobId, SystemClock};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeSet;
use std::io::ErrorKind;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

pub struct FileStore<S, C: Clock = SystemClock> {
    dir: PathBuf,
    prefix: String,
    clock: C,
    /// Serializes writers so the index and records change together
    write_lock: Mutex<()>,
    _record: PhantomData<fn() -> S>,
}

impl<S> FileStore<S, SystemClock> {
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self::with_clock(dir, prefix, SystemClock)
    }
}

impl<S, C: Clock> FileStore<S, C> {
    pub fn with_clock(dir: impl Into<PathBuf>, prefix: impl Into<String>, clock: C) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
            clock,
            write_lock: Mutex::new(()),
            _record: PhantomData,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn record_path(&self, job_id: &JobId) -> PathBuf {
        self.dir.join(format!("{}.json", record_key(&self.prefix, job_id)))
    }

    pub fn index_path(&self) -> PathBuf {
        self.dir.join(format!("{}index", self.prefix))
    }

    /// Known ids, and whether they had to be recovered from a directory scan.
    async fn read_index(&self) -> Result<(BTreeSet<JobId>, bool), StoreError> {
        let path = self.index_path();
        match tokio::fs::read(&path).await {
            Ok(bytes) => match serde_json::from_slice::<BTreeSet<JobId>>(&bytes) {
                Ok(ids) => Ok((ids, false)),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "corrupt index, rebuilding");
                    Ok((self.rebuild_index().await?, true))
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => Ok((self.rebuild_index().await?, true)),
            Err(e) => Err(e.into()),
        }
    }

    /// Recover the id set from record file names.
    async fn rebuild_index(&self) -> Result<BTreeSet<JobId>, StoreError> {
        let mut ids = BTreeSet::new();
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(ids),
            Err(e) => return Err(e.into()),
        };
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(id) = name
                .to_str()
                .and_then(|n| n.strip_prefix(self.prefix.as_str()))
                .and_then(|n| n.strip_suffix(".json"))
            else {
                continue;
            };
            let id = JobId::new(id);
            if validate_job_id(&id).is_ok() {
                ids.insert(id);
            }
        }
        tracing::debug!(prefix = %self.prefix, count = ids.len(), "rebuilt index from directory");
        Ok(ids)
    }

    async fn write_index(&self, ids: &BTreeSet<JobId>) -> Result<(), StoreError> {
        let json = serde_json::to_vec(ids)?;
        write_atomic(&self.index_path(), &json).await
    }

    async fn remove_record(&self, job_id: &JobId) -> Result<(), StoreError> {
        match tokio::fs::remove_file(self.record_path(job_id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl<S, C> StateStore<S> for FileStore<S, C>
where
    S: Serialize + DeserializeOwned + Retained + Send + Sync + 'static,
    C: Clock,
{
    async fn load(&self, job_id: &JobId) -> Option<S> {
        if let Err(e) = validate_job_id(job_id) {
            tracing::warn!(%job_id, error = %e, "refusing to load record");
            return None;
        }
        let path = self.record_path(job_id);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(%job_id, path = %path.display(), error = %e, "failed to read record");
                return None;
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(state) => Some(state),
            Err(e) => {
                tracing::warn!(%job_id, path = %path.display(), error = %e, "skipping corrupt record");
                None
            }
        }
    }

    async fn save(&self, job_id: &JobId, state: &S) -> Result<(), StoreError> {
        validate_job_id(job_id)?;
        let json = serde_json::to_vec(state)?;

        let _guard = self.write_lock.lock().await;
        tokio::fs::create_dir_all(&self.dir).await?;
        let (mut ids, rebuilt) = self.read_index().await?;
        write_atomic(&self.record_path(job_id), &json).await?;
        if ids.insert(job_id.clone()) || rebuilt {
            self.write_index(&ids).await?;
        }
        tracing::debug!(%job_id, prefix = %self.prefix, bytes = json.len(), "saved record");
        Ok(())
    }

    async fn delete(&self, job_id: &JobId) -> Result<(), StoreError> {
        validate_job_id(job_id)?;
        let _guard = self.write_lock.lock().await;
        self.remove_record(job_id).await?;

        let (mut ids, _) = self.read_index().await?;
        if ids.remove(job_id) {
            self.write_index(&ids).await?;
        }
        tracing::debug!(%job_id, prefix = %self.prefix, "deleted record");
        Ok(())
    }

    async fn list_ids(&self) -> Result<Vec<JobId>, StoreError> {
        let (ids, _) = self.read_index().await?;
        Ok(ids.into_iter().collect())
    }

    async fn purge_older_than(&self, days: u32) -> Result<usize, StoreError> {
        let now_ms = self.clock.epoch_ms();
        let _guard = self.write_lock.lock().await;
        let (mut ids, _) = self.read_index().await?;

        let mut expired = Vec::new();
        for job_id in &ids {
            let Some(state) = StateStore::<S>::load(self, job_id).await else {
                continue;
            };
            if is_expired(state.last_modified_ms(), now_ms, days) {
                expired.push(job_id.clone());
            }
        }

        for job_id in &expired {
            self.remove_record(job_id).await?;
            ids.remove(job_id);
        }
        if !expired.is_empty() {
            self.write_index(&ids).await?;
            tracing::info!(prefix = %self.prefix, days, count = expired.len(), "purged old records");
        }
        Ok(expired.len())
    }
}

async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let mut tmp_path = path.as_os_str().to_owned();
    tmp_path.push(".tmp");
    tokio::fs::write(&tmp_path, bytes).await?;
    tokio::fs::rename(&tmp_path, path).await?;
    Ok(())
}

#[cfg(test)]
#[path = "file_tests.rs"]
mod tests;
