// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session registry.
//!
//! Sessions are opened lazily on first access and cached by job id. Each is
//! guarded by an async mutex, so commands for one job queue behind the
//! previous command's persistence write instead of racing it.
//!
//! The registry map is only locked to find a job's slot. Opening a session
//! (store reads, the job source round-trip) happens in that slot, so a slow
//! job never holds up another.

use crate::collaborators::{JobSource, PaymentCollaborator};
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::session::{JobSession, SessionDeps};
use haul_core::{
    Clock, JobId, JobProgressState, JobTimerState, RemoteProgress, StepCatalog, StepDefinition,
    SystemClock,
};
use haul_storage::{validate_job_id, FileStore, StateStore, PROGRESS_KEY_PREFIX, STATE_KEY_PREFIX};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};

/// Shared handle to an open session.
pub type SessionHandle<C = SystemClock> = Arc<Mutex<JobSession<C>>>;

/// Filled once the session for a job has opened; empty while opening or
/// after a failed open.
type SessionSlot<C> = Arc<OnceCell<SessionHandle<C>>>;

/// Stores and collaborators the engine is built from.
pub struct EngineDeps<C: Clock> {
    pub timers: Arc<dyn StateStore<JobTimerState>>,
    pub progress: Arc<dyn StateStore<JobProgressState>>,
    pub source: Arc<dyn JobSource>,
    pub payments: Arc<dyn PaymentCollaborator>,
    pub clock: C,
}

pub struct Engine<C: Clock = SystemClock> {
    config: EngineConfig,
    catalog: StepCatalog,
    deps: EngineDeps<C>,
    sessions: parking_lot::Mutex<HashMap<JobId, SessionSlot<C>>>,
}

impl Engine<SystemClock> {
    /// Engine backed by JSON files in the resolved state directory.
    pub fn with_file_stores(
        config: EngineConfig,
        source: Arc<dyn JobSource>,
        payments: Arc<dyn PaymentCollaborator>,
    ) -> Result<Self, EngineError> {
        let dir = crate::env::state_dir(&config).ok_or(EngineError::NoStateDir)?;
        tracing::info!(state_dir = %dir.display(), "using file stores");
        let deps = EngineDeps {
            timers: Arc::new(FileStore::<JobTimerState>::new(&dir, STATE_KEY_PREFIX)),
            progress: Arc::new(FileStore::<JobProgressState>::new(&dir, PROGRESS_KEY_PREFIX)),
            source,
            payments,
            clock: SystemClock,
        };
        Ok(Self::new(config, deps))
    }
}

impl<C: Clock> Engine<C> {
    pub fn new(config: EngineConfig, deps: EngineDeps<C>) -> Self {
        Self {
            config,
            catalog: StepCatalog::new(),
            deps,
            sessions: parking_lot::Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn clock(&self) -> &C {
        &self.deps.clock
    }

    /// Open (or return the cached) session for `job_id`.
    ///
    /// A job with a stored progress record reuses its step list. Otherwise
    /// the job source is asked once for the stop list and any progress made
    /// elsewhere, which is absorbed through the timer.
    pub async fn session(&self, job_id: &JobId) -> Result<SessionHandle<C>, EngineError> {
        validate_job_id(job_id)?;
        let slot = Arc::clone(self.sessions.lock().entry(job_id.clone()).or_default());
        let handle = slot.get_or_try_init(|| self.open_session(job_id)).await?;
        Ok(Arc::clone(handle))
    }

    async fn open_session(&self, job_id: &JobId) -> Result<SessionHandle<C>, EngineError> {
        let (steps, remote): (Arc<[StepDefinition]>, Option<RemoteProgress>) =
            match self.deps.progress.load(job_id).await {
                Some(stored) => (stored.definitions().into(), None),
                None => {
                    let job = self.deps.source.fetch_job(job_id).await?;
                    tracing::info!(%job_id, stops = job.stop_count(), "fetched job from source");
                    (self.catalog.steps(job.stop_count(), self.config.include_return)?, job.progress)
                }
            };

        let mut session = JobSession::open(job_id.clone(), steps, self.session_deps()).await?;
        if let Some(remote) = remote {
            session.absorb_remote(&remote).await?;
        }
        Ok(Arc::new(Mutex::new(session)))
    }

    /// Ids of every job with a stored timer or progress record.
    pub async fn known_jobs(&self) -> Result<Vec<JobId>, EngineError> {
        let mut ids: BTreeSet<JobId> = self.deps.timers.list_ids().await?.into_iter().collect();
        ids.extend(self.deps.progress.list_ids().await?);
        Ok(ids.into_iter().collect())
    }

    /// Remove both records for a job and drop its cached session.
    pub async fn delete_job(&self, job_id: &JobId) -> Result<(), EngineError> {
        self.sessions.lock().remove(job_id);
        self.deps.timers.delete(job_id).await?;
        self.deps.progress.delete(job_id).await?;
        tracing::info!(%job_id, "deleted job");
        Ok(())
    }

    /// Purge records untouched for more than `days` days from both stores.
    ///
    /// Cached sessions whose records are both gone are evicted. Returns the
    /// number of records removed across both stores.
    pub async fn purge_older_than(&self, days: u32) -> Result<usize, EngineError> {
        let removed = self.deps.timers.purge_older_than(days).await?
            + self.deps.progress.purge_older_than(days).await?;
        if removed > 0 {
            let known: BTreeSet<JobId> = self.known_jobs().await?.into_iter().collect();
            self.sessions
                .lock()
                .retain(|job_id, slot| known.contains(job_id) || !slot.initialized());
        }
        tracing::info!(days, removed, "retention purge finished");
        Ok(removed)
    }

    /// [`Self::purge_older_than`] with the configured retention.
    pub async fn purge_expired(&self) -> Result<usize, EngineError> {
        self.purge_older_than(self.config.retention_days).await
    }

    fn session_deps(&self) -> SessionDeps<C> {
        SessionDeps {
            timers: Arc::clone(&self.deps.timers),
            progress: Arc::clone(&self.deps.progress),
            payments: Arc::clone(&self.deps.payments),
            rates: self.config.billing.clone(),
            clock: self.deps.clock.clone(),
        }
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
