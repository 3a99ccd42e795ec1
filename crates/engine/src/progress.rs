// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job progress state machine: step-completion bookkeeping with persistence.

use crate::error::EngineError;
use crate::transition::Transition;
use haul_core::{
    Clock, JobId, JobProgressState, RemoteProgress, StepDefinition, SyncOutcome, TransitionError,
};
use haul_storage::StateStore;
use std::sync::Arc;

pub struct JobProgress<C: Clock> {
    state: JobProgressState,
    store: Arc<dyn StateStore<JobProgressState>>,
    clock: C,
}

impl<C: Clock> JobProgress<C> {
    /// Load the stored record for `job_id`, or build a fresh one from `steps`.
    pub async fn open(
        job_id: &JobId,
        steps: &[StepDefinition],
        store: Arc<dyn StateStore<JobProgressState>>,
        clock: C,
    ) -> Self {
        let state = match store.load(job_id).await {
            Some(state) => state,
            None => JobProgressState::new(job_id.clone(), steps, clock.epoch_ms()),
        };
        Self { state, store, clock }
    }

    pub fn state(&self) -> &JobProgressState {
        &self.state
    }

    pub fn actual_step(&self) -> u32 {
        self.state.actual_step
    }

    pub fn is_completed(&self) -> bool {
        self.state.is_completed
    }

    pub async fn set_step(&mut self, step: u32) -> Result<Transition, EngineError> {
        let result = self.state.set_step(step, self.clock.epoch_ms());
        self.settle("set_step", result).await
    }

    /// Move one step forward; rejected at the last step.
    pub async fn next(&mut self) -> Result<Transition<u32>, EngineError> {
        let result = self.state.next(self.clock.epoch_ms());
        self.settle("next", result).await
    }

    /// Move one step back; rejected at step 1.
    pub async fn prev(&mut self) -> Result<Transition<u32>, EngineError> {
        let result = self.state.prev(self.clock.epoch_ms());
        self.settle("prev", result).await
    }

    pub async fn complete_step(&mut self, id: u32) -> Result<Transition, EngineError> {
        let result = self.state.complete_step(id, self.clock.epoch_ms());
        self.settle("complete_step", result).await
    }

    pub async fn complete_job(&mut self) -> Result<Transition, EngineError> {
        if !self.state.is_completed {
            self.state.complete_job(self.clock.epoch_ms());
            tracing::info!(job_id = %self.state.job_id, "progress completed");
            self.persist().await?;
        }
        Ok(Transition::Applied(()))
    }

    /// Reconcile against the remote record. Only call after a real round-trip.
    pub async fn sync_from_remote(
        &mut self,
        remote: &RemoteProgress,
    ) -> Result<Transition<SyncOutcome>, EngineError> {
        match self.state.sync_from_remote(remote, self.clock.epoch_ms()) {
            Ok(outcome) => {
                tracing::info!(
                    job_id = %self.state.job_id,
                    %outcome,
                    remote_step = remote.actual_step,
                    "synced progress from remote"
                );
                if outcome == SyncOutcome::Replaced {
                    self.persist().await?;
                }
                Ok(Transition::Applied(outcome))
            }
            Err(e) => Ok(self.reject("sync_from_remote", e)),
        }
    }

    pub async fn reset(&mut self) -> Result<(), EngineError> {
        tracing::warn!(
            job_id = %self.state.job_id,
            step = self.state.actual_step,
            "progress reset by operator"
        );
        self.state.reset(self.clock.epoch_ms());
        self.persist().await
    }

    async fn settle<T: Send>(
        &mut self,
        command: &str,
        result: Result<T, TransitionError>,
    ) -> Result<Transition<T>, EngineError> {
        match result {
            Ok(value) => {
                tracing::debug!(job_id = %self.state.job_id, command, step = self.state.actual_step, "progress updated");
                self.persist().await?;
                Ok(Transition::Applied(value))
            }
            Err(e) => Ok(self.reject(command, e)),
        }
    }

    fn reject<T>(&self, command: &str, error: TransitionError) -> Transition<T> {
        tracing::warn!(
            job_id = %self.state.job_id,
            command,
            step = self.state.actual_step,
            error = %error,
            "progress command rejected"
        );
        Transition::Rejected(error)
    }

    async fn persist(&self) -> Result<(), EngineError> {
        self.store.save(&self.state.job_id, &self.state).await.map_err(|e| {
            tracing::error!(job_id = %self.state.job_id, error = %e, "failed to persist progress");
            EngineError::from(e)
        })
    }
}

#[cfg(test)]
#[path = "progress_tests.rs"]
mod tests;
