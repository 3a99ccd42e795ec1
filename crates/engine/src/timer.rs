// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job timer state machine.
//!
//! Wraps a [`JobTimerState`] with its store and clock. Every applied
//! transition is persisted before the call returns; rejected transitions are
//! logged and leave both the record and the store untouched.

use crate::error::EngineError;
use crate::transition::Transition;
use haul_core::{
    BillableTime, BillingRates, Clock, Invoice, JobId, JobTimerState, StepEntered, TimerPhase,
    TransitionError,
};
use haul_storage::StateStore;
use std::sync::Arc;

/// Fired once when the terminal step is reached.
pub type CompletionCallback = Box<dyn FnOnce(&Invoice) + Send + Sync>;

/// What an applied [`JobTimer::advance_step`] moved into.
#[derive(Debug, Clone, PartialEq)]
pub enum Advanced {
    Step(u32),
    /// The terminal step; carries the final figures
    Completed(Invoice),
}

pub struct JobTimer<C: Clock> {
    state: JobTimerState,
    store: Arc<dyn StateStore<JobTimerState>>,
    clock: C,
    rates: BillingRates,
    on_complete: Option<CompletionCallback>,
}

impl<C: Clock> JobTimer<C> {
    /// Load the stored timer for `job_id`, or start a fresh one.
    ///
    /// A fresh timer is not written until its first transition.
    pub async fn open(
        job_id: &JobId,
        total_steps: u32,
        store: Arc<dyn StateStore<JobTimerState>>,
        clock: C,
        rates: BillingRates,
    ) -> Self {
        let state = match store.load(job_id).await {
            Some(state) => {
                if state.total_steps != total_steps {
                    tracing::warn!(
                        %job_id,
                        stored = state.total_steps,
                        expected = total_steps,
                        "stored timer has a different step count, keeping stored record"
                    );
                }
                tracing::debug!(%job_id, step = state.current_step, phase = %state.phase(), "resumed timer");
                state
            }
            None => JobTimerState::new(job_id.clone(), total_steps, clock.epoch_ms()),
        };
        Self { state, store, clock, rates, on_complete: None }
    }

    /// Register the completion callback, replacing any previous one.
    pub fn on_complete(&mut self, callback: impl FnOnce(&Invoice) + Send + Sync + 'static) {
        self.on_complete = Some(Box::new(callback));
    }

    pub fn state(&self) -> &JobTimerState {
        &self.state
    }

    pub fn job_id(&self) -> &JobId {
        &self.state.job_id
    }

    pub fn phase(&self) -> TimerPhase {
        self.state.phase()
    }

    pub fn current_step(&self) -> u32 {
        self.state.current_step
    }

    pub fn total_steps(&self) -> u32 {
        self.state.total_steps
    }

    pub fn rates(&self) -> &BillingRates {
        &self.rates
    }

    pub fn total_elapsed_ms(&self) -> u64 {
        self.state.total_elapsed_ms(self.clock.epoch_ms())
    }

    pub fn billable_elapsed_ms(&self) -> u64 {
        self.state.billable_elapsed_ms(self.clock.epoch_ms())
    }

    pub fn billable(&self) -> BillableTime {
        self.state.billable(&self.rates, self.clock.epoch_ms())
    }

    pub fn invoice(&self) -> Invoice {
        self.state.invoice(&self.rates, self.clock.epoch_ms())
    }

    pub async fn start(&mut self) -> Result<Transition, EngineError> {
        let now = self.clock.epoch_ms();
        if let Err(e) = self.state.start(now) {
            return Ok(self.reject("start", e));
        }
        tracing::info!(job_id = %self.state.job_id, "timer started");
        self.persist().await?;
        Ok(Transition::Applied(()))
    }

    /// Advance to `target`, which must be the next step.
    ///
    /// On reaching the terminal step the state is persisted, then the
    /// completion callback fires, then any persistence error is returned.
    pub async fn advance_step(&mut self, target: u32) -> Result<Transition<Advanced>, EngineError> {
        let now = self.clock.epoch_ms();
        let entered = match self.state.advance_step(target, now) {
            Ok(entered) => entered,
            Err(e) => return Ok(self.reject("advance_step", e)),
        };

        match entered {
            StepEntered::Step(step) => {
                tracing::info!(job_id = %self.state.job_id, step, "entered step");
                self.persist().await?;
                Ok(Transition::Applied(Advanced::Step(step)))
            }
            StepEntered::Terminal { total_elapsed_ms, billable_ms } => {
                let invoice = self.state.invoice(&self.rates, now);
                tracing::info!(
                    job_id = %self.state.job_id,
                    total_elapsed_ms,
                    billable_ms,
                    billable_hours = invoice.billable_hours,
                    total = invoice.total,
                    "job completed"
                );
                let persisted = self.persist().await;
                if let Some(callback) = self.on_complete.take() {
                    callback(&invoice);
                }
                persisted?;
                Ok(Transition::Applied(Advanced::Completed(invoice)))
            }
        }
    }

    pub async fn start_break(&mut self) -> Result<Transition, EngineError> {
        let now = self.clock.epoch_ms();
        if let Err(e) = self.state.start_break(now) {
            return Ok(self.reject("start_break", e));
        }
        tracing::info!(job_id = %self.state.job_id, step = self.state.current_step, "break started");
        self.persist().await?;
        Ok(Transition::Applied(()))
    }

    pub async fn stop_break(&mut self) -> Result<Transition, EngineError> {
        let now = self.clock.epoch_ms();
        if let Err(e) = self.state.stop_break(now) {
            return Ok(self.reject("stop_break", e));
        }
        tracing::info!(
            job_id = %self.state.job_id,
            break_ms = self.state.break_ms(now),
            "break stopped"
        );
        self.persist().await?;
        Ok(Transition::Applied(()))
    }

    /// Operator correction: discard everything recorded for this job.
    pub async fn reset(&mut self) -> Result<(), EngineError> {
        tracing::warn!(
            job_id = %self.state.job_id,
            step = self.state.current_step,
            phase = %self.state.phase(),
            "timer reset by operator"
        );
        self.state.reset(self.clock.epoch_ms());
        self.persist().await
    }

    fn reject<T>(&self, command: &str, error: TransitionError) -> Transition<T> {
        tracing::warn!(
            job_id = %self.state.job_id,
            command,
            step = self.state.current_step,
            error = %error,
            "timer command rejected"
        );
        Transition::Rejected(error)
    }

    async fn persist(&self) -> Result<(), EngineError> {
        self.store.save(&self.state.job_id, &self.state).await.map_err(|e| {
            tracing::error!(job_id = %self.state.job_id, error = %e, "failed to persist timer");
            EngineError::from(e)
        })
    }
}

#[cfg(test)]
#[path = "timer_tests.rs"]
mod tests;
