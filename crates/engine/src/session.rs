// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Orchestration of one job: a timer and a progress record bound to the same
//! job id, kept on the same step.
//!
//! The timer is the driver. Local step changes go through the timer first and
//! are mirrored into progress; remote step changes land in progress first and
//! are replayed into the timer one `advance_step` at a time so intervals close
//! in order.

use crate::collaborators::{PaymentCollaborator, PaymentRequest, PaymentStage};
use crate::error::EngineError;
use crate::progress::JobProgress;
use crate::timer::{Advanced, JobTimer};
use crate::transition::Transition;
use haul_core::{
    billing_step, compute_billable, format_hhmm, BillableTime, BillingRates, Clock, Invoice,
    JobId, JobProgressState, JobTimerState, RemoteProgress, StepDefinition, SyncOutcome,
    TimerPhase, TransitionError,
};
use haul_storage::StateStore;
use serde::Serialize;
use std::sync::Arc;

/// Everything a session needs besides its job id and catalog.
#[derive(Clone)]
pub struct SessionDeps<C: Clock> {
    pub timers: Arc<dyn StateStore<JobTimerState>>,
    pub progress: Arc<dyn StateStore<JobProgressState>>,
    pub payments: Arc<dyn PaymentCollaborator>,
    pub rates: BillingRates,
    pub clock: C,
}

/// Read-only snapshot for display, recomputed from the clock on demand.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub job_id: JobId,
    pub phase: TimerPhase,
    pub current_step: u32,
    pub total_steps: u32,
    pub step_name: Option<String>,
    pub is_running: bool,
    pub is_on_break: bool,
    pub total_elapsed_ms: u64,
    pub billable_elapsed_ms: u64,
    /// `HH:MM`
    pub total_elapsed: String,
    /// `HH:MM`
    pub billable_elapsed: String,
    pub billable: BillableTime,
    pub is_completed: bool,
}

pub struct JobSession<C: Clock> {
    job_id: JobId,
    steps: Arc<[StepDefinition]>,
    billing_step: Option<u32>,
    timer: JobTimer<C>,
    progress: JobProgress<C>,
    payments: Arc<dyn PaymentCollaborator>,
    rates: BillingRates,
    billing_requested: bool,
    completion_requested: bool,
}

impl<C: Clock> JobSession<C> {
    /// Open both machines for `job_id`, resuming stored records.
    ///
    /// If a crash left one record ahead of the other, they are brought back
    /// onto the same step before the session is returned.
    pub async fn open(
        job_id: JobId,
        steps: Arc<[StepDefinition]>,
        deps: SessionDeps<C>,
    ) -> Result<Self, EngineError> {
        let total = steps.len() as u32;
        let timer =
            JobTimer::open(&job_id, total, deps.timers, deps.clock.clone(), deps.rates.clone())
                .await;
        let progress = JobProgress::open(&job_id, &steps, deps.progress, deps.clock).await;

        let mut session = Self {
            billing_step: billing_step(&steps),
            job_id,
            steps,
            timer,
            progress,
            payments: deps.payments,
            rates: deps.rates,
            billing_requested: false,
            completion_requested: false,
        };
        session.realign().await?;
        session.sync_payment_flags();
        tracing::info!(
            job_id = %session.job_id,
            step = session.current_step(),
            total_steps = session.total_steps(),
            phase = %session.phase(),
            "session opened"
        );
        Ok(session)
    }

    // ── Reads ───────────────────────────────────────────────────────────

    pub fn job_id(&self) -> &JobId {
        &self.job_id
    }

    pub fn steps(&self) -> &[StepDefinition] {
        &self.steps
    }

    pub fn timer_state(&self) -> &JobTimerState {
        self.timer.state()
    }

    pub fn progress_state(&self) -> &JobProgressState {
        self.progress.state()
    }

    pub fn phase(&self) -> TimerPhase {
        self.timer.phase()
    }

    pub fn current_step(&self) -> u32 {
        self.timer.current_step()
    }

    pub fn total_steps(&self) -> u32 {
        self.timer.total_steps()
    }

    pub fn is_running(&self) -> bool {
        self.timer.state().is_running
    }

    pub fn is_on_break(&self) -> bool {
        self.timer.state().is_on_break
    }

    pub fn total_elapsed_ms(&self) -> u64 {
        self.timer.total_elapsed_ms()
    }

    pub fn billable_elapsed_ms(&self) -> u64 {
        self.timer.billable_elapsed_ms()
    }

    pub fn format_time(&self, ms: u64) -> String {
        format_hhmm(ms)
    }

    pub fn calculate_cost(&self, ms: u64) -> BillableTime {
        compute_billable(ms, &self.rates)
    }

    pub fn invoice(&self) -> Invoice {
        self.timer.invoice()
    }

    pub fn view(&self) -> SessionView {
        let total_elapsed_ms = self.total_elapsed_ms();
        let billable_elapsed_ms = self.billable_elapsed_ms();
        let current_step = self.current_step();
        SessionView {
            job_id: self.job_id.clone(),
            phase: self.phase(),
            current_step,
            total_steps: self.total_steps(),
            step_name: current_step
                .checked_sub(1)
                .and_then(|i| self.steps.get(i as usize))
                .map(|s| s.name.clone()),
            is_running: self.is_running(),
            is_on_break: self.is_on_break(),
            total_elapsed_ms,
            billable_elapsed_ms,
            total_elapsed: format_hhmm(total_elapsed_ms),
            billable_elapsed: format_hhmm(billable_elapsed_ms),
            billable: self.calculate_cost(billable_elapsed_ms),
            is_completed: self.progress.is_completed(),
        }
    }

    // ── Commands ────────────────────────────────────────────────────────

    pub fn on_complete(&mut self, callback: impl FnOnce(&Invoice) + Send + Sync + 'static) {
        self.timer.on_complete(callback);
    }

    pub async fn start_timer(&mut self) -> Result<Transition, EngineError> {
        let (started, written) = match self.timer.start().await {
            Ok(started) => (started, Ok(())),
            // Started in memory; only the write failed
            Err(e) if self.phase() != TimerPhase::NotStarted => (Transition::Applied(()), Err(e)),
            Err(e) => return Err(e),
        };
        if started.is_applied() {
            self.on_step_entered(1).await;
            let mirrored = self.mirror_progress().await;
            written?;
            mirrored?;
        }
        Ok(started)
    }

    /// Advance one step. On a job that has not started this starts the timer.
    ///
    /// A failed timer write still leaves the step applied in memory; progress
    /// and payments follow it before the error is returned.
    pub async fn next_step(&mut self) -> Result<Transition<Advanced>, EngineError> {
        if self.phase() == TimerPhase::NotStarted {
            return Ok(self.start_timer().await?.map(|()| Advanced::Step(1)));
        }
        let target = self.current_step() + 1;
        let advanced = self.advance_timer(target).await;
        let mirrored = self.mirror_progress().await;
        let advanced = advanced?;
        mirrored?;
        Ok(advanced)
    }

    /// Run the job straight to its terminal step.
    ///
    /// Closes an open break, then walks the remaining steps so every interval
    /// is closed in order.
    pub async fn stop_timer(&mut self) -> Result<Transition<Invoice>, EngineError> {
        match self.phase() {
            TimerPhase::NotStarted => return Ok(Transition::Rejected(TransitionError::NotStarted)),
            TimerPhase::Terminal => {
                return Ok(Transition::Rejected(TransitionError::AlreadyTerminal))
            }
            TimerPhase::OnBreak => {
                self.timer.stop_break().await?;
            }
            TimerPhase::Running => {}
        }
        tracing::info!(job_id = %self.job_id, from_step = self.current_step(), "stopping timer");
        loop {
            match self.next_step().await? {
                Transition::Applied(Advanced::Step(_)) => continue,
                Transition::Applied(Advanced::Completed(invoice)) => {
                    return Ok(Transition::Applied(invoice))
                }
                Transition::Rejected(e) => return Ok(Transition::Rejected(e)),
            }
        }
    }

    pub async fn start_break(&mut self) -> Result<Transition, EngineError> {
        self.timer.start_break().await
    }

    pub async fn stop_break(&mut self) -> Result<Transition, EngineError> {
        self.timer.stop_break().await
    }

    pub async fn complete_step(&mut self, id: u32) -> Result<Transition, EngineError> {
        self.progress.complete_step(id).await
    }

    /// Apply progress fetched from the remote source.
    ///
    /// When the remote record wins and is ahead of the timer, the timer is
    /// advanced through each intermediate step. The timer never moves back.
    pub async fn absorb_remote(
        &mut self,
        remote: &RemoteProgress,
    ) -> Result<Transition<SyncOutcome>, EngineError> {
        let synced = self.progress.sync_from_remote(remote).await?;
        if synced == Transition::Applied(SyncOutcome::Replaced) {
            self.catch_up_timer().await?;
        }
        Ok(synced)
    }

    /// Operator correction: discard both records for this job and start over.
    pub async fn reset(&mut self) -> Result<(), EngineError> {
        tracing::warn!(
            job_id = %self.job_id,
            step = self.current_step(),
            phase = %self.phase(),
            "job reset by operator"
        );
        self.timer.reset().await?;
        self.progress.reset().await?;
        self.sync_payment_flags();
        Ok(())
    }

    // ── Internals ───────────────────────────────────────────────────────

    /// Advance the timer and request any payment the new step triggers.
    ///
    /// The payment bookkeeping runs even when the timer write fails, since
    /// the step is applied in memory either way.
    async fn advance_timer(&mut self, target: u32) -> Result<Transition<Advanced>, EngineError> {
        let (advanced, written) = match self.timer.advance_step(target).await {
            Ok(advanced) => (advanced, Ok(())),
            Err(e) if self.current_step() == target => {
                (Transition::Applied(self.entered(target)), Err(e))
            }
            Err(e) => return Err(e),
        };
        match &advanced {
            Transition::Applied(Advanced::Step(step)) => self.on_step_entered(*step).await,
            Transition::Applied(Advanced::Completed(invoice)) => {
                let invoice = invoice.clone();
                self.on_step_entered(target).await;
                self.on_completed(&invoice).await;
            }
            Transition::Rejected(_) => {}
        }
        written.map(|()| advanced)
    }

    /// What the timer moved into, read back from its in-memory state.
    fn entered(&self, step: u32) -> Advanced {
        if self.timer.state().is_terminal() {
            Advanced::Completed(self.timer.invoice())
        } else {
            Advanced::Step(step)
        }
    }

    /// Move progress onto the timer's step, completing it once the timer is
    /// terminal.
    async fn mirror_progress(&mut self) -> Result<(), EngineError> {
        if self.timer.state().is_terminal() {
            return self.progress.complete_job().await.map(drop);
        }
        let step = self.current_step();
        if step > 0 && self.progress.actual_step() != step {
            self.progress.set_step(step).await?;
        }
        Ok(())
    }

    /// Replay timer steps until it reaches the progress step.
    ///
    /// An open break is closed first; the remote record says work went on.
    async fn catch_up_timer(&mut self) -> Result<(), EngineError> {
        let target = self.progress.actual_step();
        if target < self.current_step() {
            tracing::warn!(
                job_id = %self.job_id,
                timer_step = self.current_step(),
                progress_step = target,
                "progress is behind the timer; timer steps never move back"
            );
            return Ok(());
        }
        if target == self.current_step() {
            return self.complete_if_terminal().await;
        }
        match self.phase() {
            TimerPhase::NotStarted => {
                if let Transition::Rejected(_) = self.timer.start().await? {
                    return Ok(());
                }
                self.on_step_entered(1).await;
            }
            TimerPhase::OnBreak => {
                tracing::info!(
                    job_id = %self.job_id,
                    timer_step = self.current_step(),
                    progress_step = target,
                    "closing break to replay remote steps"
                );
                self.timer.stop_break().await?;
            }
            TimerPhase::Running | TimerPhase::Terminal => {}
        }
        while self.current_step() < target {
            let next = self.current_step() + 1;
            if let Transition::Rejected(e) = self.advance_timer(next).await? {
                tracing::warn!(
                    job_id = %self.job_id,
                    timer_step = self.current_step(),
                    progress_step = target,
                    error = %e,
                    "timer could not catch up; records disagree"
                );
                break;
            }
        }
        self.complete_if_terminal().await
    }

    async fn complete_if_terminal(&mut self) -> Result<(), EngineError> {
        if self.timer.state().is_terminal() && !self.progress.is_completed() {
            self.progress.complete_job().await?;
        }
        Ok(())
    }

    /// Bring the two records onto the same step after a reload.
    async fn realign(&mut self) -> Result<(), EngineError> {
        let timer_step = self.current_step();
        let progress_step = self.progress.actual_step();
        let unfinished = self.timer.state().is_terminal() && !self.progress.is_completed();
        if timer_step == progress_step && !unfinished {
            return Ok(());
        }
        tracing::warn!(
            job_id = %self.job_id,
            timer_step,
            progress_step,
            progress_completed = self.progress.is_completed(),
            "timer and progress disagree, realigning"
        );
        // Replayed steps were entered before this session; no payment requests
        self.billing_requested = true;
        self.completion_requested = true;
        if progress_step > timer_step {
            self.catch_up_timer().await
        } else {
            self.mirror_progress().await
        }
    }

    /// Payment stages the timer is already past count as requested.
    fn sync_payment_flags(&mut self) {
        let step = self.current_step();
        self.billing_requested = self.billing_step.is_some_and(|billing| step >= billing);
        self.completion_requested = self.timer.state().is_terminal();
    }

    async fn on_step_entered(&mut self, step: u32) {
        if self.billing_step != Some(step) || self.billing_requested {
            return;
        }
        self.billing_requested = true;
        let billable = self.timer.billable();
        self.request_payment(PaymentStage::BillingStep, billable).await;
    }

    async fn on_completed(&mut self, invoice: &Invoice) {
        if self.completion_requested {
            return;
        }
        self.completion_requested = true;
        let billable = BillableTime {
            raw_hours: invoice.raw_hours,
            billable_hours: invoice.billable_hours,
            cost: invoice.total,
        };
        self.request_payment(PaymentStage::Completion, billable).await;
    }

    /// Payment failures are logged and never block a transition.
    async fn request_payment(&self, stage: PaymentStage, billable: BillableTime) {
        let request = PaymentRequest {
            job_id: self.job_id.clone(),
            stage,
            billable_hours: billable.billable_hours,
            cost: billable.cost,
            currency: self.rates.currency.clone(),
        };
        tracing::info!(
            job_id = %self.job_id,
            %stage,
            billable_hours = request.billable_hours,
            cost = request.cost,
            "requesting payment"
        );
        if let Err(e) = self.payments.request_payment(request).await {
            tracing::warn!(job_id = %self.job_id, %stage, error = %e, "payment request failed");
        }
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
