// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job timer record and its pure transitions.
//!
//! All transitions take the current epoch milliseconds explicitly so the
//! record can be replayed and tested without a clock. The record is the
//! persisted shape: field names serialize in camelCase.

use crate::billing::{compute_billable, BillableTime, BillingRates, Invoice};
use crate::id::JobId;
use crate::transition::TransitionError;
use serde::{Deserialize, Serialize};

/// Time spent in one step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepInterval {
    pub step: u32,
    pub started_at_ms: u64,
    /// `None` while the step is active
    pub ended_at_ms: Option<u64>,
    pub duration_ms: Option<u64>,
}

impl StepInterval {
    fn open(step: u32, now_ms: u64) -> Self {
        Self { step, started_at_ms: now_ms, ended_at_ms: None, duration_ms: None }
    }

    fn close(&mut self, now_ms: u64) {
        if self.ended_at_ms.is_none() {
            self.ended_at_ms = Some(now_ms);
            self.duration_ms = Some(now_ms.saturating_sub(self.started_at_ms));
        }
    }

    pub fn is_open(&self) -> bool {
        self.ended_at_ms.is_none()
    }
}

/// A suspension of billable time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakInterval {
    pub start_ms: u64,
    pub end_ms: Option<u64>,
}

impl BreakInterval {
    /// Length of the break; an open break runs until `now_ms`.
    pub fn duration_ms(&self, now_ms: u64) -> u64 {
        self.end_ms.unwrap_or(now_ms).saturating_sub(self.start_ms)
    }
}

/// Lifecycle phase, derived from the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerPhase {
    NotStarted,
    Running,
    OnBreak,
    Terminal,
}

crate::simple_display! {
    TimerPhase {
        NotStarted => "not_started",
        Running => "running",
        OnBreak => "on_break",
        Terminal => "terminal",
    }
}

/// What [`JobTimerState::advance_step`] moved into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepEntered {
    /// A non-terminal step; its interval is now open
    Step(u32),
    /// The terminal step; elapsed time is frozen
    Terminal { total_elapsed_ms: u64, billable_ms: u64 },
}

/// Live clock of a single job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobTimerState {
    pub job_id: JobId,
    pub total_steps: u32,
    /// 0 until started
    pub started_at_ms: u64,
    /// 0 is the "not started" sentinel
    pub current_step: u32,
    pub intervals: Vec<StepInterval>,
    pub is_running: bool,
    pub is_on_break: bool,
    pub break_intervals: Vec<BreakInterval>,
    /// Frozen when the terminal step is reached; 0 before that
    pub total_elapsed_ms: u64,
    pub updated_at_ms: u64,
}

impl JobTimerState {
    pub fn new(job_id: JobId, total_steps: u32, now_ms: u64) -> Self {
        Self {
            job_id,
            total_steps,
            started_at_ms: 0,
            current_step: 0,
            intervals: Vec::new(),
            is_running: false,
            is_on_break: false,
            break_intervals: Vec::new(),
            total_elapsed_ms: 0,
            updated_at_ms: now_ms,
        }
    }

    pub fn phase(&self) -> TimerPhase {
        if self.current_step == 0 {
            TimerPhase::NotStarted
        } else if !self.is_running {
            TimerPhase::Terminal
        } else if self.is_on_break {
            TimerPhase::OnBreak
        } else {
            TimerPhase::Running
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.phase() == TimerPhase::Terminal
    }

    /// The interval of the step currently being worked, if any.
    pub fn open_interval(&self) -> Option<&StepInterval> {
        self.intervals.last().filter(|i| i.is_open())
    }

    /// `NotStarted -> Running(step 1)`.
    pub fn start(&mut self, now_ms: u64) -> Result<(), TransitionError> {
        match self.phase() {
            TimerPhase::NotStarted => {}
            TimerPhase::Terminal => return Err(TransitionError::AlreadyTerminal),
            TimerPhase::Running | TimerPhase::OnBreak => {
                return Err(TransitionError::AlreadyStarted)
            }
        }
        self.started_at_ms = now_ms;
        self.current_step = 1;
        self.is_running = true;
        self.intervals.push(StepInterval::open(1, now_ms));
        self.updated_at_ms = now_ms;
        Ok(())
    }

    /// Move to `target`, which must be exactly `current_step + 1`.
    ///
    /// Closes the current interval. Entering the terminal step stops the
    /// clock and freezes `total_elapsed_ms`.
    pub fn advance_step(&mut self, target: u32, now_ms: u64) -> Result<StepEntered, TransitionError> {
        match self.phase() {
            TimerPhase::Running => {}
            TimerPhase::NotStarted => return Err(TransitionError::NotStarted),
            TimerPhase::OnBreak => return Err(TransitionError::OnBreak),
            TimerPhase::Terminal => return Err(TransitionError::AlreadyTerminal),
        }
        if target != self.current_step + 1 {
            return Err(TransitionError::StepSkipped { current: self.current_step, target });
        }
        if target > self.total_steps {
            return Err(TransitionError::OutOfRange { step: target, total: self.total_steps });
        }

        if let Some(interval) = self.intervals.iter_mut().rev().find(|i| i.is_open()) {
            interval.close(now_ms);
        }
        self.current_step = target;
        self.updated_at_ms = now_ms;

        if target < self.total_steps {
            self.intervals.push(StepInterval::open(target, now_ms));
            return Ok(StepEntered::Step(target));
        }

        self.is_running = false;
        self.total_elapsed_ms = now_ms.saturating_sub(self.started_at_ms);
        Ok(StepEntered::Terminal {
            total_elapsed_ms: self.total_elapsed_ms,
            billable_ms: self.billable_elapsed_ms(now_ms),
        })
    }

    pub fn start_break(&mut self, now_ms: u64) -> Result<(), TransitionError> {
        match self.phase() {
            TimerPhase::Running => {}
            TimerPhase::OnBreak => return Err(TransitionError::AlreadyOnBreak),
            TimerPhase::NotStarted => return Err(TransitionError::NotStarted),
            TimerPhase::Terminal => return Err(TransitionError::AlreadyTerminal),
        }
        self.is_on_break = true;
        self.break_intervals.push(BreakInterval { start_ms: now_ms, end_ms: None });
        self.updated_at_ms = now_ms;
        Ok(())
    }

    pub fn stop_break(&mut self, now_ms: u64) -> Result<(), TransitionError> {
        match self.phase() {
            TimerPhase::OnBreak => {}
            TimerPhase::Running => return Err(TransitionError::NotOnBreak),
            TimerPhase::NotStarted => return Err(TransitionError::NotStarted),
            TimerPhase::Terminal => return Err(TransitionError::AlreadyTerminal),
        }
        if let Some(open) = self.break_intervals.iter_mut().rev().find(|b| b.end_ms.is_none()) {
            open.end_ms = Some(now_ms.max(open.start_ms));
        }
        self.is_on_break = false;
        self.updated_at_ms = now_ms;
        Ok(())
    }

    /// Discard all progress for this job and return to `NotStarted`.
    pub fn reset(&mut self, now_ms: u64) {
        *self = Self::new(self.job_id.clone(), self.total_steps, now_ms);
    }

    /// Wall-clock time since start. Keeps running during breaks.
    pub fn total_elapsed_ms(&self, now_ms: u64) -> u64 {
        match self.phase() {
            TimerPhase::NotStarted => 0,
            TimerPhase::Terminal => self.total_elapsed_ms,
            TimerPhase::Running | TimerPhase::OnBreak => now_ms.saturating_sub(self.started_at_ms),
        }
    }

    pub fn break_ms(&self, now_ms: u64) -> u64 {
        self.break_intervals.iter().map(|b| b.duration_ms(now_ms)).sum()
    }

    /// Total elapsed minus breaks.
    pub fn billable_elapsed_ms(&self, now_ms: u64) -> u64 {
        self.total_elapsed_ms(now_ms).saturating_sub(self.break_ms(now_ms))
    }

    pub fn billable(&self, rates: &BillingRates, now_ms: u64) -> BillableTime {
        compute_billable(self.billable_elapsed_ms(now_ms), rates)
    }

    pub fn invoice(&self, rates: &BillingRates, now_ms: u64) -> Invoice {
        Invoice::from_billable(self.job_id.clone(), &self.billable(rates, now_ms), rates)
    }
}

#[cfg(test)]
#[path = "timer_tests.rs"]
mod tests;
