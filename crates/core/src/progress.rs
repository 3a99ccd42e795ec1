// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job progress record: which steps are done, independent of timing.
//!
//! Moving forward stamps every step before the new one; moving backward
//! clears the stamps of the re-entered step and everything after it, so
//! "all steps before `actual_step` are complete" holds after any move.

use crate::id::JobId;
use crate::step::StepDefinition;
use crate::transition::TransitionError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A catalog step plus its completion stamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressStep {
    #[serde(flatten)]
    pub definition: StepDefinition,
    pub completed_at_ms: Option<u64>,
}

impl ProgressStep {
    pub fn is_completed(&self) -> bool {
        self.completed_at_ms.is_some()
    }
}

/// Progress as reported by the remote source of truth.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteProgress {
    pub actual_step: u32,
    /// step id -> completion epoch ms
    #[serde(default)]
    pub completed_steps: BTreeMap<u32, u64>,
    pub modified_at_ms: u64,
}

/// How [`JobProgressState::sync_from_remote`] resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Remote record replaced the local one
    Replaced,
    /// Local record has unconfirmed edits newer than the remote one
    KeptLocal,
}

crate::simple_display! {
    SyncOutcome {
        Replaced => "replaced",
        KeptLocal => "kept_local",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobProgressState {
    pub job_id: JobId,
    /// 0 until the first step is entered
    pub actual_step: u32,
    pub steps: Vec<ProgressStep>,
    pub total_steps: u32,
    pub is_completed: bool,
    pub completed_at_ms: Option<u64>,
    pub last_synced_at_ms: Option<u64>,
    pub last_modified_at_ms: u64,
    /// Local edits exist that the remote source has not confirmed
    pub is_dirty: bool,
}

impl JobProgressState {
    pub fn new(job_id: JobId, steps: &[StepDefinition], now_ms: u64) -> Self {
        Self {
            job_id,
            actual_step: 0,
            steps: steps
                .iter()
                .map(|definition| ProgressStep { definition: definition.clone(), completed_at_ms: None })
                .collect(),
            total_steps: steps.len() as u32,
            is_completed: false,
            completed_at_ms: None,
            last_synced_at_ms: None,
            last_modified_at_ms: now_ms,
            is_dirty: false,
        }
    }

    /// Catalog entries without completion stamps.
    pub fn definitions(&self) -> Vec<StepDefinition> {
        self.steps.iter().map(|s| s.definition.clone()).collect()
    }

    pub fn current(&self) -> Option<&ProgressStep> {
        self.actual_step.checked_sub(1).and_then(|i| self.steps.get(i as usize))
    }

    pub fn set_step(&mut self, step: u32, now_ms: u64) -> Result<(), TransitionError> {
        if step < 1 || step > self.total_steps {
            return Err(TransitionError::OutOfRange { step, total: self.total_steps });
        }
        self.move_to(step, now_ms);
        Ok(())
    }

    pub fn next(&mut self, now_ms: u64) -> Result<u32, TransitionError> {
        if self.actual_step >= self.total_steps {
            return Err(TransitionError::OutOfRange {
                step: self.actual_step + 1,
                total: self.total_steps,
            });
        }
        self.move_to(self.actual_step + 1, now_ms);
        Ok(self.actual_step)
    }

    pub fn prev(&mut self, now_ms: u64) -> Result<u32, TransitionError> {
        if self.actual_step <= 1 {
            return Err(TransitionError::OutOfRange {
                step: self.actual_step.saturating_sub(1),
                total: self.total_steps,
            });
        }
        self.move_to(self.actual_step - 1, now_ms);
        Ok(self.actual_step)
    }

    /// Stamp a single step. Already-stamped steps keep their original time.
    pub fn complete_step(&mut self, id: u32, now_ms: u64) -> Result<(), TransitionError> {
        let step = self
            .steps
            .iter_mut()
            .find(|s| s.definition.id == id)
            .ok_or(TransitionError::UnknownStep(id))?;
        if step.completed_at_ms.is_none() {
            step.completed_at_ms = Some(now_ms);
            self.touch(now_ms);
        }
        Ok(())
    }

    /// Stamp every remaining step and mark the job complete. Idempotent.
    pub fn complete_job(&mut self, now_ms: u64) {
        if self.is_completed {
            return;
        }
        for step in &mut self.steps {
            step.completed_at_ms.get_or_insert(now_ms);
        }
        self.actual_step = self.total_steps;
        self.touch(now_ms);
    }

    /// Reconcile with the remote record using last-write-wins.
    ///
    /// Local state survives only when it is dirty and strictly newer than the
    /// remote record; ties go to the remote side.
    pub fn sync_from_remote(
        &mut self,
        remote: &RemoteProgress,
        now_ms: u64,
    ) -> Result<SyncOutcome, TransitionError> {
        if remote.actual_step > self.total_steps {
            return Err(TransitionError::OutOfRange {
                step: remote.actual_step,
                total: self.total_steps,
            });
        }
        if let Some(&bad) =
            remote.completed_steps.keys().find(|&&id| id == 0 || id > self.total_steps)
        {
            return Err(TransitionError::UnknownStep(bad));
        }
        if self.is_dirty && self.last_modified_at_ms > remote.modified_at_ms {
            return Ok(SyncOutcome::KeptLocal);
        }

        self.actual_step = remote.actual_step;
        for step in &mut self.steps {
            step.completed_at_ms = remote.completed_steps.get(&step.definition.id).copied();
        }
        self.is_completed = !self.steps.is_empty() && self.steps.iter().all(ProgressStep::is_completed);
        self.completed_at_ms = if self.is_completed {
            self.steps.iter().filter_map(|s| s.completed_at_ms).max()
        } else {
            None
        };
        self.last_modified_at_ms = remote.modified_at_ms;
        self.last_synced_at_ms = Some(now_ms);
        self.is_dirty = false;
        Ok(SyncOutcome::Replaced)
    }

    /// Clear every stamp and return to "not started".
    pub fn reset(&mut self, now_ms: u64) {
        for step in &mut self.steps {
            step.completed_at_ms = None;
        }
        self.actual_step = 0;
        self.touch(now_ms);
    }

    fn move_to(&mut self, step: u32, now_ms: u64) {
        if step == self.actual_step {
            return;
        }
        let forward = step > self.actual_step;
        for s in &mut self.steps {
            let id = s.definition.id;
            if forward && id < step {
                s.completed_at_ms.get_or_insert(now_ms);
            } else if !forward && id >= step {
                s.completed_at_ms = None;
            }
        }
        self.actual_step = step;
        self.touch(now_ms);
    }

    fn touch(&mut self, now_ms: u64) {
        self.last_modified_at_ms = now_ms;
        self.is_dirty = true;
        let all_done = !self.steps.is_empty() && self.steps.iter().all(ProgressStep::is_completed);
        if all_done && !self.is_completed {
            self.is_completed = true;
            self.completed_at_ms = Some(now_ms);
        } else if !all_done {
            self.is_completed = false;
            self.completed_at_ms = None;
        }
    }
}

#[cfg(test)]
#[path = "progress_tests.rs"]
mod tests;
