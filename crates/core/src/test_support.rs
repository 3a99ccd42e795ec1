// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::step::generate_steps;
use crate::{JobId, JobProgressState, JobTimerState, TransitionError};

/// Epoch milliseconds used as "now" by fixtures.
pub const FIXTURE_EPOCH_MS: u64 = 1_700_000_000_000;

/// A timer command, for driving state machines from generated sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerCommand {
    Start,
    /// Advance to `current_step + 1`
    Next,
    /// Advance to `current_step + n`
    Jump(u32),
    StartBreak,
    StopBreak,
}

impl TimerCommand {
    pub fn apply(self, state: &mut JobTimerState, now_ms: u64) -> Result<(), TransitionError> {
        match self {
            TimerCommand::Start => state.start(now_ms),
            TimerCommand::Next => state.advance_step(state.current_step + 1, now_ms).map(drop),
            TimerCommand::Jump(n) => state.advance_step(state.current_step + n, now_ms).map(drop),
            TimerCommand::StartBreak => state.start_break(now_ms),
            TimerCommand::StopBreak => state.stop_break(now_ms),
        }
    }
}

// ── Proptest strategies ─────────────────────────────────────────────────

/// Proptest strategies for core state machine types.
pub mod strategies {
    use super::TimerCommand;
    use proptest::prelude::*;

    pub fn arb_timer_command() -> impl Strategy<Value = TimerCommand> {
        prop_oneof![
            1 => Just(TimerCommand::Start),
            4 => Just(TimerCommand::Next),
            1 => (0u32..4).prop_map(TimerCommand::Jump),
            2 => Just(TimerCommand::StartBreak),
            2 => Just(TimerCommand::StopBreak),
        ]
    }

    /// Commands paired with the milliseconds that pass before each one.
    pub fn arb_timer_commands(max_len: usize) -> impl Strategy<Value = Vec<(TimerCommand, u64)>> {
        proptest::collection::vec((arb_timer_command(), 0u64..3_600_000), 0..max_len)
    }
}

// ── Fixtures ────────────────────────────────────────────────────────────

/// A started timer that has advanced to `step` one minute per step.
pub fn timer_at_step(job_id: &str, total_steps: u32, step: u32) -> JobTimerState {
    let mut state = JobTimerState::new(JobId::new(job_id), total_steps, FIXTURE_EPOCH_MS);
    if step == 0 {
        return state;
    }
    let _ = state.start(FIXTURE_EPOCH_MS);
    for (i, target) in (2..=step).enumerate() {
        let _ = state.advance_step(target, FIXTURE_EPOCH_MS + (i as u64 + 1) * 60_000);
    }
    state
}

/// A fresh progress record for a job with `stop_count` stops and a depot return.
pub fn progress_for(job_id: &str, stop_count: u32) -> JobProgressState {
    let steps = generate_steps(stop_count, true).unwrap_or_default();
    JobProgressState::new(JobId::new(job_id), &steps, FIXTURE_EPOCH_MS)
}
