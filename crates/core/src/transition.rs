// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Rejected state machine commands.

use thiserror::Error;

/// Why a timer or progress command was refused.
///
/// These never escape the engine as errors: the state machines log them and
/// report the command as a no-op, leaving the record untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("job already started")]
    AlreadyStarted,
    #[error("job not started")]
    NotStarted,
    #[error("step changes are not allowed during a break")]
    OnBreak,
    #[error("job already reached its terminal step")]
    AlreadyTerminal,
    #[error("cannot move from step {current} to step {target}: steps must advance one at a time")]
    StepSkipped { current: u32, target: u32 },
    #[error("step {step} is outside 1..={total}")]
    OutOfRange { step: u32, total: u32 },
    #[error("unknown step id {0}")]
    UnknownStep(u32),
    #[error("already on break")]
    AlreadyOnBreak,
    #[error("not on break")]
    NotOnBreak,
}
