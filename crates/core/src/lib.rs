// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! haul-core: pure job execution and billing types for field jobs

pub mod macros;

pub mod billing;
pub mod clock;
pub mod id;
pub mod progress;
pub mod step;
pub mod time_fmt;
pub mod timer;
pub mod transition;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use billing::{compute_billable, round_billable_hours, BillableTime, BillingRates, Invoice};
pub use clock::{Clock, FakeClock, SystemClock};
pub use id::JobId;
pub use progress::{JobProgressState, ProgressStep, RemoteProgress, SyncOutcome};
pub use step::{billing_step, generate_steps, total_steps, CatalogError, StepCatalog, StepDefinition};
pub use time_fmt::{format_hhmm, format_hhmmss};
pub use timer::{BreakInterval, JobTimerState, StepEntered, StepInterval, TimerPhase};
pub use transition::TransitionError;
