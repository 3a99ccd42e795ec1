// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! haul-engine: job timer, progress tracking and session orchestration

pub mod collaborators;
mod config;
mod engine;
pub mod env;
mod error;
mod progress;
mod session;
mod ticker;
mod timer;
mod transition;

pub use collaborators::{
    JobSource, NoopPayments, PaymentCollaborator, PaymentError, PaymentRequest, PaymentStage,
    RemoteJob, SourceError,
};
pub use config::{ConfigError, EngineConfig};
pub use engine::{Engine, EngineDeps, SessionHandle};
pub use error::EngineError;
pub use progress::JobProgress;
pub use session::{JobSession, SessionDeps, SessionView};
pub use ticker::spawn_ticker;
pub use timer::{Advanced, CompletionCallback, JobTimer};
pub use transition::Transition;

#[cfg(any(test, feature = "test-support"))]
pub use collaborators::{FakeJobSource, FakePayments};

#[cfg(test)]
mod test_helpers;
