// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! haul-storage: durable per-job records
//!
//! One serialized snapshot per job, keyed by `<prefix><job id>`, plus an
//! index of known ids per prefix for enumeration and retention cleanup.

mod file;
mod memory;
mod store;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use store::{
    record_key, validate_job_id, Retained, StateStore, StoreError, MS_PER_DAY,
    PROGRESS_KEY_PREFIX, STATE_KEY_PREFIX,
};
