// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Step catalog: the ordered operational steps of a field job.
//!
//! A job with `N` stops runs through
//!
//! ```text
//! 1        Depart depot
//! 2i       Arrive at stop i        (i = 1..=N)
//! 2i + 1   Depart stop i
//! 2N + 2   Return to depot         (only with the return step)
//! ```
//!
//! Step 0 is the "not started" sentinel and never appears in a catalog.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Upper bound on stops per job.
pub const MAX_STOPS: u32 = 500;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("invalid configuration: stop count must be at least 1, got {0}")]
    InvalidStopCount(u32),
    #[error("invalid configuration: {0} stops exceeds the limit of {MAX_STOPS}")]
    TooManyStops(u32),
}

/// One operational step of a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepDefinition {
    /// 1-based position in the catalog
    pub id: u32,
    pub name: String,
    /// Payment collection is expected once this step is entered
    pub is_billing_trigger: bool,
    pub is_terminal: bool,
}

/// Number of steps for a job with `stop_count` stops.
pub fn total_steps(stop_count: u32, include_return: bool) -> Result<u32, CatalogError> {
    validate(stop_count)?;
    Ok(1 + 2 * stop_count + u32::from(include_return))
}

/// Build the ordered step list for a job.
///
/// The billing trigger is the departure from the last stop (the step before
/// transport back to the depot begins); the terminal step is always last.
pub fn generate_steps(
    stop_count: u32,
    include_return: bool,
) -> Result<Vec<StepDefinition>, CatalogError> {
    let total = total_steps(stop_count, include_return)?;
    let billing = 2 * stop_count + 1;

    let mut steps = Vec::with_capacity(total as usize);
    let mut push = |id: u32, name: String| {
        steps.push(StepDefinition {
            id,
            name,
            is_billing_trigger: id == billing,
            is_terminal: id == total,
        });
    };

    push(1, "Depart depot".to_string());
    for stop in 1..=stop_count {
        push(2 * stop, format!("Arrive at stop {stop}"));
        push(2 * stop + 1, format!("Depart stop {stop}"));
    }
    if include_return {
        push(total, "Return to depot".to_string());
    }
    Ok(steps)
}

/// Id of the billing-trigger step in a catalog, if any.
pub fn billing_step(steps: &[StepDefinition]) -> Option<u32> {
    steps.iter().find(|s| s.is_billing_trigger).map(|s| s.id)
}

fn validate(stop_count: u32) -> Result<(), CatalogError> {
    if stop_count < 1 {
        return Err(CatalogError::InvalidStopCount(stop_count));
    }
    if stop_count > MAX_STOPS {
        return Err(CatalogError::TooManyStops(stop_count));
    }
    Ok(())
}

/// Memoizing front for [`generate_steps`].
///
/// Catalogs never change once built, so entries are shared as `Arc<[_]>`.
#[derive(Debug, Default)]
pub struct StepCatalog {
    cache: Mutex<HashMap<(u32, bool), Arc<[StepDefinition]>>>,
}

impl StepCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn steps(
        &self,
        stop_count: u32,
        include_return: bool,
    ) -> Result<Arc<[StepDefinition]>, CatalogError> {
        let key = (stop_count, include_return);
        if let Some(steps) = self.cache.lock().get(&key) {
            return Ok(Arc::clone(steps));
        }
        let steps: Arc<[StepDefinition]> = generate_steps(stop_count, include_return)?.into();
        self.cache.lock().entry(key).or_insert_with(|| Arc::clone(&steps));
        Ok(steps)
    }

    /// Number of distinct catalogs built so far.
    pub fn len(&self) -> usize {
        self.cache.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.lock().is_empty()
    }
}

#[cfg(test)]
#[path = "step_tests.rs"]
mod tests;
