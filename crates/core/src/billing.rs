// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Time & billing calculator.
//!
//! Worked time is converted to hours, floored at the minimum call-out,
//! surcharged with the fixed call-out allowance, then rounded to a half-hour
//! bucket with 7- and 37-minute breakpoints.

use crate::id::JobId;
use serde::{Deserialize, Serialize};

pub const MS_PER_HOUR: f64 = 3_600_000.0;

/// Fractions at or below this (7 minutes) round down to the whole hour.
pub const ROUND_DOWN_MAX: f64 = 0.1167;

/// Fractions at or below this (37 minutes) round to the half hour; above it, up.
pub const HALF_HOUR_MAX: f64 = 0.6167;

pub const DEFAULT_MIN_BILLABLE_HOURS: f64 = 2.0;
pub const DEFAULT_CALL_OUT_HOURS: f64 = 0.5;
pub const DEFAULT_HOURLY_RATE: f64 = 100.0;
pub const DEFAULT_CURRENCY: &str = "USD";

/// Business billing parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BillingRates {
    /// Floor applied to worked hours before the call-out surcharge
    pub min_billable_hours: f64,
    /// Fixed travel/dispatch surcharge added to every job
    pub call_out_hours: f64,
    pub hourly_rate: f64,
    /// ISO 4217 code handed to the payment collaborator
    pub currency: String,
}

impl Default for BillingRates {
    fn default() -> Self {
        Self {
            min_billable_hours: DEFAULT_MIN_BILLABLE_HOURS,
            call_out_hours: DEFAULT_CALL_OUT_HOURS,
            hourly_rate: DEFAULT_HOURLY_RATE,
            currency: DEFAULT_CURRENCY.to_string(),
        }
    }
}

impl BillingRates {
    crate::setters! {
        into {
            currency: String,
        }
        set {
            min_billable_hours: f64,
            call_out_hours: f64,
            hourly_rate: f64,
        }
    }

    /// The smallest billable figure any job can produce.
    pub fn minimum_billable_hours(&self) -> f64 {
        round_billable_hours(self.min_billable_hours + self.call_out_hours)
    }
}

/// Result of [`compute_billable`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillableTime {
    /// Worked time in hours, before any business rule
    pub raw_hours: f64,
    pub billable_hours: f64,
    pub cost: f64,
}

/// Round hours to the billing bucket using the 7/37-minute breakpoints.
pub fn round_billable_hours(hours: f64) -> f64 {
    let whole = hours.floor();
    let fraction = hours - whole;
    if fraction <= ROUND_DOWN_MAX {
        whole
    } else if fraction <= HALF_HOUR_MAX {
        whole + 0.5
    } else {
        whole + 1.0
    }
}

/// Billable hours and cost for `worked_ms` of worked (non-break) time.
pub fn compute_billable(worked_ms: u64, rates: &BillingRates) -> BillableTime {
    let raw_hours = worked_ms as f64 / MS_PER_HOUR;
    let floored = raw_hours.max(rates.min_billable_hours);
    let billable_hours = round_billable_hours(floored + rates.call_out_hours);
    BillableTime { raw_hours, billable_hours, cost: billable_hours * rates.hourly_rate }
}

/// Derived invoice figures for a job. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub job_id: JobId,
    pub billable_hours: f64,
    pub raw_hours: f64,
    pub hourly_rate: f64,
    pub total: f64,
    pub currency: String,
}

impl Invoice {
    pub fn from_billable(job_id: JobId, billable: &BillableTime, rates: &BillingRates) -> Self {
        Self {
            job_id,
            billable_hours: billable.billable_hours,
            raw_hours: billable.raw_hours,
            hourly_rate: rates.hourly_rate,
            total: billable.cost,
            currency: rates.currency.clone(),
        }
    }
}

#[cfg(test)]
#[path = "billing_tests.rs"]
mod tests;
