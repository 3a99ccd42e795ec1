// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! External collaborators: the remote job source and the payment provider.
//!
//! The engine only consumes these interfaces; it never talks to a REST API or
//! payment provider itself.

use async_trait::async_trait;
use haul_core::{JobId, RemoteProgress};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("job {0} not found")]
    NotFound(JobId),
    #[error("job source unavailable: {0}")]
    Unavailable(String),
}

/// A job as supplied by the remote source when a session is first opened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteJob {
    pub job_id: JobId,
    pub stop_addresses: Vec<String>,
    /// Present when the job was already under way elsewhere
    #[serde(default)]
    pub progress: Option<RemoteProgress>,
}

impl RemoteJob {
    pub fn new(job_id: impl Into<JobId>, stop_addresses: Vec<String>) -> Self {
        Self { job_id: job_id.into(), stop_addresses, progress: None }
    }

    haul_core::setters! {
        option {
            progress: RemoteProgress,
        }
    }

    pub fn stop_count(&self) -> u32 {
        self.stop_addresses.len() as u32
    }
}

/// Remote source of job definitions. Not polled; asked once per new session.
#[async_trait]
pub trait JobSource: Send + Sync + 'static {
    async fn fetch_job(&self, job_id: &JobId) -> Result<RemoteJob, SourceError>;
}

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("payment declined: {0}")]
    Declined(String),
    #[error("payment provider unavailable: {0}")]
    Unavailable(String),
}

/// Point in the job at which payment is requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStage {
    /// The billing-trigger step was entered
    BillingStep,
    /// The terminal step was reached
    Completion,
}

haul_core::simple_display! {
    PaymentStage {
        BillingStep => "billing_step",
        Completion => "completion",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub job_id: JobId,
    pub stage: PaymentStage,
    pub billable_hours: f64,
    pub cost: f64,
    pub currency: String,
}

/// Receives the figures needed to collect payment.
#[async_trait]
pub trait PaymentCollaborator: Send + Sync + 'static {
    async fn request_payment(&self, request: PaymentRequest) -> Result<(), PaymentError>;
}

/// Payment collaborator that only logs. Used when no provider is wired up.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopPayments;

#[async_trait]
impl PaymentCollaborator for NoopPayments {
    async fn request_payment(&self, request: PaymentRequest) -> Result<(), PaymentError> {
        tracing::info!(
            job_id = %request.job_id,
            stage = %request.stage,
            billable_hours = request.billable_hours,
            cost = request.cost,
            "payment requested (no provider configured)"
        );
        Ok(())
    }
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::{
        JobSource, PaymentCollaborator, PaymentError, PaymentRequest, RemoteJob, SourceError,
    };
    use async_trait::async_trait;
    use haul_core::JobId;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::sync::Arc;

    #[derive(Default)]
    struct FakeSourceState {
        jobs: HashMap<JobId, RemoteJob>,
        calls: Vec<JobId>,
        unavailable: Option<String>,
    }

    /// Fake job source for testing
    #[derive(Clone, Default)]
    pub struct FakeJobSource {
        inner: Arc<Mutex<FakeSourceState>>,
    }

    impl FakeJobSource {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_job(self, job: RemoteJob) -> Self {
            self.add_job(job);
            self
        }

        pub fn add_job(&self, job: RemoteJob) {
            self.inner.lock().jobs.insert(job.job_id.clone(), job);
        }

        /// Make every subsequent fetch fail with `Unavailable(reason)`
        pub fn set_unavailable(&self, reason: impl Into<String>) {
            self.inner.lock().unavailable = Some(reason.into());
        }

        /// Ids passed to `fetch_job`, in call order
        pub fn calls(&self) -> Vec<JobId> {
            self.inner.lock().calls.clone()
        }
    }

    #[async_trait]
    impl JobSource for FakeJobSource {
        async fn fetch_job(&self, job_id: &JobId) -> Result<RemoteJob, SourceError> {
            let mut inner = self.inner.lock();
            inner.calls.push(job_id.clone());
            if let Some(reason) = &inner.unavailable {
                return Err(SourceError::Unavailable(reason.clone()));
            }
            inner.jobs.get(job_id).cloned().ok_or_else(|| SourceError::NotFound(job_id.clone()))
        }
    }

    #[derive(Default)]
    struct FakePaymentsState {
        requests: Vec<PaymentRequest>,
        decline: bool,
    }

    /// Fake payment collaborator for testing
    #[derive(Clone, Default)]
    pub struct FakePayments {
        inner: Arc<Mutex<FakePaymentsState>>,
    }

    impl FakePayments {
        pub fn new() -> Self {
            Self::default()
        }

        /// Requests are still recorded when declined
        pub fn set_decline(&self, decline: bool) {
            self.inner.lock().decline = decline;
        }

        pub fn requests(&self) -> Vec<PaymentRequest> {
            self.inner.lock().requests.clone()
        }
    }

    #[async_trait]
    impl PaymentCollaborator for FakePayments {
        async fn request_payment(&self, request: PaymentRequest) -> Result<(), PaymentError> {
            let mut inner = self.inner.lock();
            inner.requests.push(request);
            if inner.decline {
                return Err(PaymentError::Declined("card declined".to_string()));
            }
            Ok(())
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeJobSource, FakePayments};
