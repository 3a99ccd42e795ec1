// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Configuration specs
//!
//! A TOML file shapes the catalog, the rates and where state is kept.

use crate::prelude::*;
use crate::prelude::assert_eq;
use haul_engine::{ConfigError, NoopPayments};

const NO_RETURN: &str = r#"
include_return = false

[billing]
hourly_rate = 120.0
currency = "AUD"
"#;

#[tokio::test]
async fn config_file_sets_catalog_and_rates() {
    let depot = Depot::empty();
    let config = EngineConfig::load(&depot.file("haul.toml", NO_RETURN)).unwrap();
    depot.job("job-1", 1);
    let engine = depot.engine_with(config);
    let handle = open(&engine, "job-1").await;
    let mut session = handle.lock().await;

    assert_eq!(session.total_steps(), 3);
    session.start_timer().await.unwrap();
    depot.minutes(60);
    session.next_step().await.unwrap();
    depot.minutes(60);
    let done = session.next_step().await.unwrap();

    let Transition::Applied(Advanced::Completed(invoice)) = done else {
        panic!("expected completion, got {done:?}");
    };
    assert_eq!(invoice.billable_hours, 2.5);
    assert_eq!(invoice.total, 300.0);
    assert_eq!(invoice.currency, "AUD");
    // Step 3 is both the billing trigger and the terminal step
    assert_eq!(
        depot.payments(),
        vec![(PaymentStage::BillingStep, 2.5), (PaymentStage::Completion, 2.5)]
    );
}

#[test]
fn unknown_keys_are_rejected() {
    let depot = Depot::empty();
    let path = depot.file("haul.toml", "retention = 5\n");

    let err = EngineConfig::load(&path).unwrap_err();

    assert!(matches!(err, ConfigError::Toml(_)), "got {err:?}");
}

#[test]
fn missing_file_names_the_path() {
    let depot = Depot::empty();
    let path = depot.path().join("absent.toml");

    let err = EngineConfig::load(&path).unwrap_err();

    assert!(err.to_string().contains("absent.toml"), "got {err}");
}

#[tokio::test]
async fn file_stores_live_in_the_configured_state_dir() {
    let depot = Depot::empty();
    depot.job("job-1", 1);
    let config = EngineConfig { state_dir: Some(depot.path().join("state")), ..Default::default() };
    let engine =
        Engine::with_file_stores(config, Arc::new(depot.source.clone()), Arc::new(NoopPayments))
            .unwrap();

    let handle = engine.session(&JobId::new("job-1")).await.unwrap();
    handle.lock().await.start_timer().await.unwrap();

    assert!(depot.exists("state/job_state_job-1.json"));
    assert!(depot.exists("state/job_progress_job-1.json"));
}
